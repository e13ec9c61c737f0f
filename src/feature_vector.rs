//! Sparse term→weight vectors, the arithmetic substrate of relevance models.
//!
//! Any ordered view of a vector (pruning, rendering, query building) sorts by
//! weight descending and then by term ascending, so results never depend on
//! hash-map iteration order.

use crate::error::IndexError;
use crate::stopwords::Stopwords;
use crate::topk::BoundedHeap;
use crate::types::TermFreq;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::warn;

/// A sparse mapping from term to weight.
///
/// Absent terms read as weight `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
  features: HashMap<String, f32>,
}

impl FeatureVector {
  /// Creates an empty vector.
  pub fn new() -> Self {
    Self::default()
  }

  /// Builds a bag-of-words vector: each occurrence adds one.
  pub fn from_terms<I, S>(terms: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut vector = Self::new();
    for term in terms {
      vector.add_term(term);
    }
    vector
  }

  /// Builds a vector from one document's term statistics.
  ///
  /// Terms shorter than two characters, stopwords, and anything that is not a
  /// plausible token (lowercase alphanumerics plus `#` and `@`) are skipped.
  /// If the term stream reports an error part-way through, the whole vector is
  /// discarded and an empty one is returned; one unreadable document must not
  /// abort feedback for the others.
  pub fn from_term_vector<I>(terms: I, stopwords: &Stopwords) -> Self
  where
    I: IntoIterator<Item = Result<TermFreq, IndexError>>,
  {
    let mut vector = Self::new();
    for entry in terms {
      let TermFreq { term, freq } = match entry {
        Ok(entry) => entry,
        Err(err) => {
          warn!(error = %err, "failed to read term vector, using empty feature vector");
          return Self::new();
        }
      };

      if term.chars().count() < 2 || stopwords.is_stopword(&term) || !is_plausible_token(&term) {
        continue;
      }
      vector.add_term_weight(term, freq as f32);
    }
    vector
  }

  /// Increments the weight of `term` by one.
  pub fn add_term(&mut self, term: impl Into<String>) {
    self.add_term_weight(term, 1.0);
  }

  /// Adds `weight` to the weight of `term`.
  pub fn add_term_weight(&mut self, term: impl Into<String>, weight: f32) {
    *self.features.entry(term.into()).or_insert(0.0) += weight;
  }

  /// Returns the weight of `term`, or `0.0` if absent.
  pub fn weight(&self, term: &str) -> f32 {
    self.features.get(term).copied().unwrap_or(0.0)
  }

  pub fn contains(&self, term: &str) -> bool {
    self.features.contains_key(term)
  }

  /// Number of terms in the vector.
  pub fn len(&self) -> usize {
    self.features.len()
  }

  pub fn is_empty(&self) -> bool {
    self.features.is_empty()
  }

  /// Iterates over the terms in unspecified order.
  pub fn terms(&self) -> impl Iterator<Item = &str> + '_ {
    self.features.keys().map(String::as_str)
  }

  /// Iterates over `(term, weight)` pairs in unspecified order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
    self.features.iter().map(|(term, weight)| (term.as_str(), *weight))
  }

  /// Returns `(term, weight)` pairs by weight descending, then term ascending.
  pub fn ordered(&self) -> Vec<(&str, f32)> {
    let mut pairs: Vec<(&str, f32)> = self.iter().collect();
    pairs.sort_by(|a, b| compare_ranked(*a, *b));
    pairs
  }

  /// Keeps only the terms matching `keep`.
  pub fn retain(&mut self, mut keep: impl FnMut(&str, f32) -> bool) {
    self.features.retain(|term, weight| keep(term, *weight));
  }

  /// Keeps the `k` highest-weighted terms.
  ///
  /// Retains exactly `min(k, len)` terms. Equal weights are resolved in favor
  /// of the lexicographically smaller term.
  pub fn prune_to_size(&mut self, k: usize) {
    if self.features.len() <= k {
      return;
    }

    let mut heap = BoundedHeap::new(k);
    for (term, weight) in self.features.drain() {
      heap.push(weight, term);
    }
    self.features = heap
      .into_sorted_vec()
      .into_iter()
      .map(|(weight, term)| (term, weight))
      .collect();
  }

  /// Euclidean norm of the weights.
  pub fn l2_norm(&self) -> f64 {
    self
      .features
      .values()
      .map(|w| (*w as f64) * (*w as f64))
      .sum::<f64>()
      .sqrt()
  }

  /// Sum of absolute weights.
  pub fn l1_norm(&self) -> f64 {
    self.features.values().map(|w| w.abs() as f64).sum()
  }

  /// Divides every weight by the L2 norm. A zero vector is left unchanged.
  pub fn scale_to_unit_l2_norm(&mut self) -> &mut Self {
    let norm = self.l2_norm();
    self.divide_by(norm)
  }

  /// Divides every weight by the L1 norm. A zero vector is left unchanged.
  pub fn scale_to_unit_l1_norm(&mut self) -> &mut Self {
    let norm = self.l1_norm();
    self.divide_by(norm)
  }

  fn divide_by(&mut self, norm: f64) -> &mut Self {
    if norm == 0.0 || !norm.is_finite() {
      return self;
    }
    for weight in self.features.values_mut() {
      *weight = (*weight as f64 / norm) as f32;
    }
    self
  }

  /// Linear interpolation `λ·x + (1-λ)·y` over the union of both vocabularies.
  ///
  /// Terms whose interpolated weight is exactly zero are omitted, so
  /// `interpolate(x, y, 1.0)` has the same terms as `x` (minus zero weights)
  /// and `interpolate(x, y, 0.0)` the same terms as `y`.
  pub fn interpolate(x: &FeatureVector, y: &FeatureVector, x_weight: f32) -> FeatureVector {
    let vocab: BTreeSet<&str> = x.terms().chain(y.terms()).collect();
    let y_weight = 1.0 - x_weight as f64;

    let mut z = FeatureVector::new();
    for term in vocab {
      let weight = (x_weight as f64 * x.weight(term) as f64 + y_weight * y.weight(term) as f64) as f32;
      if weight != 0.0 {
        z.add_term_weight(term, weight);
      }
    }
    z
  }

  /// Renders the `k` highest-weighted terms, one `weight term` pair per line.
  pub fn top(&self, k: usize) -> String {
    let mut out = String::new();
    for (term, weight) in self.ordered().into_iter().take(k) {
      out.push_str(&format!("{weight} {term}\n"));
    }
    out
  }
}

impl fmt::Display for FeatureVector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.top(self.len()))
  }
}

impl<S: Into<String>> FromIterator<(S, f32)> for FeatureVector {
  fn from_iter<I: IntoIterator<Item = (S, f32)>>(iter: I) -> Self {
    let mut vector = FeatureVector::new();
    for (term, weight) in iter {
      vector.add_term_weight(term, weight);
    }
    vector
  }
}

/// Weight descending, then term ascending.
fn compare_ranked(a: (&str, f32), b: (&str, f32)) -> Ordering {
  b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// Lowercase ASCII letters, digits, `#` and `@` only.
fn is_plausible_token(term: &str) -> bool {
  !term.is_empty()
    && term
      .chars()
      .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '#' || c == '@')
}
