//! An implementation of the Okapi BM25 scoring algorithm.
//!
//! BM25 (Best Matching 25) is a ranking function used by search engines to
//! estimate the relevance of documents to a given search query. This variant
//! uses the non-negative IDF `ln(1 + (N - df + 0.5) / (df + 0.5))` and the
//! exact document length rather than a lossy encoded norm.

use super::{Similarity, TermStats, MIN_AVG_FIELD_LENGTH};
use crate::error::ConfigError;
use std::fmt;

/// A scorer for ranking documents using the BM25 algorithm.
///
/// This struct holds the validated parameters; construct it with
/// [`Bm25Similarity::new`] so that invalid values are rejected up front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Similarity {
  /// The `k1` parameter controls the term frequency saturation. A higher value
  /// means that the score continues to increase with term frequency, while a
  /// lower value means the score saturates more quickly.
  k1: f32,
  /// The `b` parameter controls the document length normalization. A value of
  /// 0.0 means no length normalization, while a value of 1.0 means full
  /// normalization.
  b: f32,
}

impl Default for Bm25Similarity {
  /// Creates a `Bm25Similarity` with `k1 = 1.2` and `b = 0.75`.
  fn default() -> Self {
    Self { k1: 1.2, b: 0.75 }
  }
}

impl Bm25Similarity {
  /// Creates a new `Bm25Similarity`.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::InvalidParameter`] if `k1` is negative or not
  /// finite, or if `b` is outside `[0, 1]`.
  pub fn new(k1: f32, b: f32) -> Result<Self, ConfigError> {
    if !k1.is_finite() || k1 < 0.0 {
      return Err(ConfigError::invalid("k1", k1, "must be a non-negative finite value"));
    }
    if b.is_nan() || !(0.0..=1.0).contains(&b) {
      return Err(ConfigError::invalid("b", b, "must be between 0 and 1"));
    }
    Ok(Self { k1, b })
  }

  pub fn k1(&self) -> f32 {
    self.k1
  }

  pub fn b(&self) -> f32 {
    self.b
  }
}

impl Similarity for Bm25Similarity {
  /// Calculates the Inverse Document Frequency (IDF) for a term.
  ///
  /// Computed in double precision and rounded once to `f32`. The result is
  /// never negative, even for inconsistent statistics where `df > N`.
  fn idf(&self, doc_freq: u64, total_docs: u64) -> f32 {
    let n = total_docs as f64;
    let df = doc_freq as f64;
    ((1.0 + (n - df + 0.5) / (df + 0.5)).ln() as f32).max(0.0)
  }

  /// Calculates the BM25 contribution of one term.
  ///
  /// `score = boost * idf * tf / (tf + k1 * (1 - b) + k1 * b * dl / avgdl)`,
  /// evaluated in `f32` with `avgdl` floored to [`MIN_AVG_FIELD_LENGTH`].
  fn score(&self, boost: f32, stats: &TermStats) -> f32 {
    let weight = boost * self.idf(stats.doc_freq, stats.total_docs);
    let mult_k1_minus_b = self.k1 * (1.0 - self.b);
    let mult_k1_b_inv_avgdl = self.k1 * self.b / stats.avg_doc_len.max(MIN_AVG_FIELD_LENGTH);

    let denominator = stats.tf + mult_k1_minus_b + mult_k1_b_inv_avgdl * stats.doc_len;
    weight * stats.tf / denominator
  }
}

impl fmt::Display for Bm25Similarity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "BM25(k1={},b={})", self.k1, self.b)
  }
}
