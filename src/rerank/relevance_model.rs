//! RM3 relevance-model estimation from feedback documents.
//!
//! The relevance model weights every candidate term by how prominent it is in
//! each feedback document (its length-normalized weight there) times how well
//! that document was retrieved (its original score):
//!
//! ```text
//! fbWeight(t) = Σ_i  docVector_i(t) / ‖docVector_i‖₂ · score_i
//! ```
//!
//! The result is pruned to the strongest `fb_terms` terms and scaled to unit
//! L2 norm.

use crate::error::IndexError;
use crate::feature_vector::FeatureVector;
use crate::index::Index;
use crate::stopwords::Stopwords;
use crate::types::{DocId, ScoredDocuments};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Feedback documents whose vector norm is at or below this contribute
/// nothing.
pub const MIN_FEEDBACK_NORM: f64 = 0.001;

/// How feedback documents are chosen from the input ranking.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FeedbackSelection {
  /// The first `fb_docs` documents in rank order.
  #[default]
  RankCutoff,
  /// Documents scoring at least `min_score`, in rank order, at most `fb_docs`.
  ScoreThreshold { min_score: f32 },
}

/// Estimates an RM3 relevance model from the top of a ranked list.
///
/// The estimator holds only immutable configuration and a shared stopword
/// set, so one instance can serve concurrent queries.
#[derive(Debug, Clone)]
pub struct RelevanceModelEstimator {
  fb_docs: usize,
  fb_terms: usize,
  selection: FeedbackSelection,
  filter: FeedbackTermFilter,
}

/// Turns a feedback document's term vector into a feature vector of raw term
/// frequencies, keeping only terms usable for expansion.
#[derive(Debug, Clone)]
pub(crate) struct FeedbackTermFilter {
  stopwords: Arc<Stopwords>,
  max_term_length: Option<usize>,
  max_df_ratio: Option<f32>,
}

impl FeedbackTermFilter {
  pub(crate) fn new(stopwords: Arc<Stopwords>) -> Self {
    Self {
      stopwords,
      max_term_length: None,
      max_df_ratio: None,
    }
  }

  pub(crate) fn with_max_term_length(mut self, max: Option<usize>) -> Self {
    self.max_term_length = max;
    self
  }

  pub(crate) fn with_max_df_ratio(mut self, ratio: Option<f32>) -> Self {
    self.max_df_ratio = ratio;
    self
  }

  /// Reads and filters the term vector of document `id`.
  ///
  /// Only opening the term vector can fail; see
  /// [`FeatureVector::from_term_vector`] for read errors.
  pub(crate) fn document_vector(
    &self,
    id: DocId,
    index: &dyn Index,
    field: &str,
    total_docs: u64,
  ) -> Result<FeatureVector, IndexError> {
    let terms = index.term_vector(id, field)?;
    let mut vector = FeatureVector::from_term_vector(terms, &self.stopwords);

    if let Some(max) = self.max_term_length {
      vector.retain(|term, _| term.chars().count() <= max);
    }

    if let Some(ratio) = self.max_df_ratio {
      if total_docs > 0 {
        vector.retain(|term, _| match index.doc_frequency(term, field) {
          Ok(df) => df as f64 / total_docs as f64 <= ratio as f64,
          Err(err) => {
            warn!(error = %err, term, "document frequency lookup failed, keeping term");
            true
          }
        });
      }
    }

    Ok(vector)
  }
}

impl RelevanceModelEstimator {
  /// Creates an estimator using rank-cutoff selection and no extra term
  /// filters.
  ///
  /// # Arguments
  ///
  /// * `fb_docs` - Maximum number of feedback documents.
  /// * `fb_terms` - Number of terms kept per feedback document and in the
  ///   final model.
  /// * `stopwords` - Terms never used for feedback.
  pub fn new(fb_docs: usize, fb_terms: usize, stopwords: Arc<Stopwords>) -> Self {
    Self {
      fb_docs,
      fb_terms,
      selection: FeedbackSelection::RankCutoff,
      filter: FeedbackTermFilter::new(stopwords),
    }
  }

  /// Sets how feedback documents are selected.
  pub fn with_selection(mut self, selection: FeedbackSelection) -> Self {
    self.selection = selection;
    self
  }

  /// Drops feedback terms longer than `max` characters.
  pub fn with_max_term_length(mut self, max: Option<usize>) -> Self {
    self.filter = self.filter.with_max_term_length(max);
    self
  }

  /// Drops feedback terms that occur in more than `ratio` of all documents.
  pub fn with_max_df_ratio(mut self, ratio: Option<f32>) -> Self {
    self.filter = self.filter.with_max_df_ratio(ratio);
    self
  }

  pub fn fb_docs(&self) -> usize {
    self.fb_docs
  }

  pub fn fb_terms(&self) -> usize {
    self.fb_terms
  }

  /// Positions in `docs` used as feedback documents, in rank order.
  pub fn feedback_positions(&self, docs: &ScoredDocuments) -> Vec<usize> {
    match self.selection {
      FeedbackSelection::RankCutoff => (0..docs.len().min(self.fb_docs)).collect(),
      FeedbackSelection::ScoreThreshold { min_score } => (0..docs.len())
        .filter(|&i| docs.scores[i] >= min_score)
        .take(self.fb_docs)
        .collect(),
    }
  }

  /// Estimates the relevance model, or an empty vector if any feedback
  /// document's term vector cannot be fetched.
  ///
  /// An empty result means "no expansion possible"; callers should keep the
  /// original ranking.
  pub fn estimate(&self, docs: &ScoredDocuments, index: &dyn Index, field: &str) -> FeatureVector {
    self.try_estimate(docs, index, field).unwrap_or_else(|err| {
      warn!(error = %err, field, "relevance model estimation failed");
      FeatureVector::new()
    })
  }

  /// Estimates the relevance model, reporting fetch failures.
  ///
  /// # Errors
  ///
  /// Returns the first [`IndexError`] raised while opening a feedback
  /// document's term vector. Errors raised while *reading* a term vector only
  /// empty that one document's vector.
  ///
  /// # Panics
  ///
  /// Panics if the parallel sequences of `docs` differ in length.
  pub fn try_estimate(
    &self,
    docs: &ScoredDocuments,
    index: &dyn Index,
    field: &str,
  ) -> Result<FeatureVector, IndexError> {
    docs.assert_consistent();

    let positions = self.feedback_positions(docs);
    let total_docs = index.total_docs();
    let vectors = self.fetch_vectors(&positions, docs, index, field, total_docs)?;

    // Norms are computed once per document, not once per (term, document).
    let norms: Vec<f64> = vectors.iter().map(FeatureVector::l2_norm).collect();
    let vocab: BTreeSet<&str> = vectors.iter().flat_map(FeatureVector::terms).collect();

    let mut model = FeatureVector::new();
    for term in vocab {
      let mut fb_weight = 0.0f32;
      for ((vector, norm), &position) in vectors.iter().zip(&norms).zip(&positions) {
        if *norm > MIN_FEEDBACK_NORM {
          fb_weight += (vector.weight(term) as f64 / norm) as f32 * docs.scores[position];
        }
      }
      model.add_term_weight(term, fb_weight);
    }

    model.prune_to_size(self.fb_terms);
    model.scale_to_unit_l2_norm();

    debug!(
      feedback_docs = positions.len(),
      terms = model.len(),
      "relevance model estimated"
    );
    Ok(model)
  }

  /// Fetches one pruned vector per feedback position, in position order.
  #[cfg(not(feature = "parallel"))]
  fn fetch_vectors(
    &self,
    positions: &[usize],
    docs: &ScoredDocuments,
    index: &dyn Index,
    field: &str,
    total_docs: u64,
  ) -> Result<Vec<FeatureVector>, IndexError> {
    positions
      .iter()
      .map(|&i| self.document_vector(docs.ids[i], index, field, total_docs))
      .collect()
  }

  /// Fetches one pruned vector per feedback position, in position order.
  ///
  /// Fetches run concurrently; `collect` preserves position order, so the
  /// weights summed afterwards do not depend on completion order.
  #[cfg(feature = "parallel")]
  fn fetch_vectors(
    &self,
    positions: &[usize],
    docs: &ScoredDocuments,
    index: &dyn Index,
    field: &str,
    total_docs: u64,
  ) -> Result<Vec<FeatureVector>, IndexError> {
    positions
      .par_iter()
      .map(|&i| self.document_vector(docs.ids[i], index, field, total_docs))
      .collect()
  }

  /// Builds, filters, and prunes one feedback document's vector.
  fn document_vector(
    &self,
    id: DocId,
    index: &dyn Index,
    field: &str,
    total_docs: u64,
  ) -> Result<FeatureVector, IndexError> {
    let mut vector = self.filter.document_vector(id, index, field, total_docs)?;
    vector.prune_to_size(self.fb_terms);
    Ok(vector)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::analysis::Analyzer;
  use crate::index::InMemIndex;
  use crate::types::Document;

  fn corpus() -> InMemIndex {
    let mut index = InMemIndex::new(
      Analyzer::new(Arc::new(Stopwords::english())),
      Box::<crate::similarity::Bm25Similarity>::default(),
    );
    for (id, text) in [
      ("d0", "neural ranking models neural ranking"),
      ("d1", "ranking with relevance feedback"),
      ("d2", "cooking pasta at home"),
    ] {
      index.add_document(Document::new(id).with_field("contents", text));
    }
    index
  }

  fn ranking(index: &InMemIndex, positions: &[(DocId, f32)]) -> ScoredDocuments {
    positions
      .iter()
      .map(|&(id, score)| (index.document(id).unwrap().clone(), id, score))
      .collect()
  }

  #[test]
  fn test_weights_follow_formula() {
    let index = corpus();
    let docs = ranking(&index, &[(0, 2.0), (1, 1.0)]);
    let estimator = RelevanceModelEstimator::new(10, 100, Arc::new(Stopwords::english()));

    let model = estimator.try_estimate(&docs, &index, "contents").unwrap();

    // d0: neural 2, ranking 2, models 1 -> norm 3
    // d1: ranking 1, relevance 1, feedback 1 -> norm sqrt(3)
    let s3 = 3f64.sqrt();
    let raw_ranking = 2.0 / 3.0 * 2.0 + 1.0 / s3;
    let raw_neural = 2.0 / 3.0 * 2.0;
    let raw_models = 1.0 / 3.0 * 2.0;
    let raw_feedback = 1.0 / s3;
    let norm = (raw_ranking * raw_ranking
      + raw_neural * raw_neural
      + raw_models * raw_models
      + 2.0 * raw_feedback * raw_feedback)
      .sqrt();

    assert_eq!(model.len(), 5);
    assert!((model.weight("ranking") as f64 - raw_ranking / norm).abs() < 1e-5);
    assert!((model.weight("neural") as f64 - raw_neural / norm).abs() < 1e-5);
    assert!((model.weight("relevance") as f64 - raw_feedback / norm).abs() < 1e-5);
    assert_eq!(model.weight("pasta"), 0.0);
  }

  #[test]
  fn test_rank_cutoff_limits_feedback_docs() {
    let index = corpus();
    let docs = ranking(&index, &[(2, 3.0), (0, 2.0), (1, 1.0)]);
    let estimator = RelevanceModelEstimator::new(1, 20, Arc::new(Stopwords::english()));

    assert_eq!(estimator.feedback_positions(&docs), vec![0]);
    let model = estimator.estimate(&docs, &index, "contents");
    assert!(model.contains("pasta"));
    assert!(!model.contains("neural"));
  }

  #[test]
  fn test_score_threshold_selection() {
    let index = corpus();
    let docs = ranking(&index, &[(0, 3.0), (2, 0.5), (1, 2.0)]);
    let estimator = RelevanceModelEstimator::new(5, 20, Arc::new(Stopwords::none()))
      .with_selection(FeedbackSelection::ScoreThreshold { min_score: 1.0 });

    assert_eq!(estimator.feedback_positions(&docs), vec![0, 2]);
  }

  #[test]
  fn test_model_is_pruned_and_unit_length() {
    let index = corpus();
    let docs = ranking(&index, &[(0, 2.0), (1, 1.0), (2, 0.5)]);
    let estimator = RelevanceModelEstimator::new(3, 2, Arc::new(Stopwords::english()));

    let model = estimator.estimate(&docs, &index, "contents");
    assert_eq!(model.len(), 2);
    assert!((model.l2_norm() - 1.0).abs() < 1e-6);
  }

  #[test]
  fn test_term_filters() {
    let index = corpus();
    let docs = ranking(&index, &[(0, 2.0), (1, 1.0)]);
    let estimator = RelevanceModelEstimator::new(2, 20, Arc::new(Stopwords::english()))
      .with_max_term_length(Some(7))
      .with_max_df_ratio(Some(0.5));

    let model = estimator.estimate(&docs, &index, "contents");
    // "ranking" is in 2 of 3 documents, "relevance"/"feedback" exceed 7 chars.
    assert!(!model.contains("ranking"));
    assert!(!model.contains("relevance"));
    assert!(!model.contains("feedback"));
    assert!(model.contains("neural"));
    assert!(model.contains("models"));
  }

  #[test]
  fn test_no_feedback_documents_gives_empty_model() {
    let index = corpus();
    let estimator = RelevanceModelEstimator::new(10, 20, Arc::new(Stopwords::english()));
    let model = estimator.estimate(&ScoredDocuments::new(), &index, "contents");
    assert!(model.is_empty());
  }

  #[test]
  fn test_missing_document_aborts_estimation() {
    let index = corpus();
    let mut docs = ranking(&index, &[(0, 2.0)]);
    docs.push(Document::new("ghost"), 42, 1.0);
    let estimator = RelevanceModelEstimator::new(10, 20, Arc::new(Stopwords::english()));

    assert!(estimator.try_estimate(&docs, &index, "contents").is_err());
    assert!(estimator.estimate(&docs, &index, "contents").is_empty());
  }
}
