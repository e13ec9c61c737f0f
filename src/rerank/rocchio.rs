//! Rocchio query expansion from the head (and optionally the tail) of a ranking.
//!
//! The expanded query is
//!
//! ```text
//! q' = alpha · q + beta · mean(top documents) - gamma · mean(bottom documents)
//! ```
//!
//! where each mean is taken over length-normalized document vectors, pruned to
//! its own term budget and scaled to unit L2 norm. Only terms with a positive
//! weight in `q'` are kept.

use super::relevance_model::{FeedbackTermFilter, MIN_FEEDBACK_NORM};
use super::{Reranker, RerankerContext};
use crate::error::{ConfigError, IndexError, RerankError};
use crate::feature_vector::FeatureVector;
use crate::index::Index;
use crate::query::Query;
use crate::stopwords::Stopwords;
use crate::types::ScoredDocuments;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Parameters of a [`RocchioReranker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RocchioConfig {
  /// Documents taken from the head of the ranking as relevant.
  pub top_fb_docs: usize,
  /// Terms kept in the mean relevant vector.
  pub top_fb_terms: usize,
  /// Documents taken from the tail of the ranking as non-relevant.
  pub bottom_fb_docs: usize,
  /// Terms kept in the mean non-relevant vector.
  pub bottom_fb_terms: usize,
  pub alpha: f32,
  pub beta: f32,
  pub gamma: f32,
  /// Subtract the non-relevant mean. Without it `gamma` is ignored.
  pub use_negative: bool,
  /// Size of the candidate pool requested when re-running the expanded query.
  pub hits: usize,
  /// Log the expanded query at `info` level instead of `debug`.
  pub output_query: bool,
  pub max_term_length: Option<usize>,
  pub max_df_ratio: Option<f32>,
}

impl Default for RocchioConfig {
  fn default() -> Self {
    Self {
      top_fb_docs: 10,
      top_fb_terms: 10,
      bottom_fb_docs: 10,
      bottom_fb_terms: 10,
      alpha: 1.0,
      beta: 0.75,
      gamma: 0.0,
      use_negative: false,
      hits: 1000,
      output_query: false,
      max_term_length: None,
      max_df_ratio: None,
    }
  }
}

impl RocchioConfig {
  /// Checks every parameter, reporting the first illegal one.
  pub fn validate(&self) -> Result<(), ConfigError> {
    for (name, value) in [("alpha", self.alpha), ("beta", self.beta), ("gamma", self.gamma)] {
      if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::invalid(name, value, "must be finite and non-negative"));
      }
    }
    if self.top_fb_terms == 0 {
      return Err(ConfigError::invalid("top_fb_terms", self.top_fb_terms as f64, "must be at least 1"));
    }
    if self.use_negative && self.bottom_fb_terms == 0 {
      return Err(ConfigError::invalid(
        "bottom_fb_terms",
        self.bottom_fb_terms as f64,
        "must be at least 1",
      ));
    }
    if self.hits == 0 {
      return Err(ConfigError::invalid("hits", self.hits as f64, "must be at least 1"));
    }
    if let Some(ratio) = self.max_df_ratio {
      if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
        return Err(ConfigError::invalid(
          "max_df_ratio",
          ratio,
          "must be in the interval (0..1]",
        ));
      }
    }
    Ok(())
  }
}

/// Expands the query with the Rocchio formula and re-runs it against the
/// index.
///
/// Like [`Rm3Reranker`](super::Rm3Reranker), any failure during a rerank call
/// is logged and the input ranking is returned unchanged.
#[derive(Debug, Clone)]
pub struct RocchioReranker {
  config: RocchioConfig,
  filter: FeedbackTermFilter,
}

impl RocchioReranker {
  /// Creates a Rocchio reranker.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::InvalidParameter`] if `config` is invalid.
  pub fn new(config: RocchioConfig, stopwords: Arc<Stopwords>) -> Result<Self, ConfigError> {
    config.validate()?;

    let filter = FeedbackTermFilter::new(stopwords)
      .with_max_term_length(config.max_term_length)
      .with_max_df_ratio(config.max_df_ratio);

    Ok(Self { config, filter })
  }

  pub fn config(&self) -> &RocchioConfig {
    &self.config
  }

  /// Mean of the length-normalized vectors of the documents at `positions`,
  /// pruned to `fb_terms` and scaled to unit L2 norm.
  ///
  /// Documents with a (near) zero norm add nothing but still count towards
  /// the mean.
  fn mean_vector(
    &self,
    positions: &[usize],
    fb_terms: usize,
    docs: &ScoredDocuments,
    index: &dyn Index,
    field: &str,
  ) -> Result<FeatureVector, IndexError> {
    if positions.is_empty() {
      return Ok(FeatureVector::new());
    }

    let total_docs = index.total_docs();
    let vectors = self.fetch_vectors(positions, docs, index, field, total_docs)?;
    let norms: Vec<f64> = vectors.iter().map(FeatureVector::l2_norm).collect();
    let vocab: BTreeSet<&str> = vectors.iter().flat_map(FeatureVector::terms).collect();
    let count = vectors.len() as f64;

    let mut mean = FeatureVector::new();
    for term in vocab {
      let sum: f64 = vectors
        .iter()
        .zip(&norms)
        .filter(|(_, norm)| **norm > MIN_FEEDBACK_NORM)
        .map(|(vector, norm)| vector.weight(term) as f64 / norm)
        .sum();
      mean.add_term_weight(term, (sum / count) as f32);
    }

    mean.prune_to_size(fb_terms);
    mean.scale_to_unit_l2_norm();
    Ok(mean)
  }

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
      .map(|&i| self.filter.document_vector(docs.ids[i], index, field, total_docs))
      .collect()
  }

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
      .map(|&i| self.filter.document_vector(docs.ids[i], index, field, total_docs))
      .collect()
  }

  /// Builds the expanded model for `docs`.
  ///
  /// # Errors
  ///
  /// Propagates index failures while reading feedback documents.
  pub fn expansion_model(
    &self,
    docs: &ScoredDocuments,
    context: &RerankerContext<'_>,
  ) -> Result<FeatureVector, RerankError> {
    let config = &self.config;
    let query_vector = context.query_vector();

    let top: Vec<usize> = (0..docs.len().min(config.top_fb_docs)).collect();
    let relevant = self.mean_vector(&top, config.top_fb_terms, docs, context.index(), context.field())?;

    let non_relevant = if config.use_negative {
      // Tail first: the lowest-ranked document is the strongest negative.
      let bottom: Vec<usize> = (0..docs.len())
        .rev()
        .take(config.bottom_fb_docs)
        .collect();
      self.mean_vector(&bottom, config.bottom_fb_terms, docs, context.index(), context.field())?
    } else {
      FeatureVector::new()
    };

    let vocab: BTreeSet<&str> = query_vector
      .terms()
      .chain(relevant.terms())
      .chain(non_relevant.terms())
      .collect();

    let mut model = FeatureVector::new();
    for term in vocab {
      let weight = config.alpha * query_vector.weight(term) + config.beta * relevant.weight(term)
        - config.gamma * non_relevant.weight(term);
      if weight > 0.0 {
        model.add_term_weight(term, weight);
      }
    }

    debug!(
      qid = context.query_id(),
      relevant_docs = top.len(),
      terms = model.len(),
      "rocchio model built"
    );
    Ok(model)
  }

  /// Builds the weighted query that re-runs the expanded model.
  pub fn feedback_query(
    &self,
    docs: &ScoredDocuments,
    context: &RerankerContext<'_>,
  ) -> Result<Query, RerankError> {
    let model = self.expansion_model(docs, context)?;
    Query::from_feature_vector(context.field(), &model)
  }

  /// Reranks `docs`, reporting any failure instead of falling back.
  pub fn try_rerank(
    &self,
    docs: &ScoredDocuments,
    context: &RerankerContext<'_>,
  ) -> Result<ScoredDocuments, RerankError> {
    let query = self.feedback_query(docs, context)?;

    if self.config.output_query {
      info!(
        qid = context.query_id(),
        original = %context.query(),
        expanded = %query,
        "rocchio expanded query"
      );
    } else {
      debug!(qid = context.query_id(), expanded = %query, "rocchio expanded query");
    }

    let results = context
      .index()
      .search(&query, self.config.hits, context.filter())?;
    Ok(results)
  }
}

impl Reranker for RocchioReranker {
  fn rerank(&self, docs: ScoredDocuments, context: &RerankerContext<'_>) -> ScoredDocuments {
    docs.assert_consistent();

    match self.try_rerank(&docs, context) {
      Ok(results) => results,
      Err(err) => {
        warn!(
          qid = context.query_id(),
          error = %err,
          "rocchio feedback failed, keeping original ranking"
        );
        docs
      }
    }
  }

  fn tag(&self) -> String {
    let c = &self.config;
    format!(
      "Rocchio(topFbDocs={},topFbTerms={},bottomFbDocs={},bottomFbTerms={},alpha={},beta={},gamma={})",
      c.top_fb_docs, c.top_fb_terms, c.bottom_fb_docs, c.bottom_fb_terms, c.alpha, c.beta, c.gamma
    )
  }
}
