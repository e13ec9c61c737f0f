//! RM3 pseudo-relevance feedback reranker.

use super::relevance_model::{FeedbackSelection, RelevanceModelEstimator};
use super::{Reranker, RerankerContext};
use crate::error::{ConfigError, RerankError};
use crate::feature_vector::FeatureVector;
use crate::query::Query;
use crate::stopwords::Stopwords;
use crate::types::ScoredDocuments;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Parameters of an [`Rm3Reranker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rm3Config {
  /// Maximum number of feedback documents.
  pub fb_docs: usize,
  /// Terms kept per feedback document and in the relevance model.
  pub fb_terms: usize,
  /// Interpolation weight of the original query, in `[0, 1]`.
  pub original_query_weight: f32,
  /// Size of the candidate pool requested when re-running the expanded query.
  pub hits: usize,
  /// Log the expanded query at `info` level instead of `debug`.
  pub output_query: bool,
  pub selection: FeedbackSelection,
  pub max_term_length: Option<usize>,
  /// Feedback terms occurring in more than this share of documents are dropped.
  pub max_df_ratio: Option<f32>,
}

impl Default for Rm3Config {
  fn default() -> Self {
    Self {
      fb_docs: 50,
      fb_terms: 20,
      original_query_weight: 0.5,
      hits: 1000,
      output_query: false,
      selection: FeedbackSelection::RankCutoff,
      max_term_length: None,
      max_df_ratio: None,
    }
  }
}

impl Rm3Config {
  /// Checks every parameter, reporting the first illegal one.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let weight = self.original_query_weight;
    if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
      return Err(ConfigError::invalid(
        "original_query_weight",
        weight,
        "must be in the interval [0..1]",
      ));
    }
    if self.fb_terms == 0 {
      return Err(ConfigError::invalid("fb_terms", self.fb_terms as f64, "must be at least 1"));
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
    if let FeedbackSelection::ScoreThreshold { min_score } = self.selection {
      if !min_score.is_finite() {
        return Err(ConfigError::invalid("min_score", min_score, "must be finite"));
      }
    }
    Ok(())
  }
}

/// Expands the query with a relevance model estimated from the input ranking
/// and re-runs it against the index.
///
/// Failures inside a rerank call (an unreadable feedback document, an
/// expanded query that cannot be built, a failed search) are logged and the
/// input ranking is returned unchanged.
#[derive(Debug, Clone)]
pub struct Rm3Reranker {
  config: Rm3Config,
  estimator: RelevanceModelEstimator,
}

impl Rm3Reranker {
  /// Creates an RM3 reranker.
  ///
  /// # Arguments
  ///
  /// * `config` - RM3 parameters; validated here.
  /// * `stopwords` - Shared stopword set used for filtering feedback terms.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::InvalidParameter`] if `config` is invalid.
  pub fn new(config: Rm3Config, stopwords: Arc<Stopwords>) -> Result<Self, ConfigError> {
    config.validate()?;

    let estimator = RelevanceModelEstimator::new(config.fb_docs, config.fb_terms, stopwords)
      .with_selection(config.selection)
      .with_max_term_length(config.max_term_length)
      .with_max_df_ratio(config.max_df_ratio);

    Ok(Self { config, estimator })
  }

  pub fn config(&self) -> &Rm3Config {
    &self.config
  }

  /// Builds the expanded model for `docs`.
  ///
  /// An empty relevance model means no expansion: the query vector is used
  /// as-is, as if the original query weight were `1.0`.
  ///
  /// # Errors
  ///
  /// Propagates index failures from feedback estimation.
  pub fn expansion_model(
    &self,
    docs: &ScoredDocuments,
    context: &RerankerContext<'_>,
  ) -> Result<FeatureVector, RerankError> {
    let query_vector = context.query_vector();
    let relevance_model = self
      .estimator
      .try_estimate(docs, context.index(), context.field())?;

    if relevance_model.is_empty() {
      debug!(qid = context.query_id(), "empty relevance model, query not expanded");
      return Ok(query_vector);
    }

    Ok(FeatureVector::interpolate(
      &query_vector,
      &relevance_model,
      self.config.original_query_weight,
    ))
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
        "rm3 expanded query"
      );
    } else {
      debug!(qid = context.query_id(), expanded = %query, "rm3 expanded query");
    }

    let results = context
      .index()
      .search(&query, self.config.hits, context.filter())?;
    Ok(results)
  }
}

impl Reranker for Rm3Reranker {
  fn rerank(&self, docs: ScoredDocuments, context: &RerankerContext<'_>) -> ScoredDocuments {
    docs.assert_consistent();

    match self.try_rerank(&docs, context) {
      Ok(results) => results,
      Err(err) => {
        warn!(
          qid = context.query_id(),
          error = %err,
          "rm3 feedback failed, keeping original ranking"
        );
        docs
      }
    }
  }

  fn tag(&self) -> String {
    format!(
      "Rm3(fbDocs={},fbTerms={},originalQueryWeight={})",
      self.config.fb_docs, self.config.fb_terms, self.config.original_query_weight
    )
  }
}
