//! Error types for configuration, index access, and reranking.

use crate::types::DocId;
use thiserror::Error;

/// Errors raised while building components from parameters or config files.
///
/// These are surfaced synchronously at construction time; nothing in a
/// running cascade produces a `ConfigError`.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("illegal {name} value: {value}, {reason}")]
  InvalidParameter {
    name: &'static str,
    value: f64,
    reason: &'static str,
  },

  #[error("malformed stopword on line {line}: {word:?}")]
  MalformedStopword { line: usize, word: String },

  #[error("unknown reranker: {0}")]
  UnknownReranker(String),

  #[error("config parse error: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

impl ConfigError {
  pub(crate) fn invalid(name: &'static str, value: impl Into<f64>, reason: &'static str) -> Self {
    Self::InvalidParameter {
      name,
      value: value.into(),
      reason,
    }
  }
}

/// Errors reported by an [`Index`](crate::index::Index) collaborator.
#[derive(Debug, Error)]
pub enum IndexError {
  #[error("document not found: {0}")]
  DocumentNotFound(DocId),

  #[error("index unavailable: {0}")]
  Unavailable(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

/// Errors produced inside a reranking stage.
///
/// Stages log these and fall back to their input, so they never cross the
/// [`Reranker::rerank`](crate::rerank::Reranker::rerank) boundary.
#[derive(Debug, Error)]
pub enum RerankError {
  #[error("index error: {0}")]
  Index(#[from] IndexError),

  #[error("feedback model has no terms")]
  EmptyModel,

  #[error("non-finite weight {weight} for term {term:?}")]
  InvalidWeight { term: String, weight: f32 },
}
