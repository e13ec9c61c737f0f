//! Term-weighting similarities used by the index to score query clauses.
//!
//! A similarity turns the statistics of one term occurring in one document
//! into a nonnegative score contribution. Similarities are stateless apart
//! from their validated parameters, so one instance can be shared by any
//! number of concurrent searches.
//!
//! # Available Similarities
//!
//! - [`Bm25Similarity`]: Okapi BM25 with Lucene's "accurate" length norm.
//! - [`F2ExpSimilarity`]: axiomatic F2-EXP.
//! - [`F2LogSimilarity`]: axiomatic F2-LOG.

/// BM25 with a non-negative IDF.
pub mod bm25;
/// Axiomatic F2-EXP and F2-LOG.
pub mod axiomatic;

pub use axiomatic::{F2ExpSimilarity, F2LogSimilarity};
pub use bm25::Bm25Similarity;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest average field length a similarity divides by.
pub const MIN_AVG_FIELD_LENGTH: f32 = 1e-10;

/// Everything a similarity needs to score one term in one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermStats {
  /// Occurrences of the term in the document field.
  pub tf: f32,
  /// Length of the document field, in tokens.
  pub doc_len: f32,
  /// Average length of the field across the collection.
  pub avg_doc_len: f32,
  /// Number of documents containing the term.
  pub doc_freq: u64,
  /// Number of documents in the collection.
  pub total_docs: u64,
}

/// A scoring function over term statistics.
///
/// The `Send` and `Sync` bounds allow a similarity to be shared by an index
/// that serves concurrent queries.
pub trait Similarity: fmt::Debug + fmt::Display + Send + Sync {
  /// Inverse document frequency of a term.
  fn idf(&self, doc_freq: u64, total_docs: u64) -> f32;

  /// Score contribution of one term in one document, multiplied by `boost`.
  fn score(&self, boost: f32, stats: &TermStats) -> f32;
}

/// Serializable choice of similarity and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SimilarityConfig {
  /// BM25 with saturation `k1` and length normalization `b`.
  Bm25 {
    #[serde(default = "default_k1")]
    k1: f32,
    #[serde(default = "default_b")]
    b: f32,
  },
  /// Axiomatic F2-EXP with parameter `s` and IDF exponent `k`.
  F2Exp {
    #[serde(default = "default_s")]
    s: f32,
    #[serde(default = "default_k")]
    k: f32,
  },
  /// Axiomatic F2-LOG with parameter `s`.
  F2Log {
    #[serde(default = "default_s")]
    s: f32,
  },
}

fn default_k1() -> f32 {
  0.9
}

fn default_b() -> f32 {
  0.4
}

fn default_s() -> f32 {
  axiomatic::DEFAULT_S
}

fn default_k() -> f32 {
  axiomatic::DEFAULT_K
}

impl Default for SimilarityConfig {
  fn default() -> Self {
    Self::Bm25 {
      k1: default_k1(),
      b: default_b(),
    }
  }
}

impl SimilarityConfig {
  /// Validates the parameters and builds the similarity.
  pub fn build(&self) -> Result<Box<dyn Similarity>, ConfigError> {
    let similarity: Box<dyn Similarity> = match *self {
      Self::Bm25 { k1, b } => Box::new(Bm25Similarity::new(k1, b)?),
      Self::F2Exp { s, k } => Box::new(F2ExpSimilarity::new(s, k)?),
      Self::F2Log { s } => Box::new(F2LogSimilarity::new(s)?),
    };
    Ok(similarity)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_config_defaults_from_json() {
    let config: SimilarityConfig = serde_json::from_str(r#"{"type":"bm25"}"#).unwrap();
    assert_eq!(config, SimilarityConfig::Bm25 { k1: 0.9, b: 0.4 });

    let config: SimilarityConfig = serde_json::from_str(r#"{"type":"f2exp","s":0.3}"#).unwrap();
    assert_eq!(config, SimilarityConfig::F2Exp { s: 0.3, k: 0.35 });
  }

  #[test]
  fn test_build_rejects_bad_parameters() {
    assert!(SimilarityConfig::Bm25 { k1: -1.0, b: 0.4 }.build().is_err());
    assert!(SimilarityConfig::F2Log { s: 1.5 }.build().is_err());
    assert!(SimilarityConfig::F2Log { s: 0.5 }.build().is_ok());
  }
}
