//! Axiomatic retrieval functions F2-EXP and F2-LOG.
//!
//! Both share the length-normalized term frequency
//!
//! ```text
//!                  tf
//! tfNorm = --------------------------
//!          tf + s + s * dl / avgdl
//! ```
//!
//! and differ only in how they compute IDF.

use super::{Similarity, TermStats};
use crate::error::ConfigError;
use std::fmt;

/// Default value of the shared parameter `s`.
pub const DEFAULT_S: f32 = 0.5;

/// Default IDF exponent of F2-EXP.
pub const DEFAULT_K: f32 = 0.35;

fn validate_s(s: f32) -> Result<f32, ConfigError> {
  if !s.is_finite() || !(0.0..=1.0).contains(&s) {
    return Err(ConfigError::invalid("s", s, "must be between 0 and 1"));
  }
  Ok(s)
}

/// The shared term-frequency normalization.
///
/// Falls back to an average length of `1` when the field has no length
/// statistics.
fn tf_norm(s: f32, stats: &TermStats) -> f32 {
  let avgdl = if stats.avg_doc_len > 0.0 {
    stats.avg_doc_len
  } else {
    1.0
  };
  stats.tf / (stats.tf + s + s * stats.doc_len / avgdl)
}

/// `(N + 1) / df` with `df` floored to one.
fn inverse_doc_ratio(doc_freq: u64, total_docs: u64) -> f64 {
  (total_docs as f64 + 1.0) / doc_freq.max(1) as f64
}

/// Axiomatic F2-EXP: `idf = ((N + 1) / df) ^ k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct F2ExpSimilarity {
  s: f32,
  k: f32,
}

impl Default for F2ExpSimilarity {
  fn default() -> Self {
    Self {
      s: DEFAULT_S,
      k: DEFAULT_K,
    }
  }
}

impl F2ExpSimilarity {
  /// Creates an F2-EXP similarity.
  ///
  /// # Errors
  ///
  /// Fails if `s` is not within `[0, 1]` or if `k` is negative or not finite.
  pub fn new(s: f32, k: f32) -> Result<Self, ConfigError> {
    let s = validate_s(s)?;
    if !k.is_finite() || k < 0.0 {
      return Err(ConfigError::invalid("k", k, "must be a non-negative finite value"));
    }
    Ok(Self { s, k })
  }

  pub fn s(&self) -> f32 {
    self.s
  }

  pub fn k(&self) -> f32 {
    self.k
  }
}

impl Similarity for F2ExpSimilarity {
  fn idf(&self, doc_freq: u64, total_docs: u64) -> f32 {
    inverse_doc_ratio(doc_freq, total_docs).powf(self.k as f64) as f32
  }

  fn score(&self, boost: f32, stats: &TermStats) -> f32 {
    boost * self.idf(stats.doc_freq, stats.total_docs) * tf_norm(self.s, stats)
  }
}

impl fmt::Display for F2ExpSimilarity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "F2Exp(s={},k={})", self.s, self.k)
  }
}

/// Axiomatic F2-LOG: `idf = ln((N + 1) / df)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct F2LogSimilarity {
  s: f32,
}

impl Default for F2LogSimilarity {
  fn default() -> Self {
    Self { s: DEFAULT_S }
  }
}

impl F2LogSimilarity {
  /// Creates an F2-LOG similarity.
  ///
  /// # Errors
  ///
  /// Fails if `s` is not within `[0, 1]`.
  pub fn new(s: f32) -> Result<Self, ConfigError> {
    Ok(Self { s: validate_s(s)? })
  }

  pub fn s(&self) -> f32 {
    self.s
  }
}

impl Similarity for F2LogSimilarity {
  fn idf(&self, doc_freq: u64, total_docs: u64) -> f32 {
    inverse_doc_ratio(doc_freq, total_docs).ln() as f32
  }

  fn score(&self, boost: f32, stats: &TermStats) -> f32 {
    boost * self.idf(stats.doc_freq, stats.total_docs) * tf_norm(self.s, stats)
  }
}

impl fmt::Display for F2LogSimilarity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "F2Log(s={})", self.s)
  }
}
