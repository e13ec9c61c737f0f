//! Reranking stages and the cascade that chains them.
//!
//! A [`Reranker`] takes a ranked list and returns a new one. Stages are
//! composed into a [`RerankerCascade`] at construction time and run strictly
//! in order, each receiving the previous stage's output.
//!
//! # Available Rerankers
//!
//! - [`IdentityReranker`]: passes its input through unchanged.
//! - [`Rm3Reranker`]: expands the query with an RM3 relevance model built from
//!   the top-ranked documents and re-runs it against the index.
//! - [`RocchioReranker`]: expands the query towards the mean of the top-ranked
//!   documents (and optionally away from the bottom-ranked ones) and re-runs it.
//! - [`TiebreakerReranker`]: imposes a strict total order on the final scores.
//!
//! # Example: Assembling a Pipeline
//!
//! ```rust
//! use feedrank::prelude::*;
//! use std::sync::Arc;
//!
//! let stopwords = Arc::new(Stopwords::english());
//! let rm3 = Rm3Reranker::new(Rm3Config::default(), stopwords).unwrap();
//!
//! let cascade = RerankerCascade::builder()
//!     .with(Box::new(rm3))
//!     .with(Box::new(TiebreakerReranker))
//!     .build();
//!
//! assert_eq!(cascade.len(), 2);
//! ```

pub mod cascade;
pub mod context;
pub mod registry;
pub mod relevance_model;
pub mod rm3;
pub mod rocchio;
pub mod tiebreaker;

pub use cascade::{RerankerCascade, RerankerCascadeBuilder};
pub use context::{QueryId, RerankerContext};
pub use registry::{RerankerFactory, RerankerKind, RerankerRegistry, RerankerSpec};
pub use relevance_model::{FeedbackSelection, RelevanceModelEstimator};
pub use rm3::{Rm3Config, Rm3Reranker};
pub use rocchio::{RocchioConfig, RocchioReranker};
pub use tiebreaker::TiebreakerReranker;

use crate::types::ScoredDocuments;

/// A single stage of a reranking pipeline.
///
/// A reranker consumes its input list and returns a fresh one. Implementations
/// must not fail outward: if a stage cannot do its work (for instance because
/// the index errors), it logs and returns its input unchanged so that the rest
/// of the cascade still runs.
///
/// The `Send` and `Sync` bounds let one pipeline serve concurrent queries.
pub trait Reranker: Send + Sync {
  /// Reranks `docs` for the query described by `context`.
  ///
  /// # Panics
  ///
  /// Implementations panic if the parallel sequences of `docs` differ in
  /// length; that is a bug in whatever produced the list.
  fn rerank(&self, docs: ScoredDocuments, context: &RerankerContext<'_>) -> ScoredDocuments;

  /// A short description of the stage and its parameters, used in run tags
  /// and log lines.
  fn tag(&self) -> String;
}

/// Passes its input through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityReranker;

impl Reranker for IdentityReranker {
  fn rerank(&self, docs: ScoredDocuments, _context: &RerankerContext<'_>) -> ScoredDocuments {
    docs.assert_consistent();
    docs
  }

  fn tag(&self) -> String {
    "Identity".to_string()
  }
}
