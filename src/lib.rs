//! Feedrank - pseudo-relevance feedback and reranking over an inverted index.
//!
//! Feedrank takes a first-pass ranking from an [`Index`](index::Index), builds
//! an RM3 (or Rocchio) feedback model from its top documents, re-runs the
//! expanded query, and finishes with a deterministic tie-break. Stages are chained in a
//! [`RerankerCascade`](rerank::RerankerCascade) that can also host custom
//! rerankers.
//!
//! BM25 and the axiomatic F2-EXP / F2-LOG similarities are included, along with
//! an in-memory index for small collections and tests.

pub mod analysis;
pub mod config;
pub mod error;
pub mod feature_vector;
pub mod filter;
pub mod index;
pub mod query;
pub mod rerank;
pub mod similarity;
pub mod stopwords;
pub mod topk;
pub mod types;

pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::analysis::*;
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::feature_vector::*;
    pub use crate::filter::*;
    pub use crate::index::*;
    pub use crate::query::*;
    pub use crate::rerank::*;
    pub use crate::similarity::*;
    pub use crate::stopwords::*;
    pub use crate::topk::*;
    pub use crate::types::*;
}
