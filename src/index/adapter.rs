//! Defines the `Index` trait, the retrieval collaborator rerankers talk to.

use crate::error::IndexError;
use crate::filter::FilterExpr;
use crate::query::Query;
use crate::types::{CollectionStatistics, DocId, ScoredDocuments, TermFreq};

/// A lazily-read stream of one document field's term statistics.
///
/// Each item is fallible because a backing store may fail part-way through a
/// read, not only when the stream is opened.
pub type TermVector<'a> = Box<dyn Iterator<Item = Result<TermFreq, IndexError>> + 'a>;

/// The interface rerankers need from an inverted index.
///
/// `Index` abstracts over posting storage, term dictionaries and on-disk
/// formats; rerankers only ever read through it. Implementations are shared by
/// concurrent queries, hence the `Send` and `Sync` bounds, and any locking
/// they need lives behind this trait.
pub trait Index: Send + Sync {
  /// Executes a query and returns the top `k` hits by descending score.
  ///
  /// # Arguments
  ///
  /// * `query` - The weighted term query to score.
  /// * `k` - The maximum number of hits to return.
  /// * `filter` - An optional post-filter; documents it rejects are never
  ///   returned, and it does not change the scores of the others.
  fn search(
    &self,
    query: &Query,
    k: usize,
    filter: Option<&FilterExpr>,
  ) -> Result<ScoredDocuments, IndexError>;

  /// Fetches the term statistics of one field of one document.
  ///
  /// A document that exists but has no value for `field` yields an empty
  /// stream.
  fn term_vector(&self, id: DocId, field: &str) -> Result<TermVector<'_>, IndexError>;

  /// Field-level statistics used for the average field length.
  fn collection_statistics(&self, field: &str) -> Result<CollectionStatistics, IndexError>;

  /// Number of documents whose `field` contains `term`.
  fn doc_frequency(&self, term: &str, field: &str) -> Result<u64, IndexError>;

  /// Number of live documents in the index.
  fn total_docs(&self) -> u64;
}
