//! Core data types shared by the index collaborator and the rerankers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Type alias for external (collection) document identifiers.
///
/// These are the identifiers a collection assigns to its documents, e.g.
/// `"LA010189-0001"`. They are used to break score ties deterministically.
pub type EntityId = String;

/// Type alias for internal, index-local document identifiers.
///
/// An internal id is only meaningful to the index that produced it; it is what
/// rerankers hand back to the index when fetching term vectors.
pub type DocId = u32;

/// A stored document: its external id plus named text fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  /// The external collection identifier of the document.
  pub id: EntityId,
  /// Stored field values keyed by field name.
  #[serde(default, skip_serializing_if = "HashMap::is_empty")]
  pub fields: HashMap<String, String>,
}

impl Document {
  /// Creates a document with no fields.
  pub fn new(id: impl Into<EntityId>) -> Self {
    Self {
      id: id.into(),
      fields: HashMap::new(),
    }
  }

  /// Adds a field value, replacing any previous value for the same name.
  ///
  /// This is useful for building up documents in a chained manner.
  pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.fields.insert(name.into(), value.into());
    self
  }

  /// Returns the stored value of a field, if present.
  pub fn field(&self, name: &str) -> Option<&str> {
    self.fields.get(name).map(String::as_str)
  }
}

/// A ranked result list stored as three parallel sequences.
///
/// `documents[i]`, `ids[i]` and `scores[i]` describe the same ranked item at
/// position `i`. Every retrieval or rerank step produces a fresh instance; a
/// stage never edits the list it was given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocuments {
  /// The stored documents, in rank order.
  pub documents: Vec<Document>,
  /// The internal ids as used by the index.
  pub ids: Vec<DocId>,
  /// Scores assigned by the index's similarity (or by a reranker).
  pub scores: Vec<f32>,
}

impl ScoredDocuments {
  /// Creates an empty result list.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates an empty result list with room for `capacity` items.
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      documents: Vec::with_capacity(capacity),
      ids: Vec::with_capacity(capacity),
      scores: Vec::with_capacity(capacity),
    }
  }

  /// Appends one ranked item to all three sequences.
  pub fn push(&mut self, document: Document, id: DocId, score: f32) {
    self.documents.push(document);
    self.ids.push(id);
    self.scores.push(score);
  }

  /// Returns the number of ranked items.
  pub fn len(&self) -> usize {
    self.scores.len()
  }

  /// Returns `true` if there are no ranked items.
  pub fn is_empty(&self) -> bool {
    self.scores.is_empty()
  }

  /// Returns `true` if the three parallel sequences have equal length.
  pub fn is_consistent(&self) -> bool {
    self.documents.len() == self.scores.len() && self.ids.len() == self.scores.len()
  }

  /// Panics unless the three parallel sequences have equal length.
  ///
  /// A mismatch is a programming error in whatever produced the list, not a
  /// condition a reranker can recover from.
  pub fn assert_consistent(&self) {
    assert!(
      self.is_consistent(),
      "ScoredDocuments sequences differ in length: documents={}, ids={}, scores={}",
      self.documents.len(),
      self.ids.len(),
      self.scores.len()
    );
  }

  /// Iterates over `(document, internal id, score)` triples in rank order.
  pub fn iter(&self) -> impl Iterator<Item = (&Document, DocId, f32)> + '_ {
    self
      .documents
      .iter()
      .zip(self.ids.iter().copied())
      .zip(self.scores.iter().copied())
      .map(|((document, id), score)| (document, id, score))
  }
}

impl FromIterator<(Document, DocId, f32)> for ScoredDocuments {
  fn from_iter<I: IntoIterator<Item = (Document, DocId, f32)>>(iter: I) -> Self {
    let mut docs = ScoredDocuments::new();
    for (document, id, score) in iter {
      docs.push(document, id, score);
    }
    docs
  }
}

/// A term together with its frequency inside one document field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermFreq {
  /// The indexed term.
  pub term: String,
  /// Number of occurrences of the term in the field.
  pub freq: u64,
}

impl TermFreq {
  /// Creates a new term/frequency pair.
  pub fn new(term: impl Into<String>, freq: u64) -> Self {
    Self {
      term: term.into(),
      freq,
    }
  }
}

/// Field-level statistics used to compute the average field length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStatistics {
  /// Number of documents that have a value for the field.
  pub doc_count: u64,
  /// Sum of the lengths (in tokens) of the field across all documents.
  pub sum_total_term_freq: u64,
}

impl CollectionStatistics {
  /// Returns the average field length, or `0.0` for an empty field.
  ///
  /// Similarities guard against the zero case themselves.
  pub fn avg_field_length(&self) -> f32 {
    if self.doc_count == 0 {
      return 0.0;
    }
    (self.sum_total_term_freq as f64 / self.doc_count as f64) as f32
  }
}
