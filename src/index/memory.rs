//! In-memory index implementation.

use crate::analysis::Analyzer;
use crate::error::IndexError;
use crate::filter::FilterExpr;
use crate::index::adapter::{Index, TermVector};
use crate::query::Query;
use crate::similarity::{Bm25Similarity, Similarity, TermStats};
use crate::topk::BoundedHeap;
use crate::types::{CollectionStatistics, DocId, Document, EntityId, ScoredDocuments, TermFreq};
use std::collections::HashMap;

/// A single entry in a term's postings list.
#[derive(Debug, Clone, Copy)]
struct Posting {
    doc: DocId,
    freq: u64,
}

/// Postings, term vectors and length statistics of one field.
#[derive(Debug, Default)]
struct FieldIndex {
    postings: HashMap<String, Vec<Posting>>,
    /// Per-document term statistics, sorted by term.
    term_vectors: HashMap<DocId, Vec<TermFreq>>,
    lengths: HashMap<DocId, u64>,
    sum_total_term_freq: u64,
}

impl FieldIndex {
    fn add(&mut self, doc: DocId, freqs: HashMap<String, u64>) {
        let length: u64 = freqs.values().sum();
        self.lengths.insert(doc, length);
        self.sum_total_term_freq += length;

        let mut vector: Vec<TermFreq> = freqs
            .into_iter()
            .map(|(term, freq)| TermFreq { term, freq })
            .collect();
        vector.sort_by(|a, b| a.term.cmp(&b.term));

        for entry in &vector {
            self.postings
                .entry(entry.term.clone())
                .or_default()
                .push(Posting {
                    doc,
                    freq: entry.freq,
                });
        }
        self.term_vectors.insert(doc, vector);
    }

    fn statistics(&self) -> CollectionStatistics {
        CollectionStatistics {
            doc_count: self.lengths.len() as u64,
            sum_total_term_freq: self.sum_total_term_freq,
        }
    }
}

/// In-memory inverted index with per-field postings and term vectors.
///
/// Every stored field of an added document is analyzed and indexed, so any
/// field can serve as the query field or as the feedback field. Documents are
/// identified internally by their insertion position.
pub struct InMemIndex {
    analyzer: Analyzer,
    similarity: Box<dyn Similarity>,
    documents: Vec<Document>,
    fields: HashMap<String, FieldIndex>,
}

impl InMemIndex {
    /// Create a new empty in-memory index.
    pub fn new(analyzer: Analyzer, similarity: Box<dyn Similarity>) -> Self {
        Self {
            analyzer,
            similarity,
            documents: Vec::new(),
            fields: HashMap::new(),
        }
    }

    /// Analyzes and stores a document, returning its internal id.
    pub fn add_document(&mut self, document: Document) -> DocId {
        let id = self.documents.len() as DocId;
        for (name, text) in &document.fields {
            let freqs = self.analyzer.term_frequencies(text);
            self.fields.entry(name.clone()).or_default().add(id, freqs);
        }
        self.documents.push(document);
        id
    }

    /// Builds a bag-of-words query from raw text with this index's analyzer.
    pub fn parse_query(&self, field: &str, text: &str) -> Query {
        Query::from_terms(field, self.analyzer.analyze(text))
    }

    /// Retrieves a stored document by internal id.
    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.documents.get(id as usize)
    }

    /// The similarity used to score queries.
    pub fn similarity(&self) -> &dyn Similarity {
        self.similarity.as_ref()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Default for InMemIndex {
    fn default() -> Self {
        Self::new(Analyzer::default(), Box::new(Bm25Similarity::default()))
    }
}

impl Index for InMemIndex {
    fn search(
        &self,
        query: &Query,
        k: usize,
        filter: Option<&FilterExpr>,
    ) -> Result<ScoredDocuments, IndexError> {
        let Some(field) = self.fields.get(&query.field) else {
            return Ok(ScoredDocuments::new());
        };

        let avg_doc_len = field.statistics().avg_field_length();
        let total_docs = self.total_docs();

        // Clauses are visited in order so accumulated scores are reproducible.
        let mut scores: HashMap<DocId, f32> = HashMap::new();
        for clause in &query.clauses {
            let Some(postings) = field.postings.get(&clause.term) else {
                continue;
            };
            let doc_freq = postings.len() as u64;

            for posting in postings {
                let doc_len = field.lengths.get(&posting.doc).copied().unwrap_or(0);
                let stats = TermStats {
                    tf: posting.freq as f32,
                    doc_len: doc_len as f32,
                    avg_doc_len,
                    doc_freq,
                    total_docs,
                };
                *scores.entry(posting.doc).or_insert(0.0) +=
                    self.similarity.score(clause.boost, &stats);
            }
        }

        // Top-k with score ties broken by external id.
        let mut heap: BoundedHeap<(EntityId, DocId)> = BoundedHeap::new(k);
        for (doc, score) in scores {
            let document = &self.documents[doc as usize];
            if filter.is_some_and(|f| !f.matches(document)) {
                continue;
            }
            heap.push(score, (document.id.clone(), doc));
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|(score, (_, doc))| (self.documents[doc as usize].clone(), doc, score))
            .collect())
    }

    fn term_vector(&self, id: DocId, field: &str) -> Result<TermVector<'_>, IndexError> {
        if id as usize >= self.documents.len() {
            return Err(IndexError::DocumentNotFound(id));
        }

        match self.fields.get(field).and_then(|f| f.term_vectors.get(&id)) {
            Some(vector) => Ok(Box::new(vector.iter().cloned().map(Ok))),
            None => Ok(Box::new(std::iter::empty())),
        }
    }

    fn collection_statistics(&self, field: &str) -> Result<CollectionStatistics, IndexError> {
        Ok(self
            .fields
            .get(field)
            .map(FieldIndex::statistics)
            .unwrap_or_default())
    }

    fn doc_frequency(&self, term: &str, field: &str) -> Result<u64, IndexError> {
        Ok(self
            .fields
            .get(field)
            .and_then(|f| f.postings.get(term))
            .map_or(0, |postings| postings.len() as u64))
    }

    fn total_docs(&self) -> u64 {
        self.documents.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{CompareOp, FilterValue};
    use crate::stopwords::Stopwords;
    use std::sync::Arc;

    fn build_corpus() -> InMemIndex {
        let analyzer = Analyzer::new(Arc::new(Stopwords::english()));
        let bm25 = Bm25Similarity::new(0.9, 0.4).unwrap();
        let mut index = InMemIndex::new(analyzer, Box::new(bm25));
        for (id, text, year) in [
            ("doc-c", "rust programming systems language fast", "2015"),
            ("doc-a", "python programming scripting easy", "1991"),
            ("doc-b", "rust memory safety zero cost abstractions", "2015"),
        ] {
            index.add_document(
                Document::new(id)
                    .with_field("contents", text)
                    .with_field("year", year),
            );
        }
        index
    }

    #[test]
    fn test_search_finds_matching_docs() {
        let index = build_corpus();
        let query = index.parse_query("contents", "rust");
        let results = index.search(&query, 10, None).unwrap();

        let ids: Vec<_> = results.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(results.len(), 2);
        assert!(ids.contains(&"doc-c"));
        assert!(ids.contains(&"doc-b"));
        assert!(results.scores.iter().all(|s| *s > 0.0));
    }

    #[test]
    fn test_search_truncates_to_k() {
        let index = build_corpus();
        let query = index.parse_query("contents", "rust programming");
        let results = index.search(&query, 1, None).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.is_consistent());
    }

    #[test]
    fn test_equal_scores_break_ties_by_external_id() {
        let mut index = InMemIndex::default();
        index.add_document(Document::new("zzz").with_field("contents", "same words"));
        index.add_document(Document::new("aaa").with_field("contents", "same words"));

        let results = index
            .search(&index.parse_query("contents", "same"), 10, None)
            .unwrap();
        assert_eq!(results.scores[0], results.scores[1]);
        assert_eq!(results.documents[0].id, "aaa");
        assert_eq!(results.ids, vec![1, 0]);
    }

    #[test]
    fn test_filter_restricts_results() {
        let index = build_corpus();
        let query = index.parse_query("contents", "programming");
        let filter = FilterExpr::compare("year", CompareOp::Lt, FilterValue::Number(2000.0));
        let results = index.search(&query, 10, Some(&filter)).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results.documents[0].id, "doc-a");
    }

    #[test]
    fn test_term_vector_is_sorted() {
        let index = build_corpus();
        let terms: Vec<_> = index
            .term_vector(0, "contents")
            .unwrap()
            .map(|t| t.unwrap().term)
            .collect();
        assert_eq!(terms, vec!["fast", "language", "programming", "rust", "systems"]);

        assert!(index.term_vector(0, "missing").unwrap().next().is_none());
        assert!(matches!(
            index.term_vector(99, "contents"),
            Err(IndexError::DocumentNotFound(99))
        ));
    }

    #[test]
    fn test_statistics() {
        let index = build_corpus();
        let stats = index.collection_statistics("contents").unwrap();
        assert_eq!(stats.doc_count, 3);
        assert_eq!(stats.sum_total_term_freq, 15);
        assert_eq!(index.doc_frequency("rust", "contents").unwrap(), 2);
        assert_eq!(index.doc_frequency("java", "contents").unwrap(), 0);
        assert_eq!(index.total_docs(), 3);
    }
}
