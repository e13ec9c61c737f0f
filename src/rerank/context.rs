//! Per-query context shared by every stage of a cascade.

use crate::analysis::Analyzer;
use crate::feature_vector::FeatureVector;
use crate::filter::FilterExpr;
use crate::index::Index;
use crate::query::Query;

/// Type alias for query identifiers (e.g. a TREC topic number).
pub type QueryId = String;

/// An immutable bundle describing the query being reranked.
///
/// One context is built per query and handed by reference to every stage. It
/// borrows the index for the lifetime `'a`; the index is the only long-lived,
/// shared piece, everything else belongs to this query alone.
pub struct RerankerContext<'a> {
  /// The index the original ranking came from.
  index: &'a dyn Index,
  query_id: QueryId,
  query_text: String,
  query_tokens: Vec<String>,
  /// The original query, as run against `field`.
  query: Query,
  /// The field queries run against and term vectors are read from.
  field: String,
  /// An optional post-filter honored by any stage that re-queries the index.
  filter: Option<FilterExpr>,
}

impl<'a> RerankerContext<'a> {
  /// Creates a context, tokenizing `query_text` with `analyzer`.
  ///
  /// # Arguments
  ///
  /// * `index` - The index rerankers may re-query or read term vectors from.
  /// * `analyzer` - The analyzer used to tokenize the query text. This should
  ///   be the same analyzer the index was built with.
  /// * `query_id` - An identifier for the query, used in logs.
  /// * `query_text` - The raw query text.
  /// * `field` - The field to query and to pull feedback statistics from.
  pub fn new(
    index: &'a dyn Index,
    analyzer: &Analyzer,
    query_id: impl Into<QueryId>,
    query_text: impl Into<String>,
    field: impl Into<String>,
  ) -> Self {
    let query_text = query_text.into();
    let field = field.into();
    let query_tokens = analyzer.analyze(&query_text);
    let query = Query::from_terms(field.clone(), query_tokens.iter().cloned());

    Self {
      index,
      query_id: query_id.into(),
      query_text,
      query_tokens,
      query,
      field,
      filter: None,
    }
  }

  /// Attaches a post-filter. Consumes the context, so it can only be done
  /// before the context is shared.
  pub fn with_filter(mut self, filter: FilterExpr) -> Self {
    self.filter = Some(filter);
    self
  }

  pub fn index(&self) -> &'a dyn Index {
    self.index
  }

  pub fn query_id(&self) -> &str {
    &self.query_id
  }

  pub fn query_text(&self) -> &str {
    &self.query_text
  }

  /// The analyzed query terms, in query order.
  pub fn query_tokens(&self) -> &[String] {
    &self.query_tokens
  }

  /// The analyzed query as a bag-of-words vector scaled to unit L2 norm.
  ///
  /// Built from [`query_tokens`](Self::query_tokens), so it always agrees
  /// with the query that produced the first-pass ranking.
  pub fn query_vector(&self) -> FeatureVector {
    let mut vector = FeatureVector::from_terms(self.query_tokens.iter().map(String::as_str));
    vector.scale_to_unit_l2_norm();
    vector
  }

  /// The original bag-of-words query.
  pub fn query(&self) -> &Query {
    &self.query
  }

  pub fn field(&self) -> &str {
    &self.field
  }

  pub fn filter(&self) -> Option<&FilterExpr> {
    self.filter.as_ref()
  }
}
