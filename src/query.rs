//! Weighted disjunctive term queries.

use crate::error::RerankError;
use crate::feature_vector::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One `SHOULD` clause of a [`Query`]: a term and its boost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerm {
  pub term: String,
  pub boost: f32,
}

/// A disjunction of boosted term clauses over a single field.
///
/// A document matches if it contains at least one clause term; its score is
/// the sum of the matching clauses' similarity scores, each scaled by the
/// clause boost. Repeated terms are kept as separate clauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
  /// The field every clause is evaluated against.
  pub field: String,
  /// Clauses in evaluation (and rendering) order.
  pub clauses: Vec<WeightedTerm>,
}

impl Query {
  /// Creates a query with no clauses.
  pub fn new(field: impl Into<String>) -> Self {
    Self {
      field: field.into(),
      clauses: Vec::new(),
    }
  }

  /// A bag-of-words query: one clause with boost 1 per analyzed term.
  pub fn from_terms<I, S>(field: impl Into<String>, terms: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    terms
      .into_iter()
      .fold(Self::new(field), |query, term| query.clause(term, 1.0))
  }

  /// Renders a feature vector as a query, each term boosted by its weight.
  ///
  /// Clauses are ordered by weight descending, then term ascending.
  ///
  /// # Errors
  ///
  /// [`RerankError::EmptyModel`] if the vector has no terms, and
  /// [`RerankError::InvalidWeight`] if any weight is NaN or infinite.
  pub fn from_feature_vector(field: impl Into<String>, vector: &FeatureVector) -> Result<Self, RerankError> {
    if vector.is_empty() {
      return Err(RerankError::EmptyModel);
    }

    let mut query = Self::new(field);
    for (term, weight) in vector.ordered() {
      if !weight.is_finite() {
        return Err(RerankError::InvalidWeight {
          term: term.to_string(),
          weight,
        });
      }
      query = query.clause(term, weight);
    }
    Ok(query)
  }

  /// Appends a clause.
  pub fn clause(mut self, term: impl Into<String>, boost: f32) -> Self {
    self.clauses.push(WeightedTerm {
      term: term.into(),
      boost,
    });
    self
  }

  pub fn is_empty(&self) -> bool {
    self.clauses.is_empty()
  }
}

impl fmt::Display for Query {
  /// Lucene-style rendering: `field:term` or `field:term^boost` per clause.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, clause) in self.clauses.iter().enumerate() {
      if i > 0 {
        f.write_str(" ")?;
      }
      if clause.boost == 1.0 {
        write!(f, "{}:{}", self.field, clause.term)?;
      } else {
        write!(f, "{}:{}^{}", self.field, clause.term, clause.boost)?;
      }
    }
    Ok(())
  }
}
