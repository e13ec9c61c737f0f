//! Post-filter expressions over stored document fields.
//!
//! This module provides an Abstract Syntax Tree (AST) for boolean filters that
//! an index applies to candidate documents before ranking them. A filter only
//! decides membership; it never contributes to the score.

use crate::types::Document;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An enum representing the nodes of a filter expression AST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpr {
  /// A comparison between a stored field and a value.
  ///
  /// This is the leaf node of the expression tree, representing a condition
  /// like "year >= 1990" or "lang == 'en'". A document without the field never
  /// matches a comparison.
  Compare {
    /// The name of the stored field to compare.
    field: String,
    /// The comparison operator to use.
    op: CompareOp,
    /// The value to compare against.
    value: FilterValue,
  },
  /// True only if all the sub-expressions are true.
  And(Vec<FilterExpr>),
  /// True if at least one of the sub-expressions is true.
  Or(Vec<FilterExpr>),
  /// Inverts the result of the sub-expression.
  Not(Box<FilterExpr>),
}

/// The set of comparison operators available for filter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
  /// Equal to (`==`)
  Eq,
  /// Not equal to (`!=`)
  Ne,
  /// Less than (`<`)
  Lt,
  /// Less than or equal to (`<=`)
  Le,
  /// Greater than (`>`)
  Gt,
  /// Greater than or equal to (`>=`)
  Ge,
  /// Substring containment
  Contains,
}

/// Represents the possible types of values used in filter expressions.
///
/// The `#[serde(untagged)]` attribute allows for flexible deserialization from
/// JSON, as it will try to match the value to one of the variants without
/// requiring a specific tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
  /// A string value.
  String(String),
  /// A floating-point number value.
  Number(f64),
  /// A boolean value.
  Bool(bool),
}

impl FilterExpr {
  /// Shorthand for a [`FilterExpr::Compare`] leaf.
  pub fn compare(field: impl Into<String>, op: CompareOp, value: FilterValue) -> Self {
    Self::Compare {
      field: field.into(),
      op,
      value,
    }
  }

  /// Evaluates the expression against a document's stored fields.
  pub fn matches(&self, doc: &Document) -> bool {
    match self {
      Self::Compare { field, op, value } => match doc.field(field) {
        Some(stored) => compare(stored, *op, value),
        None => false,
      },
      Self::And(exprs) => exprs.iter().all(|e| e.matches(doc)),
      Self::Or(exprs) => exprs.iter().any(|e| e.matches(doc)),
      Self::Not(expr) => !expr.matches(doc),
    }
  }
}

fn compare(stored: &str, op: CompareOp, value: &FilterValue) -> bool {
  match op {
    CompareOp::Contains => contains(stored, value),
    CompareOp::Eq => ordering(stored, value) == Some(Ordering::Equal),
    CompareOp::Ne => ordering(stored, value) != Some(Ordering::Equal),
    CompareOp::Lt => ordering(stored, value) == Some(Ordering::Less),
    CompareOp::Le => matches!(ordering(stored, value), Some(Ordering::Less | Ordering::Equal)),
    CompareOp::Gt => ordering(stored, value) == Some(Ordering::Greater),
    CompareOp::Ge => matches!(ordering(stored, value), Some(Ordering::Greater | Ordering::Equal)),
  }
}

fn contains(stored: &str, value: &FilterValue) -> bool {
  match value {
    FilterValue::String(s) => stored.contains(s.as_str()),
    FilterValue::Number(n) => stored.contains(&n.to_string()),
    FilterValue::Bool(b) => stored.contains(&b.to_string()),
  }
}

/// Orders a stored value against a filter value.
///
/// Stored values are text; numbers and booleans are parsed on demand. A value
/// that does not parse is incomparable and fails every ordering test.
fn ordering(stored: &str, value: &FilterValue) -> Option<Ordering> {
  match value {
    FilterValue::String(s) => Some(stored.cmp(s.as_str())),
    FilterValue::Number(n) => stored.trim().parse::<f64>().ok().and_then(|v| v.partial_cmp(n)),
    FilterValue::Bool(b) => stored.trim().parse::<bool>().ok().map(|v| v.cmp(b)),
  }
}
