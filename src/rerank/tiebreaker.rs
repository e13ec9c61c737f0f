//! Deterministic tie-breaking for final rankings.

use super::{Reranker, RerankerContext};
use crate::types::{DocId, Document, ScoredDocuments};

/// Scores are rounded to this many decimal places before sorting.
const ROUNDING_SCALE: f64 = 10_000.0;

/// Adjacent rounded scores this close form a tie group.
const TIE_EPSILON: f64 = 1e-4;

/// Per-position perturbation applied inside a tie group.
const TIE_PERTURBATION: f32 = 1e-6;

/// Imposes a strict total order on scores.
///
/// Scores are rounded to four decimals, the list is sorted by rounded score
/// descending and external document id ascending, and members of a tie group
/// are pushed apart by `1e-6` per position. Every input document is kept; only
/// scores and order change.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiebreakerReranker;

impl Reranker for TiebreakerReranker {
  fn rerank(&self, docs: ScoredDocuments, _context: &RerankerContext<'_>) -> ScoredDocuments {
    docs.assert_consistent();

    let ScoredDocuments {
      documents,
      ids,
      scores,
    } = docs;

    let mut entries: Vec<(Document, DocId, f32)> = documents
      .into_iter()
      .zip(ids)
      .zip(scores)
      .map(|((document, id), score)| (document, id, round_score(score)))
      .collect();

    entries.sort_by(|a, b| {
      b.2
        .total_cmp(&a.2)
        .then_with(|| a.0.id.cmp(&b.0.id))
        .then_with(|| a.1.cmp(&b.1))
    });

    let mut output = ScoredDocuments::with_capacity(entries.len());
    let mut previous: Option<(f32, f32)> = None;
    let mut dup = 0u32;

    for (document, id, rounded) in entries {
      let score = match previous {
        Some((prev_rounded, prev_final)) => {
          if (prev_rounded as f64 - rounded as f64) <= TIE_EPSILON {
            dup += 1;
          } else {
            dup = 0;
          }
          let perturbed = rounded - TIE_PERTURBATION * dup as f32;
          // The perturbation can vanish below f32 precision for large scores.
          if perturbed < prev_final {
            perturbed
          } else {
            next_below(prev_final)
          }
        }
        None => rounded,
      };

      previous = Some((rounded, score));
      output.push(document, id, score);
    }

    output
  }

  fn tag(&self) -> String {
    "Tiebreaker".to_string()
  }
}

/// Rounds `score` to four decimal places.
pub fn round_score(score: f32) -> f32 {
  ((score as f64 * ROUNDING_SCALE).round() / ROUNDING_SCALE) as f32
}

/// The largest `f32` strictly below `x`.
fn next_below(x: f32) -> f32 {
  if x.is_nan() || x == f32::NEG_INFINITY {
    return x;
  }
  if x == 0.0 {
    return -f32::from_bits(1);
  }
  let bits = x.to_bits();
  if x > 0.0 {
    f32::from_bits(bits - 1)
  } else {
    f32::from_bits(bits + 1)
  }
}
