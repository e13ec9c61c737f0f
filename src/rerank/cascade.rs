//! The reranker cascade: an ordered pipeline of stages.

use super::{Reranker, RerankerContext};
use crate::types::ScoredDocuments;
use tracing::debug;

/// An ordered pipeline of [`Reranker`] stages.
///
/// `run` folds the input through every stage in registration order; the
/// output of stage *i* is the input of stage *i + 1*. Stages are fixed when the
/// cascade is built and are never skipped or reordered. A cascade with no
/// stages returns its input unchanged.
///
/// Create a `RerankerCascade` using the [`RerankerCascadeBuilder`].
///
/// # Examples
///
/// ```rust
/// use feedrank::prelude::*;
///
/// let index = InMemIndex::default();
/// let analyzer = Analyzer::default();
/// let context = RerankerContext::new(&index, &analyzer, "q1", "anything", "contents");
///
/// let cascade = RerankerCascade::builder()
///     .with(Box::new(IdentityReranker))
///     .with(Box::new(TiebreakerReranker))
///     .build();
///
/// let mut docs = ScoredDocuments::new();
/// docs.push(Document::new("b"), 1, 2.0);
/// docs.push(Document::new("a"), 0, 2.0);
///
/// let reranked = cascade.run(docs, &context);
/// assert_eq!(reranked.documents[0].id, "a");
/// assert!(reranked.scores[0] > reranked.scores[1]);
/// ```
#[derive(Default)]
pub struct RerankerCascade {
  /// A fixed tag for the whole cascade; derived from the stages when unset.
  tag: Option<String>,
  rerankers: Vec<Box<dyn Reranker>>,
}

impl RerankerCascade {
  /// Creates a new `RerankerCascadeBuilder` to construct a cascade.
  pub fn builder() -> RerankerCascadeBuilder {
    RerankerCascadeBuilder::new()
  }

  /// Runs `docs` through every stage in order.
  ///
  /// # Panics
  ///
  /// Panics if the parallel sequences of `docs` differ in length.
  pub fn run(&self, docs: ScoredDocuments, context: &RerankerContext<'_>) -> ScoredDocuments {
    docs.assert_consistent();

    self.rerankers.iter().fold(docs, |docs, reranker| {
      let input = docs.len();
      let output = reranker.rerank(docs, context);
      debug!(
        qid = context.query_id(),
        stage = %reranker.tag(),
        input,
        output = output.len(),
        "reranker stage finished"
      );
      output
    })
  }

  /// The configured tag, or the stage tags joined with `+`.
  pub fn tag(&self) -> String {
    match &self.tag {
      Some(tag) => tag.clone(),
      None => self
        .rerankers
        .iter()
        .map(|r| r.tag())
        .collect::<Vec<_>>()
        .join("+"),
    }
  }

  /// Number of stages.
  pub fn len(&self) -> usize {
    self.rerankers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rerankers.is_empty()
  }
}

/// A cascade is itself a stage, so pipelines can be nested.
impl Reranker for RerankerCascade {
  fn rerank(&self, docs: ScoredDocuments, context: &RerankerContext<'_>) -> ScoredDocuments {
    self.run(docs, context)
  }

  fn tag(&self) -> String {
    RerankerCascade::tag(self)
  }
}

/// A builder for creating `RerankerCascade` instances.
#[derive(Default)]
pub struct RerankerCascadeBuilder {
  tag: Option<String>,
  rerankers: Vec<Box<dyn Reranker>>,
}

impl RerankerCascadeBuilder {
  /// Creates a new, empty `RerankerCascadeBuilder`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a stage. Stages run in the order they are added.
  pub fn with(mut self, reranker: Box<dyn Reranker>) -> Self {
    self.rerankers.push(reranker);
    self
  }

  /// Sets a fixed tag for the cascade.
  pub fn tag(mut self, tag: impl Into<String>) -> Self {
    self.tag = Some(tag.into());
    self
  }

  /// Builds the `RerankerCascade` with the configured stages.
  pub fn build(self) -> RerankerCascade {
    RerankerCascade {
      tag: self.tag,
      rerankers: self.rerankers,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::analysis::Analyzer;
  use crate::index::InMemIndex;
  use crate::rerank::IdentityReranker;
  use crate::types::Document;

  /// Multiplies every score, so stage order is observable.
  struct Scale(f32);

  impl Reranker for Scale {
    fn rerank(&self, docs: ScoredDocuments, _context: &RerankerContext<'_>) -> ScoredDocuments {
      ScoredDocuments {
        scores: docs.scores.iter().map(|s| s * self.0).collect(),
        ..docs
      }
    }

    fn tag(&self) -> String {
      format!("Scale({})", self.0)
    }
  }

  /// Adds a constant to every score.
  struct Shift(f32);

  impl Reranker for Shift {
    fn rerank(&self, docs: ScoredDocuments, _context: &RerankerContext<'_>) -> ScoredDocuments {
      ScoredDocuments {
        scores: docs.scores.iter().map(|s| s + self.0).collect(),
        ..docs
      }
    }

    fn tag(&self) -> String {
      format!("Shift({})", self.0)
    }
  }

  fn docs() -> ScoredDocuments {
    [(Document::new("a"), 0, 1.0), (Document::new("b"), 1, 2.0)]
      .into_iter()
      .collect()
  }

  #[test]
  fn test_empty_cascade_is_identity() {
    let index = InMemIndex::default();
    let analyzer = Analyzer::default();
    let context = RerankerContext::new(&index, &analyzer, "q", "text", "contents");

    let cascade = RerankerCascade::builder().build();
    assert!(cascade.is_empty());
    assert_eq!(cascade.run(docs(), &context), docs());
  }

  #[test]
  fn test_stages_run_in_registration_order() {
    let index = InMemIndex::default();
    let analyzer = Analyzer::default();
    let context = RerankerContext::new(&index, &analyzer, "q", "text", "contents");

    let scale_then_shift = RerankerCascade::builder()
      .with(Box::new(Scale(2.0)))
      .with(Box::new(Shift(1.0)))
      .build();
    assert_eq!(scale_then_shift.run(docs(), &context).scores, vec![3.0, 5.0]);

    let shift_then_scale = RerankerCascade::builder()
      .with(Box::new(Shift(1.0)))
      .with(Box::new(Scale(2.0)))
      .build();
    assert_eq!(shift_then_scale.run(docs(), &context).scores, vec![4.0, 6.0]);
  }

  #[test]
  fn test_tag() {
    let cascade = RerankerCascade::builder()
      .with(Box::new(IdentityReranker))
      .with(Box::new(Scale(2.0)))
      .build();
    assert_eq!(cascade.tag(), "Identity+Scale(2)");

    let named = RerankerCascade::builder().tag("bm25+rm3").build();
    assert_eq!(named.tag(), "bm25+rm3");
  }
}
