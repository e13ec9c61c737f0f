use feedrank::prelude::*;
use proptest::prelude::*;
use std::collections::HashMap;

fn arb_weights(max_terms: usize) -> impl Strategy<Value = HashMap<String, f32>> {
  prop::collection::hash_map("[a-z]{1,6}", 0.01f32..100.0, 1..max_terms)
}

/// Weights drawn from a handful of values, so ties are common.
fn arb_tied_weights(max_terms: usize) -> impl Strategy<Value = HashMap<String, f32>> {
  prop::collection::hash_map("[a-z]{1,4}", (1u8..5).prop_map(|w| w as f32 * 0.5), 0..max_terms)
}

fn rerank_with_tiebreaker(docs: ScoredDocuments) -> ScoredDocuments {
  let index = InMemIndex::default();
  let analyzer = Analyzer::default();
  let context = RerankerContext::new(&index, &analyzer, "prop", "", "contents");
  TiebreakerReranker.rerank(docs, &context)
}

proptest! {
  /// Normalizing twice changes nothing.
  #[test]
  fn unit_l2_norm_is_idempotent(weights in arb_weights(30)) {
    let mut once: FeatureVector = weights.into_iter().collect();
    once.scale_to_unit_l2_norm();
    let mut twice = once.clone();
    twice.scale_to_unit_l2_norm();

    prop_assert!((once.l2_norm() - 1.0).abs() < 1e-5);
    for (term, weight) in once.iter() {
      prop_assert!((twice.weight(term) - weight).abs() < 1e-6);
    }
  }

  /// λ = 1 yields `x`, λ = 0 yields `y`.
  #[test]
  fn interpolation_boundaries(x in arb_weights(20), y in arb_weights(20)) {
    let x: FeatureVector = x.into_iter().collect();
    let y: FeatureVector = y.into_iter().collect();

    let all_x = FeatureVector::interpolate(&x, &y, 1.0);
    let all_y = FeatureVector::interpolate(&x, &y, 0.0);

    prop_assert_eq!(&all_x, &x);
    prop_assert_eq!(&all_y, &y);
  }

  /// Pruning keeps exactly the `k` best terms of a brute-force sort.
  #[test]
  fn prune_matches_brute_force(weights in arb_tied_weights(40), k in 0usize..50) {
    let mut vector: FeatureVector = weights.clone().into_iter().collect();
    vector.prune_to_size(k);

    let mut expected: Vec<(String, f32)> = weights.into_iter().collect();
    expected.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    expected.truncate(k);

    prop_assert_eq!(vector.len(), expected.len());
    for (term, weight) in &expected {
      prop_assert!(vector.contains(term));
      prop_assert_eq!(vector.weight(term), *weight);
    }
  }

  /// At `docLen = avgDocLen` a higher tf scores strictly higher.
  #[test]
  fn bm25_increases_with_tf(
    k1 in 0.5f32..3.0,
    b in 0.0f32..=1.0,
    tf in 1u32..50,
    avg in 1.0f32..100.0,
    (df, n) in (1u64..1000).prop_flat_map(|n| (1..=n, Just(n))),
  ) {
    let bm25 = Bm25Similarity::new(k1, b).unwrap();
    let stats = |tf: u32| TermStats {
      tf: tf as f32,
      doc_len: avg,
      avg_doc_len: avg,
      doc_freq: df,
      total_docs: n,
    };
    prop_assert!(bm25.score(1.0, &stats(tf + 1)) > bm25.score(1.0, &stats(tf)));
  }

  /// Above the average length, a longer document scores strictly lower.
  #[test]
  fn bm25_decreases_with_length(
    k1 in 0.5f32..3.0,
    b in 0.1f32..=1.0,
    tf in 1u32..20,
    avg in 1.0f32..100.0,
    extra in 0.0f32..100.0,
    delta in 1.0f32..100.0,
  ) {
    let bm25 = Bm25Similarity::new(k1, b).unwrap();
    let stats = |doc_len: f32| TermStats {
      tf: tf as f32,
      doc_len,
      avg_doc_len: avg,
      doc_freq: 1,
      total_docs: 10,
    };
    let shorter = avg + extra;
    prop_assert!(bm25.score(1.0, &stats(shorter + delta)) < bm25.score(1.0, &stats(shorter)));
  }

  /// The tiebreaker keeps every document, yields strictly decreasing scores,
  /// and orders by (rounded score desc, docid asc).
  #[test]
  fn tiebreaker_is_total(entries in prop::collection::vec(("[a-d]{1,2}", 0u8..4), 0..30)) {
    let docs: ScoredDocuments = entries
      .iter()
      .enumerate()
      .map(|(i, (name, score))| (Document::new(name.as_str()), i as DocId, *score as f32 * 0.5))
      .collect();

    let mut expected: Vec<(f32, String)> = docs
      .iter()
      .map(|(doc, _, score)| (score, doc.id.clone()))
      .collect();
    expected.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let out = rerank_with_tiebreaker(docs);

    prop_assert_eq!(out.len(), entries.len());
    prop_assert!(out.scores.windows(2).all(|w| w[0] > w[1]));
    let names: Vec<&str> = out.documents.iter().map(|d| d.id.as_str()).collect();
    let expected_names: Vec<&str> = expected.iter().map(|(_, name)| name.as_str()).collect();
    prop_assert_eq!(names, expected_names);
  }
}
