//! RM3 feedback pipeline over a small in-memory collection.
//!
//! Run with `RUST_LOG=feedrank=debug` to see every cascade stage.

use feedrank::prelude::*;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"{
  "similarity": { "type": "bm25", "k1": 0.9, "b": 0.4 },
  "stopwords": "english",
  "field": "contents",
  "rerankers": [
    { "type": "rm3", "fb_docs": 3, "fb_terms": 10, "original_query_weight": 0.5, "output_query": true },
    { "type": "tiebreak" }
  ]
}"#;

/// Sample posts for the demo.
fn sample_posts() -> Vec<(&'static str, &'static str, &'static str)> {
  vec![
    (
      "1",
      "Rust is a systems programming language that runs blazingly fast and guarantees thread safety.",
      "tutorial",
    ),
    (
      "2",
      "Learn how to build a search engine in Rust: indexing, ranking and query processing.",
      "tutorial",
    ),
    (
      "3",
      "Ranking functions such as BM25 weight query terms by frequency and rarity.",
      "reference",
    ),
    (
      "4",
      "Query expansion adds related terms from top ranked documents to the original query.",
      "reference",
    ),
    (
      "5",
      "Pseudo relevance feedback assumes the top ranked documents are relevant.",
      "reference",
    ),
    (
      "6",
      "Baking sourdough bread needs flour, water, salt and patience.",
      "cooking",
    ),
  ]
}

fn print_ranking(title: &str, docs: &ScoredDocuments) {
  println!("{}", title);
  for (rank, (doc, _, score)) in docs.iter().enumerate() {
    println!("  {:>2}. [{:.6}] {}", rank + 1, score, doc.id);
  }
  println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let config = FeedrankConfig::from_json_str(CONFIG)?;
  let stopwords = config.load_stopwords()?;
  let analyzer = Analyzer::new(stopwords.clone());

  let mut index = InMemIndex::new(analyzer.clone(), config.build_similarity()?);
  for (id, text, kind) in sample_posts() {
    index.add_document(
      Document::new(id)
        .with_field("contents", text)
        .with_field("kind", kind),
    );
  }

  let cascade = config.build_cascade_with(&stopwords)?;
  println!("Pipeline: {}\n", cascade.tag());

  let context = RerankerContext::new(&index, &analyzer, "demo-1", "ranking query terms", &config.field);
  let initial = index.search(context.query(), 1000, context.filter())?;
  print_ranking("First pass:", &initial);

  let reranked = cascade.run(initial, &context);
  print_ranking("After RM3 + tiebreak:", &reranked);

  // Same query, restricted to reference material.
  let filter = FilterExpr::compare("kind", CompareOp::Eq, FilterValue::String("reference".to_string()));
  let context = RerankerContext::new(&index, &analyzer, "demo-2", "ranking query terms", &config.field)
    .with_filter(filter);
  let initial = index.search(context.query(), 1000, context.filter())?;
  let reranked = cascade.run(initial, &context);
  print_ranking("Reference posts only:", &reranked);

  Ok(())
}
