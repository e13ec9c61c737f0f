//! Text analysis: tokenization, lowercasing, and stopword removal.

use crate::stopwords::Stopwords;
use std::collections::HashMap;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Tokenize text into lowercase words.
pub fn tokenize(text: &str) -> Vec<String> {
  text
    .unicode_words()
    .map(|word| word.to_lowercase())
    .collect()
}

/// Turns raw text into index terms.
///
/// The same analyzer must be used for indexing and for query tokenization so
/// that query terms line up with indexed terms.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
  stopwords: Arc<Stopwords>,
}

impl Analyzer {
  /// Creates an analyzer that drops the given stopwords.
  pub fn new(stopwords: Arc<Stopwords>) -> Self {
    Self { stopwords }
  }

  /// The stopword set this analyzer filters with.
  pub fn stopwords(&self) -> &Arc<Stopwords> {
    &self.stopwords
  }

  /// Tokenizes `text`, dropping stopwords.
  pub fn analyze(&self, text: &str) -> Vec<String> {
    tokenize(text)
      .into_iter()
      .filter(|token| !self.stopwords.is_stopword(token))
      .collect()
  }

  /// Calculate term frequencies for a text.
  pub fn term_frequencies(&self, text: &str) -> HashMap<String, u64> {
    let mut freqs = HashMap::new();
    for token in self.analyze(text) {
      *freqs.entry(token).or_insert(0) += 1;
    }
    freqs
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tokenize() {
    let text = "Hello, World! This is a test.";
    let tokens = tokenize(text);
    assert_eq!(tokens, vec!["hello", "world", "this", "is", "a", "test"]);
  }

  #[test]
  fn test_analyze_drops_stopwords() {
    let analyzer = Analyzer::new(Arc::new(Stopwords::english()));
    assert_eq!(analyzer.analyze("This is a test of the system"), vec!["test", "system"]);
  }

  #[test]
  fn test_term_frequencies() {
    let analyzer = Analyzer::default();
    let freqs = analyzer.term_frequencies("the quick brown fox jumps over the lazy dog");
    assert_eq!(freqs.get("the"), Some(&2));
    assert_eq!(freqs.get("quick"), Some(&1));
    assert_eq!(freqs.get("brown"), Some(&1));
  }
}
