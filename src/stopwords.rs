//! Immutable stopword sets.
//!
//! A `Stopwords` value is built once at startup and shared read-only (usually
//! behind an `Arc`) by the analyzer and the relevance-model estimator.

use crate::error::ConfigError;
use std::collections::HashSet;
use std::path::Path;

/// The default English stopword list used by Lucene's `EnglishAnalyzer`.
pub const ENGLISH_STOPWORDS: &[&str] = &[
  "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
  "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
  "they", "this", "to", "was", "will", "with",
];

/// A set of words excluded from analysis and from feedback terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwords {
  words: HashSet<String>,
}

impl Stopwords {
  /// An empty set; nothing is treated as a stopword.
  pub fn none() -> Self {
    Self::default()
  }

  /// The default English set.
  pub fn english() -> Self {
    Self {
      words: ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect(),
    }
  }

  /// Builds a set from individual words.
  ///
  /// Words are trimmed and lowercased. A word that is empty after trimming or
  /// contains inner whitespace is rejected.
  pub fn from_words<I, S>(words: I) -> Result<Self, ConfigError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut set = HashSet::new();
    for (index, word) in words.into_iter().enumerate() {
      set.insert(normalize_entry(word.as_ref(), index + 1)?);
    }
    Ok(Self { words: set })
  }

  /// Parses a stopword list with one word per line.
  ///
  /// Blank lines and lines starting with `#` are ignored.
  pub fn parse(text: &str) -> Result<Self, ConfigError> {
    let mut set = HashSet::new();
    for (index, line) in text.lines().enumerate() {
      let trimmed = line.trim();
      if trimmed.is_empty() || trimmed.starts_with('#') {
        continue;
      }
      set.insert(normalize_entry(trimmed, index + 1)?);
    }
    Ok(Self { words: set })
  }

  /// Reads and parses a stopword file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    Self::parse(&text)
  }

  /// Returns `true` if `term` is in the set.
  pub fn is_stopword(&self, term: &str) -> bool {
    self.words.contains(term)
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }
}

fn normalize_entry(raw: &str, line: usize) -> Result<String, ConfigError> {
  let word = raw.trim();
  if word.is_empty() || word.chars().any(char::is_whitespace) {
    return Err(ConfigError::MalformedStopword {
      line,
      word: raw.to_string(),
    });
  }
  Ok(word.to_lowercase())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_english_set() {
    let stop = Stopwords::english();
    assert!(stop.is_stopword("the"));
    assert!(stop.is_stopword("with"));
    assert!(!stop.is_stopword("search"));
    assert_eq!(stop.len(), ENGLISH_STOPWORDS.len());
  }

  #[test]
  fn test_parse_skips_comments_and_blanks() {
    let stop = Stopwords::parse("# news stoplist\n\nSaid\n  reuters  \n").unwrap();
    assert_eq!(stop.len(), 2);
    assert!(stop.is_stopword("said"));
    assert!(stop.is_stopword("reuters"));
  }

  #[test]
  fn test_malformed_entry_is_rejected() {
    let err = Stopwords::parse("ok\nnot ok\n").unwrap_err();
    match err {
      ConfigError::MalformedStopword { line, word } => {
        assert_eq!(line, 2);
        assert_eq!(word, "not ok");
      }
      other => panic!("unexpected error: {other}"),
    }

    assert!(Stopwords::from_words(["fine", "   "]).is_err());
  }
}
