//! Top-level configuration for a feedback pipeline.
//!
//! A [`FeedrankConfig`] describes the similarity, the stopword set, the field
//! to rank on, and the ordered list of reranking stages. It is usually loaded
//! from JSON:
//!
//! ```json
//! {
//!   "similarity": { "type": "bm25", "k1": 0.9, "b": 0.4 },
//!   "stopwords": "english",
//!   "field": "contents",
//!   "rerankers": [
//!     { "type": "rm3", "fb_docs": 10, "fb_terms": 10 },
//!     { "type": "tiebreak" }
//!   ]
//! }
//! ```

use crate::analysis::Analyzer;
use crate::error::ConfigError;
use crate::index::InMemIndex;
use crate::rerank::{RerankerCascade, RerankerSpec};
use crate::similarity::{Similarity, SimilarityConfig};
use crate::stopwords::Stopwords;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Where the stopword set comes from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwordsConfig {
    /// The default English set.
    #[default]
    English,
    /// No stopwords.
    None,
    /// An inline list.
    Words(Vec<String>),
    /// A file with one word per line; `#` starts a comment line.
    File(PathBuf),
}

impl StopwordsConfig {
    /// Loads and validates the stopword set.
    pub fn load(&self) -> Result<Stopwords, ConfigError> {
        match self {
            StopwordsConfig::English => Ok(Stopwords::english()),
            StopwordsConfig::None => Ok(Stopwords::none()),
            StopwordsConfig::Words(words) => Stopwords::from_words(words),
            StopwordsConfig::File(path) => Stopwords::from_file(path),
        }
    }
}

fn default_field() -> String {
    "contents".to_string()
}

/// Configuration of a complete feedback pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedrankConfig {
    pub similarity: SimilarityConfig,
    pub stopwords: StopwordsConfig,
    /// The field queries run against and feedback terms are read from.
    pub field: String,
    /// Cascade stages, in execution order.
    pub rerankers: Vec<RerankerSpec>,
}

impl Default for FeedrankConfig {
    fn default() -> Self {
        Self {
            similarity: SimilarityConfig::default(),
            stopwords: StopwordsConfig::default(),
            field: default_field(),
            rerankers: Vec::new(),
        }
    }
}

impl FeedrankConfig {
    /// Create a new config builder.
    pub fn builder() -> FeedrankConfigBuilder {
        FeedrankConfigBuilder::default()
    }

    /// Parses a config from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading config");
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Loads the stopword set, ready to be shared between components.
    pub fn load_stopwords(&self) -> Result<Arc<Stopwords>, ConfigError> {
        Ok(Arc::new(self.stopwords.load()?))
    }

    /// Builds the configured similarity.
    pub fn build_similarity(&self) -> Result<Box<dyn Similarity>, ConfigError> {
        self.similarity.build()
    }

    /// An analyzer over the configured stopword set.
    pub fn analyzer(&self) -> Result<Analyzer, ConfigError> {
        Ok(Analyzer::new(self.load_stopwords()?))
    }

    /// An empty in-memory index using the configured analyzer and similarity.
    pub fn in_mem_index(&self) -> Result<InMemIndex, ConfigError> {
        Ok(InMemIndex::new(self.analyzer()?, self.build_similarity()?))
    }

    /// Builds the reranker cascade, loading the stopword set once.
    pub fn build_cascade(&self) -> Result<RerankerCascade, ConfigError> {
        let stopwords = self.load_stopwords()?;
        self.build_cascade_with(&stopwords)
    }

    /// Builds the reranker cascade over an already loaded stopword set.
    pub fn build_cascade_with(&self, stopwords: &Arc<Stopwords>) -> Result<RerankerCascade, ConfigError> {
        let mut builder = RerankerCascade::builder();
        for spec in &self.rerankers {
            builder = builder.with(spec.build(stopwords)?);
        }
        let cascade = builder.build();
        debug!(stages = cascade.len(), tag = %cascade.tag(), "cascade built");
        Ok(cascade)
    }
}

/// Builder for [`FeedrankConfig`].
#[derive(Debug, Default)]
pub struct FeedrankConfigBuilder {
    config: FeedrankConfig,
}

impl FeedrankConfigBuilder {
    /// Set the similarity.
    pub fn similarity(mut self, similarity: SimilarityConfig) -> Self {
        self.config.similarity = similarity;
        self
    }

    /// Set the stopword source.
    pub fn stopwords(mut self, stopwords: StopwordsConfig) -> Self {
        self.config.stopwords = stopwords;
        self
    }

    /// Set the ranking field.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.config.field = field.into();
        self
    }

    /// Append a cascade stage.
    pub fn reranker(mut self, spec: RerankerSpec) -> Self {
        self.config.rerankers.push(spec);
        self
    }

    /// Build the config.
    pub fn build(self) -> FeedrankConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rerank::Rm3Config;

    #[test]
    fn test_defaults() {
        let config = FeedrankConfig::from_json_str("{}").unwrap();
        assert_eq!(config, FeedrankConfig::default());
        assert_eq!(config.field, "contents");
        assert_eq!(config.stopwords, StopwordsConfig::English);
        assert!(config.build_cascade().unwrap().is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = FeedrankConfig::from_json_str(
            r#"{
                "similarity": {"type": "f2log", "s": 0.25},
                "stopwords": {"words": ["foo", "Bar"]},
                "field": "body",
                "rerankers": [
                    {"type": "rm3", "fb_docs": 10, "fb_terms": 10},
                    {"type": "tiebreak"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.similarity, SimilarityConfig::F2Log { s: 0.25 });
        assert_eq!(config.field, "body");

        let stopwords = config.load_stopwords().unwrap();
        assert!(stopwords.is_stopword("bar"));

        let cascade = config.build_cascade_with(&stopwords).unwrap();
        assert_eq!(
            cascade.tag(),
            "Rm3(fbDocs=10,fbTerms=10,originalQueryWeight=0.5)+Tiebreaker"
        );
    }

    #[test]
    fn test_invalid_parameters_fail_at_build() {
        let config = FeedrankConfig::builder()
            .similarity(SimilarityConfig::F2Exp { s: 2.0, k: 0.35 })
            .build();
        assert!(config.build_similarity().is_err());

        let config = FeedrankConfig::builder()
            .reranker(RerankerSpec::Rm3(Rm3Config {
                hits: 0,
                ..Rm3Config::default()
            }))
            .build();
        assert!(matches!(
            config.build_cascade(),
            Err(ConfigError::InvalidParameter { name: "hits", .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            FeedrankConfig::from_json_str("{\"field\": 3}"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FeedrankConfig::from_path("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_stopwords_from_file() {
        let path = std::env::temp_dir().join(format!("feedrank-stopwords-{}.txt", std::process::id()));
        fs::write(&path, "# custom list\nalpha\n\nbeta\n").unwrap();

        let config = FeedrankConfig::builder()
            .stopwords(StopwordsConfig::File(path.clone()))
            .build();
        let stopwords = config.load_stopwords().unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(stopwords.len(), 2);
        assert!(stopwords.is_stopword("alpha"));
    }
}
