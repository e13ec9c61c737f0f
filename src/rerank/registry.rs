//! Name-based construction of rerankers.
//!
//! Rerankers come from a closed set of kinds. A [`RerankerSpec`] is the
//! serializable form used in config files; a [`RerankerRegistry`] maps plain
//! names to factories so callers can assemble a cascade from a list of names
//! and register their own stages next to the built-in ones.

use super::rm3::{Rm3Config, Rm3Reranker};
use super::rocchio::{RocchioConfig, RocchioReranker};
use super::tiebreaker::TiebreakerReranker;
use super::{IdentityReranker, Reranker, RerankerCascade};
use crate::error::ConfigError;
use crate::stopwords::Stopwords;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The built-in reranker kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RerankerKind {
  Identity,
  Rm3,
  Rocchio,
  Tiebreak,
}

impl RerankerKind {
  /// Every built-in kind.
  pub const ALL: [RerankerKind; 4] = [
    RerankerKind::Identity,
    RerankerKind::Rm3,
    RerankerKind::Rocchio,
    RerankerKind::Tiebreak,
  ];

  /// The canonical registry name.
  pub fn name(&self) -> &'static str {
    match self {
      RerankerKind::Identity => "identity",
      RerankerKind::Rm3 => "rm3",
      RerankerKind::Rocchio => "rocchio",
      RerankerKind::Tiebreak => "tiebreak",
    }
  }
}

impl fmt::Display for RerankerKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for RerankerKind {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "identity" => Ok(RerankerKind::Identity),
      "rm3" => Ok(RerankerKind::Rm3),
      "rocchio" => Ok(RerankerKind::Rocchio),
      "tiebreak" | "tiebreaker" => Ok(RerankerKind::Tiebreak),
      _ => Err(ConfigError::UnknownReranker(s.to_string())),
    }
  }
}

/// A serializable description of one cascade stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RerankerSpec {
  Identity,
  Rm3(Rm3Config),
  Rocchio(RocchioConfig),
  Tiebreak,
}

impl RerankerSpec {
  pub fn kind(&self) -> RerankerKind {
    match self {
      RerankerSpec::Identity => RerankerKind::Identity,
      RerankerSpec::Rm3(_) => RerankerKind::Rm3,
      RerankerSpec::Rocchio(_) => RerankerKind::Rocchio,
      RerankerSpec::Tiebreak => RerankerKind::Tiebreak,
    }
  }

  /// Builds the stage, validating its parameters.
  pub fn build(&self, stopwords: &Arc<Stopwords>) -> Result<Box<dyn Reranker>, ConfigError> {
    let reranker: Box<dyn Reranker> = match self {
      RerankerSpec::Identity => Box::new(IdentityReranker),
      RerankerSpec::Rm3(config) => Box::new(Rm3Reranker::new(config.clone(), Arc::clone(stopwords))?),
      RerankerSpec::Rocchio(config) => Box::new(RocchioReranker::new(config.clone(), Arc::clone(stopwords))?),
      RerankerSpec::Tiebreak => Box::new(TiebreakerReranker),
    };
    Ok(reranker)
  }
}

impl From<RerankerKind> for RerankerSpec {
  /// The spec of `kind` with default parameters.
  fn from(kind: RerankerKind) -> Self {
    match kind {
      RerankerKind::Identity => RerankerSpec::Identity,
      RerankerKind::Rm3 => RerankerSpec::Rm3(Rm3Config::default()),
      RerankerKind::Rocchio => RerankerSpec::Rocchio(RocchioConfig::default()),
      RerankerKind::Tiebreak => RerankerSpec::Tiebreak,
    }
  }
}

/// Builds a reranker from the shared stopword set.
pub type RerankerFactory =
  Box<dyn Fn(&Arc<Stopwords>) -> Result<Box<dyn Reranker>, ConfigError> + Send + Sync>;

/// Maps reranker names to factories.
pub struct RerankerRegistry {
  factories: HashMap<String, RerankerFactory>,
}

impl RerankerRegistry {
  /// An empty registry.
  pub fn new() -> Self {
    Self {
      factories: HashMap::new(),
    }
  }

  /// A registry holding every built-in kind under its canonical name, with
  /// default parameters.
  pub fn builtins() -> Self {
    let mut registry = Self::new();
    for kind in RerankerKind::ALL {
      let spec = RerankerSpec::from(kind);
      registry.register(kind.name(), move |stopwords| spec.build(stopwords));
    }
    registry
  }

  /// Registers `factory` under `name`, replacing any previous entry.
  pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
  where
    F: Fn(&Arc<Stopwords>) -> Result<Box<dyn Reranker>, ConfigError> + Send + Sync + 'static,
  {
    self.factories.insert(name.into(), Box::new(factory));
  }

  /// Builds the reranker registered as `name`.
  ///
  /// Names that are not registered but parse as a built-in kind (such as
  /// `"tiebreaker"`) resolve to that kind's canonical entry.
  pub fn build(&self, name: &str, stopwords: &Arc<Stopwords>) -> Result<Box<dyn Reranker>, ConfigError> {
    if let Some(factory) = self.factories.get(name) {
      return factory(stopwords);
    }

    let kind: RerankerKind = name.parse()?;
    match self.factories.get(kind.name()) {
      Some(factory) => factory(stopwords),
      None => Err(ConfigError::UnknownReranker(name.to_string())),
    }
  }

  /// The registered names, sorted.
  pub fn names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }

  /// Builds a cascade from stage names, in order.
  pub fn build_cascade<I, S>(&self, names: I, stopwords: &Arc<Stopwords>) -> Result<RerankerCascade, ConfigError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut builder = RerankerCascade::builder();
    for name in names {
      builder = builder.with(self.build(name.as_ref(), stopwords)?);
    }
    Ok(builder.build())
  }
}

impl Default for RerankerRegistry {
  fn default() -> Self {
    Self::builtins()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_kind_from_str() {
    assert_eq!("rm3".parse::<RerankerKind>().unwrap(), RerankerKind::Rm3);
    assert_eq!("Tiebreaker".parse::<RerankerKind>().unwrap(), RerankerKind::Tiebreak);
    assert!(matches!(
      "bogus".parse::<RerankerKind>(),
      Err(ConfigError::UnknownReranker(name)) if name == "bogus"
    ));
  }

  #[test]
  fn test_spec_from_json() {
    let specs: Vec<RerankerSpec> = serde_json::from_str(
      r#"[{"type": "rm3", "fb_docs": 10, "original_query_weight": 0.7}, {"type": "tiebreak"}]"#,
    )
    .unwrap();

    assert_eq!(specs[0].kind(), RerankerKind::Rm3);
    match &specs[0] {
      RerankerSpec::Rm3(config) => {
        assert_eq!(config.fb_docs, 10);
        assert_eq!(config.fb_terms, 20);
        assert_eq!(config.original_query_weight, 0.7);
      }
      other => panic!("unexpected spec: {:?}", other),
    }
    assert_eq!(specs[1], RerankerSpec::Tiebreak);
  }

  #[test]
  fn test_rocchio_spec() {
    assert_eq!("Rocchio".parse::<RerankerKind>().unwrap(), RerankerKind::Rocchio);

    let spec: RerankerSpec =
      serde_json::from_str(r#"{"type": "rocchio", "top_fb_docs": 5, "beta": 0.5}"#).unwrap();
    assert_eq!(spec.kind(), RerankerKind::Rocchio);

    let stopwords = Arc::new(Stopwords::english());
    assert_eq!(
      spec.build(&stopwords).unwrap().tag(),
      "Rocchio(topFbDocs=5,topFbTerms=10,bottomFbDocs=10,bottomFbTerms=10,alpha=1,beta=0.5,gamma=0)"
    );

    let bad = RerankerSpec::Rocchio(RocchioConfig {
      alpha: -1.0,
      ..RocchioConfig::default()
    });
    assert!(bad.build(&stopwords).is_err());
  }

  #[test]
  fn test_spec_build_validates() {
    let stopwords = Arc::new(Stopwords::english());
    let bad = RerankerSpec::Rm3(Rm3Config {
      original_query_weight: -0.1,
      ..Rm3Config::default()
    });
    assert!(bad.build(&stopwords).is_err());
    assert_eq!(RerankerSpec::Tiebreak.build(&stopwords).unwrap().tag(), "Tiebreaker");
  }

  #[test]
  fn test_builtins() {
    let registry = RerankerRegistry::builtins();
    assert_eq!(registry.names(), vec!["identity", "rm3", "rocchio", "tiebreak"]);

    let stopwords = Arc::new(Stopwords::english());
    let cascade = registry
      .build_cascade(["rm3", "tiebreaker"], &stopwords)
      .unwrap();
    assert_eq!(
      cascade.tag(),
      "Rm3(fbDocs=50,fbTerms=20,originalQueryWeight=0.5)+Tiebreaker"
    );

    assert!(matches!(
      registry.build("bm25", &stopwords),
      Err(ConfigError::UnknownReranker(_))
    ));
  }

  #[test]
  fn test_register_custom_factory() {
    let mut registry = RerankerRegistry::new();
    registry.register("rm3-short", |stopwords| {
      let config = Rm3Config {
        fb_docs: 5,
        fb_terms: 5,
        ..Rm3Config::default()
      };
      Ok(Box::new(Rm3Reranker::new(config, Arc::clone(stopwords))?) as Box<dyn Reranker>)
    });

    let stopwords = Arc::new(Stopwords::none());
    let reranker = registry.build("rm3-short", &stopwords).unwrap();
    assert_eq!(reranker.tag(), "Rm3(fbDocs=5,fbTerms=5,originalQueryWeight=0.5)");

    // Built-in kinds are not registered in an empty registry.
    assert!(registry.build("identity", &stopwords).is_err());
  }
}
