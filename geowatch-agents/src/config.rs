//! Application configuration
//!
//! Loaded from an optional `geowatch.toml`. Every section and field has a
//! default, so an empty file is valid. API keys never live here; they come
//! from the environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use geowatch_core::{ParseError, RelationshipGraph};

use crate::{CollectorConfig, OpenAiConfig};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Graph(#[from] ParseError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchSection,
    pub answer: AnswerSection,
    pub cascade: CascadeSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub max_results: usize,
    /// Empty for the built-in threat queries
    pub queries: Vec<String>,
    pub concurrency: usize,
    pub base_url: Option<String>,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            max_results: 15,
            queries: Vec::new(),
            concurrency: 4,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerBackend {
    #[default]
    Valyu,
    OpenAi,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnswerSection {
    pub backend: AnswerBackend,
    pub model: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u16,
}

impl Default for AnswerSection {
    fn default() -> Self {
        Self {
            backend: AnswerBackend::Valyu,
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            temperature: 0.0,
            max_tokens: 4096,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CascadeSection {
    pub timeout_secs: u64,
    pub structured: bool,
    pub graph_path: Option<PathBuf>,
}

impl Default for CascadeSection {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            structured: false,
            graph_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// The configured graph file, or the built-in table
    pub fn load_graph(&self) -> Result<RelationshipGraph, ConfigError> {
        let Some(path) = &self.cascade.graph_path else {
            return Ok(RelationshipGraph::builtin());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let graph = RelationshipGraph::from_json(&content)?;
        info!("Loaded {} countries from {}", graph.len(), path.display());
        Ok(graph)
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            max_results: self.search.max_results,
            concurrency: self.search.concurrency,
        }
    }

    pub fn openai_config(&self, api_key: &str) -> OpenAiConfig {
        OpenAiConfig {
            api_key: api_key.to_string(),
            base_url: self.answer.base_url.clone(),
            model: self.answer.model.clone(),
            temperature: self.answer.temperature,
            max_tokens: self.answer.max_tokens,
        }
    }

    pub fn cascade_timeout(&self) -> Duration {
        Duration::from_secs(self.cascade.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.search.max_results, 15);
        assert_eq!(config.search.concurrency, 4);
        assert!(config.search.queries.is_empty());
        assert_eq!(config.answer.backend, AnswerBackend::Valyu);
        assert_eq!(config.cascade_timeout(), Duration::from_secs(60));
        assert!(!config.cascade.structured);
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_toml_str(
            r#"
            [search]
            max_results = 10
            queries = ["port strike", "border clash"]

            [answer]
            backend = "openai"
            model = "gpt-4o"
            base_url = "http://localhost:11434/v1"

            [cascade]
            timeout_secs = 15
            structured = true
            "#,
        )
        .unwrap();

        assert_eq!(config.search.queries.len(), 2);
        assert_eq!(config.collector_config().max_results, 10);
        assert_eq!(config.answer.backend, AnswerBackend::OpenAi);
        let openai = config.openai_config("sk-test");
        assert_eq!(openai.model, "gpt-4o");
        assert_eq!(openai.base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(config.cascade_timeout(), Duration::from_secs(15));
        assert!(config.cascade.structured);
    }

    #[test]
    fn test_invalid_backend_rejected() {
        let err = AppConfig::from_toml_str("[answer]\nbackend = \"carrier-pigeon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_builtin_graph_without_path() {
        let graph = AppConfig::default().load_graph().unwrap();
        assert_eq!(graph.len(), 26);
    }

    #[test]
    fn test_missing_graph_file() {
        let mut config = AppConfig::default();
        config.cascade.graph_path = Some(PathBuf::from("/nonexistent/graph.json"));
        assert!(matches!(config.load_graph(), Err(ConfigError::Io { .. })));
    }
}
