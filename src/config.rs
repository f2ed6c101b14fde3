//! Configuration loading
//!
//! This module provides:
//! - `AgentRuntimeConfig` - Runtime configuration for a single chat model
//! - `Config` - Full application configuration loaded from config.toml

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Runtime configuration for one chat model instance.
///
/// Tutorials derive this from `Config` via `AgentRuntimeConfig::for_model`,
/// library users construct it directly.
///
/// # Example
///
/// ```
/// use agentlab::AgentRuntimeConfig;
///
/// let config = AgentRuntimeConfig {
///     model: "gemini-2.5-flash".to_string(),
///     max_tokens: 2048,
///     temperature: 0.7,
///     max_retries: 5,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct AgentRuntimeConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub max_retries: u32,
}

impl Default for AgentRuntimeConfig {
    fn default() -> Self {
        Self {
            model: ModelsConfig::default().gemini,
            max_tokens: 2048,
            temperature: 0.7,
            max_retries: 5,
        }
    }
}

impl AgentRuntimeConfig {
    /// Runtime config for `model` using the shared model settings
    pub fn for_model(config: &Config, model: &str) -> Self {
        Self {
            model: model.to_string(),
            max_tokens: config.models.max_tokens,
            temperature: config.models.temperature,
            max_retries: config.general.max_retries,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Main configuration structure loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub models: ModelsConfig,
    pub rag: RagConfig,
    pub reviews: ReviewsConfig,
    pub pipelines: PipelinesConfig,
    pub drafter: DrafterConfig,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the config directory path (~/.config/agentlab)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("agentlab"))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub max_retries: u32,
    /// Model turns an agent may take for one user message
    pub max_agent_steps: usize,
    /// Node executions a graph may take for one invocation
    pub recursion_limit: usize,
    pub log_file: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            max_agent_steps: 10,
            recursion_limit: 25,
            log_file: PathBuf::from("/tmp/agentlab.log"),
        }
    }
}

/// Model identifiers, resolved to providers by genai
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Hosted model for the tool-using agents
    pub gemini: String,
    /// Smaller hosted model for the simple agents
    pub gemini_lite: String,
    /// Hosted model for the graph tutorials
    pub groq: String,
    /// Local model for the review chain
    pub local: String,
    /// Local embedding model
    pub embedding: String,
    pub ollama_url: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            gemini: "gemini-2.5-flash".to_string(),
            gemini_lite: "gemini-2.5-flash-lite".to_string(),
            groq: "llama-3.3-70b-versatile".to_string(),
            local: "llama3.2".to_string(),
            embedding: "mxbai-embed-large".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub persist_dir: PathBuf,
    pub collection: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 150,
            top_k: 4,
            persist_dir: PathBuf::from("rag_db"),
            collection: "session_slides".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewsConfig {
    pub top_k: usize,
    pub persist_dir: PathBuf,
    pub collection: String,
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            persist_dir: PathBuf::from("reviews_db"),
            collection: "restaurant_reviews".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelinesConfig {
    pub summary_min_words: usize,
    pub summary_max_words: usize,
    pub num_sequences: usize,
    pub max_new_words: usize,
}

impl Default for PipelinesConfig {
    fn default() -> Self {
        Self {
            summary_min_words: 60,
            summary_max_words: 150,
            num_sequences: 2,
            max_new_words: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrafterConfig {
    /// Directory the save tool writes into
    pub output_dir: PathBuf,
}

impl Default for DrafterConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.models.groq, "llama-3.3-70b-versatile");
        assert_eq!(config.rag.chunk_size, 800);
        assert_eq!(config.rag.chunk_overlap, 150);
        assert_eq!(config.reviews.top_k, 5);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[models]
groq = "llama-3.1-8b-instant"
temperature = 0.2

[rag]
top_k = 6
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.models.groq, "llama-3.1-8b-instant");
        assert_eq!(config.models.temperature, 0.2);
        assert_eq!(config.models.gemini, "gemini-2.5-flash");
        assert_eq!(config.rag.top_k, 6);
        assert_eq!(config.rag.chunk_size, 800);
    }

    #[test]
    fn test_runtime_config_for_model() {
        let mut config = Config::default();
        config.general.max_retries = 2;
        let runtime = AgentRuntimeConfig::for_model(&config, "llama3.2").with_temperature(0.0);
        assert_eq!(runtime.model, "llama3.2");
        assert_eq!(runtime.max_retries, 2);
        assert_eq!(runtime.temperature, 0.0);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[drafter]\noutput_dir = \"drafts\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.drafter.output_dir, PathBuf::from("drafts"));

        let missing = dir.path().join("missing.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }
}
