use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CambiumError, Result};

/// Top-level configuration for the Cambium chatbot service.
///
/// Loaded from `~/.cambium/config.toml` by default. Each section corresponds
/// to one subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CambiumConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl CambiumConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CambiumConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CambiumError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Port the HTTP API binds to (localhost only).
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            port: 3030,
            log_level: "info".to_string(),
        }
    }
}

/// Source document settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Directory scanned recursively for documents at startup.
    pub source_dir: PathBuf,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("./data"),
        }
    }
}

/// Hosted LLM settings for both answer synthesis and embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Chat completion model name.
    pub model: String,
    /// Embedding model name.
    pub embedding_model: String,
    /// Sampling temperature: 0 = deterministic, higher = more varied.
    pub temperature: f32,
    /// System prompt steering tone and domain of answers.
    pub system_prompt: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// API key override. When absent, the `OPENAI_API_KEY` environment
    /// variable is used. Keys are never written back by `save`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 0.5,
            system_prompt: "You are an expert in Cambium software company. \
                            Keep your answers informative and polite"
                .to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key: config override first, then `OPENAI_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Seed assistant greeting for every new session.
    pub greeting: String,
    /// Maximum user message length in characters.
    pub max_message_length: usize,
    /// Number of document chunks retrieved as answer context.
    pub top_k: usize,
    /// How follow-up questions are rewritten before retrieval.
    pub condense: CondensePolicy,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: "Hi, I'm Cambium chatbot. Ask me about Cambium!".to_string(),
            max_message_length: 2000,
            top_k: 4,
            condense: CondensePolicy::PerQuery,
        }
    }
}

/// Policy for rewriting follow-up questions against conversation history.
///
/// `PerQuery` derives the rewrite context fresh from the transcript on each
/// call; `None` passes the raw question through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CondensePolicy {
    PerQuery,
    None,
}
