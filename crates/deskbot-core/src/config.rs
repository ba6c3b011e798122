use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DeskbotError, Result};

/// Top-level configuration for the Deskbot application.
///
/// Loaded from `~/.deskbot/config.toml` by default. Each section corresponds
/// to a bounded context or cross-cutting concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskbotConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for DeskbotConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            chat: ChatConfig::default(),
            retrieval: RetrievalConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl DeskbotConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DeskbotConfig = toml::from_str(&content)?;
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
            toml::to_string_pretty(self).map_err(|e| DeskbotError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Port the HTTP API binds to.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            log_level: "info".to_string(),
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Number of past exchanges replayed to the generator as history.
    pub memory_window: usize,
    /// Maximum user message length in characters.
    pub max_message_length: usize,
    /// Contact channel quoted verbatim when no answer can be found.
    pub escalation_contact: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            memory_window: 5,
            max_message_length: 2000,
            escalation_contact: "the IT service desk at helpdesk@example.com".to_string(),
        }
    }
}

/// Knowledge-retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Base URL of the knowledge-retrieval service.
    pub knowledge_url: String,
    /// Number of candidates requested per query.
    pub search_k: usize,
    /// Minimum similarity for a candidate to count as relevant, 0.0 to 1.0.
    pub relevance_threshold: f32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            knowledge_url: "http://localhost:9000".to_string(),
            search_k: 5,
            relevance_threshold: 0.70,
            timeout_secs: 5,
        }
    }
}

/// Text-generation settings for the Ollama-style backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the generation service.
    pub base_url: String,
    /// Model used for answer synthesis.
    pub model: String,
    /// Model used for intent classification.
    pub intent_model: String,
    /// System message prepended to every synthesis prompt.
    pub system_message: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Intent assumed when classification fails.
    pub default_intent: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            intent_model: "llama3".to_string(),
            system_message: "You are an IT support assistant. Help requesters using \
                             your knowledge base and the reference material provided."
                .to_string(),
            timeout_secs: 30,
            default_intent: "question".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = DeskbotConfig::default();
        assert_eq!(config.general.port, 8000);
        assert_eq!(config.chat.memory_window, 5);
        assert_eq!(config.retrieval.search_k, 5);
        assert!((config.retrieval.relevance_threshold - 0.70).abs() < f32::EPSILON);
        assert_eq!(config.llm.model, "llama3");
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = DeskbotConfig::default();
        config.general.port = 8080;
        config.chat.escalation_contact = "ramal 4242".to_string();
        config.save(&path).unwrap();

        let loaded = DeskbotConfig::load(&path).unwrap();
        assert_eq!(loaded.general.port, 8080);
        assert_eq!(loaded.chat.escalation_contact, "ramal 4242");
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = DeskbotConfig::load(Path::new("/nonexistent/deskbot.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let config = DeskbotConfig::load_or_default(Path::new("/nonexistent/deskbot.toml"));
        assert_eq!(config.general.port, 8000);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\nport = 3333\n").unwrap();

        let config = DeskbotConfig::load(&path).unwrap();
        assert_eq!(config.general.port, 3333);
        // Untouched sections keep their defaults.
        assert_eq!(config.retrieval.search_k, 5);
        assert_eq!(config.chat.max_message_length, 2000);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "general = [[[").unwrap();

        let err = DeskbotConfig::load(&path).unwrap_err();
        assert!(matches!(err, DeskbotError::Config(_)));
    }
}
