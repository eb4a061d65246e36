//! Engine configuration.
//!
//! Loaded from an optional TOML file; every section and field has a
//! default, so an empty file (or no file) is a valid configuration.
//!
//! ```toml
//! [backend]
//! base_url = "https://api.openai.com/v1"
//! api_key_env = "DECKSTYLE_API_KEY"
//! timeout_secs = 60
//!
//! [models]
//! vision = ["gpt-4o", "gpt-4o-mini"]
//!
//! [matching]
//! candidate_cap = 100
//! ```

use std::path::Path;
use std::time::Duration;

use deckstyle_backend::{HttpBackendConfig, ModelChain};
use deckstyle_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::failover::Stage;

pub const DEFAULT_API_KEY_ENV: &str = "DECKSTYLE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-call timeout.
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: deckstyle_backend::http::DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: deckstyle_backend::http::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Fallback chains, highest priority first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Vision-capable models for design extraction.
    pub vision: Vec<String>,
    /// Cheap models for keyword extraction.
    pub keywords: Vec<String>,
    /// Models for outline synthesis.
    pub outline: Vec<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            vision: vec![
                "gpt-4o".to_string(),
                "gpt-4-turbo".to_string(),
                "gpt-4o-mini".to_string(),
            ],
            keywords: vec!["gpt-4o-mini".to_string(), "gpt-3.5-turbo".to_string()],
            outline: vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            max_tokens: 1500,
            temperature: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Content characters sent along with the prompt.
    pub max_content_chars: usize,
}

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            max_tokens: 200,
            temperature: 0.2,
            max_content_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    /// Exemplars retrieved for ranking. Anything beyond is never scored.
    pub candidate_cap: usize,
    pub default_limit: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            candidate_cap: 100,
            default_limit: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineSettings {
    /// Source text characters included in the prompt.
    pub max_source_chars: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Pick a built-in preset from the request's topics when no preset,
    /// house style or matched exemplar is given.
    pub auto_preset: bool,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            max_source_chars: 12_000,
            max_tokens: 4000,
            temperature: 0.7,
            auto_preset: true,
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub backend: BackendSettings,
    pub models: ModelSettings,
    pub extraction: ExtractionSettings,
    pub keywords: KeywordSettings,
    pub matching: MatchingSettings,
    pub outline: OutlineSettings,
}

impl EngineConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.timeout_secs == 0 {
            return Err(Error::Config("backend.timeout_secs must be positive".to_string()));
        }
        if self.matching.candidate_cap == 0 {
            return Err(Error::Config("matching.candidate_cap must be positive".to_string()));
        }
        if self.models.vision.is_empty() || self.models.outline.is_empty() {
            return Err(Error::Config(
                "models.vision and models.outline need at least one model".to_string(),
            ));
        }
        Ok(())
    }

    /// HTTP backend settings with the API key read from the environment.
    pub fn http_backend_config(&self) -> HttpBackendConfig {
        HttpBackendConfig {
            base_url: self.backend.base_url.clone(),
            api_key: std::env::var(&self.backend.api_key_env).ok(),
            timeout: Duration::from_secs(self.backend.timeout_secs),
        }
    }

    pub fn vision_chain(&self) -> ModelChain {
        ModelChain::new(Stage::Extraction.label(), self.models.vision.iter().cloned())
    }

    pub fn keyword_chain(&self) -> ModelChain {
        ModelChain::new(Stage::Keywords.label(), self.models.keywords.iter().cloned())
    }

    pub fn outline_chain(&self) -> ModelChain {
        ModelChain::new(Stage::Outline.label(), self.models.outline.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config.matching.candidate_cap, 100);
        assert_eq!(config.backend.api_key_env, DEFAULT_API_KEY_ENV);
        assert_eq!(config.vision_chain().models()[0], "gpt-4o");
    }

    #[test]
    fn test_partial_sections() {
        let config = EngineConfig::from_toml(
            r#"
            [models]
            vision = ["vision-a", "vision-b"]

            [matching]
            candidate_cap = 25
            "#,
        )
        .unwrap();

        assert_eq!(config.models.vision, vec!["vision-a", "vision-b"]);
        // Untouched fields in a touched section keep defaults
        assert_eq!(config.models.outline[0], "gpt-4o");
        assert_eq!(config.matching.candidate_cap, 25);
        assert_eq!(config.matching.default_limit, 3);
        assert_eq!(config.outline.max_source_chars, 12_000);
        assert!(config.outline.auto_preset);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(EngineConfig::from_toml("[backend]\ntimeout_secs = 0").is_err());
        assert!(EngineConfig::from_toml("[matching]\ncandidate_cap = 0").is_err());
        assert!(EngineConfig::from_toml("[models]\nvision = []").is_err());
        assert!(EngineConfig::from_toml("not toml ===").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deckstyle.toml");
        std::fs::write(&path, "[outline]\nmax_tokens = 1234\nauto_preset = false\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.outline.max_tokens, 1234);
        assert!(!config.outline.auto_preset);
        assert!(EngineConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
