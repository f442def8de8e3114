//! Configuration Types
//!
//! All configuration structures with sensible defaults. Supports global
//! (`~/.config/scrapecraft/`) and per-project (`<project_dir>/.config.toml`)
//! configuration layered on top of built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration schema version.
    pub version: String,

    /// LLM provider settings.
    pub llm: LlmConfig,

    /// Where project directories are created.
    pub projects: ProjectsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            projects: ProjectsConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ScrapeError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(crate::types::ScrapeError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(crate::types::ScrapeError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.provider.trim().is_empty() {
            return Err(crate::types::ScrapeError::Config("LLM provider must not be empty".to_string()));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "claude-code", "openai", "ollama".
    pub provider: String,

    /// Model name.
    pub model: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Temperature for LLM generation (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,

    /// API key, read from config or environment. Wrapped in `secrecy::SecretString`
    /// by the provider constructor so it never appears in `Debug`/log output;
    /// never serialized back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Fallback provider for the retry chain.
    pub fallback_provider: Option<String>,

    /// Fallback model for the retry chain.
    pub fallback_model: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "claude-code".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            timeout_secs: 300,
            temperature: 0.0,
            api_key: None,
            fallback_provider: None,
            fallback_model: None,
        }
    }
}

impl LlmConfig {
    /// Translate into the shape `ai::provider::create_provider` consumes.
    pub fn to_provider_config(&self) -> crate::ai::provider::ProviderConfig {
        crate::ai::provider::ProviderConfig {
            provider: self.provider.clone(),
            model: Some(self.model.clone()),
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
            api_key: self.api_key.clone(),
            api_base: None,
            max_tokens: 4096,
        }
    }
}

// =============================================================================
// Projects Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectsConfig {
    /// Directory under which each run's `project_<id>/` artifact directory
    /// is created. Defaults to the platform data directory.
    pub root: PathBuf,
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self { root: super::loader::ConfigLoader::default_projects_root() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, "claude-code");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let mut config = Config::default();
        config.llm.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = Config::default();
        config.llm.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
