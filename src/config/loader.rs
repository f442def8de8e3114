//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/scrapecraft/config.toml)
//! 3. Project config (<project_dir>/.config.toml), when a project is known
//! 4. Environment variables (SCRAPECRAFT_* prefix)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, ScrapeError};

const ENV_PREFIX: &str = "SCRAPECRAFT_";
const API_KEY_ENV_VARS: &[&str] = &["SCRAPECRAFT_API_KEY", "ANTHROPIC_API_KEY", "OPENAI_API_KEY"];

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the full resolution chain: defaults → global
    /// → project (if `project_dir` is given) → env vars.
    pub fn load(project_dir: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(dir) = project_dir {
            let project_path = dir.join(".config.toml");
            if project_path.exists() {
                debug!("Loading project config from: {}", project_path.display());
                figment = figment.merge(Toml::file(&project_path));
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split('_').lowercase(true));

        let mut config: Config =
            figment.extract().map_err(|e| ScrapeError::Config(format!("Configuration error: {}", e)))?;

        if config.llm.api_key.is_none() {
            config.llm.api_key = Self::api_key_from_env();
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file only, ignoring global/project/env layers.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ScrapeError::Config(format!("Configuration error: {}", e)))
    }

    fn api_key_from_env() -> Option<String> {
        API_KEY_ENV_VARS.iter().find_map(|var| env::var(var).ok())
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Path to the global config directory (~/.config/scrapecraft/).
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| env::var("HOME").ok().map(|home| PathBuf::from(home).join(".config")))
            .map(|p| p.join("scrapecraft"))
    }

    /// Path to the global config file.
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Default root directory under which `project_<id>/` artifact directories
    /// are created (~/.local/share/scrapecraft/projects, falling back to a
    /// relative directory if neither XDG_DATA_HOME nor HOME is set).
    pub fn default_projects_root() -> PathBuf {
        env::var("XDG_DATA_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| env::var("HOME").ok().map(|home| PathBuf::from(home).join(".local/share")))
            .map(|p| p.join("scrapecraft").join("projects"))
            .unwrap_or_else(|| PathBuf::from("scrapecraft-projects"))
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file path
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:       {} {}", exists, global.display());
        } else {
            println!("  Global:       (not available)");
        }

        println!("  Projects root: {}", Self::default_projects_root().display());
    }

    /// Show current effective configuration (no project directory in scope).
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load(None)?;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| ScrapeError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    /// Edit the global config file with $EDITOR.
    pub fn edit_config() -> Result<()> {
        let path = Self::global_config_path()
            .ok_or_else(|| ScrapeError::Config("Cannot determine global config path".to_string()))?;

        if !path.exists() {
            println!("Config file does not exist: {}", path.display());
            println!("Run 'scrapecraft setup' to create it.");
            return Ok(());
        }

        let editor = env::var("EDITOR").unwrap_or_else(|_| {
            if cfg!(target_os = "macos") {
                "open".to_string()
            } else if cfg!(target_os = "windows") {
                "notepad".to_string()
            } else {
                "vi".to_string()
            }
        });

        let status = Command::new(&editor)
            .arg(&path)
            .status()
            .map_err(|e| ScrapeError::Config(format!("Failed to launch editor {}: {}", editor, e)))?;

        if !status.success() {
            return Err(ScrapeError::Config("Editor exited with error".to_string()));
        }

        println!("Config saved: {}", path.display());
        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Create the global config file and the projects root directory if
    /// missing. Backs the `setup` command.
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir()
            .ok_or_else(|| ScrapeError::Config("Cannot determine global config directory".to_string()))?;
        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_global_config())?;
            info!("Created global config: {}", config_path.display());
        } else {
            info!("Global config exists: {}", config_path.display());
        }

        fs::create_dir_all(Self::default_projects_root())?;

        Ok(global_dir)
    }

    fn default_global_config() -> String {
        r#"# scrapecraft global configuration
# Project-level settings in <project_dir>/.config.toml override these.

version = "1.0"

[llm]
provider = "claude-code"
model = "claude-sonnet-4-20250514"
timeout_secs = 300
temperature = 0.0

# [projects]
# root = "/absolute/path/to/projects"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_default_config() {
        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(config.version, "1.0");
    }

    #[test]
    fn env_override() {
        // SAFETY: test-local env var, removed immediately after.
        unsafe {
            std::env::set_var("SCRAPECRAFT_LLM_MODEL", "test-model");
        }
        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(config.llm.model, "test-model");
        unsafe {
            std::env::remove_var("SCRAPECRAFT_LLM_MODEL");
        }
    }

    #[test]
    fn project_config_overrides_global() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".config.toml"), "[llm]\nmodel = \"project-model\"\n").unwrap();
        let config = ConfigLoader::load(Some(dir.path())).unwrap();
        assert_eq!(config.llm.model, "project-model");
    }
}
