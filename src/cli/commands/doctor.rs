//! `doctor` — sanity-check configuration, provider connectivity, and the
//! projects directory before a real run is attempted.

use tokio::runtime::Runtime;

use crate::ai::provider::create_provider;
use crate::cli::ui::output::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

pub fn run() -> Result<()> {
    let output = Output::new();
    output.header("scrapecraft doctor");
    let mut healthy = true;

    let config = match ConfigLoader::load(None) {
        Ok(c) => {
            output.success("Configuration loads and validates");
            c
        }
        Err(e) => {
            output.error(&format!("Configuration error: {}", e));
            return Err(e);
        }
    };

    match std::fs::create_dir_all(&config.projects.root) {
        Ok(()) => output.success(&format!("Projects root is writable: {}", config.projects.root.display())),
        Err(e) => {
            output.error(&format!("Projects root not writable: {}", e));
            healthy = false;
        }
    }

    match create_provider(&config.llm.to_provider_config()) {
        Ok(provider) => {
            let rt = Runtime::new()?;
            match rt.block_on(provider.health_check()) {
                Ok(true) => output.success(&format!("LLM provider '{}' reachable", config.llm.provider)),
                Ok(false) => {
                    output.warning(&format!("LLM provider '{}' reported unhealthy", config.llm.provider));
                    healthy = false;
                }
                Err(e) => {
                    output.error(&format!("LLM provider health check failed: {}", e));
                    healthy = false;
                }
            }
        }
        Err(e) => {
            output.error(&format!("Could not construct LLM provider: {}", e));
            healthy = false;
        }
    }

    if healthy {
        output.success("All checks passed");
        Ok(())
    } else {
        output.error("One or more checks failed");
        Err(crate::types::ScrapeError::Config("doctor checks failed".to_string()))
    }
}
