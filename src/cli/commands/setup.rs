//! `setup` — create the global config file and projects root.

use crate::cli::ui::output::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

pub fn run(force: bool) -> Result<()> {
    let output = Output::new();
    let global_dir = ConfigLoader::init_global(force)?;
    output.success(&format!("Global config ready at {}", global_dir.display()));

    let config = ConfigLoader::load(None)?;
    output.info(&format!("Projects will be created under {}", config.projects.root.display()));
    Ok(())
}
