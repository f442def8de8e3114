//! `clean` — remove every terminal (DONE/FAILED) project directory.

use std::fs;

use crate::cli::ui::output::Output;
use crate::config::ConfigLoader;
use crate::store::{self, ArtifactStore};
use crate::types::{Result, Session};

pub fn run(force: bool) -> Result<()> {
    let output = Output::new();
    let config = ConfigLoader::load(None)?;
    let projects = ArtifactStore::list_projects(&config.projects.root)?;

    let mut to_remove = Vec::new();
    for dir in &projects {
        let store = ArtifactStore::open(dir)?;
        let terminal = store
            .try_read_json::<Session>(store::SESSION_FILE)?
            .map(|s| s.state.is_terminal())
            .unwrap_or(false);
        if terminal {
            to_remove.push(dir.clone());
        }
    }

    if to_remove.is_empty() {
        output.info("No completed or failed projects to clean up.");
        return Ok(());
    }

    if !force {
        output.warning(&format!("Would remove {} project director(ies):", to_remove.len()));
        for dir in &to_remove {
            println!("  {}", dir.display());
        }
        output.info("Re-run with --force to delete them.");
        return Ok(());
    }

    for dir in &to_remove {
        fs::remove_dir_all(dir)?;
        output.success(&format!("Removed {}", dir.display()));
    }

    Ok(())
}
