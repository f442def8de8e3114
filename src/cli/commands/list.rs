//! `list` — show every known project, newest first.

use crate::config::ConfigLoader;
use crate::store::{self, ArtifactStore};
use crate::types::{Result, Session};

pub fn run() -> Result<()> {
    let config = ConfigLoader::load(None)?;
    let projects = ArtifactStore::list_projects(&config.projects.root)?;

    if projects.is_empty() {
        println!("No projects found under {}", config.projects.root.display());
        return Ok(());
    }

    println!("{:<40} {:<12} {}", "PROJECT", "STATE", "URL");
    for dir in projects {
        let store = ArtifactStore::open(&dir)?;
        let name = dir.file_name().and_then(|n| n.to_str()).unwrap_or("?").to_string();
        match store.try_read_json::<Session>(store::SESSION_FILE)? {
            Some(session) => println!("{:<40} {:<12} {}", name, session.state.name(), session.url),
            None => println!("{:<40} {:<12} {}", name, "UNKNOWN", ""),
        }
    }

    Ok(())
}
