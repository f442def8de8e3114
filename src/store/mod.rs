//! Artifact Store — per-project JSON documents, whole-file-replace semantics.
//!
//! Grounded on `storage/database.rs`'s module shape (open/ensure-dir, typed
//! accessors per artifact) and `config/loader.rs`'s directory-creation
//! helpers; the persistence backend is plain JSON files rather than SQLite,
//! per the data model's explicit mandate.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::types::{Result, ScrapeError};

pub const SESSION_FILE: &str = "session.json";
pub const SCAN_PROFILE_FILE: &str = "scan_profile.json";
pub const ANALYSIS_SNAPSHOT_FILE: &str = "analysis_snapshot.json";
pub const UNDERSTANDING_FILE: &str = "llm_understanding.json";
pub const RUN_CONFIG_FILE: &str = "run_config.json";
pub const INTERACTION_FILE: &str = "interaction.json";
pub const COOKIES_FILE: &str = "cookies.json";
pub const STORAGE_STATE_FILE: &str = "storage_state.json";
pub const ENV_FILE: &str = ".env";
pub const GENERATED_SCRAPER_FILE: &str = "generated_scraper.py";
pub const WIDE_EVENT_FILE: &str = "wide_event.json";

pub const LOGS_DIR: &str = "logs";
pub const MASTER_LOG_FILE: &str = "master.log";
pub const EVENTS_LOG_FILE: &str = "events.json";
pub const LLM_LOGS_DIR: &str = "llm_logs";
pub const OUTPUT_DIR: &str = "output";
pub const OUTPUT_DATA_FILE: &str = "data.json";

/// A single project's artifact directory. All reads/writes go through this
/// handle so the directory layout stays in one place.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open (and ensure on disk) a project directory and its standard subdirectories.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        fs::create_dir_all(root.join(LOGS_DIR))?;
        fs::create_dir_all(root.join(LLM_LOGS_DIR))?;
        fs::create_dir_all(root.join(OUTPUT_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR)
    }

    pub fn llm_logs_dir(&self) -> PathBuf {
        self.root.join(LLM_LOGS_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Whole-file-replace JSON write: serialize, ensure the parent directory
    /// exists, then write. No journaling — a partial write may replace an
    /// existing artifact, matching the store's documented failure semantics.
    pub fn write_json<T: Serialize>(&self, relative: &str, value: &T) -> Result<()> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(value)?;
        fs::write(&path, content)?;
        debug!(path = %path.display(), "wrote artifact");
        Ok(())
    }

    pub fn read_json<T: DeserializeOwned>(&self, relative: &str) -> Result<T> {
        let path = self.path(relative);
        let content = fs::read_to_string(&path)
            .map_err(|e| ScrapeError::Store(format!("reading {}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| ScrapeError::Parse { message: e.to_string(), path: path.display().to_string() })
    }

    pub fn try_read_json<T: DeserializeOwned>(&self, relative: &str) -> Result<Option<T>> {
        if !self.path(relative).exists() {
            return Ok(None);
        }
        self.read_json(relative).map(Some)
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    pub fn write_text(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn read_text(&self, relative: &str) -> Result<String> {
        Ok(fs::read_to_string(self.path(relative))?)
    }

    /// List every `project_<...>` directory under `projects_root`, newest first.
    pub fn list_projects(projects_root: &Path) -> Result<Vec<PathBuf>> {
        if !projects_root.exists() {
            return Ok(Vec::new());
        }
        let mut entries: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
        for entry in fs::read_dir(projects_root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let modified = entry.metadata()?.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                entries.push((modified, entry.path()));
            }
        }
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, p)| p).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Session, State};

    #[test]
    fn round_trip_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("project_x")).unwrap();

        let session = Session::new("project_x", "https://example.com", store.root().to_path_buf());
        store.write_json(SESSION_FILE, &session).unwrap();

        let loaded: Session = store.read_json(SESSION_FILE).unwrap();
        assert_eq!(loaded.project_id, "project_x");
        assert_eq!(loaded.state, State::Init);
    }

    #[test]
    fn missing_artifact_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("p")).unwrap();
        let missing: Option<Session> = store.try_read_json(SESSION_FILE).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn standard_subdirectories_exist() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("p")).unwrap();
        assert!(store.logs_dir().exists());
        assert!(store.llm_logs_dir().exists());
        assert!(store.output_dir().exists());
    }
}
