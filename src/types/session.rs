//! Session — the durable state-machine record for one project run.
//!
//! Grounded on `wiki/exhaustive/checkpoint.rs`'s enum-with-methods idiom for
//! phase tracking, adapted here to the project's finite state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SessionId;

/// Workflow states, in the exact transition table named by the engine design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    Init,
    GuidedAccess,
    Recon,
    InteractiveSolve,
    LlmAnalysis,
    UserConfig,
    Codegen,
    Test,
    Repair,
    Approved,
    Done,
    Failed,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::GuidedAccess => "GUIDED_ACCESS",
            Self::Recon => "RECON",
            Self::InteractiveSolve => "INTERACTIVE_SOLVE",
            Self::LlmAnalysis => "LLM_ANALYSIS",
            Self::UserConfig => "USER_CONFIG",
            Self::Codegen => "CODEGEN",
            Self::Test => "TEST",
            Self::Repair => "REPAIR",
            Self::Approved => "APPROVED",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Operator/CI flags that influence handler behavior across the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFlags {
    pub login_performed: bool,
    pub fix_columns: Option<Vec<String>>,
    pub force_guided: bool,
    pub ci_mode: bool,
    pub expert_mode: bool,
}

impl Default for SessionFlags {
    fn default() -> Self {
        Self {
            login_performed: false,
            fix_columns: None,
            force_guided: false,
            ci_mode: false,
            expert_mode: false,
        }
    }
}

/// One entry in the session's transition history, for audit/debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub from: State,
    pub to: State,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
}

/// The Session artifact: `session.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub project_id: String,
    pub url: String,
    pub state: State,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub project_dir: std::path::PathBuf,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(flatten)]
    pub flags: SessionFlags,
    #[serde(default)]
    pub format: Option<String>,
}

impl Session {
    pub fn new(project_id: impl Into<String>, url: impl Into<String>, project_dir: std::path::PathBuf) -> Self {
        let now = Utc::now();
        Self {
            project_id: project_id.into(),
            url: url.into(),
            state: State::Init,
            created_at: now,
            updated_at: now,
            project_dir,
            history: Vec::new(),
            flags: SessionFlags::default(),
            format: None,
        }
    }

    pub fn session_id(&self) -> SessionId {
        SessionId::new(self.project_id.clone())
    }

    /// Transition to a new state, appending a history entry and bumping `updated_at`.
    pub fn transition(&mut self, to: State, note: Option<String>) {
        self.history.push(HistoryEntry { from: self.state, to, at: Utc::now(), note });
        self.state = to;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(State::Done.is_terminal());
        assert!(State::Failed.is_terminal());
        assert!(!State::Recon.is_terminal());
    }

    #[test]
    fn transition_records_history() {
        let mut s = Session::new("p1", "https://example.com", "/tmp/p1".into());
        s.transition(State::Recon, Some("probe ok".into()));
        assert_eq!(s.state, State::Recon);
        assert_eq!(s.history.len(), 1);
        assert_eq!(s.history[0].from, State::Init);
        assert_eq!(s.history[0].to, State::Recon);
    }
}
