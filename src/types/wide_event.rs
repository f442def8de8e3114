//! WideEvent — the single terminal observability record emitted per run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::State;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WideEvent {
    pub event_type: String,
    pub project_id: String,
    pub url: String,
    pub success: bool,
    pub duration_seconds: f64,
    pub error: Option<String>,
    pub wizard_mode: bool,
    pub ci_mode: bool,
    pub guided_tour: bool,
    pub final_state: State,
    pub timestamp: DateTime<Utc>,
}

impl WideEvent {
    pub fn completion(
        project_id: impl Into<String>,
        url: impl Into<String>,
        final_state: State,
        duration_seconds: f64,
        error: Option<String>,
        ci_mode: bool,
        guided_tour: bool,
    ) -> Self {
        Self {
            event_type: "session_completion".to_string(),
            project_id: project_id.into(),
            url: url.into(),
            success: final_state == State::Done,
            duration_seconds,
            error,
            wizard_mode: !ci_mode,
            ci_mode,
            guided_tour,
            final_state,
            timestamp: Utc::now(),
        }
    }
}
