//! InteractionLog — the record of any manual/guided browser session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Automatic,
    Guided,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionStep {
    pub description: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionLog {
    pub access_mode: AccessMode,
    #[serde(default)]
    pub steps: Vec<InteractionStep>,
    #[serde(default)]
    pub captcha_solved_manually: Option<bool>,
    #[serde(default)]
    pub final_url: Option<String>,
}

impl InteractionLog {
    pub fn new(access_mode: AccessMode) -> Self {
        Self { access_mode, steps: Vec::new(), captcha_solved_manually: None, final_url: None }
    }

    pub fn record(&mut self, description: impl Into<String>) {
        self.steps.push(InteractionStep { description: description.into(), at: Utc::now() });
    }
}
