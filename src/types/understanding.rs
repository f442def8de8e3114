//! Understanding — the Understanding agent's structured reply, materialized
//! to `llm_understanding.json`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserMode {
    Headless,
    Headed,
}

/// Pagination strategy as reported by the model. `UrlParam` is recognized but
/// not driven by the generated runtime — see DESIGN.md Open Question #1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStrategy {
    NextButton,
    UrlParam,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSuggestion {
    pub name: String,
    pub description: String,
    pub selector_guess: String,
    #[serde(default)]
    pub suggested: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationGuess {
    pub strategy: PaginationStrategy,
    #[serde(default)]
    pub next_button_selector: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Understanding {
    pub scraping_possible: bool,
    pub confidence: f64,
    pub recommended_browser_mode: BrowserMode,
    pub reason: String,
    pub available_fields: Vec<FieldSuggestion>,
    pub pagination: PaginationGuess,
}

impl Understanding {
    /// By prompt policy, infeasibility implies low confidence.
    pub fn is_policy_consistent(&self) -> bool {
        if !self.scraping_possible {
            self.confidence < crate::constants::confidence::INFEASIBLE_MAX_CONFIDENCE
        } else {
            true
        }
    }

    pub fn suggested_fields(&self) -> Vec<&FieldSuggestion> {
        self.available_fields.iter().filter(|f| f.suggested).collect()
    }
}
