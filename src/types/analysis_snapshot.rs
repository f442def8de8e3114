//! AnalysisSnapshot — reconnaissance output consumed by the Understanding agent.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionCandidate {
    pub selector: String,
    pub score: f64,
    pub sample_text: Option<String>,
    pub item_count_estimate: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationSignal {
    pub next_button_selector: Option<String>,
    pub url_param_detected: bool,
    pub infinite_scroll_detected: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub url: String,
    pub title: Option<String>,
    pub detected_tech: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub sections: Vec<SectionCandidate>,
    pub pagination: PaginationSignal,
    pub meta: SnapshotMeta,
    pub interaction_used: bool,
}

impl AnalysisSnapshot {
    /// Sort candidate sections by descending score, per the invariant that
    /// `sections` is always stored best-first.
    pub fn sort_sections(&mut self) {
        self.sections
            .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    }
}
