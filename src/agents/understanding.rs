//! Understanding agent — turns an [`AnalysisSnapshot`] into an [`Understanding`]
//! verdict on whether (and how) the target can be scraped.

use serde_json::{Value, json};

use super::AgentRunner;
use crate::types::{AnalysisSnapshot, Result, Understanding};

pub struct UnderstandingAgent {
    runner: AgentRunner,
}

impl UnderstandingAgent {
    pub fn new(runner: AgentRunner) -> Self {
        Self { runner }
    }

    pub async fn run(&self, url: &str, snapshot: &AnalysisSnapshot) -> Result<Understanding> {
        let prompt = build_prompt(url, snapshot);
        let value = self.runner.call("understanding", &prompt, &schema()).await?;
        let understanding: Understanding = serde_json::from_value(value).map_err(|e| {
            crate::types::ScrapeError::Parse { message: e.to_string(), path: "understanding agent reply".to_string() }
        })?;
        Ok(understanding)
    }
}

fn build_prompt(url: &str, snapshot: &AnalysisSnapshot) -> String {
    let sections = snapshot
        .sections
        .iter()
        .take(10)
        .map(|s| format!("- {} (score {:.2}, ~{} items): {}", s.selector, s.score, s.item_count_estimate, s.sample_text.as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are evaluating whether the page at {url} can be scraped automatically.\n\n\
         Page title: {title}\n\
         Detected technologies: {tech}\n\
         Pagination signals: next_button={next_button:?} url_param={url_param} infinite_scroll={infinite_scroll}\n\n\
         Candidate repeating-content sections, best first:\n{sections}\n\n\
         Decide: is scraping possible, how confident are you, should the browser run headed \
         or headless, which fields look extractable, and what pagination strategy applies. \
         If scraping is not possible, confidence must be low.",
        title = snapshot.meta.title.as_deref().unwrap_or("(untitled)"),
        tech = snapshot.meta.detected_tech.join(", "),
        next_button = snapshot.pagination.next_button_selector,
        url_param = snapshot.pagination.url_param_detected,
        infinite_scroll = snapshot.pagination.infinite_scroll_detected,
    )
}

fn schema() -> Value {
    json!({
        "type": "object",
        "required": ["scraping_possible", "confidence", "recommended_browser_mode", "reason", "available_fields", "pagination"],
        "properties": {
            "scraping_possible": {"type": "boolean"},
            "confidence": {"type": "number"},
            "recommended_browser_mode": {"type": "string", "enum": ["headless", "headed"]},
            "reason": {"type": "string"},
            "available_fields": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "description": {"type": "string"},
                        "selector_guess": {"type": "string"},
                        "suggested": {"type": "boolean"}
                    }
                }
            },
            "pagination": {
                "type": "object",
                "properties": {
                    "strategy": {"type": "string", "enum": ["next_button", "url_param", "none"]},
                    "next_button_selector": {"type": ["string", "null"]}
                }
            }
        }
    })
}
