//! CodeGen agent — writes the standalone Python scraper for a confirmed
//! [`RunConfig`], against the `scraper_runtime.BaseScraper` contract.

use serde_json::{Value, json};

use super::{AgentRunner, parsing};
use crate::types::{Result, RunConfig, ScrapeError, Understanding};

pub struct CodeGenAgent {
    runner: AgentRunner,
}

impl CodeGenAgent {
    pub fn new(runner: AgentRunner) -> Self {
        Self { runner }
    }

    /// Returns the generated scraper's Python source.
    pub async fn run(&self, url: &str, understanding: &Understanding, run_config: &RunConfig) -> Result<String> {
        let prompt = build_prompt(url, understanding, run_config);
        let value = self.runner.call("codegen", &prompt, &schema()).await?;

        match value.get("code").and_then(Value::as_str) {
            Some(code) if !code.trim().is_empty() => Ok(parsing::extract_python_code(code)),
            _ => {
                // Model ignored the schema and replied with prose/markdown directly.
                let raw = value.to_string();
                let code = parsing::extract_python_code(&raw);
                if code.trim().is_empty() {
                    Err(ScrapeError::Llm("codegen agent returned no extractable code".to_string()))
                } else {
                    Ok(code)
                }
            }
        }
    }
}

fn build_prompt(url: &str, understanding: &Understanding, run_config: &RunConfig) -> String {
    let fields = run_config
        .fields
        .iter()
        .map(|f| format!("- {}: {}", f.name, f.selector))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Write a standalone Python scraper for {url}.\n\n\
         It must:\n\
         - `from scraper_runtime import BaseScraper, PaginationDriver`\n\
         - Extract these fields per item:\n{fields}\n\
         - Use pagination mode `{pagination_mode:?}` (max_pages={max_pages})\n\
         - Run the browser in `{browser_mode:?}` mode\n\
         - Call `self.write_records(records)` before exiting, skipping duplicates via `is_duplicate(...)`\n\
         - Reasoning for feasibility from the understanding step: {reason}\n\n\
         Respond with the complete script.",
        pagination_mode = run_config.pagination_config.mode,
        max_pages = run_config.pagination_config.max_pages,
        browser_mode = understanding.recommended_browser_mode,
        reason = understanding.reason,
    )
}

fn schema() -> Value {
    json!({
        "type": "object",
        "required": ["code"],
        "properties": {
            "code": {"type": "string", "description": "Complete Python source for the generated scraper"}
        }
    })
}
