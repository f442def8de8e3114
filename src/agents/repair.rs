//! Repair agent — given a failing generated scraper and its classified
//! failure, produces a fixed version of the same script.

use serde_json::{Value, json};

use super::{AgentRunner, parsing};
use crate::types::{Result, ScrapeError, ScraperErrorKind};

pub struct RepairAgent {
    runner: AgentRunner,
}

impl RepairAgent {
    pub fn new(runner: AgentRunner) -> Self {
        Self { runner }
    }

    pub async fn run(
        &self,
        previous_code: &str,
        kind: ScraperErrorKind,
        failure_output: &str,
        column_hints: Option<&[String]>,
    ) -> Result<String> {
        let prompt = build_prompt(previous_code, kind, failure_output, column_hints);
        let value = self.runner.call("repair", &prompt, &schema()).await?;

        match value.get("code").and_then(Value::as_str) {
            Some(code) if !code.trim().is_empty() => Ok(parsing::extract_python_code(code)),
            _ => {
                let raw = value.to_string();
                let code = parsing::extract_python_code(&raw);
                if code.trim().is_empty() {
                    Err(ScrapeError::Llm("repair agent returned no extractable code".to_string()))
                } else {
                    Ok(code)
                }
            }
        }
    }
}

fn build_prompt(
    previous_code: &str,
    kind: ScraperErrorKind,
    failure_output: &str,
    column_hints: Option<&[String]>,
) -> String {
    let truncated_output: String = failure_output.chars().take(4000).collect();
    let hint_line = match column_hints {
        Some(cols) if !cols.is_empty() => {
            format!("\nThe operator flagged these columns as wrong; focus the fix there: {}\n", cols.join(", "))
        }
        _ => String::new(),
    };
    format!(
        "The following generated scraper failed with a {kind} during execution.\n\n\
         --- failure output ---\n{truncated_output}\n\n\
         --- current script ---\n{previous_code}\n{hint_line}\n\
         Fix the script so it no longer fails this way. Keep the `__main__` block exactly as \
         written and keep the runtime base class subclassed; change only what is needed to \
         resolve the failure. Respond with the complete corrected script.",
    )
}

fn schema() -> Value {
    json!({
        "type": "object",
        "required": ["code"],
        "properties": {
            "code": {"type": "string", "description": "Complete corrected Python source"}
        }
    })
}
