//! Interactive operator — prompts a human on stdin for the decision points
//! [`CiOperator`](crate::workflow::operator::CiOperator) collapses to
//! defaults. Drives the `scrape` command's wizard and expert modes.

use std::io::{self, Write};

use async_trait::async_trait;
use console::style;
use serde_json::Value;

use crate::types::{
    FieldSelection, OutputFormat, Pagination, PaginationConfig, PaginationMode, Result, RunConfig,
    Understanding,
};
use crate::workflow::operator::{OperatorInterface, TestOutcome};

/// Prompts over stdin/stdout. `expert` widens the choices offered (pagination
/// depth, output format, manual field entry) beyond the wizard defaults.
pub struct InteractiveOperator {
    expert: bool,
}

impl InteractiveOperator {
    pub fn new(expert: bool) -> Self {
        Self { expert }
    }

    fn prompt(&self, question: &str) -> String {
        print!("{} ", style(question).cyan());
        io::stdout().flush().ok();
        let mut line = String::new();
        io::stdin().read_line(&mut line).ok();
        line.trim().to_string()
    }

    fn confirm(&self, question: &str, default_yes: bool) -> bool {
        let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
        let answer = self.prompt(&format!("{} {}", question, hint));
        if answer.is_empty() { default_yes } else { matches!(answer.to_lowercase().as_str(), "y" | "yes") }
    }
}

#[async_trait]
impl OperatorInterface for InteractiveOperator {
    async fn confirm_low_confidence_override(&self, understanding: &Understanding) -> bool {
        println!(
            "{}",
            style(format!(
                "Understanding confidence is low ({:.0}%): {}",
                understanding.confidence * 100.0,
                understanding.reason
            ))
            .yellow()
        );
        self.confirm("Proceed anyway?", false)
    }

    async fn confirm_guided_ready(&self) -> bool {
        println!(
            "{}",
            style("This site needs a guided session: a headed browser window will open so you can sign in, clear a challenge, or otherwise establish access.").yellow()
        );
        self.confirm("Ready to continue?", true)
    }

    async fn choose_run_config(&self, understanding: &Understanding) -> Result<RunConfig> {
        println!("{}", style("Available fields:").bold());
        for (i, field) in understanding.available_fields.iter().enumerate() {
            let marker = if field.suggested { "*" } else { " " };
            println!("  [{}] {} {} — {}", i + 1, marker, field.name, field.description);
        }

        let fields = if self.expert {
            let answer = self.prompt(
                "Select field numbers (comma-separated, blank = suggested fields):",
            );
            if answer.is_empty() {
                understanding
                    .suggested_fields()
                    .into_iter()
                    .map(|f| FieldSelection { name: f.name.clone(), selector: f.selector_guess.clone() })
                    .collect()
            } else {
                answer
                    .split(',')
                    .filter_map(|s| s.trim().parse::<usize>().ok())
                    .filter_map(|i| understanding.available_fields.get(i.saturating_sub(1)))
                    .map(|f| FieldSelection { name: f.name.clone(), selector: f.selector_guess.clone() })
                    .collect()
            }
        } else {
            understanding
                .suggested_fields()
                .into_iter()
                .map(|f| FieldSelection { name: f.name.clone(), selector: f.selector_guess.clone() })
                .collect()
        };

        let (pagination, pagination_config) = if self.expert {
            let answer = self.prompt("Pagination — (f)irst page, (5) up to 5 pages, (a)ll pages [f]:");
            match answer.to_lowercase().as_str() {
                "a" | "all" => {
                    (Pagination::AllPages, PaginationConfig { mode: PaginationMode::All, max_pages: 50 })
                }
                "5" => (Pagination::Limit5, PaginationConfig { mode: PaginationMode::All, max_pages: 5 }),
                _ => (
                    Pagination::FirstPage,
                    PaginationConfig { mode: PaginationMode::FirstPage, max_pages: 1 },
                ),
            }
        } else {
            (Pagination::FirstPage, PaginationConfig { mode: PaginationMode::FirstPage, max_pages: 1 })
        };

        let format = if self.expert {
            let answer = self.prompt("Output format — (j)son, (c)sv, (x)lsx, (a)ll [j]:");
            match answer.to_lowercase().as_str() {
                "c" | "csv" => OutputFormat::Csv,
                "x" | "xlsx" => OutputFormat::Xlsx,
                "a" | "all" => OutputFormat::All,
                _ => OutputFormat::Json,
            }
        } else {
            OutputFormat::Json
        };

        Ok(RunConfig {
            fields,
            pagination,
            pagination_config,
            format,
            browser_mode: understanding.recommended_browser_mode,
        })
    }

    async fn choose_test_outcome(&self, preview: &[Value], test_succeeded: bool) -> TestOutcome {
        println!(
            "{}",
            style(format!(
                "Test run {}: {} row(s) extracted.",
                if test_succeeded { "succeeded" } else { "failed" },
                preview.len()
            ))
            .bold()
        );
        if !preview.is_empty() {
            let sample = serde_json::to_string_pretty(&preview[0]).unwrap_or_default();
            println!("First row:\n{}", sample);
        }

        loop {
            let answer = self.prompt(
                "(a)pprove, (f)lag columns, (r)egenerate, (c)onfigure again, (m)anual, (x) abort:",
            );
            match answer.to_lowercase().as_str() {
                "a" | "approve" => return TestOutcome::Approve,
                "f" | "flag" => {
                    let cols = self.prompt("Column names to flag (comma-separated):");
                    let columns = cols.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
                    return TestOutcome::FlagColumns(columns);
                }
                "r" | "regenerate" => return TestOutcome::Regenerate,
                "c" | "configure" => return TestOutcome::Reconfigure,
                "m" | "manual" => return TestOutcome::Manual,
                "x" | "abort" => return TestOutcome::Abort,
                _ => println!("{}", style("Unrecognized choice, try again.").red()),
            }
        }
    }
}
