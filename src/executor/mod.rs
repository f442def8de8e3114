//! Script execution capability — runs a generated scraper as a Python
//! subprocess and gates success on `output/data.json` being non-empty.
//!
//! Grounded on `ai/provider/claude_code.rs`'s subprocess pattern
//! (`tokio::process::Command` + `Stdio::piped()` + `tokio::time::timeout`),
//! generalized from a single fixed CLI invocation to an arbitrary script path.

mod validator;

pub use validator::{ScriptValidator, SyntaxCheckResult};

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::types::{Result, ScrapeError};

/// Outcome of a single subprocess run of a generated scraper.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub data_file_written: bool,
}

/// Abstraction over "run this script, tell me what happened" so the Repair
/// Loop can be tested without spawning a real Python interpreter.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn run(&self, script_path: &Path, working_dir: &Path, timeout_budget: Duration) -> Result<ExecutionOutcome>;
}

/// Runs a scraper via `python3 <script_path>`, with `PYTHONPATH` augmented to
/// include the project's runtime support package.
pub struct SubprocessExecutor {
    python_bin: String,
    output_data_file: String,
}

impl Default for SubprocessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl SubprocessExecutor {
    pub fn new() -> Self {
        Self { python_bin: "python3".to_string(), output_data_file: "output/data.json".to_string() }
    }

    pub fn with_python_bin(mut self, bin: impl Into<String>) -> Self {
        self.python_bin = bin.into();
        self
    }
}

#[async_trait]
impl ScriptExecutor for SubprocessExecutor {
    async fn run(&self, script_path: &Path, working_dir: &Path, timeout_budget: Duration) -> Result<ExecutionOutcome> {
        debug!(script = %script_path.display(), timeout = ?timeout_budget, "running generated scraper");

        let mut cmd = Command::new(&self.python_bin);
        cmd.arg(script_path)
            .current_dir(working_dir)
            .env("PYTHONPATH", working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = Instant::now();
        let child = cmd.spawn().map_err(|e| {
            ScrapeError::ScraperRuntime(format!("failed to spawn {}: {e}", self.python_bin))
        })?;

        let output = timeout(timeout_budget, child.wait_with_output())
            .await
            .map_err(|_| ScrapeError::timeout("scraper subprocess", timeout_budget))?
            .map_err(|e| ScrapeError::ScraperRuntime(format!("subprocess wait failed: {e}")))?;

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let data_path = working_dir.join(&self.output_data_file);
        let data_file_written = data_path.exists() && data_path.metadata().map(|m| m.len() > 0).unwrap_or(false);

        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "scraper subprocess exited non-zero");
        }

        Ok(ExecutionOutcome {
            success: output.status.success() && data_file_written,
            stdout,
            stderr,
            exit_code: output.status.code(),
            duration,
            data_file_written,
        })
    }
}
