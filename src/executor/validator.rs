//! Pre-execution syntax check, so a `SyntaxError` is attributed to the
//! generated code rather than surfacing as an opaque non-zero exit.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::types::Result;

#[derive(Debug, Clone)]
pub struct SyntaxCheckResult {
    pub valid: bool,
    pub message: Option<String>,
}

pub struct ScriptValidator {
    python_bin: String,
}

impl Default for ScriptValidator {
    fn default() -> Self {
        Self { python_bin: "python3".to_string() }
    }
}

impl ScriptValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `python3 -m py_compile <path>`: a zero-cost way to distinguish a
    /// `SyntaxError` from a runtime failure before spending a full execution
    /// attempt on it.
    pub async fn check_syntax(&self, script_path: &Path) -> Result<SyntaxCheckResult> {
        debug!(script = %script_path.display(), "checking scraper syntax");

        let output = Command::new(&self.python_bin)
            .arg("-m")
            .arg("py_compile")
            .arg(script_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if output.status.success() {
            Ok(SyntaxCheckResult { valid: true, message: None })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Ok(SyntaxCheckResult { valid: false, message: Some(stderr) })
        }
    }
}
