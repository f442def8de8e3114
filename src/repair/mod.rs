//! Repair Loop — bounded execute/repair alternation for a generated scraper.
//!
//! Grounded on `ai/provider/chain.rs`'s category-dispatch retry idiom
//! (classify the failure, decide what to do, retry within a fixed attempt
//! budget) and `constants::chain`'s attempt-budget pattern, retargeted from
//! LLM transport retries to scraper subprocess repairs.

use std::path::Path;
use std::time::Duration;

use tokio::fs;
use tracing::{info, warn};

use crate::agents::RepairAgent;
use crate::constants::repair as repair_constants;
use crate::executor::{ScriptExecutor, ScriptValidator};
use crate::types::{Result, ScraperErrorClassifier, ScraperErrorKind};

/// Alternates test/repair against a single script path, in place.
pub struct RepairLoop<E: ScriptExecutor> {
    executor: E,
    validator: ScriptValidator,
    agent: RepairAgent,
    max_attempts: u32,
}

impl<E: ScriptExecutor> RepairLoop<E> {
    pub fn new(executor: E, agent: RepairAgent) -> Self {
        Self { executor, validator: ScriptValidator::new(), agent, max_attempts: repair_constants::MAX_REPAIR_ATTEMPTS }
    }

    /// Runs the bounded loop: test, and if the test fails, classify and
    /// repair, up to `max_attempts` repairs (so `max_attempts + 1` tests
    /// total). Returns `true` the first time a test succeeds, `false` if the
    /// budget is exhausted or the Repair agent itself errors.
    pub async fn run(
        &self,
        script_path: &Path,
        working_dir: &Path,
        timeout_budget: Duration,
        column_hints: Option<&[String]>,
    ) -> Result<bool> {
        let mut attempt = 0u32;
        loop {
            let (success, output_text) = self.test_once(script_path, working_dir, timeout_budget).await?;
            if success {
                info!(attempt, "repair loop: script passed");
                return Ok(true);
            }
            if attempt >= self.max_attempts {
                warn!(attempt, "repair loop: attempt budget exhausted");
                return Ok(false);
            }

            let kind = ScraperErrorClassifier::classify(&output_text);
            if !kind.is_recoverable() {
                warn!(%kind, "repair loop: classified as non-recoverable, attempting repair anyway");
            }

            let previous_code = fs::read_to_string(script_path).await?;
            let repaired = match self.agent.run(&previous_code, kind, &output_text, column_hints).await {
                Ok(code) => code,
                Err(e) => {
                    warn!(error = %e, "repair agent raised; aborting repair loop");
                    return Ok(false);
                }
            };
            fs::write(script_path, repaired).await?;
            attempt += 1;
        }
    }

    async fn test_once(&self, script_path: &Path, working_dir: &Path, timeout_budget: Duration) -> Result<(bool, String)> {
        let syntax = self.validator.check_syntax(script_path).await?;
        if !syntax.valid {
            return Ok((false, syntax.message.unwrap_or_else(|| "syntax error".to_string())));
        }

        let outcome = self.executor.run(script_path, working_dir, timeout_budget).await?;
        let combined = format!("{}\n{}", outcome.stdout, outcome.stderr);
        Ok((outcome.success, combined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{LlmProvider, LlmResponse, ResponseMetadata};
    use crate::agents::AgentRunner;
    use crate::executor::ExecutionOutcome;
    use crate::store::ArtifactStore;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct ScriptedExecutor {
        remaining_failures: AtomicU32,
    }

    #[async_trait]
    impl ScriptExecutor for ScriptedExecutor {
        async fn run(&self, _script_path: &Path, _working_dir: &Path, _timeout_budget: Duration) -> Result<ExecutionOutcome> {
            if self.remaining_failures.load(Ordering::SeqCst) > 0 {
                self.remaining_failures.fetch_sub(1, Ordering::SeqCst);
                Ok(ExecutionOutcome {
                    success: false,
                    stdout: String::new(),
                    stderr: "KeyError: 'title'".to_string(),
                    exit_code: Some(1),
                    duration: Duration::from_millis(1),
                    data_file_written: false,
                })
            } else {
                Ok(ExecutionOutcome {
                    success: true,
                    stdout: "wrote 10 records".to_string(),
                    stderr: String::new(),
                    exit_code: Some(0),
                    duration: Duration::from_millis(1),
                    data_file_written: true,
                })
            }
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl ScriptExecutor for FailingExecutor {
        async fn run(&self, _script_path: &Path, _working_dir: &Path, _timeout_budget: Duration) -> Result<ExecutionOutcome> {
            Ok(ExecutionOutcome {
                success: false,
                stdout: String::new(),
                stderr: "KeyError: 'title'".to_string(),
                exit_code: Some(1),
                duration: Duration::from_millis(1),
                data_file_written: false,
            })
        }
    }

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn generate(&self, _prompt: &str, _schema: &Value) -> Result<LlmResponse> {
            let mut response =
                LlmResponse::content_only(json!({"code": "class Scraper(BaseScraper):\n    pass\n"}));
            response.metadata = ResponseMetadata { provider: "echo".to_string(), model: "echo".to_string() };
            Ok(response)
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    fn repair_agent(store: ArtifactStore) -> RepairAgent {
        RepairAgent::new(AgentRunner::new(Arc::new(EchoProvider), store))
    }

    const VALID_STUB: &str = "class Scraper:\n    pass\n";

    #[tokio::test]
    async fn succeeds_after_one_repair() {
        let dir = tempfile::tempdir().unwrap();
        let script_path = dir.path().join("generated_scraper.py");
        tokio::fs::write(&script_path, VALID_STUB).await.unwrap();
        let store = ArtifactStore::open(dir.path().join("store")).unwrap();

        let executor = ScriptedExecutor { remaining_failures: AtomicU32::new(1) };
        let loop_ = RepairLoop::new(executor, repair_agent(store));

        let result = loop_.run(&script_path, dir.path(), Duration::from_secs(5), None).await.unwrap();
        assert!(result);
        let final_code = tokio::fs::read_to_string(&script_path).await.unwrap();
        assert!(final_code.contains("BaseScraper"));
    }

    #[tokio::test]
    async fn exhausts_budget_and_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let script_path = dir.path().join("generated_scraper.py");
        tokio::fs::write(&script_path, VALID_STUB).await.unwrap();
        let store = ArtifactStore::open(dir.path().join("store")).unwrap();

        let loop_ = RepairLoop::new(FailingExecutor, repair_agent(store));
        let result = loop_.run(&script_path, dir.path(), Duration::from_secs(5), None).await.unwrap();
        assert!(!result);
    }

    #[tokio::test]
    async fn immediate_success_skips_repair() {
        let dir = tempfile::tempdir().unwrap();
        let script_path = dir.path().join("generated_scraper.py");
        tokio::fs::write(&script_path, VALID_STUB).await.unwrap();
        let store = ArtifactStore::open(dir.path().join("store")).unwrap();

        let executor = ScriptedExecutor { remaining_failures: AtomicU32::new(0) };
        let loop_ = RepairLoop::new(executor, repair_agent(store));
        let result = loop_.run(&script_path, dir.path(), Duration::from_secs(5), None).await.unwrap();
        assert!(result);
    }
}
