//! Operator Interface — the decision points a human (wizard/expert mode) or
//! CI defaults resolve differently. Grounded on the engine's CI-mode
//! collapsing policy (login_required=false, first 5 fields, first page,
//! json format) and the TEST handler's multi-way outcome menu.

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{FieldSelection, OutputFormat, Pagination, PaginationConfig, PaginationMode, Result, RunConfig, Understanding};

/// What the operator decided to do with a test run's preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Approve,
    FlagColumns(Vec<String>),
    Regenerate,
    Reconfigure,
    Manual,
    Abort,
}

/// The decision points the engine cannot resolve on its own. One
/// implementation prompts a human (wizard/expert CLI); [`CiOperator`]
/// collapses every decision to its non-interactive default.
#[async_trait]
pub trait OperatorInterface: Send + Sync {
    async fn confirm_low_confidence_override(&self, understanding: &Understanding) -> bool;
    async fn confirm_guided_ready(&self) -> bool;
    async fn choose_run_config(&self, understanding: &Understanding) -> Result<RunConfig>;
    async fn choose_test_outcome(&self, preview: &[Value], test_succeeded: bool) -> TestOutcome;
}

/// Collapses every decision point to its CI default: no low-confidence
/// override, first 5 suggested fields, first page only, JSON output.
pub struct CiOperator;

#[async_trait]
impl OperatorInterface for CiOperator {
    async fn confirm_low_confidence_override(&self, _understanding: &Understanding) -> bool {
        false
    }

    async fn confirm_guided_ready(&self) -> bool {
        true
    }

    async fn choose_run_config(&self, understanding: &Understanding) -> Result<RunConfig> {
        let fields = understanding
            .available_fields
            .iter()
            .take(5)
            .map(|f| FieldSelection { name: f.name.clone(), selector: f.selector_guess.clone() })
            .collect();
        Ok(RunConfig {
            fields,
            pagination: Pagination::FirstPage,
            pagination_config: PaginationConfig { mode: PaginationMode::FirstPage, max_pages: 1 },
            format: OutputFormat::Json,
            browser_mode: understanding.recommended_browser_mode,
        })
    }

    // Not exercised on the CI path today: `Engine::handle_test` short-circuits
    // to APPROVED/FAILED on `ci_mode` before consulting the operator. Kept so
    // the trait has one uniform default and so a future CI preview-review
    // flag has something to call into.
    async fn choose_test_outcome(&self, _preview: &[Value], _test_succeeded: bool) -> TestOutcome {
        TestOutcome::Approve
    }
}
