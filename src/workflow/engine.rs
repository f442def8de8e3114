//! The Orchestrator: one handler per [`State`], dispatched in a loop that
//! persists the Session after every transition.
//!
//! Grounded on `cli/commands/wiki.rs`'s `run_with_options` top-level dispatch
//! shape (read state, act, persist, loop) and `wiki/exhaustive/checkpoint.rs`'s
//! phase-as-enum-with-methods idiom.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::warn;

use super::operator::{OperatorInterface, TestOutcome};
use super::retry;
use crate::agents::{AgentRunner, CodeGenAgent, RepairAgent, UnderstandingAgent};
use crate::ai::provider::LlmProvider;
use crate::browser::{self, BrowserPage};
use crate::constants::{confidence, execution, scoring};
use crate::executor::{ScriptExecutor, SubprocessExecutor};
use crate::repair::RepairLoop;
use crate::runtime_contract;
use crate::scanner;
use crate::store::{self, ArtifactStore};
use crate::types::{
    AccessMode, AccessRecommendation, AnalysisSnapshot, InteractionLog, PaginationMode, PaginationStrategy,
    Result, RunConfig, ScanProfile, Session, State, Understanding, WideEvent,
};

type HandlerResult = Result<(State, Option<String>)>;

/// Drives one project's [`Session`] to a terminal state. Generic over
/// [`OperatorInterface`] so the same engine runs under CI defaults or an
/// interactive wizard/expert front-end.
pub struct Engine<O: OperatorInterface> {
    store: ArtifactStore,
    provider: Arc<dyn LlmProvider>,
    operator: O,
}

impl<O: OperatorInterface> Engine<O> {
    pub fn new(store: ArtifactStore, provider: Arc<dyn LlmProvider>, operator: O) -> Self {
        Self { store, provider, operator }
    }

    /// Runs `session` until it reaches a terminal state, persisting after
    /// every handler and emitting exactly one Wide Event on termination.
    /// A no-op on a session that is already terminal (resume is a separate,
    /// CLI-level concern: re-entering a terminal session intentionally is
    /// not this method's job).
    pub async fn run(&self, session: &mut Session) -> Result<()> {
        if session.state.is_terminal() {
            return Ok(());
        }

        let start = Instant::now();
        match self.drive(session).await {
            Ok(()) => {
                self.emit_wide_event(session, start.elapsed(), None)?;
                Ok(())
            }
            Err(e) => {
                session.transition(State::Failed, Some(e.to_string()));
                self.persist(session)?;
                self.emit_wide_event(session, start.elapsed(), Some(e.to_string()))?;
                Err(e)
            }
        }
    }

    async fn drive(&self, session: &mut Session) -> Result<()> {
        while !session.state.is_terminal() {
            let current = session.state;
            let (next, note) = self.dispatch(current, session).await?;
            session.transition(next, note);
            self.persist(session)?;
        }
        Ok(())
    }

    async fn dispatch(&self, state: State, session: &mut Session) -> HandlerResult {
        match state {
            State::Init => self.handle_init(session).await,
            State::GuidedAccess => self.handle_guided_access(session).await,
            State::Recon => self.handle_recon(session).await,
            State::InteractiveSolve => self.handle_interactive_solve(session).await,
            State::LlmAnalysis => self.handle_llm_analysis(session).await,
            State::UserConfig => self.handle_user_config(session).await,
            State::Codegen => self.handle_codegen(session).await,
            State::Test => self.handle_test(session).await,
            State::Repair => self.handle_repair(session).await,
            State::Approved => self.handle_approved(session).await,
            State::Done | State::Failed => {
                unreachable!("terminal states never enter dispatch; the drive loop filters them")
            }
        }
    }

    fn persist(&self, session: &Session) -> Result<()> {
        self.store.write_json(store::SESSION_FILE, session)
    }

    fn emit_wide_event(&self, session: &Session, elapsed: Duration, error: Option<String>) -> Result<()> {
        let guided_tour = session.history.iter().any(|h| h.to == State::GuidedAccess);
        let event = WideEvent::completion(
            &session.project_id,
            &session.url,
            session.state,
            elapsed.as_secs_f64(),
            error,
            session.flags.ci_mode,
            guided_tour,
        );
        self.store.write_json(store::WIDE_EVENT_FILE, &event)
    }

    // -- INIT ---------------------------------------------------------------
    //
    // Stealth probe: a short headed navigation, since headless browsers trip
    // bot defenses a real browser window does not. `scanner::scan` performs
    // the navigation itself and never propagates a navigation failure — it
    // absorbs it into `ScanProfile::probe_failed`. A failure to even launch
    // the browser gets the same conservative fallback, so a probe failure is
    // never, by itself, terminal (S6).
    async fn handle_init(&self, session: &mut Session) -> HandlerResult {
        let profile = match browser::launch(false).await {
            Ok(page) => scanner::scan(page.as_ref(), &session.url)
                .await
                .unwrap_or_else(|_| ScanProfile::probe_failed(&session.url)),
            Err(e) => {
                warn!(error = %e, "failed to launch a headed browser for the stealth probe");
                ScanProfile::probe_failed(&session.url)
            }
        };

        self.store.write_json(store::SCAN_PROFILE_FILE, &profile)?;

        if profile.hostility_score >= scoring::HOSTILITY_GUIDED_THRESHOLD {
            session.flags.force_guided = true;
        }

        match profile.access_recommendation {
            Some(AccessRecommendation::Guided) => {
                Ok((State::GuidedAccess, Some("scan recommends guided access".to_string())))
            }
            _ => Ok((State::Recon, None)),
        }
    }

    // -- GUIDED_ACCESS --------------------------------------------------------
    //
    // Always routes to RECON once the operator confirms the manual session is
    // done — the engine re-probes behaviorally with cookies/storage now in
    // place rather than trust the guided pass alone.
    async fn handle_guided_access(&self, session: &mut Session) -> HandlerResult {
        let page = browser::launch(false).await?;
        page.navigate(&session.url, Duration::from_secs(crate::constants::scan::NAV_TIMEOUT_SECS)).await?;

        let mut log = InteractionLog::new(AccessMode::Guided);
        log.record("opened a headed browser for manual access");

        let ready = self.operator.confirm_guided_ready().await;
        log.record(if ready {
            "operator confirmed the manual session is complete"
        } else {
            "operator did not confirm completion; proceeding with best-effort captured state"
        });
        log.final_url = page.current_url().await.ok();

        self.store.write_json(store::INTERACTION_FILE, &log)?;
        self.store.write_json(store::COOKIES_FILE, &page.cookies().await.unwrap_or_default())?;
        self.store
            .write_json(store::STORAGE_STATE_FILE, &page.storage_state_json().await.unwrap_or(Value::Object(Default::default())))?;

        session.flags.login_performed = true;
        Ok((State::Recon, Some("guided access session captured".to_string())))
    }

    // -- RECON ----------------------------------------------------------------
    //
    // The one scanner call whose navigation actually propagates `Err`, so the
    // retry envelope is functionally meaningful here (unlike INIT's `scan`).
    async fn handle_recon(&self, session: &mut Session) -> HandlerResult {
        let headless = !session.flags.login_performed;
        let page = browser::launch(headless).await?;
        let url = session.url.clone();

        let snapshot: Result<AnalysisSnapshot> =
            retry::with_retry("reconnaissance navigation", || async { scanner::reconnaissance(page.as_ref(), &url).await }).await;

        let mut snapshot = match snapshot {
            Ok(s) => s,
            Err(e) => return Ok((State::Failed, Some(format!("reconnaissance failed after retries: {e}")))),
        };
        snapshot.sort_sections();
        self.store.write_json(store::ANALYSIS_SNAPSHOT_FILE, &snapshot)?;

        // Defense in depth: a live anti-bot challenge RECON's own navigation
        // hits, even though INIT's scan scored the site as automatic.
        let profile: Option<ScanProfile> = self.store.try_read_json(store::SCAN_PROFILE_FILE)?;
        let live_challenge = profile
            .map(|p| p.access_recommendation == Some(AccessRecommendation::Automatic) && p.tech_stack.anti_bot.is_some())
            .unwrap_or(false);

        if live_challenge {
            if session.flags.expert_mode {
                return Ok((State::InteractiveSolve, Some("live anti-bot defense detected during reconnaissance".to_string())));
            }
            // GUIDED_ACCESS is not a legal RECON transition; there is no
            // automatic fallback to offer in wizard/CI mode here.
            return Ok((State::Failed, Some("anti-bot defense detected during reconnaissance".to_string())));
        }

        Ok((State::LlmAnalysis, None))
    }

    // -- INTERACTIVE_SOLVE ------------------------------------------------
    async fn handle_interactive_solve(&self, session: &mut Session) -> HandlerResult {
        let page = browser::launch(false).await?;
        page.navigate(&session.url, Duration::from_secs(crate::constants::scan::NAV_TIMEOUT_SECS)).await?;

        let mut log: InteractionLog =
            self.store.try_read_json(store::INTERACTION_FILE)?.unwrap_or_else(|| InteractionLog::new(AccessMode::Guided));
        log.record("operator invited to clear the live challenge by hand");

        let solved = self.operator.confirm_guided_ready().await;
        log.captcha_solved_manually = Some(solved);
        log.final_url = page.current_url().await.ok();
        self.store.write_json(store::INTERACTION_FILE, &log)?;

        if !solved {
            return Ok((State::Failed, Some("operator did not clear the interactive challenge".to_string())));
        }
        session.flags.login_performed = true;
        Ok((State::LlmAnalysis, Some("interactive challenge cleared".to_string())))
    }

    // -- LLM_ANALYSIS -------------------------------------------------------
    async fn handle_llm_analysis(&self, session: &mut Session) -> HandlerResult {
        let snapshot: AnalysisSnapshot = self.store.read_json(store::ANALYSIS_SNAPSHOT_FILE)?;
        let agent = UnderstandingAgent::new(AgentRunner::new(self.provider.clone(), self.store.clone()));
        let understanding = agent.run(&session.url, &snapshot).await?;
        self.store.write_json(store::UNDERSTANDING_FILE, &understanding)?;

        let infeasible =
            !understanding.scraping_possible || understanding.confidence < confidence::INFEASIBLE_MAX_CONFIDENCE;

        if session.flags.ci_mode {
            if infeasible || understanding.confidence < confidence::CI_MIN_CONFIDENCE {
                return Ok((
                    State::Failed,
                    Some(format!(
                        "ci mode: scraping ambiguous or confidence {:.2} below threshold",
                        understanding.confidence
                    )),
                ));
            }
            return Ok((State::UserConfig, None));
        }

        if infeasible && !self.operator.confirm_low_confidence_override(&understanding).await {
            return Ok((State::Failed, Some("operator declined to override a low-confidence understanding".to_string())));
        }

        Ok((State::UserConfig, None))
    }

    // -- USER_CONFIG ---------------------------------------------------------
    async fn handle_user_config(&self, session: &mut Session) -> HandlerResult {
        let understanding: Understanding = self.store.read_json(store::UNDERSTANDING_FILE)?;
        let mut run_config = self.operator.choose_run_config(&understanding).await?;

        if understanding.pagination.strategy == PaginationStrategy::UrlParam {
            warn!("url_param pagination strategy is not driven by the generated runtime; downgrading to first-page-only");
            run_config.pagination_config.mode = PaginationMode::FirstPage;
        }
        run_config.pagination_config.validate()?;
        run_config.coerce_headed_if_logged_in(session.flags.login_performed);

        self.store.write_json(store::RUN_CONFIG_FILE, &run_config)?;
        Ok((State::Codegen, None))
    }

    // -- CODEGEN --------------------------------------------------------------
    async fn handle_codegen(&self, session: &mut Session) -> HandlerResult {
        let understanding: Understanding = self.store.read_json(store::UNDERSTANDING_FILE)?;
        let run_config: RunConfig = self.store.read_json(store::RUN_CONFIG_FILE)?;
        let agent = CodeGenAgent::new(AgentRunner::new(self.provider.clone(), self.store.clone()));
        let url = session.url.clone();

        let code = retry::with_retry("codegen llm call", || async { agent.run(&url, &understanding, &run_config).await }).await;
        let code = match code {
            Ok(c) => c,
            Err(e) => return Ok((State::Failed, Some(format!("codegen failed after retries: {e}")))),
        };

        self.store.write_text(store::GENERATED_SCRAPER_FILE, &code)?;
        self.store.write_text("scraper_runtime.py", runtime_contract::RUNTIME_TEMPLATE)?;
        Ok((State::Test, None))
    }

    // -- TEST -----------------------------------------------------------------
    async fn handle_test(&self, session: &mut Session) -> HandlerResult {
        let script_path = self.store.path(store::GENERATED_SCRAPER_FILE);
        let outcome = SubprocessExecutor::new()
            .run(&script_path, self.store.root(), Duration::from_secs(execution::TEST_RUN_TIMEOUT_SECS))
            .await;
        let succeeded = matches!(&outcome, Ok(o) if o.success);

        if !succeeded {
            if session.flags.ci_mode {
                return Ok((State::Failed, Some("ci mode: initial test run produced no data".to_string())));
            }
            return Ok((State::Repair, Some("initial test run failed".to_string())));
        }

        if session.flags.ci_mode {
            return Ok((State::Approved, None));
        }

        let preview = self.read_output_preview();
        let outcome = self.operator.choose_test_outcome(&preview, true).await;
        Ok(self.map_test_outcome(session, outcome))
    }

    // -- REPAIR -----------------------------------------------------------------
    async fn handle_repair(&self, session: &mut Session) -> HandlerResult {
        let script_path = self.store.path(store::GENERATED_SCRAPER_FILE);
        let agent = RepairAgent::new(AgentRunner::new(self.provider.clone(), self.store.clone()));
        let repair_loop = RepairLoop::new(SubprocessExecutor::new(), agent);

        let column_hints = session.flags.fix_columns.clone();
        let succeeded = repair_loop
            .run(&script_path, self.store.root(), Duration::from_secs(execution::TEST_RUN_TIMEOUT_SECS), column_hints.as_deref())
            .await?;

        if !succeeded {
            return Ok((State::Failed, Some("repair loop exhausted its attempt budget".to_string())));
        }
        if session.flags.ci_mode {
            return Ok((State::Approved, None));
        }

        let preview = self.read_output_preview();
        match self.operator.choose_test_outcome(&preview, true).await {
            TestOutcome::Approve => Ok((State::Approved, None)),
            // REPAIR is not a legal REPAIR transition: flagging columns again
            // after a repair cycle ends the project rather than looping.
            TestOutcome::FlagColumns(_) => {
                Ok((State::Failed, Some("columns flagged again after repair; not re-entering repair".to_string())))
            }
            TestOutcome::Regenerate => Ok((State::Codegen, Some("operator requested regeneration after repair".to_string()))),
            TestOutcome::Reconfigure => Ok((State::UserConfig, Some("operator requested reconfiguration after repair".to_string()))),
            // GUIDED_ACCESS is not a legal REPAIR transition either; both
            // remaining operator exits land on DONE.
            TestOutcome::Manual => Ok((State::Done, Some("operator chose to finish manually after repair".to_string()))),
            TestOutcome::Abort => Ok((State::Done, Some("operator aborted after repair".to_string()))),
        }
    }

    // -- APPROVED -------------------------------------------------------------
    async fn handle_approved(&self, session: &mut Session) -> HandlerResult {
        let _ = session;
        let script_path = self.store.path(store::GENERATED_SCRAPER_FILE);
        let root = self.store.root().to_path_buf();
        let executor = SubprocessExecutor::new();

        let outcome = retry::with_retry("final run execution", || async {
            executor.run(&script_path, &root, Duration::from_secs(execution::FINAL_RUN_TIMEOUT_SECS)).await
        })
        .await;

        match outcome {
            Ok(o) if o.success => Ok((State::Done, None)),
            Ok(o) => Ok((State::Failed, Some(format!("final run produced no output (exit_code={:?})", o.exit_code)))),
            Err(e) => Ok((State::Failed, Some(e.to_string()))),
        }
    }

    fn read_output_preview(&self) -> Vec<Value> {
        let relative = format!("{}/{}", store::OUTPUT_DIR, store::OUTPUT_DATA_FILE);
        self.store
            .try_read_json::<Value>(&relative)
            .ok()
            .flatten()
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default()
    }

    fn map_test_outcome(&self, session: &mut Session, outcome: TestOutcome) -> (State, Option<String>) {
        match outcome {
            TestOutcome::Approve => (State::Approved, None),
            TestOutcome::FlagColumns(cols) => {
                if session.flags.fix_columns.is_some() {
                    (State::Failed, Some("columns flagged again after a prior repair cycle".to_string()))
                } else {
                    session.flags.fix_columns = Some(cols);
                    (State::Repair, Some("operator flagged columns for repair".to_string()))
                }
            }
            TestOutcome::Regenerate => (State::Codegen, Some("operator requested regeneration".to_string())),
            TestOutcome::Reconfigure => (State::UserConfig, Some("operator requested reconfiguration".to_string())),
            TestOutcome::Manual => (State::GuidedAccess, Some("operator requested another guided-access pass".to_string())),
            TestOutcome::Abort => (State::Done, Some("operator aborted after reviewing the test run".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{LlmResponse, ResponseMetadata};
    use crate::types::{AccessRecommendation as AR, AnalysisSnapshot as Snapshot, BrowserMode, FieldSuggestion, PaginationGuess, PaginationStrategy as PS};
    use crate::workflow::CiOperator;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoProvider {
        reply: Value,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn generate(&self, _prompt: &str, _schema: &Value) -> Result<LlmResponse> {
            let mut response = LlmResponse::content_only(self.reply.clone());
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

    fn engine_with_reply(store: ArtifactStore, reply: Value) -> Engine<CiOperator> {
        Engine::new(store, Arc::new(EchoProvider { reply }), CiOperator)
    }

    #[tokio::test]
    async fn ci_mode_fails_on_low_confidence_understanding() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("p")).unwrap();
        store.write_json(store::ANALYSIS_SNAPSHOT_FILE, &Snapshot::default()).unwrap();

        let understanding_reply = json!({
            "scraping_possible": true,
            "confidence": 0.3,
            "recommended_browser_mode": "headless",
            "reason": "ambiguous layout",
            "available_fields": [],
            "pagination": {"strategy": "none", "next_button_selector": null}
        });
        let engine = engine_with_reply(store.clone(), understanding_reply);

        let mut session = Session::new("p", "https://example.com", store.root().to_path_buf());
        session.flags.ci_mode = true;

        let (next, note) = engine.handle_llm_analysis(&mut session).await.unwrap();
        assert_eq!(next, State::Failed);
        assert!(note.unwrap().contains("confidence"));
    }

    #[tokio::test]
    async fn user_config_downgrades_url_param_pagination() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("p")).unwrap();

        let understanding = Understanding {
            scraping_possible: true,
            confidence: 0.9,
            recommended_browser_mode: BrowserMode::Headless,
            reason: "clean listing page".to_string(),
            available_fields: vec![FieldSuggestion {
                name: "title".to_string(),
                description: "item title".to_string(),
                selector_guess: ".item h2".to_string(),
                suggested: true,
            }],
            pagination: PaginationGuess { strategy: PS::UrlParam, next_button_selector: None },
        };
        store.write_json(store::UNDERSTANDING_FILE, &understanding).unwrap();

        let engine = engine_with_reply(store.clone(), json!({}));
        let mut session = Session::new("p", "https://example.com", store.root().to_path_buf());

        let (next, _) = engine.handle_user_config(&mut session).await.unwrap();
        assert_eq!(next, State::Codegen);

        let run_config: RunConfig = store.read_json(store::RUN_CONFIG_FILE).unwrap();
        assert_eq!(run_config.pagination_config.mode, PaginationMode::FirstPage);
    }

    #[tokio::test]
    async fn already_terminal_session_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("p")).unwrap();
        let engine = engine_with_reply(store.clone(), json!({}));

        let mut session = Session::new("p", "https://example.com", store.root().to_path_buf());
        session.transition(State::Failed, Some("already done".to_string()));

        engine.run(&mut session).await.unwrap();
        assert!(!store.exists(store::WIDE_EVENT_FILE));
    }

    #[test]
    fn access_recommendation_variant_used_for_comparison() {
        assert_eq!(AR::Automatic, AR::Automatic);
    }
}
