//! `scrape` — create a new project and drive it to a terminal state.

use chrono::Utc;
use tokio::runtime::Runtime;

use crate::ai::provider::create_provider;
use crate::cli::operator::InteractiveOperator;
use crate::cli::ui::output::Output;
use crate::config::ConfigLoader;
use crate::store::{self, ArtifactStore};
use crate::types::{Result, ScrapeError, Session, State};
use crate::workflow::{CiOperator, Engine};

/// Builds `project_<domain>_<YYYY_MM_DD_HHMM>` per the project directory
/// naming convention, deduplicating with a numeric suffix on collision.
fn new_project_dir(projects_root: &std::path::Path, url: &str) -> std::path::PathBuf {
    let domain = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.replace('.', "_")))
        .unwrap_or_else(|| "site".to_string());
    let stamp = Utc::now().format("%Y_%m_%d_%H%M");
    let base = format!("project_{}_{}", domain, stamp);

    let mut candidate = projects_root.join(&base);
    let mut suffix = 1;
    while candidate.exists() {
        candidate = projects_root.join(format!("{}_{}", base, suffix));
        suffix += 1;
    }
    candidate
}

pub fn run(url: String, ci: bool, expert: bool) -> Result<()> {
    let output = Output::new();
    let config = ConfigLoader::load(None)?;

    let project_dir = new_project_dir(&config.projects.root, &url);
    let project_id = project_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("project")
        .to_string();

    let store = ArtifactStore::open(&project_dir)?;
    let mut session = Session::new(&project_id, &url, project_dir.clone());
    session.flags.ci_mode = ci;
    session.flags.expert_mode = expert;
    store.write_json(store::SESSION_FILE, &session)?;

    output.header(&format!("Scraping {}", url));
    output.info(&format!("Project: {}", project_dir.display()));

    let provider = create_provider(&config.llm.to_provider_config())?;

    let rt = Runtime::new()?;
    let final_state = if ci {
        let engine = Engine::new(store, provider, CiOperator);
        rt.block_on(engine.run(&mut session))?;
        session.state
    } else {
        let engine = Engine::new(store, provider, InteractiveOperator::new(expert));
        rt.block_on(engine.run(&mut session))?;
        session.state
    };

    match final_state {
        State::Done => {
            output.success(&format!("Done. Output written under {}/output/", project_dir.display()));
            Ok(())
        }
        _ => {
            output.error(&format!("Run ended in state {}", final_state));
            Err(ScrapeError::workflow(final_state.name(), "scrape did not reach DONE"))
        }
    }
}
