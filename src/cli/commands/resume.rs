//! `resume` — re-enter a non-terminal project and drive it to completion.

use tokio::runtime::Runtime;

use crate::ai::provider::create_provider;
use crate::cli::operator::InteractiveOperator;
use crate::cli::ui::output::Output;
use crate::config::ConfigLoader;
use crate::store::{self, ArtifactStore};
use crate::types::{Result, ScrapeError, Session, State};
use crate::workflow::{CiOperator, Engine};

pub fn run(project_id: String) -> Result<()> {
    let output = Output::new();
    let config = ConfigLoader::load(None)?;
    let project_dir = config.projects.root.join(&project_id);

    if !project_dir.exists() {
        return Err(ScrapeError::Store(format!("no project directory at {}", project_dir.display())));
    }

    let store = ArtifactStore::open(&project_dir)?;
    let mut session: Session = store
        .try_read_json(store::SESSION_FILE)?
        .ok_or_else(|| ScrapeError::Store(format!("no session.json under {}", project_dir.display())))?;

    if session.state.is_terminal() {
        output.info(&format!("Project {} is already {}", project_id, session.state));
        return Ok(());
    }

    output.header(&format!("Resuming {} from {}", project_id, session.state));

    let provider = create_provider(&config.llm.to_provider_config())?;
    let rt = Runtime::new()?;

    if session.flags.ci_mode {
        let engine = Engine::new(store, provider, CiOperator);
        rt.block_on(engine.run(&mut session))?;
    } else {
        let engine = Engine::new(store, provider, InteractiveOperator::new(session.flags.expert_mode));
        rt.block_on(engine.run(&mut session))?;
    }

    match session.state {
        State::Done => {
            output.success(&format!("Done. Output written under {}/output/", project_dir.display()));
            Ok(())
        }
        other => {
            output.error(&format!("Run ended in state {}", other));
            Err(ScrapeError::workflow(other.name(), "resume did not reach DONE"))
        }
    }
}
