use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scrapecraft")]
#[command(version, about = "Agentic scraper builder: point it at a URL, get a runnable scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Enable debug-level logging")]
    verbose: bool,

    #[arg(long, short, global = true, help = "Only log errors")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a scraper for a URL
    Scrape {
        #[arg(long, help = "Page to scrape")]
        url: String,
        #[arg(long, help = "Run non-interactively, collapsing every decision to its default")]
        ci: bool,
        #[arg(long, help = "Offer expert-level choices (pagination depth, manual field entry, output format)")]
        expert: bool,
    },

    /// List known projects
    List,

    /// Resume a non-terminal project
    Resume {
        #[arg(help = "Project directory name, e.g. project_example_com_2026_07_26_1400")]
        project_id: String,
    },

    /// Remove completed or failed project directories
    Clean {
        #[arg(long, help = "Actually delete; without this flag, only lists what would be removed")]
        force: bool,
    },

    /// Check configuration, provider connectivity, and the projects directory
    Doctor,

    /// Create the global config file and projects root directory
    Setup {
        #[arg(long, help = "Overwrite an existing global config")]
        force: bool,
    },
}

fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mscrapecraft encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!("\x1b[90mLocation: {}:{}:{}\x1b[0m", location.file(), location.line(), location.column());
        }

        eprintln!("\n\x1b[33mRun with RUST_BACKTRACE=1 for a full backtrace.\x1b[0m");
        eprintln!();

        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Scrape { url, ci, expert } => {
            scrapecraft::cli::commands::scrape::run(url, ci, expert)?;
        }
        Commands::List => {
            scrapecraft::cli::commands::list::run()?;
        }
        Commands::Resume { project_id } => {
            scrapecraft::cli::commands::resume::run(project_id)?;
        }
        Commands::Clean { force } => {
            scrapecraft::cli::commands::clean::run(force)?;
        }
        Commands::Doctor => {
            scrapecraft::cli::commands::doctor::run()?;
        }
        Commands::Setup { force } => {
            scrapecraft::cli::commands::setup::run(force)?;
        }
    }

    Ok(())
}
