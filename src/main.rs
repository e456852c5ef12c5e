//! # docdrift CLI
//!
//! ## Usage
//!
//! ```bash
//! docdrift --config ./config/docdrift.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docdrift serve` | Start the HTTP server |
//! | `docdrift scenarios` | List the scenario catalog |
//! | `docdrift load <scenario> --session <id>` | Build and persist a session index |
//! | `docdrift ask "<question>" --session <id>` | Answer from a persisted index |
//! | `docdrift audit --session <id>` | Audit old docs against the changelog |
//!
//! A missing config file is not an error; built-in defaults are used.
//! Log verbosity follows `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docdrift::config;
use docdrift::indexer::LoadOutcome;
use docdrift::scenarios::ScenarioCatalog;
use docdrift::server::{self, AppState};

#[derive(Parser)]
#[command(
    name = "docdrift",
    about = "Find drift between old documentation and a new changelog",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "./config/docdrift.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve,

    /// List built-in scenarios.
    Scenarios,

    /// Index a scenario into a session.
    Load {
        scenario: String,

        #[arg(long)]
        session: String,
    },

    /// Ask a question against a session's index.
    Ask {
        question: String,

        #[arg(long)]
        session: String,
    },

    /// Run the consistency audit for a session.
    Audit {
        #[arg(long)]
        session: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Listing needs neither config nor providers
    if let Commands::Scenarios = cli.command {
        for s in ScenarioCatalog::builtin().summaries() {
            println!("{:<16} {} -> {}", s.id, s.old_source, s.new_source);
        }
        return Ok(());
    }

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Load { scenario, session } => {
            let state = AppState::from_config(&cfg)?;
            match state.indexer().load_scenario(&session, &scenario).await? {
                LoadOutcome::Loaded { chunks } => {
                    println!("Loaded scenario: {} ({} chunks)", scenario, chunks);
                }
                LoadOutcome::NotFound => {
                    anyhow::bail!("Scenario not found: {}", scenario);
                }
            }
        }
        Commands::Ask { question, session } => {
            let state = AppState::from_config(&cfg)?;
            let reply = state.responder().answer(Some(session.as_str()), &question).await?;
            println!("{}", reply);
        }
        Commands::Audit { session } => {
            let state = AppState::from_config(&cfg)?;
            let issues = state.auditor().audit(Some(session.as_str())).await;
            if issues.is_empty() {
                println!("No issues found.");
            }
            for issue in issues {
                println!("{}", issue);
            }
        }
        Commands::Scenarios => {}
    }

    Ok(())
}
