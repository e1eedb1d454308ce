//! `custodian`: command-line entry point for the Custodian knowledge store.
//!
//! Reads `custodian.toml` (or the path given with `--config`) and
//! `CUSTODIAN_*` environment variables, opens the SQLite store, and runs one
//! subcommand.
//!
//! # Usage
//!
//! ```
//! custodian register billing ~/src/billing --stack python
//! custodian ingest billing fossil.json
//! custodian serve
//! ```

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use custodian_core::project::ProjectStatus;
use custodian_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::CustodianConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "custodian", version, about = "Versioned project knowledge store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "custodian.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON query API over HTTP.
  Serve,

  /// Register a project, or update the path and stack of an existing one.
  Register {
    name:  String,
    path:  PathBuf,
    #[arg(long, default_value = "")]
    stack: String,
  },

  /// Mark a project active or inactive.
  Status {
    name:   String,
    #[arg(value_parser = parse_status)]
    status: ProjectStatus,
  },

  /// Store synthesis output as the next fossil of a project.
  Ingest {
    project:     String,
    /// File holding the raw output, or `-` for stdin.
    input:       PathBuf,
    /// Instruction text that produced the output.
    #[arg(long)]
    prompt_used: Option<String>,
  },

  /// Extract symbols from a directory and print them as JSON.
  Scan {
    root:       PathBuf,
    /// Only scan files with these extensions (e.g. `.py`).
    #[arg(long = "ext")]
    extensions: Vec<String>,
  },

  /// Find symbols in a project's current source.
  Lookup {
    project: String,
    symbol:  String,
    #[arg(long)]
    exact:   bool,
  },

  /// Print the analysis corpus for one project or all active projects.
  Analysis {
    #[arg(long)]
    project: Option<String>,
  },

  /// Print the prompt-refinement corpus.
  RefineContext,

  /// Store analysis output as insights.
  Insights {
    /// File holding the raw output, or `-` for stdin.
    input:   PathBuf,
    #[arg(long)]
    project: Option<String>,
    #[arg(long)]
    model:   Option<String>,
  },

  /// Record a new custodian prompt.
  Prompt {
    /// File holding the prompt text, or `-` for stdin.
    input:      PathBuf,
    /// Scope the prompt to one project; global otherwise.
    #[arg(long)]
    project:    Option<String>,
    #[arg(long, default_value = "cli")]
    created_by: String,
    #[arg(long)]
    notes:      Option<String>,
  },
}

fn parse_status(s: &str) -> Result<ProjectStatus, String> {
  s.parse().map_err(|e: custodian_core::Error| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = CustodianConfig::load(&cli.config)?;

  // Scanning never touches the store.
  if let Command::Scan { root, extensions } = &cli.command {
    return commands::scan(root, extensions);
  }

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command {
    Command::Serve => commands::serve(store, &cfg).await,
    Command::Register { name, path, stack } => {
      commands::register(&store, name, path, stack).await
    }
    Command::Status { name, status } => commands::status(&store, &name, status).await,
    Command::Ingest { project, input, prompt_used } => {
      commands::ingest(&store, &project, &input, prompt_used).await
    }
    Command::Scan { .. } => Ok(()),
    Command::Lookup { project, symbol, exact } => {
      commands::lookup(&store, &project, &symbol, exact).await
    }
    Command::Analysis { project } => commands::analysis(&store, project.as_deref()).await,
    Command::RefineContext => commands::refine_context(&store).await,
    Command::Insights { input, project, model } => {
      commands::insights(&store, &input, project.as_deref(), model.as_deref()).await
    }
    Command::Prompt { input, project, created_by, notes } => {
      commands::prompt(&store, &input, project.as_deref(), created_by, notes).await
    }
  }
}
