//! One function per subcommand.

use std::{
  io::Read as _,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context as _, bail};
use custodian_core::{
  analysis::{build_analysis_context, build_refinement_context},
  fossil::IngestOutcome,
  insight::{RAW_FOSSIL, keep_raw_fossil, parse_insights},
  project::{NewProject, ProjectLookup, ProjectStatus},
  prompt::NewPrompt,
  store::FossilStore,
};
use custodian_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::settings::CustodianConfig;

/// Read a whole file, or stdin when `path` is `-`.
fn read_input(path: &Path) -> anyhow::Result<String> {
  if path == Path::new("-") {
    let mut buf = String::new();
    std::io::stdin()
      .read_to_string(&mut buf)
      .context("failed to read stdin")?;
    return Ok(buf);
  }
  std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

async fn require_project(
  store: &SqliteStore,
  name: &str,
  mode: ProjectLookup,
) -> anyhow::Result<custodian_core::project::Project> {
  match store.find_project(name, mode).await? {
    Some(p) => Ok(p),
    None => bail!("project '{name}' not found"),
  }
}

// ─── Serve ────────────────────────────────────────────────────────────────────

pub async fn serve(store: SqliteStore, cfg: &CustodianConfig) -> anyhow::Result<()> {
  let app = custodian_api::api_router(Arc::new(store)).layer(TraceLayer::new_for_http());
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

// ─── Projects ─────────────────────────────────────────────────────────────────

pub async fn register(
  store: &SqliteStore,
  name: String,
  path: PathBuf,
  stack: String,
) -> anyhow::Result<()> {
  let path = std::path::absolute(&path)
    .with_context(|| format!("failed to resolve {}", path.display()))?;
  let project = store.register_project(NewProject { name, path, stack }).await?;
  print_json(&project)
}

pub async fn status(
  store: &SqliteStore,
  name: &str,
  status: ProjectStatus,
) -> anyhow::Result<()> {
  let lookup = store.set_project_status(name, status).await?;
  if let Some(missing) = lookup.describe_missing() {
    bail!(missing);
  }
  println!("{name}: {status}");
  Ok(())
}

// ─── Ingest ───────────────────────────────────────────────────────────────────

pub async fn ingest(
  store: &SqliteStore,
  project: &str,
  input: &Path,
  prompt_used: Option<String>,
) -> anyhow::Result<()> {
  let raw = read_input(input)?;

  match store.ingest(project, &raw, prompt_used).await? {
    IngestOutcome::Stored(receipt) => print_json(&receipt),
    IngestOutcome::ProjectNotFound { name } => bail!("project '{name}' not found"),
    IngestOutcome::Malformed { reason } => {
      if keep_raw_fossil(store, project, raw).await?.is_none() {
        bail!("project '{project}' not found");
      }
      bail!("malformed fossil output ({reason}); raw text kept as a {RAW_FOSSIL} insight")
    }
  }
}

// ─── Extraction ───────────────────────────────────────────────────────────────

pub fn scan(root: &Path, extensions: &[String]) -> anyhow::Result<()> {
  let exts: Vec<&str> = extensions.iter().map(String::as_str).collect();
  let filter = (!exts.is_empty()).then_some(exts.as_slice());
  let symbols = custodian_extract::scan_directory_with(root, filter)?;
  tracing::info!(root = %root.display(), symbols = symbols.len(), "scan finished");
  print_json(&symbols)
}

pub async fn lookup(
  store: &SqliteStore,
  project: &str,
  symbol: &str,
  exact: bool,
) -> anyhow::Result<()> {
  let project = require_project(store, project, ProjectLookup::Fuzzy).await?;
  let root = project.path;
  let symbol = symbol.to_owned();
  let matches =
    tokio::task::spawn_blocking(move || custodian_extract::find_symbol(&root, &symbol, exact))
      .await
      .context("lookup task panicked")??;
  print_json(&matches)
}

// ─── Analysis ─────────────────────────────────────────────────────────────────

pub async fn analysis(store: &SqliteStore, project: Option<&str>) -> anyhow::Result<()> {
  let lookup = build_analysis_context(store, project).await?;
  if let Some(missing) = lookup.describe_missing() {
    bail!(missing);
  }
  if let Some(ctx) = lookup.found() {
    print!("{}", ctx.corpus);
  }
  Ok(())
}

pub async fn refine_context(store: &SqliteStore) -> anyhow::Result<()> {
  match build_refinement_context(store).await? {
    Some(text) => print!("{text}"),
    None => bail!("no custodian prompt recorded yet"),
  }
  Ok(())
}

pub async fn insights(
  store: &SqliteStore,
  input: &Path,
  project: Option<&str>,
  model: Option<&str>,
) -> anyhow::Result<()> {
  let raw = read_input(input)?;
  let project_id = match project {
    Some(name) => Some(require_project(store, name, ProjectLookup::Strict).await?.project_id),
    None => None,
  };

  let parsed = parse_insights(&raw, project_id, project, model);
  let count = parsed.len();
  for insight in parsed {
    store.record_insight(insight).await?;
  }
  tracing::info!(count, "stored insights");
  Ok(())
}

pub async fn prompt(
  store: &SqliteStore,
  input: &Path,
  project: Option<&str>,
  created_by: String,
  notes: Option<String>,
) -> anyhow::Result<()> {
  let text = read_input(input)?.trim().to_owned();
  if text.is_empty() {
    bail!("prompt text is empty");
  }
  let project_id = match project {
    Some(name) => Some(require_project(store, name, ProjectLookup::Strict).await?.project_id),
    None => None,
  };

  let prompt = store
    .record_prompt(NewPrompt { project_id, prompt: text, created_by, notes })
    .await?;
  print_json(&prompt)
}
