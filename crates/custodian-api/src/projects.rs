//! Handlers for `/projects` endpoints.
//!
//! | Method | Path | Tool |
//! |--------|------|------|
//! | `GET`  | `/projects` | `list_projects` |
//! | `GET`  | `/projects/{name}/fossil` | `get_project_fossil`; optional `?include_file_tree&include_symbols` |
//! | `GET`  | `/projects/{name}/history` | `get_fossil_history` |
//! | `GET`  | `/projects/{name}/changes` | `get_recent_changes` |
//! | `POST` | `/projects/{name}/fossils` | `store_fossil`; raw synthesis output as the body |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use custodian_core::{
  fossil::{Dependency, FileTreeEntry, Fossil, IngestOutcome},
  insight::keep_raw_fossil,
  project::ProjectSummary,
  query_log::{NewQueryLogEntry, log_quietly},
  store::FossilStore,
  symbol::Symbol,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
  error::{ApiError, found},
  resolve_project,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /projects`
pub async fn list<S: FossilStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
  log_quietly(&*store, NewQueryLogEntry::new("list_projects")).await;
  let projects = store.list_projects().await.map_err(ApiError::store)?;
  Ok(Json(projects))
}

// ─── Latest fossil ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct FossilParams {
  #[serde(default)]
  pub include_file_tree: bool,
  #[serde(default)]
  pub include_symbols:   bool,
}

#[derive(Debug, Serialize)]
pub struct FossilView {
  pub project:        String,
  pub path:           String,
  pub stack:          String,
  pub fossil_version: i64,
  pub fossil_date:    DateTime<Utc>,
  pub summary:        String,
  pub architecture:   String,
  pub known_issues:   String,
  pub dependencies:   Vec<Dependency>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub file_tree:      Option<Vec<FileTreeEntry>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub symbols:        Option<Vec<Symbol>>,
}

/// `GET /projects/{name}/fossil[?include_file_tree=true][&include_symbols=true]`
pub async fn fossil<S: FossilStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
  Query(params): Query<FossilParams>,
) -> Result<Json<FossilView>, ApiError> {
  log_quietly(
    &*store,
    NewQueryLogEntry::new("get_project_fossil").project(&name).params(json!({
      "include_file_tree": params.include_file_tree,
      "include_symbols": params.include_symbols,
    })),
  )
  .await;

  let project = resolve_project(&*store, &name).await?;
  let fossil = found(store.latest_fossil(&project.name).await.map_err(ApiError::store)?)?;

  let symbols = if params.include_symbols {
    store
      .symbols_for_fossil(fossil.fossil_id)
      .await
      .map_err(ApiError::store)?
  } else {
    None
  };

  Ok(Json(FossilView {
    project: project.name,
    path: project.path.display().to_string(),
    stack: project.stack,
    fossil_version: fossil.version,
    fossil_date: fossil.created_at,
    summary: fossil.summary,
    architecture: fossil.architecture,
    known_issues: fossil.known_issues,
    dependencies: fossil.dependencies,
    file_tree: params.include_file_tree.then_some(fossil.file_tree),
    symbols,
  }))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /projects/{name}/history`: every fossil, oldest first.
pub async fn history<S: FossilStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
) -> Result<Json<Vec<Fossil>>, ApiError> {
  log_quietly(&*store, NewQueryLogEntry::new("get_fossil_history").project(&name)).await;

  let project = resolve_project(&*store, &name).await?;
  let fossils = found(store.fossil_history(&project.name).await.map_err(ApiError::store)?)?;
  Ok(Json(fossils))
}

// ─── Recent changes ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RecentChanges {
  pub project:        String,
  pub fossil_version: i64,
  pub fossil_date:    DateTime<Utc>,
  pub recent_changes: String,
}

/// `GET /projects/{name}/changes`
pub async fn recent_changes<S: FossilStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
) -> Result<Json<RecentChanges>, ApiError> {
  log_quietly(&*store, NewQueryLogEntry::new("get_recent_changes").project(&name)).await;

  let project = resolve_project(&*store, &name).await?;
  let fossil = found(store.latest_fossil(&project.name).await.map_err(ApiError::store)?)?;
  Ok(Json(RecentChanges {
    project:        project.name,
    fossil_version: fossil.version,
    fossil_date:    fossil.created_at,
    recent_changes: fossil.recent_changes,
  }))
}

// ─── Store ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct StoreParams {
  /// Overrides the stored custodian prompt as the fossil's `prompt_used`.
  pub prompt_used: Option<String>,
}

/// `POST /projects/{name}/fossils`
///
/// The project is resolved strictly. A payload that cannot be parsed is kept
/// as a `raw_fossil` insight of that project and answered with 422. An
/// unknown project is answered with 404 and nothing is written.
pub async fn store_fossil<S: FossilStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
  Query(params): Query<StoreParams>,
  body: String,
) -> Result<impl IntoResponse, ApiError> {
  log_quietly(
    &*store,
    NewQueryLogEntry::new("store_fossil")
      .project(&name)
      .params(json!({ "bytes": body.len() })),
  )
  .await;

  let outcome = store
    .ingest(&name, &body, params.prompt_used)
    .await
    .map_err(ApiError::store)?;

  match outcome {
    IngestOutcome::Stored(receipt) => Ok((StatusCode::CREATED, Json(receipt))),
    IngestOutcome::ProjectNotFound { name } => {
      Err(ApiError::NotFound(format!("project '{name}' not found")))
    }
    IngestOutcome::Malformed { reason } => {
      keep_raw_fossil(&*store, &name, body)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| ApiError::NotFound(format!("project '{name}' not found")))?;
      Err(ApiError::Unprocessable(reason))
    }
  }
}
