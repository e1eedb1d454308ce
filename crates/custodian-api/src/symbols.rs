//! Handlers for symbol endpoints.
//!
//! `lookup` reads current source through the live extractor; `context` and
//! `related` read the fossil store.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use custodian_core::{
  query_log::{NewQueryLogEntry, log_quietly},
  resolver::{RelatedFiles, resolve_related},
  store::FossilStore,
  symbol::Symbol,
};
use custodian_extract::{LiveSymbol, find_symbol};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
  error::{ApiError, found},
  resolve_project,
};

/// Live lookups return at most this many matches.
pub const LOOKUP_LIMIT: usize = 50;
/// Fossil context returns at most this many symbols.
pub const CONTEXT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct SymbolParams {
  pub symbol: String,
  #[serde(default)]
  pub exact:  bool,
}

// ─── Live lookup ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LookupResult {
  pub matches: Vec<LiveSymbol>,
  pub count:   usize,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub note:    Option<String>,
}

/// `GET /projects/{name}/symbols/lookup?symbol=..[&exact=true]`
pub async fn lookup<S: FossilStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
  Query(params): Query<SymbolParams>,
) -> Result<Json<LookupResult>, ApiError> {
  log_quietly(
    &*store,
    NewQueryLogEntry::new("lookup_symbol")
      .project(&name)
      .params(json!({ "symbol": params.symbol, "exact": params.exact })),
  )
  .await;

  if params.symbol.trim().is_empty() {
    return Err(ApiError::BadRequest("symbol must not be empty".into()));
  }

  let project = resolve_project(&*store, &name).await?;
  let root = project.path.clone();
  if !root.is_dir() {
    return Err(ApiError::NotFound(format!(
      "project path not found: {}",
      root.display()
    )));
  }

  let SymbolParams { symbol, exact } = params;
  let mut matches = tokio::task::spawn_blocking(move || find_symbol(&root, &symbol, exact))
    .await
    .map_err(ApiError::store)?
    .map_err(|e| ApiError::NotFound(e.to_string()))?;

  let note = (matches.len() > LOOKUP_LIMIT).then(|| {
    matches.truncate(LOOKUP_LIMIT);
    format!("Results truncated to {LOOKUP_LIMIT}. Use exact=true for precise matches.")
  });

  Ok(Json(LookupResult { count: matches.len(), matches, note }))
}

// ─── Fossil context ───────────────────────────────────────────────────────────

/// `GET /projects/{name}/symbols/context?symbol=..`
///
/// Case-insensitive substring match over the latest fossil only.
pub async fn context<S: FossilStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
  Query(params): Query<SymbolParams>,
) -> Result<Json<Vec<Symbol>>, ApiError> {
  log_quietly(
    &*store,
    NewQueryLogEntry::new("get_symbol_context")
      .project(&name)
      .params(json!({ "symbol": params.symbol })),
  )
  .await;

  let project = resolve_project(&*store, &name).await?;
  let mut symbols = found(
    store
      .search_symbols(&project.name, &params.symbol)
      .await
      .map_err(ApiError::store)?,
  )?;
  symbols.truncate(CONTEXT_LIMIT);
  Ok(Json(symbols))
}

// ─── Related files ────────────────────────────────────────────────────────────

/// `GET /projects/{name}/related?symbol=..`
pub async fn related<S: FossilStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
  Query(params): Query<SymbolParams>,
) -> Result<Json<RelatedFiles>, ApiError> {
  log_quietly(
    &*store,
    NewQueryLogEntry::new("find_related_files")
      .project(&name)
      .params(json!({ "symbol": params.symbol })),
  )
  .await;

  let project = resolve_project(&*store, &name).await?;
  let files = found(
    resolve_related(&*store, &project.name, &params.symbol)
      .await
      .map_err(ApiError::store)?,
  )?;
  Ok(Json(files))
}
