//! Handlers for detective insights and the analysis corpus.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use custodian_core::{
  analysis::build_analysis_context,
  insight::{Insight, InsightQuery},
  query_log::{NewQueryLogEntry, log_quietly},
  store::FossilStore,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
  error::{ApiError, found},
  resolve_project,
};

/// Insight listings return at most this many rows.
pub const INSIGHT_LIMIT: usize = 20;

#[derive(Debug, Default, Deserialize)]
pub struct InsightParams {
  pub project:      Option<String>,
  pub insight_type: Option<String>,
}

/// `GET /insights[?project=..][&insight_type=..]`
///
/// With a project, its own insights and global ones; without, global only.
pub async fn insights<S: FossilStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<InsightParams>,
) -> Result<Json<Vec<Insight>>, ApiError> {
  let mut entry = NewQueryLogEntry::new("get_detective_insights")
    .params(json!({ "insight_type": params.insight_type }));
  if let Some(project) = &params.project {
    entry = entry.project(project);
  }
  log_quietly(&*store, entry).await;

  let project_id = match &params.project {
    Some(name) => Some(resolve_project(&*store, name).await?.project_id),
    None => None,
  };

  let query = InsightQuery {
    project_id,
    insight_type: params.insight_type,
    limit: Some(INSIGHT_LIMIT),
  };
  let insights = store.list_insights(&query).await.map_err(ApiError::store)?;
  Ok(Json(insights))
}

#[derive(Debug, Default, Deserialize)]
pub struct CorpusParams {
  pub project: Option<String>,
}

/// `GET /analysis[?project=..]`: the plain-text analysis corpus.
///
/// The project is resolved strictly and may be inactive.
pub async fn corpus<S: FossilStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<CorpusParams>,
) -> Result<String, ApiError> {
  let context = found(
    build_analysis_context(&*store, params.project.as_deref())
      .await
      .map_err(ApiError::store)?,
  )?;

  let mut entry = NewQueryLogEntry::new("get_analysis_context");
  if let Some(project) = params.project {
    entry = entry.project(project);
  }
  log_quietly(&*store, entry).await;

  Ok(context.corpus)
}
