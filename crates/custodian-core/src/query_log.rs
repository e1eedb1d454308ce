//! Query Log: an append-only record of knowledge-base accesses.
//!
//! Entries are advisory. A failed append must never fail the read it
//! describes, so callers go through [`log_quietly`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::FossilStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogEntry {
  pub entry_id:     Uuid,
  pub tool_name:    String,
  pub project_name: Option<String>,
  pub query_params: Option<serde_json::Value>,
  pub timestamp:    DateTime<Utc>,
}

/// Input to [`FossilStore::log_query`]; the timestamp is set by the store.
#[derive(Debug, Clone)]
pub struct NewQueryLogEntry {
  pub tool_name:    String,
  pub project_name: Option<String>,
  pub query_params: Option<serde_json::Value>,
}

impl NewQueryLogEntry {
  pub fn new(tool_name: impl Into<String>) -> Self {
    Self { tool_name: tool_name.into(), project_name: None, query_params: None }
  }

  pub fn project(mut self, name: impl Into<String>) -> Self {
    self.project_name = Some(name.into());
    self
  }

  pub fn params(mut self, params: serde_json::Value) -> Self {
    self.query_params = Some(params);
    self
  }
}

/// Aggregated usage of one tool on one project (`None` = no project).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryUsage {
  pub tool_name:    String,
  pub project_name: Option<String>,
  pub count:        u64,
}

/// Aggregated usage of one tool with one exact parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamUsage {
  pub tool_name:    String,
  /// Serialised parameters, as stored.
  pub query_params: Option<String>,
  pub count:        u64,
}

/// Append a Query Log entry, swallowing any failure.
pub async fn log_quietly<S: FossilStore>(store: &S, entry: NewQueryLogEntry) {
  let tool = entry.tool_name.clone();
  if let Err(e) = store.log_query(entry).await {
    tracing::warn!(tool = %tool, error = %e, "failed to append query log entry");
  }
}
