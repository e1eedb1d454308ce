//! Insights: stored output of the external pattern-analysis step.
//!
//! Insights are append-only. They also serve as the degraded record for
//! synthesis output that could not be parsed as a fossil.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  payload::strip_fences,
  project::ProjectLookup,
  store::FossilStore,
};

/// Insight type used when the raw analysis output is not structured.
pub const RAW_PATTERN: &str = "pattern";
/// Insight type used for unparsable synthesis output kept by the caller.
pub const RAW_FOSSIL: &str = "raw_fossil";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
  pub insight_id:        Uuid,
  /// `None` for cross-project insights.
  pub project_id:        Option<Uuid>,
  pub fossil_id:         Option<Uuid>,
  /// e.g. `coupling`, `growth`, `pattern`, `regression`, `prompt_refinement`.
  pub insight_type:      String,
  pub content:           String,
  pub model_used:        Option<String>,
  pub projects_involved: Vec<String>,
  pub created_at:        DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInsight {
  pub project_id:        Option<Uuid>,
  pub fossil_id:         Option<Uuid>,
  pub insight_type:      String,
  pub content:           String,
  pub model_used:        Option<String>,
  pub projects_involved: Vec<String>,
}

impl NewInsight {
  pub fn new(insight_type: impl Into<String>, content: impl Into<String>) -> Self {
    Self {
      project_id:        None,
      fossil_id:         None,
      insight_type:      insight_type.into(),
      content:           content.into(),
      model_used:        None,
      projects_involved: Vec::new(),
    }
  }
}

/// Parameters for [`crate::store::FossilStore::list_insights`].
#[derive(Debug, Clone, Default)]
pub struct InsightQuery {
  /// With a project: its insights plus global ones. Without: global only.
  pub project_id:   Option<Uuid>,
  pub insight_type: Option<String>,
  pub limit:        Option<usize>,
}

/// Turn raw analysis output into insights.
///
/// Expects an (optionally fenced) JSON array of `{type, content, projects}`.
/// Non-object entries are skipped. Anything unparsable becomes one `pattern`
/// insight holding the raw text.
pub fn parse_insights(
  raw: &str,
  project_id: Option<Uuid>,
  project_name: Option<&str>,
  model_used: Option<&str>,
) -> Vec<NewInsight> {
  let text = strip_fences(raw);
  let default_projects: Vec<String> = project_name.map(str::to_owned).into_iter().collect();

  let base = |insight_type: String, content: String, projects: Vec<String>| NewInsight {
    project_id,
    fossil_id: None,
    insight_type,
    content,
    model_used: model_used.map(str::to_owned),
    projects_involved: projects,
  };

  let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) else {
    return vec![base(RAW_PATTERN.into(), text.to_owned(), default_projects)];
  };

  items
    .iter()
    .filter_map(|item| {
      let obj = item.as_object()?;
      let insight_type = obj
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or(RAW_PATTERN)
        .to_owned();
      let content = match obj.get("content") {
        Some(Value::String(s)) => s.clone(),
        _ => item.to_string(),
      };
      let projects = obj
        .get("projects")
        .and_then(Value::as_array)
        .map(|ps| ps.iter().filter_map(Value::as_str).map(str::to_owned).collect())
        .unwrap_or_default();
      Some(base(insight_type, content, projects))
    })
    .collect()
}

/// Keep unparsable synthesis output as a [`RAW_FOSSIL`] insight scoped to
/// `project_name`.
///
/// The project is resolved strictly. When it does not exist nothing is
/// written and `None` is returned.
pub async fn keep_raw_fossil<S: FossilStore>(
  store: &S,
  project_name: &str,
  raw: String,
) -> Result<Option<Insight>, S::Error> {
  let Some(project) = store.find_project(project_name, ProjectLookup::Strict).await? else {
    return Ok(None);
  };
  let insight = store
    .record_insight(NewInsight {
      project_id: Some(project.project_id),
      projects_involved: vec![project.name],
      ..NewInsight::new(RAW_FOSSIL, raw)
    })
    .await?;
  tracing::info!(project = %project_name, "kept malformed fossil output as an insight");
  Ok(Some(insight))
}
