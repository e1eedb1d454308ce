//! Project: a tracked source tree.
//!
//! Projects are owned by the registration subsystem. The knowledge store only
//! needs to resolve a name to a record and stamp `last_indexed` on ingest.

use std::{fmt, path::PathBuf, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Whether a project takes part in default listings and analysis.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
  #[default]
  Active,
  Inactive,
}

impl ProjectStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Inactive => "inactive",
    }
  }
}

impl fmt::Display for ProjectStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ProjectStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "active" => Ok(Self::Active),
      "inactive" => Ok(Self::Inactive),
      other => Err(Error::UnknownStatus(other.to_owned())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
  pub project_id:   Uuid,
  /// Unique; looked up case-insensitively.
  pub name:         String,
  /// Filesystem root of the source tree.
  pub path:         PathBuf,
  /// Free-text stack descriptor, e.g. "Rust + axum + SQLite".
  pub stack:        String,
  pub status:       ProjectStatus,
  pub last_indexed: Option<DateTime<Utc>>,
}

/// Input to [`crate::store::FossilStore::register_project`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
  pub name:  String,
  pub path:  PathBuf,
  #[serde(default)]
  pub stack: String,
}

/// A project row plus the counts shown by the `list_projects` tool.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
  #[serde(flatten)]
  pub project:      Project,
  pub fossil_count: u64,
  /// Number of symbols in the latest fossil.
  pub symbol_count: u64,
}

/// How forgiving a name lookup is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectLookup {
  /// Exact name, then case-insensitive name. Any status.
  Strict,
  /// Exact, case-insensitive, then case-insensitive substring. Active
  /// projects only.
  Fuzzy,
}
