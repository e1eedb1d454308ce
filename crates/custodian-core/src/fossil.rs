//! Fossils: immutable, versioned knowledge snapshots of a project.
//!
//! A fossil is produced by an external synthesis step and ingested once. It is
//! never updated or deleted; a knowledge refresh appends a new version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Sub-types ───────────────────────────────────────────────────────────────

/// A key dependency of the project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
  pub name:    String,
  pub version: Option<String>,
  /// Why the project depends on it.
  pub purpose: Option<String>,
}

/// One significant file in the project tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTreeEntry {
  pub path:        String,
  pub description: Option<String>,
  pub line_count:  Option<u64>,
}

// ─── Fossil ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fossil {
  pub fossil_id:      Uuid,
  pub project_id:     Uuid,
  /// Starts at 1 and increases by one per ingest for the project.
  pub version:        i64,
  /// Server-assigned; never changes after creation.
  pub created_at:     DateTime<Utc>,
  pub summary:        String,
  pub architecture:   String,
  pub recent_changes: String,
  pub known_issues:   String,
  pub dependencies:   Vec<Dependency>,
  pub file_tree:      Vec<FileTreeEntry>,
  /// The instruction text that produced this revision.
  pub prompt_used:    String,
}

impl Fossil {
  pub fn total_lines(&self) -> u64 {
    self.file_tree.iter().filter_map(|e| e.line_count).sum()
  }
}

// ─── Ingest results ──────────────────────────────────────────────────────────

/// What a successful ingest committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FossilReceipt {
  pub fossil_id:    Uuid,
  pub project_id:   Uuid,
  pub project_name: String,
  pub version:      i64,
  pub symbol_count: usize,
}

/// The discriminated result of [`crate::store::FossilStore::ingest`].
///
/// Only `Stored` persists anything; the other variants leave the store
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
  Stored(FossilReceipt),
  ProjectNotFound { name: String },
  Malformed { reason: String },
}
