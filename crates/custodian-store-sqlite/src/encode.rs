//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields
//! (dependencies, file tree, relationships, query parameters) are stored as
//! compact JSON. UUIDs are stored as hyphenated lowercase strings.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use custodian_core::{
  fossil::Fossil,
  insight::Insight,
  project::{Project, ProjectStatus},
  prompt::CustodianPrompt,
  query_log::QueryLogEntry,
  symbol::{Symbol, SymbolType},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON columns ─────────────────────────────────────────────────────────────

fn decode_opt_json(s: Option<String>) -> Result<Option<serde_json::Value>> {
  Ok(s.as_deref().map(serde_json::from_str).transpose()?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `projects` row.
pub struct RawProject {
  pub project_id:   String,
  pub name:         String,
  pub path:         String,
  pub stack:        String,
  pub status:       String,
  pub last_indexed: Option<String>,
}

/// Column list matching [`RawProject::from_row`].
pub const PROJECT_COLUMNS: &str =
  "project_id, name, path, stack, status, last_indexed";

impl RawProject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      project_id:   row.get(0)?,
      name:         row.get(1)?,
      path:         row.get(2)?,
      stack:        row.get(3)?,
      status:       row.get(4)?,
      last_indexed: row.get(5)?,
    })
  }

  pub fn into_project(self) -> Result<Project> {
    Ok(Project {
      project_id:   decode_uuid(&self.project_id)?,
      name:         self.name,
      path:         PathBuf::from(self.path),
      stack:        self.stack,
      status:       self.status.parse::<ProjectStatus>()?,
      last_indexed: self.last_indexed.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `fossils` row.
pub struct RawFossil {
  pub fossil_id:      String,
  pub project_id:     String,
  pub version:        i64,
  pub created_at:     String,
  pub summary:        String,
  pub architecture:   String,
  pub recent_changes: String,
  pub known_issues:   String,
  pub dependencies:   String,
  pub file_tree:      String,
  pub prompt_used:    String,
}

pub const FOSSIL_COLUMNS: &str = "fossil_id, project_id, version, created_at, \
                                  summary, architecture, recent_changes, \
                                  known_issues, dependencies, file_tree, \
                                  prompt_used";

impl RawFossil {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      fossil_id:      row.get(0)?,
      project_id:     row.get(1)?,
      version:        row.get(2)?,
      created_at:     row.get(3)?,
      summary:        row.get(4)?,
      architecture:   row.get(5)?,
      recent_changes: row.get(6)?,
      known_issues:   row.get(7)?,
      dependencies:   row.get(8)?,
      file_tree:      row.get(9)?,
      prompt_used:    row.get(10)?,
    })
  }

  pub fn into_fossil(self) -> Result<Fossil> {
    Ok(Fossil {
      fossil_id:      decode_uuid(&self.fossil_id)?,
      project_id:     decode_uuid(&self.project_id)?,
      version:        self.version,
      created_at:     decode_dt(&self.created_at)?,
      summary:        self.summary,
      architecture:   self.architecture,
      recent_changes: self.recent_changes,
      known_issues:   self.known_issues,
      dependencies:   serde_json::from_str(&self.dependencies)?,
      file_tree:      serde_json::from_str(&self.file_tree)?,
      prompt_used:    self.prompt_used,
    })
  }
}

/// Raw strings read from a `symbols` row joined with its fossil's version.
pub struct RawSymbol {
  pub symbol_id:     String,
  pub fossil_id:     String,
  pub project_id:    String,
  pub version:       i64,
  pub file_path:     String,
  pub line_number:   Option<i64>,
  pub kind:          String,
  pub name:          String,
  pub signature:     Option<String>,
  pub description:   Option<String>,
  pub relationships: Option<String>,
}

/// Column list for `symbols s JOIN fossils f`.
pub const SYMBOL_COLUMNS: &str = "s.symbol_id, s.fossil_id, s.project_id, \
                                  f.version, s.file_path, s.line_number, \
                                  s.type, s.name, s.signature, \
                                  s.description, s.relationships";

impl RawSymbol {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      symbol_id:     row.get(0)?,
      fossil_id:     row.get(1)?,
      project_id:    row.get(2)?,
      version:       row.get(3)?,
      file_path:     row.get(4)?,
      line_number:   row.get(5)?,
      kind:          row.get(6)?,
      name:          row.get(7)?,
      signature:     row.get(8)?,
      description:   row.get(9)?,
      relationships: row.get(10)?,
    })
  }

  pub fn into_symbol(self) -> Result<Symbol> {
    Ok(Symbol {
      symbol_id:     decode_uuid(&self.symbol_id)?,
      fossil_id:     decode_uuid(&self.fossil_id)?,
      project_id:    decode_uuid(&self.project_id)?,
      version:       self.version,
      file_path:     self.file_path,
      line_number:   self.line_number,
      kind:          SymbolType::from_label(&self.kind),
      name:          self.name,
      signature:     self.signature,
      description:   self.description,
      relationships: decode_opt_json(self.relationships)?,
    })
  }
}

/// Raw strings read directly from a `query_log` row.
pub struct RawQueryLogEntry {
  pub entry_id:     String,
  pub tool_name:    String,
  pub project_name: Option<String>,
  pub query_params: Option<String>,
  pub timestamp:    String,
}

pub const QUERY_LOG_COLUMNS: &str =
  "entry_id, tool_name, project_name, query_params, timestamp";

impl RawQueryLogEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:     row.get(0)?,
      tool_name:    row.get(1)?,
      project_name: row.get(2)?,
      query_params: row.get(3)?,
      timestamp:    row.get(4)?,
    })
  }

  pub fn into_entry(self) -> Result<QueryLogEntry> {
    Ok(QueryLogEntry {
      entry_id:     decode_uuid(&self.entry_id)?,
      tool_name:    self.tool_name,
      project_name: self.project_name,
      query_params: decode_opt_json(self.query_params)?,
      timestamp:    decode_dt(&self.timestamp)?,
    })
  }
}

/// Raw strings read directly from an `insights` row.
pub struct RawInsight {
  pub insight_id:        String,
  pub project_id:        Option<String>,
  pub fossil_id:         Option<String>,
  pub insight_type:      String,
  pub content:           String,
  pub model_used:        Option<String>,
  pub projects_involved: String,
  pub created_at:        String,
}

pub const INSIGHT_COLUMNS: &str = "insight_id, project_id, fossil_id, \
                                   insight_type, content, model_used, \
                                   projects_involved, created_at";

impl RawInsight {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      insight_id:        row.get(0)?,
      project_id:        row.get(1)?,
      fossil_id:         row.get(2)?,
      insight_type:      row.get(3)?,
      content:           row.get(4)?,
      model_used:        row.get(5)?,
      projects_involved: row.get(6)?,
      created_at:        row.get(7)?,
    })
  }

  pub fn into_insight(self) -> Result<Insight> {
    Ok(Insight {
      insight_id:        decode_uuid(&self.insight_id)?,
      project_id:        decode_opt_uuid(self.project_id)?,
      fossil_id:         decode_opt_uuid(self.fossil_id)?,
      insight_type:      self.insight_type,
      content:           self.content,
      model_used:        self.model_used,
      projects_involved: serde_json::from_str(&self.projects_involved)?,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `custodian_prompts` row.
pub struct RawPrompt {
  pub prompt_id:  String,
  pub project_id: Option<String>,
  pub prompt:     String,
  pub created_by: String,
  pub notes:      Option<String>,
  pub created_at: String,
}

pub const PROMPT_COLUMNS: &str =
  "prompt_id, project_id, prompt, created_by, notes, created_at";

impl RawPrompt {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      prompt_id:  row.get(0)?,
      project_id: row.get(1)?,
      prompt:     row.get(2)?,
      created_by: row.get(3)?,
      notes:      row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_prompt(self) -> Result<CustodianPrompt> {
    Ok(CustodianPrompt {
      prompt_id:  decode_uuid(&self.prompt_id)?,
      project_id: decode_opt_uuid(self.project_id)?,
      prompt:     self.prompt,
      created_by: self.created_by,
      notes:      self.notes,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
