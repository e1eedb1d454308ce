//! Custodian prompts: the instruction text handed to the synthesis step.
//!
//! Prompts are versioned by insertion time. The latest project-specific prompt
//! wins over the latest global one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recorded on a fossil when no prompt is known at all.
pub const UNKNOWN_PROMPT: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodianPrompt {
  pub prompt_id:  Uuid,
  /// `None` for the global default.
  pub project_id: Option<Uuid>,
  pub prompt:     String,
  /// Who wrote it, e.g. `initial` or `detective`.
  pub created_by: String,
  pub notes:      Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPrompt {
  pub project_id: Option<Uuid>,
  pub prompt:     String,
  pub created_by: String,
  pub notes:      Option<String>,
}
