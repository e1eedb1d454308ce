//! Error type for `custodian-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] custodian_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Concurrent ingests kept claiming the same version number.
  #[error("could not assign a fossil version for {project} after {attempts} attempts")]
  VersionConflict { project: String, attempts: u32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
