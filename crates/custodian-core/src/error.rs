//! Error types for `custodian-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The ingestion payload is not a JSON object of the expected shape.
  #[error("malformed fossil payload: {0}")]
  MalformedPayload(String),

  #[error("unknown project status: {0:?}")]
  UnknownStatus(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
