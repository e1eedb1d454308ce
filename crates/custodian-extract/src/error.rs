//! Error type for `custodian-extract`.
//!
//! Only a missing scan root is an error; per-file problems are skipped.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not a directory: {}", .0.display())]
  NotADirectory(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
