//! Core types and trait definitions for the Custodian knowledge store.
//!
//! This crate has no HTTP, database or parser dependencies. The SQLite
//! backend, the extractor and the API layer all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod analysis;
pub mod error;
pub mod fossil;
pub mod insight;
pub mod outcome;
pub mod payload;
pub mod project;
pub mod prompt;
pub mod query_log;
pub mod resolver;
pub mod store;
pub mod symbol;

pub use error::{Error, Result};
pub use outcome::Lookup;
