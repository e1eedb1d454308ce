//! JSON query API for the Custodian knowledge store.
//!
//! Exposes an axum [`Router`] backed by any
//! [`custodian_core::store::FossilStore`]. Every handler appends one entry to
//! the query log under its tool name. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", custodian_api::api_router(store.clone()))
//! ```

pub mod analysis;
pub mod error;
pub mod projects;
pub mod symbols;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use custodian_core::{
  project::{Project, ProjectLookup},
  store::FossilStore,
};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: FossilStore + 'static,
{
  Router::new()
    // Projects and fossils
    .route("/projects", get(projects::list::<S>))
    .route("/projects/{name}/fossil", get(projects::fossil::<S>))
    .route("/projects/{name}/history", get(projects::history::<S>))
    .route("/projects/{name}/changes", get(projects::recent_changes::<S>))
    .route("/projects/{name}/fossils", post(projects::store_fossil::<S>))
    // Symbols
    .route("/projects/{name}/symbols/lookup", get(symbols::lookup::<S>))
    .route("/projects/{name}/symbols/context", get(symbols::context::<S>))
    .route("/projects/{name}/related", get(symbols::related::<S>))
    // Analysis
    .route("/insights", get(analysis::insights::<S>))
    .route("/analysis", get(analysis::corpus::<S>))
    .with_state(store)
}

/// Resolve a project name the way the query surface does: exact,
/// case-insensitive, then substring, over active projects only.
pub(crate) async fn resolve_project<S: FossilStore>(
  store: &S,
  name: &str,
) -> Result<Project, ApiError> {
  store
    .find_project(name, ProjectLookup::Fuzzy)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("project '{name}' not found")))
}

#[cfg(test)]
mod tests;
