//! The `FossilStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `custodian-store-sqlite`). Higher layers (`custodian-api`, the CLI, the
//! resolver and the analysis builder) depend on this abstraction, not on any
//! concrete backend.
//!
//! Fossils, symbols, query log entries, insights and prompts are append-only.
//! There is no update or delete operation for any of them.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Lookup,
  fossil::{Fossil, IngestOutcome},
  insight::{Insight, InsightQuery, NewInsight},
  project::{NewProject, Project, ProjectLookup, ProjectStatus, ProjectSummary},
  prompt::{CustodianPrompt, NewPrompt},
  query_log::{NewQueryLogEntry, ParamUsage, QueryLogEntry, QueryUsage},
  symbol::{NameMatch, Symbol, SymbolScope, SymbolType},
};

/// Abstraction over a Custodian knowledge-store backend.
///
/// Name-keyed fossil queries resolve the project strictly (exact name, then
/// case-insensitive) and report a missing project or a project without
/// fossils as a [`Lookup`] variant. `Err` is reserved for backend failures.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait FossilStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Projects ──────────────────────────────────────────────────────────

  /// Insert a project, or update path and stack of the project with the same
  /// name. Used by the external registration subsystem.
  fn register_project(
    &self,
    input: NewProject,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  fn set_project_status<'a>(
    &'a self,
    name: &'a str,
    status: ProjectStatus,
  ) -> impl Future<Output = Result<Lookup<Project>, Self::Error>> + Send + 'a;

  /// Resolve a project name. Returns `None` if nothing matches.
  fn find_project<'a>(
    &'a self,
    name: &'a str,
    mode: ProjectLookup,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + 'a;

  /// Every project ordered by name, with fossil and symbol counts.
  fn list_projects(
    &self,
  ) -> impl Future<Output = Result<Vec<ProjectSummary>, Self::Error>> + Send + '_;

  // ── Ingestion ─────────────────────────────────────────────────────────

  /// Parse raw synthesis output and atomically store it as the next fossil
  /// version of `project_name`, together with its symbols.
  ///
  /// `prompt_used` defaults to the latest stored prompt for the project.
  /// Nothing is written unless the outcome is [`IngestOutcome::Stored`].
  fn ingest<'a>(
    &'a self,
    project_name: &'a str,
    raw_output: &'a str,
    prompt_used: Option<String>,
  ) -> impl Future<Output = Result<IngestOutcome, Self::Error>> + Send + 'a;

  // ── Fossil reads ──────────────────────────────────────────────────────

  /// The fossil with the highest version.
  fn latest_fossil<'a>(
    &'a self,
    project_name: &'a str,
  ) -> impl Future<Output = Result<Lookup<Fossil>, Self::Error>> + Send + 'a;

  /// Every fossil of the project, oldest first.
  fn fossil_history<'a>(
    &'a self,
    project_name: &'a str,
  ) -> impl Future<Output = Result<Lookup<Vec<Fossil>>, Self::Error>> + Send + 'a;

  /// Symbols of one fossil ordered by file, then line. `None` when no fossil
  /// has this id.
  fn symbols_for_fossil(
    &self,
    fossil_id: Uuid,
  ) -> impl Future<Output = Result<Option<Vec<Symbol>>, Self::Error>> + Send + '_;

  /// Symbols of a project matching `name`.
  ///
  /// With [`SymbolScope::Latest`] the result is ordered by file then line.
  /// With [`SymbolScope::AllFossils`] it is ordered newest fossil first, then
  /// by file and line.
  fn find_symbols<'a>(
    &'a self,
    project_name: &'a str,
    name: NameMatch,
    scope: SymbolScope,
  ) -> impl Future<Output = Result<Lookup<Vec<Symbol>>, Self::Error>> + Send + 'a;

  /// Case-insensitive substring search over the latest fossil only. Older
  /// fossils are reachable through [`FossilStore::fossil_history`] so stale
  /// line numbers are never presented as current.
  fn search_symbols<'a>(
    &'a self,
    project_name: &'a str,
    fragment: &'a str,
  ) -> impl Future<Output = Result<Lookup<Vec<Symbol>>, Self::Error>> + Send + 'a {
    self.find_symbols(
      project_name,
      NameMatch::Contains(fragment.to_owned()),
      SymbolScope::Latest,
    )
  }

  /// Symbol counts per type for one fossil, most frequent first, ties broken
  /// by type name.
  fn symbol_type_counts(
    &self,
    fossil_id: Uuid,
  ) -> impl Future<Output = Result<Vec<(SymbolType, u64)>, Self::Error>> + Send + '_;

  // ── Query log ─────────────────────────────────────────────────────────

  /// Append an entry. Callers should prefer
  /// [`crate::query_log::log_quietly`], which never fails.
  fn log_query(
    &self,
    entry: NewQueryLogEntry,
  ) -> impl Future<Output = Result<QueryLogEntry, Self::Error>> + Send + '_;

  /// Call counts grouped by (tool, project), highest first.
  fn query_usage(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<QueryUsage>, Self::Error>> + Send + '_;

  /// Call counts grouped by (tool, parameters), highest first.
  fn param_usage(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ParamUsage>, Self::Error>> + Send + '_;

  /// Most recent entries first, optionally for a single tool.
  fn recent_queries<'a>(
    &'a self,
    tool_name: Option<&'a str>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<QueryLogEntry>, Self::Error>> + Send + 'a;

  // ── Insights ──────────────────────────────────────────────────────────

  fn record_insight(
    &self,
    input: NewInsight,
  ) -> impl Future<Output = Result<Insight, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_insights<'a>(
    &'a self,
    query: &'a InsightQuery,
  ) -> impl Future<Output = Result<Vec<Insight>, Self::Error>> + Send + 'a;

  // ── Prompts ───────────────────────────────────────────────────────────

  fn record_prompt(
    &self,
    input: NewPrompt,
  ) -> impl Future<Output = Result<CustodianPrompt, Self::Error>> + Send + '_;

  /// The newest prompt for `project_id`, falling back to the newest global
  /// prompt. With `None`, only global prompts are considered.
  fn latest_prompt(
    &self,
    project_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Option<CustodianPrompt>, Self::Error>> + Send + '_;
}
