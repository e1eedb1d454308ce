//! Analysis context: the text corpus handed to the external pattern-analysis
//! and prompt-refinement collaborators.
//!
//! The builders only aggregate and truncate. Truncation counts characters, so
//! the same input always produces the same corpus.

use std::fmt::Write as _;

use uuid::Uuid;

use crate::{
  Lookup,
  fossil::Fossil,
  project::{Project, ProjectLookup, ProjectStatus},
  store::FossilStore,
  symbol::SymbolType,
};

/// Character budget for each free-text fossil field.
pub const FIELD_BUDGET: usize = 500;
/// Number of (tool, project) usage rows included.
pub const USAGE_ROWS: usize = 30;
/// Number of raw query log entries included.
pub const RECENT_QUERIES: usize = 50;
/// Number of (tool, params) rows in the refinement context.
pub const PARAM_ROWS: usize = 50;
/// Number of recent symbol lookups in the refinement context.
pub const RECENT_LOOKUPS: usize = 30;

/// The assembled corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisContext {
  pub corpus:     String,
  /// Set when the corpus covers exactly one project.
  pub project_id: Option<Uuid>,
}

/// Cut `text` after `budget` characters.
pub fn truncate_chars(text: &str, budget: usize) -> &str {
  match text.char_indices().nth(budget) {
    Some((idx, _)) => &text[..idx],
    None => text,
  }
}

/// Build the corpus for one project (resolved strictly) or, with `None`, for
/// every active project ordered by name.
pub async fn build_analysis_context<S: FossilStore>(
  store: &S,
  project_name: Option<&str>,
) -> Result<Lookup<AnalysisContext>, S::Error> {
  let projects: Vec<Project> = match project_name {
    Some(name) => match store.find_project(name, ProjectLookup::Strict).await? {
      Some(p) => vec![p],
      None => return Ok(Lookup::ProjectNotFound(name.to_owned())),
    },
    None => store
      .list_projects()
      .await?
      .into_iter()
      .map(|s| s.project)
      .filter(|p| p.status == ProjectStatus::Active)
      .collect(),
  };

  let mut out = String::new();

  for project in &projects {
    let history = store.fossil_history(&project.name).await?.found().unwrap_or_default();
    let tally = match history.last() {
      Some(latest) => store.symbol_type_counts(latest.fossil_id).await?,
      None => Vec::new(),
    };
    write_project_section(&mut out, project, &history, &tally);
  }

  let usage = store.query_usage(USAGE_ROWS).await?;
  if !usage.is_empty() {
    out.push_str("\n=== QUERY PATTERNS ===\n");
    for u in &usage {
      let _ = writeln!(
        out,
        "  {} on {}: {} calls",
        u.tool_name,
        u.project_name.as_deref().unwrap_or("*"),
        u.count
      );
    }
  }

  let _ = writeln!(out, "\n=== RECENT QUERY DETAILS (last {RECENT_QUERIES}) ===");
  for q in store.recent_queries(None, RECENT_QUERIES).await? {
    let params = q.query_params.map(|p| p.to_string()).unwrap_or_default();
    let _ = writeln!(out, "  [{}] {}({params})", q.timestamp.to_rfc3339(), q.tool_name);
  }

  let project_id = match projects.as_slice() {
    [only] => Some(only.project_id),
    _ => None,
  };
  Ok(Lookup::Found(AnalysisContext { corpus: out, project_id }))
}

fn write_project_section(
  out: &mut String,
  project: &Project,
  history: &[Fossil],
  tally: &[(SymbolType, u64)],
) {
  let _ = writeln!(out, "\n=== PROJECT: {} ===", project.name);
  let _ = writeln!(out, "Path: {}", project.path.display());
  let _ = writeln!(out, "Stack: {}", project.stack);

  if history.is_empty() {
    return;
  }

  let _ = writeln!(out, "\nFossil history ({} versions):", history.len());
  for f in history {
    let _ = writeln!(out, "\n--- Fossil v{} ({}) ---", f.version, f.created_at.to_rfc3339());
    let _ = writeln!(out, "Summary: {}", truncate_chars(&f.summary, FIELD_BUDGET));
    for (label, text) in [
      ("Architecture", &f.architecture),
      ("Known issues", &f.known_issues),
      ("Changes", &f.recent_changes),
    ] {
      if !text.is_empty() {
        let _ = writeln!(out, "{label}: {}", truncate_chars(text, FIELD_BUDGET));
      }
    }
    let _ = writeln!(
      out,
      "Total files: {}, Total lines: {}",
      f.file_tree.len(),
      f.total_lines()
    );
  }

  if !tally.is_empty() {
    let summary = tally
      .iter()
      .map(|(kind, count)| format!("{kind}: {count}"))
      .collect::<Vec<_>>()
      .join(", ");
    let _ = writeln!(out, "Latest symbols: {summary}");
  }
}

/// Build the prompt-refinement corpus: the current global prompt, the most
/// common (tool, params) pairs and the most recent symbol lookups.
///
/// Returns `None` when no global prompt has been recorded yet.
pub async fn build_refinement_context<S: FossilStore>(
  store: &S,
) -> Result<Option<String>, S::Error> {
  let Some(current) = store.latest_prompt(None).await? else {
    return Ok(None);
  };

  let mut out = String::new();
  let _ = writeln!(out, "Current custodian prompt:\n{}\n", current.prompt);

  out.push_str("Query patterns:\n");
  for row in store.param_usage(PARAM_ROWS).await? {
    let _ = writeln!(
      out,
      "  {}: {} (x{})",
      row.tool_name,
      row.query_params.as_deref().unwrap_or(""),
      row.count
    );
  }

  out.push_str("\nSymbol searches:\n");
  for q in store.recent_queries(Some("lookup_symbol"), RECENT_LOOKUPS).await? {
    let params = q.query_params.map(|p| p.to_string()).unwrap_or_default();
    let _ = writeln!(out, "  {params}");
  }

  Ok(Some(out))
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::fossil::FileTreeEntry;

  #[test]
  fn truncation_is_by_character() {
    assert_eq!(truncate_chars("abcdef", 3), "abc");
    assert_eq!(truncate_chars("ab", 3), "ab");
    assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
  }

  #[test]
  fn truncation_is_stable() {
    let long = "x".repeat(FIELD_BUDGET * 2);
    assert_eq!(
      truncate_chars(&long, FIELD_BUDGET),
      truncate_chars(&long, FIELD_BUDGET)
    );
    assert_eq!(truncate_chars(&long, FIELD_BUDGET).len(), FIELD_BUDGET);
  }

  #[test]
  fn project_section_layout() {
    let project = Project {
      project_id:   Uuid::nil(),
      name:         "demo".into(),
      path:         PathBuf::from("/src/demo"),
      stack:        "Rust".into(),
      status:       ProjectStatus::Active,
      last_indexed: None,
    };
    let fossil = Fossil {
      fossil_id:      Uuid::nil(),
      project_id:     Uuid::nil(),
      version:        1,
      created_at:     Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
      summary:        "s".repeat(600),
      architecture:   String::new(),
      recent_changes: "refactor".into(),
      known_issues:   String::new(),
      dependencies:   vec![],
      file_tree:      vec![
        FileTreeEntry { path: "a".into(), description: None, line_count: Some(10) },
        FileTreeEntry { path: "b".into(), description: None, line_count: Some(5) },
      ],
      prompt_used:    "p".into(),
    };
    let mut out = String::new();
    write_project_section(
      &mut out,
      &project,
      &[fossil],
      &[(SymbolType::Function, 3), (SymbolType::Class, 1)],
    );

    assert!(out.contains("=== PROJECT: demo ==="));
    assert!(out.contains("--- Fossil v1 (2025-01-02T03:04:05+00:00) ---"));
    assert!(out.contains(&format!("Summary: {}\n", "s".repeat(FIELD_BUDGET))));
    assert!(!out.contains("Architecture:"));
    assert!(out.contains("Changes: refactor"));
    assert!(out.contains("Total files: 2, Total lines: 15"));
    assert!(out.contains("Latest symbols: function: 3, class: 1"));
  }
}
