//! [`SqliteStore`], the SQLite implementation of [`FossilStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use custodian_core::{
  Lookup,
  fossil::{Fossil, FossilReceipt, IngestOutcome},
  insight::{Insight, InsightQuery, NewInsight},
  payload::{FossilPayload, PayloadSymbol},
  project::{NewProject, Project, ProjectLookup, ProjectStatus, ProjectSummary},
  prompt::{CustodianPrompt, NewPrompt, UNKNOWN_PROMPT},
  query_log::{NewQueryLogEntry, ParamUsage, QueryLogEntry, QueryUsage},
  store::FossilStore,
  symbol::{NameMatch, Symbol, SymbolScope, SymbolType},
};

use crate::{
  Error, Result,
  encode::{
    FOSSIL_COLUMNS, INSIGHT_COLUMNS, PROJECT_COLUMNS, PROMPT_COLUMNS,
    QUERY_LOG_COLUMNS, RawFossil, RawInsight, RawProject, RawPrompt,
    RawQueryLogEntry, RawSymbol, SYMBOL_COLUMNS, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// Attempts made to claim the next fossil version before giving up.
const MAX_INGEST_ATTEMPTS: u32 = 3;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Custodian knowledge store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Resolve a project strictly, mapping a miss to
  /// [`Lookup::ProjectNotFound`].
  async fn strict_project<T>(&self, name: &str) -> Result<Result<Project, Lookup<T>>> {
    Ok(
      self
        .find_project(name, ProjectLookup::Strict)
        .await?
        .ok_or_else(|| Lookup::ProjectNotFound(name.to_owned())),
    )
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// Resolve `name` against the projects table.
///
/// Each step runs only if the previous one found nothing: exact name,
/// case-insensitive name, then (fuzzy only) case-insensitive substring with
/// the shortest matching name winning. Fuzzy lookups only see active
/// projects.
fn project_row(
  conn: &rusqlite::Connection,
  name: &str,
  mode: ProjectLookup,
) -> rusqlite::Result<Option<RawProject>> {
  let filter = match mode {
    ProjectLookup::Strict => "",
    ProjectLookup::Fuzzy => "AND status = 'active'",
  };
  let mut steps = vec![
    format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE name = ?1 {filter}"),
    format!(
      "SELECT {PROJECT_COLUMNS} FROM projects
       WHERE LOWER(name) = LOWER(?1) {filter}
       ORDER BY name LIMIT 1"
    ),
  ];
  if mode == ProjectLookup::Fuzzy {
    steps.push(format!(
      "SELECT {PROJECT_COLUMNS} FROM projects
       WHERE instr(LOWER(name), LOWER(?1)) > 0 {filter}
       ORDER BY length(name), name LIMIT 1"
    ));
  }

  for sql in steps {
    let row = conn
      .query_row(&sql, rusqlite::params![name], RawProject::from_row)
      .optional()?;
    if row.is_some() {
      return Ok(row);
    }
  }
  Ok(None)
}

fn has_fossil(conn: &rusqlite::Connection, project_id: &str) -> rusqlite::Result<bool> {
  conn.query_row(
    "SELECT EXISTS(SELECT 1 FROM fossils WHERE project_id = ?1)",
    rusqlite::params![project_id],
    |r| r.get(0),
  )
}

fn symbol_rows(
  conn: &rusqlite::Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<RawSymbol>> {
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt
    .query_map(params, RawSymbol::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn is_version_conflict(err: &tokio_rusqlite::Error) -> bool {
  matches!(
    err,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _))
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── Ingest ──────────────────────────────────────────────────────────────────

/// One symbol, encoded for insertion.
#[derive(Clone)]
struct SymbolInsert {
  file_path:     String,
  line_number:   Option<i64>,
  kind:          String,
  name:          String,
  signature:     Option<String>,
  description:   Option<String>,
  relationships: Option<String>,
}

impl SymbolInsert {
  fn encode(symbol: PayloadSymbol) -> Result<Self> {
    Ok(Self {
      relationships: match symbol.relationships {
        // Already-encoded relationships are stored as given.
        Some(serde_json::Value::String(text)) => Some(text),
        Some(value) => Some(serde_json::to_string(&value)?),
        None => None,
      },
      file_path:     symbol.file_path,
      line_number:   symbol.line_number,
      kind:          symbol.kind.as_str().to_owned(),
      name:          symbol.name,
      signature:     symbol.signature,
      description:   symbol.description,
    })
  }
}

/// A parsed payload, encoded for insertion. Cloned per attempt.
#[derive(Clone)]
struct FossilInsert {
  project_id:     String,
  summary:        String,
  architecture:   String,
  recent_changes: String,
  known_issues:   String,
  dependencies:   String,
  file_tree:      String,
  prompt_used:    String,
  symbols:        Vec<SymbolInsert>,
}

impl FossilInsert {
  fn encode(project_id: Uuid, payload: FossilPayload, prompt_used: String) -> Result<Self> {
    Ok(Self {
      project_id: encode_uuid(project_id),
      dependencies: serde_json::to_string(&payload.dependencies)?,
      file_tree: serde_json::to_string(&payload.file_tree)?,
      summary: payload.summary,
      architecture: payload.architecture,
      recent_changes: payload.recent_changes,
      known_issues: payload.known_issues,
      prompt_used,
      symbols: payload
        .symbols
        .into_iter()
        .map(SymbolInsert::encode)
        .collect::<Result<_>>()?,
    })
  }
}

/// Claim the next version and write the fossil, its symbols and the
/// project's `last_indexed` in a single IMMEDIATE transaction.
fn insert_fossil(
  conn: &mut rusqlite::Connection,
  row: FossilInsert,
) -> rusqlite::Result<(Uuid, i64)> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let version: i64 = tx.query_row(
    "SELECT COALESCE(MAX(version), 0) + 1 FROM fossils WHERE project_id = ?1",
    rusqlite::params![row.project_id],
    |r| r.get(0),
  )?;

  let fossil_id = Uuid::new_v4();
  let fossil_id_str = encode_uuid(fossil_id);
  let now = encode_dt(Utc::now());

  tx.execute(
    "INSERT INTO fossils (
       fossil_id, project_id, version, created_at, summary, architecture,
       recent_changes, known_issues, dependencies, file_tree, prompt_used
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    rusqlite::params![
      fossil_id_str,
      row.project_id,
      version,
      now,
      row.summary,
      row.architecture,
      row.recent_changes,
      row.known_issues,
      row.dependencies,
      row.file_tree,
      row.prompt_used,
    ],
  )?;

  {
    let mut stmt = tx.prepare(
      "INSERT INTO symbols (
         symbol_id, fossil_id, project_id, seq, file_path, line_number,
         type, name, signature, description, relationships
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )?;
    for (seq, s) in row.symbols.iter().enumerate() {
      stmt.execute(rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        fossil_id_str,
        row.project_id,
        seq as i64,
        s.file_path,
        s.line_number,
        s.kind,
        s.name,
        s.signature,
        s.description,
        s.relationships,
      ])?;
    }
  }

  tx.execute(
    "UPDATE projects SET last_indexed = ?1 WHERE project_id = ?2",
    rusqlite::params![now, row.project_id],
  )?;

  tx.commit()?;
  Ok((fossil_id, version))
}

// ─── FossilStore impl ────────────────────────────────────────────────────────

impl FossilStore for SqliteStore {
  type Error = Error;

  // ── Projects ──────────────────────────────────────────────────────────

  async fn register_project(&self, input: NewProject) -> Result<Project> {
    let id_str = encode_uuid(Uuid::new_v4());
    let path = input.path.to_string_lossy().into_owned();
    let name = input.name;

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO projects (project_id, name, path, stack, status)
           VALUES (?1, ?2, ?3, ?4, 'active')
           ON CONFLICT(name) DO UPDATE SET
             path  = excluded.path,
             stack = excluded.stack",
          rusqlite::params![id_str, name, path, input.stack],
        )?;
        let raw = conn.query_row(
          &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE name = ?1"),
          rusqlite::params![name],
          RawProject::from_row,
        )?;
        Ok(raw)
      })
      .await?;

    let project = raw.into_project()?;
    tracing::info!(project = %project.name, id = %project.project_id, "registered project");
    Ok(project)
  }

  async fn set_project_status<'a>(
    &'a self,
    name: &'a str,
    status: ProjectStatus,
  ) -> Result<Lookup<Project>> {
    let mut project = match self.strict_project(name).await? {
      Ok(p) => p,
      Err(missing) => return Ok(missing),
    };

    let id_str = encode_uuid(project.project_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE projects SET status = ?1 WHERE project_id = ?2",
          rusqlite::params![status.as_str(), id_str],
        )?;
        Ok(())
      })
      .await?;

    project.status = status;
    Ok(Lookup::Found(project))
  }

  async fn find_project<'a>(
    &'a self,
    name: &'a str,
    mode: ProjectLookup,
  ) -> Result<Option<Project>> {
    let name = name.trim().to_owned();
    if name.is_empty() {
      return Ok(None);
    }

    let raw = self
      .conn
      .call(move |conn| Ok(project_row(conn, &name, mode)?))
      .await?;

    raw.map(RawProject::into_project).transpose()
  }

  async fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
    let rows: Vec<(RawProject, i64, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROJECT_COLUMNS},
             (SELECT COUNT(*) FROM fossils f WHERE f.project_id = p.project_id),
             (SELECT COUNT(*) FROM symbols s WHERE s.fossil_id = (
                SELECT f2.fossil_id FROM fossils f2
                WHERE f2.project_id = p.project_id
                ORDER BY f2.version DESC LIMIT 1))
           FROM projects p
           ORDER BY p.name"
        ))?;
        let rows = stmt
          .query_map([], |r| Ok((RawProject::from_row(r)?, r.get(6)?, r.get(7)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(raw, fossils, symbols)| {
        Ok(ProjectSummary {
          project:      raw.into_project()?,
          fossil_count: fossils as u64,
          symbol_count: symbols as u64,
        })
      })
      .collect()
  }

  // ── Ingestion ─────────────────────────────────────────────────────────

  async fn ingest<'a>(
    &'a self,
    project_name: &'a str,
    raw_output: &'a str,
    prompt_used: Option<String>,
  ) -> Result<IngestOutcome> {
    let payload = match FossilPayload::parse(raw_output) {
      Ok(p) => p,
      Err(custodian_core::Error::MalformedPayload(reason)) => {
        tracing::warn!(project = project_name, %reason, "rejected malformed fossil payload");
        return Ok(IngestOutcome::Malformed { reason });
      }
      Err(e) => return Err(e.into()),
    };

    let Some(project) = self.find_project(project_name, ProjectLookup::Strict).await?
    else {
      tracing::warn!(project = project_name, "ingest for unknown project");
      return Ok(IngestOutcome::ProjectNotFound { name: project_name.to_owned() });
    };

    let prompt_used = match prompt_used {
      Some(p) => p,
      None => self
        .latest_prompt(Some(project.project_id))
        .await?
        .map(|p| p.prompt)
        .unwrap_or_else(|| UNKNOWN_PROMPT.to_owned()),
    };

    let row = FossilInsert::encode(project.project_id, payload, prompt_used)?;
    let symbol_count = row.symbols.len();

    for attempt in 1..=MAX_INGEST_ATTEMPTS {
      let row = row.clone();
      match self.conn.call(move |conn| Ok(insert_fossil(conn, row)?)).await {
        Ok((fossil_id, version)) => {
          tracing::info!(
            project = %project.name,
            version,
            symbols = symbol_count,
            "stored fossil"
          );
          return Ok(IngestOutcome::Stored(FossilReceipt {
            fossil_id,
            project_id: project.project_id,
            project_name: project.name,
            version,
            symbol_count,
          }));
        }
        Err(e) if is_version_conflict(&e) => {
          tracing::warn!(project = %project.name, attempt, "fossil version taken, retrying");
        }
        Err(e) => return Err(e.into()),
      }
    }

    Err(Error::VersionConflict {
      project:  project.name,
      attempts: MAX_INGEST_ATTEMPTS,
    })
  }

  // ── Fossil reads ──────────────────────────────────────────────────────

  async fn latest_fossil<'a>(&'a self, project_name: &'a str) -> Result<Lookup<Fossil>> {
    let project = match self.strict_project(project_name).await? {
      Ok(p) => p,
      Err(missing) => return Ok(missing),
    };

    let id_str = encode_uuid(project.project_id);
    let raw = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!(
              "SELECT {FOSSIL_COLUMNS} FROM fossils
               WHERE project_id = ?1
               ORDER BY version DESC LIMIT 1"
            ),
            rusqlite::params![id_str],
            RawFossil::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    match raw {
      Some(raw) => Ok(Lookup::Found(raw.into_fossil()?)),
      None => Ok(Lookup::NoFossil(project.name)),
    }
  }

  async fn fossil_history<'a>(
    &'a self,
    project_name: &'a str,
  ) -> Result<Lookup<Vec<Fossil>>> {
    let project = match self.strict_project(project_name).await? {
      Ok(p) => p,
      Err(missing) => return Ok(missing),
    };

    let id_str = encode_uuid(project.project_id);
    let raws: Vec<RawFossil> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FOSSIL_COLUMNS} FROM fossils
           WHERE project_id = ?1
           ORDER BY version ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawFossil::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    if raws.is_empty() {
      return Ok(Lookup::NoFossil(project.name));
    }
    let fossils = raws
      .into_iter()
      .map(RawFossil::into_fossil)
      .collect::<Result<Vec<_>>>()?;
    Ok(Lookup::Found(fossils))
  }

  async fn symbols_for_fossil(&self, fossil_id: Uuid) -> Result<Option<Vec<Symbol>>> {
    let id_str = encode_uuid(fossil_id);
    let raws: Option<Vec<RawSymbol>> = self
      .conn
      .call(move |conn| {
        let exists: bool = conn.query_row(
          "SELECT EXISTS(SELECT 1 FROM fossils WHERE fossil_id = ?1)",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?;
        if !exists {
          return Ok(None);
        }
        Ok(Some(symbol_rows(
          conn,
          &format!(
            "SELECT {SYMBOL_COLUMNS}
             FROM symbols s JOIN fossils f ON f.fossil_id = s.fossil_id
             WHERE s.fossil_id = ?1
             ORDER BY s.file_path, s.line_number, s.seq"
          ),
          rusqlite::params![id_str],
        )?))
      })
      .await?;

    raws
      .map(|raws| raws.into_iter().map(RawSymbol::into_symbol).collect::<Result<Vec<_>>>())
      .transpose()
  }

  async fn find_symbols<'a>(
    &'a self,
    project_name: &'a str,
    name: NameMatch,
    scope: SymbolScope,
  ) -> Result<Lookup<Vec<Symbol>>> {
    let project = match self.strict_project(project_name).await? {
      Ok(p) => p,
      Err(missing) => return Ok(missing),
    };

    // Substring matches are folded in Rust: SQLite's LOWER only folds ASCII.
    let (exact, needle) = match name {
      NameMatch::Exact(s) => (Some(s), None),
      NameMatch::Contains(s) => (None, Some(s.to_lowercase())),
    };
    let name_clause = if exact.is_some() { "AND s.name = ?2" } else { "" };
    let sql = match scope {
      SymbolScope::Latest => format!(
        "SELECT {SYMBOL_COLUMNS}
         FROM symbols s JOIN fossils f ON f.fossil_id = s.fossil_id
         WHERE s.project_id = ?1
           AND f.version = (SELECT MAX(version) FROM fossils WHERE project_id = ?1)
           {name_clause}
         ORDER BY s.file_path, s.line_number, s.seq"
      ),
      SymbolScope::AllFossils => format!(
        "SELECT {SYMBOL_COLUMNS}
         FROM symbols s JOIN fossils f ON f.fossil_id = s.fossil_id
         WHERE s.project_id = ?1 {name_clause}
         ORDER BY f.version DESC, s.file_path, s.line_number, s.seq"
      ),
    };

    let id_str = encode_uuid(project.project_id);
    let raws: Option<Vec<RawSymbol>> = self
      .conn
      .call(move |conn| {
        if !has_fossil(conn, &id_str)? {
          return Ok(None);
        }
        let rows = match exact {
          Some(name) => symbol_rows(conn, &sql, rusqlite::params![id_str, name])?,
          None => symbol_rows(conn, &sql, rusqlite::params![id_str])?,
        };
        Ok(Some(rows))
      })
      .await?;

    let Some(raws) = raws else {
      return Ok(Lookup::NoFossil(project.name));
    };
    let symbols = raws
      .into_iter()
      .filter(|raw| {
        needle
          .as_deref()
          .is_none_or(|n| raw.name.to_lowercase().contains(n))
      })
      .map(RawSymbol::into_symbol)
      .collect::<Result<Vec<_>>>()?;
    Ok(Lookup::Found(symbols))
  }

  async fn symbol_type_counts(&self, fossil_id: Uuid) -> Result<Vec<(SymbolType, u64)>> {
    let id_str = encode_uuid(fossil_id);
    let rows: Vec<(String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT type, COUNT(*) AS n FROM symbols
           WHERE fossil_id = ?1
           GROUP BY type
           ORDER BY n DESC, type ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(label, n)| (SymbolType::from_label(&label), n as u64))
        .collect(),
    )
  }

  // ── Query log ─────────────────────────────────────────────────────────

  async fn log_query(&self, entry: NewQueryLogEntry) -> Result<QueryLogEntry> {
    let logged = QueryLogEntry {
      entry_id:     Uuid::new_v4(),
      tool_name:    entry.tool_name,
      project_name: entry.project_name,
      query_params: entry.query_params,
      timestamp:    Utc::now(),
    };

    let id_str = encode_uuid(logged.entry_id);
    let tool = logged.tool_name.clone();
    let project = logged.project_name.clone();
    let params = logged
      .query_params
      .as_ref()
      .map(serde_json::to_string)
      .transpose()?;
    let ts = encode_dt(logged.timestamp);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO query_log (entry_id, tool_name, project_name, query_params, timestamp)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, tool, project, params, ts],
        )?;
        Ok(())
      })
      .await?;

    Ok(logged)
  }

  async fn query_usage(&self, limit: usize) -> Result<Vec<QueryUsage>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT tool_name, project_name, COUNT(*) AS n FROM query_log
           GROUP BY tool_name, project_name
           ORDER BY n DESC, tool_name, project_name
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit as i64], |r| {
            Ok(QueryUsage {
              tool_name:    r.get(0)?,
              project_name: r.get(1)?,
              count:        r.get::<_, i64>(2)? as u64,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn param_usage(&self, limit: usize) -> Result<Vec<ParamUsage>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT tool_name, query_params, COUNT(*) AS n FROM query_log
           GROUP BY tool_name, query_params
           ORDER BY n DESC, tool_name, query_params
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit as i64], |r| {
            Ok(ParamUsage {
              tool_name:    r.get(0)?,
              query_params: r.get(1)?,
              count:        r.get::<_, i64>(2)? as u64,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn recent_queries<'a>(
    &'a self,
    tool_name: Option<&'a str>,
    limit: usize,
  ) -> Result<Vec<QueryLogEntry>> {
    let tool = tool_name.map(str::to_owned);
    let raws: Vec<RawQueryLogEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {QUERY_LOG_COLUMNS} FROM query_log
           WHERE (?1 IS NULL OR tool_name = ?1)
           ORDER BY timestamp DESC, rowid DESC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![tool, limit as i64], RawQueryLogEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawQueryLogEntry::into_entry).collect()
  }

  // ── Insights ──────────────────────────────────────────────────────────

  async fn record_insight(&self, input: NewInsight) -> Result<Insight> {
    let insight = Insight {
      insight_id:        Uuid::new_v4(),
      project_id:        input.project_id,
      fossil_id:         input.fossil_id,
      insight_type:      input.insight_type,
      content:           input.content,
      model_used:        input.model_used,
      projects_involved: input.projects_involved,
      created_at:        Utc::now(),
    };

    let id_str = encode_uuid(insight.insight_id);
    let project_id = insight.project_id.map(encode_uuid);
    let fossil_id = insight.fossil_id.map(encode_uuid);
    let insight_type = insight.insight_type.clone();
    let content = insight.content.clone();
    let model = insight.model_used.clone();
    let involved = serde_json::to_string(&insight.projects_involved)?;
    let created = encode_dt(insight.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO insights (
             insight_id, project_id, fossil_id, insight_type, content,
             model_used, projects_involved, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            project_id,
            fossil_id,
            insight_type,
            content,
            model,
            involved,
            created
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(kind = %insight.insight_type, "recorded insight");
    Ok(insight)
  }

  async fn list_insights<'a>(&'a self, query: &'a InsightQuery) -> Result<Vec<Insight>> {
    let project_id = query.project_id.map(encode_uuid);
    let insight_type = query.insight_type.clone();
    // SQLite treats a negative LIMIT as unbounded.
    let limit = query.limit.map_or(-1, |l| l as i64);

    let raws: Vec<RawInsight> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {INSIGHT_COLUMNS} FROM insights
           WHERE (project_id IS NULL OR project_id = ?1)
             AND (?2 IS NULL OR insight_type = ?2)
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![project_id, insight_type, limit],
            RawInsight::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInsight::into_insight).collect()
  }

  // ── Prompts ───────────────────────────────────────────────────────────

  async fn record_prompt(&self, input: NewPrompt) -> Result<CustodianPrompt> {
    let prompt = CustodianPrompt {
      prompt_id:  Uuid::new_v4(),
      project_id: input.project_id,
      prompt:     input.prompt,
      created_by: input.created_by,
      notes:      input.notes,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(prompt.prompt_id);
    let project_id = prompt.project_id.map(encode_uuid);
    let text = prompt.prompt.clone();
    let created_by = prompt.created_by.clone();
    let notes = prompt.notes.clone();
    let created = encode_dt(prompt.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO custodian_prompts (
             prompt_id, project_id, prompt, created_by, notes, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, project_id, text, created_by, notes, created],
        )?;
        Ok(())
      })
      .await?;

    Ok(prompt)
  }

  async fn latest_prompt(&self, project_id: Option<Uuid>) -> Result<Option<CustodianPrompt>> {
    let project_id = project_id.map(encode_uuid);
    let raw = self
      .conn
      .call(move |conn| {
        if let Some(id) = &project_id {
          let scoped = conn
            .query_row(
              &format!(
                "SELECT {PROMPT_COLUMNS} FROM custodian_prompts
                 WHERE project_id = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT 1"
              ),
              rusqlite::params![id],
              RawPrompt::from_row,
            )
            .optional()?;
          if scoped.is_some() {
            return Ok(scoped);
          }
        }
        let global = conn
          .query_row(
            &format!(
              "SELECT {PROMPT_COLUMNS} FROM custodian_prompts
               WHERE project_id IS NULL
               ORDER BY created_at DESC, rowid DESC LIMIT 1"
            ),
            [],
            RawPrompt::from_row,
          )
          .optional()?;
        Ok(global)
      })
      .await?;

    raw.map(RawPrompt::into_prompt).transpose()
  }
}
