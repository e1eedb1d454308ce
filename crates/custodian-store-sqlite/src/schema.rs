//! SQL schema for the Custodian SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

CREATE TABLE IF NOT EXISTS projects (
    project_id    TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE,
    path          TEXT NOT NULL,
    stack         TEXT NOT NULL DEFAULT '',
    status        TEXT NOT NULL DEFAULT 'active',   -- 'active' | 'inactive'
    last_indexed  TEXT                              -- ISO 8601 UTC or NULL
);

-- Fossils are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS fossils (
    fossil_id       TEXT PRIMARY KEY,
    project_id      TEXT NOT NULL REFERENCES projects(project_id),
    version         INTEGER NOT NULL,
    created_at      TEXT NOT NULL,
    summary         TEXT NOT NULL DEFAULT '',
    architecture    TEXT NOT NULL DEFAULT '',
    recent_changes  TEXT NOT NULL DEFAULT '',
    known_issues    TEXT NOT NULL DEFAULT '',
    dependencies    TEXT NOT NULL DEFAULT '[]',     -- JSON array
    file_tree       TEXT NOT NULL DEFAULT '[]',     -- JSON array
    prompt_used     TEXT NOT NULL,
    UNIQUE (project_id, version)
);

-- Written in the same transaction as the parent fossil; never touched again.
CREATE TABLE IF NOT EXISTS symbols (
    symbol_id      TEXT PRIMARY KEY,
    fossil_id      TEXT NOT NULL REFERENCES fossils(fossil_id),
    project_id     TEXT NOT NULL REFERENCES projects(project_id),
    seq            INTEGER NOT NULL,                -- position in the payload
    file_path      TEXT NOT NULL,
    line_number    INTEGER,
    type           TEXT NOT NULL,
    name           TEXT NOT NULL,
    signature      TEXT,
    description    TEXT,
    relationships  TEXT                             -- JSON, stored verbatim
);

CREATE TABLE IF NOT EXISTS query_log (
    entry_id      TEXT PRIMARY KEY,
    tool_name     TEXT NOT NULL,
    project_name  TEXT,
    query_params  TEXT,                             -- JSON or NULL
    timestamp     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS insights (
    insight_id         TEXT PRIMARY KEY,
    project_id         TEXT REFERENCES projects(project_id),
    fossil_id          TEXT REFERENCES fossils(fossil_id),
    insight_type       TEXT NOT NULL,
    content            TEXT NOT NULL,
    model_used         TEXT,
    projects_involved  TEXT NOT NULL DEFAULT '[]',
    created_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS custodian_prompts (
    prompt_id   TEXT PRIMARY KEY,
    project_id  TEXT REFERENCES projects(project_id),
    prompt      TEXT NOT NULL,
    created_by  TEXT NOT NULL,
    notes       TEXT,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS symbols_fossil_idx   ON symbols(fossil_id, file_path, line_number, seq);
CREATE INDEX IF NOT EXISTS symbols_project_idx  ON symbols(project_id, name);
CREATE INDEX IF NOT EXISTS query_log_time_idx   ON query_log(timestamp);
CREATE INDEX IF NOT EXISTS insights_project_idx ON insights(project_id, created_at);

PRAGMA user_version = 1;
";
