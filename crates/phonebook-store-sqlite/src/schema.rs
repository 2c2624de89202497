//! SQL schema for the phone-directory SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Self-referential tree. Removing a department removes its subtree.
-- (parent_id, name) is deliberately not UNIQUE: older data may hold
-- duplicate siblings, which path resolution tolerates.
CREATE TABLE IF NOT EXISTS departments (
    department_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT    NOT NULL,
    short_name    TEXT    NOT NULL DEFAULT '',
    parent_id     INTEGER REFERENCES departments(department_id) ON DELETE CASCADE,
    level         INTEGER NOT NULL CHECK (level >= 1),
    created_at    TEXT    NOT NULL,   -- RFC 3339 UTC
    updated_at    TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS employees (
    employee_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    initials       TEXT    NOT NULL DEFAULT '',
    full_name      TEXT    NOT NULL,
    position       TEXT    NOT NULL DEFAULT '',
    department_id  INTEGER REFERENCES departments(department_id) ON DELETE SET NULL,
    phone          TEXT    NOT NULL DEFAULT '',
    internal_phone TEXT    NOT NULL DEFAULT '',
    email          TEXT,
    room           TEXT,
    hierarchy      INTEGER NOT NULL DEFAULT 7,
    created_at     TEXT    NOT NULL,
    updated_at     TEXT    NOT NULL,
    UNIQUE (full_name, internal_phone)
);

-- One row per completed import run; never updated.
CREATE TABLE IF NOT EXISTS import_logs (
    run_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name     TEXT    NOT NULL,
    uploaded_at   TEXT    NOT NULL,
    status        TEXT    NOT NULL,   -- 'success' | 'partial' | 'failed'
    total_records INTEGER NOT NULL,
    added         INTEGER NOT NULL,
    updated       INTEGER NOT NULL,
    errors        TEXT    NOT NULL DEFAULT '[]',   -- JSON array of strings
    username      TEXT
);

CREATE INDEX IF NOT EXISTS departments_parent_idx   ON departments(parent_id, name);
CREATE INDEX IF NOT EXISTS employees_department_idx ON employees(department_id);
CREATE INDEX IF NOT EXISTS import_logs_uploaded_idx ON import_logs(uploaded_at);

PRAGMA user_version = 1;
";
