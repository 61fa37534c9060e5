//! SQL schema for the pawtrack SQLite gateway.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Every app table lives here as JSON documents keyed by (table_name, id).
-- `data` holds the full row, `id` and `created_at` included.
CREATE TABLE IF NOT EXISTS records (
    table_name  TEXT NOT NULL,
    id          TEXT NOT NULL,
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC; server-assigned
    data        TEXT NOT NULL,
    PRIMARY KEY (table_name, id)
);

CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS blobs (
    bucket       TEXT NOT NULL,
    path         TEXT NOT NULL,
    content_type TEXT NOT NULL,
    sha256       TEXT NOT NULL,   -- hex digest of bytes
    bytes        BLOB NOT NULL,
    created_at   TEXT NOT NULL,
    PRIMARY KEY (bucket, path)
);

CREATE INDEX IF NOT EXISTS records_table_idx ON records(table_name);

PRAGMA user_version = 1;
";

/// Child rows removed along with their parent: `(parent table, child table,
/// column in the child holding the parent id)`. Applied transitively.
pub const CASCADES: &[(&str, &str, &str)] = &[
  ("pets", "weight_records", "pet_id"),
  ("pets", "vet_visits", "pet_id"),
  ("pets", "medications", "pet_id"),
  ("pets", "feeding_schedules", "pet_id"),
  ("pets", "feeding_logs", "pet_id"),
  ("pets", "expenses", "pet_id"),
  ("pets", "documents", "pet_id"),
  ("medications", "medication_logs", "medication_id"),
];
