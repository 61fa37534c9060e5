//! Conversions between domain values and the plain-text representations
//! stored in SQLite columns.
//!
//! Timestamps are RFC 3339 UTC strings with microsecond precision and a `Z`
//! suffix, so they also sort correctly as text. UUIDs are hyphenated
//! lowercase strings. Rows are compact JSON objects.

use chrono::{DateTime, SecondsFormat, Utc};
use pawtrack_core::Row;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Rows ────────────────────────────────────────────────────────────────────

pub fn decode_row(table: &str, data: &str) -> Result<Row> {
  match serde_json::from_str(data)? {
    Value::Object(row) => Ok(row),
    other => Err(Error::MalformedRow {
      table:  table.to_owned(),
      reason: format!("expected an object, found {other}"),
    }),
  }
}

/// The JSON path addressing a top-level column inside `data`.
pub fn column_path(column: &str) -> String { format!("$.{column}") }

/// A JSON value as SQLite sees it coming out of `json_extract`.
pub fn sql_value(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
    Value::Number(n) => match n.as_i64() {
      Some(i) => SqlValue::Integer(i),
      None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
    },
    Value::String(s) => SqlValue::Text(s.clone()),
    other => SqlValue::Text(other.to_string()),
  }
}
