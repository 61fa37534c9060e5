//! Moving typed values across the untyped row boundary.

use chrono::{SecondsFormat, Utc};
use pawtrack_core::Row;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::{MutationResult, StoreError};

/// Serialize a draft or patch into the fields of a row.
pub(crate) fn encode(value: &impl Serialize) -> MutationResult<Row> {
  match serde_json::to_value(value).map_err(StoreError::gateway)? {
    Value::Object(fields) => Ok(fields),
    other => Err(StoreError::Gateway {
      message: format!("expected an object to send, got {other}"),
    }),
  }
}

pub(crate) fn decode<T: DeserializeOwned>(row: Row) -> MutationResult<T> {
  serde_json::from_value(Value::Object(row)).map_err(StoreError::gateway)
}

/// Current instant in the form the backends store timestamps.
pub(crate) fn now_timestamp() -> Value {
  Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}
