//! The `Gateway` trait — the boundary to the hosted backend.
//!
//! The trait is implemented by backends (`pawtrack-rest` for the hosted
//! service, `pawtrack-gateway-sqlite` for a local file). Stores depend on
//! this abstraction, not on any concrete backend.
//!
//! Rows cross the boundary as untyped JSON objects; typing them is the
//! store's job.

use std::future::Future;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::record::OrderBy;

/// One table row as a JSON object.
pub type Row = serde_json::Map<String, Value>;

/// Equality filter on a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
  pub column: &'static str,
  pub value:  Value,
}

impl Filter {
  pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
    Self { column, value: value.into() }
  }
}

/// The identity behind the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
  pub id:         Uuid,
  pub email:      String,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

/// Authenticated table and blob access.
///
/// All methods return `Send` futures so stores can be driven from a
/// multi-threaded runtime.
pub trait Gateway: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Tables ────────────────────────────────────────────────────────────

  /// All rows of `table` matching `filter`, sorted by `order`.
  fn query(
    &self,
    table: &'static str,
    filter: Filter,
    order: OrderBy,
  ) -> impl Future<Output = Result<Vec<Row>, Self::Error>> + Send + '_;

  /// Insert a row and return it as stored, including the server-assigned
  /// `id` and `created_at`.
  fn insert(
    &self,
    table: &'static str,
    fields: Row,
  ) -> impl Future<Output = Result<Row, Self::Error>> + Send + '_;

  /// Insert a row, or merge `fields` into the existing row with the same
  /// `id`. Returns the row as stored.
  fn upsert(
    &self,
    table: &'static str,
    fields: Row,
  ) -> impl Future<Output = Result<Row, Self::Error>> + Send + '_;

  /// Apply `fields` to the row with `id` and return the row as stored.
  /// Returns `None` if no row matched.
  fn update(
    &self,
    table: &'static str,
    id: Uuid,
    fields: Row,
  ) -> impl Future<Output = Result<Option<Row>, Self::Error>> + Send + '_;

  /// Delete the row with `id`. Deleting a row that does not exist succeeds.
  fn delete(
    &self,
    table: &'static str,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Blob storage ──────────────────────────────────────────────────────

  fn upload_blob(
    &self,
    bucket: &'static str,
    path: String,
    bytes: Bytes,
    content_type: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// A URL granting read access to a private object for `ttl_seconds`.
  fn signed_url(
    &self,
    bucket: &'static str,
    path: String,
    ttl_seconds: u64,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  // ── Session ───────────────────────────────────────────────────────────

  /// The signed-in user, or `None` when there is no session.
  fn current_user(
    &self,
  ) -> impl Future<Output = Result<Option<AuthUser>, Self::Error>> + Send + '_;
}

/// Account management on top of [`Gateway`].
pub trait Auth: Gateway {
  /// Register an account. Backends that sign the new user in straight away
  /// report it through [`Gateway::current_user`] afterwards.
  fn sign_up(
    &self,
    email: String,
    password: String,
    name: String,
  ) -> impl Future<Output = Result<AuthUser, Self::Error>> + Send + '_;

  fn sign_in(
    &self,
    email: String,
    password: String,
  ) -> impl Future<Output = Result<AuthUser, Self::Error>> + Send + '_;

  fn sign_out(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
