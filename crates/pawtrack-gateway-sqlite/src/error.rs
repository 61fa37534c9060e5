//! Error type for `pawtrack-gateway-sqlite`.
//!
//! Account and storage failures read the way the hosted service words them,
//! since stores surface gateway messages to the user unchanged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Table or storage access without a session.
  #[error("Not authenticated")]
  Unauthenticated,

  #[error("User already registered")]
  UserExists,

  /// A write to a row the signed-in user does not own.
  #[error("new row violates row-level security policy for table \"{table}\"")]
  Forbidden { table: String },

  #[error("Invalid login credentials")]
  InvalidCredentials,

  #[error("password hashing failed: {0}")]
  PasswordHash(String),

  #[error("Object not found")]
  ObjectNotFound,

  #[error("The resource already exists")]
  ObjectExists,

  /// A signed URL that is malformed, tampered with, or past its expiry.
  #[error("Invalid or expired signature")]
  InvalidSignature,

  #[error("malformed row in {table}: {reason}")]
  MalformedRow { table: String, reason: String },
}

impl Error {
  pub(crate) fn forbidden(table: &str) -> Self {
    Self::Forbidden { table: table.to_owned() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
