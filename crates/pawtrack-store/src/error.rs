//! Error type for `pawtrack-store`.
//!
//! Every expected failure is returned as a value. The `Display` form of each
//! variant is the message to show the user.

use pawtrack_core::ValidationError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
  /// No session; nothing was sent.
  #[error("Not authenticated")]
  Unauthenticated,

  /// Input rejected before any network call.
  #[error("{message}")]
  ValidationFailed {
    field:   &'static str,
    message: String,
  },

  /// The backend failed; `message` is its own wording, unaltered.
  #[error("{message}")]
  Gateway { message: String },

  /// The targeted record no longer exists.
  #[error("record {id} not found")]
  NotFound { id: Uuid },

  /// Another request on the same store has not finished yet.
  #[error("another request is still in progress")]
  Busy,
}

impl StoreError {
  pub(crate) fn gateway(err: impl std::error::Error) -> Self {
    Self::Gateway { message: err.to_string() }
  }
}

impl From<ValidationError> for StoreError {
  fn from(err: ValidationError) -> Self {
    Self::ValidationFailed { field: err.field, message: err.message }
  }
}

/// Outcome of a write: the record as the backend stored it, or why not.
pub type MutationResult<T> = Result<T, StoreError>;
