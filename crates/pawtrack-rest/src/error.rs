//! Error type for `pawtrack-rest`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// A non-2xx response. `message` is the backend's own wording.
  #[error("{message}")]
  Api { status: u16, message: String },

  #[error("unexpected response: {0}")]
  Decode(String),

  #[error("Not authenticated")]
  Unauthenticated,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
