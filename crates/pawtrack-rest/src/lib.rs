//! Gateway to the hosted pawtrack backend.
//!
//! Tables are served PostgREST-style under `/rest/v1`, blobs under
//! `/storage/v1`, and accounts under `/auth/v1`. Every request carries the
//! project's anon key; once signed in, the session's access token replaces it
//! as the bearer credential.

mod client;

pub mod error;

pub use client::{RestConfig, RestGateway};
pub use error::{Error, Result};
