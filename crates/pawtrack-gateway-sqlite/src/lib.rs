//! SQLite backend for pawtrack.
//!
//! Implements the [`pawtrack_core::Gateway`] and [`pawtrack_core::Auth`]
//! contracts against a single local file, so the app and its tests run
//! without the hosted service. Rows are kept as JSON documents per table,
//! accounts are argon2-hashed, and blob storage hands out keyed-hash signed
//! URLs that expire.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod gateway;
mod schema;
mod signing;

pub mod error;

pub use error::{Error, Result};
pub use gateway::{Blob, DEFAULT_BASE_URL, SqliteGateway};
