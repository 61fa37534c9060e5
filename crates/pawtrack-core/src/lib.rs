//! Core types and trait definitions for pawtrack.
//!
//! Domain records (pets and everything recorded about them), the [`Gateway`]
//! contract every backend implements, input validation, and the pure derived
//! views (ages, schedules, expense summaries) consumed by presentation code.
//!
//! This crate is free of HTTP and database dependencies.

// Gateway methods return `impl Future + Send` explicitly.
#![allow(async_fn_in_trait)]

pub mod age;
pub mod care;
pub mod date;
pub mod document;
pub mod error;
pub mod expense;
pub mod gateway;
pub mod history;
pub mod partition;
pub mod pet;
pub mod record;
pub mod summary;
pub mod user;
pub mod validate;

pub use date::CalendarDate;
pub use error::{Error, Result};
pub use gateway::{Auth, AuthUser, Filter, Gateway, Row};
pub use record::{Direction, OrderBy, Owner, Record, Scope};
pub use validate::{Validate, ValidationError};
