//! Client-side stores that mirror remote tables.
//!
//! Every store owns its in-memory collection and is the only writer to it.
//! Local state is always the last state the backend confirmed: records appear
//! after a successful insert, are replaced wholesale by the row the backend
//! returns after an update, and disappear after a confirmed delete. Nothing
//! is patched locally ahead of the server.
//!
//! Stores are plain values constructed with an `Arc` of a
//! [`pawtrack_core::Gateway`] and shared by reference. Each allows one request
//! in flight at a time; overlapping calls are rejected with
//! [`StoreError::Busy`].

mod guard;
mod row;

pub mod entity;
pub mod error;
pub mod media;
pub mod pets;
pub mod selection;
pub mod session;

pub use entity::EntityStore;
pub use error::{MutationResult, StoreError};
pub use media::{Media, SignedUrl};
pub use pets::PetStore;
pub use selection::Selection;
pub use session::SessionStore;

#[cfg(test)]
mod tests;
