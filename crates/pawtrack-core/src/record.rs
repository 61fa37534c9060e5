//! The [`Record`] trait and the metadata a store needs to keep a collection
//! of records in sync with its remote table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::validate::Validate;

// ─── Ownership ───────────────────────────────────────────────────────────────

/// Which foreign key ties a record to the thing that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
  /// Owned by the authenticated user through `user_id`. The store fills the
  /// column in from the session on create.
  User,
  /// Owned by another record through the named column, supplied in the draft.
  Parent(&'static str),
}

impl Owner {
  pub fn column(&self) -> &'static str {
    match self {
      Self::User => "user_id",
      Self::Parent(column) => column,
    }
  }
}

/// What a collection is loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  /// Records owned by whoever is signed in.
  CurrentUser,
  /// Records whose owner column equals this id.
  Parent(Uuid),
}

// ─── Ordering ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Ascending,
  Descending,
}

impl Direction {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Ascending => "asc",
      Self::Descending => "desc",
    }
  }
}

/// Column and direction a collection is kept sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
  pub column:    &'static str,
  pub direction: Direction,
}

impl OrderBy {
  /// Most recently created first; new records are prepended.
  pub const NEWEST_FIRST: OrderBy = OrderBy::desc("created_at");

  pub const fn asc(column: &'static str) -> Self {
    Self { column, direction: Direction::Ascending }
  }

  pub const fn desc(column: &'static str) -> Self {
    Self { column, direction: Direction::Descending }
  }
}

impl fmt::Display for OrderBy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.column, self.direction.as_str())
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted row of one remote table.
///
/// Identifiers and `created_at` are always assigned by the backend; drafts
/// never carry them.
pub trait Record:
  Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
  /// Fields accepted on create.
  type Draft: Validate + Serialize + Send + Sync;
  /// Partial fields accepted on update. Absent fields are left untouched by
  /// the backend.
  type Patch: Validate + Serialize + Send + Sync;

  const TABLE: &'static str;
  const OWNER: Owner;
  const ORDER: OrderBy;
  /// Whether the table carries an `updated_at` column that the client
  /// refreshes on every update.
  const TRACKS_UPDATES: bool = false;

  fn id(&self) -> Uuid;

  /// Value of the owner column.
  fn owner_id(&self) -> Uuid;

  /// Value of [`Self::ORDER`]'s column, as an instant.
  fn sort_key(&self) -> DateTime<Utc>;
}
