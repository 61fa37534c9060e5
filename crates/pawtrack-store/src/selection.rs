//! The focused record of a collection.
//!
//! Only the identifier is held. Reads resolve it against the live collection,
//! so an update made anywhere is visible through the selection immediately
//! and a removal empties it.

use pawtrack_core::Record;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
  #[default]
  Empty,
  Focused(Uuid),
}

impl Selection {
  pub fn id(&self) -> Option<Uuid> {
    match self {
      Self::Empty => None,
      Self::Focused(id) => Some(*id),
    }
  }

  pub fn is_focused_on(&self, id: Uuid) -> bool { self.id() == Some(id) }

  pub(crate) fn focus(&mut self, id: Uuid) { *self = Self::Focused(id); }

  pub(crate) fn clear(&mut self) { *self = Self::Empty; }

  /// `Focused(id)` becomes `Empty`; anything else is left alone.
  pub(crate) fn removed(&mut self, id: Uuid) {
    if self.is_focused_on(id) {
      self.clear();
    }
  }

  /// Drop the focus if its record is not in `records`.
  pub(crate) fn retain_in<R: Record>(&mut self, records: &[R]) {
    if let Some(id) = self.id()
      && !records.iter().any(|r| r.id() == id)
    {
      self.clear();
    }
  }

  /// The focused record as it currently stands in `records`.
  pub fn resolve<'a, R: Record>(&self, records: &'a [R]) -> Option<&'a R> {
    let id = self.id()?;
    records.iter().find(|r| r.id() == id)
  }
}
