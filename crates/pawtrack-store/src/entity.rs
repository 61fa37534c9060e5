//! [`EntityStore`]: one collection of records mirrored from a remote table.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use pawtrack_core::{
  Filter, Gateway, OrderBy, Owner, Record, Scope, Validate,
  history::{insert_sorted, resort},
};
use parking_lot::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  error::{MutationResult, StoreError},
  guard::InFlight,
  row::{decode, encode, now_timestamp},
  selection::Selection,
};

struct State<R> {
  records:    Vec<R>,
  selection:  Selection,
  scope:      Option<Scope>,
  last_error: Option<String>,
}

impl<R> Default for State<R> {
  fn default() -> Self {
    Self {
      records:    Vec::new(),
      selection:  Selection::Empty,
      scope:      None,
      last_error: None,
    }
  }
}

/// Owns the collection of one record type and every write to it.
///
/// The collection is kept in `R::ORDER`. Reads hand out clones so no lock is
/// ever held by a caller.
pub struct EntityStore<G, R> {
  gateway: Arc<G>,
  state:   RwLock<State<R>>,
  busy:    AtomicBool,
}

impl<G: Gateway, R: Record> EntityStore<G, R> {
  pub fn new(gateway: Arc<G>) -> Self {
    Self {
      gateway,
      state: RwLock::new(State::default()),
      busy: AtomicBool::new(false),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub fn records(&self) -> Vec<R> { self.state.read().records.clone() }

  /// Run `f` over the collection without cloning it.
  pub fn with_records<T>(&self, f: impl FnOnce(&[R]) -> T) -> T {
    f(&self.state.read().records)
  }

  pub fn len(&self) -> usize { self.state.read().records.len() }

  pub fn is_empty(&self) -> bool { self.state.read().records.is_empty() }

  pub fn get(&self, id: Uuid) -> Option<R> {
    self.state.read().records.iter().find(|r| r.id() == id).cloned()
  }

  /// Whether a request is in flight.
  pub fn is_busy(&self) -> bool { self.busy.load(Ordering::Acquire) }

  /// Message of the most recent failed request, cleared by the next one that
  /// succeeds.
  pub fn last_error(&self) -> Option<String> {
    self.state.read().last_error.clone()
  }

  /// The scope of the last successful load.
  pub fn scope(&self) -> Option<Scope> { self.state.read().scope }

  pub fn selection(&self) -> Selection { self.state.read().selection }

  /// The focused record as it currently stands in the collection.
  pub fn selected(&self) -> Option<R> {
    let state = self.state.read();
    state.selection.resolve(&state.records).cloned()
  }

  // ── Selection ─────────────────────────────────────────────────────────

  /// Focus `id`, or clear the focus with `None`. Ids not in the collection
  /// are rejected and the selection is left as it was.
  pub fn select(&self, id: Option<Uuid>) -> MutationResult<()> {
    let mut state = self.state.write();
    match id {
      None => state.selection.clear(),
      Some(id) if state.records.iter().any(|r| r.id() == id) => {
        state.selection.focus(id)
      }
      Some(id) => return Err(StoreError::NotFound { id }),
    }
    Ok(())
  }

  /// Forget everything held locally.
  pub fn clear(&self) { *self.state.write() = State::default(); }

  // ── Remote operations ─────────────────────────────────────────────────

  /// Replace the collection with every record in `scope`.
  ///
  /// Failures never reach the caller: they are logged and kept in
  /// [`Self::last_error`], and the collection is left as it was. Loading
  /// [`Scope::CurrentUser`] without a session does nothing.
  pub async fn load(&self, scope: Scope) {
    let Some(_in_flight) = InFlight::acquire(&self.busy) else {
      debug!(table = R::TABLE, "load skipped, request in flight");
      return;
    };

    match self.fetch(scope).await {
      Ok(Some(records)) => {
        debug!(table = R::TABLE, count = records.len(), "loaded");
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.records = records;
        state.scope = Some(scope);
        state.selection.retain_in(&state.records);
        state.last_error = None;
      }
      Ok(None) => debug!(table = R::TABLE, "load skipped, not signed in"),
      Err(err) => {
        warn!(table = R::TABLE, %err, "load failed");
        self.state.write().last_error = Some(err.to_string());
      }
    }
  }

  /// Validate `draft`, insert it, and place the stored record in the
  /// collection.
  pub async fn create(&self, draft: R::Draft) -> MutationResult<R> {
    let _in_flight = self.claim()?;
    let result = self.try_create(draft).await;
    self.settle(result)
  }

  /// Send `patch` and replace the local entry with the row the backend
  /// returns. Fails with [`StoreError::NotFound`] if the row is gone.
  pub async fn update(&self, id: Uuid, patch: R::Patch) -> MutationResult<R> {
    let _in_flight = self.claim()?;
    let result = self.try_update(id, patch).await;
    self.settle(result)
  }

  /// Delete the record and drop it from the collection. Deleting an id that
  /// does not exist succeeds and changes nothing.
  pub async fn delete(&self, id: Uuid) -> MutationResult<()> {
    let _in_flight = self.claim()?;
    let result = self
      .gateway
      .delete(R::TABLE, id)
      .await
      .map_err(StoreError::gateway);

    if result.is_ok() {
      debug!(table = R::TABLE, %id, "deleted");
      let mut state = self.state.write();
      state.records.retain(|r| r.id() != id);
      state.selection.removed(id);
    }
    self.settle(result)
  }

  // ── Internals ─────────────────────────────────────────────────────────

  fn claim(&self) -> MutationResult<InFlight<'_>> {
    InFlight::acquire(&self.busy).ok_or(StoreError::Busy)
  }

  fn settle<T>(&self, result: MutationResult<T>) -> MutationResult<T> {
    if let Err(err) = &result {
      debug!(table = R::TABLE, %err, "request failed");
    }
    self.state.write().last_error =
      result.as_ref().err().map(ToString::to_string);
    result
  }

  async fn fetch(&self, scope: Scope) -> MutationResult<Option<Vec<R>>> {
    let owner = match (scope, R::OWNER) {
      (Scope::Parent(id), _) => id,
      (Scope::CurrentUser, Owner::User) => {
        match self.gateway.current_user().await.map_err(StoreError::gateway)? {
          Some(user) => user.id,
          None => return Ok(None),
        }
      }
      (Scope::CurrentUser, Owner::Parent(column)) => {
        return Err(StoreError::Gateway {
          message: format!("{} can only be loaded per {column}", R::TABLE),
        });
      }
    };

    let rows = self
      .gateway
      .query(R::TABLE, Filter::eq(R::OWNER.column(), owner.to_string()), R::ORDER)
      .await
      .map_err(StoreError::gateway)?;
    rows.into_iter().map(decode).collect::<MutationResult<_>>().map(Some)
  }

  async fn try_create(&self, draft: R::Draft) -> MutationResult<R> {
    draft.validate()?;
    let user = self
      .gateway
      .current_user()
      .await
      .map_err(StoreError::gateway)?
      .ok_or(StoreError::Unauthenticated)?;

    let mut fields = encode(&draft)?;
    if R::OWNER == Owner::User {
      fields.insert(Owner::User.column().into(), user.id.to_string().into());
    }

    let row = self
      .gateway
      .insert(R::TABLE, fields)
      .await
      .map_err(StoreError::gateway)?;
    let record: R = decode(row)?;
    debug!(table = R::TABLE, id = %record.id(), "created");

    self.place(record.clone());
    Ok(record)
  }

  async fn try_update(&self, id: Uuid, patch: R::Patch) -> MutationResult<R> {
    patch.validate()?;
    let mut fields = encode(&patch)?;
    if R::TRACKS_UPDATES {
      fields.insert("updated_at".into(), now_timestamp());
    }

    let row = self
      .gateway
      .update(R::TABLE, id, fields)
      .await
      .map_err(StoreError::gateway)?
      .ok_or(StoreError::NotFound { id })?;
    let record: R = decode(row)?;
    debug!(table = R::TABLE, %id, "updated");

    let mut state = self.state.write();
    if let Some(slot) = state.records.iter_mut().find(|r| r.id() == id) {
      *slot = record.clone();
      if R::ORDER != OrderBy::NEWEST_FIRST {
        resort(&mut state.records, R::ORDER.direction, R::sort_key);
      }
    }
    Ok(record)
  }

  /// Put a freshly created record where the ordering says it belongs. Records
  /// outside the loaded parent scope are not shown.
  fn place(&self, record: R) {
    let mut state = self.state.write();
    if let Some(Scope::Parent(parent)) = state.scope
      && record.owner_id() != parent
    {
      return;
    }

    state.records.retain(|r| r.id() != record.id());
    if R::ORDER == OrderBy::NEWEST_FIRST {
      state.records.insert(0, record);
    } else {
      insert_sorted(&mut state.records, record, R::ORDER.direction, R::sort_key);
    }
  }
}
