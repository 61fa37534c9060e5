//! Store behaviour against an in-memory SQLite backend.
//!
//! [`Flaky`] wraps the real gateway so tests can fail the next call, hold an
//! insert open, and count how many requests actually went out.

use std::sync::{
  Arc,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};
use pawtrack_core::{
  Auth, AuthUser, Filter, Gateway, OrderBy, Row, Scope,
  document::{Document, DocumentType, NewDocument},
  expense::{Expense, ExpenseCategory, NewExpense},
  pet::{NewPet, NewWeightRecord, Pet, PetKind, PetPatch, WeightRecord, WeightUnit},
  summary::{DateWindow, format_amount, summarize},
  user::{PROFILES_TABLE, SignIn, SignUp},
  CalendarDate,
};
use pawtrack_gateway_sqlite::SqliteGateway;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::{
  EntityStore, Media, PetStore, Selection, SessionStore, StoreError,
  media::BUCKET,
};

// ─── Test gateway ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum FlakyError {
  #[error("{0}")]
  Injected(String),
  #[error(transparent)]
  Inner(#[from] pawtrack_gateway_sqlite::Error),
}

struct Flaky {
  inner:         SqliteGateway,
  fail:          Mutex<Option<String>>,
  hold:          Mutex<Option<oneshot::Receiver<()>>>,
  calls:         AtomicUsize,
  inserts:       AtomicUsize,
  /// Create a bare profile row on sign-up, the way a database trigger would.
  seed_profiles: AtomicBool,
}

impl Flaky {
  fn new(inner: SqliteGateway) -> Self {
    Self {
      inner,
      fail: Mutex::new(None),
      hold: Mutex::new(None),
      calls: AtomicUsize::new(0),
      inserts: AtomicUsize::new(0),
      seed_profiles: AtomicBool::new(false),
    }
  }

  /// Make the next table or storage call fail with `message`.
  fn fail_next(&self, message: &str) { *self.fail.lock() = Some(message.to_owned()); }

  /// Keep the next insert pending until `release` fires.
  fn hold_next_insert(&self, release: oneshot::Receiver<()>) {
    *self.hold.lock() = Some(release);
  }

  fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

  fn inserts(&self) -> usize { self.inserts.load(Ordering::SeqCst) }

  fn enter(&self) -> Result<(), FlakyError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    match self.fail.lock().take() {
      Some(message) => Err(FlakyError::Injected(message)),
      None => Ok(()),
    }
  }
}

impl Gateway for Flaky {
  type Error = FlakyError;

  async fn query(
    &self,
    table: &'static str,
    filter: Filter,
    order: OrderBy,
  ) -> Result<Vec<Row>, FlakyError> {
    self.enter()?;
    Ok(self.inner.query(table, filter, order).await?)
  }

  async fn insert(&self, table: &'static str, fields: Row) -> Result<Row, FlakyError> {
    self.enter()?;
    let hold = self.hold.lock().take();
    if let Some(release) = hold {
      let _ = release.await;
    }
    self.inserts.fetch_add(1, Ordering::SeqCst);
    Ok(self.inner.insert(table, fields).await?)
  }

  async fn upsert(&self, table: &'static str, fields: Row) -> Result<Row, FlakyError> {
    self.enter()?;
    Ok(self.inner.upsert(table, fields).await?)
  }

  async fn update(
    &self,
    table: &'static str,
    id: Uuid,
    fields: Row,
  ) -> Result<Option<Row>, FlakyError> {
    self.enter()?;
    Ok(self.inner.update(table, id, fields).await?)
  }

  async fn delete(&self, table: &'static str, id: Uuid) -> Result<(), FlakyError> {
    self.enter()?;
    Ok(self.inner.delete(table, id).await?)
  }

  async fn upload_blob(
    &self,
    bucket: &'static str,
    path: String,
    bytes: Bytes,
    content_type: String,
  ) -> Result<(), FlakyError> {
    self.enter()?;
    Ok(self.inner.upload_blob(bucket, path, bytes, content_type).await?)
  }

  async fn signed_url(
    &self,
    bucket: &'static str,
    path: String,
    ttl_seconds: u64,
  ) -> Result<String, FlakyError> {
    self.enter()?;
    Ok(self.inner.signed_url(bucket, path, ttl_seconds).await?)
  }

  async fn current_user(&self) -> Result<Option<AuthUser>, FlakyError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.inner.current_user().await?)
  }
}

impl Auth for Flaky {
  async fn sign_up(
    &self,
    email: String,
    password: String,
    name: String,
  ) -> Result<AuthUser, FlakyError> {
    let user = self.inner.sign_up(email, password, name).await?;
    if self.seed_profiles.load(Ordering::SeqCst) {
      let mut profile = Row::new();
      profile.insert("id".into(), user.id.to_string().into());
      profile.insert("email".into(), user.email.clone().into());
      self.inner.insert(PROFILES_TABLE, profile).await?;
    }
    Ok(user)
  }

  async fn sign_in(&self, email: String, password: String) -> Result<AuthUser, FlakyError> {
    Ok(self.inner.sign_in(email, password).await?)
  }

  async fn sign_out(&self) -> Result<(), FlakyError> { Ok(self.inner.sign_out().await?) }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

async fn signed_in() -> Arc<Flaky> {
  let inner = SqliteGateway::open_in_memory()
    .await
    .expect("in-memory gateway");
  inner
    .sign_up("owner@example.com".into(), "password1".into(), "Owner".into())
    .await
    .expect("sign up");
  Arc::new(Flaky::new(inner))
}

async fn pet_store() -> (Arc<Flaky>, EntityStore<Flaky, Pet>) {
  let gateway = signed_in().await;
  let store = EntityStore::new(gateway.clone());
  store.load(Scope::CurrentUser).await;
  (gateway, store)
}

fn at(day: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap()
}

fn weight(pet_id: Uuid, kg: f64, day: u32) -> NewWeightRecord {
  NewWeightRecord {
    pet_id,
    weight: kg,
    weight_unit: WeightUnit::Kg,
    recorded_at: at(day),
    notes: None,
  }
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_prepends_the_server_row() {
  let (gateway, store) = pet_store().await;

  let rex = store.create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  let tom = store.create(NewPet::new("Tom", PetKind::Cat)).await.unwrap();

  let records = store.records();
  assert_eq!(records.len(), 2);
  assert_eq!(records[0].id, tom.id);
  assert_eq!(records[1].id, rex.id);
  assert_eq!(records.iter().filter(|p| p.id == tom.id).count(), 1);

  // The id is the backend's, not one made up locally.
  let user = gateway.current_user().await.unwrap().unwrap();
  let rows = gateway
    .inner
    .query("pets", Filter::eq("user_id", user.id.to_string()), OrderBy::NEWEST_FIRST)
    .await
    .unwrap();
  assert_eq!(rows[0]["id"], tom.id.to_string());
  assert_eq!(tom.user_id, user.id);
  assert!(store.last_error().is_none());
}

#[tokio::test]
async fn create_without_session_sends_nothing() {
  let (gateway, store) = pet_store().await;
  gateway.inner.sign_out().await.unwrap();

  let err = store.create(NewPet::new("Rex", PetKind::Dog)).await.unwrap_err();
  assert_eq!(err, StoreError::Unauthenticated);
  assert_eq!(err.to_string(), "Not authenticated");
  assert_eq!(gateway.inserts(), 0);
  assert!(store.is_empty());
}

#[tokio::test]
async fn create_validates_before_any_request() {
  let (gateway, store) = pet_store().await;
  let before = gateway.calls();

  let err = store.create(NewPet::new("  ", PetKind::Dog)).await.unwrap_err();
  assert_eq!(err, StoreError::ValidationFailed {
    field:   "name",
    message: "Pet name is required".into(),
  });
  assert_eq!(gateway.calls(), before);
  assert_eq!(store.last_error().as_deref(), Some("Pet name is required"));
}

#[tokio::test]
async fn create_surfaces_gateway_message_verbatim() {
  let (gateway, store) = pet_store().await;
  store.create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  let before = store.records();

  gateway.fail_next("new row violates row-level security policy");
  let err = store.create(NewPet::new("Tom", PetKind::Cat)).await.unwrap_err();

  assert_eq!(err.to_string(), "new row violates row-level security policy");
  assert_eq!(store.records().len(), before.len());
  assert_eq!(store.records()[0].id, before[0].id);
}

// ─── Update / delete ─────────────────────────────────────────────────────────

#[tokio::test]
async fn rename_then_delete_the_focused_pet() {
  let (_gateway, store) = pet_store().await;
  let a = store.create(NewPet::new("PetA", PetKind::Dog)).await.unwrap();
  let b = store.create(NewPet::new("PetB", PetKind::Cat)).await.unwrap();
  store.select(Some(a.id)).unwrap();

  let patch = PetPatch { name: Some("PetA renamed".into()), ..PetPatch::default() };
  let renamed = store.update(a.id, patch).await.unwrap();

  assert_eq!(renamed.name, "PetA renamed");
  assert!(renamed.updated_at.is_some());
  assert_eq!(store.get(a.id), Some(renamed.clone()));
  assert_eq!(store.get(b.id), Some(b.clone()));
  assert_eq!(store.len(), 2);
  assert_eq!(store.selected(), Some(renamed));

  store.delete(a.id).await.unwrap();
  assert_eq!(store.records(), vec![b]);
  assert_eq!(store.selection(), Selection::Empty);
  assert!(store.selected().is_none());
}

#[tokio::test]
async fn update_keeps_fields_the_patch_left_out() {
  let (_gateway, store) = pet_store().await;
  let mut draft = NewPet::new("Rex", PetKind::Dog);
  draft.breed = Some("Labrador".into());
  let rex = store.create(draft).await.unwrap();

  let patch = PetPatch { weight: Some(31.5), ..PetPatch::default() };
  let updated = store.update(rex.id, patch).await.unwrap();

  assert_eq!(updated.breed.as_deref(), Some("Labrador"));
  assert_eq!(updated.weight, Some(31.5));
  assert_eq!(updated.created_at, rex.created_at);
}

#[tokio::test]
async fn update_of_a_vanished_row_is_not_found() {
  let (gateway, store) = pet_store().await;
  let rex = store.create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  gateway.inner.delete("pets", rex.id).await.unwrap();

  let patch = PetPatch { name: Some("Max".into()), ..PetPatch::default() };
  let err = store.update(rex.id, patch).await.unwrap_err();
  assert_eq!(err, StoreError::NotFound { id: rex.id });
  assert_eq!(store.get(rex.id), Some(rex));
}

#[tokio::test]
async fn failed_update_changes_nothing() {
  let (gateway, store) = pet_store().await;
  let rex = store.create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  store.select(Some(rex.id)).unwrap();

  gateway.fail_next("connection reset");
  let patch = PetPatch { name: Some("Max".into()), ..PetPatch::default() };
  let err = store.update(rex.id, patch).await.unwrap_err();

  assert_eq!(err, StoreError::Gateway { message: "connection reset".into() });
  assert_eq!(store.get(rex.id), Some(rex.clone()));
  assert_eq!(store.selected(), Some(rex));
}

#[tokio::test]
async fn invalid_patch_is_rejected_locally() {
  let (gateway, store) = pet_store().await;
  let rex = store.create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  let before = gateway.calls();

  let patch = PetPatch { weight: Some(-2.0), ..PetPatch::default() };
  let err = store.update(rex.id, patch).await.unwrap_err();
  assert!(matches!(err, StoreError::ValidationFailed { field: "weight", .. }));
  assert_eq!(gateway.calls(), before);
}

#[tokio::test]
async fn delete_removes_exactly_one() {
  let (_gateway, store) = pet_store().await;
  let a = store.create(NewPet::new("A", PetKind::Dog)).await.unwrap();
  store.create(NewPet::new("B", PetKind::Dog)).await.unwrap();
  store.create(NewPet::new("C", PetKind::Dog)).await.unwrap();

  store.delete(a.id).await.unwrap();
  assert_eq!(store.len(), 2);
  assert!(store.get(a.id).is_none());
}

#[tokio::test]
async fn deleting_an_absent_id_is_a_no_op() {
  let (_gateway, store) = pet_store().await;
  store.create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  let before = store.records();

  store.delete(Uuid::new_v4()).await.unwrap();
  assert_eq!(store.records(), before);
}

#[tokio::test]
async fn failed_delete_keeps_the_record() {
  let (gateway, store) = pet_store().await;
  let rex = store.create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  store.select(Some(rex.id)).unwrap();

  gateway.fail_next("permission denied");
  assert!(store.delete(rex.id).await.is_err());
  assert_eq!(store.len(), 1);
  assert_eq!(store.selection(), Selection::Focused(rex.id));
}

// ─── Load ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_reads_back_newest_first() {
  let (gateway, store) = pet_store().await;
  let a = store.create(NewPet::new("A", PetKind::Dog)).await.unwrap();
  let b = store.create(NewPet::new("B", PetKind::Dog)).await.unwrap();

  let fresh = EntityStore::<_, Pet>::new(gateway);
  fresh.load(Scope::CurrentUser).await;
  let ids: Vec<_> = fresh.records().iter().map(|p| p.id).collect();
  assert_eq!(ids, vec![b.id, a.id]);
  assert_eq!(fresh.scope(), Some(Scope::CurrentUser));
}

#[tokio::test]
async fn load_failure_is_reported_on_the_side() {
  let (gateway, store) = pet_store().await;
  store.create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  let before = store.records();

  gateway.fail_next("network unreachable");
  store.load(Scope::CurrentUser).await;

  assert_eq!(store.records(), before);
  assert_eq!(store.last_error().as_deref(), Some("network unreachable"));
  assert!(!store.is_busy());

  store.load(Scope::CurrentUser).await;
  assert!(store.last_error().is_none());
}

#[tokio::test]
async fn load_without_session_does_nothing() {
  let gateway = Arc::new(Flaky::new(SqliteGateway::open_in_memory().await.unwrap()));
  let store = EntityStore::<_, Pet>::new(gateway);
  store.load(Scope::CurrentUser).await;
  assert!(store.is_empty());
  assert!(store.scope().is_none());
  assert!(store.last_error().is_none());
}

#[tokio::test]
async fn child_records_cannot_load_for_the_user() {
  let gateway = signed_in().await;
  let store = EntityStore::<_, WeightRecord>::new(gateway.clone());
  let before = gateway.calls();

  store.load(Scope::CurrentUser).await;
  assert!(store.last_error().is_some());
  assert_eq!(gateway.calls(), before);
}

#[tokio::test]
async fn reload_drops_a_selection_that_is_gone() {
  let (gateway, store) = pet_store().await;
  let rex = store.create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  store.select(Some(rex.id)).unwrap();

  gateway.inner.delete("pets", rex.id).await.unwrap();
  store.load(Scope::CurrentUser).await;

  assert!(store.is_empty());
  assert_eq!(store.selection(), Selection::Empty);
}

// ─── Selection ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn selecting_an_unknown_id_is_rejected() {
  let (_gateway, store) = pet_store().await;
  let rex = store.create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  store.select(Some(rex.id)).unwrap();

  let stranger = Uuid::new_v4();
  assert_eq!(store.select(Some(stranger)), Err(StoreError::NotFound { id: stranger }));
  assert_eq!(store.selection(), Selection::Focused(rex.id));

  store.select(None).unwrap();
  assert_eq!(store.selection(), Selection::Empty);
}

// ─── Busy guard ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn overlapping_request_is_rejected_without_a_call() {
  let (gateway, store) = pet_store().await;
  let (release, held) = oneshot::channel();
  gateway.hold_next_insert(held);

  let first = store.create(NewPet::new("Rex", PetKind::Dog));
  let second = async {
    assert!(store.is_busy());
    let calls = gateway.calls();
    let result = store.create(NewPet::new("Tom", PetKind::Cat)).await;
    assert_eq!(gateway.calls(), calls);
    let _ = release.send(());
    result
  };
  let (first, second) = tokio::join!(first, second);

  assert!(first.is_ok());
  assert_eq!(second.unwrap_err(), StoreError::Busy);
  assert_eq!(gateway.inserts(), 1);
  assert_eq!(store.len(), 1);
  assert!(!store.is_busy());
}

// ─── Chronological collections ───────────────────────────────────────────────

#[tokio::test]
async fn back_dated_weight_is_sorted_into_place() {
  let gateway = signed_in().await;
  let pets = PetStore::new(gateway);
  pets.refresh().await;
  let rex = pets.pets().create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  pets.focus(Some(rex.id)).await.unwrap();

  for (kg, day) in [(30.0, 10), (28.0, 2), (29.0, 6)] {
    pets.weights().create(weight(rex.id, kg, day)).await.unwrap();
  }

  let history: Vec<_> = pets.weights().records().iter().map(|w| w.weight).collect();
  assert_eq!(history, vec![28.0, 29.0, 30.0]);
}

#[tokio::test]
async fn rescheduled_weight_moves() {
  let gateway = signed_in().await;
  let pets = PetStore::new(gateway);
  let rex = pets.pets().create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  pets.focus(Some(rex.id)).await.unwrap();
  let early = pets.weights().create(weight(rex.id, 28.0, 1)).await.unwrap();
  pets.weights().create(weight(rex.id, 29.0, 5)).await.unwrap();

  let patch = pawtrack_core::pet::WeightRecordPatch {
    recorded_at: Some(at(9)),
    ..Default::default()
  };
  pets.weights().update(early.id, patch).await.unwrap();

  let history: Vec<_> = pets.weights().records().iter().map(|w| w.weight).collect();
  assert_eq!(history, vec![29.0, 28.0]);
}

#[tokio::test]
async fn weights_of_another_pet_stay_out_of_view() {
  let gateway = signed_in().await;
  let pets = PetStore::new(gateway);
  let rex = pets.pets().create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  let tom = pets.pets().create(NewPet::new("Tom", PetKind::Cat)).await.unwrap();
  pets.focus(Some(rex.id)).await.unwrap();

  pets.weights().create(weight(tom.id, 4.0, 1)).await.unwrap();
  assert!(pets.weights().is_empty());

  pets.focus(Some(tom.id)).await.unwrap();
  assert_eq!(pets.weights().len(), 1);
}

#[tokio::test]
async fn deleting_the_focused_pet_clears_its_history() {
  let gateway = signed_in().await;
  let pets = PetStore::new(gateway);
  let rex = pets.pets().create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  pets.focus(Some(rex.id)).await.unwrap();
  pets.weights().create(weight(rex.id, 30.0, 1)).await.unwrap();

  pets.delete_pet(rex.id).await.unwrap();
  assert!(pets.selected_pet().is_none());
  assert!(pets.weights().is_empty());
  assert!(pets.weights().scope().is_none());
}

#[tokio::test]
async fn expenses_feed_the_monthly_summary() {
  let gateway = signed_in().await;
  let pets = PetStore::new(gateway.clone());
  let rex = pets.pets().create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  let expenses = EntityStore::<_, Expense>::new(gateway);
  expenses.load(Scope::Parent(rex.id)).await;

  let this_month = CalendarDate::from_ymd(2024, 5, 1).unwrap();
  let last_month = CalendarDate::from_ymd(2024, 4, 1).unwrap();
  expenses
    .create(NewExpense::new(rex.id, ExpenseCategory::Vet, 25.0, "Checkup", last_month))
    .await
    .unwrap();
  expenses
    .create(NewExpense::new(rex.id, ExpenseCategory::Food, 10.0, "Kibble", this_month))
    .await
    .unwrap();

  let summary =
    expenses.with_records(|all| summarize(all, DateWindow::month_of(this_month)));
  assert_eq!(format_amount(summary.window_total), "10.00");
  assert_eq!(format_amount(summary.total), "35.00");
  assert_eq!(summary.by_category[&ExpenseCategory::Food], 10.0);
  assert_eq!(summary.by_category[&ExpenseCategory::Vet], 25.0);

  // Newest date first.
  assert_eq!(expenses.records()[0].date, this_month);
}

// ─── Session ─────────────────────────────────────────────────────────────────

fn sign_up_form(password: &str) -> SignUp {
  SignUp {
    name:     "Sam".into(),
    email:    "sam@example.com".into(),
    password: password.into(),
  }
}

#[tokio::test]
async fn sign_up_validates_first() {
  let gateway = Arc::new(SqliteGateway::open_in_memory().await.unwrap());
  let session = SessionStore::new(gateway.clone());

  let err = session.sign_up(sign_up_form("short")).await.unwrap_err();
  assert_eq!(err.to_string(), "Password must be at least 8 characters");
  assert!(gateway.current_user().await.unwrap().is_none());
}

#[tokio::test]
async fn sign_up_writes_the_profile() {
  let gateway = Arc::new(SqliteGateway::open_in_memory().await.unwrap());
  let session = SessionStore::new(gateway.clone());

  let user = session
    .sign_up(sign_up_form("password1"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(user.name, "Sam");
  assert_eq!(user.email, "sam@example.com");
  assert_eq!(session.user(), Some(user.clone()));

  // A fresh store picks the session and profile up.
  let restored = SessionStore::new(gateway);
  assert!(!restored.is_initialized());
  restored.initialize().await;
  assert!(restored.is_initialized());
  assert_eq!(restored.user().map(|u| u.name), Some("Sam".into()));
}

#[tokio::test]
async fn sign_up_fills_in_a_profile_the_backend_created() {
  let gateway = Arc::new(Flaky::new(SqliteGateway::open_in_memory().await.unwrap()));
  gateway.seed_profiles.store(true, Ordering::SeqCst);
  let session = SessionStore::new(gateway.clone());

  let user = session
    .sign_up(sign_up_form("password1"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(user.name, "Sam");

  let rows = gateway
    .inner
    .query(PROFILES_TABLE, Filter::eq("id", user.id.to_string()), OrderBy::NEWEST_FIRST)
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["name"], "Sam");
  assert_eq!(rows[0]["email"], "sam@example.com");
}

#[tokio::test]
async fn initialize_without_session_still_finishes() {
  let gateway = Arc::new(SqliteGateway::open_in_memory().await.unwrap());
  let session = SessionStore::new(gateway);
  session.initialize().await;
  assert!(session.is_initialized());
  assert!(!session.is_authenticated());
}

#[tokio::test]
async fn sign_in_reports_bad_credentials() {
  let gateway = Arc::new(SqliteGateway::open_in_memory().await.unwrap());
  let session = SessionStore::new(gateway);
  session.sign_up(sign_up_form("password1")).await.unwrap();
  session.sign_out().await.unwrap();
  assert!(session.user().is_none());

  let err = session
    .sign_in(SignIn { email: "sam@example.com".into(), password: "password2".into() })
    .await
    .unwrap_err();
  assert_eq!(err, StoreError::Gateway { message: "Invalid login credentials".into() });

  let user = session
    .sign_in(SignIn { email: "sam@example.com".into(), password: "password1".into() })
    .await
    .unwrap();
  assert_eq!(user.name, "Sam");
}

// ─── Media ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn photo_upload_needs_a_session() {
  let gateway = Arc::new(SqliteGateway::open_in_memory().await.unwrap());
  let media = Media::new(gateway);
  let err = media
    .upload_pet_photo(Bytes::from_static(b"jpeg"))
    .await
    .unwrap_err();
  assert_eq!(err, StoreError::Unauthenticated);
}

#[tokio::test]
async fn photo_resolves_to_an_expiring_url() {
  let gateway = Arc::new(SqliteGateway::open_in_memory().await.unwrap());
  gateway
    .sign_up("owner@example.com".into(), "password1".into(), "Owner".into())
    .await
    .unwrap();
  let media = Media::new(gateway.clone()).with_ttl(120);

  let path = media
    .upload_pet_photo(Bytes::from_static(b"jpeg"))
    .await
    .unwrap();
  assert!(path.starts_with("pet-photos/") && path.ends_with(".jpg"));

  let before = Utc::now();
  let signed = media.resolve_url(&path).await.unwrap();
  let expires_at = signed.expires_at.unwrap();
  assert!(expires_at >= before + Duration::seconds(119));
  assert!(!signed.is_expired(before));
  assert!(signed.is_expired(expires_at));

  let blob = gateway.fetch_signed(&signed.url).await.unwrap();
  assert_eq!(blob.bucket, BUCKET);
  assert_eq!(blob.content_type, "image/jpeg");
}

#[tokio::test]
async fn unbounded_ttl_still_reports_an_expiry() {
  let gateway = Arc::new(SqliteGateway::open_in_memory().await.unwrap());
  gateway
    .sign_up("owner@example.com".into(), "password1".into(), "Owner".into())
    .await
    .unwrap();
  let media = Media::new(gateway).with_ttl(u64::MAX);
  let path = media
    .upload_pet_photo(Bytes::from_static(b"jpeg"))
    .await
    .unwrap();

  let signed = media.resolve_url(&path).await.unwrap();
  assert_eq!(signed.expires_at, Some(DateTime::<Utc>::MAX_UTC));
  assert!(!signed.is_expired(Utc::now()));
}

#[tokio::test]
async fn legacy_urls_pass_through() {
  let gateway = signed_in().await;
  let media = Media::new(gateway.clone());
  let before = gateway.calls();

  let url = "https://cdn.example.com/rex.jpg";
  let signed = media.resolve_url(url).await.unwrap();
  assert_eq!(signed.url, url);
  assert!(signed.expires_at.is_none());
  assert_eq!(gateway.calls(), before);
}

#[tokio::test]
async fn attached_document_points_at_the_upload() {
  let gateway = signed_in().await;
  let pets = PetStore::new(gateway.clone());
  let rex = pets.pets().create(NewPet::new("Rex", PetKind::Dog)).await.unwrap();
  let documents = EntityStore::<_, Document>::new(gateway.clone());
  documents.load(Scope::Parent(rex.id)).await;
  let media = Media::new(gateway);

  let draft = NewDocument {
    pet_id:      rex.id,
    name:        String::new(),
    doc_type:    DocumentType::Vaccination,
    file_url:    String::new(),
    file_type:   String::new(),
    file_size:   0,
    notes:       None,
    expiry_date: None,
  };
  let doc = media
    .attach_document(
      &documents,
      draft,
      "rabies/2024.pdf",
      Bytes::from_static(b"%PDF"),
      Some("application/pdf".into()),
    )
    .await
    .unwrap();

  assert_eq!(doc.name, "rabies/2024.pdf");
  assert!(doc.file_url.starts_with(&format!("documents/{}/", rex.id)));
  assert!(doc.file_url.ends_with("-rabies_2024.pdf"));
  assert_eq!(doc.file_type, "application/pdf");
  assert_eq!(doc.file_size, 4);
  assert_eq!(documents.records(), vec![doc]);
}
