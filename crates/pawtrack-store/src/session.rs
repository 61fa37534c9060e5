//! [`SessionStore`]: who is signed in.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use chrono::Utc;
use pawtrack_core::{
  Auth, AuthUser, Filter, OrderBy, Validate,
  user::{NewProfile, PROFILES_TABLE, Profile, SignIn, SignUp, User},
};
use parking_lot::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  error::{MutationResult, StoreError},
  guard::InFlight,
  row::{decode, encode},
};

pub struct SessionStore<G> {
  gateway:     Arc<G>,
  user:        RwLock<Option<User>>,
  initialized: AtomicBool,
  busy:        AtomicBool,
}

impl<G: Auth> SessionStore<G> {
  pub fn new(gateway: Arc<G>) -> Self {
    Self {
      gateway,
      user: RwLock::new(None),
      initialized: AtomicBool::new(false),
      busy: AtomicBool::new(false),
    }
  }

  pub fn user(&self) -> Option<User> { self.user.read().clone() }

  pub fn is_authenticated(&self) -> bool { self.user.read().is_some() }

  /// Whether [`Self::initialize`] has run, successfully or not.
  pub fn is_initialized(&self) -> bool {
    self.initialized.load(Ordering::Acquire)
  }

  pub fn is_busy(&self) -> bool { self.busy.load(Ordering::Acquire) }

  /// Pick up a session the gateway already holds.
  pub async fn initialize(&self) {
    let Some(_in_flight) = InFlight::acquire(&self.busy) else {
      return;
    };
    match self.gateway.current_user().await {
      Ok(Some(auth)) => {
        let user = self.with_profile(auth).await;
        *self.user.write() = Some(user);
      }
      Ok(None) => debug!("no existing session"),
      Err(err) => warn!(%err, "failed to restore session"),
    }
    self.initialized.store(true, Ordering::Release);
  }

  /// Register an account and write its profile row. A profile the backend
  /// already created for the account is filled in rather than duplicated.
  ///
  /// Returns the user when the backend signs them in straight away, and
  /// `None` when the account still needs confirming.
  pub async fn sign_up(&self, form: SignUp) -> MutationResult<Option<User>> {
    let _in_flight = self.claim()?;
    form.validate()?;

    let auth = self
      .gateway
      .sign_up(form.email.trim().to_owned(), form.password, form.name.clone())
      .await
      .map_err(StoreError::gateway)?;
    debug!(user = %auth.id, "signed up");

    let profile = NewProfile {
      id:         auth.id,
      name:       form.name.trim().to_owned(),
      email:      auth.email.clone(),
      created_at: Utc::now(),
    };
    if let Err(err) = self.upsert_profile(&profile).await {
      warn!(user = %auth.id, %err, "failed to write profile");
    }

    let session = self
      .gateway
      .current_user()
      .await
      .map_err(StoreError::gateway)?;
    let user = match session {
      Some(auth) => Some(self.with_profile(auth).await),
      None => None,
    };
    *self.user.write() = user.clone();
    Ok(user)
  }

  pub async fn sign_in(&self, form: SignIn) -> MutationResult<User> {
    let _in_flight = self.claim()?;
    form.validate()?;

    let auth = self
      .gateway
      .sign_in(form.email.trim().to_owned(), form.password)
      .await
      .map_err(StoreError::gateway)?;
    debug!(user = %auth.id, "signed in");

    let user = self.with_profile(auth).await;
    *self.user.write() = Some(user.clone());
    Ok(user)
  }

  /// End the session. The local user is cleared even if the backend call
  /// fails.
  pub async fn sign_out(&self) -> MutationResult<()> {
    let _in_flight = self.claim()?;
    let result = self.gateway.sign_out().await.map_err(StoreError::gateway);
    *self.user.write() = None;
    result
  }

  fn claim(&self) -> MutationResult<InFlight<'_>> {
    InFlight::acquire(&self.busy).ok_or(StoreError::Busy)
  }

  async fn upsert_profile(&self, profile: &NewProfile) -> MutationResult<()> {
    let fields = encode(profile)?;
    self
      .gateway
      .upsert(PROFILES_TABLE, fields)
      .await
      .map_err(StoreError::gateway)?;
    Ok(())
  }

  async fn with_profile(&self, auth: AuthUser) -> User {
    let profile = match self.fetch_profile(auth.id).await {
      Ok(profile) => profile,
      Err(err) => {
        warn!(user = %auth.id, %err, "failed to load profile");
        None
      }
    };
    User::from_parts(auth, profile)
  }

  async fn fetch_profile(&self, id: Uuid) -> MutationResult<Option<Profile>> {
    let rows = self
      .gateway
      .query(PROFILES_TABLE, Filter::eq("id", id.to_string()), OrderBy::NEWEST_FIRST)
      .await
      .map_err(StoreError::gateway)?;
    rows.into_iter().next().map(decode).transpose()
  }
}
