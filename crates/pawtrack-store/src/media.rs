//! Pet photos and document files in blob storage.
//!
//! Objects are private. Rows store the object path, and a short-lived signed
//! URL is requested whenever the file is to be shown or downloaded.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use pawtrack_core::{
  Gateway,
  document::{DEFAULT_CONTENT_TYPE, Document, NewDocument},
};
use tracing::debug;
use uuid::Uuid;

use crate::{
  entity::EntityStore,
  error::{MutationResult, StoreError},
};

pub const BUCKET: &str = "pets";
pub const DEFAULT_URL_TTL_SECS: u64 = 3600;

const PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// A readable URL for a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
  pub url:        String,
  /// `None` for URLs that never expire.
  pub expires_at: Option<DateTime<Utc>>,
}

impl SignedUrl {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.expires_at.is_some_and(|at| now >= at)
  }
}

/// Where an upload landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
  pub path:         String,
  pub content_type: String,
  pub size:         u64,
}

pub struct Media<G> {
  gateway:     Arc<G>,
  ttl_seconds: u64,
}

impl<G: Gateway> Media<G> {
  pub fn new(gateway: Arc<G>) -> Self {
    Self { gateway, ttl_seconds: DEFAULT_URL_TTL_SECS }
  }

  /// Lifetime of URLs handed out by [`Self::resolve_url`].
  pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
    self.ttl_seconds = ttl_seconds;
    self
  }

  pub fn ttl_seconds(&self) -> u64 { self.ttl_seconds }

  /// Store a JPEG photo and return its path, ready for `Pet::photo_url`.
  pub async fn upload_pet_photo(&self, bytes: Bytes) -> MutationResult<String> {
    let path = format!("pet-photos/{}.jpg", Utc::now().timestamp_millis());
    let stored = self.upload(path, bytes, PHOTO_CONTENT_TYPE.to_owned()).await?;
    Ok(stored.path)
  }

  /// Store a file under the pet's document folder.
  pub async fn upload_document(
    &self,
    pet_id: Uuid,
    file_name: &str,
    bytes: Bytes,
    content_type: Option<String>,
  ) -> MutationResult<StoredObject> {
    let path = format!(
      "documents/{pet_id}/{}-{}",
      Utc::now().timestamp_millis(),
      file_name.replace('/', "_")
    );
    let content_type =
      content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned());
    self.upload(path, bytes, content_type).await
  }

  /// Upload a file and create the `documents` row that points at it.
  ///
  /// The draft's file fields are filled in from the upload. If the row
  /// cannot be created the uploaded object is left in place.
  pub async fn attach_document(
    &self,
    documents: &EntityStore<G, Document>,
    mut draft: NewDocument,
    file_name: &str,
    bytes: Bytes,
    content_type: Option<String>,
  ) -> MutationResult<Document> {
    if draft.name.trim().is_empty() {
      draft.name = file_name.to_owned();
    }
    let stored = self
      .upload_document(draft.pet_id, file_name, bytes, content_type)
      .await?;
    draft.file_url = stored.path;
    draft.file_type = stored.content_type;
    draft.file_size = stored.size;
    documents.create(draft).await
  }

  /// A URL the caller can fetch `path` from.
  ///
  /// Absolute `http(s)` URLs are returned unchanged. Anything else is treated
  /// as a storage path and signed; the result must be re-requested once it
  /// expires.
  pub async fn resolve_url(&self, path: &str) -> MutationResult<SignedUrl> {
    if path.starts_with("http://") || path.starts_with("https://") {
      return Ok(SignedUrl { url: path.to_owned(), expires_at: None });
    }

    let issued = Utc::now();
    let url = self
      .gateway
      .signed_url(BUCKET, path.to_owned(), self.ttl_seconds)
      .await
      .map_err(StoreError::gateway)?;
    // Lifetimes past the end of the calendar are clamped to it.
    let expires_at = i64::try_from(self.ttl_seconds)
      .ok()
      .and_then(Duration::try_seconds)
      .and_then(|ttl| issued.checked_add_signed(ttl))
      .unwrap_or(DateTime::<Utc>::MAX_UTC);
    Ok(SignedUrl { url, expires_at: Some(expires_at) })
  }

  async fn upload(
    &self,
    path: String,
    bytes: Bytes,
    content_type: String,
  ) -> MutationResult<StoredObject> {
    if self
      .gateway
      .current_user()
      .await
      .map_err(StoreError::gateway)?
      .is_none()
    {
      return Err(StoreError::Unauthenticated);
    }

    let size = bytes.len() as u64;
    self
      .gateway
      .upload_blob(BUCKET, path.clone(), bytes, content_type.clone())
      .await
      .map_err(StoreError::gateway)?;
    debug!(%path, size, "uploaded");
    Ok(StoredObject { path, content_type, size })
  }
}
