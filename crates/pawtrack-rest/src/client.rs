//! [`RestGateway`] — async HTTP implementation of [`Gateway`] and [`Auth`].

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use parking_lot::RwLock;
use pawtrack_core::{Auth, AuthUser, Filter, Gateway, OrderBy, Row};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use crate::{Error, Result};

const INSERT_PREFER: &str = "return=representation";
const UPSERT_PREFER: &str = "return=representation,resolution=merge-duplicates";

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct RestConfig {
  /// Project URL, e.g. `https://abc.example.co`.
  pub url:      String,
  /// Public anon key sent as `apikey` on every request.
  pub anon_key: String,
  pub timeout:  Duration,
}

impl RestConfig {
  pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
    Self {
      url:      url.into().trim_end_matches('/').to_owned(),
      anon_key: anon_key.into(),
      timeout:  Duration::from_secs(30),
    }
  }
}

#[derive(Debug, Clone)]
struct Session {
  access_token: String,
  user:         AuthUser,
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
  user:         AuthUser,
}

#[derive(Deserialize)]
struct SignedUrlResponse {
  #[serde(rename = "signedURL")]
  signed_url: String,
}

/// Async HTTP client for the hosted backend.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based, and clones
/// share the session.
#[derive(Clone)]
pub struct RestGateway {
  client:  Client,
  config:  Arc<RestConfig>,
  session: Arc<RwLock<Option<Session>>>,
}

impl RestGateway {
  pub fn new(config: RestConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self {
      client,
      config: Arc::new(config),
      session: Arc::new(RwLock::new(None)),
    })
  }

  fn table_url(&self, table: &str) -> String {
    format!("{}/rest/v1/{table}", self.config.url)
  }

  fn storage_url(&self, path: &str) -> String {
    format!("{}/storage/v1{path}", self.config.url)
  }

  fn auth_url(&self, path: &str) -> String {
    format!("{}/auth/v1{path}", self.config.url)
  }

  fn access_token(&self) -> Option<String> {
    self.session.read().as_ref().map(|s| s.access_token.clone())
  }

  /// Attach the anon key and the best bearer credential available.
  fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
    let bearer = self
      .access_token()
      .unwrap_or_else(|| self.config.anon_key.clone());
    req
      .header("apikey", &self.config.anon_key)
      .bearer_auth(bearer)
  }

  /// `POST /rest/v1/<table>` with the given `Prefer` header.
  fn post_row(&self, table: &str, fields: &Row, prefer: &'static str) -> RequestBuilder {
    self
      .authorize(self.client.post(self.table_url(table)))
      .header("Prefer", prefer)
      .json(fields)
  }

  async fn send_row(&self, table: &str, req: RequestBuilder) -> Result<Row> {
    let rows: Vec<Row> = check(req.send().await?).await?.json().await?;
    first_row(rows).ok_or_else(|| Error::Decode(format!("write to {table} returned no row")))
  }

  fn start_session(&self, token: TokenResponse) -> AuthUser {
    let user = token.user.clone();
    *self.session.write() = Some(Session {
      access_token: token.access_token,
      user:         token.user,
    });
    user
  }
}

/// Pass successful responses through; turn the rest into [`Error::Api`].
async fn check(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(Error::Api {
    status:  status.as_u16(),
    message: api_message(status, &body),
  })
}

/// The human-readable part of an error body. The backend's services disagree
/// on the field name.
fn api_message(status: StatusCode, body: &str) -> String {
  if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
    for key in ["message", "msg", "error_description", "error"] {
      if let Some(Value::String(message)) = fields.get(key) {
        return message.clone();
      }
    }
  }
  let body = body.trim();
  if body.is_empty() {
    status.to_string()
  } else {
    body.to_owned()
  }
}

/// `column=eq.value` as a query pair.
fn eq_param(filter: &Filter) -> (String, String) {
  let value = match &filter.value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  };
  (filter.column.to_owned(), format!("eq.{value}"))
}

fn first_row(mut rows: Vec<Row>) -> Option<Row> {
  if rows.is_empty() { None } else { Some(rows.swap_remove(0)) }
}

// ─── Gateway impl ────────────────────────────────────────────────────────────

impl Gateway for RestGateway {
  type Error = Error;

  // ── Tables ────────────────────────────────────────────────────────────

  /// `GET /rest/v1/<table>?select=*&<column>=eq.<value>&order=<column>.<dir>`
  async fn query(
    &self,
    table: &'static str,
    filter: Filter,
    order: OrderBy,
  ) -> Result<Vec<Row>> {
    debug!(table, %order, "query");
    let resp = self
      .authorize(self.client.get(self.table_url(table)))
      .query(&[
        ("select".to_owned(), "*".to_owned()),
        eq_param(&filter),
        ("order".to_owned(), order.to_string()),
      ])
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  /// `POST /rest/v1/<table>` returning the stored row.
  async fn insert(&self, table: &'static str, fields: Row) -> Result<Row> {
    debug!(table, "insert");
    self.send_row(table, self.post_row(table, &fields, INSERT_PREFER)).await
  }

  /// `POST /rest/v1/<table>`, merging into the row whose primary key
  /// conflicts.
  async fn upsert(&self, table: &'static str, fields: Row) -> Result<Row> {
    debug!(table, "upsert");
    self.send_row(table, self.post_row(table, &fields, UPSERT_PREFER)).await
  }

  /// `PATCH /rest/v1/<table>?id=eq.<id>`; an empty result means no row
  /// matched.
  async fn update(
    &self,
    table: &'static str,
    id: Uuid,
    fields: Row,
  ) -> Result<Option<Row>> {
    debug!(table, %id, "update");
    let resp = self
      .authorize(self.client.patch(self.table_url(table)))
      .query(&[("id", format!("eq.{id}"))])
      .header("Prefer", "return=representation")
      .json(&fields)
      .send()
      .await?;
    let rows: Vec<Row> = check(resp).await?.json().await?;
    Ok(first_row(rows))
  }

  /// `DELETE /rest/v1/<table>?id=eq.<id>`
  async fn delete(&self, table: &'static str, id: Uuid) -> Result<()> {
    debug!(table, %id, "delete");
    let resp = self
      .authorize(self.client.delete(self.table_url(table)))
      .query(&[("id", format!("eq.{id}"))])
      .send()
      .await?;
    check(resp).await?;
    Ok(())
  }

  // ── Blob storage ──────────────────────────────────────────────────────

  /// `POST /storage/v1/object/<bucket>/<path>`
  async fn upload_blob(
    &self,
    bucket: &'static str,
    path: String,
    bytes: Bytes,
    content_type: String,
  ) -> Result<()> {
    debug!(bucket, %path, size = bytes.len(), "upload");
    let url = self.storage_url(&format!("/object/{bucket}/{path}"));
    let resp = self
      .authorize(self.client.post(url))
      .header(reqwest::header::CONTENT_TYPE, content_type)
      .body(bytes)
      .send()
      .await?;
    check(resp).await?;
    Ok(())
  }

  /// `POST /storage/v1/object/sign/<bucket>/<path>`. The response carries a
  /// path relative to the storage root.
  async fn signed_url(
    &self,
    bucket: &'static str,
    path: String,
    ttl_seconds: u64,
  ) -> Result<String> {
    let url = self.storage_url(&format!("/object/sign/{bucket}/{path}"));
    let resp = self
      .authorize(self.client.post(url))
      .json(&json!({ "expiresIn": ttl_seconds }))
      .send()
      .await?;
    let signed: SignedUrlResponse = check(resp).await?.json().await?;
    Ok(self.storage_url(&signed.signed_url))
  }

  // ── Session ───────────────────────────────────────────────────────────

  /// `GET /auth/v1/user`. An expired token ends the session.
  async fn current_user(&self) -> Result<Option<AuthUser>> {
    if self.access_token().is_none() {
      return Ok(None);
    }
    let resp = self
      .authorize(self.client.get(self.auth_url("/user")))
      .send()
      .await?;
    if resp.status() == StatusCode::UNAUTHORIZED {
      *self.session.write() = None;
      return Ok(None);
    }
    let user: AuthUser = check(resp).await?.json().await?;
    if let Some(session) = self.session.write().as_mut() {
      session.user = user.clone();
    }
    Ok(Some(user))
  }
}

// ─── Auth impl ───────────────────────────────────────────────────────────────

impl Auth for RestGateway {
  /// `POST /auth/v1/signup`. Projects with email confirmation switched on
  /// answer with the bare user and no session.
  async fn sign_up(
    &self,
    email: String,
    password: String,
    name: String,
  ) -> Result<AuthUser> {
    let resp = self
      .authorize(self.client.post(self.auth_url("/signup")))
      .json(&json!({
        "email": email,
        "password": password,
        "data": { "name": name },
      }))
      .send()
      .await?;
    let body: Value = check(resp).await?.json().await?;

    if body.get("access_token").is_some() {
      let token: TokenResponse = serde_json::from_value(body)
        .map_err(|e| Error::Decode(e.to_string()))?;
      return Ok(self.start_session(token));
    }
    let user = body.get("user").cloned().unwrap_or(body);
    serde_json::from_value(user).map_err(|e| Error::Decode(e.to_string()))
  }

  /// `POST /auth/v1/token?grant_type=password`
  async fn sign_in(&self, email: String, password: String) -> Result<AuthUser> {
    let resp = self
      .authorize(self.client.post(self.auth_url("/token")))
      .query(&[("grant_type", "password")])
      .json(&json!({ "email": email, "password": password }))
      .send()
      .await?;
    let token: TokenResponse = check(resp).await?.json().await?;
    Ok(self.start_session(token))
  }

  /// `POST /auth/v1/logout`. The local session ends whatever the server
  /// says.
  async fn sign_out(&self) -> Result<()> {
    if self.access_token().is_none() {
      return Ok(());
    }
    let resp = self
      .authorize(self.client.post(self.auth_url("/logout")))
      .send()
      .await;
    *self.session.write() = None;
    check(resp?).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn gateway() -> RestGateway {
    RestGateway::new(RestConfig::new("https://pets.example.co/", "anon")).unwrap()
  }

  #[test]
  fn urls_join_cleanly() {
    let g = gateway();
    assert_eq!(g.table_url("pets"), "https://pets.example.co/rest/v1/pets");
    assert_eq!(
      g.storage_url("/object/sign/pets/a.jpg?token=t"),
      "https://pets.example.co/storage/v1/object/sign/pets/a.jpg?token=t"
    );
    assert_eq!(g.auth_url("/user"), "https://pets.example.co/auth/v1/user");
  }

  #[test]
  fn upsert_asks_for_a_merge() {
    let g = gateway();
    let mut fields = Row::new();
    fields.insert("id".into(), Uuid::nil().to_string().into());

    let insert = g.post_row("profiles", &fields, INSERT_PREFER).build().unwrap();
    let upsert = g.post_row("profiles", &fields, UPSERT_PREFER).build().unwrap();
    assert_eq!(insert.url().as_str(), "https://pets.example.co/rest/v1/profiles");
    assert_eq!(upsert.method(), reqwest::Method::POST);
    assert_eq!(insert.headers()["prefer"], "return=representation");
    assert_eq!(
      upsert.headers()["prefer"],
      "return=representation,resolution=merge-duplicates"
    );
  }

  #[test]
  fn equality_filters() {
    let id = Uuid::nil();
    assert_eq!(
      eq_param(&Filter::eq("user_id", id.to_string())),
      ("user_id".to_owned(), format!("eq.{id}"))
    );
    assert_eq!(
      eq_param(&Filter::eq("active", true)),
      ("active".to_owned(), "eq.true".to_owned())
    );
  }

  #[test]
  fn error_messages_come_from_the_body() {
    let status = StatusCode::BAD_REQUEST;
    assert_eq!(
      api_message(status, r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
      "Invalid login credentials"
    );
    assert_eq!(api_message(status, r#"{"msg":"User already registered"}"#), "User already registered");
    assert_eq!(api_message(status, r#"{"message":"duplicate key"}"#), "duplicate key");
    assert_eq!(api_message(status, "  plain text  "), "plain text");
    assert_eq!(api_message(status, ""), "400 Bad Request");
  }

  #[test]
  fn no_session_means_no_user() {
    let g = gateway();
    assert!(g.access_token().is_none());
    let user = g.start_session(TokenResponse {
      access_token: "jwt".into(),
      user:         AuthUser { id: Uuid::nil(), email: "a@b.co".into(), created_at: None },
    });
    assert_eq!(user.email, "a@b.co");
    assert_eq!(g.access_token().as_deref(), Some("jwt"));
  }
}
