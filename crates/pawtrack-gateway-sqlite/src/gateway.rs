//! [`SqliteGateway`] — the SQLite implementation of [`Gateway`] and [`Auth`].

use std::{path::Path, sync::Arc};

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use bytes::Bytes;
use chrono::Utc;
use parking_lot::RwLock;
use pawtrack_core::{
  Auth, AuthUser, Filter, Gateway, OrderBy, Row, user::PROFILES_TABLE,
};
use rand_core::OsRng;
use rusqlite::OptionalExtension as _;
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    column_path, decode_dt, decode_row, decode_uuid, encode_dt, encode_uuid,
    sql_value,
  },
  schema::{CASCADES, SCHEMA},
  signing::UrlSigner,
};

/// Origin that signed URLs are issued under unless configured otherwise.
pub const DEFAULT_BASE_URL: &str = "http://localhost:54321";

/// A stored object, as read back through a signed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
  pub bucket:       String,
  pub path:         String,
  pub content_type: String,
  /// Hex SHA-256 of `bytes`, computed on upload.
  pub sha256:       String,
  pub bytes:        Bytes,
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

/// A pawtrack backend in a single SQLite file.
///
/// Cloning is cheap. Clones share the connection and the session, so signing
/// in through one clone signs in all of them.
#[derive(Clone)]
pub struct SqliteGateway {
  conn:              tokio_rusqlite::Connection,
  session:           Arc<RwLock<Option<AuthUser>>>,
  pub(crate) signer: Arc<UrlSigner>,
  base_url:          Arc<str>,
}

impl SqliteGateway {
  /// Open (or create) a database at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory database — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self {
      conn,
      session: Arc::new(RwLock::new(None)),
      signer: Arc::new(UrlSigner::generate()),
      base_url: Arc::from(DEFAULT_BASE_URL),
    })
  }

  /// Issue signed URLs under `base_url` instead of [`DEFAULT_BASE_URL`].
  pub fn with_base_url(mut self, base_url: &str) -> Self {
    self.base_url = Arc::from(base_url.trim_end_matches('/'));
    self
  }

  /// Read an object through a URL issued by [`Gateway::signed_url`].
  ///
  /// No session is needed; the signature is the credential. Fails with
  /// [`Error::InvalidSignature`] once the URL has expired.
  pub async fn fetch_signed(&self, url: &str) -> Result<Blob> {
    let prefix = format!("{}/storage/v1/object/sign/", self.base_url);
    let rest = url.strip_prefix(&prefix).ok_or(Error::InvalidSignature)?;
    let (object, query) = rest.split_once('?').ok_or(Error::InvalidSignature)?;
    let (bucket, path) = object.split_once('/').ok_or(Error::InvalidSignature)?;

    let mut expires = None;
    let mut token = None;
    for pair in query.split('&') {
      match pair.split_once('=') {
        Some(("expires", v)) => expires = v.parse::<i64>().ok(),
        Some(("token", v)) => token = Some(v),
        _ => {}
      }
    }
    let (Some(expires), Some(token)) = (expires, token) else {
      return Err(Error::InvalidSignature);
    };
    if expires < Utc::now().timestamp()
      || !self.signer.verify(bucket, path, expires, token)
    {
      return Err(Error::InvalidSignature);
    }

    self
      .read_blob(bucket.to_owned(), path.to_owned())
      .await?
      .ok_or(Error::ObjectNotFound)
  }

  fn session_user(&self) -> Result<AuthUser> {
    self.session.read().clone().ok_or(Error::Unauthenticated)
  }

  async fn read_blob(&self, bucket: String, path: String) -> Result<Option<Blob>> {
    let found = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT content_type, sha256, bytes FROM blobs
             WHERE bucket = ?1 AND path = ?2",
            rusqlite::params![bucket, path],
            |r| {
              Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Vec<u8>>(2)?,
              ))
            },
          )
          .optional()?;
        Ok(row.map(|(content_type, sha256, bytes)| Blob {
          bucket,
          path,
          content_type,
          sha256,
          bytes: Bytes::from(bytes),
        }))
      })
      .await?;
    Ok(found)
  }

  async fn blob_exists(&self, bucket: &'static str, path: String) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM blobs WHERE bucket = ?1 AND path = ?2",
              rusqlite::params![bucket, path],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(exists)
  }
}

/// Delete a row and, depth first, every row that [`CASCADES`] hangs off it.
fn delete_cascading(
  conn: &rusqlite::Connection,
  table: &str,
  id: &str,
) -> rusqlite::Result<()> {
  for (_, child, column) in CASCADES.iter().filter(|(parent, ..)| *parent == table) {
    let children: Vec<String> = {
      let mut stmt = conn.prepare(
        "SELECT id FROM records
         WHERE table_name = ?1 AND json_extract(data, ?2) = ?3",
      )?;
      stmt
        .query_map(rusqlite::params![child, column_path(column), id], |r| {
          r.get(0)
        })?
        .collect::<rusqlite::Result<_>>()?
    };
    for child_id in children {
      delete_cascading(conn, child, &child_id)?;
    }
  }
  conn.execute(
    "DELETE FROM records WHERE table_name = ?1 AND id = ?2",
    rusqlite::params![table, id],
  )?;
  Ok(())
}

fn other(err: serde_json::Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(err))
}

// ─── Row ownership ───────────────────────────────────────────────────────────

/// Outcome of a write that is checked against row ownership.
enum Write {
  Stored(Row),
  Missing,
  Forbidden,
}

fn load_row(
  conn: &rusqlite::Connection,
  table: &str,
  id: &str,
) -> Result<Option<Row>, tokio_rusqlite::Error> {
  let data: Option<String> = conn
    .query_row(
      "SELECT data FROM records WHERE table_name = ?1 AND id = ?2",
      rusqlite::params![table, id],
      |r| r.get(0),
    )
    .optional()?;
  data
    .map(|data| serde_json::from_str(&data).map_err(other))
    .transpose()
}

fn uuid_column(row: &Row, column: &str) -> Option<Uuid> {
  row
    .get(column)
    .and_then(Value::as_str)
    .and_then(|s| Uuid::parse_str(s).ok())
}

/// The account a row belongs to. A profile is owned by the user it
/// describes, a row listed in [`CASCADES`] by the owner of its parent, and
/// anything else through its `user_id`.
fn owner_of(
  conn: &rusqlite::Connection,
  table: &str,
  row: &Row,
) -> Result<Option<Uuid>, tokio_rusqlite::Error> {
  if table == PROFILES_TABLE {
    return Ok(uuid_column(row, "id"));
  }
  if let Some(&(parent, _, column)) =
    CASCADES.iter().find(|(_, child, _)| *child == table)
  {
    let Some(parent_id) = uuid_column(row, column) else {
      return Ok(None);
    };
    return match load_row(conn, parent, &encode_uuid(parent_id))? {
      Some(parent_row) => owner_of(conn, parent, &parent_row),
      None => Ok(None),
    };
  }
  Ok(uuid_column(row, "user_id"))
}

fn owned_by(
  conn: &rusqlite::Connection,
  table: &str,
  row: &Row,
  user: Uuid,
) -> Result<bool, tokio_rusqlite::Error> {
  Ok(owner_of(conn, table, row)? == Some(user))
}

/// Overlay `fields` on `row`. `id` and `created_at` never change.
fn merge(row: &mut Row, fields: Row) {
  for (column, value) in fields {
    if column != "id" && column != "created_at" {
      row.insert(column, value);
    }
  }
}

fn requested_id(fields: &Row) -> Result<Uuid> {
  match fields.get("id").and_then(Value::as_str) {
    Some(id) => decode_uuid(id),
    None => Ok(Uuid::new_v4()),
  }
}

// ─── Gateway impl ────────────────────────────────────────────────────────────

impl Gateway for SqliteGateway {
  type Error = Error;

  // ── Tables ────────────────────────────────────────────────────────────

  /// Rows the signed-in user does not own are left out.
  async fn query(
    &self,
    table: &'static str,
    filter: Filter,
    order: OrderBy,
  ) -> Result<Vec<Row>> {
    let user = self.session_user()?.id;

    let filter_path = column_path(filter.column);
    let filter_value = sql_value(&filter.value);
    let order_path = column_path(order.column);
    // Ties fall back to insertion order, in the same direction.
    let dir = order.direction.as_str();
    let sql = format!(
      "SELECT data FROM records
       WHERE table_name = ?1 AND json_extract(data, ?2) = ?3
       ORDER BY julianday(json_extract(data, ?4)) {dir}, rowid {dir}"
    );

    let raw: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![table, filter_path, filter_value, order_path],
            |r| r.get(0),
          )?
          .collect::<rusqlite::Result<Vec<String>>>()?;

        let mut visible = Vec::with_capacity(rows.len());
        for data in rows {
          let owned = match serde_json::from_str::<Row>(&data) {
            Ok(row) => owned_by(conn, table, &row, user)?,
            Err(_) => false,
          };
          if owned {
            visible.push(data);
          }
        }
        Ok(visible)
      })
      .await?;

    raw.iter().map(|data| decode_row(table, data)).collect()
  }

  /// Fails with [`Error::Forbidden`] unless the row belongs to the
  /// signed-in user.
  async fn insert(&self, table: &'static str, mut fields: Row) -> Result<Row> {
    let user = self.session_user()?.id;

    // Profiles are keyed by the auth user's id; everything else gets a fresh
    // one.
    let id_str = encode_uuid(requested_id(&fields)?);
    let created_at = encode_dt(Utc::now());
    fields.insert("id".into(), Value::String(id_str.clone()));
    fields.insert("created_at".into(), Value::String(created_at.clone()));
    let data = serde_json::to_string(&fields)?;

    let stored = self
      .conn
      .call(move |conn| {
        if !owned_by(conn, table, &fields, user)? {
          return Ok(Write::Forbidden);
        }
        conn.execute(
          "INSERT INTO records (table_name, id, created_at, data)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![table, id_str, created_at, data],
        )?;
        Ok(Write::Stored(fields))
      })
      .await?;

    match stored {
      Write::Stored(row) => Ok(row),
      Write::Missing | Write::Forbidden => Err(Error::forbidden(table)),
    }
  }

  /// A row that already exists keeps its `created_at` and takes the new
  /// fields on top of the old ones.
  async fn upsert(&self, table: &'static str, fields: Row) -> Result<Row> {
    let user = self.session_user()?.id;
    let id_str = encode_uuid(requested_id(&fields)?);
    let now = encode_dt(Utc::now());

    let stored = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let row = match load_row(&tx, table, &id_str)? {
          Some(mut row) => {
            if !owned_by(&tx, table, &row, user)? {
              return Ok(Write::Forbidden);
            }
            merge(&mut row, fields);
            row
          }
          None => {
            let mut row = fields;
            row.insert("id".into(), Value::String(id_str.clone()));
            row.insert("created_at".into(), Value::String(now.clone()));
            row
          }
        };
        if !owned_by(&tx, table, &row, user)? {
          return Ok(Write::Forbidden);
        }

        let data = serde_json::to_string(&row).map_err(other)?;
        tx.execute(
          "INSERT INTO records (table_name, id, created_at, data)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (table_name, id) DO UPDATE SET data = excluded.data",
          rusqlite::params![table, id_str, now, data],
        )?;
        tx.commit()?;
        Ok(Write::Stored(row))
      })
      .await?;

    match stored {
      Write::Stored(row) => Ok(row),
      Write::Missing | Write::Forbidden => Err(Error::forbidden(table)),
    }
  }

  /// Rows of other users read as missing. Moving a row to a parent the user
  /// does not own fails with [`Error::Forbidden`].
  async fn update(
    &self,
    table: &'static str,
    id: Uuid,
    fields: Row,
  ) -> Result<Option<Row>> {
    let user = self.session_user()?.id;
    let id_str = encode_uuid(id);

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(mut row) = load_row(&tx, table, &id_str)? else {
          return Ok(Write::Missing);
        };
        if !owned_by(&tx, table, &row, user)? {
          return Ok(Write::Missing);
        }
        merge(&mut row, fields);
        if !owned_by(&tx, table, &row, user)? {
          return Ok(Write::Forbidden);
        }

        let data = serde_json::to_string(&row).map_err(other)?;
        tx.execute(
          "UPDATE records SET data = ?3 WHERE table_name = ?1 AND id = ?2",
          rusqlite::params![table, id_str, data],
        )?;
        tx.commit()?;
        Ok(Write::Stored(row))
      })
      .await?;

    match updated {
      Write::Stored(row) => Ok(Some(row)),
      Write::Missing => Ok(None),
      Write::Forbidden => Err(Error::forbidden(table)),
    }
  }

  /// Deleting a row the user does not own changes nothing, like deleting
  /// one that does not exist.
  async fn delete(&self, table: &'static str, id: Uuid) -> Result<()> {
    let user = self.session_user()?.id;
    let id_str = encode_uuid(id);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(row) = load_row(&tx, table, &id_str)?
          && owned_by(&tx, table, &row, user)?
        {
          delete_cascading(&tx, table, &id_str)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Blob storage ──────────────────────────────────────────────────────

  async fn upload_blob(
    &self,
    bucket: &'static str,
    path: String,
    bytes: Bytes,
    content_type: String,
  ) -> Result<()> {
    self.session_user()?;
    let sha256 = hex::encode(Sha256::digest(&bytes));
    let created_at = encode_dt(Utc::now());

    let inserted = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM blobs WHERE bucket = ?1 AND path = ?2",
            rusqlite::params![bucket, path],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if exists {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO blobs (bucket, path, content_type, sha256, bytes, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![bucket, path, content_type, sha256, &bytes[..], created_at],
        )?;
        Ok(true)
      })
      .await?;

    if inserted { Ok(()) } else { Err(Error::ObjectExists) }
  }

  async fn signed_url(
    &self,
    bucket: &'static str,
    path: String,
    ttl_seconds: u64,
  ) -> Result<String> {
    self.session_user()?;
    if !self.blob_exists(bucket, path.clone()).await? {
      return Err(Error::ObjectNotFound);
    }

    let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
    let expires = Utc::now().timestamp().saturating_add(ttl);
    let token = self.signer.token(bucket, &path, expires);
    Ok(format!(
      "{}/storage/v1/object/sign/{bucket}/{path}?expires={expires}&token={token}",
      self.base_url
    ))
  }

  // ── Session ───────────────────────────────────────────────────────────

  async fn current_user(&self) -> Result<Option<AuthUser>> {
    Ok(self.session.read().clone())
  }
}

// ─── Auth impl ───────────────────────────────────────────────────────────────

impl Auth for SqliteGateway {
  /// Create the account and sign it in. The display name lives in the
  /// `profiles` table, not here.
  async fn sign_up(
    &self,
    email: String,
    password: String,
    _name: String,
  ) -> Result<AuthUser> {
    let email = email.trim().to_lowercase();
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| Error::PasswordHash(e.to_string()))?
      .to_string();

    let created_at = encode_dt(Utc::now());
    let user = AuthUser {
      id:         Uuid::new_v4(),
      email:      email.clone(),
      created_at: Some(decode_dt(&created_at)?),
    };
    let id_str = encode_uuid(user.id);

    let created = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if exists {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO users (id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email, password_hash, created_at],
        )?;
        Ok(true)
      })
      .await?;
    if !created {
      return Err(Error::UserExists);
    }

    *self.session.write() = Some(user.clone());
    Ok(user)
  }

  async fn sign_in(&self, email: String, password: String) -> Result<AuthUser> {
    let email = email.trim().to_lowercase();
    let lookup = email.clone();

    let found: Option<(String, String, String)> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT id, password_hash, created_at FROM users WHERE email = ?1",
            rusqlite::params![lookup],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
          )
          .optional()?;
        Ok(row)
      })
      .await?;
    let Some((id, password_hash, created_at)) = found else {
      return Err(Error::InvalidCredentials);
    };

    let parsed = PasswordHash::new(&password_hash)
      .map_err(|e| Error::PasswordHash(e.to_string()))?;
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .map_err(|_| Error::InvalidCredentials)?;

    let user = AuthUser {
      id: decode_uuid(&id)?,
      email,
      created_at: Some(decode_dt(&created_at)?),
    };
    *self.session.write() = Some(user.clone());
    Ok(user)
  }

  async fn sign_out(&self) -> Result<()> {
    *self.session.write() = None;
    Ok(())
  }
}
