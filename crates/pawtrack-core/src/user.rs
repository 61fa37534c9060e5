//! Accounts: the signed-in user, their profile row, and the credential forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  gateway::AuthUser,
  validate::{Validate, ValidationError, looks_like_email, require_text},
};

pub const PROFILES_TABLE: &str = "profiles";
pub const MIN_PASSWORD_LEN: usize = 8;

/// A row of the `profiles` table, keyed by the auth user's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub id:         Uuid,
  pub name:       Option<String>,
  pub email:      Option<String>,
  pub avatar_url: Option<String>,
  pub created_at: Option<DateTime<Utc>>,
}

/// Profile row written right after sign-up.
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
  pub id:         Uuid,
  pub name:       String,
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

/// The signed-in user as presentation code sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id:         Uuid,
  pub email:      String,
  pub name:       String,
  pub avatar_url: Option<String>,
  pub created_at: Option<DateTime<Utc>>,
}

impl User {
  /// Combine the auth identity with its profile row, if one exists. The
  /// display name falls back to the email address.
  pub fn from_parts(auth: AuthUser, profile: Option<Profile>) -> Self {
    let (name, avatar_url, profile_created) = match profile {
      Some(p) => (p.name, p.avatar_url, p.created_at),
      None => (None, None, None),
    };
    let name = name
      .filter(|n| !n.trim().is_empty())
      .unwrap_or_else(|| auth.email.clone());
    Self {
      id: auth.id,
      name,
      avatar_url,
      created_at: profile_created.or(auth.created_at),
      email: auth.email,
    }
  }
}

// ─── Forms ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SignUp {
  pub name:     String,
  pub email:    String,
  pub password: String,
}

impl Validate for SignUp {
  fn validate(&self) -> Result<(), ValidationError> {
    require_text("name", &self.name, "Name is required")?;
    validate_email(&self.email)?;
    if self.password.is_empty() {
      return Err(ValidationError::new("password", "Password is required"));
    }
    if self.password.chars().count() < MIN_PASSWORD_LEN {
      return Err(ValidationError::new(
        "password",
        format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
      ));
    }
    Ok(())
  }
}

#[derive(Debug, Clone)]
pub struct SignIn {
  pub email:    String,
  pub password: String,
}

impl Validate for SignIn {
  fn validate(&self) -> Result<(), ValidationError> {
    validate_email(&self.email)?;
    if self.password.is_empty() {
      return Err(ValidationError::new("password", "Password is required"));
    }
    Ok(())
  }
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
  if email.is_empty() {
    return Err(ValidationError::new("email", "Email is required"));
  }
  if !looks_like_email(email) {
    return Err(ValidationError::new("email", "Please enter a valid email"));
  }
  Ok(())
}
