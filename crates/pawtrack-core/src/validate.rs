//! Client-side input validation.
//!
//! Drafts and patches are checked before any gateway call so an obviously
//! incomplete form never costs a round-trip.

use thiserror::Error;

/// A required field is missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
  /// Name of the offending field, as serialised.
  pub field:   &'static str,
  /// Human-readable reason, suitable for showing to the user as-is.
  pub message: String,
}

impl ValidationError {
  pub fn new(field: &'static str, message: impl Into<String>) -> Self {
    Self { field, message: message.into() }
  }
}

/// Implemented by every record draft and patch.
pub trait Validate {
  fn validate(&self) -> Result<(), ValidationError>;
}

/// Fails unless `value` contains something other than whitespace.
pub fn require_text(
  field: &'static str,
  value: &str,
  message: &str,
) -> Result<(), ValidationError> {
  if value.trim().is_empty() {
    return Err(ValidationError::new(field, message));
  }
  Ok(())
}

/// Like [`require_text`], but only when a value was supplied at all.
pub fn optional_text(
  field: &'static str,
  value: Option<&str>,
  message: &str,
) -> Result<(), ValidationError> {
  match value {
    Some(v) => require_text(field, v, message),
    None => Ok(()),
  }
}

/// Fails unless `value` is a finite number greater than zero.
pub fn require_positive(
  field: &'static str,
  value: f64,
  message: &str,
) -> Result<(), ValidationError> {
  if !value.is_finite() || value <= 0.0 {
    return Err(ValidationError::new(field, message));
  }
  Ok(())
}

pub fn optional_positive(
  field: &'static str,
  value: Option<f64>,
  message: &str,
) -> Result<(), ValidationError> {
  match value {
    Some(v) => require_positive(field, v, message),
    None => Ok(()),
  }
}

/// Loose email shape check: some non-space text, an `@`, more text, a dot,
/// and more text.
pub fn looks_like_email(value: &str) -> bool {
  value.split_whitespace().any(|token| {
    token.char_indices().any(|(at, c)| {
      if c != '@' || at == 0 {
        return false;
      }
      let domain = &token[at + 1..];
      domain
        .char_indices()
        .any(|(dot, d)| d == '.' && dot > 0 && dot + 1 < domain.len())
    })
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_text_is_rejected() {
    let err = require_text("name", "   ", "Pet name is required").unwrap_err();
    assert_eq!(err.field, "name");
    assert_eq!(err.to_string(), "Pet name is required");
    assert!(require_text("name", " Rex ", "x").is_ok());
  }

  #[test]
  fn positive_numbers() {
    assert!(require_positive("amount", 0.01, "x").is_ok());
    assert!(require_positive("amount", 0.0, "x").is_err());
    assert!(require_positive("amount", -3.0, "x").is_err());
    assert!(require_positive("amount", f64::NAN, "x").is_err());
    assert!(optional_positive("weight", None, "x").is_ok());
  }

  #[test]
  fn email_shapes() {
    assert!(looks_like_email("a@b.co"));
    assert!(looks_like_email("first.last@example.org"));
    assert!(!looks_like_email("no-at-sign.com"));
    assert!(!looks_like_email("@example.com"));
    assert!(!looks_like_email("user@localhost"));
    assert!(!looks_like_email("user@example."));
    assert!(!looks_like_email(""));
  }
}
