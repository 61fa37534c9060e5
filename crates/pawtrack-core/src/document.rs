//! Stored files (vaccination cards, insurance papers, ...) attached to a pet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  date::CalendarDate,
  record::{OrderBy, Owner, Record},
  validate::{Validate, ValidationError, optional_text, require_text},
};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DocumentType {
  Vaccination,
  MedicalRecord,
  Custody,
  Insurance,
  #[default]
  Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  pub id:          Uuid,
  pub pet_id:      Uuid,
  pub name:        String,
  #[serde(rename = "type")]
  pub doc_type:    DocumentType,
  /// Storage path of the file, or a full URL for legacy rows.
  pub file_url:    String,
  pub file_type:   String,
  #[serde(default)]
  pub file_size:   u64,
  pub notes:       Option<String>,
  pub expiry_date: Option<CalendarDate>,
  pub created_at:  DateTime<Utc>,
}

impl Document {
  /// Whether the document's expiry date has passed as of `today`. Documents
  /// without an expiry never expire.
  pub fn is_expired(&self, today: CalendarDate) -> bool {
    self.expiry_date.is_some_and(|expiry| expiry < today)
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewDocument {
  pub pet_id:      Uuid,
  pub name:        String,
  #[serde(rename = "type")]
  pub doc_type:    DocumentType,
  pub file_url:    String,
  pub file_type:   String,
  pub file_size:   u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub expiry_date: Option<CalendarDate>,
}

impl Validate for NewDocument {
  fn validate(&self) -> Result<(), ValidationError> {
    require_text("name", &self.name, "Document name is required")?;
    require_text("file_url", &self.file_url, "Document file is missing")
  }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name:        Option<String>,
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub doc_type:    Option<DocumentType>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub expiry_date: Option<CalendarDate>,
}

impl Validate for DocumentPatch {
  fn validate(&self) -> Result<(), ValidationError> {
    optional_text("name", self.name.as_deref(), "Document name is required")
  }
}

impl Record for Document {
  type Draft = NewDocument;
  type Patch = DocumentPatch;

  const TABLE: &'static str = "documents";
  const OWNER: Owner = Owner::Parent("pet_id");
  const ORDER: OrderBy = OrderBy::NEWEST_FIRST;

  fn id(&self) -> Uuid { self.id }

  fn owner_id(&self) -> Uuid { self.pet_id }

  fn sort_key(&self) -> DateTime<Utc> { self.created_at }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn doc(expiry: Option<CalendarDate>) -> Document {
    Document {
      id:          Uuid::new_v4(),
      pet_id:      Uuid::new_v4(),
      name:        "rabies.pdf".into(),
      doc_type:    DocumentType::Vaccination,
      file_url:    "documents/x/rabies.pdf".into(),
      file_type:   "application/pdf".into(),
      file_size:   1024,
      notes:       None,
      expiry_date: expiry,
      created_at:  Utc::now(),
    }
  }

  #[test]
  fn expiry_is_exclusive_of_the_day_itself() {
    let day = CalendarDate::from_ymd(2025, 3, 1).unwrap();
    let next = CalendarDate::from_ymd(2025, 3, 2).unwrap();
    assert!(!doc(Some(day)).is_expired(day));
    assert!(doc(Some(day)).is_expired(next));
    assert!(!doc(None).is_expired(next));
  }
}
