//! Pets and their weight history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{
  date::CalendarDate,
  record::{OrderBy, Owner, Record},
  validate::{
    Validate, ValidationError, optional_positive, optional_text,
    require_positive, require_text,
  },
};

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
  Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PetKind {
  #[default]
  Dog,
  Cat,
  Fish,
  Snake,
  Bird,
  Rabbit,
  Hamster,
  Turtle,
  Other,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WeightUnit {
  #[default]
  Kg,
  Lb,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SizeUnit {
  #[default]
  Cm,
  In,
}

// ─── Pet ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
  pub id:            Uuid,
  pub user_id:       Uuid,
  pub name:          String,
  #[serde(rename = "type")]
  pub kind:          PetKind,
  pub breed:         Option<String>,
  pub date_of_birth: Option<CalendarDate>,
  pub weight:        Option<f64>,
  #[serde(default)]
  pub weight_unit:   WeightUnit,
  pub size:          Option<f64>,
  #[serde(default)]
  pub size_unit:     SizeUnit,
  pub color:         Option<String>,
  pub microchip_id:  Option<String>,
  /// Storage path of the profile photo, or a full URL for legacy rows.
  pub photo_url:     Option<String>,
  pub notes:         Option<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    Option<DateTime<Utc>>,
}

/// Input to create a [`Pet`]. The owning user is filled in by the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewPet {
  pub name:          String,
  #[serde(rename = "type")]
  pub kind:          PetKind,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub breed:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_of_birth: Option<CalendarDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub weight:        Option<f64>,
  pub weight_unit:   WeightUnit,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub size:          Option<f64>,
  pub size_unit:     SizeUnit,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub color:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub microchip_id:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub photo_url:     Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:         Option<String>,
}

impl NewPet {
  pub fn new(name: impl Into<String>, kind: PetKind) -> Self {
    Self { name: name.into(), kind, ..Self::default() }
  }
}

impl Validate for NewPet {
  fn validate(&self) -> Result<(), ValidationError> {
    require_text("name", &self.name, "Pet name is required")?;
    optional_positive("weight", self.weight, "Weight must be a positive number")?;
    optional_positive("size", self.size, "Size must be a positive number")
  }
}

/// Partial update of a [`Pet`]; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PetPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name:          Option<String>,
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub kind:          Option<PetKind>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub breed:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_of_birth: Option<CalendarDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub weight:        Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub weight_unit:   Option<WeightUnit>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub size:          Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub size_unit:     Option<SizeUnit>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub color:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub microchip_id:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub photo_url:     Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:         Option<String>,
}

impl Validate for PetPatch {
  fn validate(&self) -> Result<(), ValidationError> {
    optional_text("name", self.name.as_deref(), "Pet name is required")?;
    optional_positive("weight", self.weight, "Weight must be a positive number")?;
    optional_positive("size", self.size, "Size must be a positive number")
  }
}

impl Record for Pet {
  type Draft = NewPet;
  type Patch = PetPatch;

  const TABLE: &'static str = "pets";
  const OWNER: Owner = Owner::User;
  const ORDER: OrderBy = OrderBy::NEWEST_FIRST;
  const TRACKS_UPDATES: bool = true;

  fn id(&self) -> Uuid { self.id }

  fn owner_id(&self) -> Uuid { self.user_id }

  fn sort_key(&self) -> DateTime<Utc> { self.created_at }
}

// ─── Weight history ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
  pub id:          Uuid,
  pub pet_id:      Uuid,
  pub weight:      f64,
  #[serde(default)]
  pub weight_unit: WeightUnit,
  pub recorded_at: DateTime<Utc>,
  pub notes:       Option<String>,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewWeightRecord {
  pub pet_id:      Uuid,
  pub weight:      f64,
  pub weight_unit: WeightUnit,
  pub recorded_at: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:       Option<String>,
}

impl Validate for NewWeightRecord {
  fn validate(&self) -> Result<(), ValidationError> {
    require_positive("weight", self.weight, "Please enter a valid weight")
  }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WeightRecordPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub weight:      Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub weight_unit: Option<WeightUnit>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub recorded_at: Option<DateTime<Utc>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:       Option<String>,
}

impl Validate for WeightRecordPatch {
  fn validate(&self) -> Result<(), ValidationError> {
    optional_positive("weight", self.weight, "Please enter a valid weight")
  }
}

impl Record for WeightRecord {
  type Draft = NewWeightRecord;
  type Patch = WeightRecordPatch;

  const TABLE: &'static str = "weight_records";
  const OWNER: Owner = Owner::Parent("pet_id");
  const ORDER: OrderBy = OrderBy::asc("recorded_at");

  fn id(&self) -> Uuid { self.id }

  fn owner_id(&self) -> Uuid { self.pet_id }

  fn sort_key(&self) -> DateTime<Utc> { self.recorded_at }
}
