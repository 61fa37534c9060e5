//! Vet visits, medications and feeding — the records kept per pet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  date::CalendarDate,
  partition::Scheduled,
  record::{OrderBy, Owner, Record},
  validate::{Validate, ValidationError, optional_text, require_text},
};

/// Minutes before an appointment that a reminder fires unless chosen
/// otherwise.
pub const DEFAULT_REMINDER_MINUTES: u32 = 60;

// ─── Vet visits ──────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum VisitType {
  #[default]
  Checkup,
  Vaccination,
  Surgery,
  Emergency,
  Grooming,
  Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VetVisit {
  pub id:                      Uuid,
  pub pet_id:                  Uuid,
  pub vet_name:                String,
  pub vet_address:             Option<String>,
  pub vet_phone:               Option<String>,
  pub visit_type:              VisitType,
  pub scheduled_at:            DateTime<Utc>,
  #[serde(default)]
  pub completed:               bool,
  pub completed_at:            Option<DateTime<Utc>>,
  pub notes:                   Option<String>,
  pub cost:                    Option<f64>,
  #[serde(default)]
  pub reminder_enabled:        bool,
  #[serde(default)]
  pub reminder_minutes_before: u32,
  pub created_at:              DateTime<Utc>,
  pub updated_at:              Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewVetVisit {
  pub pet_id:                  Uuid,
  pub vet_name:                String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub vet_address:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub vet_phone:               Option<String>,
  pub visit_type:              VisitType,
  pub scheduled_at:            DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:                   Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cost:                    Option<f64>,
  pub reminder_enabled:        bool,
  pub reminder_minutes_before: u32,
  pub completed:               bool,
}

impl NewVetVisit {
  pub fn new(
    pet_id: Uuid,
    vet_name: impl Into<String>,
    visit_type: VisitType,
    scheduled_at: DateTime<Utc>,
  ) -> Self {
    Self {
      pet_id,
      vet_name: vet_name.into(),
      vet_address: None,
      vet_phone: None,
      visit_type,
      scheduled_at,
      notes: None,
      cost: None,
      reminder_enabled: true,
      reminder_minutes_before: DEFAULT_REMINDER_MINUTES,
      completed: false,
    }
  }
}

impl Validate for NewVetVisit {
  fn validate(&self) -> Result<(), ValidationError> {
    require_text("vet_name", &self.vet_name, "Please enter vet name")
  }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VetVisitPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub vet_name:                Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub vet_address:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub vet_phone:               Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub visit_type:              Option<VisitType>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub scheduled_at:            Option<DateTime<Utc>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub completed:               Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub completed_at:            Option<DateTime<Utc>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:                   Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cost:                    Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reminder_enabled:        Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reminder_minutes_before: Option<u32>,
}

impl VetVisitPatch {
  /// Mark a visit as having happened at `at`.
  pub fn complete(at: DateTime<Utc>) -> Self {
    Self {
      completed: Some(true),
      completed_at: Some(at),
      ..Self::default()
    }
  }
}

impl Validate for VetVisitPatch {
  fn validate(&self) -> Result<(), ValidationError> {
    optional_text("vet_name", self.vet_name.as_deref(), "Please enter vet name")
  }
}

impl Record for VetVisit {
  type Draft = NewVetVisit;
  type Patch = VetVisitPatch;

  const TABLE: &'static str = "vet_visits";
  const OWNER: Owner = Owner::Parent("pet_id");
  const ORDER: OrderBy = OrderBy::asc("scheduled_at");
  const TRACKS_UPDATES: bool = true;

  fn id(&self) -> Uuid { self.id }

  fn owner_id(&self) -> Uuid { self.pet_id }

  fn sort_key(&self) -> DateTime<Utc> { self.scheduled_at }
}

impl Scheduled for VetVisit {
  fn scheduled_at(&self) -> DateTime<Utc> { self.scheduled_at }

  fn is_completed(&self) -> bool { self.completed }
}

// ─── Medications ─────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Frequency {
  #[default]
  Daily,
  TwiceDaily,
  Weekly,
  Monthly,
  AsNeeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
  pub id:               Uuid,
  pub pet_id:           Uuid,
  pub name:             String,
  pub dosage:           String,
  pub frequency:        Frequency,
  pub start_date:       CalendarDate,
  pub end_date:         Option<CalendarDate>,
  /// Times of day as `HH:MM` strings.
  pub time_of_day:      Option<Vec<String>>,
  pub notes:            Option<String>,
  #[serde(default)]
  pub reminder_enabled: bool,
  #[serde(default)]
  pub active:           bool,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMedication {
  pub pet_id:           Uuid,
  pub name:             String,
  pub dosage:           String,
  pub frequency:        Frequency,
  pub start_date:       CalendarDate,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_date:         Option<CalendarDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub time_of_day:      Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:            Option<String>,
  pub reminder_enabled: bool,
  pub active:           bool,
}

impl Validate for NewMedication {
  fn validate(&self) -> Result<(), ValidationError> {
    const MESSAGE: &str = "Please fill in medication name and dosage";
    require_text("name", &self.name, MESSAGE)?;
    require_text("dosage", &self.dosage, MESSAGE)?;
    if let Some(end) = self.end_date
      && end < self.start_date
    {
      return Err(ValidationError::new(
        "end_date",
        "End date cannot be before the start date",
      ));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MedicationPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dosage:           Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub frequency:        Option<Frequency>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_date:         Option<CalendarDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:            Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reminder_enabled: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub active:           Option<bool>,
}

impl MedicationPatch {
  pub fn set_active(active: bool) -> Self {
    Self { active: Some(active), ..Self::default() }
  }
}

impl Validate for MedicationPatch {
  fn validate(&self) -> Result<(), ValidationError> {
    const MESSAGE: &str = "Please fill in medication name and dosage";
    optional_text("name", self.name.as_deref(), MESSAGE)?;
    optional_text("dosage", self.dosage.as_deref(), MESSAGE)
  }
}

impl Record for Medication {
  type Draft = NewMedication;
  type Patch = MedicationPatch;

  const TABLE: &'static str = "medications";
  const OWNER: Owner = Owner::Parent("pet_id");
  const ORDER: OrderBy = OrderBy::NEWEST_FIRST;
  const TRACKS_UPDATES: bool = true;

  fn id(&self) -> Uuid { self.id }

  fn owner_id(&self) -> Uuid { self.pet_id }

  fn sort_key(&self) -> DateTime<Utc> { self.created_at }
}

/// One administered (or skipped) dose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationLog {
  pub id:            Uuid,
  pub medication_id: Uuid,
  pub given_at:      DateTime<Utc>,
  #[serde(default)]
  pub skipped:       bool,
  pub notes:         Option<String>,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMedicationLog {
  pub medication_id: Uuid,
  pub given_at:      DateTime<Utc>,
  pub skipped:       bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:         Option<String>,
}

impl NewMedicationLog {
  /// A dose of `medication_id` given at `at`.
  pub fn dose(medication_id: Uuid, at: DateTime<Utc>) -> Self {
    Self { medication_id, given_at: at, skipped: false, notes: None }
  }
}

impl Validate for NewMedicationLog {
  fn validate(&self) -> Result<(), ValidationError> { Ok(()) }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MedicationLogPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub skipped: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:   Option<String>,
}

impl Validate for MedicationLogPatch {
  fn validate(&self) -> Result<(), ValidationError> { Ok(()) }
}

impl Record for MedicationLog {
  type Draft = NewMedicationLog;
  type Patch = MedicationLogPatch;

  const TABLE: &'static str = "medication_logs";
  const OWNER: Owner = Owner::Parent("medication_id");
  const ORDER: OrderBy = OrderBy::desc("given_at");

  fn id(&self) -> Uuid { self.id }

  fn owner_id(&self) -> Uuid { self.medication_id }

  fn sort_key(&self) -> DateTime<Utc> { self.given_at }
}

// ─── Feeding ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingSchedule {
  pub id:            Uuid,
  pub pet_id:        Uuid,
  pub food_name:     String,
  pub food_brand:    Option<String>,
  pub portion_size:  String,
  /// Times of day as `HH:MM` strings.
  #[serde(default)]
  pub feeding_times: Vec<String>,
  pub notes:         Option<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewFeedingSchedule {
  pub pet_id:        Uuid,
  pub food_name:     String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub food_brand:    Option<String>,
  pub portion_size:  String,
  pub feeding_times: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:         Option<String>,
}

impl Validate for NewFeedingSchedule {
  fn validate(&self) -> Result<(), ValidationError> {
    const MESSAGE: &str = "Please fill in food name and portion size";
    require_text("food_name", &self.food_name, MESSAGE)?;
    require_text("portion_size", &self.portion_size, MESSAGE)
  }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedingSchedulePatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub food_name:     Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub food_brand:    Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub portion_size:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub feeding_times: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:         Option<String>,
}

impl Validate for FeedingSchedulePatch {
  fn validate(&self) -> Result<(), ValidationError> {
    const MESSAGE: &str = "Please fill in food name and portion size";
    optional_text("food_name", self.food_name.as_deref(), MESSAGE)?;
    optional_text("portion_size", self.portion_size.as_deref(), MESSAGE)
  }
}

impl Record for FeedingSchedule {
  type Draft = NewFeedingSchedule;
  type Patch = FeedingSchedulePatch;

  const TABLE: &'static str = "feeding_schedules";
  const OWNER: Owner = Owner::Parent("pet_id");
  const ORDER: OrderBy = OrderBy::NEWEST_FIRST;
  const TRACKS_UPDATES: bool = true;

  fn id(&self) -> Uuid { self.id }

  fn owner_id(&self) -> Uuid { self.pet_id }

  fn sort_key(&self) -> DateTime<Utc> { self.created_at }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingLog {
  pub id:                  Uuid,
  pub pet_id:              Uuid,
  pub feeding_schedule_id: Option<Uuid>,
  pub food_name:           String,
  pub portion_size:        String,
  pub fed_at:              DateTime<Utc>,
  pub notes:               Option<String>,
  pub created_at:          DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewFeedingLog {
  pub pet_id:              Uuid,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub feeding_schedule_id: Option<Uuid>,
  pub food_name:           String,
  pub portion_size:        String,
  pub fed_at:              DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:               Option<String>,
}

impl NewFeedingLog {
  /// A feeding that followed `schedule` exactly.
  pub fn from_schedule(schedule: &FeedingSchedule, at: DateTime<Utc>) -> Self {
    Self {
      pet_id:              schedule.pet_id,
      feeding_schedule_id: Some(schedule.id),
      food_name:           schedule.food_name.clone(),
      portion_size:        schedule.portion_size.clone(),
      fed_at:              at,
      notes:               None,
    }
  }
}

impl Validate for NewFeedingLog {
  fn validate(&self) -> Result<(), ValidationError> {
    const MESSAGE: &str = "Please fill in food name and portion";
    require_text("food_name", &self.food_name, MESSAGE)?;
    require_text("portion_size", &self.portion_size, MESSAGE)
  }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedingLogPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub portion_size: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fed_at:       Option<DateTime<Utc>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:        Option<String>,
}

impl Validate for FeedingLogPatch {
  fn validate(&self) -> Result<(), ValidationError> {
    optional_text(
      "portion_size",
      self.portion_size.as_deref(),
      "Please fill in food name and portion",
    )
  }
}

impl Record for FeedingLog {
  type Draft = NewFeedingLog;
  type Patch = FeedingLogPatch;

  const TABLE: &'static str = "feeding_logs";
  const OWNER: Owner = Owner::Parent("pet_id");
  const ORDER: OrderBy = OrderBy::desc("fed_at");

  fn id(&self) -> Uuid { self.id }

  fn owner_id(&self) -> Uuid { self.pet_id }

  fn sort_key(&self) -> DateTime<Utc> { self.fed_at }
}
