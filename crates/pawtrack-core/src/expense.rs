//! Money spent on a pet.

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

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize,
  Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ExpenseCategory {
  Food,
  Vet,
  Medication,
  Grooming,
  Accessories,
  Insurance,
  #[default]
  Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
  pub id:          Uuid,
  pub pet_id:      Uuid,
  pub category:    ExpenseCategory,
  pub amount:      f64,
  pub currency:    String,
  pub description: String,
  pub date:        CalendarDate,
  pub receipt_url: Option<String>,
  pub notes:       Option<String>,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewExpense {
  pub pet_id:      Uuid,
  pub category:    ExpenseCategory,
  pub amount:      f64,
  pub currency:    String,
  pub description: String,
  pub date:        CalendarDate,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub receipt_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:       Option<String>,
}

impl NewExpense {
  pub fn new(
    pet_id: Uuid,
    category: ExpenseCategory,
    amount: f64,
    description: impl Into<String>,
    date: CalendarDate,
  ) -> Self {
    Self {
      pet_id,
      category,
      amount,
      currency: DEFAULT_CURRENCY.to_owned(),
      description: description.into(),
      date,
      receipt_url: None,
      notes: None,
    }
  }
}

impl Validate for NewExpense {
  fn validate(&self) -> Result<(), ValidationError> {
    const MESSAGE: &str = "Please fill in amount and description";
    require_positive("amount", self.amount, MESSAGE)?;
    require_text("description", &self.description, MESSAGE)
  }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpensePatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category:    Option<ExpenseCategory>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub amount:      Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date:        Option<CalendarDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:       Option<String>,
}

impl Validate for ExpensePatch {
  fn validate(&self) -> Result<(), ValidationError> {
    const MESSAGE: &str = "Please fill in amount and description";
    optional_positive("amount", self.amount, MESSAGE)?;
    optional_text("description", self.description.as_deref(), MESSAGE)
  }
}

impl Record for Expense {
  type Draft = NewExpense;
  type Patch = ExpensePatch;

  const TABLE: &'static str = "expenses";
  const OWNER: Owner = Owner::Parent("pet_id");
  const ORDER: OrderBy = OrderBy::desc("date");

  fn id(&self) -> Uuid { self.id }

  fn owner_id(&self) -> Uuid { self.pet_id }

  fn sort_key(&self) -> DateTime<Utc> { self.date.anchor() }
}
