//! Plain-text rendering of records for the terminal.

use chrono::{DateTime, Utc};
use pawtrack_core::{
  CalendarDate,
  age::format_age,
  care::{FeedingSchedule, Medication, MedicationLog, VetVisit},
  document::Document,
  expense::Expense,
  pet::{Pet, WeightRecord},
  summary::{ExpenseSummary, format_amount},
};

const TIME: &str = "%Y-%m-%d %H:%M";

fn short(dt: DateTime<Utc>) -> String { dt.format(TIME).to_string() }

pub fn pet_line(pet: &Pet, now: DateTime<Utc>) -> String {
  let mut line = format!("{}  {} ({}", pet.id, pet.name, pet.kind);
  if let Some(breed) = &pet.breed {
    line.push_str(&format!(", {breed}"));
  }
  line.push(')');
  if let Some(born) = pet.date_of_birth {
    line.push_str(&format!(", {}", format_age(born, now)));
  }
  line
}

pub fn pet_details(pet: &Pet, now: DateTime<Utc>, photo: Option<&str>) -> String {
  let mut out = vec![format!("{} ({})", pet.name, pet.kind)];
  let mut field = |label: &str, value: Option<String>| {
    if let Some(value) = value {
      out.push(format!("  {label:<10} {value}"));
    }
  };
  field("id", Some(pet.id.to_string()));
  field("breed", pet.breed.clone());
  field(
    "born",
    pet
      .date_of_birth
      .map(|d| format!("{d} ({})", format_age(d, now))),
  );
  field("weight", pet.weight.map(|w| format!("{w} {}", pet.weight_unit)));
  field("size", pet.size.map(|s| format!("{s} {}", pet.size_unit)));
  field("color", pet.color.clone());
  field("microchip", pet.microchip_id.clone());
  field("photo", photo.map(str::to_owned));
  field("notes", pet.notes.clone());
  out.join("\n")
}

pub fn weight_line(record: &WeightRecord) -> String {
  format!(
    "{}  {}  {} {}{}",
    record.id,
    short(record.recorded_at),
    record.weight,
    record.weight_unit,
    record
      .notes
      .as_deref()
      .map(|n| format!("  {n}"))
      .unwrap_or_default()
  )
}

pub fn visit_line(visit: &VetVisit) -> String {
  let status = if visit.completed { "done" } else { "open" };
  let mut line = format!(
    "{}  {}  {} with {} [{status}]",
    visit.id,
    short(visit.scheduled_at),
    visit.visit_type,
    visit.vet_name
  );
  if let Some(cost) = visit.cost {
    line.push_str(&format!("  {}", format_amount(cost)));
  }
  line
}

pub fn medication_line(med: &Medication) -> String {
  let mut line = format!(
    "{}  {} {} ({}) from {}",
    med.id, med.name, med.dosage, med.frequency, med.start_date
  );
  if let Some(end) = med.end_date {
    line.push_str(&format!(" to {end}"));
  }
  if let Some(times) = med.time_of_day.as_ref().filter(|t| !t.is_empty()) {
    line.push_str(&format!(" at {}", times.join(", ")));
  }
  line
}

pub fn dose_line(log: &MedicationLog) -> String {
  let what = if log.skipped { "skipped" } else { "given" };
  format!("{}  {what} {}", log.id, short(log.given_at))
}

pub fn schedule_line(schedule: &FeedingSchedule) -> String {
  let brand = schedule
    .food_brand
    .as_deref()
    .map(|b| format!(" ({b})"))
    .unwrap_or_default();
  let times = if schedule.feeding_times.is_empty() {
    String::new()
  } else {
    format!(" at {}", schedule.feeding_times.join(", "))
  };
  format!(
    "{}  {}{brand}, {}{times}",
    schedule.id, schedule.food_name, schedule.portion_size
  )
}

pub fn expense_line(expense: &Expense) -> String {
  format!(
    "{}  {}  {:<11} {} {}  {}",
    expense.id,
    expense.date,
    expense.category.to_string(),
    format_amount(expense.amount),
    expense.currency,
    expense.description
  )
}

pub fn summary(summary: &ExpenseSummary, month: CalendarDate) -> String {
  let mut out = vec![
    format!(
      "This month ({}): {}",
      month.naive().format("%B %Y"),
      format_amount(summary.window_total)
    ),
    format!("All time: {}", format_amount(summary.total)),
  ];
  for share in summary.shares() {
    out.push(format!(
      "  {:<11} {:>10}  {:>5.1}%",
      share.category.to_string(),
      format_amount(share.amount),
      share.share * 100.0
    ));
  }
  out.join("\n")
}

pub fn document_line(doc: &Document, today: CalendarDate) -> String {
  let expiry = match doc.expiry_date {
    Some(date) if doc.is_expired(today) => format!("  expired {date}"),
    Some(date) => format!("  expires {date}"),
    None => String::new(),
  };
  format!("{}  {} [{}] {} bytes{expiry}", doc.id, doc.name, doc.doc_type, doc.file_size)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use pawtrack_core::{document::DocumentType, expense::ExpenseCategory, pet::PetKind};
  use uuid::Uuid;

  use super::*;

  fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
  }

  #[test]
  fn pet_line_shows_age() {
    let pet: Pet = serde_json::from_value(serde_json::json!({
      "id": Uuid::nil(),
      "user_id": Uuid::nil(),
      "name": "Rex",
      "type": "dog",
      "breed": "Beagle",
      "date_of_birth": "2022-03-10",
      "weight": null,
      "size": null,
      "color": null,
      "microchip_id": null,
      "photo_url": null,
      "notes": null,
      "created_at": "2024-01-01T00:00:00Z",
    }))
    .unwrap();
    assert_eq!(pet.kind, PetKind::Dog);
    assert_eq!(
      pet_line(&pet, noon(2024, 6, 10)),
      format!("{}  Rex (dog, Beagle), 2 years, 3 months", Uuid::nil())
    );
  }

  #[test]
  fn expired_documents_are_flagged() {
    let doc = Document {
      id:          Uuid::nil(),
      pet_id:      Uuid::nil(),
      name:        "Rabies".into(),
      doc_type:    DocumentType::Vaccination,
      file_url:    "documents/x/1-rabies.pdf".into(),
      file_type:   "application/pdf".into(),
      file_size:   10,
      notes:       None,
      expiry_date: CalendarDate::from_ymd(2024, 1, 1),
      created_at:  noon(2023, 1, 1),
    };
    let today = CalendarDate::from_ymd(2024, 1, 2).unwrap();
    assert!(document_line(&doc, today).ends_with("expired 2024-01-01"));
  }

  #[test]
  fn expense_summary_lists_largest_first() {
    let mut by_category = std::collections::BTreeMap::new();
    by_category.insert(ExpenseCategory::Food, 10.0);
    by_category.insert(ExpenseCategory::Vet, 30.0);
    let text = summary(
      &ExpenseSummary { total: 40.0, window_total: 10.0, by_category },
      CalendarDate::from_ymd(2024, 5, 1).unwrap(),
    );
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "This month (May 2024): 10.00");
    assert_eq!(lines[1], "All time: 40.00");
    assert!(lines[2].trim_start().starts_with("vet"));
    assert!(lines[3].trim_start().starts_with("food"));
  }
}
