//! Age of a pet from its birth date.

use std::fmt;

use chrono::{DateTime, Datelike, Months, Utc};

use crate::date::CalendarDate;

/// Whole years and remaining whole months elapsed since a birth date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age {
  pub years:  u32,
  pub months: u32,
}

impl Age {
  /// Age at `now` of something born on `birth`. The birth date is anchored
  /// at noon UTC; a birth date in the future counts as zero months.
  pub fn at(birth: CalendarDate, now: DateTime<Utc>) -> Self {
    let total = whole_months_between(birth.anchor(), now);
    Self { years: total / 12, months: total % 12 }
  }

  pub fn total_months(&self) -> u32 { self.years * 12 + self.months }
}

impl fmt::Display for Age {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.years >= 1 {
      write!(f, "{}", plural(self.years, "year"))?;
      if self.months > 0 {
        write!(f, ", {}", plural(self.months, "month"))?;
      }
      Ok(())
    } else {
      write!(f, "{}", plural(self.months, "month"))
    }
  }
}

/// `"3 years, 2 months"`, `"1 year"`, `"11 months"` and so on.
pub fn format_age(birth: CalendarDate, now: DateTime<Utc>) -> String {
  Age::at(birth, now).to_string()
}

fn plural(n: u32, unit: &str) -> String {
  if n == 1 { format!("1 {unit}") } else { format!("{n} {unit}s") }
}

/// Number of calendar months that fit entirely between `start` and `end`.
/// Adding months clamps to the end of shorter months (Jan 31 + 1 month is the
/// last day of February).
fn whole_months_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
  if end <= start {
    return 0;
  }
  let estimate = (end.year() - start.year()) * 12 + end.month() as i32
    - start.month() as i32;
  let mut months = u32::try_from(estimate).unwrap_or(0);
  let overshoots = |m: u32| {
    start
      .checked_add_months(Months::new(m))
      .is_none_or(|shifted| shifted > end)
  };
  if months > 0 && overshoots(months) {
    months -= 1;
  }
  months
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at_noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
  }

  fn date(y: i32, m: u32, d: u32) -> CalendarDate {
    CalendarDate::from_ymd(y, m, d).unwrap()
  }

  #[test]
  fn exactly_one_year() {
    assert_eq!(format_age(date(2025, 10, 18), at_noon(2026, 10, 18)), "1 year");
  }

  #[test]
  fn eleven_months() {
    assert_eq!(format_age(date(2025, 11, 18), at_noon(2026, 10, 18)), "11 months");
  }

  #[test]
  fn thirteen_months() {
    assert_eq!(
      format_age(date(2025, 9, 18), at_noon(2026, 10, 18)),
      "1 year, 1 month"
    );
  }

  #[test]
  fn plural_years_and_months() {
    assert_eq!(
      format_age(date(2021, 7, 1), at_noon(2024, 10, 2)),
      "3 years, 3 months"
    );
  }

  #[test]
  fn a_day_short_of_the_month() {
    assert_eq!(format_age(date(2026, 9, 19), at_noon(2026, 10, 18)), "0 months");
    assert_eq!(format_age(date(2026, 9, 18), at_noon(2026, 10, 18)), "1 month");
  }

  #[test]
  fn early_morning_has_not_reached_the_noon_anchor() {
    let morning = Utc.with_ymd_and_hms(2026, 10, 18, 6, 0, 0).unwrap();
    assert_eq!(format_age(date(2025, 10, 18), morning), "11 months");
  }

  #[test]
  fn end_of_month_birthdays_clamp() {
    // Jan 31 + 1 month lands on Feb 28 in a common year.
    assert_eq!(Age::at(date(2025, 1, 31), at_noon(2025, 2, 28)).total_months(), 1);
    assert_eq!(Age::at(date(2025, 1, 31), at_noon(2025, 2, 27)).total_months(), 0);
  }

  #[test]
  fn future_birth_dates_are_zero() {
    assert_eq!(Age::at(date(2030, 1, 1), at_noon(2026, 1, 1)), Age {
      years:  0,
      months: 0,
    });
  }
}
