//! Calendar dates — dates without a time of day or zone.
//!
//! Birth dates, expense dates and document expiries are stored by the backend
//! as bare `YYYY-MM-DD` strings. Treating them as instants invites off-by-one
//! errors whenever a local offset is applied, so they get their own type and
//! are only ever compared in UTC.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A date in the proleptic Gregorian calendar, serialised as `YYYY-MM-DD`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
  pub fn new(date: NaiveDate) -> Self { Self(date) }

  /// Build from year, month and day; `None` if the date does not exist.
  pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
    NaiveDate::from_ymd_opt(year, month, day).map(Self)
  }

  /// The UTC calendar date containing `now`.
  pub fn today(now: DateTime<Utc>) -> Self { Self(now.date_naive()) }

  pub fn naive(&self) -> NaiveDate { self.0 }

  /// The instant this date stands for when compared against timestamps:
  /// 12:00 UTC on the day. Noon keeps the day stable under any UTC offset a
  /// caller might later render it in.
  pub fn anchor(&self) -> DateTime<Utc> {
    self.0.and_time(NaiveTime::MIN).and_utc() + Duration::hours(12)
  }

  /// First day of the month containing this date.
  pub fn first_of_month(&self) -> Self {
    Self(self.0.with_day(1).unwrap_or(self.0))
  }

  /// Last day of the month containing this date.
  pub fn last_of_month(&self) -> Self {
    let first = self.first_of_month().0;
    Self(
      first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(self.0),
    )
  }
}

impl fmt::Display for CalendarDate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format("%Y-%m-%d"))
  }
}

impl FromStr for CalendarDate {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
      .map(Self)
      .map_err(|_| Error::InvalidDate(s.to_owned()))
  }
}

impl From<NaiveDate> for CalendarDate {
  fn from(date: NaiveDate) -> Self { Self(date) }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Timelike};

  use super::*;

  #[test]
  fn anchors_at_noon_utc() {
    let d: CalendarDate = "2024-02-29".parse().unwrap();
    let anchor = d.anchor();
    assert_eq!(anchor.hour(), 12);
    assert_eq!(anchor.date_naive(), d.naive());
  }

  #[test]
  fn serialises_as_plain_date() {
    let d = CalendarDate::from_ymd(2023, 7, 4).unwrap();
    assert_eq!(serde_json::to_string(&d).unwrap(), "\"2023-07-04\"");
    let back: CalendarDate = serde_json::from_str("\"2023-07-04\"").unwrap();
    assert_eq!(back, d);
  }

  #[test]
  fn rejects_timestamps() {
    assert!("2023-07-04T10:00:00Z".parse::<CalendarDate>().is_err());
  }

  #[test]
  fn month_bounds() {
    let d = CalendarDate::from_ymd(2024, 2, 14).unwrap();
    assert_eq!(d.first_of_month(), CalendarDate::from_ymd(2024, 2, 1).unwrap());
    assert_eq!(d.last_of_month(), CalendarDate::from_ymd(2024, 2, 29).unwrap());

    let dec = CalendarDate::from_ymd(2025, 12, 3).unwrap();
    assert_eq!(dec.last_of_month(), CalendarDate::from_ymd(2025, 12, 31).unwrap());
  }

  #[test]
  fn today_uses_utc_day() {
    let late = Utc.with_ymd_and_hms(2026, 3, 9, 23, 59, 59).unwrap();
    assert_eq!(CalendarDate::today(late), CalendarDate::from_ymd(2026, 3, 9).unwrap());
  }
}
