//! Splitting collections into the groups a list screen shows.

use chrono::{DateTime, Utc};

use crate::{care::{FeedingLog, Medication}, date::CalendarDate};

/// Something booked for a point in time that can be marked done.
pub trait Scheduled {
  fn scheduled_at(&self) -> DateTime<Utc>;
  fn is_completed(&self) -> bool;
}

/// Upcoming iff not completed and scheduled strictly after `now`. An event
/// scheduled for exactly `now` is already past.
pub fn is_upcoming<T: Scheduled>(item: &T, now: DateTime<Utc>) -> bool {
  !item.is_completed() && item.scheduled_at() > now
}

#[derive(Debug)]
pub struct Partition<'a, T> {
  pub upcoming: Vec<&'a T>,
  pub past:     Vec<&'a T>,
}

/// Split `items` into upcoming and past, preserving their relative order.
pub fn partition_upcoming<T: Scheduled>(
  items: &[T],
  now: DateTime<Utc>,
) -> Partition<'_, T> {
  let (upcoming, past): (Vec<&T>, Vec<&T>) =
    items.iter().partition(|item| is_upcoming(*item, now));
  Partition { upcoming, past }
}

/// Active medications first, then the ones that have been stopped.
pub fn partition_active(medications: &[Medication]) -> (Vec<&Medication>, Vec<&Medication>) {
  medications.iter().partition(|m| m.active)
}

/// Number of feedings logged on `today` (UTC calendar day).
pub fn fed_on(logs: &[FeedingLog], today: CalendarDate) -> usize {
  logs
    .iter()
    .filter(|log| CalendarDate::today(log.fed_at) == today)
    .count()
}
