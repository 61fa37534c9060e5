//! Single-slot in-flight guard backing each store's busy flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// Held for the duration of one request. Dropping it clears the flag on every
/// exit path, early returns included.
pub(crate) struct InFlight<'a> {
  flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
  /// Claim the slot, or `None` if a request is already running.
  pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
    flag
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| Self { flag })
  }
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) { self.flag.store(false, Ordering::Release); }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn second_claim_fails_until_release() {
    let flag = AtomicBool::new(false);
    let first = InFlight::acquire(&flag).unwrap();
    assert!(InFlight::acquire(&flag).is_none());
    drop(first);
    assert!(InFlight::acquire(&flag).is_some());
    assert!(!flag.load(Ordering::Acquire));
  }
}
