//! Keeping time-ordered histories sorted as entries arrive.

use crate::record::Direction;

/// Insert `item` and re-sort by `key`. The sort is stable, so entries with
/// equal keys keep their existing order and the new one lands after them.
///
/// Appending alone is not enough: a weight entered today may be back-dated to
/// last week.
pub fn insert_sorted<T, K, F>(items: &mut Vec<T>, item: T, direction: Direction, key: F)
where
  K: Ord,
  F: Fn(&T) -> K,
{
  items.push(item);
  resort(items, direction, key);
}

/// Stable sort of `items` by `key` in `direction`.
pub fn resort<T, K, F>(items: &mut [T], direction: Direction, key: F)
where
  K: Ord,
  F: Fn(&T) -> K,
{
  match direction {
    Direction::Ascending => items.sort_by_key(&key),
    Direction::Descending => items.sort_by(|a, b| key(b).cmp(&key(a))),
  }
}
