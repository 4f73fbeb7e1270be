use super::{Payload, Result};
use std::{fmt, ops::Bound};

/// A physical, sorted source of keys. Usually a scan over an index.
///
/// Once a key has been returned no earlier key may be returned until the
/// next [Source::seek].
pub trait Source {
  type Key: Ord + Clone + fmt::Debug;
  type Payload: Payload;

  /// Position the source at the first key inside `range`.
  fn seek(&mut self, range: &KeyRange<Self::Key>) -> Result<()>;

  /// Advance past the current entry and return the one after it.
  fn next(&mut self) -> Result<Option<(Self::Key, Self::Payload)>>;

  /// Map a raw key onto the key used for ordering and bucketing.
  ///
  /// Must be order preserving and idempotent, and must never map a key above
  /// itself. Seeking to a transformed key then can't skip a raw key that
  /// transforms onto it.
  fn transform(key: &Self::Key) -> Self::Key {
    key.clone()
  }
}

/// A range of keys that a [Source] is seeked to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRange<K> {
  pub start: Bound<K>,
  pub end: Bound<K>,
}

impl<K: Ord + Clone> KeyRange<K> {
  pub fn all() -> Self {
    KeyRange {
      start: Bound::Unbounded,
      end: Bound::Unbounded,
    }
  }

  pub fn new(start: Bound<K>, end: Bound<K>) -> Self {
    KeyRange { start, end }
  }

  pub fn contains(&self, key: &K) -> bool {
    self.after_start(key) && self.before_end(key)
  }

  /// Is `key` at or after the start of the range?
  pub fn after_start(&self, key: &K) -> bool {
    match &self.start {
      Bound::Unbounded => true,
      Bound::Included(s) => key >= s,
      Bound::Excluded(s) => key > s,
    }
  }

  /// Is `key` at or before the end of the range?
  pub fn before_end(&self, key: &K) -> bool {
    match &self.end {
      Bound::Unbounded => true,
      Bound::Included(e) => key <= e,
      Bound::Excluded(e) => key < e,
    }
  }

  /// This range with its start moved up to `pivot`. Pivots before the start
  /// leave the range alone.
  pub fn advanced_to(&self, pivot: &K) -> Self {
    if !self.after_start(pivot) {
      return self.clone();
    }
    KeyRange {
      start: Bound::Included(pivot.clone()),
      end: self.end.clone(),
    }
  }
}
