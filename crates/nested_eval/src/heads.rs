use std::{collections::BTreeMap, mem};

/// A sorted multimap from the current key of each cursor in a group to the
/// indices of the cursors sitting on it. Every positioned cursor is in exactly
/// one bucket until it's taken out to be advanced.
#[derive(Debug)]
pub(crate) struct Heads<K> {
  map: BTreeMap<K, Vec<usize>>,
  len: usize,
}

impl<K: Ord + Clone> Heads<K> {
  pub(crate) fn new() -> Heads<K> {
    Heads {
      map: BTreeMap::new(),
      len: 0,
    }
  }

  pub(crate) fn insert(&mut self, key: K, cursor: usize) {
    self.map.entry(key).or_default().push(cursor);
    self.len += 1;
  }

  /// Remove and return every cursor at `key`.
  pub(crate) fn take(&mut self, key: &K) -> Vec<usize> {
    let taken = self.map.remove(key).unwrap_or_default();
    self.len -= taken.len();
    taken
  }

  /// Remove and return every cursor at a key strictly below `key`.
  pub(crate) fn take_below(&mut self, key: &K) -> Vec<usize> {
    let at_or_above = self.map.split_off(key);
    let below = mem::replace(&mut self.map, at_or_above);
    let taken = below.into_values().flatten().collect::<Vec<_>>();
    self.len -= taken.len();
    taken
  }

  /// Cursors at `key`.
  pub(crate) fn get(&self, key: &K) -> &[usize] {
    self.map.get(key).map(|v| &v[..]).unwrap_or(&[])
  }

  /// Cursors at a key strictly above `key`.
  pub(crate) fn above<'a>(&'a self, key: &'a K) -> impl Iterator<Item = usize> + 'a {
    self
      .map
      .range(key..)
      .filter(move |(k, _)| *k != key)
      .flat_map(|(_, v)| v.iter().copied())
  }

  pub(crate) fn contains(&self, key: &K) -> bool {
    self.map.contains_key(key)
  }

  pub(crate) fn holds(&self, key: &K, cursor: usize) -> bool {
    self.get(key).contains(&cursor)
  }

  pub(crate) fn first(&self) -> Option<&K> {
    self.map.keys().next()
  }

  pub(crate) fn last(&self) -> Option<&K> {
    self.map.keys().next_back()
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub(crate) fn clear(&mut self) {
    self.map.clear();
    self.len = 0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn heads(entries: &[(u64, usize)]) -> Heads<u64> {
    let mut h = Heads::new();
    for (k, c) in entries {
      h.insert(*k, *c);
    }
    h
  }

  #[test]
  fn empty() {
    let h = heads(&[]);
    assert!(h.is_empty());
    assert_eq!(None, h.first());
    assert_eq!(None, h.last());
  }

  #[test]
  fn first_and_last() {
    let h = heads(&[(5, 0), (1, 1), (9, 2), (5, 3)]);
    assert_eq!(Some(&1), h.first());
    assert_eq!(Some(&9), h.last());
    assert_eq!(&[0, 3], h.get(&5));
  }

  #[test]
  fn take() {
    let mut h = heads(&[(5, 0), (1, 1), (5, 3)]);
    assert_eq!(vec![0, 3], h.take(&5));
    assert_eq!(Some(&1), h.first());
    assert!(!h.contains(&5));
    assert_eq!(Vec::<usize>::new(), h.take(&5));
  }

  #[test]
  fn take_below() {
    let mut h = heads(&[(5, 0), (1, 1), (9, 2), (3, 3), (5, 4)]);
    assert_eq!(vec![1, 3], h.take_below(&5));
    assert_eq!(Some(&9), h.last());
    assert_eq!(Some(&5), h.first());
  }

  #[test]
  fn take_below_everything() {
    let mut h = heads(&[(1, 0), (2, 1)]);
    assert_eq!(vec![0, 1], h.take_below(&10));
    assert!(h.is_empty());
  }

  #[test]
  fn above() {
    let h = heads(&[(5, 0), (1, 1), (9, 2), (7, 3)]);
    assert_eq!(vec![3, 2], h.above(&5).collect::<Vec<_>>());
    assert_eq!(vec![0, 3, 2], h.above(&4).collect::<Vec<_>>());
  }

  #[test]
  fn above_a_computed_key() {
    let h = heads(&[(5, 0), (1, 1), (9, 2)]);
    let expired = h.above(&(2 + 2)).collect::<Vec<_>>();
    assert_eq!(vec![0, 2], expired);
  }

  #[test]
  fn holds() {
    let h = heads(&[(5, 0), (1, 1)]);
    assert!(h.holds(&5, 0));
    assert!(!h.holds(&5, 1));
  }
}
