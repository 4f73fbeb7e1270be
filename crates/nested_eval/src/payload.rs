use super::Result;
use std::{collections::BTreeSet, fmt};

/// Side data attached to each key. When several cursors agree on a key their
/// payloads are folded together with [Payload::combine].
pub trait Payload: Clone + Default + fmt::Debug {
  /// Fold `other` into `self`. Must be associative and free of side effects.
  /// Payloads that can't be merged return [crate::Error::PayloadMismatch].
  fn combine(&mut self, other: &Self) -> Result<()>;
}

impl Payload for () {
  fn combine(&mut self, _other: &Self) -> Result<()> {
    Ok(())
  }
}

impl<T: Ord + Clone + fmt::Debug> Payload for BTreeSet<T> {
  fn combine(&mut self, other: &Self) -> Result<()> {
    self.extend(other.iter().cloned());
    Ok(())
  }
}
