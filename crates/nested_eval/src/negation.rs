use super::{Cursor, Result, Source, heads::Heads};
use tracing::{Level, event};

/// Position every exclude on its first key so it has a bucket in `heads`.
/// Excludes with no keys at all can never exclude anything and are dropped.
pub(crate) fn prime<S: Source>(
  excludes: &mut [Cursor<S>],
  heads: &mut Heads<S::Key>,
) -> Result<()> {
  for (idx, exclude) in excludes.iter_mut().enumerate() {
    exclude.initialize()?;
    if let Some(first) = exclude.next()? {
      heads.insert(S::transform(&first), idx);
    }
  }
  Ok(())
}

/// Is `t` excluded by any of `excludes`?
///
/// Excludes sitting below `t` are moved up to it. That's a side effect,
/// the next call sees the moved excludes. An exclude that runs out is never
/// consulted again.
pub(crate) fn is_filtered<S: Source>(
  t: &S::Key,
  excludes: &mut [Cursor<S>],
  heads: &mut Heads<S::Key>,
) -> Result<bool> {
  if heads.contains(t) {
    return Ok(true);
  }
  for idx in heads.take_below(t) {
    if let Some(moved) = excludes[idx].move_to(t)? {
      heads.insert(S::transform(&moved), idx);
    }
  }
  let filtered = heads.contains(t);
  if filtered {
    event!(Level::TRACE, "{:?} is excluded", t);
  }
  Ok(filtered)
}
