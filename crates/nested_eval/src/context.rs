//! Driving a group of cursors that must be probed with a pivot.
//!
//! Each group owns one [ContextState]. The functions here move the group to a
//! pivot and then classify what they found. They never look at anything but
//! the group they are handed.

use super::{Cursor, Kind, Result, Source, heads::Heads};
use tracing::{Level, event};

/// Does a context-exclude entry exclude the pivot?
///
/// A leaf entry stands for the negation of its own keys so it excludes the
/// pivot when it matched. A branch entry is already a junction of
/// negations so matching means the negation holds and the pivot is *not*
/// excluded.
pub fn excludes_pivot(kind: Kind, matched: bool) -> bool {
  match kind {
    Kind::Leaf => matched,
    Kind::Branch => !matched,
  }
}

/// What a group made of the most recent pivot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Verdict<K> {
  Match,
  /// Nothing can match before this key.
  Skip(K),
  Miss,
  /// Nothing can ever match again.
  Exhausted,
}

#[derive(Debug)]
pub(crate) struct ContextState<K> {
  /// Cursors that found a value, keyed by its transformed form.
  pub(crate) heads: Heads<K>,
  /// Cursors that found nothing for a pivot, keyed by the pivot.
  pub(crate) null_heads: Heads<K>,
  /// Cursors sitting after the most recent pivot.
  pub(crate) expired: Vec<usize>,
  pub(crate) exhausted: Vec<usize>,
  untouched: Vec<usize>,
  len: usize,
}

impl<K: Ord + Clone> ContextState<K> {
  pub(crate) fn new(len: usize) -> Self {
    ContextState {
      heads: Heads::new(),
      null_heads: Heads::new(),
      expired: vec![],
      exhausted: vec![],
      untouched: (0..len).collect(),
      len,
    }
  }

  /// Forget everything, as though no cursor had been touched.
  pub(crate) fn reset(&mut self) {
    *self = ContextState::new(self.len);
  }

  pub(crate) fn is_exhausted(&self) -> bool {
    self.exhausted.len() == self.len
  }
}

pub(crate) fn initialize_sources<S: Source>(sources: &mut [Cursor<S>]) -> Result<()> {
  for source in sources {
    source.initialize()?;
  }
  Ok(())
}

/// Take every cursor that must be probed with `t` out of the maps. That's the
/// untouched ones and anything sitting below `t`.
pub(crate) fn sources_to_move<K: Ord + Clone>(t: &K, state: &mut ContextState<K>) -> Vec<usize> {
  let mut to_move = std::mem::take(&mut state.untouched);
  to_move.extend(state.heads.take_below(t));
  to_move.extend(state.null_heads.take_below(t));
  to_move
}

pub(crate) fn process_moves<S: Source>(
  t: &S::Key,
  to_move: Vec<usize>,
  sources: &mut [Cursor<S>],
  state: &mut ContextState<S::Key>,
) -> Result<()> {
  for idx in to_move {
    match sources[idx].move_to(t)? {
      Some(found) => state.heads.insert(S::transform(&found), idx),
      None if sources[idx].is_exhausted() => state.exhausted.push(idx),
      None => state.null_heads.insert(t.clone(), idx),
    }
  }
  Ok(())
}

pub(crate) fn move_sources<S: Source>(
  t: &S::Key,
  sources: &mut [Cursor<S>],
  state: &mut ContextState<S::Key>,
) -> Result<()> {
  let to_move = sources_to_move(t, state);
  event!(Level::TRACE, "moving {} context sources to {:?}", to_move.len(), t);
  process_moves(t, to_move, sources, state)?;
  state.expired = state.heads.above(t).collect();
  Ok(())
}

/// Every cursor must be on `t`.
pub(crate) fn eval_and<K: Ord + Clone>(t: &K, state: &ContextState<K>) -> Verdict<K> {
  if !state.exhausted.is_empty() {
    return Verdict::Exhausted;
  }
  if !state.null_heads.is_empty() {
    return Verdict::Miss;
  }
  if state.heads.get(t).len() == state.len {
    return Verdict::Match;
  }
  match state.heads.last() {
    Some(last) if !state.expired.is_empty() => Verdict::Skip(last.clone()),
    _ => Verdict::Miss,
  }
}

/// Any cursor must be on `t`.
pub(crate) fn eval_or<K: Ord + Clone>(t: &K, state: &ContextState<K>) -> Verdict<K> {
  if state.heads.contains(t) {
    return Verdict::Match;
  }
  if state.is_exhausted() {
    return Verdict::Exhausted;
  }
  if !state.null_heads.is_empty() {
    return Verdict::Miss;
  }
  match state.heads.first() {
    Some(first) => Verdict::Skip(first.clone()),
    None => Verdict::Exhausted,
  }
}

/// Is `t` accepted by a conjunction of negations? Only if none of the
/// cursors is on it.
pub(crate) fn eval_and_negated<K: Ord + Clone>(t: &K, state: &ContextState<K>) -> bool {
  !state.heads.contains(t)
}

/// Is `t` accepted by a disjunction of negations? Only if at least one entry
/// doesn't exclude it. An empty group accepts everything.
pub(crate) fn eval_or_negated<S: Source>(
  t: &S::Key,
  sources: &[Cursor<S>],
  state: &ContextState<S::Key>,
) -> bool {
  if sources.is_empty() {
    return true;
  }
  sources
    .iter()
    .enumerate()
    .any(|(idx, source)| !excludes_pivot(source.kind(), state.heads.holds(t, idx)))
}

pub(crate) fn intersect<S: Source>(
  t: &S::Key,
  sources: &mut [Cursor<S>],
  state: &mut ContextState<S::Key>,
) -> Result<Verdict<S::Key>> {
  move_sources(t, sources, state)?;
  Ok(eval_and(t, state))
}

pub(crate) fn union<S: Source>(
  t: &S::Key,
  sources: &mut [Cursor<S>],
  state: &mut ContextState<S::Key>,
) -> Result<Verdict<S::Key>> {
  move_sources(t, sources, state)?;
  Ok(eval_or(t, state))
}

/// Is `t` accepted by a group of negated alternatives? It's vetoed only if
/// every alternative excludes it. Once a leaf alternative runs out it can
/// never exclude anything again so the group stops being probed.
pub(crate) fn intersect_negated<S: Source>(
  t: &S::Key,
  sources: &mut [Cursor<S>],
  state: &mut ContextState<S::Key>,
) -> Result<bool> {
  if state
    .exhausted
    .iter()
    .any(|idx| sources[*idx].kind() == Kind::Leaf)
  {
    return Ok(true);
  }
  move_sources(t, sources, state)?;
  let accepted = eval_or_negated(t, sources, state);
  if !accepted {
    event!(Level::TRACE, "{:?} vetoed by every exclude", t);
  }
  Ok(accepted)
}

/// Is `t` accepted when any match in the group excludes it?
pub(crate) fn union_negated<S: Source>(
  t: &S::Key,
  sources: &mut [Cursor<S>],
  state: &mut ContextState<S::Key>,
) -> Result<bool> {
  move_sources(t, sources, state)?;
  let accepted = eval_and_negated(t, state);
  if !accepted {
    event!(Level::TRACE, "{:?} is excluded", t);
  }
  Ok(accepted)
}
