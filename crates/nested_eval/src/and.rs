use super::{
  Cursor, KeyRange, Node, Payload, Result, Source,
  context::{self, ContextState, Verdict},
  heads::Heads,
  negation,
};
use std::mem;
use tracing::{Level, event, span};

#[derive(Debug)]
enum State<K> {
  Unprimed,
  /// Excludes are primed. Only used when probing.
  Ready,
  /// Every include is sitting on this key because it matched.
  Matched(K),
  Exhausted,
}

/// Intersects the includes and removes anything in the excludes.
///
/// Unconditional includes are merge joined through `heads`. Includes that
/// need a context are only probed once the unconditional ones agree on a
/// candidate. Without any unconditional includes there is nothing to
/// enumerate and the whole node must be probed.
#[derive(Debug)]
pub struct And<S: Source> {
  includes: Vec<Cursor<S>>,
  heads: Heads<S::Key>,
  context_includes: Vec<Cursor<S>>,
  context_include_state: ContextState<S::Key>,
  excludes: Vec<Cursor<S>>,
  exclude_heads: Heads<S::Key>,
  context_excludes: Vec<Cursor<S>>,
  context_exclude_state: ContextState<S::Key>,
  state: State<S::Key>,
  /// A match found by `has_next` but not yet returned.
  pending: Option<(S::Key, S::Payload)>,
  payload: Option<S::Payload>,
}

impl<S: Source> And<S> {
  pub(crate) fn new(
    includes: impl IntoIterator<Item = Cursor<S>>,
    excludes: impl IntoIterator<Item = Cursor<S>>,
  ) -> Node<S> {
    let (context_includes, includes): (Vec<_>, Vec<_>) = includes
      .into_iter()
      .partition(|c| c.is_context_required());
    let (context_excludes, excludes): (Vec<_>, Vec<_>) = excludes
      .into_iter()
      .partition(|c| c.is_context_required());
    Node::And(And {
      includes,
      heads: Heads::new(),
      context_include_state: ContextState::new(context_includes.len()),
      context_includes,
      excludes,
      exclude_heads: Heads::new(),
      context_exclude_state: ContextState::new(context_excludes.len()),
      context_excludes,
      state: State::Unprimed,
      pending: None,
      payload: None,
    })
  }

  pub(crate) fn is_context_required(&self) -> bool {
    self.includes.is_empty()
      && !(self.context_includes.is_empty()
        && self.excludes.is_empty()
        && self.context_excludes.is_empty())
  }

  pub(crate) fn is_exhausted(&self) -> bool {
    matches!(self.state, State::Exhausted) && self.pending.is_none()
  }

  pub(crate) fn initialize(&mut self) -> Result<()> {
    context::initialize_sources(&mut self.includes)?;
    context::initialize_sources(&mut self.context_includes)?;
    context::initialize_sources(&mut self.excludes)?;
    context::initialize_sources(&mut self.context_excludes)
  }

  pub(crate) fn seek(&mut self, range: &KeyRange<S::Key>) -> Result<()> {
    for c in self
      .includes
      .iter_mut()
      .chain(self.context_includes.iter_mut())
      .chain(self.excludes.iter_mut())
      .chain(self.context_excludes.iter_mut())
    {
      c.seek(range)?;
    }
    self.heads.clear();
    self.exclude_heads.clear();
    self.context_include_state.reset();
    self.context_exclude_state.reset();
    self.state = State::Unprimed;
    self.pending = None;
    self.payload = None;
    Ok(())
  }

  pub(crate) fn has_next(&mut self) -> Result<bool> {
    if self.pending.is_none() {
      self.pending = self.find(None)?;
    }
    Ok(self.pending.is_some())
  }

  pub(crate) fn next(&mut self) -> Result<Option<S::Key>> {
    let found = match self.pending.take() {
      Some(pending) => Some(pending),
      None => self.find(None)?,
    };
    Ok(self.accept(found))
  }

  pub(crate) fn move_to(&mut self, pivot: &S::Key) -> Result<Option<S::Key>> {
    if self.is_context_required() {
      return self.probe(pivot);
    }
    if let Some((key, _)) = &self.pending {
      if S::transform(key) >= *pivot {
        let pending = self.pending.take();
        return Ok(self.accept(pending));
      }
      self.pending = None;
    }
    let found = self.find(Some(pivot))?;
    Ok(self.accept(found))
  }

  pub(crate) fn payload(&self) -> Option<&S::Payload> {
    self.payload.as_ref()
  }

  fn accept(&mut self, found: Option<(S::Key, S::Payload)>) -> Option<S::Key> {
    let (key, payload) = found?;
    self.payload = Some(payload);
    Some(key)
  }

  /// Find the next match, at or after `floor` if there is one.
  fn find(&mut self, floor: Option<&S::Key>) -> Result<Option<(S::Key, S::Payload)>> {
    let span = span!(Level::TRACE, "and");
    let _guard = span.enter();
    let ready = match mem::replace(&mut self.state, State::Exhausted) {
      State::Exhausted => false,
      State::Unprimed => self.prime(floor)?,
      State::Ready => match floor {
        Some(floor) => self.move_includes(floor)?,
        None => true,
      },
      State::Matched(matched) => match floor {
        Some(floor) => self.move_includes(floor)?,
        None => self.advance(&matched)?,
      },
    };
    if !ready {
      event!(Level::TRACE, "exhausted");
      return Ok(None);
    }
    self.search()
  }

  fn prime(&mut self, floor: Option<&S::Key>) -> Result<bool> {
    if self.includes.is_empty() {
      return Ok(false);
    }
    self.initialize()?;
    for (idx, include) in self.includes.iter_mut().enumerate() {
      let first = match floor {
        Some(floor) => include.move_to(floor)?,
        None => include.next()?,
      };
      let Some(first) = first else {
        event!(Level::TRACE, "include {} is empty", idx);
        return Ok(false);
      };
      self.heads.insert(S::transform(&first), idx);
    }
    negation::prime(&mut self.excludes, &mut self.exclude_heads)?;
    Ok(true)
  }

  /// Step every include sitting on `key`. Any of them running out ends the
  /// intersection.
  fn advance(&mut self, key: &S::Key) -> Result<bool> {
    for idx in self.heads.take(key) {
      let Some(next) = self.includes[idx].next()? else {
        return Ok(false);
      };
      self.heads.insert(S::transform(&next), idx);
    }
    Ok(true)
  }

  /// Move every include below `key` up to it.
  fn move_includes(&mut self, key: &S::Key) -> Result<bool> {
    for idx in self.heads.take_below(key) {
      let Some(moved) = self.includes[idx].move_to(key)? else {
        return Ok(false);
      };
      self.heads.insert(S::transform(&moved), idx);
    }
    Ok(true)
  }

  fn search(&mut self) -> Result<Option<(S::Key, S::Payload)>> {
    loop {
      let (Some(lowest), Some(highest)) = (self.heads.first(), self.heads.last()) else {
        return Ok(None);
      };
      if lowest != highest {
        let highest = highest.clone();
        if !self.move_includes(&highest)? {
          return Ok(None);
        }
        continue;
      }
      let t = lowest.clone();
      if negation::is_filtered(&t, &mut self.excludes, &mut self.exclude_heads)? {
        if !self.advance(&t)? {
          return Ok(None);
        }
        continue;
      }
      let progressed = match self.apply_context(&t)? {
        Verdict::Match => {
          let found = self.matched(&t)?;
          self.state = State::Matched(t);
          return Ok(Some(found));
        }
        Verdict::Skip(to) => self.move_includes(&to)?,
        Verdict::Miss => self.advance(&t)?,
        Verdict::Exhausted => false,
      };
      if !progressed {
        return Ok(None);
      }
    }
  }

  /// Check a candidate that every unconditional include agrees on against
  /// the groups that need a context.
  fn apply_context(&mut self, t: &S::Key) -> Result<Verdict<S::Key>> {
    if !self.context_includes.is_empty() {
      let verdict = context::intersect(
        t,
        &mut self.context_includes,
        &mut self.context_include_state,
      )?;
      if verdict != Verdict::Match {
        return Ok(verdict);
      }
    }
    if !self.context_excludes.is_empty()
      && !context::union_negated(
        t,
        &mut self.context_excludes,
        &mut self.context_exclude_state,
      )?
    {
      return Ok(Verdict::Miss);
    }
    Ok(Verdict::Match)
  }

  /// Answer a pivot when there are no unconditional includes.
  fn probe(&mut self, t: &S::Key) -> Result<Option<S::Key>> {
    let span = span!(Level::TRACE, "and probe");
    let _guard = span.enter();
    match self.state {
      State::Exhausted => return Ok(None),
      State::Unprimed => {
        self.initialize()?;
        negation::prime(&mut self.excludes, &mut self.exclude_heads)?;
        self.state = State::Ready;
      }
      _ => {}
    }
    match self.apply_context(t)? {
      Verdict::Match => {}
      Verdict::Exhausted => {
        self.state = State::Exhausted;
        return Ok(None);
      }
      Verdict::Skip(_) | Verdict::Miss => return Ok(None),
    }
    if negation::is_filtered(t, &mut self.excludes, &mut self.exclude_heads)? {
      return Ok(None);
    }
    let (key, payload) = self.matched(t)?;
    self.payload = Some(payload);
    Ok(Some(key))
  }

  /// Combine the payloads of everything sitting on `t`. The key returned is
  /// the untransformed key of the first include on it.
  fn matched(&self, t: &S::Key) -> Result<(S::Key, S::Payload)> {
    let mut key = None;
    let mut payload = S::Payload::default();
    for idx in self.heads.get(t) {
      let include = &self.includes[*idx];
      if key.is_none() {
        key = include.current().cloned();
      }
      if let Some(p) = include.payload() {
        payload.combine(p)?;
      }
    }
    for idx in self.context_include_state.heads.get(t) {
      if let Some(p) = self.context_includes[*idx].payload() {
        payload.combine(p)?;
      }
    }
    Ok((key.unwrap_or_else(|| t.clone()), payload))
  }
}
