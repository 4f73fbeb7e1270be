use super::{
  Cursor, KeyRange, Node, Payload, Result, Source,
  context::{self, ContextState, Verdict},
  heads::Heads,
};
use std::mem;
use tracing::{Level, event, span};

#[derive(Debug)]
enum State<K> {
  Unprimed,
  /// Primed by a probe.
  Ready,
  /// Returned this key. Includes sitting on it move before the next one.
  Matched(K),
  Exhausted,
}

/// Merges the includes, then lets the excludes veto a candidate.
///
/// With only unconditional includes this is a plain merge and can be pulled.
/// Includes that need a context, or any exclude at all, make the whole node
/// need a context.
#[derive(Debug)]
pub struct Or<S: Source> {
  includes: Vec<Cursor<S>>,
  heads: Heads<S::Key>,
  context_includes: Vec<Cursor<S>>,
  context_include_state: ContextState<S::Key>,
  excludes: Vec<Cursor<S>>,
  exclude_state: ContextState<S::Key>,
  state: State<S::Key>,
  /// A match found by `has_next` but not yet returned.
  pending: Option<(S::Key, S::Payload)>,
  payload: Option<S::Payload>,
}

impl<S: Source> Or<S> {
  pub(crate) fn new(
    includes: impl IntoIterator<Item = Cursor<S>>,
    excludes: impl IntoIterator<Item = Cursor<S>>,
  ) -> Node<S> {
    let (context_includes, includes): (Vec<_>, Vec<_>) = includes
      .into_iter()
      .partition(|c| c.is_context_required());
    let excludes = excludes.into_iter().collect::<Vec<_>>();
    Node::Or(Or {
      includes,
      heads: Heads::new(),
      context_include_state: ContextState::new(context_includes.len()),
      context_includes,
      exclude_state: ContextState::new(excludes.len()),
      excludes,
      state: State::Unprimed,
      pending: None,
      payload: None,
    })
  }

  pub(crate) fn is_context_required(&self) -> bool {
    !self.context_includes.is_empty() || !self.excludes.is_empty()
  }

  pub(crate) fn is_exhausted(&self) -> bool {
    matches!(self.state, State::Exhausted) && self.pending.is_none()
  }

  pub(crate) fn initialize(&mut self) -> Result<()> {
    context::initialize_sources(&mut self.includes)?;
    context::initialize_sources(&mut self.context_includes)?;
    context::initialize_sources(&mut self.excludes)
  }

  pub(crate) fn seek(&mut self, range: &KeyRange<S::Key>) -> Result<()> {
    for c in self
      .includes
      .iter_mut()
      .chain(self.context_includes.iter_mut())
      .chain(self.excludes.iter_mut())
    {
      c.seek(range)?;
    }
    self.heads.clear();
    self.context_include_state.reset();
    self.exclude_state.reset();
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

  fn find(&mut self, floor: Option<&S::Key>) -> Result<Option<(S::Key, S::Payload)>> {
    let span = span!(Level::TRACE, "or");
    let _guard = span.enter();
    match mem::replace(&mut self.state, State::Exhausted) {
      State::Exhausted => return Ok(None),
      State::Unprimed => self.prime(floor)?,
      State::Ready => {
        if let Some(floor) = floor {
          self.move_includes(floor)?;
        }
      }
      State::Matched(matched) => match floor {
        Some(floor) => self.move_includes(floor)?,
        None => self.advance(&matched)?,
      },
    }
    let Some(t) = self.heads.first().cloned() else {
      event!(Level::TRACE, "exhausted");
      return Ok(None);
    };
    let found = self.matched(&t)?;
    self.state = State::Matched(t);
    Ok(Some(found))
  }

  /// Position every include. Empty includes are dropped.
  fn prime(&mut self, floor: Option<&S::Key>) -> Result<()> {
    self.initialize()?;
    for (idx, include) in self.includes.iter_mut().enumerate() {
      let first = match floor {
        Some(floor) => include.move_to(floor)?,
        None => include.next()?,
      };
      if let Some(first) = first {
        self.heads.insert(S::transform(&first), idx);
      }
    }
    Ok(())
  }

  fn advance(&mut self, key: &S::Key) -> Result<()> {
    for idx in self.heads.take(key) {
      if let Some(next) = self.includes[idx].next()? {
        self.heads.insert(S::transform(&next), idx);
      }
    }
    Ok(())
  }

  fn move_includes(&mut self, key: &S::Key) -> Result<()> {
    for idx in self.heads.take_below(key) {
      if let Some(moved) = self.includes[idx].move_to(key)? {
        self.heads.insert(S::transform(&moved), idx);
      }
    }
    Ok(())
  }

  /// Does `t` match? Either include group can accept it. If one does the
  /// excludes get a chance to veto it.
  fn probe(&mut self, t: &S::Key) -> Result<Option<S::Key>> {
    let span = span!(Level::TRACE, "or probe");
    let _guard = span.enter();
    match self.state {
      State::Exhausted => return Ok(None),
      State::Unprimed => {
        self.prime(Some(t))?;
        self.state = State::Ready;
      }
      _ => self.move_includes(t)?,
    }
    let mut matched = self.heads.contains(t);
    if !self.context_includes.is_empty() {
      let verdict = context::union(
        t,
        &mut self.context_includes,
        &mut self.context_include_state,
      )?;
      matched |= verdict == Verdict::Match;
    }
    if !matched {
      if self.heads.is_empty() && self.context_include_state.is_exhausted() {
        event!(Level::TRACE, "exhausted");
        self.state = State::Exhausted;
      }
      return Ok(None);
    }
    if !self.excludes.is_empty()
      && !context::intersect_negated(t, &mut self.excludes, &mut self.exclude_state)?
    {
      return Ok(None);
    }
    let (_, payload) = self.matched(t)?;
    self.payload = Some(payload);
    Ok(Some(t.clone()))
  }

  /// Combine the payloads of every include on `t`. The key returned is the
  /// untransformed key of the first include on it.
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
