use super::{KeyRange, Node, Result, Source};
use tracing::{Level, event};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
  /// Return every key.
  Scan,
  /// Return every key but only in response to `move_to`.
  Context,
  /// Stop after the first key.
  First,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
  Unseeked,
  Active,
  /// The source has nothing left. There may still be a lookahead.
  Drained,
}

/// Adapts one [Source] into a cursor. `has_next` pulls one entry ahead and
/// caches it so that it has no visible side effects.
#[derive(Debug)]
pub struct Leaf<S: Source> {
  source: S,
  range: KeyRange<S::Key>,
  mode: Mode,
  state: State,
  lookahead: Option<(S::Key, S::Payload)>,
  payload: Option<S::Payload>,
  matched: bool,
}

impl<S: Source> Leaf<S> {
  pub(crate) fn new(source: S, mode: Mode) -> Node<S> {
    Node::Leaf(Leaf {
      source,
      range: KeyRange::all(),
      mode,
      state: State::Unseeked,
      lookahead: None,
      payload: None,
      matched: false,
    })
  }

  pub(crate) fn is_context_required(&self) -> bool {
    self.mode == Mode::Context
  }

  pub(crate) fn is_exhausted(&self) -> bool {
    self.is_done() || (self.state == State::Drained && self.lookahead.is_none())
  }

  pub(crate) fn initialize(&mut self) -> Result<()> {
    if self.state == State::Unseeked {
      event!(Level::TRACE, "seeking leaf to {:?}", self.range);
      self.source.seek(&self.range)?;
      self.state = State::Active;
    }
    Ok(())
  }

  pub(crate) fn seek(&mut self, range: &KeyRange<S::Key>) -> Result<()> {
    self.range = range.clone();
    self.state = State::Unseeked;
    self.lookahead = None;
    self.payload = None;
    self.matched = false;
    self.initialize()
  }

  pub(crate) fn has_next(&mut self) -> Result<bool> {
    self.initialize()?;
    if self.is_done() {
      return Ok(false);
    }
    if self.lookahead.is_none() && self.state == State::Active {
      self.lookahead = self.source.next()?;
      if self.lookahead.is_none() {
        self.state = State::Drained;
      }
    }
    Ok(self.lookahead.is_some())
  }

  pub(crate) fn next(&mut self) -> Result<Option<S::Key>> {
    if !self.has_next()? {
      return Ok(None);
    }
    Ok(self.take_lookahead())
  }

  /// The first key at or after `pivot`. Checks the lookahead before touching
  /// the source because the source can't go backwards.
  pub(crate) fn move_to(&mut self, pivot: &S::Key) -> Result<Option<S::Key>> {
    self.initialize()?;
    if self.is_done() {
      return Ok(None);
    }
    if let Some((key, _)) = &self.lookahead {
      if S::transform(key) >= *pivot {
        return Ok(self.take_lookahead());
      }
      self.lookahead = None;
    }
    if self.state == State::Drained {
      return Ok(None);
    }
    let range = self.range.advanced_to(pivot);
    event!(Level::TRACE, "moving leaf to {:?}", range);
    self.source.seek(&range)?;
    self.lookahead = self.source.next()?;
    if self.lookahead.is_none() {
      self.state = State::Drained;
      return Ok(None);
    }
    Ok(self.take_lookahead())
  }

  pub(crate) fn payload(&self) -> Option<&S::Payload> {
    self.payload.as_ref()
  }

  fn take_lookahead(&mut self) -> Option<S::Key> {
    let (key, payload) = self.lookahead.take()?;
    self.payload = Some(payload);
    self.matched = true;
    Some(key)
  }

  /// A `First` leaf is done once it has matched anything.
  fn is_done(&self) -> bool {
    self.mode == Mode::First && self.matched
  }
}
