//! Lazy evaluation of `AND`, `OR`, and `NOT` over sorted key streams.
//!
//! A query tree is evaluated as one forward only [Cursor]. Sub-trees that can
//! be enumerated are pulled with [Cursor::next]. Sub-trees containing negation
//! can't be enumerated, there is no list of keys that *aren't* in a posting
//! list, so those are probed with a candidate key using [Cursor::move_to].

mod and;
mod context;
mod heads;
mod leaf;
mod negation;
mod r#or;
mod payload;
mod root;
mod source;

#[cfg(test)]
mod properties;

pub use context::excludes_pivot;
pub use payload::Payload;
pub use root::Root;
pub use source::{KeyRange, Source};

use std::error;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
  #[error("{0} requires a context and can only be driven with move_to")]
  ContextRequired(&'static str),
  #[error("can't move to {pivot} from {last}")]
  MoveNotForward { pivot: String, last: String },
  #[error("can't combine payloads: {0}")]
  PayloadMismatch(String),
  #[error("source read failed: {0}")]
  Read(#[source] Box<dyn error::Error + Send + Sync>),
  #[error("evaluation aborted by an earlier error")]
  Aborted,
}

impl Error {
  /// Wrap a failure reading a physical source.
  pub fn read(e: impl error::Error + Send + Sync + 'static) -> Self {
    Error::Read(Box::new(e))
  }
}

pub type Result<V> = std::result::Result<V, Error>;

/// Does this cursor wrap a physical scan or compose other cursors?
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
  Leaf,
  Branch,
}

/// Can this cursor be pulled with `next` or must it be probed with `move_to`?
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Context {
  Unconditional,
  Required,
}

#[derive(Debug)]
#[non_exhaustive]
pub enum Node<S: Source> {
  /// Match nothing.
  Empty,
  /// Match keys from a [Source].
  Leaf(leaf::Leaf<S>),
  /// Match the `AND` of many cursors, less any excluded ones.
  And(and::And<S>),
  /// Match the `OR` of many cursors.
  Or(or::Or<S>),
}

/// One node in an evaluation tree.
///
/// Keys are always returned in ascending order. The ordering contract is
/// checked here so the nodes don't each have to.
#[derive(Debug)]
pub struct Cursor<S: Source> {
  node: Node<S>,
  kind: Kind,
  context: Context,
  /// The most recently returned key.
  last: Option<S::Key>,
  /// The most recent pivot and what it answered. Cleared by `next`.
  last_move: Option<(S::Key, Option<S::Key>)>,
}

impl<S: Source> Cursor<S> {
  pub fn empty() -> Self {
    Self::from_node(Node::Empty)
  }

  pub fn leaf(source: S) -> Self {
    Self::from_node(leaf::Leaf::new(source, leaf::Mode::Scan))
  }

  /// A leaf that may only be probed with [Cursor::move_to].
  pub fn context_leaf(source: S) -> Self {
    Self::from_node(leaf::Leaf::new(source, leaf::Mode::Context))
  }

  /// A leaf that stops after its first match. For callers that only care
  /// whether anything matches.
  pub fn exists(source: S) -> Self {
    Self::from_node(leaf::Leaf::new(source, leaf::Mode::First))
  }

  /// Match keys in every one of `includes` that aren't in any of `excludes`.
  ///
  /// Each group is split into cursors that need a context and those that
  /// don't. Without an unconditional include there is nothing to enumerate so
  /// the result requires a context.
  pub fn and(
    includes: impl IntoIterator<Item = Self>,
    excludes: impl IntoIterator<Item = Self>,
  ) -> Self {
    Self::from_node(and::And::new(includes, excludes))
  }

  /// Match keys in any of `includes` unless vetoed by `excludes`.
  ///
  /// Every exclude is one negated alternative and always requires a context.
  /// A leaf exclude stands for the negation of its own keys. A branch exclude
  /// must already be the negated form, a junction of excludes. See
  /// [excludes_pivot].
  pub fn or(
    includes: impl IntoIterator<Item = Self>,
    excludes: impl IntoIterator<Item = Self>,
  ) -> Self {
    Self::from_node(or::Or::new(includes, excludes))
  }

  fn from_node(node: Node<S>) -> Self {
    let (kind, context_required) = match &node {
      Node::Empty => (Kind::Leaf, false),
      Node::Leaf(l) => (Kind::Leaf, l.is_context_required()),
      Node::And(a) => (Kind::Branch, a.is_context_required()),
      Node::Or(o) => (Kind::Branch, o.is_context_required()),
    };
    Cursor {
      node,
      kind,
      context: if context_required {
        Context::Required
      } else {
        Context::Unconditional
      },
      last: None,
      last_move: None,
    }
  }

  pub fn kind(&self) -> Kind {
    self.kind
  }

  pub fn context(&self) -> Context {
    self.context
  }

  pub fn is_context_required(&self) -> bool {
    self.context == Context::Required
  }

  /// Will this cursor never produce another key? A context-required cursor
  /// that answered "no match" isn't necessarily exhausted.
  pub fn is_exhausted(&self) -> bool {
    match &self.node {
      Node::Empty => true,
      Node::Leaf(l) => l.is_exhausted(),
      Node::And(a) => a.is_exhausted(),
      Node::Or(o) => o.is_exhausted(),
    }
  }

  /// Prepare the cursor and its children. Calling this more than once does
  /// nothing. The other operations call it if needed.
  pub fn initialize(&mut self) -> Result<()> {
    match &mut self.node {
      Node::Empty => Ok(()),
      Node::Leaf(l) => l.initialize(),
      Node::And(a) => a.initialize(),
      Node::Or(o) => o.initialize(),
    }
  }

  /// Seek every leaf to `range`, throwing away all progress.
  pub fn seek(&mut self, range: &KeyRange<S::Key>) -> Result<()> {
    self.last = None;
    self.last_move = None;
    match &mut self.node {
      Node::Empty => Ok(()),
      Node::Leaf(l) => l.seek(range),
      Node::And(a) => a.seek(range),
      Node::Or(o) => o.seek(range),
    }
  }

  /// Is there another key? Doesn't change what [Cursor::payload] returns.
  pub fn has_next(&mut self) -> Result<bool> {
    self.check_unconditional()?;
    match &mut self.node {
      Node::Empty => Ok(false),
      Node::Leaf(l) => l.has_next(),
      Node::And(a) => a.has_next(),
      Node::Or(o) => o.has_next(),
    }
  }

  /// The next key or `None` if there aren't any more.
  pub fn next(&mut self) -> Result<Option<S::Key>> {
    self.check_unconditional()?;
    self.last_move = None;
    let next = match &mut self.node {
      Node::Empty => None,
      Node::Leaf(l) => l.next()?,
      Node::And(a) => a.next()?,
      Node::Or(o) => o.next()?,
    };
    if let Some(next) = &next {
      self.last = Some(next.clone());
    }
    Ok(next)
  }

  /// Advance to the first key at or after `pivot`.
  ///
  /// A cursor that requires a context instead answers whether it matches
  /// exactly `pivot`, returning `None` if it doesn't. That isn't exhaustion,
  /// later pivots may still match. Repeating the previous pivot returns the
  /// previous answer without moving anything.
  pub fn move_to(&mut self, pivot: &S::Key) -> Result<Option<S::Key>> {
    if let Some((prev, answer)) = &self.last_move {
      if prev == pivot {
        return Ok(answer.clone());
      }
      if pivot < prev {
        return Err(Error::MoveNotForward {
          pivot: format!("{pivot:?}"),
          last: format!("{prev:?}"),
        });
      }
    }
    if let Some(last) = &self.last {
      let last = S::transform(last);
      if *pivot <= last {
        return Err(Error::MoveNotForward {
          pivot: format!("{pivot:?}"),
          last: format!("{last:?}"),
        });
      }
    }
    let moved = match &mut self.node {
      Node::Empty => None,
      Node::Leaf(l) => l.move_to(pivot)?,
      Node::And(a) => a.move_to(pivot)?,
      Node::Or(o) => o.move_to(pivot)?,
    };
    if let Some(moved) = &moved {
      self.last = Some(moved.clone());
    }
    self.last_move = Some((pivot.clone(), moved.clone()));
    Ok(moved)
  }

  /// The payload of the most recently returned key.
  pub fn payload(&self) -> Option<&S::Payload> {
    match &self.node {
      Node::Empty => None,
      Node::Leaf(l) => l.payload(),
      Node::And(a) => a.payload(),
      Node::Or(o) => o.payload(),
    }
  }

  /// The most recently returned key.
  pub fn current(&self) -> Option<&S::Key> {
    self.last.as_ref()
  }

  fn check_unconditional(&self) -> Result<()> {
    if self.is_context_required() {
      return Err(Error::ContextRequired(self.name()));
    }
    Ok(())
  }

  fn name(&self) -> &'static str {
    match &self.node {
      Node::Empty => "empty",
      Node::Leaf(_) => "leaf",
      Node::And(_) => "and",
      Node::Or(_) => "or",
    }
  }
}
