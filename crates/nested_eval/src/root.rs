use super::{Cursor, Error, KeyRange, Result, Source};
use std::iter::FusedIterator;
use tracing::{Level, event};

/// The top of an evaluation tree, pulled like any other [Iterator].
///
/// A tree that needs a context can't be enumerated so it matches nothing.
/// The first error aborts the tree. After that the iterator is done and
/// [Root::move_to] and [Root::seek] return [Error::Aborted].
#[derive(Debug)]
pub struct Root<S: Source> {
  cursor: Cursor<S>,
  aborted: bool,
}

impl<S: Source> Root<S> {
  pub fn new(cursor: Cursor<S>) -> Self {
    let cursor = if cursor.is_context_required() {
      event!(
        Level::WARN,
        "the root of an evaluation tree requires a context, matching nothing"
      );
      Cursor::empty()
    } else {
      cursor
    };
    Root {
      cursor,
      aborted: false,
    }
  }

  pub fn cursor(&self) -> &Cursor<S> {
    &self.cursor
  }

  /// Restart from the beginning of `range`.
  pub fn seek(&mut self, range: &KeyRange<S::Key>) -> Result<()> {
    if self.aborted {
      return Err(Error::Aborted);
    }
    let result = self.cursor.seek(range);
    self.check(result)
  }

  /// The first match at or after `pivot` with its payload.
  pub fn move_to(&mut self, pivot: &S::Key) -> Result<Option<(S::Key, S::Payload)>> {
    if self.aborted {
      return Err(Error::Aborted);
    }
    let result = self.cursor.move_to(pivot);
    let found = self.check(result)?;
    Ok(found.map(|key| (key, self.current_payload())))
  }

  fn current_payload(&self) -> S::Payload {
    self.cursor.payload().cloned().unwrap_or_default()
  }

  fn check<V>(&mut self, result: Result<V>) -> Result<V> {
    if let Err(e) = &result {
      event!(Level::ERROR, "aborting evaluation: {}", e);
      self.aborted = true;
    }
    result
  }
}

impl<S: Source> Iterator for Root<S> {
  type Item = Result<(S::Key, S::Payload)>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.aborted {
      return None;
    }
    let result = self.cursor.next();
    match self.check(result) {
      Ok(Some(key)) => Some(Ok((key, self.current_payload()))),
      Ok(None) => None,
      Err(e) => Some(Err(e)),
    }
  }
}

impl<S: Source> FusedIterator for Root<S> {}
