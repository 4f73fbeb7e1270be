use super::{Error, Result};
use postings::Index;
use std::io::{ErrorKind, Read};
use std::{fs::File, path};
use tracing::{Level, event, span};

/// Read all of `file`.
pub(crate) fn read(file: String) -> Result<Vec<u8>> {
  let span = span!(Level::TRACE, "read");
  let _guard = span.enter();

  let path = path::absolute(file)?;
  let mut file = File::open(&path).map_err(|e| {
    if e.kind() == ErrorKind::NotFound {
      Error::NotFound(path.clone())
    } else {
      Error::IO(e)
    }
  })?;
  let mut text = vec![];
  file.read_to_end(&mut text)?;
  event!(Level::DEBUG, "read {} bytes from {}", text.len(), path.display());
  Ok(text)
}

/// Index every line of `text`.
pub(crate) fn index(text: &[u8]) -> Result<Index> {
  let mut lines = text;
  Ok(Index::from_lines(&mut lines)?)
}
