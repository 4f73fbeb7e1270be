use std::io;
use tracing::{Level, event, span};

use super::*;

const PROGRESS_EVERY: u64 = 100_000;

impl Index {
  /// Index every line in `buf`. Lines that aren't valid UTF-8 are indexed
  /// lossily.
  pub fn from_lines<R: io::BufRead>(buf: &mut R) -> io::Result<Index> {
    let span = span!(Level::TRACE, "from_lines");
    let _guard = span.enter();

    let mut builder = IndexBuilder::new();
    let mut line = vec![];
    let mut doc = 0;
    loop {
      line.clear();
      let line_len = buf.read_until(b'\n', &mut line)?;
      if line_len == 0 {
        break;
      }
      builder.add_doc(doc, &String::from_utf8_lossy(&line));
      doc += 1;
      if doc % PROGRESS_EVERY == 0 {
        event!(Level::DEBUG, "indexed {} lines", doc);
      }
    }
    let index = builder.build();
    event!(
      Level::DEBUG,
      "indexed {} lines into {} terms",
      index.doc_count(),
      index.term_count()
    );
    Ok(index)
  }
}
