use super::{Result, args::Full};
use tracing::{Level, event, span};

pub(crate) fn run(full: Full) -> Result<()> {
  let span = span!(Level::TRACE, "run");
  let _guard = span.enter();

  let Full { query, file, range } = full;
  let parsed = query_expr::parse(&query)?;
  let text = crate::target_file::read(file)?;
  let index = crate::target_file::index(&text)?;
  let query = index_queries::rewrite(&index, parsed);

  let lines = text.split_inclusive(|b| *b == b'\n').collect::<Vec<_>>();
  for found in crate::query::search(&index, query, &range)? {
    let (doc, _) = found?;
    let Some(line) = usize::try_from(doc).ok().and_then(|d| lines.get(d)) else {
      event!(Level::WARN, "matched line {} past the end of the file", doc);
      continue;
    };
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
    println!("{doc}:{line}");
  }
  Ok(())
}
