use super::{Result, args::Full, args::Range};
use index_queries::Meta;
use nested_eval::Root;
use postings::{Index, Postings};
use query_expr::Query;
use tracing::{Level, event, span};

pub(crate) fn run(full: Full) -> Result<()> {
  let span = span!(Level::TRACE, "run");
  let _guard = span.enter();

  let Full { query, file, range } = full;
  let parsed = query_expr::parse(&query)?;
  let text = crate::target_file::read(file)?;
  let index = crate::target_file::index(&text)?;
  let query = index_queries::rewrite(&index, parsed);
  println!("query {query:#?}");

  let doc_count = index.doc_count();
  let mut matched = 0;
  for found in search(&index, query, &range)? {
    let (doc, hits) = found?;
    if hits.is_empty() {
      println!("match: {doc}");
    } else {
      println!("match: {doc} {hits}");
    }
    matched += 1;
  }
  let matched_pct = if doc_count == 0 {
    0.0
  } else {
    (matched as f64) / (doc_count as f64) * 100.0
  };
  println!("matched: {matched}/{doc_count} ({matched_pct:05.2}%)");
  Ok(())
}

/// Evaluate `query` over the lines in `range`.
pub(crate) fn search<'i>(
  index: &'i Index,
  query: Query<'_, Meta>,
  range: &Range,
) -> Result<Root<Postings<'i>>> {
  event!(Level::DEBUG, "rewritten query {query:#?}");
  let mut root = Root::new(index_queries::eval(index, query));
  if let Some(range) = range.key_range() {
    event!(Level::DEBUG, "limited to {:?}", range);
    root.seek(&range)?;
  }
  Ok(root)
}
