use nested_eval::Cursor;
use postings::{Index, Postings};
use query_expr::Query;
use std::fmt;
use tracing::{Level, event};

/// The number of docs containing a term.
pub struct Meta(u64);

/// Attach doc frequencies to terms. Terms that aren't in the index match
/// nothing and are simplified away.
pub fn rewrite<'q>(index: &Index, q: Query<'q, ()>) -> Query<'q, Meta> {
  match q {
    Query::MatchAll => Query::MatchAll,
    Query::MatchNone => Query::MatchNone,
    Query::Term(term, _) => {
      if let Some(doc_freq) = index.doc_freq(&term) {
        Query::Term(term, Meta(doc_freq))
      } else {
        Query::MatchNone
      }
    }
    Query::Not(sub) => Query::not(rewrite(index, *sub)),
    Query::Or(sub) => Query::or(sub.into_iter().map(|s| rewrite(index, s))),
    Query::And(sub) => Query::and(sub.into_iter().map(|s| rewrite(index, s))),
    _ => {
      event!(Level::WARN, "unsupported `{:?}`", q);
      Query::MatchAll
    }
  }
}

impl query_expr::Meta for Meta {
  fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({})", self.0)
  }
}

/// Build a cursor tree for a rewritten query.
///
/// Negations become `AND`s without includes, so they need a context. If the
/// whole tree needs one it's anchored to every doc in the index.
pub fn eval<'i>(index: &'i Index, q: Query<'_, Meta>) -> Cursor<Postings<'i>> {
  let cursor = build(index, q);
  if !cursor.is_context_required() {
    return cursor;
  }
  event!(Level::DEBUG, "anchoring query to all {} docs", index.doc_count());
  Cursor::and([Cursor::leaf(index.all()), cursor], [])
}

fn build<'i>(index: &'i Index, q: Query<'_, Meta>) -> Cursor<Postings<'i>> {
  match q {
    Query::MatchAll => Cursor::leaf(index.all()),
    Query::MatchNone => Cursor::empty(),
    Query::Term(term, _) => match index.term(&term) {
      Some(postings) => Cursor::leaf(postings),
      None => Cursor::empty(),
    },
    Query::Not(sub) => Cursor::and([], [build(index, *sub)]),
    Query::Or(sub) => Cursor::or(sub.into_iter().map(|s| build(index, s)), []),
    Query::And(sub) => {
      let mut includes = vec![];
      let mut excludes = vec![];
      for s in sub {
        match s {
          Query::Not(negated) => excludes.push(build(index, *negated)),
          _ => includes.push(build(index, s)),
        }
      }
      Cursor::and(includes, excludes)
    }
    _ => {
      event!(Level::WARN, "unsupported `{:?}`", q);
      Cursor::leaf(index.all())
    }
  }
}
