use std::{borrow::Cow, cmp, cmp::Ordering, collections::BTreeSet, fmt};

#[non_exhaustive]
pub enum Query<'a, M: Meta> {
  MatchAll,
  MatchNone,
  /// All docs containing a term. After rewrite this *must* match at least
  /// one doc.
  Term(Cow<'a, str>, M),
  /// All docs *not* matching the sub-query.
  Not(Box<Query<'a, M>>),
  Or(Vec<Query<'a, M>>),
  And(Vec<Query<'a, M>>),
}

pub trait Meta {
  fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<'a, M: Meta> Query<'a, M> {
  pub fn or(children: impl IntoIterator<Item = Self>) -> Self {
    let mut collected = BTreeSet::new();
    for q in children {
      match q {
        Self::MatchAll => return Self::MatchAll,
        Self::MatchNone => {}
        Self::Or(subs) => collected.extend(subs),
        Self::And(_) | Self::Not(_) | Self::Term(_, _) => {
          collected.insert(q);
        }
      }
    }
    Self::collapse(collected, Self::MatchNone, Query::Or)
  }

  pub fn and(children: impl IntoIterator<Item = Self>) -> Self {
    let mut collected = BTreeSet::new();
    for q in children {
      match q {
        Self::MatchAll => {}
        Self::MatchNone => return Self::MatchNone,
        Self::And(subs) => collected.extend(subs),
        Self::Or(_) | Self::Not(_) | Self::Term(_, _) => {
          collected.insert(q);
        }
      }
    }
    Self::collapse(collected, Self::MatchAll, Query::And)
  }

  pub fn not(child: Self) -> Self {
    match child {
      Self::MatchAll => Self::MatchNone,
      Self::MatchNone => Self::MatchAll,
      Self::Not(sub) => *sub,
      _ => Self::Not(Box::new(child)),
    }
  }

  fn collapse(mut collected: BTreeSet<Self>, empty: Self, many: fn(Vec<Self>) -> Self) -> Self {
    if collected.len() > 1 {
      return many(collected.into_iter().collect());
    }
    collected.pop_first().unwrap_or(empty)
  }
}

impl Query<'static, ()> {
  pub fn str(s: &'static str) -> Self {
    Query::Term(Cow::Borrowed(s), ())
  }

  pub fn or_str(children: impl IntoIterator<Item = &'static str>) -> Self {
    Query::Or(children.into_iter().map(Query::str).collect())
  }

  pub fn and_str(children: impl IntoIterator<Item = &'static str>) -> Self {
    Query::And(children.into_iter().map(Query::str).collect())
  }

  pub fn not_str(s: &'static str) -> Self {
    Query::Not(Box::new(Query::str(s)))
  }
}

impl Meta for () {
  fn fmt_debug(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
    Ok(())
  }
}

impl<'a, M: Meta> fmt::Debug for Query<'a, M> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MatchAll => f.debug_struct("MatchAll").finish(),
      Self::MatchNone => f.debug_struct("MatchNone").finish(),
      Self::Term(term, meta) => {
        f.write_str(term)?;
        meta.fmt_debug(f)
      }
      Self::Not(sub) => {
        f.write_str("!")?;
        fmt::Debug::fmt(sub, f)
      }
      Self::Or(subs) => Self::fmt_subs(f, "Or", subs),
      Self::And(subs) => Self::fmt_subs(f, "And", subs),
    }
  }
}

impl<'a, M: Meta> Query<'a, M> {
  fn fmt_subs(f: &mut fmt::Formatter<'_>, name: &str, subs: &[Self]) -> fmt::Result {
    if subs.iter().all(Query::fmts_short) {
      Self::fmt_compact_subs(f, name, subs)
    } else {
      f.write_str(name)?;
      f.debug_list().entries(subs.iter()).finish()
    }
  }

  fn fmts_short(&self) -> bool {
    match self {
      Self::MatchAll | Self::MatchNone | Self::Term(_, _) => true,
      Self::Not(sub) => sub.fmts_short(),
      Self::Or(_) | Self::And(_) => false,
    }
  }

  fn fmt_compact_subs(f: &mut fmt::Formatter<'_>, name: &str, subs: &[Self]) -> fmt::Result {
    f.write_str(name)?;
    f.write_str("[")?;
    let mut first = true;
    for s in subs {
      if first {
        first = false;
      } else {
        f.write_str(", ")?;
      }
      fmt::Debug::fmt(s, f)?;
    }
    f.write_str("]")
  }

  /// Sort order of the variants.
  fn rank(&self) -> u8 {
    match self {
      Self::MatchAll => 0,
      Self::MatchNone => 1,
      Self::Term(_, _) => 2,
      Self::Not(_) => 3,
      Self::Or(_) => 4,
      Self::And(_) => 5,
    }
  }
}

impl<'a, T: Meta, O: Meta> cmp::PartialEq<Query<'a, O>> for Query<'a, T> {
  fn eq(&self, other: &Query<'a, O>) -> bool {
    match (self, other) {
      (Self::MatchAll, Query::MatchAll) => true,
      (Self::MatchNone, Query::MatchNone) => true,
      (Self::Term(l, _), Query::Term(r, _)) => l == r,
      (Self::Not(l), Query::Not(r)) => **l == **r,
      (Self::Or(l), Query::Or(r)) => l == r,
      (Self::And(l), Query::And(r)) => l == r,
      _ => false,
    }
  }
}

impl<'a, T: Meta> cmp::Eq for Query<'a, T> {}

impl<'a, T: Meta> cmp::PartialOrd for Query<'a, T> {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl<'a, T: Meta> cmp::Ord for Query<'a, T> {
  fn cmp(&self, other: &Self) -> Ordering {
    match (self, other) {
      (Self::Term(l, _), Self::Term(r, _)) => l.cmp(r),
      (Self::Not(l), Self::Not(r)) => l.cmp(r),
      (Self::Or(l), Self::Or(r)) => l.cmp(r),
      (Self::And(l), Self::And(r)) => l.cmp(r),
      _ => self.rank().cmp(&other.rank()),
    }
  }
}
