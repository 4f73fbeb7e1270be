use nested_eval::{Error, Payload};
use std::{
  collections::{BTreeMap, btree_map::Entry},
  fmt,
};

/// The terms that matched one doc and how many times each appears in it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Hits<'i>(BTreeMap<&'i str, u32>);

impl<'i> Hits<'i> {
  pub fn one(term: &'i str, freq: u32) -> Self {
    Hits(BTreeMap::from([(term, freq)]))
  }

  pub fn iter(&self) -> impl Iterator<Item = (&'i str, u32)> + '_ {
    self.0.iter().map(|(t, f)| (*t, *f))
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl<'i> Payload for Hits<'i> {
  fn combine(&mut self, other: &Self) -> nested_eval::Result<()> {
    for (term, freq) in other.0.iter() {
      match self.0.entry(*term) {
        Entry::Vacant(e) => {
          e.insert(*freq);
        }
        Entry::Occupied(e) if e.get() == freq => {}
        Entry::Occupied(e) => {
          return Err(Error::PayloadMismatch(format!(
            "`{}` appears {} times and {} times in the same doc",
            term,
            e.get(),
            freq
          )));
        }
      }
    }
    Ok(())
  }
}

impl<'i> fmt::Display for Hits<'i> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (term, freq) in self.iter() {
      if first {
        first = false;
      } else {
        f.write_str(" ")?;
      }
      write!(f, "{term}:{freq}")?;
    }
    Ok(())
  }
}
