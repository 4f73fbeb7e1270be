//! An in memory inverted index over lines of text. Every line is a doc keyed
//! by its line number, starting at 0.

mod codec;
mod from_lines;
mod hits;

pub use codec::DecodeError;
pub use hits::Hits;

use codec::{Decoder, Encoder};
use nested_eval::{Error, KeyRange, Result, Source};
use std::{collections::BTreeMap, fmt};

/// Lowercased runs of alphanumeric characters.
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
  text
    .split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
    .map(|w| w.to_lowercase())
}

#[derive(Debug, Default)]
pub struct IndexBuilder {
  terms: BTreeMap<String, Encoder>,
  doc_count: u64,
}

impl IndexBuilder {
  pub fn new() -> IndexBuilder {
    IndexBuilder::default()
  }

  /// Index the words in `text` as `doc`. Docs must be added in ascending
  /// order.
  pub fn add_doc(&mut self, doc: u64, text: &str) {
    let mut freqs = BTreeMap::<String, u32>::new();
    for word in words(text) {
      *freqs.entry(word).or_default() += 1;
    }
    for (term, freq) in freqs {
      self.terms.entry(term).or_default().push(doc, freq);
    }
    self.doc_count = self.doc_count.max(doc + 1);
  }

  pub fn build(self) -> Index {
    let terms = self
      .terms
      .into_iter()
      .map(|(term, encoder)| {
        let doc_freq = encoder.len();
        let postings = TermPostings {
          doc_freq,
          bytes: encoder.finish(),
        };
        (term, postings)
      })
      .collect();
    Index {
      terms,
      doc_count: self.doc_count,
    }
  }
}

#[derive(Debug)]
struct TermPostings {
  doc_freq: u64,
  bytes: Vec<u8>,
}

pub struct Index {
  terms: BTreeMap<String, TermPostings>,
  doc_count: u64,
}

impl Index {
  /// Every doc containing `term` or `None` if no doc contains it.
  pub fn term(&self, term: &str) -> Option<Postings<'_>> {
    let (term, postings) = self.terms.get_key_value(term)?;
    Some(Postings::Term(Term::new(term, &postings.bytes)))
  }

  /// Every doc.
  pub fn all(&self) -> Postings<'_> {
    Postings::All(All::new(self.doc_count))
  }

  /// Number of docs containing `term`.
  pub fn doc_freq(&self, term: &str) -> Option<u64> {
    self.terms.get(term).map(|p| p.doc_freq)
  }

  /// Number of docs indexed.
  pub fn doc_count(&self) -> u64 {
    self.doc_count
  }

  /// Number of distinct terms.
  pub fn term_count(&self) -> usize {
    self.terms.len()
  }

  /// Number of bytes used by the terms themselves.
  pub fn terms_size(&self) -> usize {
    self.terms.keys().map(|t| t.len()).sum()
  }

  /// Number of bytes used by the encoded posting lists.
  pub fn postings_size(&self) -> usize {
    self.terms.values().map(|p| p.bytes.len()).sum()
  }
}

impl fmt::Debug for Index {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Index")
      .field("docs", &self.doc_count)
      .field("terms", &self.terms.len())
      .finish()
  }
}

/// A [Source] over an [Index].
#[derive(Debug)]
pub enum Postings<'i> {
  /// The docs containing one term. Each doc's payload is the term and its
  /// frequency.
  Term(Term<'i>),
  /// Every doc, with an empty payload.
  All(All),
}

impl<'i> Source for Postings<'i> {
  type Key = u64;
  type Payload = Hits<'i>;

  fn seek(&mut self, range: &KeyRange<u64>) -> Result<()> {
    match self {
      Postings::Term(t) => t.seek(range),
      Postings::All(a) => {
        a.seek(range);
        Ok(())
      }
    }
  }

  fn next(&mut self) -> Result<Option<(u64, Hits<'i>)>> {
    match self {
      Postings::Term(t) => t.next(),
      Postings::All(a) => Ok(a.next()),
    }
  }
}

#[derive(Debug)]
pub struct Term<'i> {
  term: &'i str,
  bytes: &'i [u8],
  decoder: Decoder<'i>,
  /// Decoded but not yet consumed.
  peeked: Option<(u64, u32)>,
  /// The last doc returned or skipped.
  consumed: Option<u64>,
  range: KeyRange<u64>,
}

impl<'i> Term<'i> {
  fn new(term: &'i str, bytes: &'i [u8]) -> Self {
    Term {
      term,
      bytes,
      decoder: Decoder::new(bytes),
      peeked: None,
      consumed: None,
      range: KeyRange::all(),
    }
  }

  fn seek(&mut self, range: &KeyRange<u64>) -> Result<()> {
    if self.consumed.is_some_and(|c| range.after_start(&c)) {
      // Posting lists only decode forwards.
      self.decoder = Decoder::new(self.bytes);
      self.peeked = None;
      self.consumed = None;
    }
    self.range = range.clone();
    while let Some((doc, _)) = self.peek()? {
      if range.after_start(&doc) {
        break;
      }
      self.consume(doc);
    }
    Ok(())
  }

  fn next(&mut self) -> Result<Option<(u64, Hits<'i>)>> {
    let Some((doc, freq)) = self.peek()? else {
      return Ok(None);
    };
    if !self.range.before_end(&doc) {
      return Ok(None);
    }
    self.consume(doc);
    Ok(Some((doc, Hits::one(self.term, freq))))
  }

  fn peek(&mut self) -> Result<Option<(u64, u32)>> {
    if self.peeked.is_none() {
      self.peeked = self.decoder.next().transpose().map_err(Error::read)?;
    }
    Ok(self.peeked)
  }

  fn consume(&mut self, doc: u64) {
    self.peeked = None;
    self.consumed = Some(doc);
  }
}

#[derive(Debug)]
pub struct All {
  doc_count: u64,
  next: u64,
  range: KeyRange<u64>,
}

impl All {
  fn new(doc_count: u64) -> Self {
    All {
      doc_count,
      next: 0,
      range: KeyRange::all(),
    }
  }

  fn seek(&mut self, range: &KeyRange<u64>) {
    self.next = match range.start {
      std::ops::Bound::Unbounded => 0,
      std::ops::Bound::Included(s) => s,
      std::ops::Bound::Excluded(s) => s.saturating_add(1),
    };
    self.range = range.clone();
  }

  fn next<'i>(&mut self) -> Option<(u64, Hits<'i>)> {
    let doc = self.next;
    if doc >= self.doc_count || !self.range.before_end(&doc) {
      return None;
    }
    self.next += 1;
    Some((doc, Hits::default()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use nested_eval::{Cursor, Root};
  use std::ops::Bound;
  use yare::parameterized;

  fn index() -> Index {
    let mut builder = IndexBuilder::new();
    builder.add_doc(0, "The cat sat.");
    builder.add_doc(1, "A dog, a CAT and a cat.");
    builder.add_doc(2, "Nothing here");
    builder.add_doc(3, "dog dog dog");
    builder.build()
  }

  fn drain(mut p: Postings<'_>) -> Vec<(u64, String)> {
    let mut result = vec![];
    while let Some((doc, hits)) = p.next().unwrap() {
      result.push((doc, hits.to_string()));
    }
    result
  }

  fn docs(p: Postings<'_>) -> Vec<u64> {
    drain(p).into_iter().map(|(d, _)| d).collect()
  }

  #[test]
  fn words_are_lowercased() {
    assert_eq!(
      vec!["a", "dog", "a", "cat"],
      words("A dog, a CAT!").collect::<Vec<_>>()
    );
  }

  #[test]
  fn stats() {
    let index = index();
    assert_eq!(4, index.doc_count());
    assert_eq!(8, index.term_count());
    assert_eq!(Some(2), index.doc_freq("cat"));
    assert_eq!(None, index.doc_freq("bird"));
    assert_eq!(
      "Index { docs: 4, terms: 8 }",
      format!("{index:?}")
    );
  }

  #[test]
  fn term() {
    let index = index();
    assert_eq!(
      vec![(0, "cat:1".to_string()), (1, "cat:2".to_string())],
      drain(index.term("cat").unwrap())
    );
    assert_eq!(
      vec![(1, "dog:1".to_string()), (3, "dog:3".to_string())],
      drain(index.term("dog").unwrap())
    );
    assert!(index.term("bird").is_none());
  }

  #[test]
  fn all() {
    let index = index();
    assert_eq!(vec![0, 1, 2, 3], docs(index.all()));
  }

  #[parameterized(
    unbounded = { Bound::Unbounded, Bound::Unbounded, &[1, 3] },
    from_1 = { Bound::Included(1), Bound::Unbounded, &[1, 3] },
    after_1 = { Bound::Excluded(1), Bound::Unbounded, &[3] },
    to_3 = { Bound::Unbounded, Bound::Excluded(3), &[1] },
    nothing = { Bound::Included(4), Bound::Unbounded, &[] },
  )]
  fn seek(start: Bound<u64>, end: Bound<u64>, expected: &[u64]) {
    let index = index();
    let range = KeyRange::new(start, end);
    let mut dog = index.term("dog").unwrap();
    dog.seek(&range).unwrap();
    assert_eq!(expected, docs(dog));

    let mut all = index.all();
    all.seek(&range).unwrap();
    let expected_all = (0..4).filter(|d| range.contains(d)).collect::<Vec<_>>();
    assert_eq!(expected_all, docs(all));
  }

  #[test]
  fn seek_backwards() {
    let index = index();
    let mut dog = index.term("dog").unwrap();
    dog.seek(&KeyRange::new(Bound::Included(2), Bound::Unbounded)).unwrap();
    assert_eq!(Some(3), dog.next().unwrap().map(|(d, _)| d));
    dog.seek(&KeyRange::new(Bound::Included(0), Bound::Unbounded)).unwrap();
    assert_eq!(vec![1, 3], docs(dog));
  }

  #[test]
  fn seek_backwards_over_skipped() {
    let index = index();
    let mut dog = index.term("dog").unwrap();
    dog.seek(&KeyRange::new(Bound::Included(2), Bound::Unbounded)).unwrap();
    dog.seek(&KeyRange::new(Bound::Included(1), Bound::Unbounded)).unwrap();
    assert_eq!(vec![1, 3], docs(dog));
  }

  #[test]
  fn corrupt_postings() {
    let bytes = [0b10000000];
    let mut p = Postings::Term(Term::new("bad", &bytes));
    let err = p.next().unwrap_err();
    assert_eq!("source read failed: read partial vint", err.to_string());
  }

  #[test]
  fn evaluate() {
    let index = index();
    let root = Root::new(Cursor::and(
      [
        Cursor::leaf(index.term("cat").unwrap()),
        Cursor::leaf(index.term("dog").unwrap()),
      ],
      [],
    ));
    let found = root
      .map(|r| r.map(|(doc, hits)| (doc, hits.to_string())))
      .collect::<nested_eval::Result<Vec<_>>>()
      .unwrap();
    assert_eq!(vec![(1, "cat:2 dog:1".to_string())], found);
  }

  #[test]
  fn all_anchors_negation() {
    let index = index();
    let root = Root::new(Cursor::and(
      [Cursor::leaf(index.all())],
      [Cursor::leaf(index.term("cat").unwrap())],
    ));
    let found = root.map(|r| r.unwrap().0).collect::<Vec<_>>();
    assert_eq!(vec![2, 3], found);
  }
}
