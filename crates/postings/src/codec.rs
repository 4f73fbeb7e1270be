//! Posting lists are `(doc, freq)` pairs with strictly ascending docs. Each
//! doc is written as the gap from the previous doc less one, then both
//! numbers are written as Lucene style vints.
//! https://lucene.apache.org/core/10_0_0/core/org/apache/lucene/store/DataOutput.html#writeVInt(int)

#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
  #[error("read partial vint")]
  PartialVint,
  #[error("read vint more bigger than 64 bits")]
  VintTooBig,
  #[error("read posting without a frequency")]
  MissingFreq,
  #[error("frequency {0} is bigger than 32 bits")]
  FreqTooBig(u64),
  #[error("doc overflowed after {0}")]
  DocOverflow(u64),
}

pub(crate) fn write_vint(w: &mut Vec<u8>, mut i: u64) {
  while i > 127 {
    w.push(((i as u8) & 0x7f) | 0x80);
    i >>= 7;
  }
  w.push(i as u8)
}

fn read_vint(bytes: &[u8], pos: &mut usize) -> Option<Result<u64, DecodeError>> {
  let first = *bytes.get(*pos)?;
  *pos += 1;
  if first < 128 {
    return Some(Ok(first as u64));
  }
  let mut v = first as u64 & 0x7f;
  let mut shift = 7;
  loop {
    let Some(b) = bytes.get(*pos) else {
      return Some(Err(DecodeError::PartialVint));
    };
    *pos += 1;
    v |= (*b as u64 & 0x7f) << shift;
    if *b < 128 {
      return Some(Ok(v));
    }
    shift += 7;
    if shift >= 64 {
      return Some(Err(DecodeError::VintTooBig));
    }
  }
}

#[derive(Debug, Default)]
pub(crate) struct Encoder {
  bytes: Vec<u8>,
  prev: Option<u64>,
  len: u64,
}

impl Encoder {
  pub(crate) fn push(&mut self, doc: u64, freq: u32) {
    let gap = match self.prev {
      None => doc,
      Some(prev) => {
        if doc <= prev {
          panic!("invalid input {doc} <= {prev}");
        }
        doc - prev - 1
      }
    };
    write_vint(&mut self.bytes, gap);
    write_vint(&mut self.bytes, freq as u64);
    self.prev = Some(doc);
    self.len += 1;
  }

  /// Number of docs written.
  pub(crate) fn len(&self) -> u64 {
    self.len
  }

  pub(crate) fn finish(self) -> Vec<u8> {
    self.bytes
  }
}

#[derive(Clone, Debug)]
pub(crate) struct Decoder<'a> {
  bytes: &'a [u8],
  pos: usize,
  prev: Option<u64>,
}

impl<'a> Decoder<'a> {
  pub(crate) fn new(bytes: &'a [u8]) -> Self {
    Decoder {
      bytes,
      pos: 0,
      prev: None,
    }
  }
}

impl<'a> Iterator for Decoder<'a> {
  type Item = Result<(u64, u32), DecodeError>;

  fn next(&mut self) -> Option<Self::Item> {
    let gap = match read_vint(self.bytes, &mut self.pos)? {
      Ok(gap) => gap,
      Err(e) => return Some(Err(e)),
    };
    let freq = match read_vint(self.bytes, &mut self.pos) {
      None => return Some(Err(DecodeError::MissingFreq)),
      Some(Err(e)) => return Some(Err(e)),
      Some(Ok(freq)) => freq,
    };
    let Ok(freq) = u32::try_from(freq) else {
      return Some(Err(DecodeError::FreqTooBig(freq)));
    };
    let doc = match self.prev {
      None => gap,
      Some(prev) => match prev.checked_add(gap).and_then(|d| d.checked_add(1)) {
        Some(doc) => doc,
        None => return Some(Err(DecodeError::DocOverflow(prev))),
      },
    };
    self.prev = Some(doc);
    Some(Ok((doc, freq)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use arbtest::arbtest;
  use std::collections::BTreeMap;
  use yare::parameterized;

  #[parameterized(
      _1 = { &[1], &[1] },
      _127 = { &[127], &[127] },
      _128 = { &[128], &[0b10000000, 0b00000001] },
      _16383 = { &[16383], &[0b1111_1111, 0b0111_1111] },
      _16384 = { &[16384], &[0b10000000, 0b10000000, 0b00000001] },
    )]
  fn vints(values: &[u64], encoded: &[u8]) {
    let mut w = vec![];
    for v in values {
      write_vint(&mut w, *v);
    }
    assert_eq!(w, encoded);
    let mut pos = 0;
    for v in values {
      assert_eq!(Some(Ok(*v)), read_vint(encoded, &mut pos));
    }
    assert_eq!(None, read_vint(encoded, &mut pos));
  }

  #[parameterized(
      one = { &[(0, 1)], &[0, 1] },
      gaps = { &[(3, 1), (4, 2), (10, 1)], &[3, 1, 0, 2, 5, 1] },
      big_freq = { &[(1, 200)], &[1, 0b11001000, 0b00000001] },
    )]
  fn postings(postings: &[(u64, u32)], encoded: &[u8]) {
    let mut encoder = Encoder::default();
    for (doc, freq) in postings {
      encoder.push(*doc, *freq);
    }
    assert_eq!(postings.len() as u64, encoder.len());
    assert_eq!(encoder.finish(), encoded);
    let decoded = Decoder::new(encoded).collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(postings, decoded);
  }

  #[parameterized(
      partial_vint = { &[0b10000000], DecodeError::PartialVint },
      no_freq = { &[1], DecodeError::MissingFreq },
      freq_too_big = { &[1, 0x80, 0x80, 0x80, 0x80, 0x10], DecodeError::FreqTooBig(1 << 32) },
      too_big = { &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff], DecodeError::VintTooBig },
    )]
  fn errors(encoded: &[u8], expected: DecodeError) {
    assert_eq!(Some(Err(expected)), Decoder::new(encoded).next());
  }

  #[test]
  #[should_panic(expected = "invalid input 2 <= 2")]
  fn not_ascending() {
    let mut encoder = Encoder::default();
    encoder.push(2, 1);
    encoder.push(2, 1);
  }

  #[test]
  fn read_write() {
    arbtest(|u| {
      let postings: BTreeMap<u64, u32> = u.arbitrary()?;
      let mut encoder = Encoder::default();
      for (doc, freq) in postings.iter() {
        encoder.push(*doc, *freq);
      }
      let bytes = encoder.finish();
      let decoded = Decoder::new(&bytes).map(|r| r.unwrap()).collect::<Vec<_>>();
      assert_eq!(postings.into_iter().collect::<Vec<_>>(), decoded);
      Ok(())
    });
  }
}
