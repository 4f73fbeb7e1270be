//! Trees of in memory leaves checked against the same operations on
//! [BTreeSet]s.

use crate::testing::*;
use crate::*;
use arbitrary::Unstructured;
use arbtest::arbtest;
use std::{cell::Cell, collections::BTreeSet, rc::Rc};

const MAX: u64 = 30;

fn set(u: &mut Unstructured) -> arbitrary::Result<BTreeSet<u64>> {
  let len = u.int_in_range(0..=12)?;
  let mut s = BTreeSet::new();
  for _ in 0..len {
    s.insert(u.int_in_range(0..=MAX)?);
  }
  Ok(s)
}

fn sets(u: &mut Unstructured, min: usize, max: usize) -> arbitrary::Result<Vec<BTreeSet<u64>>> {
  let len = u.int_in_range(min..=max)?;
  (0..len).map(|_| set(u)).collect()
}

fn leaves(sets: &[BTreeSet<u64>]) -> Vec<Cursor<Numbers>> {
  sets.iter().map(|s| leaf("a", s.iter().copied())).collect()
}

fn context_leaves(sets: &[BTreeSet<u64>]) -> Vec<Cursor<Numbers>> {
  sets
    .iter()
    .map(|s| Cursor::context_leaf(Numbers::new("c", s.iter().copied())))
    .collect()
}

fn intersection(sets: &[BTreeSet<u64>]) -> BTreeSet<u64> {
  let mut iter = sets.iter();
  let Some(first) = iter.next() else {
    return BTreeSet::new();
  };
  iter.fold(first.clone(), |acc, s| &acc & s)
}

fn union(sets: &[BTreeSet<u64>]) -> BTreeSet<u64> {
  sets.iter().fold(BTreeSet::new(), |acc, s| &acc | s)
}

fn everything() -> BTreeSet<u64> {
  (0..=MAX).collect()
}

/// Randomly mix `next` and `move_to`, checking every answer against
/// `expected`. Keys must come back strictly ascending.
fn drive(
  u: &mut Unstructured,
  c: &mut Cursor<Numbers>,
  expected: &BTreeSet<u64>,
) -> arbitrary::Result<()> {
  let mut last: Option<u64> = None;
  loop {
    let (found, model) = if u.arbitrary()? {
      let model = match last {
        Some(last) => expected.range(last + 1..).next(),
        None => expected.iter().next(),
      };
      (c.next().unwrap(), model.copied())
    } else {
      let pivot = last.map_or(0, |l| l + 1) + u.int_in_range(0..=4)?;
      let model = expected.range(pivot..).next().copied();
      (c.move_to(&pivot).unwrap(), model)
    };
    assert_eq!(model, found);
    if let (Some(last), Some(found)) = (last, found) {
      assert!(found > last);
    }
    let Some(found) = found else {
      return Ok(());
    };
    last = Some(found);
  }
}

#[test]
fn intersection_pulled() {
  *TRACING;
  arbtest(|u| {
    let includes = sets(u, 1, 4)?;
    let excludes = sets(u, 0, 3)?;
    let expected = &intersection(&includes) - &union(&excludes);
    let mut c = Cursor::and(leaves(&includes), leaves(&excludes));
    assert_contents(&mut c, expected);
    Ok(())
  });
}

#[test]
fn intersection_pulled_and_moved() {
  arbtest(|u| {
    let includes = sets(u, 1, 4)?;
    let excludes = sets(u, 0, 3)?;
    let expected = &intersection(&includes) - &union(&excludes);
    let mut c = Cursor::and(leaves(&includes), leaves(&excludes));
    drive(u, &mut c, &expected)
  });
}

#[test]
fn intersection_with_context() {
  arbtest(|u| {
    let includes = sets(u, 1, 3)?;
    let context_includes = sets(u, 0, 2)?;
    let context_excludes = sets(u, 0, 2)?;
    let mut expected = intersection(&includes);
    for s in context_includes.iter() {
      expected = &expected & s;
    }
    let expected = &expected - &union(&context_excludes);
    let mut c = Cursor::and(
      leaves(&includes)
        .into_iter()
        .chain(context_leaves(&context_includes)),
      context_leaves(&context_excludes),
    );
    assert_contents(&mut c, expected);
    Ok(())
  });
}

#[test]
fn union_pulled_and_moved() {
  arbtest(|u| {
    let includes = sets(u, 0, 4)?;
    let expected = union(&includes);
    let mut c = Cursor::or(leaves(&includes), []);
    drive(u, &mut c, &expected)
  });
}

#[test]
fn union_with_context() {
  arbtest(|u| {
    let includes = sets(u, 0, 3)?;
    let context_includes = sets(u, 0, 2)?;
    let excludes = sets(u, 0, 3)?;
    let mut expected = &union(&includes) | &union(&context_includes);
    if !excludes.is_empty() {
      expected = &expected - &intersection(&excludes);
    }
    let mut c = Cursor::or(
      leaves(&includes)
        .into_iter()
        .chain(context_leaves(&context_includes)),
      leaves(&excludes),
    );
    let found = if c.is_context_required() {
      probe(&mut c, 0..=MAX)
    } else {
      collect(&mut c)
    };
    assert_eq!(expected.into_iter().collect::<Vec<_>>(), found);
    Ok(())
  });
}

#[test]
fn union_of_negations() {
  arbtest(|u| {
    let includes = sets(u, 0, 3)?;
    let negated = sets(u, 1, 3)?;
    let expected = &union(&includes) | &(&everything() - &union(&negated));
    let mut c = Cursor::or(
      leaves(&includes)
        .into_iter()
        .chain([Cursor::and([], leaves(&negated))]),
      [],
    );
    assert!(c.is_context_required());
    assert_eq!(
      expected.into_iter().collect::<Vec<_>>(),
      probe(&mut c, 0..=MAX)
    );
    Ok(())
  });
}

#[test]
fn nested_pulled_and_moved() {
  arbtest(|u| {
    let left = sets(u, 1, 3)?;
    let right = sets(u, 1, 3)?;
    let excludes = sets(u, 0, 2)?;
    let negated = sets(u, 0, 2)?;
    let expected = &(&(&union(&left) & &union(&right)) - &union(&excludes)) - &union(&negated);
    let mut includes = vec![
      Cursor::or(leaves(&left), []),
      Cursor::or(leaves(&right), []),
    ];
    if !negated.is_empty() {
      includes.push(Cursor::and([], leaves(&negated)));
    }
    let mut c = Cursor::and(includes, leaves(&excludes));
    drive(u, &mut c, &expected)
  });
}

#[test]
fn repeated_moves_are_free() {
  arbtest(|u| {
    let includes = sets(u, 1, 3)?;
    let excludes = sets(u, 0, 2)?;
    let mut reads: Vec<Rc<Cell<usize>>> = vec![];
    let mut numbers = |sets: &[BTreeSet<u64>]| {
      sets
        .iter()
        .map(|s| {
          let n = Numbers::new("a", s.iter().copied());
          reads.push(n.reads());
          Cursor::leaf(n)
        })
        .collect::<Vec<_>>()
    };
    let includes = numbers(&includes);
    let excludes = numbers(&excludes);
    let total = |reads: &[Rc<Cell<usize>>]| reads.iter().map(|r| r.get()).sum::<usize>();
    let mut c = Cursor::and(includes, excludes);
    let mut pivot = u.int_in_range(0..=4)?;
    loop {
      let first = c.move_to(&pivot).unwrap();
      let before = total(&reads);
      assert_eq!(first, c.move_to(&pivot).unwrap());
      assert_eq!(before, total(&reads));
      let Some(found) = first else {
        break;
      };
      pivot = found + 1 + u.int_in_range(0..=3)?;
    }
    Ok(())
  });
}
