use clap::*;
use clap_verbosity_flag::*;
use nested_eval::KeyRange;
use std::ops::Bound;

/// Match the lines of FILE against a boolean QUERY.
#[derive(Parser, Debug)]
#[command(name = "nested")]
pub(crate) struct Args {
  #[command(flatten)]
  pub(crate) verbosity: Verbosity<InfoLevel>,

  #[command(subcommand)]
  pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
  /// Print the lines of FILE that match QUERY.
  Run(#[command(flatten)] Full),
  /// Index FILE then print some information about it.
  Index {
    /// File to index.
    file: String,
  },
  /// List the line numbers in FILE that match QUERY.
  Query(#[command(flatten)] Full),
}

#[derive(Args, Debug)]
pub(crate) struct Full {
  /// Query to match, like "cat & !(dog | bird)".
  pub(crate) query: String,
  /// File to search in.
  pub(crate) file: String,

  #[command(flatten)]
  pub(crate) range: Range,
}

#[derive(Args, Debug)]
#[group(skip)]
pub(crate) struct Range {
  /// First line number to match, counting from 0.
  #[arg(long)]
  pub(crate) from: Option<u64>,
  /// Stop matching before this line number.
  #[arg(long)]
  pub(crate) to: Option<u64>,
}

impl Range {
  /// `None` if neither end is set.
  pub(crate) fn key_range(&self) -> Option<KeyRange<u64>> {
    if self.from.is_none() && self.to.is_none() {
      return None;
    }
    let start = self.from.map_or(Bound::Unbounded, Bound::Included);
    let end = self.to.map_or(Bound::Unbounded, Bound::Excluded);
    Some(KeyRange::new(start, end))
  }
}
