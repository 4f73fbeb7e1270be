mod args;
mod index;
mod query;
mod run;
mod target_file;

use clap::Parser;
use std::{io, path::PathBuf, process};

use args::*;

#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error(transparent)]
  Parse(#[from] query_expr::ParseError),
  #[error(transparent)]
  Eval(#[from] nested_eval::Error),
  #[error("file not found: {0}")]
  NotFound(PathBuf),
  #[error(transparent)]
  IO(#[from] io::Error),
}

pub type Result<V> = std::result::Result<V, Error>;

fn main() {
  let args = args::Args::parse();
  tracing_subscriber::fmt()
    .with_max_level(args.verbosity)
    .with_writer(io::stderr)
    .init();

  let r = match args.command {
    Command::Run(full) => run::run(full),
    Command::Index { file } => index::run(file),
    Command::Query(full) => query::run(full),
  };
  if let Err(e) = r {
    eprintln!("{}", e);
    process::exit(1);
  }
}
