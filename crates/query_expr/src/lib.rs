//! Boolean queries over terms and a small text syntax for writing them.

mod parse;
mod query;

pub use parse::{ParseError, parse};
pub use query::{Meta, Query};
