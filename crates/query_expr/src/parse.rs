use std::borrow::Cow;
use tracing::{Level, event, span};

use crate::Query;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("query parse error:\n    {query}\n    {pad}^\nerror: {message}", pad = pad(.position))]
pub struct ParseError {
  pub query: String,
  /// Column of the problem, counted in chars.
  pub position: usize,
  pub message: &'static str,
}

/// Deepest run of `!` and `(` accepted before giving up.
const MAX_DEPTH: usize = 100;

fn pad(position: &usize) -> String {
  " ".repeat(*position)
}

/// Parse a query like `cat & !(dog | bird)`.
///
/// ```text
/// expr  := and ('|' and)*
/// and   := unary ('&'? unary)*
/// unary := '!' unary | '(' expr ')' | '*' | word
/// ```
///
/// Words are runs of alphanumeric chars and are lowercased. `*` matches
/// everything.
pub fn parse(query: &str) -> Result<Query<'_, ()>, ParseError> {
  let span = span!(Level::TRACE, "parse");
  let _guard = span.enter();
  let mut parser = Parser {
    text: query,
    pos: 0,
    depth: 0,
  };
  let parsed = parser.expr()?;
  parser.skip_whitespace();
  match parser.peek() {
    None => {
      event!(Level::TRACE, "parsed {:?}", parsed);
      Ok(parsed)
    }
    Some(')') => Err(parser.error(parser.pos, "unexpected `)`")),
    Some(_) => Err(parser.error(parser.pos, "unexpected character")),
  }
}

struct Parser<'a> {
  text: &'a str,
  /// Byte offset into `text`.
  pos: usize,
  /// Open `!` and `(` around `pos`.
  depth: usize,
}

impl<'a> Parser<'a> {
  fn expr(&mut self) -> Result<Query<'a, ()>, ParseError> {
    let mut subs = vec![self.and()?];
    loop {
      self.skip_whitespace();
      if self.peek() != Some('|') {
        break;
      }
      self.pos += 1;
      subs.push(self.and()?);
    }
    Ok(Query::or(subs))
  }

  fn and(&mut self) -> Result<Query<'a, ()>, ParseError> {
    let mut subs = vec![self.unary()?];
    loop {
      self.skip_whitespace();
      match self.peek() {
        Some('&') => {
          self.pos += 1;
          subs.push(self.unary()?);
        }
        Some(c) if starts_unary(c) => subs.push(self.unary()?),
        _ => break,
      }
    }
    Ok(Query::and(subs))
  }

  fn unary(&mut self) -> Result<Query<'a, ()>, ParseError> {
    self.skip_whitespace();
    let start = self.pos;
    match self.peek() {
      Some('!') => {
        self.descend(start)?;
        let negated = self.unary()?;
        self.depth -= 1;
        Ok(Query::not(negated))
      }
      Some('(') => {
        self.descend(start)?;
        let group = self.expr()?;
        self.depth -= 1;
        self.skip_whitespace();
        match self.peek() {
          Some(')') => {
            self.pos += 1;
            Ok(group)
          }
          None => Err(self.error(start, "unclosed group")),
          Some(_) => Err(self.error(self.pos, "unexpected character")),
        }
      }
      Some('*') => {
        self.pos += 1;
        Ok(Query::MatchAll)
      }
      Some(c) if c.is_alphanumeric() => Ok(self.word()),
      None | Some('|' | '&' | ')') => Err(self.error(start, "expected a term")),
      Some(_) => Err(self.error(start, "unexpected character")),
    }
  }

  /// Step over a `!` or `(` at `start`.
  fn descend(&mut self, start: usize) -> Result<(), ParseError> {
    if self.depth >= MAX_DEPTH {
      return Err(self.error(start, "query nested too deeply"));
    }
    self.depth += 1;
    self.pos += 1;
    Ok(())
  }

  fn word(&mut self) -> Query<'a, ()> {
    let rest = &self.text[self.pos..];
    let len = rest
      .find(|c: char| !c.is_alphanumeric())
      .unwrap_or(rest.len());
    let word = &rest[..len];
    self.pos += len;
    let lower = word.to_lowercase();
    let term = if lower == word {
      Cow::Borrowed(word)
    } else {
      Cow::Owned(lower)
    };
    Query::Term(term, ())
  }

  fn skip_whitespace(&mut self) {
    let rest = &self.text[self.pos..];
    self.pos += rest.len() - rest.trim_start().len();
  }

  fn peek(&self) -> Option<char> {
    self.text[self.pos..].chars().next()
  }

  fn error(&self, at: usize, message: &'static str) -> ParseError {
    ParseError {
      query: self.text.to_string(),
      position: self.text[..at].chars().count(),
      message,
    }
  }
}

fn starts_unary(c: char) -> bool {
  matches!(c, '!' | '(' | '*') || c.is_alphanumeric()
}
