//! Tokens ([`Token`]) of text form FIR.

use crate::front::span::{Pos, Span};
use std::fmt;

/// Token with span.
#[derive(Debug, PartialEq)]
pub struct Token {
  pub span: Span,
  pub kind: TokenKind,
}

impl Token {
  /// Creates a new token.
  pub fn new(span: Span, kind: TokenKind) -> Self {
    Self { span, kind }
  }
}

impl Default for Token {
  fn default() -> Self {
    Self::new(Span::new(Pos::new()), TokenKind::End)
  }
}

/// Kind of token.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
  /// Integer literal.
  Int(i64),
  /// Floating point literal, or hexadecimal bits of a float.
  Float(f64),
  /// String literal.
  Str(String),
  /// Bare identifier, including operation names like `fir.load`.
  Ident(String),
  /// Value name, like `%0`.
  Value(String),
  /// Symbol name, like `@foo`.
  Symbol(String),
  /// Block name, like `^bb1`.
  Block(String),
  /// Attribute alias, like `#fir.point`.
  Attr(String),
  /// Dialect type name, like `!fir.ref`.
  Dialect(String),
  /// `->`.
  Arrow,
  /// Other single character.
  Other(char),
  /// End of file.
  End,
}

impl TokenKind {
  /// Checks if the current token is the given identifier.
  pub fn is_ident(&self, name: &str) -> bool {
    matches!(self, TokenKind::Ident(s) if s == name)
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      TokenKind::Int(v) => write!(f, "integer '{}'", v),
      TokenKind::Float(v) => write!(f, "float '{:?}'", v),
      TokenKind::Str(v) => write!(f, "string {:?}", v),
      TokenKind::Ident(v) => write!(f, "identifier '{}'", v),
      TokenKind::Value(v) => write!(f, "value '{}'", v),
      TokenKind::Symbol(v) => write!(f, "symbol '{}'", v),
      TokenKind::Block(v) => write!(f, "block '{}'", v),
      TokenKind::Attr(v) => write!(f, "attribute '{}'", v),
      TokenKind::Dialect(v) => write!(f, "type '{}'", v),
      TokenKind::Arrow => write!(f, "'->'"),
      TokenKind::Other(c) => write!(f, "character '{}'", c),
      TokenKind::End => write!(f, "end of file"),
    }
  }
}
