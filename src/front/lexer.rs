//! FIR lexer ([`Lexer`]) related implementations.

use crate::front::span::{Error, Pos, Span};
use crate::front::token::{Token, TokenKind};
use std::io::Read;

/// A lexer for lexing text form FIR.
///
/// `Lexer` scans the input text form FIR, and produces token stream for
/// the [`Parser`](crate::front::parser::Parser).
pub struct Lexer<T: Read> {
  reader: T,
  pos: Pos,
  // `None` if EOF
  last_char: Option<char>,
}

/// Result that returned by [`Lexer`].
pub type Result = std::result::Result<Token, Error>;

/// Checks if the given character can appear in a name.
fn is_name_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '$'
}

impl<T: Read> Lexer<T> {
  /// Creates a new lexer from the given reader.
  pub fn new(reader: T) -> Self {
    Self {
      reader,
      pos: Pos::new(),
      last_char: Some(' '),
    }
  }

  /// Returns the next token from file, or a lexer error.
  pub fn next_token(&mut self) -> Result {
    // skip spaces
    while self.last_char.map_or(false, |c| c.is_whitespace()) {
      self.next_char()?;
    }
    match self.last_char {
      Some('/') => self.handle_comment(),
      Some('"') => self.handle_string(),
      Some(c @ ('%' | '@' | '^' | '#' | '!')) => self.handle_prefixed(c),
      Some(c) if c.is_ascii_alphabetic() || c == '_' => self.handle_ident(),
      Some(c) if c.is_ascii_digit() || c == '-' => self.handle_number(),
      Some(c) => {
        let span = Span::new(self.pos);
        self.next_char()?;
        Ok(Token::new(span, TokenKind::Other(c)))
      }
      // may be EOF, or other file errors
      None => Ok(Token::new(Span::new(self.pos), TokenKind::End)),
    }
  }

  /// Reads a character from reader.
  ///
  /// If fails, this method will always return a fatal error.
  fn next_char(&mut self) -> std::result::Result<(), Error> {
    // NOTE: non-ASCII characters are only meaningful in string literals,
    // where the bytes are collected and decoded as UTF-8.
    let mut single_char = [0];
    let read = self
      .reader
      .read(&mut single_char)
      .or_else(|err| Span::log_raw_fatal_error(&err.to_string()))?;
    self.last_char = (read != 0).then(|| {
      let c = single_char[0] as char;
      // update the current position
      self.pos.update(c);
      c
    });
    Ok(())
  }

  /// Reads characters while `pred` holds, and appends them to `s`.
  fn read_while<F>(&mut self, s: &mut String, span: &mut Span, pred: F) -> std::result::Result<(), Error>
  where
    F: Fn(char) -> bool,
  {
    while let Some(c) = self.last_char.filter(|c| pred(*c)) {
      s.push(c);
      span.update(self.pos);
      self.next_char()?;
    }
    Ok(())
  }

  /// Handles integer literals, floating point literals and `->`.
  fn handle_number(&mut self) -> Result {
    let mut span = Span::new(self.pos);
    let mut num = String::new();
    if self.last_char == Some('-') {
      num.push('-');
      self.next_char()?;
      if self.last_char == Some('>') {
        span.update(self.pos);
        self.next_char()?;
        return Ok(Token::new(span, TokenKind::Arrow));
      }
      if !self.last_char.map_or(false, |c| c.is_ascii_digit()) {
        return self.log_err_and_skip(span, "invalid character '-'");
      }
    }
    self.read_while(&mut num, &mut span, |c| c.is_ascii_digit())?;
    // hexadecimal bits of a float
    if num == "0" && self.last_char == Some('x') {
      self.next_char()?;
      let mut hex = String::new();
      self.read_while(&mut hex, &mut span, |c| c.is_ascii_hexdigit())?;
      return match u64::from_str_radix(&hex, 16) {
        Ok(bits) => Ok(Token::new(span, TokenKind::Float(f64::from_bits(bits)))),
        Err(_) => self.log_err_and_skip(span, &format!("invalid hexadecimal literal '0x{}'", hex)),
      };
    }
    let mut is_float = false;
    if self.last_char == Some('.') {
      is_float = true;
      self.read_while(&mut num, &mut span, |c| c == '.')?;
      self.read_while(&mut num, &mut span, |c| c.is_ascii_digit())?;
    }
    if self.last_char == Some('e') || self.last_char == Some('E') {
      is_float = true;
      num.push('e');
      span.update(self.pos);
      self.next_char()?;
      if let Some(sign @ ('+' | '-')) = self.last_char {
        num.push(sign);
        span.update(self.pos);
        self.next_char()?;
      }
      self.read_while(&mut num, &mut span, |c| c.is_ascii_digit())?;
    }
    if is_float {
      match num.parse() {
        Ok(f) => Ok(Token::new(span, TokenKind::Float(f))),
        Err(_) => self.log_err_and_skip(span, &format!("invalid float literal '{}'", num)),
      }
    } else {
      match num.parse() {
        Ok(i) => Ok(Token::new(span, TokenKind::Int(i))),
        Err(_) => self.log_err_and_skip(span, &format!("invalid integer literal '{}'", num)),
      }
    }
  }

  /// Handles names with a prefix character.
  fn handle_prefixed(&mut self, prefix: char) -> Result {
    let mut span = Span::new(self.pos);
    let mut name = String::from(prefix);
    self.next_char()?;
    self.read_while(&mut name, &mut span, is_name_char)?;
    // check if only the prefix
    if name.len() == 1 {
      return self.log_err_and_skip(span, &format!("invalid name '{}'", name));
    }
    let kind = match prefix {
      '%' => TokenKind::Value(name),
      '@' => TokenKind::Symbol(name),
      '^' => TokenKind::Block(name),
      '#' => TokenKind::Attr(name),
      _ => TokenKind::Dialect(name),
    };
    Ok(Token::new(span, kind))
  }

  /// Handles identifiers.
  fn handle_ident(&mut self) -> Result {
    let mut span = Span::new(self.pos);
    let mut ident = String::new();
    self.read_while(&mut ident, &mut span, is_name_char)?;
    Ok(Token::new(span, TokenKind::Ident(ident)))
  }

  /// Handles string literals.
  fn handle_string(&mut self) -> Result {
    let mut span = Span::new(self.pos);
    // eat '"'
    self.next_char()?;
    let mut bytes = Vec::new();
    loop {
      let c = match self.last_char {
        Some('"') => break,
        Some(c) if c != '\n' => c,
        _ => return self.log_err_and_skip(span, "string unclosed at end of line"),
      };
      span.update(self.pos);
      self.next_char()?;
      if c != '\\' {
        bytes.push(c as u8);
        continue;
      }
      // escapes
      let escaped = match self.last_char {
        Some('n') => b'\n',
        Some('t') => b'\t',
        Some('"') => b'"',
        Some('\\') => b'\\',
        Some(h) if h.is_ascii_hexdigit() => {
          // exactly two hexadecimal digits
          let mut hex = String::from(h);
          span.update(self.pos);
          self.next_char()?;
          if let Some(l) = self.last_char.filter(|c| c.is_ascii_hexdigit()) {
            hex.push(l);
            span.update(self.pos);
            self.next_char()?;
          }
          match u8::from_str_radix(&hex, 16) {
            Ok(b) if hex.len() == 2 => {
              bytes.push(b);
              continue;
            }
            _ => return self.log_err_and_skip(span, &format!("invalid escape '\\{}'", hex)),
          }
        }
        _ => return self.log_err_and_skip(span, "invalid escape sequence"),
      };
      bytes.push(escaped);
      span.update(self.pos);
      self.next_char()?;
    }
    // eat '"'
    span.update(self.pos);
    self.next_char()?;
    match String::from_utf8(bytes) {
      Ok(s) => Ok(Token::new(span, TokenKind::Str(s))),
      Err(_) => span.log_error("invalid UTF-8 in string literal"),
    }
  }

  /// Handles comments.
  fn handle_comment(&mut self) -> Result {
    let span = Span::new(self.pos);
    // eat '/'
    self.next_char()?;
    if self.last_char == Some('/') {
      // skip the current line
      while self.last_char.map_or(false, |c| c != '\r' && c != '\n') {
        self.next_char()?;
      }
      // return the next token
      self.next_token()
    } else {
      self.log_err_and_skip(span.into_updated(self.pos), "invalid comment")
    }
  }

  /// Logs error message to stderr, and skip to the next space character.
  ///
  /// For error recovery support.
  fn log_err_and_skip(&mut self, span: Span, message: &str) -> Result {
    while self.last_char.map_or(false, |c| !c.is_whitespace()) {
      self.next_char()?;
    }
    span.log_error(message)
  }
}
