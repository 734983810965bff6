use crate::front::ast::AstKind;
use crate::front::builder::Builder;
use crate::front::lexer::Lexer;
use crate::front::parser::Parser;
use crate::front::span::{Error, FileType, Span};
use crate::ir::Module;
use std::fs::File;
use std::io::{self, Read};

/// Driver can convert FIR in text form to modules.
pub struct Driver<T: Read> {
  parser: Parser<T>,
  builder: Builder,
}

impl<T: Read> Driver<T> {
  /// Maximum number of errors allowed.
  pub const MAX_ERR_NUM: usize = 20;

  /// Creates a new `Driver`.
  pub fn new(ft: FileType, reader: T) -> Self {
    Span::reset(ft);
    Self::with_reader(reader)
  }

  /// Creates a new `Driver` without resetting the logger.
  fn with_reader(reader: T) -> Self {
    Self {
      parser: Parser::new(Lexer::new(reader)),
      builder: Builder::new(),
    }
  }

  /// Generates the module.
  ///
  /// Parsing continues after errors, so that all of them are reported,
  /// until [`MAX_ERR_NUM`](Driver::MAX_ERR_NUM) is exceeded. The module is
  /// only returned if there are no errors.
  pub fn generate_module(mut self) -> Result<Module, Error> {
    loop {
      // parse & get the next AST
      let ast = self.parser.parse_next()?;
      // check if is end of file
      if matches!(ast.kind, AstKind::End) {
        break;
      }
      // build on the current AST
      self.builder.build_on(&ast);
      // exit if too many errors are generated
      if Span::error_count() > Self::MAX_ERR_NUM {
        return Span::log_raw_fatal_error("too many errors are generated, aborted");
      }
    }
    // log global information
    Span::log_global();
    // exit if any errors are generated
    if Span::has_error() {
      Err(Error::default())
    } else {
      Ok(self.builder.module())
    }
  }
}

impl Driver<File> {
  /// Creates a new `Driver` from the specific path.
  pub fn from_path(path: String) -> io::Result<Self> {
    File::open(&path).map(|f| Driver::new(FileType::File(path), f))
  }
}

/// Creates `Driver` from standard input.
impl From<io::Stdin> for Driver<io::Stdin> {
  fn from(stdin: io::Stdin) -> Self {
    Driver::new(FileType::Stdin, stdin)
  }
}

/// Creates `Driver` from `String`s.
impl From<String> for Driver<io::Cursor<String>> {
  fn from(buf: String) -> Self {
    Span::reset_buffer(&buf);
    Driver::with_reader(io::Cursor::new(buf))
  }
}

/// Creates `Driver` from strings.
impl<'a> From<&'a str> for Driver<io::Cursor<&'a str>> {
  fn from(buf: &'a str) -> Self {
    Span::reset_buffer(buf);
    Driver::with_reader(io::Cursor::new(buf))
  }
}
