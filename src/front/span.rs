//! Source positions ([`Pos`], [`Span`]) and the diagnostic logger.
//!
//! The logger keeps a thread-local count of errors and warnings. Messages
//! are printed to stderr with an excerpt of the source, unless feature
//! `no-front-logger` is enabled, in which case messages are returned in
//! [`Error`] instead.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[cfg(not(feature = "no-front-logger"))]
use colored::*;

/// Error returned by the logger methods of [`Span`].
///
/// The rendered message is only kept when feature `no-front-logger` is
/// enabled, otherwise it has already been printed.
#[derive(Debug, Default)]
pub struct Error {
  fatal: bool,
  message: Option<String>,
}

impl Error {
  /// Checks if the current error is fatal.
  pub fn is_fatal(&self) -> bool {
    self.fatal
  }

  /// Returns the message of the error, if it was not printed.
  pub fn message(&self) -> Option<&str> {
    self.message.as_deref()
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match &self.message {
      Some(message) => f.write_str(message),
      None if self.fatal => f.write_str("fatal error"),
      None => f.write_str("error"),
    }
  }
}

impl std::error::Error for Error {}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Severity {
  Error,
  Fatal,
  Warning,
}

impl Severity {
  #[cfg(not(feature = "no-front-logger"))]
  fn color(self) -> Color {
    match self {
      Severity::Warning => Color::Yellow,
      _ => Color::BrightRed,
    }
  }

  #[cfg(not(feature = "no-front-logger"))]
  fn label(self) -> ColoredString {
    match self {
      Severity::Warning => "warning".yellow(),
      _ => "error".bright_red(),
    }
  }
}

thread_local! {
  static STATE: RefCell<Diagnostics> = RefCell::new(Diagnostics::new(FileType::Buffer, None));
}

/// Counters and the current input of the logger.
struct Diagnostics {
  file: FileType,
  #[cfg_attr(feature = "no-front-logger", allow(dead_code))]
  source: Option<Rc<str>>,
  errors: usize,
  warnings: usize,
}

impl Diagnostics {
  fn new(file: FileType, source: Option<Rc<str>>) -> Self {
    Self {
      file,
      source,
      errors: 0,
      warnings: 0,
    }
  }

  fn count(&mut self, severity: Severity) {
    match severity {
      Severity::Warning => self.warnings += 1,
      _ => self.errors += 1,
    }
  }

  /// Returns the text of the current input, if it can be read.
  #[cfg(not(feature = "no-front-logger"))]
  fn text(&self) -> Option<Rc<str>> {
    match (&self.file, &self.source) {
      (_, Some(source)) => Some(source.clone()),
      (FileType::File(path), None) => std::fs::read_to_string(path).ok().map(Into::into),
      _ => None,
    }
  }
}

/// Counts a diagnostic, and prints it or keeps it in the returned error.
#[cfg(not(feature = "no-front-logger"))]
fn report(severity: Severity, span: Option<&Span>, message: &str) -> Error {
  let (file, text) = STATE.with(|st| {
    let mut st = st.borrow_mut();
    st.count(severity);
    (st.file.to_string(), span.and_then(|_| st.text()))
  });
  eprintln!("{}: {}", severity.label(), message);
  if let Some(span) = span {
    eprintln!("  {} {}:{}", "at".blue(), file, span.start);
    if let Some(text) = text {
      eprint!("{}", span.excerpt(&text, severity.color()));
    }
    eprintln!();
  }
  Error {
    fatal: severity == Severity::Fatal,
    message: None,
  }
}

/// Counts a diagnostic, and prints it or keeps it in the returned error.
#[cfg(feature = "no-front-logger")]
fn report(severity: Severity, span: Option<&Span>, message: &str) -> Error {
  let file = STATE.with(|st| {
    let mut st = st.borrow_mut();
    st.count(severity);
    st.file.to_string()
  });
  let message = match span {
    Some(span) => format!("{}:{}: {}", file, span.start, message),
    None => message.into(),
  };
  Error {
    fatal: severity == Severity::Fatal,
    message: Some(message),
  }
}

/// A span.
///
/// Used to print error messages.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Span {
  start: Pos,
  end: Pos,
}

impl Span {
  /// The column width occupied by the tab character.
  #[cfg(not(feature = "no-front-logger"))]
  const TAB_WIDTH: usize = 2;

  /// Creates a new span from `Pos`.
  pub fn new(start: Pos) -> Self {
    Self { start, end: start }
  }

  /// Returns the start position.
  pub fn start(&self) -> Pos {
    self.start
  }

  /// Returns the end position.
  pub fn end(&self) -> Pos {
    self.end
  }

  /// Resets the logger for a new input.
  pub fn reset(file: FileType) {
    STATE.with(|st| *st.borrow_mut() = Diagnostics::new(file, None));
  }

  /// Resets the logger for parsing an in-memory buffer. The buffer is kept
  /// so that diagnostics can show excerpts of it.
  pub fn reset_buffer(source: &str) {
    STATE.with(|st| *st.borrow_mut() = Diagnostics::new(FileType::Buffer, Some(source.into())));
  }

  /// Logs normal error with no span provided.
  pub fn log_raw_error<T>(message: &str) -> Result<T, Error> {
    Err(report(Severity::Error, None, message))
  }

  /// Logs fatal error with no span provided.
  pub fn log_raw_fatal_error<T>(message: &str) -> Result<T, Error> {
    Err(report(Severity::Fatal, None, message))
  }

  /// Logs normal error message.
  pub fn log_error<T>(&self, message: &str) -> Result<T, Error> {
    Err(report(Severity::Error, Some(self), message))
  }

  /// Logs warning message.
  pub fn log_warning(&self, message: &str) {
    report(Severity::Warning, Some(self), message);
  }

  /// Prints the total number of errors and warnings, like
  /// `2 errors and 1 warning emitted`.
  pub fn log_global() {
    #[cfg(not(feature = "no-front-logger"))]
    {
      let (errors, warnings) = STATE.with(|st| {
        let st = st.borrow();
        (st.errors, st.warnings)
      });
      let plural = |n: usize, word: &str| match n {
        1 => format!("{} {}", n, word),
        _ => format!("{} {}s", n, word),
      };
      let summary = match (errors, warnings) {
        (0, 0) => return,
        (e, 0) => plural(e, "error").bright_red().to_string(),
        (0, w) => plural(w, "warning").yellow().to_string(),
        (e, w) => format!(
          "{} and {}",
          plural(e, "error").bright_red(),
          plural(w, "warning").yellow()
        ),
      };
      eprintln!("{} emitted", summary);
    }
  }

  /// Checks if there are some errors.
  pub fn has_error() -> bool {
    Self::error_count() != 0
  }

  /// Returns the number of errors logged since the last reset.
  pub fn error_count() -> usize {
    STATE.with(|st| st.borrow().errors)
  }

  /// Returns the number of warnings logged since the last reset.
  pub fn warning_count() -> usize {
    STATE.with(|st| st.borrow().warnings)
  }

  /// Converts the current span into a new one
  /// where the end position has been updated.
  pub fn into_updated(self, end: Pos) -> Self {
    Self { end, ..self }
  }

  /// Updates the end position.
  pub fn update(&mut self, end: Pos) {
    self.end = end;
  }

  /// Converts the current span into a new one where the end position
  /// has been updated according to another span.
  pub fn into_updated_span(self, span: Span) -> Self {
    self.into_updated(span.end)
  }

  /// Updates the end position according to another span.
  pub fn update_span(&mut self, span: Span) {
    self.end = span.end;
  }

  /// Checks if the current span is in the same line as the specific span.
  pub fn is_in_same_line_as(&self, span: &Span) -> bool {
    self.end.line == span.start.line
  }

  /// Renders the lines of `text` covered by the span. At most four lines
  /// between the first and the last line are shown.
  #[cfg(not(feature = "no-front-logger"))]
  fn excerpt(&self, text: &str, color: Color) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    if self.start.col == 0 || self.end.col == 0 {
      return out;
    }
    let lines: Vec<_> = text.lines().collect();
    let line_at = |num: u32| lines.get(num as usize - 1).copied().unwrap_or("");
    let width = (self.end.line + 1).to_string().len();
    let gutter = |num: Option<u32>| match num {
      Some(num) => format!("{} {}", format!("{:>w$}", num, w = width).blue(), "|".blue()),
      None => format!("{:w$} {}", "", "|".blue(), w = width),
    };
    let _ = writeln!(out, "{}", gutter(None));
    if self.start.line == self.end.line {
      let (line, [c1, c2]) = expand_tabs(line_at(self.start.line), [self.start.col, self.end.col]);
      let marker = "^".repeat((c2 + 1).saturating_sub(c1).max(1));
      let _ = writeln!(out, "{} {}", gutter(Some(self.start.line)), line);
      let pad = " ".repeat(c1.saturating_sub(1));
      let _ = writeln!(out, "{} {}{}", gutter(None), pad, marker.color(color));
      return out;
    }
    let bar = "|".color(color);
    let (first, [start]) = expand_tabs(line_at(self.start.line), [self.start.col]);
    let _ = writeln!(out, "{}   {}", gutter(Some(self.start.line)), first);
    let underline = format!("{}^", "_".repeat(start));
    let _ = writeln!(out, "{}  {}", gutter(None), underline.color(color));
    let middle: Vec<_> = (self.start.line + 1..self.end.line).collect();
    let shown: Vec<Option<u32>> = if middle.len() <= 4 {
      middle.iter().copied().map(Some).collect()
    } else {
      vec![Some(middle[0]), Some(middle[1]), None, middle.last().copied()]
    };
    for num in shown {
      match num {
        Some(num) => {
          let (line, _) = expand_tabs(line_at(num), []);
          let _ = writeln!(out, "{} {} {}", gutter(Some(num)), bar, line);
        }
        None => {
          let _ = writeln!(out, "{} {} {}", ".".repeat(width), "|".blue(), bar);
        }
      }
    }
    let (last, [end]) = expand_tabs(line_at(self.end.line), [self.end.col]);
    let _ = writeln!(out, "{} {} {}", gutter(Some(self.end.line)), bar, last);
    let underline = format!("{}^", "_".repeat(end));
    let _ = writeln!(out, "{} {}{}", gutter(None), bar, underline.color(color));
    out
  }
}

/// Expands the tabs of a line, and maps the given columns of the line to
/// columns of the expanded line.
#[cfg(not(feature = "no-front-logger"))]
fn expand_tabs<const N: usize>(line: &str, cols: [u32; N]) -> (String, [usize; N]) {
  let expanded = line.replace('\t', &" ".repeat(Span::TAB_WIDTH));
  let cols = cols.map(|col| {
    let col = (col as usize).min(line.len());
    col + line[..col].matches('\t').count() * (Span::TAB_WIDTH - 1)
  });
  (expanded, cols)
}

impl Default for Span {
  fn default() -> Self {
    Self::new(Pos::default())
  }
}

impl fmt::Debug for Span {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}-{}", self.start, self.end)
  }
}

impl fmt::Display for Span {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.start)
  }
}

/// Line-column mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pos {
  line: u32,
  col: u32,
}

impl Pos {
  /// Creates a mark before the first character of the input.
  pub fn new() -> Self {
    Self { line: 1, col: 0 }
  }

  /// Returns the line number, starting from 1.
  pub fn line(&self) -> u32 {
    self.line
  }

  /// Returns the column number, 0 before the first character of a line.
  pub fn col(&self) -> u32 {
    self.col
  }

  /// Moves the mark past character `c`.
  pub fn update(&mut self, c: char) {
    if c == '\n' {
      self.line += 1;
      self.col = 0;
    } else {
      self.col += 1;
    }
  }
}

impl Default for Pos {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for Pos {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.col)
  }
}

/// Type of input file.
pub enum FileType {
  File(String),
  Stdin,
  Buffer,
}

impl fmt::Display for FileType {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      FileType::File(file) => f.write_str(file),
      FileType::Stdin => f.write_str("<stdin>"),
      FileType::Buffer => f.write_str("<buffer>"),
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn pos_update() {
    let mut pos = Pos::new();
    assert_eq!(format!("{}", pos), "1:0");
    pos.update('%');
    pos.update('0');
    assert_eq!((pos.line(), pos.col()), (1, 2));
    pos.update('\n');
    assert_eq!(format!("{}", pos), "2:0");
  }

  #[test]
  fn span_logging() {
    Span::reset_buffer("func @f() {\n  %0 = fir.undefined i32\n  return\n}\n");
    let mut pos = Pos::new();
    for c in "func @f(".chars() {
      pos.update(c);
    }
    let sp1 = Span::new(pos);
    pos.update(')');
    let sp2 = sp1.into_updated(pos);
    assert!(sp1.is_in_same_line_as(&sp2));
    let err = sp2.log_error::<()>("test error").unwrap_err();
    assert!(!err.is_fatal());
    sp2.log_warning("test warning");
    let mut sp = Span::new(Pos { line: 3, col: 3 });
    sp.update(Pos { line: 3, col: 8 });
    let sp3 = sp2.into_updated_span(sp);
    sp3.log_warning("multi-line warning");
    assert!(Span::log_raw_fatal_error::<()>("fatal").unwrap_err().is_fatal());
    Span::log_global();
    assert_eq!(Span::error_count(), 2);
    assert_eq!(Span::warning_count(), 2);
    assert_eq!(sp3.start(), sp2.start());
    assert_eq!(format!("{}", sp3.end()), "3:8");
    Span::reset(FileType::Buffer);
    assert!(!Span::has_error());
  }

  #[cfg(not(feature = "no-front-logger"))]
  #[test]
  fn excerpt_lines() {
    colored::control::set_override(false);
    let text = "a\nb\nc\nd\ne\nf\ng\nh\n";
    let span = Span {
      start: Pos { line: 1, col: 1 },
      end: Pos { line: 8, col: 1 },
    };
    let excerpt = span.excerpt(text, Color::Red);
    // two leading middle lines, an ellipsis, then the line before the last
    assert!(excerpt.contains("2 | | b\n"));
    assert!(excerpt.contains("3 | | c\n"));
    assert!(excerpt.contains("7 | | g\n"));
    assert!(!excerpt.contains("| | d"));
    let span = Span {
      start: Pos { line: 2, col: 1 },
      end: Pos { line: 2, col: 1 },
    };
    assert!(span.excerpt(text, Color::Red).ends_with("  | ^\n"));
  }
}
