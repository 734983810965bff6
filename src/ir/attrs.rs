//! Attributes ([`Attr`]) of operations.

use crate::ir::types::Type;
use std::collections::BTreeMap;
use std::fmt;

/// Named attributes of an operation, ordered by name.
pub type AttrMap = BTreeMap<String, Attr>;

/// Kind of a case in a `select_case` operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaseTag {
  /// Selector equals the compare operand.
  Point,
  /// Selector is not less than the compare operand.
  LowerBound,
  /// Selector is not greater than the compare operand.
  UpperBound,
  /// Selector is in the range of the two compare operands.
  ClosedInterval,
}

impl CaseTag {
  /// Returns the spelling of the case tag.
  pub fn name(self) -> &'static str {
    match self {
      CaseTag::Point => "#fir.point",
      CaseTag::LowerBound => "#fir.lower",
      CaseTag::UpperBound => "#fir.upper",
      CaseTag::ClosedInterval => "#fir.interval",
    }
  }

  /// Returns the case tag by its spelling.
  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "#fir.point" => Some(CaseTag::Point),
      "#fir.lower" => Some(CaseTag::LowerBound),
      "#fir.upper" => Some(CaseTag::UpperBound),
      "#fir.interval" => Some(CaseTag::ClosedInterval),
      _ => None,
    }
  }
}

/// An attribute.
#[derive(Clone, Debug)]
pub enum Attr {
  /// Unit marker, also the default case of a multi-way branch.
  Unit,
  /// Boolean.
  Bool(bool),
  /// Integer.
  Int(i64),
  /// Floating point number.
  Float(f64),
  /// String.
  Str(String),
  /// Type.
  Type(Type),
  /// Reference to a symbol (function, global or dispatch table).
  Symbol(String),
  /// Array of attributes.
  Array(Vec<Attr>),
  /// Vector of integers, used for operand offsets.
  IntVec(Vec<i64>),
  /// Case marker of `select_case`.
  Case(CaseTag),
}

impl Attr {
  /// Returns the integer of the current attribute.
  pub fn as_int(&self) -> Option<i64> {
    match self {
      Attr::Int(i) => Some(*i),
      _ => None,
    }
  }

  /// Returns the floating point number of the current attribute.
  pub fn as_float(&self) -> Option<f64> {
    match self {
      Attr::Float(f) => Some(*f),
      _ => None,
    }
  }

  /// Returns the string of the current attribute.
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Attr::Str(s) => Some(s),
      _ => None,
    }
  }

  /// Returns the symbol name of the current attribute.
  pub fn as_symbol(&self) -> Option<&str> {
    match self {
      Attr::Symbol(s) => Some(s),
      _ => None,
    }
  }

  /// Returns the type of the current attribute.
  pub fn as_type(&self) -> Option<&Type> {
    match self {
      Attr::Type(t) => Some(t),
      _ => None,
    }
  }

  /// Returns the elements of the current array attribute.
  pub fn as_array(&self) -> Option<&[Attr]> {
    match self {
      Attr::Array(a) => Some(a),
      _ => None,
    }
  }

  /// Returns the integers of the current integer vector attribute.
  pub fn as_int_vec(&self) -> Option<&[i64]> {
    match self {
      Attr::IntVec(v) => Some(v),
      _ => None,
    }
  }

  /// Checks if the current attribute can be used as a case of
  /// `select_case`.
  pub fn is_valid_case(&self) -> bool {
    matches!(self, Attr::Unit | Attr::Case(_))
  }

  /// Returns the number of compare operands consumed by the current case
  /// attribute.
  ///
  /// The default case consumes none, a closed interval consumes two, and
  /// everything else consumes one.
  pub fn case_operand_count(&self) -> usize {
    match self {
      Attr::Unit => 0,
      Attr::Case(CaseTag::ClosedInterval) => 2,
      _ => 1,
    }
  }
}

impl PartialEq for Attr {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Attr::Unit, Attr::Unit) => true,
      (Attr::Bool(l), Attr::Bool(r)) => l == r,
      (Attr::Int(l), Attr::Int(r)) => l == r,
      // compare bits, so NaNs and signed zeros survive round trips
      (Attr::Float(l), Attr::Float(r)) => l.to_bits() == r.to_bits(),
      (Attr::Str(l), Attr::Str(r)) => l == r,
      (Attr::Type(l), Attr::Type(r)) => l == r,
      (Attr::Symbol(l), Attr::Symbol(r)) => l == r,
      (Attr::Array(l), Attr::Array(r)) => l == r,
      (Attr::IntVec(l), Attr::IntVec(r)) => l == r,
      (Attr::Case(l), Attr::Case(r)) => l == r,
      _ => false,
    }
  }
}

impl Eq for Attr {}

impl fmt::Display for Attr {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Attr::Unit => write!(f, "unit"),
      Attr::Bool(b) => write!(f, "{}", b),
      Attr::Int(i) => write!(f, "{}", i),
      Attr::Float(v) if v.is_finite() => write!(f, "{:?}", v),
      Attr::Float(v) => write!(f, "0x{:016X}", v.to_bits()),
      Attr::Str(s) => {
        write!(f, "\"")?;
        for c in s.chars() {
          match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            c if c.is_ascii_control() => write!(f, "\\{:02X}", c as u32)?,
            c => write!(f, "{}", c)?,
          }
        }
        write!(f, "\"")
      }
      Attr::Type(t) => write!(f, "{}", t),
      Attr::Symbol(s) => write!(f, "@{}", s),
      Attr::Array(a) => {
        write!(f, "[")?;
        for (i, e) in a.iter().enumerate() {
          if i != 0 {
            write!(f, ", ")?;
          }
          write!(f, "{}", e)?;
        }
        write!(f, "]")
      }
      Attr::IntVec(v) => {
        write!(f, "dense<")?;
        for (i, e) in v.iter().enumerate() {
          if i != 0 {
            write!(f, ", ")?;
          }
          write!(f, "{}", e)?;
        }
        write!(f, ">")
      }
      Attr::Case(tag) => f.write_str(tag.name()),
    }
  }
}
