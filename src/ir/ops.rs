//! Operation kinds ([`OpKind`]) and comparison predicates.

use std::fmt;

/// Declares the closed set of operation kinds with their names.
macro_rules! op_kinds {
  ($($(#[$attr:meta])* $kind:ident => $name:literal,)*) => {
    /// Kind of an operation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum OpKind {
      $($(#[$attr])* $kind,)*
    }

    impl OpKind {
      /// All operation kinds.
      pub const ALL: &'static [OpKind] = &[$(OpKind::$kind,)*];

      /// Returns the name of the operation kind in the text form.
      pub fn name(self) -> &'static str {
        match self {
          $(OpKind::$kind => $name,)*
        }
      }
    }
  };
}

op_kinds! {
  /// Integer, floating point or boolean constant (`value` attribute).
  Constant => "fir.constant",
  /// Undefined value of a type.
  Undefined => "fir.undefined",
  /// Stack allocation, returns a reference.
  Alloca => "fir.alloca",
  /// Heap allocation, returns a heap reference.
  AllocMem => "fir.allocmem",
  /// Heap deallocation.
  FreeMem => "fir.freemem",
  /// Memory load.
  Load => "fir.load",
  /// Memory store.
  Store => "fir.store",
  /// Type conversion.
  Convert => "fir.convert",
  /// Floating point addition.
  AddF => "fir.addf",
  /// Floating point subtraction.
  SubF => "fir.subf",
  /// Floating point multiplication.
  MulF => "fir.mulf",
  /// Floating point division.
  DivF => "fir.divf",
  /// Integer addition.
  AddI => "fir.addi",
  /// Integer subtraction.
  SubI => "fir.subi",
  /// Integer multiplication.
  MulI => "fir.muli",
  /// Floating point comparison.
  CmpF => "fir.cmpf",
  /// Integer comparison.
  CmpI => "fir.cmpi",
  /// Function call.
  Call => "fir.call",
  /// Boxes a memory reference into a descriptor.
  Embox => "fir.embox",
  /// Address of the entity in a descriptor.
  BoxAddr => "fir.box_addr",
  /// Type descriptor of a type.
  GenTypeDesc => "fir.gentypedesc",
  /// Address of a global.
  AddressOf => "fir.address_of",
  /// Conditional with a then region and an optional else region.
  If => "fir.if",
  /// Bounded counting loop.
  DoLoop => "fir.do_loop",
  /// Counting loop that also stops when its condition turns false.
  IterateWhile => "fir.iterate_while",
  /// Terminator of the regions of `if`, `do_loop` and `iterate_while`.
  Result => "fir.result",
  /// Multi-way branch on an integer.
  Select => "fir.select",
  /// Multi-way branch on case ranges.
  SelectCase => "fir.select_case",
  /// Multi-way branch on the rank of a descriptor.
  SelectRank => "fir.select_rank",
  /// Multi-way branch on the dynamic type of a descriptor.
  SelectType => "fir.select_type",
  /// Unconditional branch.
  Br => "br",
  /// Conditional branch.
  CondBr => "cond_br",
  /// Function return.
  Return => "return",
  /// Marks a point that is never reached.
  Unreachable => "fir.unreachable",
  /// Function definition or declaration.
  Func => "func",
  /// Global variable.
  Global => "fir.global",
  /// Terminator of the initializer region of a global.
  HasValue => "fir.has_value",
  /// Table of type-bound procedures.
  DispatchTable => "fir.dispatch_table",
  /// Entry of a dispatch table.
  DtEntry => "fir.dt_entry",
}

impl OpKind {
  /// Returns the operation kind by its name in the text form.
  pub fn from_name(name: &str) -> Option<OpKind> {
    Self::ALL.iter().copied().find(|k| k.name() == name)
  }

  /// Checks if the operation kind terminates a block.
  pub fn is_terminator(self) -> bool {
    matches!(
      self,
      OpKind::Result
        | OpKind::Select
        | OpKind::SelectCase
        | OpKind::SelectRank
        | OpKind::SelectType
        | OpKind::Br
        | OpKind::CondBr
        | OpKind::Return
        | OpKind::Unreachable
        | OpKind::HasValue
    )
  }

  /// Checks if the operation kind is a multi-way branch.
  pub fn is_select(self) -> bool {
    matches!(
      self,
      OpKind::Select | OpKind::SelectCase | OpKind::SelectRank | OpKind::SelectType
    )
  }

  /// Checks if the operation kind defines a symbol at module level.
  pub fn is_symbol(self) -> bool {
    matches!(self, OpKind::Func | OpKind::Global | OpKind::DispatchTable)
  }

  /// Checks if the operation kind is a floating point binary operation.
  pub fn is_float_binary(self) -> bool {
    matches!(self, OpKind::AddF | OpKind::SubF | OpKind::MulF | OpKind::DivF)
  }

  /// Checks if the operation kind is an integer binary operation.
  pub fn is_int_binary(self) -> bool {
    matches!(self, OpKind::AddI | OpKind::SubI | OpKind::MulI)
  }
}

impl fmt::Display for OpKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Declares a comparison predicate enum.
macro_rules! predicates {
  ($(#[$attr:meta])* $ty:ident { $($pred:ident => $name:literal,)* }) => {
    $(#[$attr])*
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum $ty {
      $($pred,)*
    }

    impl $ty {
      const ALL: &'static [$ty] = &[$($ty::$pred,)*];

      /// Returns the name of the predicate.
      pub fn name(self) -> &'static str {
        match self {
          $($ty::$pred => $name,)*
        }
      }

      /// Returns the predicate by its name.
      pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
      }

      /// Returns the predicate by its integer encoding.
      pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
      }

      /// Returns the integer encoding of the predicate.
      pub fn index(self) -> i64 {
        self as i64
      }
    }
  };
}

predicates! {
  /// Predicate of `cmpf`. Ordered predicates are false if either operand
  /// is NaN, unordered ones are true.
  CmpFPredicate {
    AlwaysFalse => "false",
    Oeq => "oeq",
    Ogt => "ogt",
    Oge => "oge",
    Olt => "olt",
    Ole => "ole",
    One => "one",
    Ord => "ord",
    Ueq => "ueq",
    Ugt => "ugt",
    Uge => "uge",
    Ult => "ult",
    Ule => "ule",
    Une => "une",
    Uno => "uno",
    AlwaysTrue => "true",
  }
}

predicates! {
  /// Predicate of `cmpi`.
  CmpIPredicate {
    Eq => "eq",
    Ne => "ne",
    Slt => "slt",
    Sle => "sle",
    Sgt => "sgt",
    Sge => "sge",
    Ult => "ult",
    Ule => "ule",
    Ugt => "ugt",
    Uge => "uge",
  }
}

impl CmpFPredicate {
  /// Evaluates the predicate on two constants.
  pub fn eval(self, l: f64, r: f64) -> bool {
    let unordered = l.is_nan() || r.is_nan();
    match self {
      CmpFPredicate::AlwaysFalse => false,
      CmpFPredicate::Oeq => !unordered && l == r,
      CmpFPredicate::Ogt => !unordered && l > r,
      CmpFPredicate::Oge => !unordered && l >= r,
      CmpFPredicate::Olt => !unordered && l < r,
      CmpFPredicate::Ole => !unordered && l <= r,
      CmpFPredicate::One => !unordered && l != r,
      CmpFPredicate::Ord => !unordered,
      CmpFPredicate::Ueq => unordered || l == r,
      CmpFPredicate::Ugt => unordered || l > r,
      CmpFPredicate::Uge => unordered || l >= r,
      CmpFPredicate::Ult => unordered || l < r,
      CmpFPredicate::Ule => unordered || l <= r,
      CmpFPredicate::Une => unordered || l != r,
      CmpFPredicate::Uno => unordered,
      CmpFPredicate::AlwaysTrue => true,
    }
  }
}

/// Linkage of a global.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Linkage {
  Internal,
  Common,
  Weak,
}

impl Linkage {
  /// Returns the spelling of the linkage.
  pub fn name(self) -> &'static str {
    match self {
      Linkage::Internal => "internal",
      Linkage::Common => "common",
      Linkage::Weak => "weak",
    }
  }

  /// Returns the linkage by its spelling, only `internal`, `common` and
  /// `weak` are valid.
  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "internal" => Some(Linkage::Internal),
      "common" => Some(Linkage::Common),
      "weak" => Some(Linkage::Weak),
      _ => None,
    }
  }
}
