//! Mapping of source types to FIR types.

use crate::ir::{Extent, Type};
use crate::pft::syntax::{Bounds, Details, Scope, SymbolId, TypeCategory};
use crate::pft::Variable;
use std::{error, fmt};

/// Default kinds of intrinsic type categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultKinds {
  pub integer: u8,
  pub real: u8,
  pub complex: u8,
  pub character: u8,
  pub logical: u8,
}

impl DefaultKinds {
  /// Returns the default kind of the given category.
  ///
  /// # Panics
  ///
  /// Panics if `category` is [`TypeCategory::Derived`].
  pub fn kind(&self, category: TypeCategory) -> u8 {
    match category {
      TypeCategory::Integer => self.integer,
      TypeCategory::Real => self.real,
      TypeCategory::Complex => self.complex,
      TypeCategory::Character => self.character,
      TypeCategory::Logical => self.logical,
      TypeCategory::Derived => panic!("derived types have no default kind"),
    }
  }
}

impl Default for DefaultKinds {
  fn default() -> Self {
    Self {
      integer: 4,
      real: 4,
      complex: 4,
      character: 1,
      logical: 4,
    }
  }
}

/// Error returned by type conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConvertError {
  /// The kind is not valid for the category.
  InvalidKind(TypeCategory, u8),
  /// The symbol does not declare a typed entity.
  Untyped(String),
  /// Objects of derived types are not converted yet.
  DerivedType(String),
}

impl fmt::Display for ConvertError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ConvertError::InvalidKind(category, kind) => {
        write!(f, "invalid kind {} of {:?} type", kind, category)
      }
      ConvertError::Untyped(name) => write!(f, "symbol `{}` must have a type", name),
      ConvertError::DerivedType(name) => {
        write!(f, "can not convert `{}` of derived type", name)
      }
    }
  }
}

impl error::Error for ConvertError {}

/// Result of type conversion.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Returns the FIR type of an intrinsic type category and kind.
pub fn intrinsic_type(category: TypeCategory, kind: u8) -> Result<Type> {
  let invalid = || Err(ConvertError::InvalidKind(category, kind));
  match (category, kind) {
    (TypeCategory::Integer, 1 | 2 | 4 | 8 | 16) => Ok(Type::get_int(kind as u32 * 8)),
    (TypeCategory::Real, 2 | 3 | 4 | 8 | 10 | 16) => Ok(Type::get_real(kind)),
    (TypeCategory::Complex, 2 | 3 | 4 | 8 | 10 | 16) => Ok(Type::get_complex(kind)),
    (TypeCategory::Logical, 1 | 2 | 4 | 8) => Ok(Type::get_logical(kind)),
    (TypeCategory::Character, 1 | 2 | 4) => Ok(Type::get_char(kind)),
    _ => invalid(),
  }
}

/// Converts the types of symbols in a scope.
pub struct TypeConverter<'s> {
  scope: &'s Scope,
  defaults: DefaultKinds,
}

impl<'s> TypeConverter<'s> {
  /// Creates a converter of symbols in the given scope.
  pub fn new(scope: &'s Scope, defaults: DefaultKinds) -> Self {
    Self { scope, defaults }
  }

  /// Returns the type of the given category with its default kind.
  pub fn default_type(&self, category: TypeCategory) -> Result<Type> {
    if category == TypeCategory::Derived {
      return Err(ConvertError::DerivedType("<expression>".into()));
    }
    intrinsic_type(category, self.defaults.kind(category))
  }

  /// Returns the type of the given symbol. Subprograms get their function
  /// types, arrays get sequence types, allocatable and pointer objects get
  /// heap and pointer types.
  pub fn symbol_type(&self, symbol: SymbolId) -> Result<Type> {
    self.symbol_type_with(symbol, false, false)
  }

  /// Returns the type of storage of a variable.
  pub fn variable_type(&self, var: &Variable) -> Result<Type> {
    match var {
      Variable::Nominal {
        symbol,
        heap_alloc,
        pointer,
        ..
      } => self.symbol_type_with(*symbol, *heap_alloc, *pointer),
      // a store is a sequence of bytes
      Variable::IntervalStore { size, .. } => Ok(Type::get_sequence(
        vec![Extent::Known(*size as u64)],
        Type::get_int(8),
      )),
    }
  }

  /// Returns the function type of a subprogram symbol. Dummy arguments are
  /// passed by reference, a subroutine with alternate returns yields an
  /// index.
  pub fn function_type(&self, symbol: SymbolId) -> Result<Type> {
    let sym = self.scope.symbol(symbol);
    let details = match &sym.details {
      Details::Subprogram(details) => details,
      _ => return Err(ConvertError::Untyped(sym.name.clone())),
    };
    let mut results = Vec::new();
    if let Some(result) = details.result {
      results.push(self.symbol_type(result)?);
    } else if details.dummy_args.iter().any(Option::is_none) {
      results.push(Type::get_index());
    }
    let params = details
      .dummy_args
      .iter()
      .flatten()
      .map(|arg| self.dummy_arg_type(*arg))
      .collect::<Result<_>>()?;
    Ok(Type::get_function(params, results))
  }

  fn dummy_arg_type(&self, symbol: SymbolId) -> Result<Type> {
    match &self.scope.symbol(symbol).details {
      Details::Object(obj) if obj.category == TypeCategory::Character => {
        let kind = obj.kind.unwrap_or(self.defaults.character);
        Ok(Type::get_box(intrinsic_type(TypeCategory::Character, kind)?))
      }
      _ => Ok(Type::get_ref(self.symbol_type(symbol)?)),
    }
  }

  fn symbol_type_with(&self, symbol: SymbolId, heap_alloc: bool, pointer: bool) -> Result<Type> {
    let sym = self.scope.symbol(symbol);
    let obj = match &sym.details {
      Details::Subprogram(_) => return self.function_type(symbol),
      Details::Object(obj) => obj,
      _ => return Err(ConvertError::Untyped(sym.name.clone())),
    };
    if obj.category == TypeCategory::Derived {
      return Err(ConvertError::DerivedType(sym.name.clone()));
    }
    let kind = obj.kind.unwrap_or_else(|| self.defaults.kind(obj.category));
    let ty = intrinsic_type(obj.category, kind)?;
    if !obj.shape.is_empty() {
      let mut shape = Vec::new();
      // character arrays take the length as the first extent
      if obj.category == TypeCategory::Character {
        shape.push(extent_of(Some(1), obj.char_len.as_ref().and_then(|e| e.value)));
      }
      shape.extend(obj.shape.iter().map(extent));
      return Ok(Type::get_sequence(shape, ty));
    }
    Ok(if pointer || sym.attrs.pointer {
      Type::get_ptr(ty)
    } else if heap_alloc || sym.attrs.allocatable {
      Type::get_heap(ty)
    } else {
      ty
    })
  }
}

/// Extent of a dimension, the lower bound defaults to 1.
fn extent(bounds: &Bounds) -> Extent {
  let lower = match &bounds.lower {
    Some(lower) => lower.value,
    None => Some(1),
  };
  let upper = bounds.upper.as_ref().and_then(|e| e.value);
  extent_of(lower, upper)
}

fn extent_of(lower: Option<i64>, upper: Option<i64>) -> Extent {
  match (lower, upper) {
    (Some(lower), Some(upper)) => Extent::Known((upper - lower + 1).max(0) as u64),
    _ => Extent::Unknown,
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::pft::syntax::{Expr, ObjectDetails, SubprogramDetails, Symbol, SymbolAttrs};
  use crate::pft::variables::order_variables;

  fn object(category: TypeCategory, kind: Option<u8>) -> Details {
    let mut details = ObjectDetails::scalar(category);
    details.kind = kind;
    Details::Object(details)
  }

  #[test]
  fn intrinsic_kinds() {
    assert_eq!(intrinsic_type(TypeCategory::Integer, 8), Ok(Type::get_i64()));
    assert_eq!(intrinsic_type(TypeCategory::Real, 10), Ok(Type::get_real(10)));
    assert_eq!(intrinsic_type(TypeCategory::Logical, 1), Ok(Type::get_logical(1)));
    assert_eq!(
      intrinsic_type(TypeCategory::Integer, 3),
      Err(ConvertError::InvalidKind(TypeCategory::Integer, 3))
    );
    assert!(intrinsic_type(TypeCategory::Character, 8).is_err());
  }

  #[test]
  fn scalars_and_arrays() {
    let mut scope = Scope::new();
    let i = scope.add(Symbol::new("i", object(TypeCategory::Integer, None)));
    let d = scope.add(Symbol::new("d", object(TypeCategory::Real, Some(8))));
    let mut arr = ObjectDetails::scalar(TypeCategory::Real);
    arr.shape.push(Bounds {
      lower: None,
      upper: Some(Expr::int(10)),
    });
    arr.shape.push(Bounds {
      lower: Some(Expr::int(0)),
      upper: Some(Expr::of(TypeCategory::Integer, vec![i])),
    });
    let a = scope.add(Symbol::new("a", Details::Object(arr)));
    let mut chars = ObjectDetails::scalar(TypeCategory::Character);
    chars.char_len = Some(Expr::int(8));
    chars.shape.push(Bounds {
      lower: Some(Expr::int(-1)),
      upper: Some(Expr::int(1)),
    });
    let c = scope.add(Symbol::new("c", Details::Object(chars)));
    let conv = TypeConverter::new(&scope, DefaultKinds::default());
    assert_eq!(conv.symbol_type(i), Ok(Type::get_i32()));
    assert_eq!(conv.symbol_type(d), Ok(Type::get_real(8)));
    assert_eq!(
      conv.symbol_type(a),
      Ok(Type::get_sequence(
        vec![Extent::Known(10), Extent::Unknown],
        Type::get_real(4)
      ))
    );
    assert_eq!(
      conv.symbol_type(c),
      Ok(Type::get_sequence(
        vec![Extent::Known(8), Extent::Known(3)],
        Type::get_char(1)
      ))
    );
  }

  #[test]
  fn pointers_and_functions() {
    let mut scope = Scope::new();
    let attrs = SymbolAttrs {
      allocatable: true,
      ..Default::default()
    };
    let h = scope.add(Symbol::new("h", object(TypeCategory::Real, None)).with_attrs(attrs));
    let x = scope.add(Symbol::new("x", object(TypeCategory::Integer, None)));
    let s = scope.add(Symbol::new("s", object(TypeCategory::Character, None)));
    let r = scope.add(Symbol::new("r", object(TypeCategory::Logical, None)));
    let f = scope.add(Symbol::new(
      "f",
      Details::Subprogram(SubprogramDetails {
        dummy_args: vec![Some(x), Some(s)],
        result: Some(r),
      }),
    ));
    let g = scope.add(Symbol::new(
      "g",
      Details::Subprogram(SubprogramDetails {
        dummy_args: vec![Some(x), None],
        result: None,
      }),
    ));
    let conv = TypeConverter::new(&scope, DefaultKinds::default());
    assert_eq!(conv.symbol_type(h), Ok(Type::get_heap(Type::get_real(4))));
    assert_eq!(
      conv.symbol_type(f),
      Ok(Type::get_function(
        vec![Type::get_ref(Type::get_i32()), Type::get_box(Type::get_char(1))],
        vec![Type::get_logical(4)],
      ))
    );
    assert_eq!(
      conv.function_type(g),
      Ok(Type::get_function(
        vec![Type::get_ref(Type::get_i32())],
        vec![Type::get_index()]
      ))
    );
    assert_eq!(conv.function_type(x), Err(ConvertError::Untyped("x".into())));
  }

  #[test]
  fn variables() {
    let mut scope = Scope::new();
    let a = scope.add(Symbol::new("a", object(TypeCategory::Real, Some(8))).with_storage(0, 8));
    let b = scope.add(Symbol::new("b", object(TypeCategory::Integer, None)).with_storage(4, 4));
    scope.add_equivalence(vec![a, b]);
    let vars = order_variables(&scope);
    let conv = TypeConverter::new(&scope, DefaultKinds::default());
    let store = vars
      .iter()
      .find(|v| matches!(v, Variable::IntervalStore { .. }))
      .unwrap();
    assert_eq!(
      conv.variable_type(store),
      Ok(Type::get_sequence(vec![Extent::Known(8)], Type::get_int(8)))
    );
    let derived = scope.add(Symbol::new("t", object(TypeCategory::Derived, None)));
    let conv = TypeConverter::new(&scope, DefaultKinds::default());
    assert_eq!(
      conv.symbol_type(derived),
      Err(ConvertError::DerivedType("t".into()))
    );
  }
}
