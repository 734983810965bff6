//! Types ([`Type`]) of FIR values.
//!
//! All types are interned in a thread-local pool, so two types built from
//! the same parts are the same [`Type`], and comparing types is cheap.
//! Record types are interned by name; their field lists are attached after
//! creation, which allows records to refer to themselves through
//! reference-like types.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::{fmt, hash};

/// Extent of a dimension of a sequence type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Extent {
  /// Extent known at compile time.
  Known(u64),
  /// Extent only known at run time, supplied by a dynamic extent operand
  /// at the use site.
  Unknown,
}

/// Kind of a FIR type.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
  /// Integer with the given bit width, `i1` is the boolean type.
  Integer(u32),
  /// Machine index type, used by loop bounds and induction variables.
  Index,
  /// Real with the given kind.
  Real(u8),
  /// Complex with the given kind of its parts.
  Complex(u8),
  /// Logical with the given kind.
  Logical(u8),
  /// Character with the given kind.
  Character(u8),
  /// Reference to a memory location.
  Ref(Type),
  /// Pointer (may be associated or not).
  Ptr(Type),
  /// Reference to a heap allocation.
  Heap(Type),
  /// Sequence (array) with its shape and element type.
  Sequence(Vec<Extent>, Type),
  /// Record (derived type), identified by its name.
  Record(String),
  /// Boxed descriptor of an entity.
  Box(Type),
  /// Type descriptor of a type.
  TypeDesc(Type),
  /// Function with parameter types and result types.
  Function(Vec<Type>, Vec<Type>),
  /// Absence of a value.
  Void,
}

/// Family of types accepted by a kind of operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeFamily {
  /// Integers and the index type.
  IntegerLike,
  /// Reals.
  FloatLike,
  /// Complex values.
  ComplexLike,
  /// References, pointers and heap references.
  ReferenceLike,
}

/// Field list and length parameter count of a record type.
#[derive(Clone, PartialEq, Eq)]
pub struct RecordBody {
  pub fields: Vec<(String, Type)>,
  pub len_params: usize,
}

/// Types in FIR.
#[derive(Clone, PartialEq, Eq)]
pub struct Type(Rc<TypeKind>);

impl hash::Hash for Type {
  fn hash<H: hash::Hasher>(&self, state: &mut H) {
    self.0.hash(state)
  }
}

thread_local! {
  /// Pool of all created types.
  static POOL: RefCell<HashMap<TypeKind, Type>> = RefCell::new(HashMap::new());
  /// Bodies of record types, by record name.
  static RECORDS: RefCell<HashMap<String, RecordBody>> = RefCell::new(HashMap::new());
}

impl Type {
  /// Returns a type by the given [`TypeKind`].
  pub fn get(kind: TypeKind) -> Type {
    POOL.with(|pool| {
      let mut pool = pool.borrow_mut();
      pool.get(&kind).cloned().unwrap_or_else(|| {
        let ty = Type(Rc::new(kind.clone()));
        pool.insert(kind, ty.clone());
        ty
      })
    })
  }

  /// Returns an `i1` type.
  pub fn get_i1() -> Type {
    Type::get(TypeKind::Integer(1))
  }

  /// Returns an integer type with the given bit width.
  pub fn get_int(bits: u32) -> Type {
    Type::get(TypeKind::Integer(bits))
  }

  /// Returns an `i32` type.
  pub fn get_i32() -> Type {
    Type::get(TypeKind::Integer(32))
  }

  /// Returns an `i64` type.
  pub fn get_i64() -> Type {
    Type::get(TypeKind::Integer(64))
  }

  /// Returns the index type.
  pub fn get_index() -> Type {
    Type::get(TypeKind::Index)
  }

  /// Returns a real type of the given kind.
  pub fn get_real(kind: u8) -> Type {
    Type::get(TypeKind::Real(kind))
  }

  /// Returns a complex type of the given kind.
  pub fn get_complex(kind: u8) -> Type {
    Type::get(TypeKind::Complex(kind))
  }

  /// Returns a logical type of the given kind.
  pub fn get_logical(kind: u8) -> Type {
    Type::get(TypeKind::Logical(kind))
  }

  /// Returns a character type of the given kind.
  pub fn get_char(kind: u8) -> Type {
    Type::get(TypeKind::Character(kind))
  }

  /// Returns a reference type.
  pub fn get_ref(base: Type) -> Type {
    Type::get(TypeKind::Ref(base))
  }

  /// Returns a pointer type.
  pub fn get_ptr(base: Type) -> Type {
    Type::get(TypeKind::Ptr(base))
  }

  /// Returns a heap reference type.
  pub fn get_heap(base: Type) -> Type {
    Type::get(TypeKind::Heap(base))
  }

  /// Returns a sequence type.
  pub fn get_sequence(shape: Vec<Extent>, elem: Type) -> Type {
    Type::get(TypeKind::Sequence(shape, elem))
  }

  /// Returns the record type with the given name. The body of a newly
  /// named record is empty until [`set_record_body`](Type::set_record_body)
  /// is called.
  pub fn get_record(name: &str) -> Type {
    Type::get(TypeKind::Record(name.into()))
  }

  /// Returns a boxed descriptor type.
  pub fn get_box(base: Type) -> Type {
    Type::get(TypeKind::Box(base))
  }

  /// Returns a type descriptor type.
  pub fn get_tdesc(base: Type) -> Type {
    Type::get(TypeKind::TypeDesc(base))
  }

  /// Returns a function type.
  pub fn get_function(params: Vec<Type>, results: Vec<Type>) -> Type {
    Type::get(TypeKind::Function(params, results))
  }

  /// Returns the void type.
  pub fn get_void() -> Type {
    Type::get(TypeKind::Void)
  }

  /// Returns a reference to the kind of the current type.
  pub fn kind(&self) -> &TypeKind {
    &self.0
  }

  /// Sets the fields and length parameter count of a record type.
  ///
  /// # Panics
  ///
  /// Panics if the current type is not a record type, or the record
  /// already has a different body.
  pub fn set_record_body(&self, fields: Vec<(String, Type)>, len_params: usize) {
    let name = match self.kind() {
      TypeKind::Record(name) => name.clone(),
      _ => panic!("expected a record type"),
    };
    let body = RecordBody { fields, len_params };
    RECORDS.with(|records| {
      let mut records = records.borrow_mut();
      if let Some(old) = records.get(&name) {
        assert!(old == &body, "record `{}` is already defined", name);
      } else {
        records.insert(name, body);
      }
    })
  }

  /// Returns the body of the current record type, or `None` if the type
  /// is not a record or the record has no body yet.
  pub fn record_body(&self) -> Option<RecordBody> {
    match self.kind() {
      TypeKind::Record(name) => RECORDS.with(|r| r.borrow().get(name).cloned()),
      _ => None,
    }
  }

  /// Checks if the current type is `i1`.
  pub fn is_i1(&self) -> bool {
    matches!(self.kind(), TypeKind::Integer(1))
  }

  /// Checks if the current type is the index type.
  pub fn is_index(&self) -> bool {
    matches!(self.kind(), TypeKind::Index)
  }

  /// Checks if the current type is void.
  pub fn is_void(&self) -> bool {
    matches!(self.kind(), TypeKind::Void)
  }

  /// Checks if the current type is a reference, pointer or heap reference.
  pub fn is_ref_like(&self) -> bool {
    matches!(self.kind(), TypeKind::Ref(_) | TypeKind::Ptr(_) | TypeKind::Heap(_))
  }

  /// Checks if the current type belongs to the given family.
  pub fn is_compatible(&self, family: TypeFamily) -> bool {
    match family {
      TypeFamily::IntegerLike => matches!(self.kind(), TypeKind::Integer(_) | TypeKind::Index),
      TypeFamily::FloatLike => matches!(self.kind(), TypeKind::Real(_)),
      TypeFamily::ComplexLike => matches!(self.kind(), TypeKind::Complex(_)),
      TypeFamily::ReferenceLike => self.is_ref_like(),
    }
  }

  /// Returns the element type of a reference-like type or a descriptor.
  pub fn element_type(&self) -> Option<&Type> {
    match self.kind() {
      TypeKind::Ref(t) | TypeKind::Ptr(t) | TypeKind::Heap(t) | TypeKind::Box(t) => Some(t),
      _ => None,
    }
  }

  /// Returns the parameter and result types of a function type.
  pub fn function_sig(&self) -> Option<(&[Type], &[Type])> {
    match self.kind() {
      TypeKind::Function(params, results) => Some((params, results)),
      _ => None,
    }
  }

  /// Checks if two types are structurally equal.
  ///
  /// Types are interned, records compare by name.
  pub fn structural_eq(&self, other: &Type) -> bool {
    self == other
  }

  /// Checks if the current type can not be allocated when
  /// `dynamic_extents` extents are supplied at the use site.
  ///
  /// A sequence with no dimensions is incomplete, as is a sequence with
  /// more unknown extents than `dynamic_extents`. Records are incomplete
  /// if any of their fields are. A record that is reached again while its
  /// fields are being checked is treated as complete.
  pub fn is_incomplete(&self, dynamic_extents: usize) -> bool {
    self.incomplete_in(dynamic_extents, &mut Vec::new())
  }

  fn incomplete_in(&self, dynamic_extents: usize, visited: &mut Vec<String>) -> bool {
    match self.kind() {
      TypeKind::Sequence(shape, elem) => {
        if shape.is_empty() {
          return true;
        }
        let unknown = shape.iter().filter(|e| **e == Extent::Unknown).count();
        unknown > dynamic_extents || elem.incomplete_in(0, visited)
      }
      TypeKind::Record(name) => {
        // don't recurse if we're already visiting this one
        if visited.contains(name) {
          return false;
        }
        let body = match self.record_body() {
          Some(body) => body,
          None => return true,
        };
        visited.push(name.clone());
        let incomplete = body.fields.iter().any(|(_, t)| t.incomplete_in(0, visited));
        visited.pop();
        incomplete
      }
      TypeKind::Ref(t) | TypeKind::Ptr(t) | TypeKind::Heap(t) => {
        t.incomplete_in(dynamic_extents, visited)
      }
      _ => false,
    }
  }

  /// Checks if the given number of length parameter operands does not
  /// match the current type.
  pub fn len_params_mismatch(&self, len_params: usize) -> bool {
    if len_params == 0 {
      return false;
    }
    match self.record_body() {
      Some(body) => body.len_params != len_params,
      None => true,
    }
  }

  /// Checks that a record type does not contain itself other than through
  /// a reference-like type or a descriptor.
  pub fn check_record(&self) -> Result<(), String> {
    let name = match self.kind() {
      TypeKind::Record(name) => name,
      TypeKind::Sequence(_, elem) => return elem.check_record(),
      _ => return Ok(()),
    };
    let mut visited = Vec::new();
    if self.contains_directly(name, &mut visited) {
      Err(format!("record `{}` contains itself", name))
    } else {
      Ok(())
    }
  }

  fn contains_directly(&self, target: &str, visited: &mut Vec<String>) -> bool {
    match self.kind() {
      TypeKind::Sequence(_, elem) => elem.contains_directly(target, visited),
      TypeKind::Record(name) => {
        // reached the checked record again without indirection
        if name == target && !visited.is_empty() {
          return true;
        }
        if visited.contains(name) {
          return false;
        }
        visited.push(name.clone());
        self.record_body().map_or(false, |b| {
          b.fields.iter().any(|(_, t)| t.contains_directly(target, visited))
        })
      }
      _ => false,
    }
  }

  fn fmt_in(&self, f: &mut fmt::Formatter, records: &mut Vec<String>) -> fmt::Result {
    match self.kind() {
      TypeKind::Integer(bits) => write!(f, "i{}", bits),
      TypeKind::Index => write!(f, "index"),
      TypeKind::Real(2) => write!(f, "f16"),
      TypeKind::Real(3) => write!(f, "bf16"),
      TypeKind::Real(4) => write!(f, "f32"),
      TypeKind::Real(8) => write!(f, "f64"),
      TypeKind::Real(k) => write!(f, "!fir.real<{}>", k),
      TypeKind::Complex(k) => write!(f, "!fir.complex<{}>", k),
      TypeKind::Logical(k) => write!(f, "!fir.logical<{}>", k),
      TypeKind::Character(k) => write!(f, "!fir.char<{}>", k),
      TypeKind::Ref(t) => wrapped(f, "ref", t, records),
      TypeKind::Ptr(t) => wrapped(f, "ptr", t, records),
      TypeKind::Heap(t) => wrapped(f, "heap", t, records),
      TypeKind::Box(t) => wrapped(f, "box", t, records),
      TypeKind::TypeDesc(t) => wrapped(f, "tdesc", t, records),
      TypeKind::Sequence(shape, elem) => {
        write!(f, "!fir.array<")?;
        if shape.is_empty() {
          write!(f, "* x ")?;
        }
        for ext in shape {
          match ext {
            Extent::Known(n) => write!(f, "{} x ", n)?,
            Extent::Unknown => write!(f, "? x ")?,
          }
        }
        elem.fmt_in(f, records)?;
        write!(f, ">")
      }
      TypeKind::Record(name) => {
        write!(f, "!fir.type<{}", name)?;
        // nested occurrences of a record are printed by name
        if !records.contains(name) {
          if let Some(body) = self.record_body() {
            records.push(name.clone());
            if body.len_params > 0 {
              write!(f, "({})", body.len_params)?;
            }
            write!(f, "{{")?;
            for (i, (field, ty)) in body.fields.iter().enumerate() {
              if i != 0 {
                write!(f, ", ")?;
              }
              write!(f, "{} : ", field)?;
              ty.fmt_in(f, records)?;
            }
            write!(f, "}}")?;
            records.pop();
          }
        }
        write!(f, ">")
      }
      TypeKind::Function(params, results) => {
        write!(f, "(")?;
        for (i, p) in params.iter().enumerate() {
          if i != 0 {
            write!(f, ", ")?;
          }
          p.fmt_in(f, records)?;
        }
        write!(f, ") -> (")?;
        for (i, r) in results.iter().enumerate() {
          if i != 0 {
            write!(f, ", ")?;
          }
          r.fmt_in(f, records)?;
        }
        write!(f, ")")
      }
      TypeKind::Void => write!(f, "none"),
    }
  }
}

fn wrapped(f: &mut fmt::Formatter, name: &str, t: &Type, records: &mut Vec<String>) -> fmt::Result {
  write!(f, "!fir.{}<", name)?;
  t.fmt_in(f, records)?;
  write!(f, ">")
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    self.fmt_in(f, &mut Vec::new())
  }
}

impl fmt::Debug for Type {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self)
  }
}
