//! Local folding of single operations.
//!
//! Folders only look at the operation and the constants defining its
//! operands, and never modify the module. Applying the result is up to
//! the caller, see [`Folder`](crate::opt::Folder).

use crate::ir::attrs::Attr;
use crate::ir::entities::{Op, Value};
use crate::ir::module::Module;
use crate::ir::ops::{CmpFPredicate, CmpIPredicate, OpKind};
use crate::ir::types::TypeKind;

/// Result of folding an operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Folded {
  /// The result is an existing value.
  Value(Value),
  /// The result is a constant.
  Constant(Attr),
}

/// Tries to fold the given operation.
pub fn fold(module: &Module, op: Op) -> Option<Folded> {
  let data = module.op(op);
  match data.kind() {
    kind if kind.is_float_binary() => {
      let (l, r) = float_operands(module, op)?;
      let v = match kind {
        OpKind::AddF => l + r,
        OpKind::SubF => l - r,
        OpKind::MulF => l * r,
        _ => l / r,
      };
      Some(Folded::Constant(Attr::Float(v)))
    }
    kind if kind.is_int_binary() => {
      let (l, r) = int_operands(module, op)?;
      let v = match kind {
        OpKind::AddI => l.wrapping_add(r),
        OpKind::SubI => l.wrapping_sub(r),
        _ => l.wrapping_mul(r),
      };
      let bits = int_width(module, data.result())?;
      Some(Folded::Constant(Attr::Int(truncate(v, bits))))
    }
    OpKind::CmpF => {
      let (l, r) = float_operands(module, op)?;
      let pred = data.attr("predicate")?.as_int().and_then(CmpFPredicate::from_index)?;
      Some(Folded::Constant(Attr::Int(pred.eval(l, r) as i64)))
    }
    OpKind::CmpI => {
      let (l, r) = int_operands(module, op)?;
      let pred = data.attr("predicate")?.as_int().and_then(CmpIPredicate::from_index)?;
      let bits = int_width(module, data.operands()[0])?;
      Some(Folded::Constant(Attr::Int(eval_cmpi(pred, l, r, bits) as i64)))
    }
    OpKind::Convert => fold_convert(module, op),
    OpKind::BoxAddr => {
      let inner = module.defining_op(*data.operands().first()?)?;
      let inner = module.op(inner);
      (inner.kind() == OpKind::Embox).then(|| Folded::Value(inner.operands()[0]))
    }
    _ => None,
  }
}

/// `convert` to the same type folds to its operand, and a round trip
/// through `i1` folds away.
fn fold_convert(module: &Module, op: Op) -> Option<Folded> {
  let data = module.op(op);
  let value = *data.operands().first()?;
  let ty = module.value_type(data.result());
  if module.value_type(value) == ty {
    return Some(Folded::Value(value));
  }
  let inner = module.defining_op(value)?;
  let inner = module.op(inner);
  if inner.kind() == OpKind::Convert && module.value_type(value).is_i1() {
    let source = inner.operands()[0];
    if module.value_type(source) == ty {
      return Some(Folded::Value(source));
    }
  }
  None
}

/// Returns the constant attribute defining the given value.
pub fn constant_value(module: &Module, value: Value) -> Option<&Attr> {
  let op = module.defining_op(value)?;
  let data = module.op(op);
  (data.kind() == OpKind::Constant)
    .then(|| data.attr("value"))
    .flatten()
}

fn float_operands(module: &Module, op: Op) -> Option<(f64, f64)> {
  match module.op(op).operands() {
    [l, r] => Some((
      constant_value(module, *l)?.as_float()?,
      constant_value(module, *r)?.as_float()?,
    )),
    _ => None,
  }
}

fn int_operands(module: &Module, op: Op) -> Option<(i64, i64)> {
  match module.op(op).operands() {
    [l, r] => Some((
      constant_value(module, *l)?.as_int()?,
      constant_value(module, *r)?.as_int()?,
    )),
    _ => None,
  }
}

fn int_width(module: &Module, value: Value) -> Option<u32> {
  match module.value_type(value).kind() {
    TypeKind::Integer(bits) => Some(*bits),
    TypeKind::Index => Some(64),
    _ => None,
  }
}

/// Sign-extends the low `bits` bits of `v`. `i1` is kept as 0 or 1.
fn truncate(v: i64, bits: u32) -> i64 {
  match bits {
    1 => v & 1,
    b if b >= 64 => v,
    b => (v << (64 - b)) >> (64 - b),
  }
}

fn eval_cmpi(pred: CmpIPredicate, l: i64, r: i64, bits: u32) -> bool {
  let mask = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
  let (ul, ur) = (l as u64 & mask, r as u64 & mask);
  match pred {
    CmpIPredicate::Eq => l == r,
    CmpIPredicate::Ne => l != r,
    CmpIPredicate::Slt => l < r,
    CmpIPredicate::Sle => l <= r,
    CmpIPredicate::Sgt => l > r,
    CmpIPredicate::Sge => l >= r,
    CmpIPredicate::Ult => ul < ur,
    CmpIPredicate::Ule => ul <= ur,
    CmpIPredicate::Ugt => ul > ur,
    CmpIPredicate::Uge => ul >= ur,
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::ir::builder::OpBuilder;
  use crate::ir::types::Type;

  fn with_body<R>(f: impl FnOnce(&mut OpBuilder) -> R) -> (Module, R) {
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let func = b.func("fold", Type::get_function(vec![Type::get_ref(Type::get_real(4))], vec![]));
    let entry = b.func_body(func);
    let r = b.with_insertion_point(entry, f);
    (module, r)
  }

  fn op_of(module: &Module, v: Value) -> Op {
    module.defining_op(v).unwrap()
  }

  #[test]
  fn float_arith() {
    let (module, (add, mul, div)) = with_body(|b| {
      let x = b.const_float(Type::get_real(8), 1.5);
      let y = b.const_float(Type::get_real(8), 2.0);
      let add = b.binary(OpKind::AddF, x, y);
      let mul = b.binary(OpKind::MulF, x, y);
      let div = b.binary(OpKind::DivF, y, x);
      (add, mul, div)
    });
    assert_eq!(
      fold(&module, op_of(&module, add)),
      Some(Folded::Constant(Attr::Float(3.5)))
    );
    assert_eq!(
      fold(&module, op_of(&module, mul)),
      Some(Folded::Constant(Attr::Float(3.0)))
    );
    assert!(fold(&module, op_of(&module, div)).is_some());
  }

  #[test]
  fn non_constant_operands() {
    let (module, sub) = with_body(|b| {
      let arg = b.module().block(b.insertion_block().unwrap()).args()[0];
      let x = b.load(arg);
      let y = b.const_float(Type::get_real(4), 2.0);
      b.binary(OpKind::SubF, x, y)
    });
    assert_eq!(fold(&module, op_of(&module, sub)), None);
  }

  #[test]
  fn int_wrap() {
    let (module, (add, cmp)) = with_body(|b| {
      let x = b.const_int(Type::get_int(8), 127);
      let y = b.const_int(Type::get_int(8), 1);
      let add = b.binary(OpKind::AddI, x, y);
      let cmp = b.cmpi(CmpIPredicate::Ult, x, y);
      (add, cmp)
    });
    assert_eq!(
      fold(&module, op_of(&module, add)),
      Some(Folded::Constant(Attr::Int(-128)))
    );
    assert_eq!(
      fold(&module, op_of(&module, cmp)),
      Some(Folded::Constant(Attr::Int(0)))
    );
  }

  #[test]
  fn conversions() {
    let (module, (same, round_trip, real, x)) = with_body(|b| {
      let x = b.const_int(Type::get_i32(), 1);
      let same = b.convert(x, Type::get_i32());
      let to_bool = b.convert(x, Type::get_i1());
      let round_trip = b.convert(to_bool, Type::get_i32());
      let real = b.convert(x, Type::get_real(4));
      (same, round_trip, real, x)
    });
    assert_eq!(fold(&module, op_of(&module, same)), Some(Folded::Value(x)));
    assert_eq!(fold(&module, op_of(&module, round_trip)), Some(Folded::Value(x)));
    assert_eq!(fold(&module, op_of(&module, real)), None);
  }

  #[test]
  fn box_round_trip() {
    let (module, (addr, arg)) = with_body(|b| {
      let arg = b.module().block(b.insertion_block().unwrap()).args()[0];
      let boxed = b.embox(arg);
      (b.box_addr(boxed), arg)
    });
    assert_eq!(fold(&module, op_of(&module, addr)), Some(Folded::Value(arg)));
  }
}
