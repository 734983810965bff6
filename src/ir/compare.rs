//! Structural comparison of operations, possibly of different modules.

use crate::ir::entities::{Block, Op, Value};
use crate::ir::module::Module;
use std::collections::HashMap;

/// Checks if two modules hold structurally equal module level operations
/// in the same order.
pub fn modules_equal(a: &Module, b: &Module) -> bool {
  a.top_ops().len() == b.top_ops().len()
    && a
      .top_ops()
      .iter()
      .zip(b.top_ops())
      .all(|(x, y)| structurally_equal(a, *x, b, *y))
}

/// Checks if two operations are structurally equal: same kinds, operand
/// and result types, attributes, region shapes and nested operations, and
/// operands and successors that refer to corresponding entities.
pub fn structurally_equal(a: &Module, op_a: Op, b: &Module, op_b: Op) -> bool {
  let mut cmp = Comparer {
    a,
    b,
    ops: Vec::new(),
    values: HashMap::new(),
    blocks: HashMap::new(),
  };
  cmp.match_shape(op_a, op_b) && cmp.match_uses()
}

struct Comparer<'a> {
  a: &'a Module,
  b: &'a Module,
  ops: Vec<(Op, Op)>,
  values: HashMap<Value, Value>,
  blocks: HashMap<Block, Block>,
}

impl Comparer<'_> {
  /// Matches everything that defines entities, and records the
  /// correspondence of results, blocks and block arguments.
  fn match_shape(&mut self, x: Op, y: Op) -> bool {
    let (a, b) = (self.a, self.b);
    let (dx, dy) = (a.op(x), b.op(y));
    if dx.kind() != dy.kind()
      || dx.attrs() != dy.attrs()
      || dx.results().len() != dy.results().len()
      || dx.regions().len() != dy.regions().len()
      || dx.operands().len() != dy.operands().len()
      || dx.successors().len() != dy.successors().len()
    {
      return false;
    }
    for (rx, ry) in dx.results().iter().zip(dy.results()) {
      if a.value_type(*rx) != b.value_type(*ry) {
        return false;
      }
      self.values.insert(*rx, *ry);
    }
    self.ops.push((x, y));
    for (rx, ry) in dx.regions().iter().zip(dy.regions()) {
      let (bx, by) = (a.region_blocks(*rx), b.region_blocks(*ry));
      if bx.len() != by.len() {
        return false;
      }
      for (bx, by) in bx.into_iter().zip(by) {
        if !self.match_block(bx, by) {
          return false;
        }
      }
    }
    true
  }

  fn match_block(&mut self, x: Block, y: Block) -> bool {
    let (a, b) = (self.a, self.b);
    let (ax, ay) = (a.block(x).args(), b.block(y).args());
    if ax.len() != ay.len() {
      return false;
    }
    for (vx, vy) in ax.iter().zip(ay) {
      if a.value_type(*vx) != b.value_type(*vy) {
        return false;
      }
      self.values.insert(*vx, *vy);
    }
    self.blocks.insert(x, y);
    let (ox, oy) = (a.block_ops(x), b.block_ops(y));
    ox.len() == oy.len() && ox.into_iter().zip(oy).all(|(x, y)| self.match_shape(x, y))
  }

  /// Checks that operands and successors refer to corresponding entities.
  /// Values defined outside of the compared operations must be the same
  /// value.
  fn match_uses(&self) -> bool {
    self.ops.iter().all(|(x, y)| {
      let (dx, dy) = (self.a.op(*x), self.b.op(*y));
      let operands = dx.operands().iter().zip(dy.operands()).all(|(vx, vy)| {
        self.a.value_type(*vx) == self.b.value_type(*vy)
          && self.values.get(vx).map_or(vx == vy, |v| v == vy)
      });
      let successors = dx
        .successors()
        .iter()
        .zip(dy.successors())
        .all(|(bx, by)| self.blocks.get(bx) == Some(by));
      operands && successors
    })
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::ir::builder::OpBuilder;
  use crate::ir::ops::OpKind;
  use crate::ir::types::Type;

  fn build(module: &mut Module, swap: bool) {
    let mut b = OpBuilder::new(module);
    let f = b.func("cmp", Type::get_function(vec![Type::get_i32()], vec![Type::get_i32()]));
    let entry = b.func_body(f);
    b.with_insertion_point(entry, |b| {
      let arg = b.module().block(entry).args()[0];
      let one = b.const_int(Type::get_i32(), 1);
      let sum = if swap {
        b.binary(OpKind::AddI, one, arg)
      } else {
        b.binary(OpKind::AddI, arg, one)
      };
      b.ret(vec![sum]);
    });
  }

  #[test]
  fn equal_modules() {
    let (mut m1, mut m2, mut m3) = (Module::new(), Module::new(), Module::new());
    build(&mut m1, false);
    build(&mut m2, false);
    build(&mut m3, true);
    assert!(modules_equal(&m1, &m2));
    assert!(!modules_equal(&m1, &m3));
    assert!(!modules_equal(&m1, &Module::new()));
  }
}
