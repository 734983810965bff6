//! Accessors of the operand partitions of branches and loops.

use crate::ir::attrs::Attr;
use crate::ir::entities::{Block, Op, Value};
use crate::ir::module::Module;
use crate::ir::ops::OpKind;
use crate::ir::segments::SegmentedList;

/// Operands of a multi-way branch, partitioned by its offset attributes.
pub struct SelectParts {
  pub selector: Value,
  pub cases: Vec<Attr>,
  pub compare: SegmentedList<Value>,
  pub targets: SegmentedList<Value>,
  pub dests: Vec<Block>,
}

/// Operands and entry block arguments of a structured loop.
pub struct LoopParts {
  pub lower: Value,
  pub upper: Value,
  pub step: Value,
  /// Initial condition, only for `iterate_while`.
  pub iterate_in: Option<Value>,
  pub inits: Vec<Value>,
  pub body: Option<Block>,
  /// Block arguments of the body, starting with the induction variable.
  pub args: Vec<Value>,
}

impl LoopParts {
  /// Returns the number of leading block arguments that are not carried
  /// values.
  pub fn leading_args(&self) -> usize {
    if self.iterate_in.is_some() {
      2
    } else {
      1
    }
  }

  /// Returns the block arguments for the carried values.
  pub fn carried_args(&self) -> &[Value] {
    self.args.get(self.leading_args()..).unwrap_or(&[])
  }
}

fn offsets(module: &Module, op: Op, name: &str) -> Result<Vec<usize>, String> {
  let attr = module
    .op(op)
    .attr(name)
    .and_then(Attr::as_int_vec)
    .ok_or_else(|| format!("expected `{}` attribute", name))?;
  attr
    .iter()
    .map(|n| usize::try_from(*n).map_err(|_| format!("negative offset in `{}`", name)))
    .collect()
}

impl Module {
  /// Partitions the operands of a multi-way branch, returns a message if
  /// its attributes do not describe its operands.
  pub fn try_select_parts(&self, op: Op) -> Result<SelectParts, String> {
    let data = self.op(op);
    assert!(data.kind().is_select(), "`op` is not a multi-way branch");
    let (selector, rest) = data
      .operands()
      .split_first()
      .ok_or("expected a selector operand")?;
    let cases = data
      .attr("cases")
      .and_then(Attr::as_array)
      .ok_or("expected `cases` attribute")?
      .to_vec();
    if cases.len() != data.successors().len() {
      return Err(format!(
        "{} cases for {} successors",
        cases.len(),
        data.successors().len()
      ));
    }
    let compare_sizes = offsets(self, op, "compare_operand_offsets")?;
    let target_sizes = offsets(self, op, "target_operand_offsets")?;
    if compare_sizes.len() != cases.len() || target_sizes.len() != cases.len() {
      return Err("offset attributes must have one entry per case".into());
    }
    let num_compare: usize = compare_sizes.iter().sum();
    if num_compare > rest.len() {
      return Err(format!(
        "compare offsets cover {} operands, but only {} are present",
        num_compare,
        rest.len()
      ));
    }
    let (compare, targets) = rest.split_at(num_compare);
    let compare = SegmentedList::new(compare.to_vec(), compare_sizes).map_err(|e| e.to_string())?;
    let targets = SegmentedList::new(targets.to_vec(), target_sizes)
      .map_err(|e| format!("target operand offsets: {}", e))?;
    Ok(SelectParts {
      selector: *selector,
      cases,
      compare,
      targets,
      dests: data.successors().to_vec(),
    })
  }

  /// Partitions the operands of a multi-way branch.
  ///
  /// # Panics
  ///
  /// Panics if the operation is not a multi-way branch, or its offsets do
  /// not match its operands.
  pub fn select_parts(&self, op: Op) -> SelectParts {
    match self.try_select_parts(op) {
      Ok(parts) => parts,
      Err(e) => panic!("malformed multi-way branch: {}", e),
    }
  }

  /// Returns the arguments passed to the `index`th successor of a branch.
  ///
  /// # Panics
  ///
  /// Panics if the operation is not a branch, or the index is out of
  /// range.
  pub fn successor_operands(&self, op: Op, index: usize) -> Vec<Value> {
    let data = self.op(op);
    match data.kind() {
      OpKind::Br => {
        assert!(index == 0, "`br` has only one successor");
        data.operands().to_vec()
      }
      OpKind::CondBr => {
        let sizes = offsets(self, op, "target_operand_offsets").unwrap_or_default();
        let targets = SegmentedList::new(data.operands()[1..].to_vec(), sizes)
          .expect("malformed `cond_br` offsets");
        targets.segment(index).to_vec()
      }
      kind if kind.is_select() => self.select_parts(op).targets.segment(index).to_vec(),
      kind => panic!("`{}` is not a branch", kind),
    }
  }

  /// Returns the compare operands of the `index`th case of a multi-way
  /// branch.
  pub fn compare_operands(&self, op: Op, index: usize) -> Vec<Value> {
    self.select_parts(op).compare.segment(index).to_vec()
  }

  /// Partitions the operands of a `do_loop` or `iterate_while`.
  ///
  /// # Panics
  ///
  /// Panics if the operation is not a loop or lacks its bounds.
  pub fn loop_parts(&self, op: Op) -> LoopParts {
    let data = self.op(op);
    let fixed = match data.kind() {
      OpKind::DoLoop => 3,
      OpKind::IterateWhile => 4,
      kind => panic!("`{}` is not a loop", kind),
    };
    let ops = data.operands();
    assert!(ops.len() >= fixed, "loop bounds are missing");
    let body = data
      .regions()
      .first()
      .and_then(|r| self.region(*r).entry());
    LoopParts {
      lower: ops[0],
      upper: ops[1],
      step: ops[2],
      iterate_in: (fixed == 4).then(|| ops[3]),
      inits: ops[fixed..].to_vec(),
      body,
      args: body.map_or_else(Vec::new, |b| self.block(b).args().to_vec()),
    }
  }

  /// Returns the entry block of the `index`th region of an operation.
  pub fn region_entry(&self, op: Op, index: usize) -> Option<Block> {
    let region = *self.op(op).regions().get(index)?;
    self.region(region).entry()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::ir::attrs::CaseTag;
  use crate::ir::builder::{Case, OpBuilder};
  use crate::ir::types::Type;

  #[test]
  fn select_accessors() {
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let f = b.func("sel", Type::get_function(vec![], vec![]));
    let entry = b.func_body(f);
    let region = b.module().block(entry).region();
    let bb1 = b.module_mut().new_block(region, vec![Type::get_i32(), Type::get_i32()]);
    let bb2 = b.module_mut().new_block(region, vec![]);
    let (op, lo, hi, sel) = b.with_insertion_point(entry, |b| {
      let sel = b.const_int(Type::get_i32(), 4);
      let lo = b.const_int(Type::get_i32(), 1);
      let hi = b.const_int(Type::get_i32(), 9);
      let cases = vec![
        Case::with_operands(CaseTag::Point, vec![lo], bb2, vec![]),
        Case::with_operands(CaseTag::ClosedInterval, vec![lo, hi], bb1, vec![sel, hi]),
        Case::otherwise(bb2, vec![]),
      ];
      (b.select(OpKind::SelectCase, sel, cases), lo, hi, sel)
    });
    assert_eq!(module.compare_operands(op, 0), vec![lo]);
    assert_eq!(module.compare_operands(op, 1), vec![lo, hi]);
    assert!(module.compare_operands(op, 2).is_empty());
    assert_eq!(module.successor_operands(op, 1), vec![sel, hi]);
    assert!(module.successor_operands(op, 2).is_empty());
  }

  #[test]
  fn malformed_offsets() {
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let f = b.func("bad", Type::get_function(vec![], vec![]));
    let entry = b.func_body(f);
    let region = b.module().block(entry).region();
    let bb = b.module_mut().new_block(region, vec![]);
    let op = b.with_insertion_point(entry, |b| {
      let sel = b.const_int(Type::get_i32(), 0);
      b.select(OpKind::Select, sel, vec![Case::new(Attr::Int(1), bb, vec![sel])])
    });
    module.set_attr(op, "target_operand_offsets", Attr::IntVec(vec![2]));
    assert!(module.try_select_parts(op).is_err());
  }
}
