//! Implementations of the visitor for the text form FIR generator.

use crate::back::{self, NameManager};
use crate::ir::{Attr, Block, CmpFPredicate, CmpIPredicate, Module, Op, OpKind, Region, Type, Value};
use std::io::{Result, Write};

/// Visitor for generating the in-memory form FIR into the text form.
///
/// The output can be parsed back by [`Driver`](crate::front::Driver) into
/// a structurally equal module.
#[derive(Default)]
pub struct Visitor;

impl<W: Write> back::Visitor<W> for Visitor {
  type Output = ();

  fn visit(&mut self, w: &mut W, nm: &mut NameManager, module: &Module) -> Result<()> {
    let mut visitor = VisitorImpl {
      w,
      nm,
      module,
      depth: 0,
    };
    visitor.visit()
  }
}

/// The implementation of text form FIR generator.
struct VisitorImpl<'a, W: Write> {
  w: &'a mut W,
  nm: &'a mut NameManager,
  module: &'a Module,
  depth: usize,
}

impl<W: Write> VisitorImpl<'_, W> {
  /// Visits the module.
  fn visit(&mut self) -> Result<()> {
    for (i, op) in self.module.top_ops().iter().enumerate() {
      if i != 0 {
        writeln!(self.w)?;
      }
      self.nm.enter_func_scope();
      self.visit_op(*op)?;
      self.nm.exit_func_scope();
    }
    Ok(())
  }

  /// Generates the given operation in a line, with its regions.
  fn visit_op(&mut self, op: Op) -> Result<()> {
    self.indent()?;
    let data = self.module.op(op);
    if !data.results().is_empty() {
      self.visit_values(data.results())?;
      write!(self.w, " = ")?;
    }
    match data.kind() {
      OpKind::Func => self.visit_func(op)?,
      OpKind::Global => self.visit_global(op)?,
      OpKind::DispatchTable => {
        write!(self.w, "{} @{}", OpKind::DispatchTable, data.sym_name().unwrap_or_default())?;
        self.visit_optional_region(data.regions()[0])?;
      }
      OpKind::Constant => {
        let value = data.attr("value").cloned().unwrap_or(Attr::Unit);
        let ty = self.module.value_type(data.result());
        write!(self.w, "{} {} : {}", OpKind::Constant, value, ty)?;
      }
      kind @ (OpKind::CmpF | OpKind::CmpI) => self.visit_cmp(op, kind)?,
      OpKind::Br => {
        write!(self.w, "br ")?;
        self.visit_successor(op, 0)?;
      }
      OpKind::CondBr => {
        write!(self.w, "cond_br ")?;
        self.visit_value(data.operands()[0])?;
        write!(self.w, ", ")?;
        self.visit_successor(op, 0)?;
        write!(self.w, ", ")?;
        self.visit_successor(op, 1)?;
      }
      kind if kind.is_select() => self.visit_select(op)?,
      kind @ (OpKind::DoLoop | OpKind::IterateWhile) => self.visit_loop(op, kind)?,
      OpKind::If => self.visit_if(op)?,
      _ => self.visit_generic(op)?,
    }
    writeln!(self.w)
  }

  /// Generates the given operation in the generic form.
  fn visit_generic(&mut self, op: Op) -> Result<()> {
    let data = self.module.op(op);
    write!(self.w, "{}(", data.kind())?;
    self.visit_values(data.operands())?;
    write!(self.w, ")")?;
    if !data.attrs().is_empty() {
      write!(self.w, " {{")?;
      for (i, (name, attr)) in data.attrs().iter().enumerate() {
        if i != 0 {
          write!(self.w, ", ")?;
        }
        match attr {
          Attr::Unit => write!(self.w, "{}", name)?,
          attr => write!(self.w, "{} = {}", name, attr)?,
        }
      }
      write!(self.w, "}}")?;
    }
    write!(self.w, " : (")?;
    self.visit_value_types(data.operands())?;
    write!(self.w, ") -> (")?;
    self.visit_value_types(data.results())?;
    write!(self.w, ")")
  }

  /// Generates functions.
  fn visit_func(&mut self, op: Op) -> Result<()> {
    let data = self.module.op(op);
    write!(self.w, "func @{}", data.sym_name().unwrap_or_default())?;
    if let Some(ty) = data.attr("type") {
      write!(self.w, " : {}", ty)?;
    }
    self.visit_optional_region(data.regions()[0])
  }

  /// Generates globals.
  fn visit_global(&mut self, op: Op) -> Result<()> {
    let data = self.module.op(op);
    write!(self.w, "{}", OpKind::Global)?;
    if let Some(linkage) = data.attr("linkage").and_then(Attr::as_str) {
      write!(self.w, " {}", linkage)?;
    }
    write!(self.w, " @{}", data.sym_name().unwrap_or_default())?;
    if let Some(init) = data.attr("init_val") {
      write!(self.w, " ({})", init)?;
    }
    if data.has_flag("constant") {
      write!(self.w, " constant")?;
    }
    if let Some(ty) = data.attr("type") {
      write!(self.w, " : {}", ty)?;
    }
    self.visit_optional_region(data.regions()[0])
  }

  /// Generates comparisons.
  fn visit_cmp(&mut self, op: Op, kind: OpKind) -> Result<()> {
    let data = self.module.op(op);
    let index = data.attr("predicate").and_then(Attr::as_int).unwrap_or(-1);
    let pred = match kind {
      OpKind::CmpF => CmpFPredicate::from_index(index).map(CmpFPredicate::name),
      _ => CmpIPredicate::from_index(index).map(CmpIPredicate::name),
    };
    write!(self.w, "{} \"{}\", ", kind, pred.unwrap_or("invalid"))?;
    self.visit_values(data.operands())?;
    let ty = data
      .operands()
      .first()
      .map_or_else(Type::get_void, |v| self.module.value_type(*v));
    write!(self.w, " : {}", ty)
  }

  /// Generates multi-way branches.
  fn visit_select(&mut self, op: Op) -> Result<()> {
    let parts = self.module.select_parts(op);
    write!(self.w, "{} ", self.module.op(op).kind())?;
    self.visit_value(parts.selector)?;
    write!(self.w, " : {} [", self.module.value_type(parts.selector))?;
    for (i, case) in parts.cases.iter().enumerate() {
      if i != 0 {
        write!(self.w, ", ")?;
      }
      write!(self.w, "{}, ", case)?;
      for value in parts.compare.segment(i) {
        self.visit_value(*value)?;
        write!(self.w, ", ")?;
      }
      self.visit_block_ref(parts.dests[i], parts.targets.segment(i))?;
    }
    write!(self.w, "]")
  }

  /// Generates `do_loop` and `iterate_while`.
  fn visit_loop(&mut self, op: Op, kind: OpKind) -> Result<()> {
    let data = self.module.op(op);
    let parts = self.module.loop_parts(op);
    write!(self.w, "{} ", kind)?;
    self.visit_value(parts.lower)?;
    write!(self.w, " to ")?;
    self.visit_value(parts.upper)?;
    write!(self.w, " step ")?;
    self.visit_value(parts.step)?;
    if let Some(cond) = parts.iterate_in {
      write!(self.w, " and ")?;
      self.visit_value(cond)?;
    }
    if data.has_flag("unordered") {
      write!(self.w, " unordered")?;
    }
    if !parts.inits.is_empty() {
      write!(self.w, " iter_args")?;
      self.visit_operand_group(&parts.inits)?;
    }
    write!(self.w, " ")?;
    self.visit_region(data.regions()[0])
  }

  /// Generates `if`.
  fn visit_if(&mut self, op: Op) -> Result<()> {
    let data = self.module.op(op);
    write!(self.w, "{} ", OpKind::If)?;
    self.visit_value(data.operands()[0])?;
    if !data.results().is_empty() {
      write!(self.w, " -> (")?;
      self.visit_value_types(data.results())?;
      write!(self.w, ")")?;
    }
    write!(self.w, " ")?;
    self.visit_region(data.regions()[0])?;
    if let Some(else_region) = data.regions().get(1) {
      if !self.module.region_blocks(*else_region).is_empty() {
        write!(self.w, " else ")?;
        self.visit_region(*else_region)?;
      }
    }
    Ok(())
  }

  /// Generates the region with a leading space if it is not empty.
  fn visit_optional_region(&mut self, region: Region) -> Result<()> {
    if self.module.region_blocks(region).is_empty() {
      Ok(())
    } else {
      write!(self.w, " ")?;
      self.visit_region(region)
    }
  }

  /// Generates regions, without the trailing new line.
  fn visit_region(&mut self, region: Region) -> Result<()> {
    let blocks = self.module.region_blocks(region);
    self.nm.name_blocks(&blocks);
    writeln!(self.w, "{{")?;
    for block in blocks {
      self.visit_block(block)?;
    }
    self.indent()?;
    write!(self.w, "}}")
  }

  /// Generates blocks with their headers.
  fn visit_block(&mut self, block: Block) -> Result<()> {
    self.indent()?;
    write!(self.w, "{}", self.nm.block_name(block))?;
    let args = self.module.block(block).args();
    if !args.is_empty() {
      write!(self.w, "(")?;
      for (i, arg) in args.iter().enumerate() {
        if i != 0 {
          write!(self.w, ", ")?;
        }
        self.visit_value(*arg)?;
        write!(self.w, ": {}", self.module.value_type(*arg))?;
      }
      write!(self.w, ")")?;
    }
    writeln!(self.w, ":")?;
    self.depth += 1;
    for op in self.module.block_ops(block) {
      self.visit_op(op)?;
    }
    self.depth -= 1;
    Ok(())
  }

  /// Generates the `index`th successor of a branch with its arguments.
  fn visit_successor(&mut self, op: Op, index: usize) -> Result<()> {
    let dest = self.module.op(op).successors()[index];
    let args = self.module.successor_operands(op, index);
    self.visit_block_ref(dest, &args)
  }

  /// Generates block references with arguments, like `^bb1(%0 : i32)`.
  fn visit_block_ref(&mut self, block: Block, args: &[Value]) -> Result<()> {
    write!(self.w, "{}", self.nm.block_name(block))?;
    if args.is_empty() {
      Ok(())
    } else {
      self.visit_operand_group(args)
    }
  }

  /// Generates groups of typed operands, like `(%0, %1 : i32, f32)`.
  fn visit_operand_group(&mut self, values: &[Value]) -> Result<()> {
    write!(self.w, "(")?;
    self.visit_values(values)?;
    write!(self.w, " : ")?;
    self.visit_value_types(values)?;
    write!(self.w, ")")
  }

  /// Generates comma-separated value names.
  fn visit_values(&mut self, values: &[Value]) -> Result<()> {
    for (i, value) in values.iter().enumerate() {
      if i != 0 {
        write!(self.w, ", ")?;
      }
      self.visit_value(*value)?;
    }
    Ok(())
  }

  /// Generates comma-separated types of values.
  fn visit_value_types(&mut self, values: &[Value]) -> Result<()> {
    for (i, value) in values.iter().enumerate() {
      if i != 0 {
        write!(self.w, ", ")?;
      }
      write!(self.w, "{}", self.module.value_type(*value))?;
    }
    Ok(())
  }

  /// Generates the name of the given value.
  fn visit_value(&mut self, value: Value) -> Result<()> {
    write!(self.w, "{}", self.nm.value_name(value))
  }

  /// Generates the indentation of the current depth.
  fn indent(&mut self) -> Result<()> {
    write!(self.w, "{:1$}", "", self.depth * 2)
  }
}
