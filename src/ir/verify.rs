//! Verifier of FIR operations.
//!
//! [`verify`] checks every operation of a module and stops at the first
//! failure. Builders never check their inputs, so every invariant of an
//! operation kind is checked here.

use crate::front::span::{self, Span};
use crate::ir::access::LoopParts;
use crate::ir::attrs::Attr;
use crate::ir::entities::{Block, Op, Value, ValueDef};
use crate::ir::module::Module;
use crate::ir::ops::{CmpFPredicate, CmpIPredicate, Linkage, OpKind};
use crate::ir::types::{Type, TypeFamily, TypeKind};
use std::collections::HashSet;
use std::{error, fmt};

/// Error returned by the verifier.
#[derive(Debug, Clone)]
pub struct VerifyError {
  pub op: Op,
  pub span: Option<Span>,
  pub message: String,
}

impl VerifyError {
  /// Logs the error through the span logger.
  pub fn log(&self) -> span::Error {
    let message = self.to_string();
    let result: std::result::Result<(), span::Error> = match &self.span {
      Some(span) => span.log_error(&message),
      None => Span::log_raw_error(&message),
    };
    match result {
      Err(e) => e,
      Ok(()) => unreachable!(),
    }
  }
}

impl fmt::Display for VerifyError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(&self.message)
  }
}

impl error::Error for VerifyError {}

/// Result of verification.
pub type Result<T = ()> = std::result::Result<T, VerifyError>;

/// Fails with a formatted message if the condition does not hold.
macro_rules! ensure {
  ($v:expr, $op:expr, $cond:expr, $($arg:tt)+) => {
    if !$cond {
      return Err($v.error($op, format!($($arg)+)));
    }
  };
}

/// Verifies all operations of the given module.
pub fn verify(module: &Module) -> Result {
  let verifier = Verifier { module };
  let mut symbols = HashSet::new();
  for op in module.top_ops() {
    if let Some(name) = module.op(*op).sym_name() {
      ensure!(verifier, *op, symbols.insert(name), "redefinition of symbol `@{}`", name);
    }
  }
  for op in module.walk() {
    verifier.verify_op(op)?;
  }
  Ok(())
}

/// Verifies a single operation, without its nested operations.
pub fn verify_op(module: &Module, op: Op) -> Result {
  Verifier { module }.verify_op(op)
}

struct Verifier<'a> {
  module: &'a Module,
}

impl Verifier<'_> {
  fn error(&self, op: Op, message: String) -> VerifyError {
    let kind = self.module.op(op).kind();
    VerifyError {
      op,
      span: self.module.op(op).span(),
      message: format!("'{}' op {}", kind, message),
    }
  }

  fn ty(&self, value: Value) -> Type {
    self.module.value_type(value)
  }

  fn verify_op(&self, op: Op) -> Result {
    let data = self.module.op(op);
    for v in data.operands() {
      ensure!(
        self,
        op,
        self.module.value(*v).def() != ValueDef::Placeholder,
        "uses an undefined value"
      );
    }
    self.verify_placement(op)?;
    match data.kind() {
      OpKind::Constant => self.verify_constant(op),
      OpKind::Undefined => self.verify_counts(op, 0, 1),
      OpKind::Alloca | OpKind::AllocMem => self.verify_alloc(op),
      OpKind::FreeMem => {
        self.verify_counts(op, 1, 0)?;
        let ty = self.ty(data.operands()[0]);
        ensure!(
          self,
          op,
          matches!(ty.kind(), TypeKind::Heap(_)),
          "expects a heap reference, found `{}`",
          ty,
        );
        Ok(())
      }
      OpKind::Load => {
        self.verify_counts(op, 1, 1)?;
        let ty = self.ty(data.operands()[0]);
        ensure!(self, op, ty.is_ref_like(), "expects a reference, found `{}`", ty);
        let result = self.ty(data.result());
        ensure!(
          self,
          op,
          ty.element_type() == Some(&result),
          "result type `{}` does not match `{}`",
          result,
          ty,
        );
        Ok(())
      }
      OpKind::Store => {
        self.verify_counts(op, 2, 0)?;
        let (value, memref) = (self.ty(data.operands()[0]), self.ty(data.operands()[1]));
        ensure!(self, op, memref.is_ref_like(), "expects a reference, found `{}`", memref);
        ensure!(
          self,
          op,
          memref.element_type() == Some(&value),
          "cannot store `{}` into `{}`",
          value,
          memref,
        );
        Ok(())
      }
      OpKind::Convert => self.verify_counts(op, 1, 1),
      kind if kind.is_float_binary() || kind.is_int_binary() => self.verify_binary(op),
      OpKind::CmpF | OpKind::CmpI => self.verify_cmp(op),
      OpKind::Call => self.verify_call(op),
      OpKind::Embox => {
        self.verify_counts(op, 1, 1)?;
        let ty = self.ty(data.operands()[0]);
        ensure!(self, op, ty.is_ref_like(), "expects a reference, found `{}`", ty);
        let result = self.ty(data.result());
        ensure!(
          self,
          op,
          matches!(result.kind(), TypeKind::Box(_)) && result.element_type() == ty.element_type(),
          "result type `{}` does not box `{}`",
          result,
          ty,
        );
        Ok(())
      }
      OpKind::BoxAddr => {
        self.verify_counts(op, 1, 1)?;
        let ty = self.ty(data.operands()[0]);
        ensure!(self, op, matches!(ty.kind(), TypeKind::Box(_)), "expects a box, found `{}`", ty);
        let result = self.ty(data.result());
        ensure!(self, op, result.is_ref_like(), "result must be a reference, found `{}`", result);
        Ok(())
      }
      OpKind::GenTypeDesc => {
        self.verify_counts(op, 0, 1)?;
        let in_type = self.type_attr(op, "in_type")?;
        let result = self.ty(data.result());
        ensure!(
          self,
          op,
          result == Type::get_tdesc(in_type.clone()),
          "result type must be `{}`",
          Type::get_tdesc(in_type),
        );
        Ok(())
      }
      OpKind::AddressOf => self.verify_address_of(op),
      OpKind::If => self.verify_if(op),
      OpKind::DoLoop | OpKind::IterateWhile => self.verify_loop(op),
      OpKind::Result => self.verify_result(op),
      kind if kind.is_select() => self.verify_select(op),
      OpKind::Br => {
        ensure!(self, op, data.successors().len() == 1, "expects one successor");
        self.verify_successor_args(op, data.successors()[0], data.operands())
      }
      OpKind::CondBr => self.verify_cond_br(op),
      OpKind::Return => self.verify_return(op),
      OpKind::Unreachable => self.verify_counts(op, 0, 0),
      OpKind::Func => self.verify_func(op),
      OpKind::Global => self.verify_global(op),
      OpKind::HasValue => {
        self.verify_counts(op, 1, 0)?;
        let parent = self.module.parent_op(op);
        ensure!(
          self,
          op,
          parent.map(|p| self.module.op(p).kind()) == Some(OpKind::Global),
          "must be in the initializer of a global",
        );
        Ok(())
      }
      OpKind::DispatchTable => self.verify_dispatch_table(op),
      OpKind::DtEntry => {
        ensure!(
          self,
          op,
          data.attr("method").and_then(Attr::as_str).is_some(),
          "expects a `method` name",
        );
        ensure!(
          self,
          op,
          data.attr("proc").and_then(Attr::as_symbol).is_some(),
          "expects a `proc` symbol",
        );
        let parent = self.module.parent_op(op);
        ensure!(
          self,
          op,
          parent.map(|p| self.module.op(p).kind()) == Some(OpKind::DispatchTable),
          "must be in a dispatch table",
        );
        Ok(())
      }
      kind => unreachable!("unhandled operation kind `{}`", kind),
    }
  }

  /// Checks that terminators end their blocks, and that module level
  /// operations are symbols.
  fn verify_placement(&self, op: Op) -> Result {
    let kind = self.module.op(op).kind();
    match self.module.parent_block(op) {
      Some(block) => {
        ensure!(self, op, !kind.is_symbol(), "must be at module level");
        if kind.is_terminator() {
          ensure!(
            self,
            op,
            self.module.terminator(block) == Some(op),
            "must be the last operation of its block",
          );
        }
      }
      None => ensure!(self, op, kind.is_symbol(), "must be nested in a region"),
    }
    Ok(())
  }

  fn verify_counts(&self, op: Op, operands: usize, results: usize) -> Result {
    let data = self.module.op(op);
    ensure!(
      self,
      op,
      data.operands().len() == operands,
      "expects {} operands, found {}",
      operands,
      data.operands().len(),
    );
    ensure!(
      self,
      op,
      data.results().len() == results,
      "expects {} results, found {}",
      results,
      data.results().len(),
    );
    Ok(())
  }

  fn type_attr(&self, op: Op, name: &str) -> Result<Type> {
    match self.module.op(op).attr(name).and_then(Attr::as_type) {
      Some(ty) => Ok(ty.clone()),
      None => Err(self.error(op, format!("expects a `{}` type attribute", name))),
    }
  }

  /// Checks that every block of every region ends with a terminator.
  fn verify_terminated(&self, op: Op) -> Result {
    for region in self.module.op(op).regions() {
      for block in self.module.region_blocks(*region) {
        ensure!(
          self,
          op,
          self.module.terminator(block).is_some(),
          "has a block that does not end with a terminator",
        );
      }
    }
    Ok(())
  }

  fn verify_constant(&self, op: Op) -> Result {
    self.verify_counts(op, 0, 1)?;
    let data = self.module.op(op);
    let ty = self.ty(data.result());
    let ok = match (data.attr("value"), ty.kind()) {
      (Some(Attr::Int(_)), TypeKind::Integer(_) | TypeKind::Index | TypeKind::Logical(_)) => true,
      (Some(Attr::Bool(_)), TypeKind::Logical(_) | TypeKind::Integer(1)) => true,
      (Some(Attr::Float(_)), TypeKind::Real(_)) => true,
      (Some(_), _) => false,
      (None, _) => return Err(self.error(op, "expects a `value` attribute".into())),
    };
    ensure!(self, op, ok, "value does not match the result type `{}`", ty);
    Ok(())
  }

  fn verify_alloc(&self, op: Op) -> Result {
    let data = self.module.op(op);
    ensure!(self, op, data.results().len() == 1, "expects one result");
    let in_type = self.type_attr(op, "in_type")?;
    let sizes = data
      .attr("operand_segment_sizes")
      .and_then(Attr::as_int_vec)
      .filter(|s| s.len() == 2 && s.iter().all(|n| *n >= 0))
      .ok_or_else(|| self.error(op, "expects `operand_segment_sizes` of two entries".into()))?;
    let (len_params, shape) = (sizes[0] as usize, sizes[1] as usize);
    ensure!(
      self,
      op,
      len_params + shape == data.operands().len(),
      "operand segments cover {} operands, found {}",
      len_params + shape,
      data.operands().len(),
    );
    for v in &data.operands()[len_params..] {
      let ty = self.ty(*v);
      ensure!(
        self,
        op,
        ty.is_compatible(TypeFamily::IntegerLike),
        "extent operands must be integers, found `{}`",
        ty,
      );
    }
    let invalid = match data.kind() {
      OpKind::Alloca => matches!(in_type.kind(), TypeKind::Ref(_)),
      _ => in_type.is_ref_like() || matches!(in_type.kind(), TypeKind::Function(..)),
    };
    ensure!(self, op, !invalid, "cannot allocate `{}`", in_type);
    if let Err(e) = in_type.check_record() {
      return Err(self.error(op, e));
    }
    ensure!(
      self,
      op,
      !in_type.len_params_mismatch(len_params),
      "expects {} length parameters for `{}`",
      in_type.record_body().map_or(0, |b| b.len_params),
      in_type,
    );
    ensure!(
      self,
      op,
      !in_type.is_incomplete(shape),
      "type `{}` is incomplete with {} dynamic extents",
      in_type,
      shape,
    );
    let expected = match data.kind() {
      OpKind::Alloca => Type::get_ref(in_type),
      _ => Type::get_heap(in_type),
    };
    let result = self.ty(data.result());
    ensure!(self, op, result == expected, "result type must be `{}`, found `{}`", expected, result);
    Ok(())
  }

  fn verify_binary(&self, op: Op) -> Result {
    self.verify_counts(op, 2, 1)?;
    let data = self.module.op(op);
    let (lhs, rhs) = (self.ty(data.operands()[0]), self.ty(data.operands()[1]));
    let result = self.ty(data.result());
    ensure!(self, op, lhs == rhs && lhs == result, "operand and result types must be equal");
    let ok = if data.kind().is_float_binary() {
      lhs.is_compatible(TypeFamily::FloatLike) || lhs.is_compatible(TypeFamily::ComplexLike)
    } else {
      lhs.is_compatible(TypeFamily::IntegerLike)
    };
    ensure!(self, op, ok, "invalid operand type `{}`", lhs);
    Ok(())
  }

  fn verify_cmp(&self, op: Op) -> Result {
    self.verify_counts(op, 2, 1)?;
    let data = self.module.op(op);
    let (lhs, rhs) = (self.ty(data.operands()[0]), self.ty(data.operands()[1]));
    ensure!(self, op, lhs == rhs, "operand types must be equal");
    ensure!(self, op, self.ty(data.result()).is_i1(), "result must be `i1`");
    let pred = data.attr("predicate").and_then(Attr::as_int);
    let (valid, family) = match data.kind() {
      OpKind::CmpF => (pred.and_then(CmpFPredicate::from_index).is_some(), TypeFamily::FloatLike),
      _ => (pred.and_then(CmpIPredicate::from_index).is_some(), TypeFamily::IntegerLike),
    };
    ensure!(self, op, valid, "expects a valid `predicate` attribute");
    ensure!(self, op, lhs.is_compatible(family), "invalid operand type `{}`", lhs);
    Ok(())
  }

  fn verify_call(&self, op: Op) -> Result {
    let data = self.module.op(op);
    let callee = match data.attr("callee").and_then(Attr::as_symbol) {
      Some(callee) => callee,
      None => return Err(self.error(op, "expects a `callee` symbol".into())),
    };
    let func = match self.module.lookup_symbol(callee) {
      Some(func) if self.module.op(func).kind() == OpKind::Func => func,
      // calls of external functions are not checked
      _ => return Ok(()),
    };
    let ty = self.type_attr(func, "type")?;
    let (params, results) = ty.function_sig().unwrap_or((&[][..], &[][..]));
    let args: Vec<_> = data.operands().iter().map(|v| self.ty(*v)).collect();
    let rets: Vec<_> = data.results().iter().map(|v| self.ty(*v)).collect();
    ensure!(self, op, args == params, "arguments do not match the signature of `@{}`", callee);
    ensure!(self, op, rets == results, "results do not match the signature of `@{}`", callee);
    Ok(())
  }

  fn verify_address_of(&self, op: Op) -> Result {
    self.verify_counts(op, 0, 1)?;
    let data = self.module.op(op);
    let symbol = match data.attr("symbol").and_then(Attr::as_symbol) {
      Some(symbol) => symbol,
      None => return Err(self.error(op, "expects a `symbol` attribute".into())),
    };
    let result = self.ty(data.result());
    ensure!(self, op, result.is_ref_like(), "result must be a reference");
    if let Some(global) = self.module.lookup_symbol(symbol) {
      let ty = self.type_attr(global, "type")?;
      ensure!(
        self,
        op,
        result.element_type() == Some(&ty),
        "result type `{}` does not match global `@{}` of type `{}`",
        result,
        symbol,
        ty,
      );
    }
    Ok(())
  }

  fn verify_if(&self, op: Op) -> Result {
    let data = self.module.op(op);
    ensure!(
      self,
      op,
      data.operands().len() == 1 && self.ty(data.operands()[0]).is_i1(),
      "expects an `i1` condition",
    );
    ensure!(self, op, data.regions().len() == 2, "expects then and else regions");
    let then_blocks = self.module.region_blocks(data.regions()[0]);
    let else_blocks = self.module.region_blocks(data.regions()[1]);
    ensure!(self, op, then_blocks.len() == 1, "then region must have exactly one block");
    ensure!(self, op, else_blocks.len() <= 1, "else region must have at most one block");
    ensure!(
      self,
      op,
      data.results().is_empty() || !else_blocks.is_empty(),
      "must have an else region when defining values",
    );
    for block in then_blocks.iter().chain(&else_blocks) {
      ensure!(
        self,
        op,
        self.module.block(*block).args().is_empty(),
        "region blocks take no arguments",
      );
    }
    self.verify_terminated(op)
  }

  fn verify_loop(&self, op: Op) -> Result {
    let data = self.module.op(op);
    let fixed = if data.kind() == OpKind::DoLoop { 3 } else { 4 };
    ensure!(
      self,
      op,
      data.operands().len() >= fixed,
      "expects lower bound, upper bound and step operands",
    );
    ensure!(self, op, data.regions().len() == 1, "expects one region");
    let blocks = self.module.region_blocks(data.regions()[0]);
    ensure!(self, op, blocks.len() == 1, "body must have exactly one block");
    let parts: LoopParts = self.module.loop_parts(op);
    for bound in [parts.lower, parts.upper, parts.step] {
      let ty = self.ty(bound);
      ensure!(
        self,
        op,
        ty.is_compatible(TypeFamily::IntegerLike),
        "loop bounds must be integers, found `{}`",
        ty,
      );
    }
    ensure!(
      self,
      op,
      parts.args.first().map_or(false, |iv| self.ty(*iv).is_index()),
      "induction variable must be of type `index`",
    );
    let results = data.results();
    let carried_results = match parts.iterate_in {
      Some(ok) => {
        ensure!(self, op, self.ty(ok).is_i1(), "initial condition must be `i1`");
        ensure!(
          self,
          op,
          parts.args.get(1).map_or(false, |a| self.ty(*a).is_i1()),
          "second block argument must be `i1`",
        );
        ensure!(
          self,
          op,
          results.first().map_or(false, |r| self.ty(*r).is_i1()),
          "first result must be `i1`",
        );
        &results[1..]
      }
      None => results,
    };
    let carried_args = parts.carried_args();
    ensure!(
      self,
      op,
      carried_results.len() == parts.inits.len() && parts.inits.len() == carried_args.len(),
      "mismatch in number of loop-carried values and defined values"
    );
    for ((r, init), arg) in carried_results.iter().zip(&parts.inits).zip(carried_args) {
      let (r, init, arg) = (self.ty(*r), self.ty(*init), self.ty(*arg));
      ensure!(
        self,
        op,
        r == init && init == arg,
        "types mismatch between iteration operands, block arguments and results",
      );
    }
    self.verify_terminated(op)
  }

  fn verify_result(&self, op: Op) -> Result {
    let parent = match self.module.parent_op(op) {
      Some(parent) => parent,
      None => return Err(self.error(op, "must be nested in a region".into())),
    };
    let parent_data = self.module.op(parent);
    ensure!(
      self,
      op,
      matches!(parent_data.kind(), OpKind::If | OpKind::DoLoop | OpKind::IterateWhile),
      "parent must be `fir.if`, `fir.do_loop` or `fir.iterate_while`",
    );
    let operands: Vec<_> = self.module.op(op).operands().iter().map(|v| self.ty(*v)).collect();
    let results: Vec<_> = parent_data.results().iter().map(|v| self.ty(*v)).collect();
    ensure!(
      self,
      op,
      operands.len() == results.len(),
      "parent expects {} values, found {}",
      results.len(),
      operands.len(),
    );
    ensure!(self, op, operands == results, "types do not match the results of the parent");
    Ok(())
  }

  fn verify_select(&self, op: Op) -> Result {
    let kind = self.module.op(op).kind();
    let parts = self.module.try_select_parts(op).map_err(|e| self.error(op, e))?;
    let selector = self.ty(parts.selector);
    match kind {
      OpKind::Select | OpKind::SelectRank => {
        ensure!(
          self,
          op,
          selector.is_compatible(TypeFamily::IntegerLike),
          "selector must be an integer",
        );
        ensure!(
          self,
          op,
          parts.cases.iter().all(|c| matches!(c, Attr::Int(_) | Attr::Unit)),
          "cases must be integers or `unit`",
        );
      }
      OpKind::SelectType => {
        ensure!(self, op, matches!(selector.kind(), TypeKind::Box(_)), "selector must be a box");
        ensure!(
          self,
          op,
          parts.cases.iter().all(|c| matches!(c, Attr::Type(_) | Attr::Unit)),
          "cases must be types or `unit`",
        );
      }
      _ => {
        ensure!(self, op, parts.cases.iter().all(Attr::is_valid_case), "invalid case attribute");
        for (case, compare) in parts.cases.iter().zip(parts.compare.iter()) {
          ensure!(
            self,
            op,
            case.case_operand_count() == compare.len(),
            "case `{}` expects {} compare operands, found {}",
            case,
            case.case_operand_count(),
            compare.len(),
          );
        }
      }
    }
    if kind != OpKind::SelectCase {
      ensure!(self, op, parts.compare.items().is_empty(), "takes no compare operands");
    }
    let defaults = parts.cases.iter().filter(|c| **c == Attr::Unit).count();
    ensure!(self, op, defaults <= 1, "has more than one default case");
    for (dest, args) in parts.dests.iter().zip(parts.targets.iter()) {
      self.verify_successor_args(op, *dest, args)?;
    }
    Ok(())
  }

  fn verify_cond_br(&self, op: Op) -> Result {
    let data = self.module.op(op);
    ensure!(self, op, data.successors().len() == 2, "expects two successors");
    ensure!(
      self,
      op,
      data.operands().first().map_or(false, |c| self.ty(*c).is_i1()),
      "expects an `i1` condition",
    );
    let sizes = data.attr("target_operand_offsets").and_then(Attr::as_int_vec);
    let covered = sizes.map_or(-1, |s| if s.len() == 2 { s.iter().sum() } else { -1 });
    ensure!(
      self,
      op,
      covered == data.operands().len() as i64 - 1,
      "target operand offsets do not match the operands",
    );
    for (i, dest) in data.successors().iter().enumerate() {
      self.verify_successor_args(op, *dest, &self.module.successor_operands(op, i))?;
    }
    Ok(())
  }

  fn verify_successor_args(&self, op: Op, dest: Block, args: &[Value]) -> Result {
    let region = self.module.parent_block(op).map(|b| self.module.block(b).region());
    ensure!(
      self,
      op,
      region == Some(self.module.block(dest).region()),
      "branches to a block of another region",
    );
    ensure!(self, op, self.module.is_block_placed(dest), "branches to an undefined block");
    let params: Vec<_> = self.module.block(dest).args().iter().map(|v| self.ty(*v)).collect();
    let args: Vec<_> = args.iter().map(|v| self.ty(*v)).collect();
    ensure!(self, op, params == args, "successor arguments do not match the block arguments");
    Ok(())
  }

  fn verify_return(&self, op: Op) -> Result {
    let func = self.module.parent_op(op);
    let func = match func.filter(|f| self.module.op(*f).kind() == OpKind::Func) {
      Some(func) => func,
      None => return Err(self.error(op, "must be in a function body".into())),
    };
    let ty = self.type_attr(func, "type")?;
    let expected = ty.function_sig().map_or(&[][..], |(_, results)| results);
    let values: Vec<_> = self.module.op(op).operands().iter().map(|v| self.ty(*v)).collect();
    ensure!(self, op, values == expected, "returned values do not match the function results");
    Ok(())
  }

  fn verify_func(&self, op: Op) -> Result {
    let data = self.module.op(op);
    ensure!(self, op, data.sym_name().is_some(), "expects a `sym_name` attribute");
    let ty = self.type_attr(op, "type")?;
    let params = match ty.function_sig() {
      Some((params, _)) => params,
      None => return Err(self.error(op, format!("type `{}` is not a function type", ty))),
    };
    if let Some(entry) = self.module.region_entry(op, 0) {
      let args: Vec<_> = self.module.block(entry).args().iter().map(|v| self.ty(*v)).collect();
      ensure!(self, op, args == params, "entry block arguments do not match the parameters");
    }
    self.verify_terminated(op)
  }

  fn verify_global(&self, op: Op) -> Result {
    let data = self.module.op(op);
    ensure!(self, op, data.sym_name().is_some(), "expects a `sym_name` attribute");
    let ty = self.type_attr(op, "type")?;
    if let Err(e) = ty.check_record() {
      return Err(self.error(op, e));
    }
    if let Some(linkage) = data.attr("linkage") {
      let valid = linkage.as_str().and_then(Linkage::from_name).is_some();
      ensure!(self, op, valid, "invalid linkage `{}`", linkage);
    }
    let blocks = self.module.region_blocks(data.regions()[0]);
    if let Some(block) = blocks.first() {
      ensure!(
        self,
        op,
        data.attr("init_val").is_none(),
        "has both an initial value and an initializer region",
      );
      let term = self.module.terminator(*block).map(|t| self.module.op(t));
      let value = term.filter(|t| t.kind() == OpKind::HasValue).map(|t| t.operands());
      match value {
        Some([v]) => ensure!(
          self,
          op,
          self.ty(*v) == ty,
          "initial value of type `{}` does not match `{}`",
          self.ty(*v),
          ty,
        ),
        _ => return Err(self.error(op, "initializer region must end with `fir.has_value`".into())),
      }
    }
    Ok(())
  }

  fn verify_dispatch_table(&self, op: Op) -> Result {
    let data = self.module.op(op);
    ensure!(self, op, data.sym_name().is_some(), "expects a `sym_name` attribute");
    for region in data.regions() {
      for block in self.module.region_blocks(*region) {
        for entry in self.module.block_ops(block) {
          ensure!(
            self,
            op,
            self.module.op(entry).kind() == OpKind::DtEntry,
            "may only contain `fir.dt_entry`",
          );
        }
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::ir::attrs::CaseTag;
  use crate::ir::builder::{Case, OpBuilder};
  use crate::ir::types::Extent;

  fn func(b: &mut OpBuilder, name: &str) -> Block {
    let f = b.func(name, Type::get_function(vec![Type::get_index()], vec![]));
    b.func_body(f)
  }

  #[test]
  fn valid_loop() {
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let entry = func(&mut b, "loop");
    b.with_insertion_point(entry, |b| {
      let n = b.module().block(entry).args()[0];
      let zero = b.const_float(Type::get_real(8), 0.0);
      let lp = b.do_loop(n, n, n, false, vec![zero]);
      let body = b.module().region_entry(lp, 0).unwrap();
      b.with_insertion_point(body, |b| {
        let acc = b.module().block(body).args()[1];
        let sum = b.binary(OpKind::AddF, acc, acc);
        b.result(vec![sum]);
      });
      // zero-result loop
      let empty = b.do_loop(n, n, n, false, vec![]);
      let body = b.module().region_entry(empty, 0).unwrap();
      b.with_insertion_point(body, |b| b.result(vec![]));
      b.ret(vec![]);
    });
    verify(&module).unwrap();
  }

  #[test]
  fn loop_arity_mismatch() {
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let entry = func(&mut b, "bad_loop");
    let lp = b.with_insertion_point(entry, |b| {
      let n = b.module().block(entry).args()[0];
      let zero = b.const_int(Type::get_i32(), 0);
      let lp = b.do_loop(n, n, n, false, vec![zero]);
      let body = b.module().region_entry(lp, 0).unwrap();
      b.with_insertion_point(body, |b| {
        let acc = b.module().block(body).args()[1];
        b.result(vec![acc]);
      });
      b.ret(vec![]);
      lp
    });
    let body = module.region_entry(lp, 0).unwrap();
    module.add_block_arg(body, Type::get_i32());
    let err = verify(&module).unwrap_err();
    assert_eq!(err.op, lp);
    assert!(err.message.contains("loop-carried"));
  }

  #[test]
  fn iterate_while_needs_flag() {
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let entry = func(&mut b, "iter");
    b.with_insertion_point(entry, |b| {
      let n = b.module().block(entry).args()[0];
      let ok = b.const_int(Type::get_i1(), 1);
      let lp = b.iterate_while(n, n, n, ok, vec![]);
      let body = b.module().region_entry(lp, 0).unwrap();
      b.with_insertion_point(body, |b| {
        let flag = b.module().block(body).args()[1];
        b.result(vec![flag]);
      });
      b.ret(vec![]);
    });
    verify(&module).unwrap();
  }

  #[test]
  fn result_types() {
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let entry = func(&mut b, "cond");
    b.with_insertion_point(entry, |b| {
      let c = b.const_int(Type::get_i1(), 0);
      let one = b.const_int(Type::get_i32(), 1);
      let op = b.if_op(c, vec![Type::get_i32()], true);
      let then_bb = b.module().region_entry(op, 0).unwrap();
      let else_bb = b.module().region_entry(op, 1).unwrap();
      b.with_insertion_point(then_bb, |b| b.result(vec![one]));
      b.with_insertion_point(else_bb, |b| b.result(vec![c]));
      b.ret(vec![]);
    });
    let err = verify(&module).unwrap_err();
    assert!(err.message.contains("types do not match"));
  }

  #[test]
  fn select_offsets_checked() {
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let entry = func(&mut b, "sel");
    let region = b.module().block(entry).region();
    let dest = b.module_mut().new_block(region, vec![Type::get_i32()]);
    let op = b.with_insertion_point(entry, |b| {
      let x = b.const_int(Type::get_i32(), 1);
      let cases = vec![
        Case::with_operands(CaseTag::Point, vec![x], dest, vec![x]),
        Case::otherwise(dest, vec![x]),
      ];
      b.select(OpKind::SelectCase, x, cases)
    });
    b.with_insertion_point(dest, |b| b.ret(vec![]));
    verify(&module).unwrap();
    module.set_attr(op, "target_operand_offsets", Attr::IntVec(vec![2, 1]));
    let err = verify(&module).unwrap_err();
    assert!(err.message.contains("target operand offsets"));
  }

  #[test]
  fn incomplete_alloca() {
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let entry = func(&mut b, "alloc");
    b.with_insertion_point(entry, |b| {
      let ty = Type::get_sequence(vec![crate::ir::types::Extent::Unknown], Type::get_real(4));
      b.alloca(ty, Some("a"), vec![], vec![]);
      b.ret(vec![]);
    });
    let err = verify(&module).unwrap_err();
    assert!(err.message.contains("incomplete"));
    let _ = err.log();
  }

  #[test]
  fn global_initializer() {
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let g = b.global("g", Type::get_i32(), Some(Linkage::Internal), false, None);
    let body = b.global_body(g);
    b.with_insertion_point(body, |b| {
      let v = b.const_int(Type::get_i32(), 3);
      b.has_value(v);
    });
    let dup = b.global("g", Type::get_i32(), None, true, Some(Attr::Int(1)));
    verify_op(&module, g).unwrap();
    let err = verify(&module).unwrap_err();
    assert_eq!(err.op, dup);
  }

  #[test]
  fn global_of_recursive_record() {
    let node = Type::get_record("vfy_node");
    node.set_record_body(
      vec![("kids".into(), Type::get_sequence(vec![Extent::Known(2)], node.clone()))],
      0,
    );
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let g = b.global("nodes", Type::get_sequence(vec![Extent::Known(4)], node), None, false, None);
    let err = verify_op(&module, g).unwrap_err();
    assert!(err.message.contains("contains itself"));
    // through a pointer it is fine
    let list = Type::get_record("vfy_list");
    list.set_record_body(vec![("next".into(), Type::get_ptr(list.clone()))], 0);
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let g = b.global("head", list, None, false, None);
    verify_op(&module, g).unwrap();
  }
}
