//! Operation builder ([`OpBuilder`]) and insertion point guard
//! ([`InsertionGuard`]).
//!
//! Builders never fail. Operands with unexpected types still produce an
//! operation, which is later rejected by the [verifier](crate::ir::verify).

use crate::ir::attrs::{Attr, AttrMap, CaseTag};
use crate::ir::entities::{Block, Op, Value};
use crate::ir::module::Module;
use crate::ir::ops::{CmpFPredicate, CmpIPredicate, Linkage, OpKind};
use crate::ir::segments::SegmentedList;
use crate::ir::types::Type;
use std::ops::{Deref, DerefMut};

/// Builds attribute maps in place.
macro_rules! attrs {
  ($($name:expr => $attr:expr),* $(,)?) => {{
    #[allow(unused_mut)]
    let mut attrs = AttrMap::new();
    $(attrs.insert($name.into(), $attr);)*
    attrs
  }};
}

/// One case of a multi-way branch.
#[derive(Clone, Debug)]
pub struct Case {
  /// Case attribute, `unit` for the default case.
  pub tag: Attr,
  /// Compare operands of the case, only used by `select_case`.
  pub operands: Vec<Value>,
  /// Destination block.
  pub dest: Block,
  /// Arguments passed to the destination block.
  pub args: Vec<Value>,
}

impl Case {
  /// Creates a new case without compare operands.
  pub fn new(tag: Attr, dest: Block, args: Vec<Value>) -> Self {
    Self {
      tag,
      operands: Vec::new(),
      dest,
      args,
    }
  }

  /// Creates a new `select_case` case.
  pub fn with_operands(tag: CaseTag, operands: Vec<Value>, dest: Block, args: Vec<Value>) -> Self {
    Self {
      tag: Attr::Case(tag),
      operands,
      dest,
      args,
    }
  }

  /// Creates a new default case.
  pub fn otherwise(dest: Block, args: Vec<Value>) -> Self {
    Self::new(Attr::Unit, dest, args)
  }
}

/// A builder that creates operations at the current insertion point.
///
/// Insertion points are blocks, operations are always appended to the end
/// of the innermost one. With no insertion point, operations are placed at
/// module level.
pub struct OpBuilder<'m> {
  module: &'m mut Module,
  points: Vec<Block>,
}

impl<'m> OpBuilder<'m> {
  /// Creates a new builder of the given module.
  pub fn new(module: &'m mut Module) -> Self {
    Self {
      module,
      points: Vec::new(),
    }
  }

  /// Returns a reference to the module.
  pub fn module(&self) -> &Module {
    self.module
  }

  /// Returns a mutable reference to the module.
  pub fn module_mut(&mut self) -> &mut Module {
    self.module
  }

  /// Returns the current insertion block.
  pub fn insertion_block(&self) -> Option<Block> {
    self.points.last().copied()
  }

  /// Returns the number of active insertion points.
  pub fn depth(&self) -> usize {
    self.points.len()
  }

  /// Makes the given block the current insertion point.
  pub fn push_insertion_point(&mut self, block: Block) {
    self.points.push(block);
  }

  /// Restores the previous insertion point, returns the popped one.
  ///
  /// # Panics
  ///
  /// Panics if there is no insertion point.
  pub fn pop_insertion_point(&mut self) -> Block {
    self.points.pop().expect("no insertion point to pop")
  }

  /// Makes the given block the current insertion point until the returned
  /// guard is dropped.
  pub fn scoped(&mut self, block: Block) -> InsertionGuard<'_, 'm> {
    let depth = self.points.len();
    self.push_insertion_point(block);
    InsertionGuard {
      builder: self,
      depth,
    }
  }

  /// Runs `f` with the given block as the insertion point. The previous
  /// insertion point is restored even if `f` panics.
  pub fn with_insertion_point<R, F>(&mut self, block: Block, f: F) -> R
  where
    F: FnOnce(&mut OpBuilder<'m>) -> R,
  {
    let mut guard = self.scoped(block);
    f(&mut *guard)
  }

  fn insert(&mut self, op: Op) -> Op {
    match self.insertion_block() {
      Some(block) => self.module.append_op(block, op),
      None => self.module.push_top(op),
    }
    op
  }

  /// Creates an operation of any kind at the insertion point.
  pub fn create(
    &mut self,
    kind: OpKind,
    operands: Vec<Value>,
    result_tys: Vec<Type>,
    attrs: AttrMap,
    num_regions: usize,
    successors: Vec<Block>,
  ) -> Op {
    let op = self
      .module
      .new_op(kind, operands, result_tys, attrs, num_regions, successors);
    self.insert(op)
  }

  fn create_value(&mut self, kind: OpKind, operands: Vec<Value>, ty: Type, attrs: AttrMap) -> Value {
    let op = self.create(kind, operands, vec![ty], attrs, 0, vec![]);
    self.module.op(op).result()
  }

  fn value_type(&self, value: Value) -> Type {
    self.module.value_type(value)
  }

  fn element_or_void(&self, value: Value) -> Type {
    self
      .value_type(value)
      .element_type()
      .cloned()
      .unwrap_or_else(Type::get_void)
  }

  /// Creates a constant with the given value attribute.
  pub fn constant(&mut self, ty: Type, value: Attr) -> Value {
    self.create_value(OpKind::Constant, vec![], ty, attrs! { "value" => value })
  }

  /// Creates an integer constant.
  pub fn const_int(&mut self, ty: Type, value: i64) -> Value {
    self.constant(ty, Attr::Int(value))
  }

  /// Creates a floating point constant.
  pub fn const_float(&mut self, ty: Type, value: f64) -> Value {
    self.constant(ty, Attr::Float(value))
  }

  /// Creates an undefined value.
  pub fn undefined(&mut self, ty: Type) -> Value {
    self.create_value(OpKind::Undefined, vec![], ty, attrs! {})
  }

  fn alloc(
    &mut self,
    kind: OpKind,
    in_type: Type,
    uniq_name: Option<&str>,
    len_params: Vec<Value>,
    shape: Vec<Value>,
  ) -> Value {
    let ty = match kind {
      OpKind::Alloca => Type::get_ref(in_type.clone()),
      _ => Type::get_heap(in_type.clone()),
    };
    let mut attrs = attrs! {
      "in_type" => Attr::Type(in_type),
      "operand_segment_sizes" => Attr::IntVec(vec![len_params.len() as i64, shape.len() as i64]),
    };
    if let Some(name) = uniq_name {
      attrs.insert("uniq_name".into(), Attr::Str(name.into()));
    }
    let operands = len_params.into_iter().chain(shape).collect();
    self.create_value(kind, operands, ty, attrs)
  }

  /// Creates a stack allocation of `in_type`, with length parameters and
  /// dynamic extents as operands.
  pub fn alloca(
    &mut self,
    in_type: Type,
    uniq_name: Option<&str>,
    len_params: Vec<Value>,
    shape: Vec<Value>,
  ) -> Value {
    self.alloc(OpKind::Alloca, in_type, uniq_name, len_params, shape)
  }

  /// Creates a heap allocation of `in_type`.
  pub fn allocmem(
    &mut self,
    in_type: Type,
    uniq_name: Option<&str>,
    len_params: Vec<Value>,
    shape: Vec<Value>,
  ) -> Value {
    self.alloc(OpKind::AllocMem, in_type, uniq_name, len_params, shape)
  }

  /// Creates a heap deallocation.
  pub fn freemem(&mut self, heap: Value) -> Op {
    self.create(OpKind::FreeMem, vec![heap], vec![], attrs! {}, 0, vec![])
  }

  /// Creates a load from a reference-like value.
  pub fn load(&mut self, memref: Value) -> Value {
    let ty = self.element_or_void(memref);
    self.create_value(OpKind::Load, vec![memref], ty, attrs! {})
  }

  /// Creates a store of `value` into `memref`.
  pub fn store(&mut self, value: Value, memref: Value) -> Op {
    self.create(OpKind::Store, vec![value, memref], vec![], attrs! {}, 0, vec![])
  }

  /// Creates a conversion of `value` to `ty`.
  pub fn convert(&mut self, value: Value, ty: Type) -> Value {
    self.create_value(OpKind::Convert, vec![value], ty, attrs! {})
  }

  /// Creates a binary arithmetic operation, the result has the type of
  /// `lhs`.
  ///
  /// # Panics
  ///
  /// Panics if `kind` is not a binary arithmetic kind.
  pub fn binary(&mut self, kind: OpKind, lhs: Value, rhs: Value) -> Value {
    assert!(
      kind.is_float_binary() || kind.is_int_binary(),
      "`kind` must be a binary operation"
    );
    let ty = self.value_type(lhs);
    self.create_value(kind, vec![lhs, rhs], ty, attrs! {})
  }

  /// Creates a floating point comparison.
  pub fn cmpf(&mut self, pred: CmpFPredicate, lhs: Value, rhs: Value) -> Value {
    let attrs = attrs! { "predicate" => Attr::Int(pred.index()) };
    self.create_value(OpKind::CmpF, vec![lhs, rhs], Type::get_i1(), attrs)
  }

  /// Creates an integer comparison.
  pub fn cmpi(&mut self, pred: CmpIPredicate, lhs: Value, rhs: Value) -> Value {
    let attrs = attrs! { "predicate" => Attr::Int(pred.index()) };
    self.create_value(OpKind::CmpI, vec![lhs, rhs], Type::get_i1(), attrs)
  }

  /// Creates a call of the given function symbol.
  pub fn call(&mut self, callee: &str, args: Vec<Value>, result_tys: Vec<Type>) -> Op {
    let attrs = attrs! { "callee" => Attr::Symbol(callee.into()) };
    self.create(OpKind::Call, args, result_tys, attrs, 0, vec![])
  }

  /// Boxes a reference into a descriptor.
  pub fn embox(&mut self, memref: Value) -> Value {
    let ty = Type::get_box(self.element_or_void(memref));
    self.create_value(OpKind::Embox, vec![memref], ty, attrs! {})
  }

  /// Returns the address held by a descriptor.
  pub fn box_addr(&mut self, boxed: Value) -> Value {
    let ty = Type::get_ref(self.element_or_void(boxed));
    self.create_value(OpKind::BoxAddr, vec![boxed], ty, attrs! {})
  }

  /// Creates the type descriptor of `ty`.
  pub fn gentypedesc(&mut self, ty: Type) -> Value {
    let attrs = attrs! { "in_type" => Attr::Type(ty.clone()) };
    self.create_value(OpKind::GenTypeDesc, vec![], Type::get_tdesc(ty), attrs)
  }

  /// Takes the address of a global of type `ty`.
  pub fn address_of(&mut self, symbol: &str, ty: Type) -> Value {
    let attrs = attrs! { "symbol" => Attr::Symbol(symbol.into()) };
    self.create_value(OpKind::AddressOf, vec![], Type::get_ref(ty), attrs)
  }

  /// Creates an `if` with an empty entry block in its then region, and in
  /// its else region if `with_else` is set.
  pub fn if_op(&mut self, cond: Value, result_tys: Vec<Type>, with_else: bool) -> Op {
    let op = self.create(OpKind::If, vec![cond], result_tys, attrs! {}, 2, vec![]);
    let regions = self.module.op(op).regions().to_vec();
    self.module.new_block(regions[0], vec![]);
    if with_else {
      self.module.new_block(regions[1], vec![]);
    }
    op
  }

  /// Creates a counting loop. The entry block of the body gets the
  /// induction variable followed by one argument per initial value.
  pub fn do_loop(
    &mut self,
    lower: Value,
    upper: Value,
    step: Value,
    unordered: bool,
    inits: Vec<Value>,
  ) -> Op {
    let tys: Vec<_> = inits.iter().map(|v| self.value_type(*v)).collect();
    let attrs = if unordered {
      attrs! { "unordered" => Attr::Unit }
    } else {
      attrs! {}
    };
    let operands = [lower, upper, step].into_iter().chain(inits).collect();
    let op = self.create(OpKind::DoLoop, operands, tys.clone(), attrs, 1, vec![]);
    let region = self.module.op(op).regions()[0];
    let args = std::iter::once(Type::get_index()).chain(tys).collect();
    self.module.new_block(region, args);
    op
  }

  /// Creates a counting loop that also stops when its condition becomes
  /// false. The first result is the final condition, the entry block of
  /// the body gets the induction variable, the condition and one argument
  /// per initial value.
  pub fn iterate_while(
    &mut self,
    lower: Value,
    upper: Value,
    step: Value,
    iterate_in: Value,
    inits: Vec<Value>,
  ) -> Op {
    let tys: Vec<_> = inits.iter().map(|v| self.value_type(*v)).collect();
    let results = std::iter::once(Type::get_i1()).chain(tys.clone()).collect();
    let operands = [lower, upper, step, iterate_in]
      .into_iter()
      .chain(inits)
      .collect();
    let op = self.create(OpKind::IterateWhile, operands, results, attrs! {}, 1, vec![]);
    let region = self.module.op(op).regions()[0];
    let args = [Type::get_index(), Type::get_i1()].into_iter().chain(tys).collect();
    self.module.new_block(region, args);
    op
  }

  /// Creates a `result` terminator.
  pub fn result(&mut self, values: Vec<Value>) -> Op {
    self.create(OpKind::Result, values, vec![], attrs! {}, 0, vec![])
  }

  /// Creates a multi-way branch of the given kind.
  ///
  /// Compare operand offsets are computed from the case tags, target
  /// operand offsets from the arguments of each case.
  ///
  /// # Panics
  ///
  /// Panics if `kind` is not a multi-way branch kind, or if the compare
  /// operands of a case do not match its tag.
  pub fn select(&mut self, kind: OpKind, selector: Value, cases: Vec<Case>) -> Op {
    assert!(kind.is_select(), "`kind` must be a multi-way branch");
    let mut tags = Vec::new();
    let mut compare = Vec::new();
    let mut targets = Vec::new();
    let mut dests = Vec::new();
    for case in cases {
      let expected = match kind {
        OpKind::SelectCase => case.tag.case_operand_count(),
        _ => 0,
      };
      assert_eq!(
        case.operands.len(),
        expected,
        "compare operands do not match case `{}`",
        case.tag
      );
      tags.push(case.tag);
      compare.push(case.operands);
      targets.push(case.args);
      dests.push(case.dest);
    }
    let compare = SegmentedList::from_segments(compare);
    let targets = SegmentedList::from_segments(targets);
    let offsets = |list: &SegmentedList<Value>| {
      Attr::IntVec(list.sizes().iter().map(|s| *s as i64).collect())
    };
    let attrs = attrs! {
      "cases" => Attr::Array(tags),
      "compare_operand_offsets" => offsets(&compare),
      "target_operand_offsets" => offsets(&targets),
    };
    let operands = std::iter::once(selector)
      .chain(compare.into_parts().0)
      .chain(targets.into_parts().0)
      .collect();
    self.create(kind, operands, vec![], attrs, 0, dests)
  }

  /// Creates an unconditional branch.
  pub fn br(&mut self, dest: Block, args: Vec<Value>) -> Op {
    self.create(OpKind::Br, args, vec![], attrs! {}, 0, vec![dest])
  }

  /// Creates a conditional branch.
  pub fn cond_br(
    &mut self,
    cond: Value,
    then_dest: Block,
    then_args: Vec<Value>,
    else_dest: Block,
    else_args: Vec<Value>,
  ) -> Op {
    let attrs = attrs! {
      "target_operand_offsets" =>
        Attr::IntVec(vec![then_args.len() as i64, else_args.len() as i64]),
    };
    let operands = std::iter::once(cond)
      .chain(then_args)
      .chain(else_args)
      .collect();
    self.create(OpKind::CondBr, operands, vec![], attrs, 0, vec![then_dest, else_dest])
  }

  /// Creates a function return.
  pub fn ret(&mut self, values: Vec<Value>) -> Op {
    self.create(OpKind::Return, values, vec![], attrs! {}, 0, vec![])
  }

  /// Creates an `unreachable` terminator.
  pub fn unreachable(&mut self) -> Op {
    self.create(OpKind::Unreachable, vec![], vec![], attrs! {}, 0, vec![])
  }

  /// Creates a function declaration with the given function type. Use
  /// [`func_body`](OpBuilder::func_body) to turn it into a definition.
  pub fn func(&mut self, name: &str, ty: Type) -> Op {
    let attrs = attrs! {
      "sym_name" => Attr::Str(name.into()),
      "type" => Attr::Type(ty),
    };
    self.create(OpKind::Func, vec![], vec![], attrs, 1, vec![])
  }

  /// Creates the entry block of a function, with one argument per
  /// parameter.
  ///
  /// # Panics
  ///
  /// Panics if the function type attribute is missing.
  pub fn func_body(&mut self, func: Op) -> Block {
    let data = self.module.op(func);
    let params = data
      .attr("type")
      .and_then(Attr::as_type)
      .and_then(|ty| ty.function_sig())
      .map(|(params, _)| params.to_vec())
      .expect("`func` does not have a function type");
    let region = data.regions()[0];
    self.module.new_block(region, params)
  }

  /// Creates a global. `init` is the simple initializer, use
  /// [`global_body`](OpBuilder::global_body) for an initializer region.
  pub fn global(
    &mut self,
    name: &str,
    ty: Type,
    linkage: Option<Linkage>,
    constant: bool,
    init: Option<Attr>,
  ) -> Op {
    let mut attrs = attrs! {
      "sym_name" => Attr::Str(name.into()),
      "type" => Attr::Type(ty),
    };
    if let Some(linkage) = linkage {
      attrs.insert("linkage".into(), Attr::Str(linkage.name().into()));
    }
    if constant {
      attrs.insert("constant".into(), Attr::Unit);
    }
    if let Some(init) = init {
      attrs.insert("init_val".into(), init);
    }
    self.create(OpKind::Global, vec![], vec![], attrs, 1, vec![])
  }

  /// Creates the entry block of the initializer region of a global.
  pub fn global_body(&mut self, global: Op) -> Block {
    let region = self.module.op(global).regions()[0];
    self.module.new_block(region, vec![])
  }

  /// Creates a `has_value` terminator.
  pub fn has_value(&mut self, value: Value) -> Op {
    self.create(OpKind::HasValue, vec![value], vec![], attrs! {}, 0, vec![])
  }

  /// Creates a dispatch table with an empty entry block.
  pub fn dispatch_table(&mut self, name: &str) -> Op {
    let attrs = attrs! { "sym_name" => Attr::Str(name.into()) };
    let op = self.create(OpKind::DispatchTable, vec![], vec![], attrs, 1, vec![]);
    let region = self.module.op(op).regions()[0];
    self.module.new_block(region, vec![]);
    op
  }

  /// Creates an entry of a dispatch table.
  pub fn dt_entry(&mut self, method: &str, proc: &str) -> Op {
    let attrs = attrs! {
      "method" => Attr::Str(method.into()),
      "proc" => Attr::Symbol(proc.into()),
    };
    self.create(OpKind::DtEntry, vec![], vec![], attrs, 0, vec![])
  }
}

/// Guard of an insertion point pushed by [`OpBuilder::scoped`].
///
/// Dereferences to the builder, and restores the previous insertion point
/// when dropped, including during unwinding.
pub struct InsertionGuard<'b, 'm> {
  builder: &'b mut OpBuilder<'m>,
  depth: usize,
}

impl<'m> Deref for InsertionGuard<'_, 'm> {
  type Target = OpBuilder<'m>;

  fn deref(&self) -> &Self::Target {
    self.builder
  }
}

impl<'m> DerefMut for InsertionGuard<'_, 'm> {
  fn deref_mut(&mut self) -> &mut Self::Target {
    self.builder
  }
}

impl Drop for InsertionGuard<'_, '_> {
  fn drop(&mut self) {
    self.builder.points.truncate(self.depth);
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::panic::{catch_unwind, AssertUnwindSafe};

  fn func(builder: &mut OpBuilder) -> Block {
    let ty = Type::get_function(vec![Type::get_index()], vec![]);
    let f = builder.func("f", ty);
    builder.func_body(f)
  }

  #[test]
  fn insertion_points() {
    let mut module = Module::new();
    let mut builder = OpBuilder::new(&mut module);
    let entry = func(&mut builder);
    let region = builder.module().block(entry).region();
    let other = builder.module_mut().new_detached_block(region, vec![]);
    assert!(!builder.module().is_block_placed(other));
    builder.module_mut().place_block(other);
    {
      let mut guard = builder.scoped(entry);
      guard.const_int(Type::get_i32(), 1);
      {
        let mut inner = guard.scoped(other);
        assert_eq!(inner.insertion_block(), Some(other));
        assert_eq!(inner.depth(), 2);
        inner.unreachable();
      }
      assert_eq!(guard.insertion_block(), Some(entry));
    }
    assert_eq!(builder.insertion_block(), None);
    assert_eq!(builder.module().block_ops(entry).len(), 1);
    assert_eq!(builder.module().block_ops(other).len(), 1);
  }

  #[test]
  fn guard_pops_on_panic() {
    let mut module = Module::new();
    let mut builder = OpBuilder::new(&mut module);
    let entry = func(&mut builder);
    let result = catch_unwind(AssertUnwindSafe(|| {
      builder.with_insertion_point(entry, |b| {
        b.undefined(Type::get_i32());
        panic!("nested construction failed");
      })
    }));
    assert!(result.is_err());
    assert_eq!(builder.depth(), 0);
  }

  #[test]
  fn select_offsets() {
    let mut module = Module::new();
    let mut builder = OpBuilder::new(&mut module);
    let entry = func(&mut builder);
    let region = builder.module().block(entry).region();
    let bb1 = builder.module_mut().new_block(region, vec![Type::get_i32()]);
    let bb2 = builder.module_mut().new_block(region, vec![]);
    let op = builder.with_insertion_point(entry, |b| {
      let sel = b.const_int(Type::get_i32(), 3);
      let lo = b.const_int(Type::get_i32(), 1);
      let hi = b.const_int(Type::get_i32(), 5);
      let cases = vec![
        Case::with_operands(CaseTag::ClosedInterval, vec![lo, hi], bb1, vec![sel]),
        Case::with_operands(CaseTag::Point, vec![lo], bb2, vec![]),
        Case::otherwise(bb2, vec![]),
      ];
      b.select(OpKind::SelectCase, sel, cases)
    });
    let data = builder.module().op(op);
    assert_eq!(data.operands().len(), 5);
    assert_eq!(data.successors(), &[bb1, bb2, bb2]);
    assert_eq!(
      data.attr("compare_operand_offsets"),
      Some(&Attr::IntVec(vec![2, 1, 0]))
    );
    assert_eq!(
      data.attr("target_operand_offsets"),
      Some(&Attr::IntVec(vec![1, 0, 0]))
    );
  }

  /// Linear congruential generator, enough to vary case lists.
  struct Lcg(u64);

  impl Lcg {
    fn below(&mut self, n: u64) -> u64 {
      self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
      (self.0 >> 33) % n
    }
  }

  #[test]
  fn generated_select_offsets() {
    for seed in 0..64 {
      let mut rng = Lcg(seed);
      let mut module = Module::new();
      let mut builder = OpBuilder::new(&mut module);
      let entry = func(&mut builder);
      let region = builder.module().block(entry).region();
      let case_count = 1 + rng.below(6) as usize;
      let with_default = rng.below(2) == 0;
      let (op, compare_total, target_total) = builder.with_insertion_point(entry, |b| {
        let sel = b.const_int(Type::get_i32(), seed as i64);
        let mut cases = Vec::new();
        let (mut compare_total, mut target_total) = (0, 0);
        for i in 0..case_count {
          let arity = rng.below(4) as usize;
          let dest = b.module_mut().new_block(region, vec![Type::get_i32(); arity]);
          let args = vec![sel; arity];
          target_total += arity;
          if with_default && i + 1 == case_count {
            cases.push(Case::otherwise(dest, args));
            continue;
          }
          let tag = match rng.below(4) {
            0 => CaseTag::Point,
            1 => CaseTag::LowerBound,
            2 => CaseTag::UpperBound,
            _ => CaseTag::ClosedInterval,
          };
          let operands: Vec<_> = (0..Attr::Case(tag).case_operand_count())
            .map(|k| b.const_int(Type::get_i32(), k as i64))
            .collect();
          compare_total += operands.len();
          cases.push(Case::with_operands(tag, operands, dest, args));
        }
        (b.select(OpKind::SelectCase, sel, cases), compare_total, target_total)
      });
      let module = builder.module();
      let data = module.op(op);
      assert_eq!(data.successors().len(), case_count, "seed {}", seed);
      let sum = |name: &str| match data.attr(name) {
        Some(Attr::IntVec(v)) => {
          assert_eq!(v.len(), case_count, "seed {}", seed);
          v.iter().sum::<i64>() as usize
        }
        attr => panic!("unexpected `{}`: {:?}", name, attr),
      };
      assert_eq!(sum("compare_operand_offsets"), compare_total, "seed {}", seed);
      assert_eq!(sum("target_operand_offsets"), target_total, "seed {}", seed);
      assert_eq!(data.operands().len(), 1 + compare_total + target_total);
      let parts = module.select_parts(op);
      assert_eq!(parts.cases.len(), parts.dests.len());
      crate::ir::verify::verify_op(module, op).unwrap();
    }
  }

  #[test]
  fn loop_blocks() {
    let mut module = Module::new();
    let mut builder = OpBuilder::new(&mut module);
    let entry = func(&mut builder);
    let (do_loop, iter) = builder.with_insertion_point(entry, |b| {
      let arg = b.module().block(entry).args()[0];
      let init = b.const_float(Type::get_real(4), 0.0);
      let ok = b.const_int(Type::get_i1(), 1);
      let do_loop = b.do_loop(arg, arg, arg, true, vec![init]);
      let iter = b.iterate_while(arg, arg, arg, ok, vec![]);
      (do_loop, iter)
    });
    let module = builder.module();
    let body = module.region(module.op(do_loop).regions()[0]).entry().unwrap();
    assert_eq!(module.block(body).args().len(), 2);
    assert_eq!(module.op(do_loop).results().len(), 1);
    assert!(module.op(do_loop).has_flag("unordered"));
    let body = module.region(module.op(iter).regions()[0]).entry().unwrap();
    let args = module.block(body).args();
    assert_eq!(args.len(), 2);
    assert!(module.value_type(args[1]).is_i1());
    assert_eq!(module.op(iter).results().len(), 1);
  }
}
