//! FIR modules ([`Module`]), the owners of all entities.

use crate::front::span::Span;
use crate::ir::attrs::{Attr, AttrMap};
use crate::ir::entities::*;
use crate::ir::idman::{next_block_id, next_op_id, next_region_id, next_value_id};
use crate::ir::layout::{Layout, OpBlockMap};
use crate::ir::ops::OpKind;
use crate::ir::types::Type;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A FIR module.
///
/// `Module` holds the data of all operations, values, blocks and regions,
/// and maintains their use-define and define-use chains. Module level
/// operations (functions, globals and dispatch tables) are kept in
/// insertion order.
pub struct Module {
  ops: HashMap<Op, OpData>,
  values: HashMap<Value, ValueData>,
  blocks: HashMap<Block, BlockData>,
  regions: HashMap<Region, RegionData>,
  op_block: OpBlockMap,
  layout: Vec<Op>,
}

/// Returns a mutable reference of the value data by the given value handle.
macro_rules! value_mut {
  ($self:ident, $value:expr) => {
    $self
      .values
      .get_mut(&$value)
      .expect("value does not exist")
  };
}

impl Module {
  /// Creates a new module.
  pub fn new() -> Self {
    Self {
      ops: HashMap::new(),
      values: HashMap::new(),
      blocks: HashMap::new(),
      regions: HashMap::new(),
      op_block: Rc::new(RefCell::new(HashMap::new())),
      layout: Vec::new(),
    }
  }

  /// Creates a new operation that is not placed in any block.
  /// Results get the given types, regions are created empty.
  ///
  /// # Panics
  ///
  /// Panics if the operands or successors do not exist.
  pub fn new_op(
    &mut self,
    kind: OpKind,
    operands: Vec<Value>,
    result_tys: Vec<Type>,
    attrs: AttrMap,
    num_regions: usize,
    successors: Vec<Block>,
  ) -> Op {
    let op = Op(next_op_id());
    for v in &operands {
      value_mut!(self, *v).used_by.insert(op);
    }
    for bb in &successors {
      self.block_mut(*bb).used_by.insert(op);
    }
    let results = result_tys
      .into_iter()
      .enumerate()
      .map(|(i, ty)| self.new_value(ValueData::new(ty, ValueDef::Result(op, i))))
      .collect();
    let regions = (0..num_regions).map(|_| self.new_region(op)).collect();
    let mut data = OpData::new(kind, operands, attrs);
    data.results = results;
    data.regions = regions;
    data.successors = successors;
    self.ops.insert(op, data);
    op
  }

  fn new_value(&mut self, data: ValueData) -> Value {
    let value = Value(next_value_id());
    self.values.insert(value, data);
    value
  }

  fn new_region(&mut self, parent: Op) -> Region {
    let region = Region(next_region_id());
    let layout = Layout::new(&self.op_block);
    self.regions.insert(region, RegionData { parent, layout });
    region
  }

  /// Creates a placeholder value for a forward reference. The placeholder
  /// must be replaced by [`replace_all_uses_with`](Module::replace_all_uses_with)
  /// and removed once the real definition is known.
  pub fn new_placeholder(&mut self, ty: Type) -> Value {
    self.new_value(ValueData::new(ty, ValueDef::Placeholder))
  }

  /// Creates a new block at the end of the given region.
  ///
  /// # Panics
  ///
  /// Panics if the given region does not exist.
  pub fn new_block(&mut self, region: Region, arg_tys: Vec<Type>) -> Block {
    let block = self.new_detached_block(region, arg_tys);
    self.place_block(block);
    block
  }

  /// Creates a new block of the given region that is not in the region's
  /// block list yet. Used for forward references to blocks.
  pub fn new_detached_block(&mut self, region: Region, arg_tys: Vec<Type>) -> Block {
    let block = Block(next_block_id());
    let args = arg_tys
      .into_iter()
      .enumerate()
      .map(|(i, ty)| self.new_value(ValueData::new(ty, ValueDef::Arg(block, i))))
      .collect();
    self.blocks.insert(
      block,
      BlockData {
        region,
        args,
        used_by: Default::default(),
      },
    );
    block
  }

  /// Appends a detached block to the end of its region.
  ///
  /// # Panics
  ///
  /// Panics if the block is already placed.
  pub fn place_block(&mut self, block: Block) {
    let region = self.block(block).region;
    self
      .region_mut(region)
      .layout
      .blocks_mut()
      .push_key_back(block)
      .expect("`block` is already placed");
  }

  /// Checks if the given block is in the block list of its region.
  pub fn is_block_placed(&self, block: Block) -> bool {
    let region = self.block(block).region;
    self.region(region).layout.blocks().contains_key(&block)
  }

  /// Appends a new argument to the given block.
  pub fn add_block_arg(&mut self, block: Block, ty: Type) -> Value {
    let index = self.block(block).args.len();
    let arg = self.new_value(ValueData::new(ty, ValueDef::Arg(block, index)));
    self.block_mut(block).args.push(arg);
    arg
  }

  /// Appends the given operation to the end of the given block.
  ///
  /// # Panics
  ///
  /// Panics if the block does not exist or the operation is already
  /// placed somewhere.
  pub fn append_op(&mut self, block: Block, op: Op) {
    assert!(self.parent_block(op).is_none(), "`op` is already placed");
    let region = self.block(block).region;
    self
      .region_mut(region)
      .layout
      .ops_mut(block)
      .push_key_back(op)
      .expect("`op` is already in the block");
  }

  /// Appends the given operation to the module level operation list.
  pub fn push_top(&mut self, op: Op) {
    assert!(!self.layout.contains(&op), "`op` is already placed");
    self.layout.push(op);
  }

  /// Returns the module level operations in order.
  pub fn top_ops(&self) -> &[Op] {
    &self.layout
  }

  /// Returns a reference to the operation data.
  ///
  /// # Panics
  ///
  /// Panics if the given operation does not exist.
  pub fn op(&self, op: Op) -> &OpData {
    self.ops.get(&op).expect("`op` does not exist")
  }

  fn op_mut(&mut self, op: Op) -> &mut OpData {
    self.ops.get_mut(&op).expect("`op` does not exist")
  }

  /// Checks if the given operation exists.
  pub fn contains_op(&self, op: Op) -> bool {
    self.ops.contains_key(&op)
  }

  /// Sets an attribute of the given operation.
  pub fn set_attr(&mut self, op: Op, name: &str, attr: Attr) {
    self.op_mut(op).attrs.insert(name.into(), attr);
  }

  /// Records the source span of the given operation.
  pub fn set_span(&mut self, op: Op, span: Span) {
    self.op_mut(op).span = Some(span);
  }

  /// Returns a reference to the value data.
  ///
  /// # Panics
  ///
  /// Panics if the given value does not exist.
  pub fn value(&self, value: Value) -> &ValueData {
    self.values.get(&value).expect("`value` does not exist")
  }

  /// Returns the type of the given value.
  pub fn value_type(&self, value: Value) -> Type {
    self.value(value).ty().clone()
  }

  /// Returns the operation defining the given value, `None` for block
  /// arguments and placeholders.
  pub fn defining_op(&self, value: Value) -> Option<Op> {
    match self.value(value).def {
      ValueDef::Result(op, _) => Some(op),
      _ => None,
    }
  }

  /// Returns a reference to the block data.
  ///
  /// # Panics
  ///
  /// Panics if the given block does not exist.
  pub fn block(&self, block: Block) -> &BlockData {
    self.blocks.get(&block).expect("`block` does not exist")
  }

  fn block_mut(&mut self, block: Block) -> &mut BlockData {
    self.blocks.get_mut(&block).expect("`block` does not exist")
  }

  /// Returns a reference to the region data.
  ///
  /// # Panics
  ///
  /// Panics if the given region does not exist.
  pub fn region(&self, region: Region) -> &RegionData {
    self.regions.get(&region).expect("`region` does not exist")
  }

  fn region_mut(&mut self, region: Region) -> &mut RegionData {
    self.regions.get_mut(&region).expect("`region` does not exist")
  }

  /// Returns the blocks of the given region in order.
  pub fn region_blocks(&self, region: Region) -> Vec<Block> {
    self.region(region).layout.blocks().keys().copied().collect()
  }

  /// Returns the operations of the given block in order.
  pub fn block_ops(&self, block: Block) -> Vec<Op> {
    let region = self.block(block).region;
    self.region(region).layout.ops(block).keys().copied().collect()
  }

  /// Returns the terminator of the given block, `None` if the last
  /// operation is not a terminator or the block is empty.
  pub fn terminator(&self, block: Block) -> Option<Op> {
    let region = self.block(block).region;
    let last = self.region(region).layout.ops(block).back_key().copied()?;
    self.op(last).kind().is_terminator().then(|| last)
  }

  /// Returns the block holding the given operation.
  pub fn parent_block(&self, op: Op) -> Option<Block> {
    self.op_block.borrow().get(&op).copied()
  }

  /// Returns the operation owning the region that holds the given
  /// operation.
  pub fn parent_op(&self, op: Op) -> Option<Op> {
    self.parent_block(op).map(|b| self.block_owner(b))
  }

  /// Returns the operation owning the region of the given block.
  pub fn block_owner(&self, block: Block) -> Op {
    self.region(self.block(block).region).parent
  }

  /// Returns the module level operation defining the given symbol.
  pub fn lookup_symbol(&self, name: &str) -> Option<Op> {
    self
      .layout
      .iter()
      .copied()
      .find(|op| self.op(*op).sym_name() == Some(name))
  }

  /// Returns all operations in pre-order, module level operations first
  /// followed by their nested operations.
  pub fn walk(&self) -> Vec<Op> {
    let mut ops = Vec::new();
    for op in &self.layout {
      self.walk_op(*op, &mut ops);
    }
    ops
  }

  fn walk_op(&self, op: Op, ops: &mut Vec<Op>) {
    ops.push(op);
    for region in self.op(op).regions() {
      for block in self.region_blocks(*region) {
        for inner in self.block_ops(block) {
          self.walk_op(inner, ops);
        }
      }
    }
  }

  /// Replaces the `index`th operand of the given operation.
  ///
  /// # Panics
  ///
  /// Panics if the operation or the value does not exist, or the index
  /// is out of range.
  pub fn set_operand(&mut self, op: Op, index: usize, value: Value) {
    let old = std::mem::replace(&mut self.op_mut(op).operands[index], value);
    if !self.op(op).operands.contains(&old) {
      value_mut!(self, old).used_by.remove(&op);
    }
    value_mut!(self, value).used_by.insert(op);
  }

  /// Replaces all uses of `old` with `new`.
  ///
  /// # Panics
  ///
  /// Panics if any of the values does not exist.
  pub fn replace_all_uses_with(&mut self, old: Value, new: Value) {
    if old == new {
      return;
    }
    let users: Vec<_> = value_mut!(self, old).used_by.drain().collect();
    for user in users {
      for operand in self.op_mut(user).operands.iter_mut() {
        if *operand == old {
          *operand = new;
        }
      }
      value_mut!(self, new).used_by.insert(user);
    }
  }

  /// Removes a placeholder value.
  ///
  /// # Panics
  ///
  /// Panics if the value is not an unused placeholder.
  pub fn remove_placeholder(&mut self, value: Value) {
    let data = self.values.remove(&value).expect("`value` does not exist");
    assert!(data.def == ValueDef::Placeholder, "`value` is not a placeholder");
    assert!(data.used_by.is_empty(), "`value` is used by other operations");
  }

  /// Turns the given operation into a constant with the given value,
  /// keeping its result. Used by folding.
  ///
  /// # Panics
  ///
  /// Panics if the operation does not have exactly one result or has
  /// regions.
  pub fn replace_with_constant(&mut self, op: Op, value: Attr) {
    let data = self.op(op);
    assert!(data.results.len() == 1, "`op` must have exactly one result");
    assert!(data.regions.is_empty(), "`op` must not have regions");
    self.drop_uses(op);
    let data = self.op_mut(op);
    data.kind = OpKind::Constant;
    data.operands.clear();
    data.successors.clear();
    data.attrs.clear();
    data.attrs.insert("value".into(), value);
  }

  /// Removes the given operation and everything nested in it. Returns the
  /// removed operation data.
  ///
  /// # Panics
  ///
  /// Panics if the operation does not exist, or one of its results is
  /// still used outside of it.
  pub fn remove_op(&mut self, op: Op) -> OpData {
    if let Some(block) = self.parent_block(op) {
      let region = self.block(block).region;
      self.region_mut(region).layout.ops_mut(block).remove(&op);
    } else if let Some(pos) = self.layout.iter().position(|o| *o == op) {
      self.layout.remove(pos);
    }
    // drop every use made inside the operation before deleting entities
    let mut nested = Vec::new();
    self.walk_op(op, &mut nested);
    for inner in &nested {
      self.drop_uses(*inner);
    }
    for inner in nested.iter().rev().filter(|o| **o != op) {
      self.delete_op(*inner);
    }
    self.delete_op(op)
  }

  /// Unregisters all operand and successor uses of the given operation.
  fn drop_uses(&mut self, op: Op) {
    let data = self.ops.get(&op).expect("`op` does not exist");
    let (operands, successors) = (data.operands.clone(), data.successors.clone());
    for v in operands {
      if let Some(v) = self.values.get_mut(&v) {
        v.used_by.remove(&op);
      }
    }
    for bb in successors {
      if let Some(bb) = self.blocks.get_mut(&bb) {
        bb.used_by.remove(&op);
      }
    }
  }

  /// Deletes the data of an operation whose uses have been dropped.
  fn delete_op(&mut self, op: Op) -> OpData {
    let data = self.ops.remove(&op).expect("`op` does not exist");
    self.op_block.borrow_mut().remove(&op);
    for v in &data.results {
      let value = self.values.remove(v).expect("result does not exist");
      assert!(value.used_by.is_empty(), "result is used by other operations");
    }
    for region in &data.regions {
      let region = self.regions.remove(region).expect("region does not exist");
      for block in region.layout.blocks().keys() {
        let block = self.blocks.remove(block).expect("block does not exist");
        for arg in block.args {
          self.values.remove(&arg);
        }
      }
    }
    data
  }
}

impl Default for Module {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn const_op(module: &mut Module, block: Block, v: i64) -> Value {
    let mut attrs = AttrMap::new();
    attrs.insert("value".into(), Attr::Int(v));
    let op = module.new_op(OpKind::Constant, vec![], vec![Type::get_i32()], attrs, 0, vec![]);
    module.append_op(block, op);
    module.op(op).result()
  }

  fn func_with_block(module: &mut Module) -> (Op, Block) {
    let func = module.new_op(OpKind::Func, vec![], vec![], AttrMap::new(), 1, vec![]);
    module.push_top(func);
    let region = module.op(func).regions()[0];
    let block = module.new_block(region, vec![Type::get_index()]);
    (func, block)
  }

  #[test]
  fn use_chains() {
    let mut module = Module::new();
    let (func, block) = func_with_block(&mut module);
    let a = const_op(&mut module, block, 1);
    let b = const_op(&mut module, block, 2);
    let add = module.new_op(OpKind::AddI, vec![a, a], vec![Type::get_i32()], AttrMap::new(), 0, vec![]);
    module.append_op(block, add);
    assert_eq!(module.parent_block(add), Some(block));
    assert_eq!(module.parent_op(add), Some(func));
    assert!(module.value(a).used_by().contains(&add));
    module.set_operand(add, 0, b);
    // still used by the second operand
    assert!(module.value(a).used_by().contains(&add));
    module.set_operand(add, 1, b);
    assert!(module.value(a).used_by().is_empty());
    module.replace_all_uses_with(b, a);
    assert_eq!(module.op(add).operands(), &[a, a]);
    assert!(module.value(b).used_by().is_empty());
    assert_eq!(module.block_ops(block).len(), 3);
  }

  #[test]
  fn remove_nested() {
    let mut module = Module::new();
    let (func, block) = func_with_block(&mut module);
    let arg = module.block(block).args()[0];
    let a = const_op(&mut module, block, 1);
    let ret = module.new_op(OpKind::Return, vec![a, arg], vec![], AttrMap::new(), 0, vec![]);
    module.append_op(block, ret);
    assert_eq!(module.terminator(block), Some(ret));
    module.remove_op(func);
    assert!(module.top_ops().is_empty());
    assert!(!module.contains_op(ret));
    assert!(module.parent_block(ret).is_none());
  }

  #[test]
  fn constant_in_place() {
    let mut module = Module::new();
    let (_, block) = func_with_block(&mut module);
    let a = const_op(&mut module, block, 1);
    let neg = module.new_op(OpKind::SubI, vec![a, a], vec![Type::get_i32()], AttrMap::new(), 0, vec![]);
    module.append_op(block, neg);
    module.replace_with_constant(neg, Attr::Int(0));
    assert_eq!(module.op(neg).kind(), OpKind::Constant);
    assert!(module.value(a).used_by().is_empty());
    assert_eq!(module.op(neg).attr("value"), Some(&Attr::Int(0)));
  }
}
