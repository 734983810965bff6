//! FIR entities, including operations ([`Op`], [`OpData`]), values
//! ([`Value`], [`ValueData`]), blocks ([`Block`], [`BlockData`]) and
//! regions ([`Region`], [`RegionData`]).
//!
//! All entities are owned by a [`Module`](crate::ir::Module), and are
//! referred to by copyable handles.

use crate::front::span::Span;
use crate::ir::attrs::{Attr, AttrMap};
use crate::ir::idman::{BlockId, OpId, RegionId, ValueId};
use crate::ir::layout::Layout;
use crate::ir::ops::OpKind;
use crate::ir::types::Type;
use std::collections::HashSet;

/// A handle of FIR operation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Op(pub(in crate::ir) OpId);

/// A handle of FIR value.
///
/// Values are either results of operations or arguments of blocks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Value(pub(in crate::ir) ValueId);

/// A handle of FIR block.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Block(pub(in crate::ir) BlockId);

/// A handle of FIR region.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Region(pub(in crate::ir) RegionId);

/// Data of FIR operation.
///
/// Operands are non-owning references to values, results are owned by
/// the operation, as are its regions. Successors are only present on
/// branch operations.
pub struct OpData {
  pub(in crate::ir) kind: OpKind,
  pub(in crate::ir) operands: Vec<Value>,
  pub(in crate::ir) results: Vec<Value>,
  pub(in crate::ir) attrs: AttrMap,
  pub(in crate::ir) regions: Vec<Region>,
  pub(in crate::ir) successors: Vec<Block>,
  pub(in crate::ir) span: Option<Span>,
}

impl OpData {
  pub(in crate::ir) fn new(kind: OpKind, operands: Vec<Value>, attrs: AttrMap) -> Self {
    Self {
      kind,
      operands,
      results: Vec::new(),
      attrs,
      regions: Vec::new(),
      successors: Vec::new(),
      span: None,
    }
  }

  /// Returns the kind of the operation.
  pub fn kind(&self) -> OpKind {
    self.kind
  }

  /// Returns the operands of the operation.
  pub fn operands(&self) -> &[Value] {
    &self.operands
  }

  /// Returns the results of the operation.
  pub fn results(&self) -> &[Value] {
    &self.results
  }

  /// Returns the only result of the operation.
  ///
  /// # Panics
  ///
  /// Panics if the operation does not have exactly one result.
  pub fn result(&self) -> Value {
    assert!(self.results.len() == 1, "expected exactly one result");
    self.results[0]
  }

  /// Returns the attributes of the operation.
  pub fn attrs(&self) -> &AttrMap {
    &self.attrs
  }

  /// Returns the attribute with the given name.
  pub fn attr(&self, name: &str) -> Option<&Attr> {
    self.attrs.get(name)
  }

  /// Checks if the operation has the given unit attribute.
  pub fn has_flag(&self, name: &str) -> bool {
    matches!(self.attrs.get(name), Some(Attr::Unit))
  }

  /// Returns the regions of the operation.
  pub fn regions(&self) -> &[Region] {
    &self.regions
  }

  /// Returns the successors of the operation.
  pub fn successors(&self) -> &[Block] {
    &self.successors
  }

  /// Returns the source span of the operation, if it was parsed.
  pub fn span(&self) -> Option<Span> {
    self.span
  }

  /// Returns the symbol name defined by the operation.
  pub fn sym_name(&self) -> Option<&str> {
    self.attr("sym_name").and_then(Attr::as_str)
  }
}

/// Where a value is defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueDef {
  /// The `n`th result of an operation.
  Result(Op, usize),
  /// The `n`th argument of a block.
  Arg(Block, usize),
  /// A forward reference that has not been defined yet.
  Placeholder,
}

/// Data of FIR value.
///
/// `ValueData` holds the type of the value, where it is defined, and
/// which operations use it.
pub struct ValueData {
  ty: Type,
  pub(in crate::ir) def: ValueDef,
  pub(in crate::ir) used_by: HashSet<Op>,
}

impl ValueData {
  pub(in crate::ir) fn new(ty: Type, def: ValueDef) -> Self {
    Self {
      ty,
      def,
      used_by: HashSet::new(),
    }
  }

  /// Returns a reference to the value's type.
  pub fn ty(&self) -> &Type {
    &self.ty
  }

  /// Returns where the value is defined.
  pub fn def(&self) -> ValueDef {
    self.def
  }

  /// Returns the operations that use the value.
  pub fn used_by(&self) -> &HashSet<Op> {
    &self.used_by
  }
}

/// Data of FIR block.
///
/// Only holds the arguments of the block, its parent region and the
/// branch operations targeting it. The order of operations in the block
/// is stored in the [`Layout`] of the parent region.
pub struct BlockData {
  pub(in crate::ir) region: Region,
  pub(in crate::ir) args: Vec<Value>,
  pub(in crate::ir) used_by: HashSet<Op>,
}

impl BlockData {
  /// Returns the parent region of the block.
  pub fn region(&self) -> Region {
    self.region
  }

  /// Returns the arguments of the block.
  pub fn args(&self) -> &[Value] {
    &self.args
  }

  /// Returns the branch operations that target the block.
  pub fn used_by(&self) -> &HashSet<Op> {
    &self.used_by
  }
}

/// Data of FIR region.
pub struct RegionData {
  pub(in crate::ir) parent: Op,
  pub(in crate::ir) layout: Layout,
}

impl RegionData {
  /// Returns the operation that owns the region.
  pub fn parent(&self) -> Op {
    self.parent
  }

  /// Returns the layout of blocks and operations in the region.
  pub fn layout(&self) -> &Layout {
    &self.layout
  }

  /// Returns the entry block of the region, `None` if empty.
  pub fn entry(&self) -> Option<Block> {
    self.layout.entry_block()
  }
}
