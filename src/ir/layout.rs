//! Layout ([`Layout`]), block list and operation list related
//! implementations.

use crate::ir::entities::{Block, Op};
use key_node_list::{impl_node, KeyNodeList, Map};
use std::borrow::Borrow;
use std::cell::RefCell;
use std::collections::{hash_map::Entry, HashMap};
use std::hash::Hash;
use std::rc::{Rc, Weak};

/// Map from operations to the blocks holding them, shared by all layouts
/// of a module.
pub(in crate::ir) type OpBlockMap = Rc<RefCell<HashMap<Op, Block>>>;

type OpBlockCell = Weak<RefCell<HashMap<Op, Block>>>;

/// Layout of blocks and operations in a region.
///
/// Pushing an operation into a block's [`OpList`] records the block as
/// the operation's parent in the module, removing it forgets the parent.
pub struct Layout {
  blocks: BlockList,
}

impl Layout {
  pub(in crate::ir) fn new(op_block: &OpBlockMap) -> Self {
    Self {
      blocks: BlockList::with_map(BlockMap::new(Rc::downgrade(op_block))),
    }
  }

  /// Returns a reference to the block list.
  pub fn blocks(&self) -> &BlockList {
    &self.blocks
  }

  /// Returns a mutable reference to the block list.
  pub(in crate::ir) fn blocks_mut(&mut self) -> &mut BlockList {
    &mut self.blocks
  }

  /// Returns a reference to the operation list of the given block.
  ///
  /// # Panics
  ///
  /// Panics if the given block is not in the current layout.
  pub fn ops(&self, block: Block) -> &OpList {
    self.blocks.node(&block).expect("`block` does not exist").ops()
  }

  /// Returns a mutable reference to the operation list of the given block.
  ///
  /// # Panics
  ///
  /// Panics if the given block is not in the current layout.
  pub(in crate::ir) fn ops_mut(&mut self, block: Block) -> &mut OpList {
    self
      .blocks
      .node_mut(&block)
      .expect("`block` does not exist")
      .ops_mut()
  }

  /// Returns the entry block, `None` if the layout is empty.
  pub fn entry_block(&self) -> Option<Block> {
    self.blocks.front_key().copied()
  }
}

/// Block list, stores the order of all blocks in a region.
pub type BlockList = KeyNodeList<Block, BlockNode, BlockMap>;

/// The underlying hash map of the [`BlockList`].
pub struct BlockMap {
  op_block: OpBlockCell,
  map: HashMap<Block, BlockNode>,
}

impl BlockMap {
  fn new(op_block: OpBlockCell) -> Self {
    Self {
      op_block,
      map: HashMap::new(),
    }
  }
}

impl Map<Block, BlockNode> for BlockMap {
  fn len(&self) -> usize {
    self.map.len()
  }

  fn clear(&mut self) {
    self.map.clear()
  }

  fn get<Q: ?Sized>(&self, k: &Q) -> Option<&BlockNode>
  where
    Block: Borrow<Q>,
    Q: Hash + Eq,
  {
    self.map.get(k)
  }

  fn get_mut<Q: ?Sized>(&mut self, k: &Q) -> Option<&mut BlockNode>
  where
    Block: Borrow<Q>,
    Q: Hash + Eq,
  {
    self.map.get_mut(k)
  }

  fn insert<T>(&mut self, k: Block, v: T) -> Result<(), (Block, T)>
  where
    T: Into<BlockNode>,
  {
    match self.map.entry(k) {
      Entry::Vacant(e) => {
        e.insert(BlockNode::new(k, self.op_block.clone()));
        Ok(())
      }
      Entry::Occupied(_) => Err((k, v)),
    }
  }

  fn remove_entry<Q: ?Sized>(&mut self, k: &Q) -> Option<(Block, BlockNode)>
  where
    Block: Borrow<Q>,
    Q: Hash + Eq,
  {
    self.map.remove_entry(k)
  }
}

/// The node in [`BlockList`] that holds the operation list of the block.
pub struct BlockNode {
  ops: OpList,
  prev: Option<Block>,
  next: Option<Block>,
}

impl_node!(BlockNode { Key = Block, prev = prev, next = next });

impl BlockNode {
  fn new(block: Block, op_block: OpBlockCell) -> Self {
    Self {
      ops: OpList::with_map(OpMap::new(block, op_block)),
      prev: None,
      next: None,
    }
  }

  /// Returns a reference to the operation list.
  pub fn ops(&self) -> &OpList {
    &self.ops
  }

  /// Returns a mutable reference to the operation list.
  pub(in crate::ir) fn ops_mut(&mut self) -> &mut OpList {
    &mut self.ops
  }
}

impl From<()> for BlockNode {
  /// Always panics, block nodes are constructed by [`BlockMap`].
  ///
  /// Only exists to satisfy the bounds of
  /// [`push_key_back`](KeyNodeList::push_key_back).
  fn from(_: ()) -> Self {
    panic!("block nodes are constructed by the block map")
  }
}

/// Operation list, stores the order of all operations in a block.
pub type OpList = KeyNodeList<Op, OpNode, OpMap>;

/// The underlying hash map of the [`OpList`].
pub struct OpMap {
  block: Block,
  op_block: OpBlockCell,
  map: HashMap<Op, OpNode>,
}

impl OpMap {
  fn new(block: Block, op_block: OpBlockCell) -> Self {
    Self {
      block,
      op_block,
      map: HashMap::new(),
    }
  }

  fn parents(&self) -> OpBlockMap {
    self.op_block.upgrade().expect("module has been dropped")
  }
}

impl Map<Op, OpNode> for OpMap {
  fn len(&self) -> usize {
    self.map.len()
  }

  fn clear(&mut self) {
    let parents = self.parents();
    let mut parents = parents.borrow_mut();
    for op in self.map.keys() {
      parents.remove(op);
    }
    self.map.clear()
  }

  fn get<Q: ?Sized>(&self, k: &Q) -> Option<&OpNode>
  where
    Op: Borrow<Q>,
    Q: Hash + Eq,
  {
    self.map.get(k)
  }

  fn get_mut<Q: ?Sized>(&mut self, k: &Q) -> Option<&mut OpNode>
  where
    Op: Borrow<Q>,
    Q: Hash + Eq,
  {
    self.map.get_mut(k)
  }

  fn insert<T>(&mut self, k: Op, v: T) -> Result<(), (Op, T)>
  where
    T: Into<OpNode>,
  {
    if self.map.contains_key(&k) {
      Err((k, v))
    } else {
      self.parents().borrow_mut().insert(k, self.block);
      self.map.insert(k, v.into());
      Ok(())
    }
  }

  fn remove_entry<Q: ?Sized>(&mut self, k: &Q) -> Option<(Op, OpNode)>
  where
    Op: Borrow<Q>,
    Q: Hash + Eq,
  {
    let kv = self.map.remove_entry(k);
    if let Some((op, _)) = &kv {
      self.parents().borrow_mut().remove::<Op>(op);
    }
    kv
  }
}

/// The node in [`OpList`].
pub struct OpNode {
  prev: Option<Op>,
  next: Option<Op>,
}

impl_node!(OpNode { Key = Op, prev = prev, next = next });

impl From<()> for OpNode {
  fn from(_: ()) -> Self {
    Self {
      prev: None,
      next: None,
    }
  }
}
