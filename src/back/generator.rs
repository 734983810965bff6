use crate::ir::{Block, Module, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Result, Write};
use std::path::Path;

/// A manager for allocating names of values and blocks.
///
/// Values are numbered in the order they are first mentioned, blocks in
/// the order of their regions. Numbering restarts in each module level
/// operation.
#[derive(Default)]
pub struct NameManager {
  value_names: HashMap<Value, String>,
  block_names: HashMap<Block, String>,
  next_value_id: usize,
  scope_depth: usize,
}

impl NameManager {
  /// Creates a new `NameManager`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Enters a module level operation.
  ///
  /// # Panics
  ///
  /// Panics if the manager is already in a module level operation.
  pub fn enter_func_scope(&mut self) {
    assert!(self.scope_depth == 0, "already in a module level operation");
    self.scope_depth += 1;
  }

  /// Exits the current module level operation, and forgets all local
  /// names.
  ///
  /// # Panics
  ///
  /// Panics if the manager is not in a module level operation.
  pub fn exit_func_scope(&mut self) {
    assert!(self.scope_depth == 1, "not in a module level operation");
    self.scope_depth -= 1;
    self.value_names.clear();
    self.block_names.clear();
    self.next_value_id = 0;
  }

  /// Names the blocks of a region, starting from `^bb0`.
  pub fn name_blocks(&mut self, blocks: &[Block]) {
    for (i, block) in blocks.iter().enumerate() {
      self.block_names.insert(*block, format!("^bb{}", i));
    }
  }

  /// Gets the name of the specific value.
  pub fn value_name(&mut self, value: Value) -> &str {
    let next_id = &mut self.next_value_id;
    self.value_names.entry(value).or_insert_with(|| {
      let name = format!("%{}", next_id);
      *next_id += 1;
      name
    })
  }

  /// Gets the name of the specific block.
  ///
  /// # Panics
  ///
  /// Panics if the block's region has not been named.
  pub fn block_name(&self, block: Block) -> &str {
    self
      .block_names
      .get(&block)
      .expect("block name does not exist")
  }
}

/// A generic generator for FIR modules.
pub struct Generator<W: Write, V: Visitor<W>> {
  writer: W,
  visitor: V,
  name_man: NameManager,
}

impl<W: Write, V: Visitor<W>> Generator<W, V> {
  /// Creates a new generator.
  pub fn new(writer: W) -> Self
  where
    V: Default,
  {
    Self::with_visitor(writer, V::default())
  }

  /// Creates a new generator with the given visitor.
  pub fn with_visitor(writer: W, visitor: V) -> Self {
    Self {
      writer,
      visitor,
      name_man: NameManager::new(),
    }
  }

  /// Consumes and gets the writer.
  pub fn writer(self) -> W {
    self.writer
  }

  /// Generates on the given module.
  pub fn generate_on(&mut self, module: &Module) -> Result<V::Output> {
    self
      .visitor
      .visit(&mut self.writer, &mut self.name_man, module)
  }
}

impl<V: Visitor<File> + Default> Generator<File, V> {
  /// Creates a new generator, which writes to the file at the given path.
  pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
    File::create(path).map(Self::new)
  }
}

/// A visitor for visiting FIR modules.
pub trait Visitor<W: Write> {
  /// The output type of the visitor.
  type Output;

  /// Visits the given module.
  fn visit(&mut self, w: &mut W, nm: &mut NameManager, module: &Module) -> Result<Self::Output>;
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::ir::{OpBuilder, Type};

  #[test]
  fn number_names() {
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let f = b.func("f", Type::get_function(vec![Type::get_i32(); 2], vec![]));
    let entry = b.func_body(f);
    let args = module.block(entry).args().to_vec();
    let mut nm = NameManager::new();
    nm.enter_func_scope();
    nm.name_blocks(&[entry]);
    assert_eq!(nm.value_name(args[1]), "%0");
    assert_eq!(nm.value_name(args[0]), "%1");
    assert_eq!(nm.value_name(args[1]), "%0");
    assert_eq!(nm.block_name(entry), "^bb0");
    nm.exit_func_scope();
    nm.enter_func_scope();
    assert_eq!(nm.value_name(args[0]), "%0");
  }
}
