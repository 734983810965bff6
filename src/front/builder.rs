use crate::front::ast::{self, AstBox, AstKind, Name, Operand, Operation};
use crate::front::span::Span;
use crate::ir::{Block, Module, Op, Region, Value};
use std::collections::HashMap;

/// Builder for building FIR modules from ASTs.
///
/// Value names are scoped by module level operations, block names by
/// regions. Uses of values that are defined later are bound to
/// placeholders, which are replaced once the definition is built.
pub struct Builder {
  module: Module,
  values: HashMap<String, Value>,
  forward: HashMap<String, (Value, Span)>,
  scopes: Vec<BlockScope>,
}

/// Blocks of the region being built.
struct BlockScope {
  region: Region,
  blocks: HashMap<String, BlockInfo>,
}

/// Block information.
struct BlockInfo {
  block: Block,
  span: Span,
  defined: bool,
}

/// Logs an error at the given span.
fn error(span: Span, message: &str) {
  let _ = span.log_error::<()>(message);
}

impl Builder {
  /// Creates a new builder.
  pub fn new() -> Self {
    Self {
      module: Module::new(),
      values: HashMap::new(),
      forward: HashMap::new(),
      scopes: Vec::new(),
    }
  }

  /// Builds the specific module level AST into IR.
  pub fn build_on(&mut self, ast: &AstBox) {
    if let AstKind::Op(op) = &ast.kind {
      self.values.clear();
      self.forward.clear();
      self.build_op(ast.span, op, None);
      // report the remaining forward references
      let mut undefined: Vec<_> = self.forward.drain().collect();
      undefined.sort_by(|(l, _), (r, _)| l.cmp(r));
      for (name, (_, span)) in undefined {
        error(span, &format!("use of undefined value '{}'", name));
      }
    }
  }

  /// Consumes and get the generated module.
  pub fn module(self) -> Module {
    self.module
  }

  /// Builds on operations.
  fn build_op(&mut self, span: Span, ast: &Operation, block: Option<Block>) -> Op {
    let operands = ast.operands.iter().map(|o| self.use_value(o)).collect();
    let successors = ast
      .successors
      .iter()
      .filter_map(|s| self.use_block(s))
      .collect();
    let op = self.module.new_op(
      ast.kind,
      operands,
      ast.result_tys.clone(),
      ast.attrs.clone(),
      ast.regions.len(),
      successors,
    );
    self.module.set_span(op, span);
    match block {
      Some(block) => self.module.append_op(block, op),
      None => self.module.push_top(op),
    }
    let regions = self.module.op(op).regions().to_vec();
    for (region, region_ast) in regions.into_iter().zip(&ast.regions) {
      self.build_region(region, region_ast);
    }
    let results = self.module.op(op).results().to_vec();
    for (name, value) in ast.results.iter().zip(results) {
      self.define(name, value);
    }
    op
  }

  /// Builds on regions.
  fn build_region(&mut self, region: Region, ast: &ast::Region) {
    self.scopes.push(BlockScope {
      region,
      blocks: HashMap::new(),
    });
    for block_ast in &ast.blocks {
      if let Some(block) = self.define_block(block_ast) {
        for op in &block_ast.ops {
          if let AstKind::Op(op_ast) = &op.kind {
            self.build_op(op.span, op_ast, Some(block));
          }
        }
      }
    }
    let scope = self.scopes.pop().expect("block scope does not exist");
    let mut undefined: Vec<_> = scope.blocks.into_iter().filter(|(_, b)| !b.defined).collect();
    undefined.sort_by(|(l, _), (r, _)| l.cmp(r));
    for (name, info) in undefined {
      error(info.span, &format!("use of undefined block '{}'", name));
    }
  }

  /// Places the block defined by the given header, and defines its
  /// arguments. Returns `None` if the block has already been defined.
  fn define_block(&mut self, ast: &ast::Block) -> Option<Block> {
    let scope = self.scopes.last_mut().expect("block scope does not exist");
    let block = match scope.blocks.get_mut(&ast.name) {
      Some(info) if info.defined => {
        error(ast.span, &format!("redefinition of block '{}'", ast.name));
        return None;
      }
      Some(info) => {
        // referenced before, arguments are only known now
        info.defined = true;
        let block = info.block;
        for arg in &ast.args {
          self.module.add_block_arg(block, arg.ty.clone());
        }
        block
      }
      None => {
        let tys = ast.args.iter().map(|a| a.ty.clone()).collect();
        let block = self.module.new_detached_block(scope.region, tys);
        let info = BlockInfo {
          block,
          span: ast.span,
          defined: true,
        };
        scope.blocks.insert(ast.name.clone(), info);
        block
      }
    };
    self.module.place_block(block);
    let args = self.module.block(block).args().to_vec();
    for (arg, value) in ast.args.iter().zip(args) {
      let name = Name {
        span: arg.span,
        name: arg.name.clone(),
      };
      self.define(&name, value);
    }
    Some(block)
  }

  /// Returns the value referred to by the given operand, or a placeholder
  /// if it has not been defined yet.
  fn use_value(&mut self, operand: &Operand) -> Value {
    let known = self
      .values
      .get(&operand.name)
      .or_else(|| self.forward.get(&operand.name).map(|(v, _)| v))
      .copied();
    match known {
      Some(value) => {
        let ty = self.module.value_type(value);
        if ty != operand.ty {
          error(
            operand.span,
            &format!("'{}' has type '{}', but is used as '{}'", operand.name, ty, operand.ty),
          );
        }
        value
      }
      None => {
        let value = self.module.new_placeholder(operand.ty.clone());
        self
          .forward
          .insert(operand.name.clone(), (value, operand.span));
        value
      }
    }
  }

  /// Returns the block referred to by the given successor.
  fn use_block(&mut self, name: &Name) -> Option<Block> {
    let scope = match self.scopes.last_mut() {
      Some(scope) => scope,
      None => {
        error(name.span, "successors are only allowed inside of regions");
        return None;
      }
    };
    if let Some(info) = scope.blocks.get(&name.name) {
      return Some(info.block);
    }
    let block = self.module.new_detached_block(scope.region, vec![]);
    let info = BlockInfo {
      block,
      span: name.span,
      defined: false,
    };
    scope.blocks.insert(name.name.clone(), info);
    Some(block)
  }

  /// Binds the given name to the given value.
  fn define(&mut self, name: &Name, value: Value) {
    if self.values.contains_key(&name.name) {
      error(name.span, &format!("redefinition of value '{}'", name.name));
      return;
    }
    if let Some((placeholder, _)) = self.forward.remove(&name.name) {
      let (used, defined) = (
        self.module.value_type(placeholder),
        self.module.value_type(value),
      );
      if used != defined {
        error(
          name.span,
          &format!(
            "'{}' is defined as '{}', but was used as '{}'",
            name.name, defined, used
          ),
        );
      }
      self.module.replace_all_uses_with(placeholder, value);
      self.module.remove_placeholder(placeholder);
    }
    self.values.insert(name.name.clone(), value);
  }
}

impl Default for Builder {
  fn default() -> Self {
    Self::new()
  }
}
