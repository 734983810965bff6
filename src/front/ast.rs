//! Abstract syntax tree of text form FIR.
//!
//! Custom operation syntax is normalized by the parser, so every
//! operation is described by the same [`Operation`] structure: flat typed
//! operands (successor arguments included), result types, attributes
//! (operand offsets included), regions and successors.

use crate::front::span::Span;
use crate::ir::{AttrMap, OpKind, Type};

/// AST of FIR.
#[derive(Debug)]
pub struct Ast {
  pub span: Span,
  pub kind: AstKind,
}

/// Box of AST.
pub type AstBox = Box<Ast>;

impl Ast {
  /// Creates a new operation AST.
  pub fn op(span: Span, op: Operation) -> AstBox {
    Box::new(Self {
      span,
      kind: AstKind::Op(op),
    })
  }

  /// Creates a new error AST, covering tokens skipped by error recovery.
  pub fn error(span: Span) -> AstBox {
    Box::new(Self {
      span,
      kind: AstKind::Error,
    })
  }

  /// Creates a new end of file AST.
  pub fn end(span: Span) -> AstBox {
    Box::new(Self {
      span,
      kind: AstKind::End,
    })
  }
}

/// Kind of AST.
#[derive(Debug)]
pub enum AstKind {
  /// Operation.
  Op(Operation),
  /// Error, already reported.
  Error,
  /// End of file.
  End,
}

/// An operation.
#[derive(Debug)]
pub struct Operation {
  pub kind: OpKind,
  pub results: Vec<Name>,
  pub result_tys: Vec<Type>,
  pub operands: Vec<Operand>,
  pub attrs: AttrMap,
  pub regions: Vec<Region>,
  pub successors: Vec<Name>,
}

impl Operation {
  /// Creates a new operation with no results, regions or successors.
  pub fn new(kind: OpKind, operands: Vec<Operand>, attrs: AttrMap) -> Self {
    Self {
      kind,
      results: Vec::new(),
      result_tys: Vec::new(),
      operands,
      attrs,
      regions: Vec::new(),
      successors: Vec::new(),
    }
  }
}

/// A name of a value or a block, with its span.
#[derive(Clone, Debug)]
pub struct Name {
  pub span: Span,
  pub name: String,
}

/// A typed reference to a value, or a typed block argument.
#[derive(Clone, Debug)]
pub struct Operand {
  pub span: Span,
  pub name: String,
  pub ty: Type,
}

/// A region.
#[derive(Debug, Default)]
pub struct Region {
  pub blocks: Vec<Block>,
}

/// A block with its header.
#[derive(Debug)]
pub struct Block {
  pub span: Span,
  pub name: String,
  pub args: Vec<Operand>,
  pub ops: Vec<AstBox>,
}
