//! Pre-FIR tree (PFT) of source programs.
//!
//! The PFT is built from the syntax tree of a program in two passes. The
//! first pass creates an [`Evaluation`] for every statement, construct and
//! directive, links executable statements in source order and records
//! labels. The second pass analyzes the branches of each function-like
//! unit, and decides which constructs can be lowered to structured FIR
//! operations such as `fir.do_loop` and `fir.if`, and which need explicit
//! blocks and branches.
//!
//! # Example
//!
//! ```
//! use fir::pft::syntax::*;
//! use fir::pft::{self, Options, Unit};
//!
//! // do while (x > 0); x = x - 1; end do
//! let arms = vec![Arm::new(
//!   Statement::new("do while (x > 0)", ConstructStmt::Do {
//!     name: None,
//!     control: Some(LoopControl::While),
//!   }),
//!   vec![Node::action("x = x - 1", ActionStmt::Assignment)],
//! )];
//! let end = Statement::new("end do", ConstructStmt::EndDo(None));
//! let body = vec![Node::construct(ConstructKind::Do, arms, end)];
//! let sub = Subprogram::new(SubprogramKind::Subroutine, Some("s"), Scope::new(), body);
//! let program = Program { units: vec![ProgramUnit::Subprogram(sub)] };
//!
//! let tree = pft::create_pft(&program, &Options::default());
//! let func = match tree.units()[0] {
//!   Unit::Function(func) => func,
//!   _ => unreachable!(),
//! };
//! // while loops need explicit blocks
//! let construct = tree.func(func).evaluations[0];
//! assert!(tree[construct].is_unstructured);
//! ```

mod branches;
mod builder;
pub mod dump;
mod legacy;
mod program;
pub mod syntax;
pub mod variables;

pub use builder::create_pft;
pub use program::{
  BlockDataUnit, EvalId, EvalNode, Evaluation, FuncId, FunctionLikeUnit, ModuleLikeUnit, Parent,
  Program, Unit,
};
pub use variables::Variable;

/// Options of building the PFT.
#[derive(Clone, Debug)]
pub struct Options {
  /// Allows constructs without unstructured control flow to be lowered to
  /// structured operations. If disabled, every evaluation is lowered as
  /// unstructured.
  pub structured_lowering: bool,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      structured_lowering: true,
    }
  }
}
