use crate::ir::{Module, Op};

/// A FIR pass.
///
/// Pass can be a [`ModulePass`] or a [`FunctionPass`].
pub enum Pass {
  Module(Box<dyn ModulePass>),
  Function(Box<dyn FunctionPass>),
}

/// Trait of a module pass.
///
/// Module passes can run on FIR modules.
pub trait ModulePass {
  /// Runs on the specific module.
  fn run_on(&mut self, module: &mut Module);
}

/// Trait of a function pass.
///
/// Function passes can run on function definitions.
pub trait FunctionPass {
  /// Runs on the specific `func` operation of the module.
  fn run_on(&mut self, module: &mut Module, func: Op);
}
