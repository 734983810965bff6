use crate::ir::fold::{self, Folded};
use crate::ir::{Module, OpKind};
use crate::opt::ModulePass;

/// Performs local folding on every operation of a module.
///
/// Folded constants replace the folded operation in place, results folded
/// to existing values have their uses replaced and the operation removed.
/// Runs until nothing can be folded.
#[derive(Default)]
pub struct Folder {
  folded: usize,
}

impl Folder {
  /// Creates a new `Folder`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the number of operations folded so far.
  pub fn folded(&self) -> usize {
    self.folded
  }

  /// Folds every operation once, returns `true` if anything changed.
  fn fold_once(&mut self, module: &mut Module) -> bool {
    let mut changed = false;
    for op in module.walk() {
      // nested operations of removed ones are gone
      if !module.contains_op(op) || module.op(op).kind() == OpKind::Constant {
        continue;
      }
      match fold::fold(module, op) {
        Some(Folded::Constant(value)) => module.replace_with_constant(op, value),
        Some(Folded::Value(value)) => {
          let result = module.op(op).result();
          module.replace_all_uses_with(result, value);
          module.remove_op(op);
        }
        None => continue,
      }
      self.folded += 1;
      changed = true;
    }
    changed
  }
}

impl ModulePass for Folder {
  fn run_on(&mut self, module: &mut Module) {
    while self.fold_once(module) {}
  }
}
