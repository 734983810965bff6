use crate::ir::{Module, OpKind};
use crate::opt::pass::Pass;

/// Manages all registed passes.
pub struct PassManager {
  passes: Vec<Pass>,
}

impl PassManager {
  /// Creates a new `PassManager`.
  pub fn new() -> Self {
    Self { passes: Vec::new() }
  }

  /// Registers a new pass to the current pass manager.
  pub fn register(&mut self, pass: Pass) {
    self.passes.push(pass);
  }

  /// Runs all passes on the specific module, in the order they were
  /// registered. Function passes only run on function definitions.
  pub fn run_passes(&mut self, module: &mut Module) {
    for pass in &mut self.passes {
      match pass {
        Pass::Module(p) => p.run_on(module),
        Pass::Function(p) => {
          let funcs: Vec<_> = module
            .top_ops()
            .iter()
            .copied()
            .filter(|op| module.op(*op).kind() == OpKind::Func && module.region_entry(*op, 0).is_some())
            .collect();
          for func in funcs {
            p.run_on(module, func);
          }
        }
      }
    }
  }
}

impl Default for PassManager {
  fn default() -> Self {
    Self::new()
  }
}

/// Creates a new `PassManager` from a `Vec` of passes.
impl From<Vec<Pass>> for PassManager {
  fn from(passes: Vec<Pass>) -> Self {
    Self { passes }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::ir::{Op, OpBuilder, Type};
  use crate::opt::FunctionPass;
  use std::cell::RefCell;
  use std::rc::Rc;

  struct Collect(Rc<RefCell<Vec<String>>>);

  impl FunctionPass for Collect {
    fn run_on(&mut self, module: &mut Module, func: Op) {
      let name = module.op(func).sym_name().unwrap_or_default().to_string();
      self.0.borrow_mut().push(name);
    }
  }

  #[test]
  fn function_passes_skip_declarations() {
    let mut module = Module::new();
    let mut b = OpBuilder::new(&mut module);
    let ty = Type::get_function(vec![], vec![]);
    b.func("decl", ty.clone());
    let def = b.func("def", ty);
    let entry = b.func_body(def);
    b.with_insertion_point(entry, |b| {
      b.ret(vec![]);
    });
    b.global("g", Type::get_i32(), None, false, None);
    let names = Rc::new(RefCell::new(Vec::new()));
    let mut passman = PassManager::new();
    passman.register(Pass::Function(Box::new(Collect(names.clone()))));
    passman.run_passes(&mut module);
    assert_eq!(*names.borrow(), vec!["def".to_string()]);
  }
}
