//! Passes on FIR modules.
//!
//! Passes are registered to a [`PassManager`], and run in the order they
//! were registered. [`Folder`] is the only built-in pass.
//!
//! # Examples
//!
//! ```
//! use fir::ir::Module;
//! use fir::opt::{Folder, Pass, PassManager};
//!
//! let mut module = Module::new();
//! let mut passman = PassManager::new();
//! passman.register(Pass::Module(Box::new(Folder::new())));
//! passman.run_passes(&mut module);
//! ```

pub mod folder;
pub mod pass;
pub mod passman;

pub use folder::Folder;
pub use pass::{FunctionPass, ModulePass, Pass};
pub use passman::PassManager;
