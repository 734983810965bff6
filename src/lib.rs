//! Library for building, parsing, verifying and optimizing FIR, and for
//! building the program flow tree of its front end.
//!
//! FIR is a strongly-typed, SSA form based intermediate representation for
//! Fortran programs. Operations are grouped into blocks and regions, and
//! structured control flow (`fir.do_loop`, `fir.iterate_while`, `fir.if`)
//! lives side by side with explicit branches.
//!
//! # FIR
//!
//! Here is a function in the text form of FIR that sums the integers from
//! 1 to `n`:
//!
//! ```text
//! func @sum : (index) -> (index) {
//! ^bb0(%0: index):
//!   %1 = fir.constant 1 : index
//!   %2 = fir.constant 0 : index
//!   %3 = fir.do_loop %1 to %0 step %1 iter_args(%2 : index) {
//!   ^bb0(%4: index, %5: index):
//!     %6 = fir.addi(%5, %4) : (index, index) -> (index)
//!     fir.result(%6) : (index) -> ()
//!   }
//!   return(%3) : (index) -> ()
//! }
//! ```
//!
//! # Modules
//!
//! * [`ir`]: the in-memory form of FIR, with its types, operation
//!   builders, verifier and folders.
//! * [`front`]: parses the text form into modules.
//! * [`back`]: prints modules in the text form.
//! * [`opt`]: passes on modules.
//! * [`pft`]: the pre-FIR tree, which annotates a source program with the
//!   control flow information needed to lower it.
//! * [`lower`]: type conversion and intrinsic call lowering.
//!
//! # References
//!
//! FIR is the IR of the Flang Fortran compiler, and is an MLIR dialect.
//! This library is influenced by [MLIR](https://mlir.llvm.org/) and
//! [Cranelift](https://wasmtime.dev/).

pub mod back;
pub mod front;
pub mod ir;
pub mod lower;
pub mod opt;
pub mod pft;
