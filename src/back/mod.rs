//! The backend of the in-memory form FIR.
//!
//! This module provides generators for generating in-memory form FIR to
//! other forms, including:
//!
//! * The generic generator ([`Generator`]), name manager
//!   ([`NameManager`]) and the visitor trait ([`Visitor`]).
//! * The text form FIR generator ([`FirGenerator`]).
//!
//! # Examples
//!
//! Convert the in-memory form FIR into the text form:
//!
//! ```
//! use fir::back::FirGenerator;
//! use fir::ir::*;
//!
//! let mut module = Module::new();
//! let mut b = OpBuilder::new(&mut module);
//! let i32_ty = Type::get_i32();
//! let main = b.func("main", Type::get_function(vec![], vec![i32_ty.clone()]));
//! let entry = b.func_body(main);
//! b.with_insertion_point(entry, |b| {
//!   let lhs = b.const_int(i32_ty.clone(), 11);
//!   let rhs = b.const_int(i32_ty.clone(), 31);
//!   let add = b.binary(OpKind::AddI, lhs, rhs);
//!   b.ret(vec![add]);
//! });
//!
//! // convert to text form
//! let mut gen = FirGenerator::new(Vec::new());
//! gen.generate_on(&module).unwrap();
//! let text_form_ir = String::from_utf8(gen.writer()).unwrap();
//! println!("{}", text_form_ir);
//! ```
//!
//! Save the text form to a file:
//!
//! ```no_run
//! use fir::back::FirGenerator;
//!
//! # fn main() -> std::io::Result<()> {
//! # let module = fir::ir::Module::new();
//! let mut gen = FirGenerator::from_path("/path/to/the/output/file")?;
//! gen.generate_on(&module)?;
//! # Ok(())
//! # }
//! ```

pub mod fir;
pub mod generator;

pub use generator::{Generator, NameManager, Visitor};

/// Generator for generating FIR into text form FIR.
pub type FirGenerator<W> = Generator<W, fir::Visitor>;
