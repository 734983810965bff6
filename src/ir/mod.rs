//! The in-memory form of FIR.
//!
//! A [`Module`] owns all operations ([`Op`]), values ([`Value`]), blocks
//! ([`Block`]) and regions ([`Region`]). Operations are created by an
//! [`OpBuilder`], checked by the [verifier](verify), and simplified by
//! [folders](fold).
//!
//! # Examples
//!
//! Build a function that adds two constants, and verify it:
//!
//! ```
//! use fir::ir::*;
//!
//! let mut module = Module::new();
//! let mut builder = OpBuilder::new(&mut module);
//! let func = builder.func("add", Type::get_function(vec![], vec![Type::get_real(4)]));
//! let entry = builder.func_body(func);
//! builder.with_insertion_point(entry, |b| {
//!   let lhs = b.const_float(Type::get_real(4), 1.0);
//!   let rhs = b.const_float(Type::get_real(4), 2.0);
//!   let sum = b.binary(OpKind::AddF, lhs, rhs);
//!   b.ret(vec![sum]);
//! });
//! verify::verify(&module).unwrap();
//! ```

pub mod access;
pub mod attrs;
pub mod builder;
pub mod compare;
pub mod entities;
pub mod fold;
pub mod layout;
pub mod module;
pub mod ops;
pub mod segments;
pub mod types;
pub mod verify;

mod idman;

pub use access::{LoopParts, SelectParts};
pub use attrs::{Attr, AttrMap, CaseTag};
pub use builder::{Case, InsertionGuard, OpBuilder};
pub use entities::{Block, BlockData, Op, OpData, Region, RegionData, Value, ValueData, ValueDef};
pub use module::Module;
pub use ops::{CmpFPredicate, CmpIPredicate, Linkage, OpKind};
pub use segments::{SegmentError, SegmentedList};
pub use types::{Extent, RecordBody, Type, TypeFamily, TypeKind};
