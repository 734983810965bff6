//! The frontend of text form FIR.
//!
//! This module converts text form FIR into the in-memory form. The
//! [`Lexer`](lexer::Lexer) produces tokens, the [`Parser`](parser::Parser)
//! produces one AST per module level operation, and the
//! [`Builder`](builder::Builder) builds them into a
//! [`Module`](crate::ir::Module). [`Driver`] runs all of them.
//!
//! Errors are reported through the logger in [`span`], and parsing
//! continues after an error until too many errors are generated.
//!
//! # Examples
//!
//! ```
//! use fir::front::Driver;
//!
//! let driver: Driver<_> = r#"
//!   func @id : (i32) -> (i32) {
//!   ^bb0(%0: i32):
//!     return(%0) : (i32) -> ()
//!   }
//! "#
//! .into();
//! let module = driver.generate_module().unwrap();
//! assert!(module.lookup_symbol("id").is_some());
//! ```

pub mod ast;
pub mod builder;
pub mod driver;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

pub use driver::Driver;
