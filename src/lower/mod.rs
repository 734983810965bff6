//! Helpers of lowering source programs to FIR.
//!
//! [`convert_type`] maps the types of source symbols and variables to FIR
//! types. [`intrinsics`] lowers calls of intrinsic procedures, either
//! inline or as calls of the best matching math runtime function.

pub mod convert_type;
pub mod intrinsics;

pub use convert_type::{intrinsic_type, DefaultKinds, TypeConverter};
pub use intrinsics::{search_runtime, Distance, IntrinsicLibrary, MathRuntimeVersion};
