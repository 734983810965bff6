//! Lowering of intrinsic procedure calls.
//!
//! Intrinsics with a handler are lowered inline to FIR operations. All
//! others become calls of math runtime functions. The runtime function is
//! picked from tables of implementations by the [`Distance`] between its
//! signature and the signature of the call. If the best candidate does not
//! match exactly, conversions are inserted around the call.

use crate::ir::{Attr, AttrMap, CmpFPredicate, CmpIPredicate, Op, OpBuilder, OpKind, Type, TypeKind, Value};
use std::cmp::Ordering;
use std::str::FromStr;
use std::{error, fmt};

/// Version of the math runtime used to implement intrinsics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MathRuntimeVersion {
  /// Fast pgmath runtime.
  #[default]
  Fast,
  /// Relaxed pgmath runtime.
  Relaxed,
  /// Precise pgmath runtime.
  Precise,
  /// LLVM intrinsics only, may be incomplete.
  LlvmOnly,
}

impl MathRuntimeVersion {
  /// Returns the name of the version.
  pub fn name(self) -> &'static str {
    match self {
      MathRuntimeVersion::Fast => "fast",
      MathRuntimeVersion::Relaxed => "relaxed",
      MathRuntimeVersion::Precise => "precise",
      MathRuntimeVersion::LlvmOnly => "llvm",
    }
  }

  /// Returns the runtime tables searched by this version, in order.
  fn tables(self) -> &'static [&'static [RuntimeFunction]] {
    match self {
      MathRuntimeVersion::Fast => &[PGMATH_FAST, LLVM_INTRINSICS],
      MathRuntimeVersion::Relaxed => &[PGMATH_RELAXED, LLVM_INTRINSICS],
      MathRuntimeVersion::Precise => &[PGMATH_PRECISE, LLVM_INTRINSICS],
      MathRuntimeVersion::LlvmOnly => &[LLVM_INTRINSICS],
    }
  }
}

impl FromStr for MathRuntimeVersion {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s {
      "fast" => Ok(MathRuntimeVersion::Fast),
      "relaxed" => Ok(MathRuntimeVersion::Relaxed),
      "precise" => Ok(MathRuntimeVersion::Precise),
      "llvm" => Ok(MathRuntimeVersion::LlvmOnly),
      _ => Err(format!("unknown math runtime version `{}`", s)),
    }
  }
}

impl fmt::Display for MathRuntimeVersion {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// A runtime implementation of a generic intrinsic.
#[derive(Clone, Copy)]
pub struct RuntimeFunction {
  /// Generic name of the intrinsic.
  pub name: &'static str,
  /// Symbol of the implementation.
  pub symbol: &'static str,
  signature: fn() -> Type,
}

impl RuntimeFunction {
  /// Returns the function type of the implementation.
  pub fn ty(&self) -> Type {
    (self.signature)()
  }
}

impl fmt::Debug for RuntimeFunction {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{} ({}): {}", self.name, self.symbol, self.ty())
  }
}

/// Declares a table of runtime functions.
macro_rules! runtime_table {
  ($(#[$attr:meta])* $table:ident { $($name:literal => $symbol:literal : $sig:ident,)* }) => {
    $(#[$attr])*
    const $table: &[RuntimeFunction] = &[
      $(RuntimeFunction { name: $name, symbol: $symbol, signature: $sig },)*
    ];
  };
}

fn unary(ty: Type) -> Type {
  Type::get_function(vec![ty.clone()], vec![ty])
}

fn binary(ty: Type) -> Type {
  Type::get_function(vec![ty.clone(), ty.clone()], vec![ty])
}

fn r4_r4() -> Type {
  unary(Type::get_real(4))
}

fn r8_r8() -> Type {
  unary(Type::get_real(8))
}

fn r4r4_r4() -> Type {
  binary(Type::get_real(4))
}

fn r8r8_r8() -> Type {
  binary(Type::get_real(8))
}

fn z4_z4() -> Type {
  unary(Type::get_complex(4))
}

fn z8_z8() -> Type {
  unary(Type::get_complex(8))
}

fn z4_r4() -> Type {
  Type::get_function(vec![Type::get_complex(4)], vec![Type::get_real(4)])
}

fn z8_r8() -> Type {
  Type::get_function(vec![Type::get_complex(8)], vec![Type::get_real(8)])
}

runtime_table! {
  /// Fast version of pgmath.
  PGMATH_FAST {
    "abs" => "__mth_i_cabs": z4_r4,
    "abs" => "__mth_i_cdabs": z8_r8,
    "acos" => "__fs_acos_1": r4_r4,
    "acos" => "__fd_acos_1": r8_r8,
    "atan" => "__fs_atan_1": r4_r4,
    "atan" => "__fd_atan_1": r8_r8,
    "cos" => "__fs_cos_1": r4_r4,
    "cos" => "__fd_cos_1": r8_r8,
    "cos" => "__fc_cos_1": z4_z4,
    "cos" => "__fz_cos_1": z8_z8,
    "exp" => "__fs_exp_1": r4_r4,
    "exp" => "__fd_exp_1": r8_r8,
    "exp" => "__fc_exp_1": z4_z4,
    "exp" => "__fz_exp_1": z8_z8,
    "hypot" => "__mth_i_hypot": r4r4_r4,
    "hypot" => "__mth_i_dhypot": r8r8_r8,
    "log" => "__fs_log_1": r4_r4,
    "log" => "__fd_log_1": r8_r8,
    "mod" => "__fs_mod_1": r4r4_r4,
    "mod" => "__fd_mod_1": r8r8_r8,
    "pow" => "__fs_pow_1": r4r4_r4,
    "pow" => "__fd_pow_1": r8r8_r8,
    "sin" => "__fs_sin_1": r4_r4,
    "sin" => "__fd_sin_1": r8_r8,
    "sin" => "__fc_sin_1": z4_z4,
    "sin" => "__fz_sin_1": z8_z8,
    "sqrt" => "__fs_sqrt_1": r4_r4,
    "sqrt" => "__fd_sqrt_1": r8_r8,
    "tan" => "__fs_tan_1": r4_r4,
    "tan" => "__fd_tan_1": r8_r8,
  }
}

runtime_table! {
  /// Relaxed version of pgmath.
  PGMATH_RELAXED {
    "abs" => "__mth_i_cabs": z4_r4,
    "abs" => "__mth_i_cdabs": z8_r8,
    "acos" => "__rs_acos_1": r4_r4,
    "acos" => "__rd_acos_1": r8_r8,
    "cos" => "__rs_cos_1": r4_r4,
    "cos" => "__rd_cos_1": r8_r8,
    "exp" => "__rs_exp_1": r4_r4,
    "exp" => "__rd_exp_1": r8_r8,
    "hypot" => "__mth_i_hypot": r4r4_r4,
    "hypot" => "__mth_i_dhypot": r8r8_r8,
    "log" => "__rs_log_1": r4_r4,
    "log" => "__rd_log_1": r8_r8,
    "mod" => "__rs_mod_1": r4r4_r4,
    "mod" => "__rd_mod_1": r8r8_r8,
    "pow" => "__rs_pow_1": r4r4_r4,
    "pow" => "__rd_pow_1": r8r8_r8,
    "sin" => "__rs_sin_1": r4_r4,
    "sin" => "__rd_sin_1": r8_r8,
    "sqrt" => "__rs_sqrt_1": r4_r4,
    "sqrt" => "__rd_sqrt_1": r8_r8,
  }
}

runtime_table! {
  /// Precise version of pgmath.
  PGMATH_PRECISE {
    "abs" => "__mth_i_cabs": z4_r4,
    "abs" => "__mth_i_cdabs": z8_r8,
    "acos" => "__ps_acos_1": r4_r4,
    "acos" => "__pd_acos_1": r8_r8,
    "cos" => "__ps_cos_1": r4_r4,
    "cos" => "__pd_cos_1": r8_r8,
    "exp" => "__ps_exp_1": r4_r4,
    "exp" => "__pd_exp_1": r8_r8,
    "hypot" => "__mth_i_hypot": r4r4_r4,
    "hypot" => "__mth_i_dhypot": r8r8_r8,
    "log" => "__ps_log_1": r4_r4,
    "log" => "__pd_log_1": r8_r8,
    "mod" => "__ps_mod_1": r4r4_r4,
    "mod" => "__pd_mod_1": r8r8_r8,
    "pow" => "__ps_pow_1": r4r4_r4,
    "pow" => "__pd_pow_1": r8r8_r8,
    "sin" => "__ps_sin_1": r4_r4,
    "sin" => "__pd_sin_1": r8_r8,
    "sqrt" => "__ps_sqrt_1": r4_r4,
    "sqrt" => "__pd_sqrt_1": r8_r8,
  }
}

runtime_table! {
  /// LLVM intrinsics, searched after the pgmath tables.
  LLVM_INTRINSICS {
    "abs" => "llvm.fabs.f32": r4_r4,
    "abs" => "llvm.fabs.f64": r8_r8,
    "cos" => "llvm.cos.f32": r4_r4,
    "cos" => "llvm.cos.f64": r8_r8,
    "log" => "llvm.log.f32": r4_r4,
    "log" => "llvm.log.f64": r8_r8,
    "log10" => "llvm.log10.f32": r4_r4,
    "log10" => "llvm.log10.f64": r8_r8,
    "sin" => "llvm.sin.f32": r4_r4,
    "sin" => "llvm.sin.f64": r8_r8,
    "sqrt" => "llvm.sqrt.f32": r4_r4,
    "sqrt" => "llvm.sqrt.f64": r8_r8,
  }
}

/// Kind of conversion of a value from one type to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Conversion {
  Forbidden,
  None,
  Narrow,
  Extend,
}

/// Width in bits of a floating point type. Complex types have the width
/// of their parts.
fn float_width(ty: &Type) -> Option<u32> {
  match ty.kind() {
    TypeKind::Real(kind) | TypeKind::Complex(kind) => Some(match kind {
      2 | 3 => 16,
      4 => 32,
      8 => 64,
      // x87 extended precision
      10 => 80,
      16 => 128,
      k => *k as u32 * 8,
    }),
    _ => None,
  }
}

fn conversion(from: &Type, to: &Type) -> Conversion {
  if from == to {
    return Conversion::None;
  }
  let widths = match (from.kind(), to.kind()) {
    (TypeKind::Integer(f), TypeKind::Integer(t)) => Some((*f, *t)),
    (TypeKind::Real(_), TypeKind::Real(_)) | (TypeKind::Complex(_), TypeKind::Complex(_)) => {
      float_width(from).zip(float_width(to))
    }
    // characters and logicals never convert
    _ => None,
  };
  match widths {
    Some((f, t)) if f > t => Conversion::Narrow,
    Some(_) => Conversion::Extend,
    None => Conversion::Forbidden,
  }
}

/// Distance between the signature of a call and the signature of an
/// implementation, measured by the conversions needed to use the
/// implementation instead.
///
/// Distances are ordered by the counts of narrowed arguments, extended
/// results, non-extended results and non-narrowed arguments, compared
/// lexicographically. An implementation that needs a forbidden conversion
/// or has a different number of arguments or results is infinitely far.
/// The distance is not symmetric.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Distance {
  conversions: [u32; 4],
  infinite: bool,
}

impl Distance {
  const NARROWING_ARG: usize = 0;
  const EXTENDING_RESULT: usize = 1;
  const NON_EXTENDING_RESULT: usize = 2;
  const NON_NARROWING_ARG: usize = 3;

  /// Returns an infinite distance.
  pub fn infinite() -> Self {
    Self {
      conversions: [0; 4],
      infinite: true,
    }
  }

  /// Computes the distance from function type `from` to function type `to`.
  pub fn new(from: &Type, to: &Type) -> Self {
    let mut distance = Self {
      conversions: [0; 4],
      infinite: false,
    };
    let ((from_params, from_results), (to_params, to_results)) =
      match (from.function_sig(), to.function_sig()) {
        (Some(from), Some(to)) => (from, to),
        _ => return Self::infinite(),
      };
    if from_params.len() != to_params.len() || from_results.len() != to_results.len() {
      return Self::infinite();
    }
    for (f, t) in from_params.iter().zip(to_params) {
      distance.add(conversion(f, t), Self::NARROWING_ARG, Self::NON_NARROWING_ARG);
    }
    // results convert from the implementation back to the call
    for (f, t) in from_results.iter().zip(to_results) {
      distance.add(conversion(t, f), Self::NON_EXTENDING_RESULT, Self::EXTENDING_RESULT);
    }
    distance
  }

  fn add(&mut self, conv: Conversion, narrow: usize, extend: usize) {
    match conv {
      Conversion::Forbidden => self.infinite = true,
      Conversion::None => {}
      Conversion::Narrow => self.conversions[narrow] += 1,
      Conversion::Extend => self.conversions[extend] += 1,
    }
  }

  /// Checks if the distance is infinite.
  pub fn is_infinite(&self) -> bool {
    self.infinite
  }

  /// Checks if using the implementation narrows an argument or extends a
  /// result.
  pub fn is_losing_precision(&self) -> bool {
    self.conversions[Self::NARROWING_ARG] != 0 || self.conversions[Self::EXTENDING_RESULT] != 0
  }
}

impl PartialOrd for Distance {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Distance {
  fn cmp(&self, other: &Self) -> Ordering {
    match (self.infinite, other.infinite) {
      (true, true) => Ordering::Equal,
      (true, false) => Ordering::Greater,
      (false, true) => Ordering::Less,
      (false, false) => self.conversions.cmp(&other.conversions),
    }
  }
}

/// Error of lowering an intrinsic call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntrinsicError {
  /// No runtime implementation of the intrinsic.
  Missing(String),
  /// The only implementations found would lose precision.
  LosesPrecision(String),
  /// Wrong number of arguments.
  BadArguments(String),
  /// The intrinsic can not be applied to values of the type.
  UnsupportedType(String, Type),
}

impl fmt::Display for IntrinsicError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      IntrinsicError::Missing(name) => write!(f, "missing intrinsic: {}", name),
      IntrinsicError::LosesPrecision(name) => {
        write!(f, "runtime selection of `{}` loses precision", name)
      }
      IntrinsicError::BadArguments(name) => write!(f, "bad arguments of `{}`", name),
      IntrinsicError::UnsupportedType(name, ty) => {
        write!(f, "`{}` does not support type `{}`", name, ty)
      }
    }
  }
}

impl error::Error for IntrinsicError {}

/// Result of intrinsic lowering.
pub type Result<T> = std::result::Result<T, IntrinsicError>;

/// Searches the runtime tables of `version` for the implementation of
/// `name` closest to the function type `ty`.
///
/// An exact match is returned at once. Otherwise, the candidate with the
/// smallest [`Distance`] across all searched tables is returned, unless it
/// loses precision.
pub fn search_runtime(
  version: MathRuntimeVersion,
  name: &str,
  ty: &Type,
) -> Result<Option<&'static RuntimeFunction>> {
  let mut best: Option<(&'static RuntimeFunction, Distance)> = None;
  for table in version.tables() {
    for func in table.iter().filter(|f| f.name == name) {
      let func_ty = func.ty();
      if func_ty == *ty {
        return Ok(Some(func));
      }
      let distance = Distance::new(ty, &func_ty);
      let closer = match &best {
        Some((_, best)) => distance < *best,
        None => !distance.is_infinite(),
      };
      if closer {
        best = Some((func, distance));
      }
    }
  }
  match best {
    Some((_, distance)) if distance.is_losing_precision() => {
      Err(IntrinsicError::LosesPrecision(name.into()))
    }
    Some((func, _)) => Ok(Some(func)),
    None => Ok(None),
  }
}

/// Inline lowering of an intrinsic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Generator {
  Abs,
  Conversion,
  Max,
  Min,
  Mod,
  Sign,
}

impl Generator {
  /// Returns the inline lowering of the named intrinsic, if any.
  fn of(name: &str) -> Option<Self> {
    Some(match name {
      "abs" => Generator::Abs,
      "dble" | "int" | "real" => Generator::Conversion,
      "max" => Generator::Max,
      "min" => Generator::Min,
      "mod" => Generator::Mod,
      "sign" => Generator::Sign,
      _ => return None,
    })
  }
}

/// Options of intrinsic lowering.
#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
  pub math_runtime: MathRuntimeVersion,
  /// Lowers every intrinsic in its own function.
  pub outline_all: bool,
}

/// Generates FIR for intrinsic calls at the insertion point of a builder.
pub struct IntrinsicLibrary<'b, 'm> {
  builder: &'b mut OpBuilder<'m>,
  options: Options,
}

impl<'b, 'm> IntrinsicLibrary<'b, 'm> {
  /// Creates a library that emits operations through the given builder.
  pub fn new(builder: &'b mut OpBuilder<'m>, options: Options) -> Self {
    Self { builder, options }
  }

  /// Generates a call of intrinsic `name` with the given arguments and
  /// result type, returns the result.
  ///
  /// Intrinsics lowered inline are handled first. Other intrinsics become
  /// runtime calls, outlined into wrapper functions named after the
  /// intrinsic and its signature.
  pub fn gen_intrinsic_call(&mut self, name: &str, result_ty: &Type, args: &[Value]) -> Result<Value> {
    match Generator::of(name) {
      Some(generator) if !self.options.outline_all => {
        self.generate(generator, name, result_ty, args)
      }
      generator => self.outline_in_wrapper(generator, name, result_ty, args),
    }
  }

  fn generate(&mut self, generator: Generator, name: &str, result_ty: &Type, args: &[Value]) -> Result<Value> {
    match generator {
      Generator::Abs => self.gen_abs(result_ty, args),
      Generator::Conversion => self.gen_conversion(name, result_ty, args),
      Generator::Max => self.gen_extremum(name, true, args),
      Generator::Min => self.gen_extremum(name, false, args),
      Generator::Mod => self.gen_runtime_call("mod", result_ty, args),
      Generator::Sign => self.gen_sign(result_ty, args),
    }
  }

  fn function_type(&self, result_ty: &Type, args: &[Value]) -> Type {
    let params = args.iter().map(|v| self.builder.module().value_type(*v)).collect();
    Type::get_function(params, vec![result_ty.clone()])
  }

  /// Builds the wrapper function of an intrinsic on first use, and calls
  /// it.
  fn outline_in_wrapper(
    &mut self,
    generator: Option<Generator>,
    name: &str,
    result_ty: &Type,
    args: &[Value],
  ) -> Result<Value> {
    let func_ty = self.function_type(result_ty, args);
    let wrapper = wrapper_name(name, &func_ty)?;
    if let Some(func) = self.builder.module().lookup_symbol(&wrapper) {
      let ty = self.builder.module().op(func).attr("type").and_then(Attr::as_type);
      assert_eq!(ty, Some(&func_ty), "wrapper `{}` has another type", wrapper);
    } else {
      let func = self.declare(&wrapper, func_ty, "fir.intrinsic");
      let entry = self.builder.func_body(func);
      let params = self.builder.module().block(entry).args().to_vec();
      let options = self.options;
      let generated = {
        let mut guard = self.builder.scoped(entry);
        let mut local = IntrinsicLibrary {
          builder: &mut guard,
          options,
        };
        let result = match generator {
          Some(generator) => local.generate(generator, name, result_ty, &params),
          None => local.gen_runtime_call(name, result_ty, &params),
        };
        result.map(|result| local.builder.ret(vec![result]))
      };
      if let Err(e) = generated {
        self.builder.module_mut().remove_op(func);
        return Err(e);
      }
    }
    Ok(self.call(&wrapper, args.to_vec(), result_ty.clone()))
  }

  /// Declares a function at module level with a unit attribute.
  fn declare(&mut self, name: &str, ty: Type, flag: &str) -> Op {
    let module = self.builder.module_mut();
    let mut attrs = AttrMap::new();
    attrs.insert("sym_name".into(), Attr::Str(name.into()));
    attrs.insert("type".into(), Attr::Type(ty));
    attrs.insert(flag.into(), Attr::Unit);
    let func = module.new_op(OpKind::Func, vec![], vec![], attrs, 1, vec![]);
    module.push_top(func);
    func
  }

  fn call(&mut self, callee: &str, args: Vec<Value>, result_ty: Type) -> Value {
    let call = self.builder.call(callee, args, vec![result_ty]);
    self.builder.module().op(call).result()
  }

  /// Calls the runtime implementation of `name` closest to the signature
  /// given by the arguments and the result type, converting arguments and
  /// result where the implementation differs.
  fn gen_runtime_call(&mut self, name: &str, result_ty: &Type, args: &[Value]) -> Result<Value> {
    let sought = self.function_type(result_ty, args);
    let func = search_runtime(self.options.math_runtime, name, &sought)?
      .ok_or_else(|| IntrinsicError::Missing(name.into()))?;
    let actual = func.ty();
    let (params, results) = actual.function_sig().expect("runtime type is a function");
    if params.len() != args.len() || results.len() != 1 {
      panic!("bad intrinsic match of `{}`", name);
    }
    if self.builder.module().lookup_symbol(func.symbol).is_none() {
      self.declare(func.symbol, actual.clone(), "fir.runtime");
    }
    let converted = args
      .iter()
      .zip(params)
      .map(|(arg, param)| {
        if self.builder.module().value_type(*arg) != *param {
          self.builder.convert(*arg, param.clone())
        } else {
          *arg
        }
      })
      .collect();
    let result = self.call(func.symbol, converted, results[0].clone());
    Ok(if results[0] != *result_ty {
      self.builder.convert(result, result_ty.clone())
    } else {
      result
    })
  }

  /// Yields `then_value` if `cond` holds, `else_value` otherwise.
  fn select(&mut self, cond: Value, then_value: Value, else_value: Value) -> Value {
    let ty = self.builder.module().value_type(then_value);
    let op = self.builder.if_op(cond, vec![ty], true);
    let module = self.builder.module();
    let regions = module.op(op).regions().to_vec();
    let then_block = module.region(regions[0]).entry().expect("then block does not exist");
    let else_block = module.region(regions[1]).entry().expect("else block does not exist");
    self.builder.with_insertion_point(then_block, |b| b.result(vec![then_value]));
    self.builder.with_insertion_point(else_block, |b| b.result(vec![else_value]));
    self.builder.module().op(op).result()
  }

  fn check_args(name: &str, args: &[Value], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
      Err(IntrinsicError::BadArguments(name.into()))
    } else {
      Ok(())
    }
  }

  fn gen_abs(&mut self, result_ty: &Type, args: &[Value]) -> Result<Value> {
    Self::check_args("abs", args, 1, 1)?;
    let arg = args[0];
    let ty = self.builder.module().value_type(arg);
    match ty.kind() {
      TypeKind::Integer(_) => {
        let zero = self.builder.const_int(ty.clone(), 0);
        let neg = self.builder.binary(OpKind::SubI, zero, arg);
        let lt = self.builder.cmpi(CmpIPredicate::Slt, arg, zero);
        Ok(self.select(lt, neg, arg))
      }
      TypeKind::Real(_) | TypeKind::Complex(_) => self.gen_runtime_call("abs", result_ty, args),
      _ => Err(IntrinsicError::UnsupportedType("abs".into(), ty)),
    }
  }

  /// Conversions like DBLE. The KIND argument is already reflected in the
  /// result type.
  fn gen_conversion(&mut self, name: &str, result_ty: &Type, args: &[Value]) -> Result<Value> {
    Self::check_args(name, args, 1, 2)?;
    Ok(self.builder.convert(args[0], result_ty.clone()))
  }

  /// MIN and MAX. If the left operand is a NaN, the right one is the result.
  fn gen_extremum(&mut self, name: &str, max: bool, args: &[Value]) -> Result<Value> {
    Self::check_args(name, args, 2, usize::MAX)?;
    let mut result = args[0];
    for arg in &args[1..] {
      let ty = self.builder.module().value_type(result);
      let mask = match ty.kind() {
        TypeKind::Integer(_) => {
          let pred = if max { CmpIPredicate::Sgt } else { CmpIPredicate::Slt };
          self.builder.cmpi(pred, result, *arg)
        }
        TypeKind::Real(_) => {
          let pred = if max { CmpFPredicate::Ogt } else { CmpFPredicate::Olt };
          self.builder.cmpf(pred, result, *arg)
        }
        _ => return Err(IntrinsicError::UnsupportedType(name.into(), ty)),
      };
      result = self.select(mask, result, *arg);
    }
    Ok(result)
  }

  fn gen_sign(&mut self, result_ty: &Type, args: &[Value]) -> Result<Value> {
    Self::check_args("sign", args, 2, 2)?;
    let abs = self.gen_abs(result_ty, &args[..1])?;
    let (neg, cmp) = match result_ty.kind() {
      TypeKind::Integer(_) => {
        let zero = self.builder.const_int(result_ty.clone(), 0);
        let neg = self.builder.binary(OpKind::SubI, zero, abs);
        (neg, self.builder.cmpi(CmpIPredicate::Slt, args[1], zero))
      }
      TypeKind::Real(_) => {
        let zero = self.builder.const_float(result_ty.clone(), 0.0);
        let neg = self.builder.binary(OpKind::SubF, zero, abs);
        (neg, self.builder.cmpf(CmpFPredicate::Olt, args[1], zero))
      }
      _ => return Err(IntrinsicError::UnsupportedType("sign".into(), result_ty.clone())),
    };
    Ok(self.select(cmp, neg, abs))
  }
}

/// Encodes a type for wrapper names.
fn type_code(ty: &Type) -> Option<String> {
  Some(match ty.kind() {
    TypeKind::Integer(bits) => format!("i{}", bits),
    TypeKind::Index => "idx".into(),
    TypeKind::Real(kind) => format!("r{}", kind),
    TypeKind::Complex(kind) => format!("z{}", kind),
    TypeKind::Logical(kind) => format!("l{}", kind),
    TypeKind::Character(kind) => format!("c{}", kind),
    _ => return None,
  })
}

/// Returns the name of the wrapper of an intrinsic, which is not a legal
/// source name: `fir.<name>.<result>.<args>...`.
fn wrapper_name(name: &str, func_ty: &Type) -> Result<String> {
  let (params, results) = func_ty.function_sig().expect("not a function type");
  let mut wrapper = format!("fir.{}", name);
  for ty in results.iter().chain(params) {
    let code = type_code(ty).ok_or_else(|| IntrinsicError::UnsupportedType(name.into(), ty.clone()))?;
    wrapper.push('.');
    wrapper.push_str(&code);
  }
  Ok(wrapper)
}
