use fir::back::FirGenerator;
use fir::front::Driver;
use fir::ir::compare::modules_equal;
use fir::ir::fold::constant_value;
use fir::ir::*;
use fir::lower::{DefaultKinds, TypeConverter};
use fir::opt::{Folder, Pass, PassManager};
use fir::pft::syntax::{
  ActionStmt, Arm, Bounds, ConstructKind, ConstructStmt, Details, Expr, LoopControl, Node,
  ObjectDetails, Program, ProgramUnit, Scope, Statement, Subprogram, SubprogramKind, Symbol,
  TypeCategory,
};
use fir::pft::{self, Options, Unit};

fn print(module: &Module) -> String {
  let mut gen = FirGenerator::new(Vec::new());
  gen.generate_on(module).unwrap();
  String::from_utf8(gen.writer()).unwrap()
}

fn parse(text: String) -> Module {
  let driver: Driver<_> = text.into();
  driver.generate_module().unwrap()
}

/// Sums the elements of an array with a counting loop, then classifies
/// the sum with a multi-way branch.
fn build_module() -> Module {
  let mut module = Module::new();
  let mut b = OpBuilder::new(&mut module);
  let f32_ty = Type::get_real(4);
  let arr_ty = Type::get_ref(Type::get_sequence(vec![Extent::Unknown], f32_ty.clone()));
  b.global("total", f32_ty.clone(), Some(Linkage::Common), false, Some(Attr::Float(0.0)));
  let func = b.func(
    "sum",
    Type::get_function(vec![arr_ty, Type::get_index()], vec![Type::get_i32()]),
  );
  let entry = b.func_body(func);
  let region = b.module().block(entry).region();
  let n = b.module().block(entry).args()[1];
  let positive = b.module_mut().new_block(region, vec![Type::get_i32()]);
  let other = b.module_mut().new_block(region, vec![]);
  b.with_insertion_point(entry, |b| {
    let one = b.const_int(Type::get_index(), 1);
    let zero = b.const_float(f32_ty.clone(), 0.0);
    let lp = b.do_loop(one, n, one, false, vec![zero]);
    let body = b.module().region_entry(lp, 0).unwrap();
    let acc = b.module().block(body).args()[1];
    b.with_insertion_point(body, |b| {
      let two = b.const_float(f32_ty.clone(), 2.0);
      let next = b.binary(OpKind::AddF, acc, two);
      b.result(vec![next]);
    });
    let sum = b.module().op(lp).result();
    let gt = b.cmpf(CmpFPredicate::Ogt, sum, zero);
    let sel = b.if_op(gt, vec![Type::get_i32()], true);
    let then_block = b.module().region_entry(sel, 0).unwrap();
    let else_block = b.module().region_entry(sel, 1).unwrap();
    b.with_insertion_point(then_block, |b| {
      let v = b.const_int(Type::get_i32(), 1);
      b.result(vec![v]);
    });
    b.with_insertion_point(else_block, |b| {
      let v = b.const_int(Type::get_i32(), 0);
      b.result(vec![v]);
    });
    let flag = b.module().op(sel).result();
    let cases = vec![
      Case::with_operands(CaseTag::Point, vec![flag], positive, vec![flag]),
      Case::otherwise(other, vec![]),
    ];
    b.select(OpKind::SelectCase, flag, cases);
  });
  b.with_insertion_point(positive, |b| {
    let v = b.module().block(positive).args()[0];
    b.ret(vec![v]);
  });
  b.with_insertion_point(other, |b| {
    let v = b.const_int(Type::get_i32(), -1);
    b.ret(vec![v]);
  });
  let table = b.dispatch_table("point_t");
  let table_entry = b.module().region_entry(table, 0).unwrap();
  b.with_insertion_point(table_entry, |b| {
    b.dt_entry("norm", "sum");
  });
  module
}

#[test]
fn print_then_parse() {
  let module = build_module();
  verify::verify(&module).unwrap();
  let text = print(&module);
  let parsed = parse(text.clone());
  verify::verify(&parsed).unwrap();
  assert!(modules_equal(&module, &parsed));
  // printing is stable
  assert_eq!(print(&parsed), text);
}

/// Linear congruential generator, enough to vary the generated modules.
struct Lcg(u64);

impl Lcg {
  fn below(&mut self, n: u64) -> u64 {
    self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (self.0 >> 33) % n
  }
}

/// Creates `count` blocks with random arities of `ty` arguments, each
/// ending with a return.
fn dest_blocks(
  b: &mut OpBuilder,
  rng: &mut Lcg,
  region: Region,
  ty: &Type,
  count: usize,
) -> Vec<Block> {
  (0..count)
    .map(|_| {
      let arity = rng.below(3) as usize;
      let block = b.module_mut().new_block(region, vec![ty.clone(); arity]);
      b.with_insertion_point(block, |b| b.ret(vec![]));
      block
    })
    .collect()
}

fn arity(module: &Module, block: Block) -> usize {
  module.block(block).args().len()
}

fn gen_iterate_while(b: &mut OpBuilder, rng: &mut Lcg) {
  let func = b.func("iw", Type::get_function(vec![Type::get_index()], vec![]));
  let entry = b.func_body(func);
  let carried = rng.below(4) as usize;
  b.with_insertion_point(entry, |b| {
    let n = b.module().block(entry).args()[0];
    let one = b.const_int(Type::get_index(), 1);
    let ok = b.const_int(Type::get_i1(), 1);
    let inits = (0..carried).map(|i| b.const_float(Type::get_real(4), i as f64)).collect();
    let lp = b.iterate_while(one, n, one, ok, inits);
    let body = b.module().region_entry(lp, 0).unwrap();
    let args = b.module().block(body).args()[1..].to_vec();
    b.with_insertion_point(body, |b| b.result(args));
    b.ret(vec![]);
  });
}

fn gen_select_type(b: &mut OpBuilder, rng: &mut Lcg) {
  let boxed = Type::get_box(Type::get_real(4));
  let func = b.func("st", Type::get_function(vec![boxed, Type::get_i32()], vec![]));
  let entry = b.func_body(func);
  let region = b.module().block(entry).region();
  let count = 1 + rng.below(4) as usize;
  let dests = dest_blocks(b, rng, region, &Type::get_i32(), count);
  let guards = [
    Type::get_real(4),
    Type::get_i64(),
    Type::get_record("gen_shape_t"),
    Type::get_char(1),
  ];
  let cases = dests
    .iter()
    .enumerate()
    .map(|(i, dest)| {
      let v = b.module().block(entry).args()[1];
      let args = vec![v; arity(b.module(), *dest)];
      match i + 1 == count {
        true => Case::otherwise(*dest, args),
        false => Case::new(Attr::Type(guards[rng.below(4) as usize].clone()), *dest, args),
      }
    })
    .collect();
  b.with_insertion_point(entry, |b| {
    let selector = b.module().block(entry).args()[0];
    b.select(OpKind::SelectType, selector, cases);
  });
}

fn gen_select_rank(b: &mut OpBuilder, rng: &mut Lcg) {
  let func = b.func("sr", Type::get_function(vec![Type::get_i32()], vec![]));
  let entry = b.func_body(func);
  let region = b.module().block(entry).region();
  let count = 1 + rng.below(5) as usize;
  let dests = dest_blocks(b, rng, region, &Type::get_i32(), count);
  let selector = b.module().block(entry).args()[0];
  let cases = dests
    .iter()
    .enumerate()
    .map(|(rank, dest)| {
      let args = vec![selector; arity(b.module(), *dest)];
      match rank + 1 == count && rng.below(2) == 0 {
        true => Case::otherwise(*dest, args),
        false => Case::new(Attr::Int(rank as i64), *dest, args),
      }
    })
    .collect();
  b.with_insertion_point(entry, |b| {
    b.select(OpKind::SelectRank, selector, cases);
  });
}

fn gen_global(b: &mut OpBuilder, rng: &mut Lcg) {
  let linkage = match rng.below(4) {
    0 => None,
    1 => Some(Linkage::Internal),
    2 => Some(Linkage::Common),
    _ => Some(Linkage::Weak),
  };
  let constant = rng.below(2) == 0;
  let global = b.global("gen_g", Type::get_real(8), linkage, constant, None);
  let body = b.global_body(global);
  let value = rng.below(100) as f64 / 4.0;
  b.with_insertion_point(body, |b| {
    let v = b.const_float(Type::get_real(8), value);
    b.has_value(v);
  });
}

fn gen_cond_br(b: &mut OpBuilder, rng: &mut Lcg) {
  let params = vec![Type::get_i1(), Type::get_index()];
  let func = b.func("cb", Type::get_function(params, vec![]));
  let entry = b.func_body(func);
  let region = b.module().block(entry).region();
  let dests = dest_blocks(b, rng, region, &Type::get_index(), 2);
  b.with_insertion_point(entry, |b| {
    let args = b.module().block(entry).args().to_vec();
    let then_args = vec![args[1]; arity(b.module(), dests[0])];
    let else_args = vec![args[1]; arity(b.module(), dests[1])];
    b.cond_br(args[0], dests[0], then_args, dests[1], else_args);
  });
}

fn gen_cmpi(b: &mut OpBuilder, rng: &mut Lcg) {
  let params = vec![Type::get_i32(), Type::get_i32()];
  let func = b.func("ci", Type::get_function(params, vec![Type::get_i1()]));
  let entry = b.func_body(func);
  let pred = CmpIPredicate::from_index(rng.below(10) as i64).unwrap();
  b.with_insertion_point(entry, |b| {
    let args = b.module().block(entry).args().to_vec();
    let c = b.cmpi(pred, args[0], args[1]);
    b.ret(vec![c]);
  });
}

#[test]
fn generated_custom_syntax() {
  let builders: [(&str, fn(&mut OpBuilder, &mut Lcg)); 6] = [
    ("iterate_while", gen_iterate_while),
    ("select_type", gen_select_type),
    ("select_rank", gen_select_rank),
    ("global", gen_global),
    ("cond_br", gen_cond_br),
    ("cmpi", gen_cmpi),
  ];
  for (name, build) in builders {
    for seed in 0..16 {
      let mut rng = Lcg(seed);
      let mut module = Module::new();
      build(&mut OpBuilder::new(&mut module), &mut rng);
      let text = print(&module);
      let parsed = parse(text.clone());
      assert!(modules_equal(&module, &parsed), "{} (seed {}):\n{}", name, seed, text);
    }
  }
}

#[test]
fn select_offsets_survive() {
  let parsed = parse(print(&build_module()));
  let func = parsed.lookup_symbol("sum").unwrap();
  let entry = parsed.region_entry(func, 0).unwrap();
  let select = parsed.terminator(entry).unwrap();
  assert_eq!(parsed.op(select).kind(), OpKind::SelectCase);
  let parts = parsed.select_parts(select);
  assert_eq!(parts.dests.len(), 2);
  assert_eq!(parts.compare.segment(0).len(), 1);
  assert!(parts.compare.segment(1).is_empty());
  assert_eq!(parts.targets.segment(0).len(), 1);
  assert!(parts.targets.segment(1).is_empty());
}

#[test]
fn fold_parsed_module() {
  let text = r#"
    func @f : () -> (f64) {
    ^bb0:
      %0 = fir.constant 1.5 : f64
      %1 = fir.constant 2.0 : f64
      %2 = fir.mulf(%0, %1) : (f64, f64) -> (f64)
      %3 = fir.convert(%2) : (f64) -> (f64)
      %4 = fir.addf(%3, %0) : (f64, f64) -> (f64)
      return(%4) : (f64) -> ()
    }
  "#;
  let mut module = parse(text.into());
  let mut passman = PassManager::new();
  passman.register(Pass::Module(Box::new(Folder::new())));
  passman.run_passes(&mut module);
  verify::verify(&module).unwrap();
  let func = module.lookup_symbol("f").unwrap();
  let entry = module.region_entry(func, 0).unwrap();
  let ret = module.terminator(entry).unwrap();
  let value = module.op(ret).operands()[0];
  assert_eq!(constant_value(&module, value), Some(&Attr::Float(4.5)));
  // the folded module still round-trips
  let parsed = parse(print(&module));
  assert!(modules_equal(&module, &parsed));
}

#[test]
fn malformed_text() {
  let driver: Driver<_> = r#"
    func @f : () -> () {
    ^bb0:
      fir.do_loop %0 to %0 step %0 {
      ^bb0(%1: index):
        fir.result() : () -> ()
      }
    }
  "#
  .to_string()
  .into();
  assert!(driver.generate_module().is_err());
}

#[test]
fn lower_variables_of_tree() {
  let mut scope = Scope::new();
  let mut n = ObjectDetails::scalar(TypeCategory::Integer);
  n.kind = Some(8);
  let n = scope.add(Symbol::new("n", Details::Object(n)).with_storage(0, 8));
  let mut a = ObjectDetails::scalar(TypeCategory::Real);
  a.shape.push(Bounds {
    lower: None,
    upper: Some(Expr::of(TypeCategory::Integer, vec![n])),
  });
  let a = scope.add(Symbol::new("a", Details::Object(a)).with_storage(8, 40));
  let do_stmt = ConstructStmt::Do {
    name: None,
    control: Some(LoopControl::Bounds(TypeCategory::Integer)),
  };
  let arms = vec![Arm::new(
    Statement::new("do i = 1, n", do_stmt),
    vec![Node::action("a(i) = 0", ActionStmt::Assignment)],
  )];
  let end = Statement::new("end do", ConstructStmt::EndDo(None));
  let body = vec![Node::construct(ConstructKind::Do, arms, end)];
  let sub = Subprogram::new(SubprogramKind::Subroutine, Some("zero"), scope, body);
  let program = Program {
    units: vec![ProgramUnit::Subprogram(sub)],
  };
  let tree = pft::create_pft(&program, &Options::default());
  let func = match tree.units()[0] {
    Unit::Function(func) => tree.func(func),
    _ => unreachable!(),
  };
  // the counted loop is structured
  assert!(!tree[func.evaluations[0]].is_unstructured);
  // `n` is ordered before `a`, whose bounds depend on it
  let syms: Vec<_> = func.var_list.iter().filter_map(|v| v.symbol()).collect();
  assert_eq!(syms, [n, a]);
  let conv = TypeConverter::new(&func.syntax.scope, DefaultKinds::default());
  let tys: Vec<_> = func
    .var_list
    .iter()
    .map(|v| conv.variable_type(v).unwrap())
    .collect();
  assert_eq!(
    tys,
    [
      Type::get_i64(),
      Type::get_sequence(vec![Extent::Unknown], Type::get_real(4))
    ]
  );
  let mut dump = Vec::new();
  pft::dump::dump(&mut dump, &tree).unwrap();
  let dump = String::from_utf8(dump).unwrap();
  assert!(dump.starts_with("1 Subroutine zero: subroutine zero\n  <<DoConstruct>> -> 4\n"));
}
