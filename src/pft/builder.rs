use crate::pft::program::*;
use crate::pft::syntax::{self, ActionStmt, Details, Node, OtherStmt, Statement};
use crate::pft::{branches, variables, Options};
use std::collections::BTreeMap;

/// Target of branches to the end of a function-like unit, appended when
/// the unit does not end with a continue statement.
static END_TARGET: ActionStmt = ActionStmt::Continue;

/// Builds the pre-FIR tree of the given program.
///
/// Evaluations are created in source order, then the branches of each
/// function-like unit are analyzed once its body is complete.
///
/// # Panics
///
/// Panics if a branch targets a label that is not defined in its unit,
/// or a named `CYCLE`/`EXIT` names no enclosing construct.
pub fn create_pft<'a>(program: &'a syntax::Program, options: &Options) -> Program<'a> {
  let mut builder = Builder::new(options);
  for unit in &program.units {
    builder.build_unit(unit);
  }
  builder.pft
}

/// Context of building the tree.
struct Builder<'a, 'o> {
  pft: Program<'a>,
  options: &'o Options,
  funcs: Vec<FuncId>,
  lists: Vec<Parent>,
  constructs: Vec<EvalId>,
  last_lexical: Option<EvalId>,
}

impl<'a, 'o> Builder<'a, 'o> {
  fn new(options: &'o Options) -> Self {
    Self {
      pft: Program::new(),
      options,
      funcs: Vec::new(),
      lists: Vec::new(),
      constructs: Vec::new(),
      last_lexical: None,
    }
  }

  fn build_unit(&mut self, unit: &'a syntax::ProgramUnit) {
    match unit {
      syntax::ProgramUnit::Subprogram(sub) => {
        let func = self.build_function(sub, Parent::Program);
        self.pft.units.push(Unit::Function(func));
      }
      syntax::ProgramUnit::Module(module) => {
        let index = self.pft.units.len();
        let nested_functions = module
          .contains
          .iter()
          .map(|sub| self.build_function(sub, Parent::Module(index)))
          .collect();
        self.pft.units.push(Unit::Module(ModuleLikeUnit {
          syntax: module,
          nested_functions,
          var_list: variables::order_variables(&module.scope),
        }));
      }
      syntax::ProgramUnit::BlockData(block_data) => {
        self
          .pft
          .units
          .push(Unit::BlockData(BlockDataUnit { syntax: block_data }));
      }
    }
  }

  fn build_function(&mut self, sub: &'a syntax::Subprogram, parent: Parent) -> FuncId {
    let func = self.pft.new_func(FunctionLikeUnit::new(sub, parent));
    self.funcs.push(func);
    self.lists.push(Parent::Function(func));
    self.last_lexical = None;
    self.build_nodes(&sub.body);
    self.end_function_body(&sub.end);
    let nested = sub
      .contains
      .iter()
      .map(|sub| self.build_function(sub, Parent::Function(func)))
      .collect();
    self.pft.func_mut(func).nested_functions = nested;
    self.lists.pop();
    self.funcs.pop();
    branches::analyze_branches(&mut self.pft, func, self.options);
    process_entry_points(&mut self.pft, func);
    self.pft.func_mut(func).var_list = variables::order_variables(&sub.scope);
    func
  }

  /// Appends the end target of the current unit.
  fn end_function_body(&mut self, end: &'a Statement<()>) {
    let func = self.current_func();
    let ends_with_continue = self
      .pft
      .func(func)
      .evaluations
      .last()
      .map_or(false, |e| {
        matches!(self.pft[*e].action(), Some(ActionStmt::Continue))
      });
    // a labeled END is a branch target even after a CONTINUE
    if !ends_with_continue || end.label.is_some() {
      self.add_evaluation(EvalNode::Action(&END_TARGET), &end.source, end.label);
    }
    self.last_lexical = None;
  }

  fn build_nodes(&mut self, nodes: &'a [Node]) {
    for node in nodes {
      match node {
        Node::Action(stmt) => self.build_action(stmt, stmt.label),
        Node::Other(stmt) => {
          self.add_evaluation(EvalNode::Other(&stmt.stmt), &stmt.source, stmt.label);
        }
        Node::Construct(construct) => {
          let eval = self.add_evaluation(EvalNode::Construct(construct), "", None);
          self.enter_construct(eval);
          for arm in &construct.arms {
            let stmt = &arm.stmt;
            self.add_evaluation(EvalNode::ConstructStmt(&stmt.stmt), &stmt.source, stmt.label);
            self.build_nodes(&arm.body);
          }
          let end = &construct.end;
          self.add_evaluation(EvalNode::ConstructStmt(&end.stmt), &end.source, end.label);
          self.exit_construct();
        }
        Node::Directive(directive) => {
          let eval = self.add_evaluation(EvalNode::Directive(directive), "", None);
          self.enter_construct(eval);
          self.build_nodes(&directive.body);
          self.exit_construct();
        }
      }
    }
  }

  fn build_action(&mut self, stmt: &'a Statement<ActionStmt>, label: Option<syntax::Label>) {
    self.add_evaluation(EvalNode::Action(&stmt.stmt), &stmt.source, label);
    if let ActionStmt::If(action) = &stmt.stmt {
      self.build_action(action, None);
    }
  }

  fn enter_construct(&mut self, eval: EvalId) {
    self.lists.push(Parent::Construct(eval));
    self.constructs.push(eval);
  }

  fn exit_construct(&mut self) {
    self.lists.pop();
    self.constructs.pop();
  }

  fn current_func(&self) -> FuncId {
    *self.funcs.last().expect("function-like unit does not exist")
  }

  /// Adds an evaluation to the current list, and links it into the
  /// lexical chain of its unit.
  fn add_evaluation(
    &mut self,
    node: EvalNode<'a>,
    source: &'a str,
    label: Option<syntax::Label>,
  ) -> EvalId {
    let func = self.current_func();
    let parent = *self.lists.last().expect("evaluation list does not exist");
    let mut eval = Evaluation::new(node, source, label, parent, func);
    eval.parent_construct = self.constructs.last().copied();
    let id = self.pft.new_eval(eval);
    if self.pft[id].is_executable() {
      self.pft[id].print_index = match self.last_lexical {
        Some(last) => {
          self.pft[last].lexical_successor = Some(id);
          self.pft[last].print_index + 1
        }
        None => 1,
      };
      self.last_lexical = Some(id);
      // link pending entry statements to the first statement after them
      for i in (1..self.pft.func(func).entry_points.len()).rev() {
        let entry = self.pft.func(func).entry_points[i]
          .1
          .expect("entry statement does not exist");
        if self.pft[entry].lexical_successor.is_some() {
          break;
        }
        self.pft[entry].lexical_successor = Some(id);
      }
    } else if let EvalNode::Other(OtherStmt::Entry(symbol)) = node {
      self
        .pft
        .func_mut(func)
        .entry_points
        .push((Some(*symbol), Some(id)));
    }
    if let Some(label) = label {
      self.pft.func_mut(func).label_map.insert(label, id);
    }
    match parent {
      Parent::Function(f) => self.pft.func_mut(f).evaluations.push(id),
      Parent::Construct(c) => self.pft[c]
        .evaluations
        .as_mut()
        .expect("evaluation list does not exist")
        .push(id),
      _ => unreachable!(),
    }
    id
  }
}

/// Finds the primary result and the non-universal dummy arguments of a
/// unit with alternate entry points.
fn process_entry_points(pft: &mut Program, func: FuncId) {
  let unit = pft.func(func);
  let entry_count = unit.entry_points.len();
  if entry_count == 1 {
    return;
  }
  // the first executable statement is reached by branches from entries
  let mut initial = unit.evaluations[0];
  if let Some(first) = pft[initial].evaluations.as_ref().and_then(|e| e.first()) {
    initial = *first;
  } else if matches!(pft[initial].node, EvalNode::Other(OtherStmt::Entry(_))) {
    initial = pft[initial]
      .lexical_successor
      .expect("lexical successor does not exist");
  }
  pft[initial].is_new_block = true;

  let unit = pft.func(func);
  let scope = &unit.syntax.scope;
  let mut primary_result = None;
  let mut dummy_counts = BTreeMap::new();
  for (symbol, _) in &unit.entry_points {
    let symbol = symbol.expect("entry symbol does not exist");
    let details = match &scope.symbol(symbol).details {
      Details::Subprogram(details) => details,
      _ => panic!("'{}' is not a subprogram", scope.symbol(symbol).name),
    };
    if let Some(result) = details.result {
      let size = scope.symbol(result).size;
      if primary_result.map_or(true, |r| scope.symbol(r).size < size) {
        primary_result = Some(result);
      }
    }
    // alternate return specifiers have no symbol
    for arg in details.dummy_args.iter().flatten() {
      *dummy_counts.entry(*arg).or_insert(0) += 1;
    }
  }
  let non_universal = dummy_counts
    .into_iter()
    .filter_map(|(arg, count)| (count < entry_count).then(|| arg))
    .collect();
  let unit = pft.func_mut(func);
  unit.primary_result = primary_result;
  unit.non_universal_dummy_arguments = non_universal;
  unit.set_active_entry(0);
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::pft::syntax::*;

  fn build(sub: Subprogram) -> syntax::Program {
    syntax::Program {
      units: vec![ProgramUnit::Subprogram(sub)],
    }
  }

  #[test]
  fn lexical_chain() {
    let body = vec![
      Node::action("x = 1", ActionStmt::Assignment),
      Node::Other(Statement::new("data x /1/", OtherStmt::Data)),
      Node::Action(Statement::new(
        "if (x > 0) x = 2",
        ActionStmt::If(Box::new(Statement::new("x = 2", ActionStmt::Assignment))),
      )),
    ];
    let sub = Subprogram::new(SubprogramKind::Subroutine, Some("s"), Scope::new(), body);
    let program = build(sub);
    let pft = create_pft(&program, &Options::default());
    let func = match pft.units()[0] {
      Unit::Function(func) => func,
      _ => panic!("expected a function"),
    };
    let evals = &pft.func(func).evaluations;
    // assignment, data, if, its action and the end target
    assert_eq!(evals.len(), 5);
    let indices: Vec<_> = evals.iter().map(|e| pft[*e].print_index).collect();
    assert_eq!(indices, [1, 0, 2, 3, 4]);
    assert_eq!(pft[evals[0]].lexical_successor, Some(evals[2]));
    assert_eq!(pft[evals[3]].lexical_successor, Some(evals[4]));
    assert!(pft[evals[4]].lexical_successor.is_none());
    assert_eq!(pft[evals[4]].source, "end");
  }

  #[test]
  fn keep_final_continue() {
    let body = vec![Node::labeled(10, "10 continue", ActionStmt::Continue)];
    let sub = Subprogram::new(SubprogramKind::Subroutine, Some("s"), Scope::new(), body);
    let program = build(sub);
    let pft = create_pft(&program, &Options::default());
    let func = pft.func(FuncId(0));
    assert_eq!(func.evaluations.len(), 1);
    assert_eq!(func.lookup_label(10), func.evaluations[0]);
  }

  #[test]
  fn labeled_end_after_continue() {
    let body = vec![
      Node::action("goto 99", ActionStmt::Goto(99)),
      Node::labeled(10, "10 continue", ActionStmt::Continue),
    ];
    let mut sub = Subprogram::new(SubprogramKind::Subroutine, Some("s"), Scope::new(), body);
    sub.end = Statement::labeled(99, "99 end", ());
    let program = build(sub);
    let pft = create_pft(&program, &Options::default());
    let func = pft.func(FuncId(0));
    assert_eq!(func.evaluations.len(), 3);
    let end = func.evaluations[2];
    assert_eq!(func.lookup_label(99), end);
    assert_eq!(pft[func.evaluations[1]].lexical_successor, Some(end));
    let goto = &pft[func.evaluations[0]];
    assert!(goto.is_unstructured);
    assert_eq!(goto.control_successor, Some(end));
    assert!(pft[end].is_new_block);
  }

  #[test]
  fn nested_functions() {
    let call = Node::action("call f()", ActionStmt::Call { alt_returns: vec![] });
    let mut host = Subprogram::new(SubprogramKind::Program, Some("p"), Scope::new(), vec![call]);
    let body = vec![Node::action("x = 1", ActionStmt::Assignment)];
    host
      .contains
      .push(Subprogram::new(SubprogramKind::Subroutine, Some("f"), Scope::new(), body));
    let program = build(host);
    let pft = create_pft(&program, &Options::default());
    let host = pft.func(FuncId(0));
    assert_eq!(host.nested_functions, [FuncId(1)]);
    let nested = pft.func(FuncId(1));
    assert_eq!(nested.parent, Parent::Function(FuncId(0)));
    // numbering restarts in the nested function
    assert_eq!(pft[nested.evaluations[0]].print_index, 1);
    assert_eq!(pft[nested.evaluations[0]].owning_procedure, FuncId(1));
  }

  #[test]
  fn entry_points() {
    let mut scope = Scope::new();
    let mut real = |name: &str, offset, size| {
      let details = Details::Object(ObjectDetails::scalar(TypeCategory::Real));
      scope.add(Symbol::new(name, details).with_storage(offset, size))
    };
    let a = real("a", 0, 4);
    let b = real("b", 4, 4);
    let r1 = real("r1", 8, 4);
    let r2 = real("r2", 16, 8);
    scope.add(Symbol::new(
      "f",
      Details::Subprogram(SubprogramDetails {
        dummy_args: vec![Some(a), Some(b)],
        result: Some(r1),
      }),
    ));
    let g = scope.add(Symbol::new(
      "g",
      Details::Subprogram(SubprogramDetails {
        dummy_args: vec![Some(b), None],
        result: Some(r2),
      }),
    ));
    let body = vec![
      Node::action("r1 = a", ActionStmt::Assignment),
      Node::action("return", ActionStmt::Return),
      Node::Other(Statement::new("entry g(b, *)", OtherStmt::Entry(g))),
      Node::action("r2 = b", ActionStmt::Assignment),
    ];
    let sub = Subprogram::new(SubprogramKind::Function, Some("f"), scope, body);
    let program = build(sub);
    let pft = create_pft(&program, &Options::default());
    let func = pft.func(FuncId(0));
    assert_eq!(func.entry_points.len(), 2);
    let (symbol, entry) = func.entry_points[1];
    assert_eq!(symbol, Some(g));
    assert_eq!(pft[entry.unwrap()].lexical_successor, Some(func.evaluations[3]));
    assert_eq!(func.primary_result, Some(r2));
    assert_eq!(func.non_universal_dummy_arguments, [a]);
    assert!(pft[func.evaluations[0]].is_new_block);
    assert_eq!(func.active_entry(), 0);
  }
}
