use crate::pft::program::{EvalId, EvalNode, FuncId, Program};
use crate::pft::syntax::{
  ActionStmt, ConstructKind, ConstructStmt, Format, IoSpec, IoStmt, Label, LoopControl,
  TypeCategory,
};
use crate::pft::Options;
use std::collections::HashMap;

/// Analyzes the branches of the given function-like unit.
///
/// Sets the control successors, construct exits and the new block and
/// unstructured markers of all of its evaluations.
pub(crate) fn analyze_branches(pft: &mut Program, func: FuncId, options: &Options) {
  let list = pft.func(func).evaluations.clone();
  let mut analyzer = Analyzer {
    pft,
    func,
    options,
    construct_names: HashMap::new(),
    do_constructs: Vec::new(),
  };
  analyzer.analyze_list(None, &list);
}

/// Branch analyzer of a function-like unit.
pub(super) struct Analyzer<'p, 'a> {
  pub(super) pft: &'p mut Program<'a>,
  func: FuncId,
  options: &'p Options,
  construct_names: HashMap<String, EvalId>,
  do_constructs: Vec<EvalId>,
}

impl<'p, 'a> Analyzer<'p, 'a> {
  /// Analyzes an evaluation list, `parent` is the construct that owns it.
  fn analyze_list(&mut self, parent: Option<EvalId>, list: &[EvalId]) {
    let mut last_construct_stmt = None;
    let mut last_if_stmt = None;
    for &eval in list {
      let node = self.pft[eval].node;
      match node {
        EvalNode::Action(stmt) => self.analyze_action(eval, stmt, &mut last_if_stmt),
        EvalNode::ConstructStmt(stmt) => {
          let parent = parent.expect("parent construct does not exist");
          self.analyze_construct_stmt(eval, stmt, parent, list, &mut last_construct_stmt);
        }
        EvalNode::Construct(construct) => self.analyze_construct(eval, construct.kind),
        EvalNode::Other(_) | EvalNode::Directive(_) => {}
      }

      if let Some(children) = self.pft[eval].evaluations.clone() {
        self.analyze_list(Some(eval), &children);
      }

      // `eval` is the action statement of a block-less IF
      if let Some(if_stmt) = last_if_stmt.filter(|s| *s != eval) {
        if self.unstructured(eval) {
          self.pft[eval].is_new_block = true;
          self.mark_successor_as_new_block(eval);
          self.pft[if_stmt].is_unstructured = true;
        }
        let succ = self.pft.non_nop_successor(eval);
        self.pft[if_stmt].control_successor = Some(succ);
        last_if_stmt = None;
      }

      // last statement of an arm leaves the construct
      if self.pft[eval].control_successor.is_none() {
        let succ = self.pft[eval].lexical_successor;
        if let Some(succ) = succ.filter(|s| self.pft[*s].is_intermediate_construct_stmt()) {
          let construct = parent.expect("parent construct does not exist");
          let exit = self.pft[construct].construct_exit;
          self.pft[eval].control_successor = exit;
          self.pft[succ].is_new_block = true;
        }
      }

      if let Some(parent) = parent {
        if self.pft[eval].is_unstructured {
          self.pft[parent].is_unstructured = true;
        }
      }

      if self.pft[eval].control_successor.is_some()
        && self.pft[eval].is_action_stmt()
        && self.unstructured(eval)
      {
        self.mark_successor_as_new_block(eval);
      }
    }
  }

  fn analyze_action(&mut self, eval: EvalId, stmt: &ActionStmt, last_if_stmt: &mut Option<EvalId>) {
    match stmt {
      ActionStmt::Call { alt_returns } => {
        for label in alt_returns {
          self.mark_branch_label(eval, *label);
        }
      }
      ActionStmt::Cycle(name) => {
        let construct = self.loop_construct(name.as_deref(), "CYCLE");
        let end_do = *self.pft[construct]
          .evaluations
          .as_ref()
          .and_then(|e| e.last())
          .expect("end of loop does not exist");
        self.mark_branch_target(eval, end_do);
      }
      ActionStmt::Exit(name) => {
        let construct = self.loop_construct(name.as_deref(), "EXIT");
        let exit = self.pft[construct]
          .construct_exit
          .expect("construct exit does not exist");
        self.mark_branch_target(eval, exit);
      }
      ActionStmt::Goto(label) => self.mark_branch_label(eval, *label),
      ActionStmt::ComputedGoto(labels) => {
        for label in labels {
          self.mark_branch_label(eval, *label);
        }
      }
      ActionStmt::ArithmeticIf { category, labels } => {
        self.analyze_arithmetic_if(eval, *category, labels)
      }
      ActionStmt::Assign { label, symbol } => self.analyze_assign(*label, *symbol),
      ActionStmt::AssignedGoto { .. } => self.analyze_assigned_goto(eval),
      ActionStmt::If(_) => *last_if_stmt = Some(eval),
      ActionStmt::Return | ActionStmt::Stop => {
        self.pft[eval].is_unstructured = true;
        let succ = self.pft[eval]
          .lexical_successor
          .expect("lexical successor does not exist");
        if self.pft[succ].lexical_successor.is_some() {
          self.mark_successor_as_new_block(eval);
        }
      }
      ActionStmt::Io(io) => self.analyze_io(eval, io),
      ActionStmt::Assignment | ActionStmt::Continue | ActionStmt::Other(_) => {}
    }
  }

  fn analyze_construct_stmt(
    &mut self,
    eval: EvalId,
    stmt: &ConstructStmt,
    parent: EvalId,
    list: &[EvalId],
    last_construct_stmt: &mut Option<EvalId>,
  ) {
    match stmt {
      ConstructStmt::Do { control, .. } => {
        self.insert_construct_name(stmt, parent);
        self.do_constructs.push(parent);
        let control = match control {
          Some(control) => control,
          None => {
            // infinite loop
            self.pft[eval].is_unstructured = true;
            return;
          }
        };
        let succ = self.pft.non_nop_successor(eval);
        self.pft[succ].is_new_block = true;
        self.pft[eval].control_successor = list.last().copied();
        if matches!(control, LoopControl::Bounds(TypeCategory::Real) | LoopControl::While) {
          self.pft[eval].is_unstructured = true;
        }
      }
      ConstructStmt::EndDo(_) => {
        let do_eval = list[0];
        self.pft[eval].control_successor = Some(do_eval);
        self.do_constructs.pop();
        if !self.unstructured(parent) {
          return;
        }
        // loop header block
        self.pft[do_eval].local_blocks += 1;
        let exit = self.construct_exit(parent);
        self.pft[exit].is_new_block = true;
        let control = match self.pft[do_eval].construct_stmt() {
          Some(ConstructStmt::Do { control, .. }) => control,
          _ => panic!("loop does not begin with a DO statement"),
        };
        if let Some(LoopControl::Concurrent { dims, masked }) = control {
          // header and body blocks of each dimension and one for the mask,
          // the innermost body and latch are the loop's own
          self.pft[do_eval].local_blocks = (2 * dims + *masked as usize).saturating_sub(1);
          self.pft[eval].local_blocks = dims.saturating_sub(1);
          self.pft[eval].is_new_block |= *masked;
        }
      }
      ConstructStmt::IfThen(_) => {
        self.insert_construct_name(stmt, parent);
        let succ = self.pft[eval]
          .lexical_successor
          .expect("lexical successor does not exist");
        self.pft[succ].is_new_block = true;
        *last_construct_stmt = Some(eval);
      }
      ConstructStmt::ElseIf(_) => {
        self.pft[eval].is_new_block = true;
        let succ = self.pft[eval]
          .lexical_successor
          .expect("lexical successor does not exist");
        self.pft[succ].is_new_block = true;
        self.chain_guard(eval, last_construct_stmt);
        *last_construct_stmt = Some(eval);
      }
      ConstructStmt::Else(_) => {
        self.pft[eval].is_new_block = true;
        self.chain_guard(eval, last_construct_stmt);
        *last_construct_stmt = None;
      }
      ConstructStmt::EndIf(_) => {
        let exit = self.construct_exit(parent);
        if self.unstructured(parent) {
          self.pft[exit].is_new_block = true;
        }
        if let Some(last) = last_construct_stmt.take() {
          self.pft[last].control_successor = Some(exit);
        }
      }
      ConstructStmt::SelectCase(_) | ConstructStmt::SelectRank(_) | ConstructStmt::SelectType(_) => {
        self.insert_construct_name(stmt, parent);
        *last_construct_stmt = Some(eval);
      }
      ConstructStmt::Case(_) | ConstructStmt::SelectRankCase(_) | ConstructStmt::TypeGuard(_) => {
        self.pft[eval].is_new_block = true;
        self.chain_guard(eval, last_construct_stmt);
        *last_construct_stmt = Some(eval);
      }
      ConstructStmt::EndSelect(_) => {
        let succ = self.pft.non_nop_successor(eval);
        self.pft[succ].is_new_block = true;
        // no guard matches
        if let Some(last) = last_construct_stmt.take() {
          let exit = self.construct_exit(parent);
          self.pft[last].control_successor.get_or_insert(exit);
        }
      }
      ConstructStmt::Associate(_)
      | ConstructStmt::Block(_)
      | ConstructStmt::Critical(_)
      | ConstructStmt::ChangeTeam(_) => self.insert_construct_name(stmt, parent),
      ConstructStmt::EndAssociate(_)
      | ConstructStmt::EndBlock(_)
      | ConstructStmt::EndCritical(_)
      | ConstructStmt::EndChangeTeam(_) => {}
    }
  }

  /// Sets the exit of a construct.
  fn analyze_construct(&mut self, eval: EvalId, kind: ConstructKind) {
    let last = *self.pft[eval]
      .evaluations
      .as_ref()
      .and_then(|e| e.last())
      .expect("end of construct does not exist");
    let exit = match kind {
      // the end statement may have code
      ConstructKind::Block | ConstructKind::Critical | ConstructKind::ChangeTeam => last,
      _ => self.pft.non_nop_successor(last),
    };
    self.pft[eval].construct_exit = Some(exit);
    if matches!(
      kind,
      ConstructKind::Case | ConstructKind::SelectRank | ConstructKind::SelectType
    ) {
      self.pft[eval].is_unstructured = true;
    }
  }

  fn analyze_io(&mut self, eval: EvalId, io: &IoStmt) {
    if let Some(format) = &io.format {
      self.analyze_format(eval, format);
    }
    for spec in &io.specs {
      match spec {
        IoSpec::Err(label) | IoSpec::Eor(label) | IoSpec::End(label) => {
          self.mark_branch_label(eval, *label)
        }
        IoSpec::Format(format) => self.analyze_format(eval, format),
        IoSpec::Other => {}
      }
    }
  }

  fn analyze_format(&mut self, eval: EvalId, format: &Format) {
    // the format is a label held by an integer variable
    if let Format::Expr(TypeCategory::Integer) = format {
      self.pft[eval].is_unstructured = true;
    }
  }

  fn unstructured(&self, eval: EvalId) -> bool {
    self.pft[eval].lower_as_unstructured(self.options)
  }

  fn construct_exit(&self, construct: EvalId) -> EvalId {
    self.pft[construct]
      .construct_exit
      .expect("construct exit does not exist")
  }

  fn chain_guard(&mut self, eval: EvalId, last_construct_stmt: &Option<EvalId>) {
    let last = last_construct_stmt.expect("previous construct statement does not exist");
    self.pft[last].control_successor = Some(eval);
  }

  fn insert_construct_name(&mut self, stmt: &ConstructStmt, construct: EvalId) {
    if let Some(name) = stmt.construct_name() {
      self.construct_names.insert(name.into(), construct);
    }
  }

  /// Returns the construct a CYCLE or EXIT refers to.
  fn loop_construct(&self, name: Option<&str>, stmt: &str) -> EvalId {
    let construct = match name {
      Some(name) => self.construct_names.get(name),
      None => self.do_constructs.last(),
    };
    *construct.unwrap_or_else(|| panic!("construct of {} does not exist", stmt))
  }

  /// Marks the target of a branch as a new block.
  pub(super) fn mark_branch_target(&mut self, source: EvalId, target: EvalId) {
    self.pft[source].is_unstructured = true;
    self.pft[source].control_successor.get_or_insert(target);
    self.pft[target].is_new_block = true;
    // a branch to the first statement of a construct is a branch to the
    // construct
    let mut target_construct = self.pft[target].parent_construct;
    if let Some(construct) = target_construct {
      let first = self.pft[construct].evaluations.as_ref().and_then(|e| e.first());
      if self.pft[target].is_construct_stmt() && first == Some(&target) {
        target_construct = self.pft[construct].parent_construct;
      }
    }
    if let Some(target_construct) = target_construct {
      let mut source_construct = self.pft[source].parent_construct;
      while let Some(construct) = source_construct {
        if construct == target_construct {
          break;
        }
        source_construct = self.pft[construct].parent_construct;
      }
      // branch into the body of a construct
      if source_construct != Some(target_construct) {
        let mut eval = Some(target);
        while let Some(e) = eval {
          self.pft[e].is_unstructured = true;
          eval = self.pft[e].parent_construct;
        }
      }
    }
  }

  /// Marks the evaluation of the given label as the target of a branch.
  ///
  /// # Panics
  ///
  /// Panics if the label is not defined in the current unit.
  pub(super) fn mark_branch_label(&mut self, source: EvalId, label: Label) {
    let target = self.lookup_label(label);
    self.mark_branch_target(source, target);
  }

  pub(super) fn lookup_label(&self, label: Label) -> EvalId {
    self.pft.func(self.func).lookup_label(label)
  }

  pub(super) fn mark_successor_as_new_block(&mut self, eval: EvalId) {
    let succ = self.pft.non_nop_successor(eval);
    self.pft[succ].is_new_block = true;
  }

  pub(super) fn func(&self) -> FuncId {
    self.func
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::pft::create_pft;
  use crate::pft::program::Program;
  use crate::pft::syntax::{self, *};

  fn build(body: Vec<Node>) -> syntax::Program {
    let sub = Subprogram::new(SubprogramKind::Subroutine, Some("s"), Scope::new(), body);
    syntax::Program {
      units: vec![ProgramUnit::Subprogram(sub)],
    }
  }

  fn construct(kind: ConstructKind, arms: Vec<(ConstructStmt, Vec<Node>)>, end: ConstructStmt) -> Node {
    let arms = arms
      .into_iter()
      .map(|(stmt, body)| Arm::new(Statement::new(stmt.name(), stmt), body))
      .collect();
    Node::construct(kind, arms, Statement::new(end.name(), end))
  }

  fn do_loop(name: Option<&str>, control: Option<LoopControl>, body: Vec<Node>) -> Node {
    let name = name.map(String::from);
    let stmt = ConstructStmt::Do {
      name: name.clone(),
      control,
    };
    construct(ConstructKind::Do, vec![(stmt, body)], ConstructStmt::EndDo(name))
  }

  fn if_then(then: Vec<Node>, els: Option<Vec<Node>>) -> Node {
    let mut arms = vec![(ConstructStmt::IfThen(None), then)];
    if let Some(els) = els {
      arms.push((ConstructStmt::Else(None), els));
    }
    construct(ConstructKind::If, arms, ConstructStmt::EndIf(None))
  }

  fn assign(source: &str) -> Node {
    Node::action(source, ActionStmt::Assignment)
  }

  fn if_stmt(action: ActionStmt) -> Node {
    let name = action.name().to_string();
    let source = format!("if (c) {}", name);
    let action = Statement::new(&name, action);
    Node::action(&source, ActionStmt::If(Box::new(action)))
  }

  /// Evaluations of the only unit in source order.
  fn evals(pft: &Program) -> Vec<EvalId> {
    pft.walk(FuncId(0))
  }

  fn find(pft: &Program, name: &str) -> EvalId {
    evals(pft)
      .into_iter()
      .find(|e| pft[*e].node.name() == name)
      .unwrap()
  }

  #[test]
  fn goto_out_of_loop() {
    let program = build(vec![
      do_loop(
        None,
        Some(LoopControl::Bounds(TypeCategory::Integer)),
        vec![if_stmt(ActionStmt::Goto(10)), assign("x = x + a(i)")],
      ),
      Node::labeled(10, "10 continue", ActionStmt::Continue),
    ]);
    let pft = create_pft(&program, &Options::default());
    let target = pft.func(FuncId(0)).lookup_label(10);
    let goto = find(&pft, "GotoStmt");
    let do_construct = find(&pft, "DoConstruct");
    assert_eq!(pft[goto].control_successor, Some(target));
    assert!(pft[goto].is_unstructured);
    assert!(pft[target].is_new_block);
    assert!(pft[do_construct].is_unstructured);
    assert_eq!(pft[do_construct].construct_exit, Some(target));
    // loop header block
    let do_stmt = find(&pft, "NonLabelDoStmt");
    assert_eq!(pft[do_stmt].local_blocks, 1);
    assert_eq!(pft[do_stmt].control_successor, Some(find(&pft, "EndDoStmt")));
    assert_eq!(pft[find(&pft, "EndDoStmt")].control_successor, Some(do_stmt));
    let if_eval = find(&pft, "IfStmt");
    assert!(pft[if_eval].is_unstructured);
    assert_eq!(pft[if_eval].control_successor, Some(find(&pft, "AssignmentStmt")));
    // a unit ending with a continue has no synthesized end target
    assert_eq!(pft.func(FuncId(0)).evaluations.len(), 2);
  }

  #[test]
  fn structured_if() {
    let program = build(vec![
      if_then(vec![assign("x = 1")], Some(vec![assign("x = 2")])),
      assign("y = x"),
    ]);
    let pft = create_pft(&program, &Options::default());
    let all = evals(&pft);
    let (construct, then_stmt, x1, else_stmt, x2, end_if, y) =
      (all[0], all[1], all[2], all[3], all[4], all[5], all[6]);
    assert!(!pft[construct].is_unstructured);
    assert_eq!(pft[construct].construct_exit, Some(y));
    assert_eq!(pft[then_stmt].control_successor, Some(else_stmt));
    assert_eq!(pft[x1].control_successor, Some(y));
    assert!(pft[x1].is_new_block);
    assert!(pft[else_stmt].is_new_block);
    assert!(!pft[x2].is_new_block);
    assert!(pft[end_if].control_successor.is_none());
    // structured, so the exit is not a new block
    assert!(!pft[y].is_new_block);
    let indices: Vec<_> = all.iter().map(|e| pft[*e].print_index).collect();
    assert_eq!(indices, [0, 1, 2, 3, 4, 5, 6, 7]);
  }

  #[test]
  fn unstructured_lowering_option() {
    let program = build(vec![
      if_then(vec![assign("x = 1")], Some(vec![assign("x = 2")])),
      assign("y = x"),
    ]);
    let options = Options {
      structured_lowering: false,
    };
    let pft = create_pft(&program, &options);
    let y = evals(&pft)[6];
    assert!(pft[y].is_new_block);
    assert!(!pft[evals(&pft)[0]].is_unstructured);
  }

  #[test]
  fn if_then_without_else() {
    let program = build(vec![if_then(vec![assign("x = 1")], None), assign("y = x")]);
    let pft = create_pft(&program, &Options::default());
    let all = evals(&pft);
    // a false condition leaves the construct
    assert_eq!(pft[all[1]].control_successor, Some(all[4]));
  }

  #[test]
  fn named_exit() {
    let inner = do_loop(
      None,
      Some(LoopControl::Bounds(TypeCategory::Integer)),
      vec![Node::action("exit outer", ActionStmt::Exit(Some("outer".into())))],
    );
    let program = build(vec![do_loop(Some("outer"), None, vec![inner]), assign("y = 1")]);
    let pft = create_pft(&program, &Options::default());
    let exit = find(&pft, "ExitStmt");
    let y = find(&pft, "AssignmentStmt");
    assert_eq!(pft[exit].control_successor, Some(y));
    assert!(pft[y].is_new_block);
    let all = evals(&pft);
    // infinite loops are unstructured
    assert!(pft[all[0]].is_unstructured);
    assert!(pft[all[1]].is_unstructured);
  }

  #[test]
  fn cycle_innermost_loop() {
    let program = build(vec![do_loop(
      None,
      Some(LoopControl::While),
      vec![Node::action("cycle", ActionStmt::Cycle(None)), assign("x = 1")],
    )]);
    let pft = create_pft(&program, &Options::default());
    let cycle = find(&pft, "CycleStmt");
    assert_eq!(pft[cycle].control_successor, Some(find(&pft, "EndDoStmt")));
    assert!(pft[find(&pft, "EndDoStmt")].is_new_block);
    assert!(pft[find(&pft, "AssignmentStmt")].is_new_block);
  }

  #[test]
  fn select_case() {
    let program = build(vec![
      construct(
        ConstructKind::Case,
        vec![
          (ConstructStmt::SelectCase(None), vec![]),
          (ConstructStmt::Case(None), vec![assign("x = 1")]),
          (ConstructStmt::Case(None), vec![assign("x = 2")]),
        ],
        ConstructStmt::EndSelect(None),
      ),
      assign("y = x"),
    ]);
    let pft = create_pft(&program, &Options::default());
    let all = evals(&pft);
    let (construct, select, case1, x1, case2, x2, _, y) =
      (all[0], all[1], all[2], all[3], all[4], all[5], all[6], all[7]);
    assert!(pft[construct].is_unstructured);
    assert_eq!(pft[select].control_successor, Some(case1));
    assert_eq!(pft[case1].control_successor, Some(case2));
    assert_eq!(pft[case2].control_successor, Some(y));
    assert_eq!(pft[x1].control_successor, Some(y));
    assert!(pft[x2].control_successor.is_none());
    assert!(pft[case1].is_new_block && pft[case2].is_new_block);
    assert!(pft[y].is_new_block);
  }

  #[test]
  fn concurrent_loop_blocks() {
    let control = LoopControl::Concurrent {
      dims: 2,
      masked: true,
    };
    let program = build(vec![do_loop(
      None,
      Some(control),
      vec![if_stmt(ActionStmt::Return)],
    )]);
    let pft = create_pft(&program, &Options::default());
    let do_stmt = find(&pft, "NonLabelDoStmt");
    let end_do = find(&pft, "EndDoStmt");
    assert_eq!(pft[do_stmt].local_blocks, 4);
    assert_eq!(pft[end_do].local_blocks, 1);
    assert!(pft[end_do].is_new_block);
  }

  #[test]
  fn branch_into_construct() {
    let program = build(vec![
      Node::action("goto 20", ActionStmt::Goto(20)),
      if_then(vec![Node::labeled(20, "20 x = 1", ActionStmt::Assignment)], None),
    ]);
    let pft = create_pft(&program, &Options::default());
    let target = pft.func(FuncId(0)).lookup_label(20);
    assert!(pft[target].is_unstructured);
    assert!(pft[find(&pft, "IfConstruct")].is_unstructured);
  }

  #[test]
  fn branch_to_construct() {
    let stmt = Statement::labeled(20, "20 if (c) then", ConstructStmt::IfThen(None));
    let arms = vec![Arm::new(stmt, vec![assign("x = 1")])];
    let end = Statement::new("end if", ConstructStmt::EndIf(None));
    let program = build(vec![
      Node::action("goto 20", ActionStmt::Goto(20)),
      Node::construct(ConstructKind::If, arms, end),
    ]);
    let pft = create_pft(&program, &Options::default());
    assert!(!pft[find(&pft, "IfConstruct")].is_unstructured);
  }

  #[test]
  fn io_labels() {
    let io = IoStmt {
      kind: IoKind::Read,
      format: None,
      specs: vec![IoSpec::Err(30), IoSpec::Other, IoSpec::End(40)],
    };
    let program = build(vec![
      Node::action("read(1, err=30, end=40) x", ActionStmt::Io(io)),
      Node::labeled(30, "30 x = 0", ActionStmt::Assignment),
      Node::labeled(40, "40 continue", ActionStmt::Continue),
    ]);
    let pft = create_pft(&program, &Options::default());
    let func = pft.func(FuncId(0));
    let read = find(&pft, "ReadStmt");
    assert!(pft[read].is_unstructured);
    assert_eq!(pft[read].control_successor, Some(func.lookup_label(30)));
    assert!(pft[func.lookup_label(30)].is_new_block);
    assert!(pft[func.lookup_label(40)].is_new_block);
  }

  #[test]
  fn assigned_format() {
    let io = IoStmt {
      kind: IoKind::Print,
      format: Some(Format::Expr(TypeCategory::Integer)),
      specs: vec![],
    };
    let program = build(vec![Node::action("print fmt, x", ActionStmt::Io(io))]);
    let pft = create_pft(&program, &Options::default());
    assert!(pft[find(&pft, "PrintStmt")].is_unstructured);
  }

  #[test]
  fn propagation_is_monotonic() {
    // every nesting depth with a branch out at the innermost level
    for depth in 1..6 {
      let mut body = vec![if_stmt(ActionStmt::Goto(99))];
      for i in 0..depth {
        body = if i % 2 == 0 {
          vec![if_then(body, Some(vec![assign("x = 1")]))]
        } else {
          vec![do_loop(None, Some(LoopControl::Bounds(TypeCategory::Integer)), body)]
        };
      }
      body.push(Node::labeled(99, "99 continue", ActionStmt::Continue));
      let program = build(body);
      let pft = create_pft(&program, &Options::default());
      for eval in evals(&pft) {
        if pft[eval].is_unstructured {
          if let Some(parent) = pft[eval].parent_construct {
            assert!(pft[parent].is_unstructured);
          }
        }
      }
      let constructs = evals(&pft)
        .into_iter()
        .filter(|e| pft[*e].is_construct())
        .count();
      assert_eq!(constructs, depth);
      assert!(evals(&pft)
        .into_iter()
        .filter(|e| pft[*e].is_construct())
        .all(|e| pft[e].is_unstructured));
    }
  }

  #[test]
  #[should_panic]
  fn undefined_label() {
    let program = build(vec![Node::action("goto 10", ActionStmt::Goto(10))]);
    create_pft(&program, &Options::default());
  }
}
