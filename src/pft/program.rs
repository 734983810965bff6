use crate::pft::syntax::{self, ActionStmt, ConstructStmt, Directive, Label, OtherStmt, SymbolId};
use crate::pft::variables::Variable;
use std::collections::{BTreeSet, HashMap};
use std::ops::{Index, IndexMut};

/// Handle of an [`Evaluation`] in a [`Program`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EvalId(pub(crate) usize);

/// Handle of a [`FunctionLikeUnit`] in a [`Program`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncId(pub(crate) usize);

/// The pre-FIR tree of a program.
///
/// Evaluations and function-like units live in arenas owned by the
/// program, and refer to each other by handles.
pub struct Program<'a> {
  pub(crate) units: Vec<Unit<'a>>,
  pub(crate) evals: Vec<Evaluation<'a>>,
  pub(crate) funcs: Vec<FunctionLikeUnit<'a>>,
}

impl<'a> Program<'a> {
  pub(crate) fn new() -> Self {
    Self {
      units: Vec::new(),
      evals: Vec::new(),
      funcs: Vec::new(),
    }
  }

  /// Returns the top level units.
  pub fn units(&self) -> &[Unit<'a>] {
    &self.units
  }

  /// Returns the function-like unit of the given handle.
  pub fn func(&self, func: FuncId) -> &FunctionLikeUnit<'a> {
    &self.funcs[func.0]
  }

  pub(crate) fn func_mut(&mut self, func: FuncId) -> &mut FunctionLikeUnit<'a> {
    &mut self.funcs[func.0]
  }

  pub(crate) fn new_eval(&mut self, eval: Evaluation<'a>) -> EvalId {
    self.evals.push(eval);
    EvalId(self.evals.len() - 1)
  }

  pub(crate) fn new_func(&mut self, func: FunctionLikeUnit<'a>) -> FuncId {
    self.funcs.push(func);
    FuncId(self.funcs.len() - 1)
  }

  /// Returns all evaluations of the given unit in source order, each
  /// construct before its nested evaluations.
  pub fn walk(&self, func: FuncId) -> Vec<EvalId> {
    let mut evals = Vec::new();
    let mut stack: Vec<_> = self.func(func).evaluations.iter().rev().copied().collect();
    while let Some(eval) = stack.pop() {
      evals.push(eval);
      if let Some(nested) = &self[eval].evaluations {
        stack.extend(nested.iter().rev());
      }
    }
    evals
  }

  /// Returns the successor of the given evaluation, skipping statements
  /// that only leave their construct.
  ///
  /// # Panics
  ///
  /// Panics if the successor does not exist.
  pub fn non_nop_successor(&self, eval: EvalId) -> EvalId {
    let succ = self[eval]
      .lexical_successor
      .expect("lexical successor does not exist");
    if self[succ].is_nop_construct_stmt() {
      let construct = self[succ]
        .parent_construct
        .expect("parent construct does not exist");
      self[construct]
        .construct_exit
        .expect("construct exit does not exist")
    } else {
      succ
    }
  }
}

impl<'a> Index<EvalId> for Program<'a> {
  type Output = Evaluation<'a>;

  fn index(&self, eval: EvalId) -> &Self::Output {
    &self.evals[eval.0]
  }
}

impl<'a> IndexMut<EvalId> for Program<'a> {
  fn index_mut(&mut self, eval: EvalId) -> &mut Self::Output {
    &mut self.evals[eval.0]
  }
}

/// A top level unit of the tree.
pub enum Unit<'a> {
  Function(FuncId),
  Module(ModuleLikeUnit<'a>),
  BlockData(BlockDataUnit<'a>),
}

/// Owner of a unit or an evaluation list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parent {
  Program,
  Function(FuncId),
  /// Index of a module in the top level units.
  Module(usize),
  Construct(EvalId),
}

/// A main program, function, subroutine or separate module procedure,
/// with its evaluations.
pub struct FunctionLikeUnit<'a> {
  pub syntax: &'a syntax::Subprogram,
  pub parent: Parent,
  pub evaluations: Vec<EvalId>,
  pub nested_functions: Vec<FuncId>,
  /// Label targets of the unit.
  pub label_map: HashMap<Label, EvalId>,
  /// Labels assigned to each variable by assign statements.
  pub assign_symbol_labels: HashMap<SymbolId, BTreeSet<Label>>,
  /// Entry points, the primary one first. Each alternate entry maps to
  /// its entry statement.
  pub entry_points: Vec<(Option<SymbolId>, Option<EvalId>)>,
  /// Dummy arguments that are not present at every entry point.
  pub non_universal_dummy_arguments: Vec<SymbolId>,
  /// The largest result over all entry points.
  pub primary_result: Option<SymbolId>,
  pub var_list: Vec<Variable>,
  pub(crate) active_entry: usize,
}

impl<'a> FunctionLikeUnit<'a> {
  pub(crate) fn new(syntax: &'a syntax::Subprogram, parent: Parent) -> Self {
    Self {
      syntax,
      parent,
      evaluations: Vec::new(),
      nested_functions: Vec::new(),
      label_map: HashMap::new(),
      assign_symbol_labels: HashMap::new(),
      entry_points: vec![(syntax.symbol, None)],
      non_universal_dummy_arguments: Vec::new(),
      primary_result: None,
      var_list: Vec::new(),
      active_entry: 0,
    }
  }

  /// Returns the name of the unit.
  pub fn name(&self) -> Option<&str> {
    self.syntax.name.as_deref()
  }

  /// Returns the subprogram symbol of the active entry point.
  pub fn subprogram_symbol(&self) -> Option<SymbolId> {
    self.entry_points[self.active_entry].0
  }

  /// Returns the index of the active entry point.
  pub fn active_entry(&self) -> usize {
    self.active_entry
  }

  /// Selects the active entry point.
  ///
  /// # Panics
  ///
  /// Panics if the index is out of range.
  pub fn set_active_entry(&mut self, index: usize) {
    assert!(
      index < self.entry_points.len(),
      "entry point {} does not exist",
      index
    );
    self.active_entry = index;
  }

  /// Looks up the evaluation of the given label.
  ///
  /// # Panics
  ///
  /// Panics if the label is not defined in this unit.
  pub fn lookup_label(&self, label: Label) -> EvalId {
    *self
      .label_map
      .get(&label)
      .unwrap_or_else(|| panic!("label {} does not exist", label))
  }
}

/// A module or submodule and its contained procedures.
pub struct ModuleLikeUnit<'a> {
  pub syntax: &'a syntax::Module,
  pub nested_functions: Vec<FuncId>,
  pub var_list: Vec<Variable>,
}

/// A block data unit.
pub struct BlockDataUnit<'a> {
  pub syntax: &'a syntax::BlockData,
}

/// Syntax node an evaluation refers to.
#[derive(Clone, Copy, Debug)]
pub enum EvalNode<'a> {
  Action(&'a ActionStmt),
  Other(&'a OtherStmt),
  ConstructStmt(&'a ConstructStmt),
  Construct(&'a syntax::Construct),
  Directive(&'a Directive),
}

impl<'a> EvalNode<'a> {
  /// Returns the name of the node.
  pub fn name(&self) -> &'a str {
    match *self {
      EvalNode::Action(stmt) => stmt.name(),
      EvalNode::Other(stmt) => stmt.name(),
      EvalNode::ConstructStmt(stmt) => stmt.name(),
      EvalNode::Construct(construct) => construct.kind.name(),
      EvalNode::Directive(directive) => &directive.name,
    }
  }
}

/// A statement, construct or directive of a function-like unit, annotated
/// with control flow information.
pub struct Evaluation<'a> {
  pub node: EvalNode<'a>,
  pub source: &'a str,
  pub label: Option<Label>,
  pub parent: Parent,
  /// Innermost enclosing construct or directive.
  pub parent_construct: Option<EvalId>,
  pub owning_procedure: FuncId,
  /// Nested evaluations of a construct or directive.
  pub evaluations: Option<Vec<EvalId>>,
  /// Next executable statement in source order.
  pub lexical_successor: Option<EvalId>,
  /// Explicit or implicit branch target.
  pub control_successor: Option<EvalId>,
  /// Evaluation following a construct.
  pub construct_exit: Option<EvalId>,
  /// Index in source order among executable statements, `0` if none.
  pub print_index: usize,
  pub is_new_block: bool,
  pub is_unstructured: bool,
  /// Number of extra blocks lowering must create inside of the
  /// evaluation.
  pub local_blocks: usize,
}

impl<'a> Evaluation<'a> {
  pub(crate) fn new(
    node: EvalNode<'a>,
    source: &'a str,
    label: Option<Label>,
    parent: Parent,
    owning_procedure: FuncId,
  ) -> Self {
    let evaluations = match node {
      EvalNode::Construct(_) | EvalNode::Directive(_) => Some(Vec::new()),
      _ => None,
    };
    Self {
      node,
      source,
      label,
      parent,
      parent_construct: None,
      owning_procedure,
      evaluations,
      lexical_successor: None,
      control_successor: None,
      construct_exit: None,
      print_index: 0,
      is_new_block: false,
      is_unstructured: false,
      local_blocks: 0,
    }
  }

  /// Returns the action statement of the evaluation.
  pub fn action(&self) -> Option<&'a ActionStmt> {
    match self.node {
      EvalNode::Action(stmt) => Some(stmt),
      _ => None,
    }
  }

  /// Returns the construct statement of the evaluation.
  pub fn construct_stmt(&self) -> Option<&'a ConstructStmt> {
    match self.node {
      EvalNode::ConstructStmt(stmt) => Some(stmt),
      _ => None,
    }
  }

  pub fn is_action_stmt(&self) -> bool {
    matches!(self.node, EvalNode::Action(_))
  }

  pub fn is_other_stmt(&self) -> bool {
    matches!(self.node, EvalNode::Other(_))
  }

  pub fn is_construct_stmt(&self) -> bool {
    matches!(self.node, EvalNode::ConstructStmt(_))
  }

  pub fn is_construct(&self) -> bool {
    matches!(self.node, EvalNode::Construct(_))
  }

  pub fn is_directive(&self) -> bool {
    matches!(self.node, EvalNode::Directive(_))
  }

  /// Checks if the evaluation is a statement, rather than a construct or
  /// a directive.
  pub fn is_statement(&self) -> bool {
    self.evaluations.is_none()
  }

  /// Checks if the evaluation is executable.
  pub fn is_executable(&self) -> bool {
    self.is_action_stmt() || self.is_construct_stmt()
  }

  /// Checks if the evaluation is a construct statement that continues its
  /// construct with another arm.
  pub fn is_intermediate_construct_stmt(&self) -> bool {
    self.construct_stmt().map_or(false, |s| s.is_intermediate())
  }

  /// Checks if the evaluation is a construct statement that, when reached
  /// by falling through, just leaves its construct.
  pub fn is_nop_construct_stmt(&self) -> bool {
    self.construct_stmt().map_or(false, |s| s.is_nop())
  }

  /// Checks if the evaluation must be lowered with branches.
  pub fn lower_as_unstructured(&self, options: &super::Options) -> bool {
    self.is_unstructured || !options.structured_lowering
  }

  /// Checks if the evaluation may be lowered to structured operations.
  pub fn lower_as_structured(&self, options: &super::Options) -> bool {
    !self.lower_as_unstructured(options)
  }
}
