//! Syntax tree consumed by the PFT builder.
//!
//! The tree is produced by a source parser with semantic analysis already
//! done: symbols are resolved into per-unit [`Scope`]s, and expressions
//! are reduced to what flow analysis needs, their type category and the
//! symbols they reference.

use std::collections::BTreeMap;

/// A statement label.
pub type Label = u32;

/// Category of a static type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeCategory {
  Integer,
  Real,
  Complex,
  Character,
  Logical,
  Derived,
}

/// An expression, reduced to its type category, the symbols it
/// references, and its value if it folds to an integer constant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expr {
  pub category: TypeCategory,
  pub symbols: Vec<SymbolId>,
  pub value: Option<i64>,
}

impl Expr {
  /// Creates an expression referencing no symbols.
  pub fn constant(category: TypeCategory) -> Self {
    Self {
      category,
      symbols: Vec::new(),
      value: None,
    }
  }

  /// Creates an integer constant expression.
  pub fn int(value: i64) -> Self {
    Self {
      category: TypeCategory::Integer,
      symbols: Vec::new(),
      value: Some(value),
    }
  }

  /// Creates an expression referencing the given symbols.
  pub fn of(category: TypeCategory, symbols: Vec<SymbolId>) -> Self {
    Self {
      category,
      symbols,
      value: None,
    }
  }
}

/// A statement with its label and source text.
#[derive(Clone, Debug)]
pub struct Statement<T> {
  pub label: Option<Label>,
  pub source: String,
  pub stmt: T,
}

impl<T> Statement<T> {
  /// Creates an unlabeled statement.
  pub fn new(source: &str, stmt: T) -> Self {
    Self {
      label: None,
      source: source.into(),
      stmt,
    }
  }

  /// Creates a labeled statement.
  pub fn labeled(label: Label, source: &str, stmt: T) -> Self {
    Self {
      label: Some(label),
      source: source.into(),
      stmt,
    }
  }
}

/// Node of an execution part.
#[derive(Clone, Debug)]
pub enum Node {
  Action(Statement<ActionStmt>),
  Other(Statement<OtherStmt>),
  Construct(Construct),
  Directive(Directive),
}

impl Node {
  /// Creates an unlabeled action statement.
  pub fn action(source: &str, stmt: ActionStmt) -> Self {
    Node::Action(Statement::new(source, stmt))
  }

  /// Creates a labeled action statement.
  pub fn labeled(label: Label, source: &str, stmt: ActionStmt) -> Self {
    Node::Action(Statement::labeled(label, source, stmt))
  }

  /// Creates a construct.
  pub fn construct(kind: ConstructKind, arms: Vec<Arm>, end: Statement<ConstructStmt>) -> Self {
    Node::Construct(Construct { kind, arms, end })
  }
}

/// Executable statements that are not part of a construct.
#[derive(Clone, Debug)]
pub enum ActionStmt {
  Assignment,
  Continue,
  /// Call with the labels of its alternate return specifiers.
  Call { alt_returns: Vec<Label> },
  Cycle(Option<String>),
  Exit(Option<String>),
  Goto(Label),
  ComputedGoto(Vec<Label>),
  /// Arithmetic if, with the category of its expression and its negative,
  /// zero and positive labels.
  ArithmeticIf {
    category: TypeCategory,
    labels: [Label; 3],
  },
  /// Assigns a label to an integer variable.
  Assign { label: Label, symbol: SymbolId },
  AssignedGoto { symbol: SymbolId },
  /// Block-less if, the label of the substatement is ignored.
  If(Box<Statement<ActionStmt>>),
  Return,
  Stop,
  Io(IoStmt),
  /// Any other action statement, by its name.
  Other(String),
}

impl ActionStmt {
  /// Returns the name of the statement.
  pub fn name(&self) -> &str {
    match self {
      ActionStmt::Assignment => "AssignmentStmt",
      ActionStmt::Continue => "ContinueStmt",
      ActionStmt::Call { .. } => "CallStmt",
      ActionStmt::Cycle(_) => "CycleStmt",
      ActionStmt::Exit(_) => "ExitStmt",
      ActionStmt::Goto(_) => "GotoStmt",
      ActionStmt::ComputedGoto(_) => "ComputedGotoStmt",
      ActionStmt::ArithmeticIf { .. } => "ArithmeticIfStmt",
      ActionStmt::Assign { .. } => "AssignStmt",
      ActionStmt::AssignedGoto { .. } => "AssignedGotoStmt",
      ActionStmt::If(_) => "IfStmt",
      ActionStmt::Return => "ReturnStmt",
      ActionStmt::Stop => "StopStmt",
      ActionStmt::Io(io) => io.kind.name(),
      ActionStmt::Other(name) => name,
    }
  }
}

/// An I/O statement.
#[derive(Clone, Debug)]
pub struct IoStmt {
  pub kind: IoKind,
  /// Format given outside of the control list.
  pub format: Option<Format>,
  pub specs: Vec<IoSpec>,
}

/// Kind of I/O statements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoKind {
  Backspace,
  Close,
  Endfile,
  Flush,
  Inquire,
  Open,
  Print,
  Read,
  Rewind,
  Wait,
  Write,
}

impl IoKind {
  /// Returns the name of the statement.
  pub fn name(self) -> &'static str {
    match self {
      IoKind::Backspace => "BackspaceStmt",
      IoKind::Close => "CloseStmt",
      IoKind::Endfile => "EndfileStmt",
      IoKind::Flush => "FlushStmt",
      IoKind::Inquire => "InquireStmt",
      IoKind::Open => "OpenStmt",
      IoKind::Print => "PrintStmt",
      IoKind::Read => "ReadStmt",
      IoKind::Rewind => "RewindStmt",
      IoKind::Wait => "WaitStmt",
      IoKind::Write => "WriteStmt",
    }
  }
}

/// A specifier of an I/O control list.
#[derive(Clone, Debug)]
pub enum IoSpec {
  Err(Label),
  Eor(Label),
  End(Label),
  Format(Format),
  Other,
}

/// A format specifier.
#[derive(Clone, Debug)]
pub enum Format {
  Star,
  Label(Label),
  /// A format given by an expression. Integer expressions are assigned
  /// format labels.
  Expr(TypeCategory),
}

/// Non-executable statements that appear among executable ones.
#[derive(Clone, Debug)]
pub enum OtherStmt {
  Format,
  /// Alternate entry point of its subprogram symbol.
  Entry(SymbolId),
  Data,
  Namelist,
}

impl OtherStmt {
  /// Returns the name of the statement.
  pub fn name(&self) -> &'static str {
    match self {
      OtherStmt::Format => "FormatStmt",
      OtherStmt::Entry(_) => "EntryStmt",
      OtherStmt::Data => "DataStmt",
      OtherStmt::Namelist => "NamelistStmt",
    }
  }
}

/// Control of a DO statement.
#[derive(Clone, Debug)]
pub enum LoopControl {
  /// Counting loop with a variable of the given category.
  Bounds(TypeCategory),
  While,
  Concurrent { dims: usize, masked: bool },
}

/// Statements that begin, continue or end a construct. Names are
/// construct names.
#[derive(Clone, Debug)]
pub enum ConstructStmt {
  /// DO statement, without control for infinite loops.
  Do {
    name: Option<String>,
    control: Option<LoopControl>,
  },
  EndDo(Option<String>),
  IfThen(Option<String>),
  ElseIf(Option<String>),
  Else(Option<String>),
  EndIf(Option<String>),
  SelectCase(Option<String>),
  Case(Option<String>),
  EndSelect(Option<String>),
  SelectRank(Option<String>),
  SelectRankCase(Option<String>),
  SelectType(Option<String>),
  TypeGuard(Option<String>),
  Associate(Option<String>),
  EndAssociate(Option<String>),
  Block(Option<String>),
  EndBlock(Option<String>),
  Critical(Option<String>),
  EndCritical(Option<String>),
  ChangeTeam(Option<String>),
  EndChangeTeam(Option<String>),
}

impl ConstructStmt {
  /// Returns the name of the statement.
  pub fn name(&self) -> &'static str {
    match self {
      ConstructStmt::Do { .. } => "NonLabelDoStmt",
      ConstructStmt::EndDo(_) => "EndDoStmt",
      ConstructStmt::IfThen(_) => "IfThenStmt",
      ConstructStmt::ElseIf(_) => "ElseIfStmt",
      ConstructStmt::Else(_) => "ElseStmt",
      ConstructStmt::EndIf(_) => "EndIfStmt",
      ConstructStmt::SelectCase(_) => "SelectCaseStmt",
      ConstructStmt::Case(_) => "CaseStmt",
      ConstructStmt::EndSelect(_) => "EndSelectStmt",
      ConstructStmt::SelectRank(_) => "SelectRankStmt",
      ConstructStmt::SelectRankCase(_) => "SelectRankCaseStmt",
      ConstructStmt::SelectType(_) => "SelectTypeStmt",
      ConstructStmt::TypeGuard(_) => "TypeGuardStmt",
      ConstructStmt::Associate(_) => "AssociateStmt",
      ConstructStmt::EndAssociate(_) => "EndAssociateStmt",
      ConstructStmt::Block(_) => "BlockStmt",
      ConstructStmt::EndBlock(_) => "EndBlockStmt",
      ConstructStmt::Critical(_) => "CriticalStmt",
      ConstructStmt::EndCritical(_) => "EndCriticalStmt",
      ConstructStmt::ChangeTeam(_) => "ChangeTeamStmt",
      ConstructStmt::EndChangeTeam(_) => "EndChangeTeamStmt",
    }
  }

  /// Returns the construct name of the statement.
  pub fn construct_name(&self) -> Option<&str> {
    match self {
      ConstructStmt::Do { name, .. }
      | ConstructStmt::EndDo(name)
      | ConstructStmt::IfThen(name)
      | ConstructStmt::ElseIf(name)
      | ConstructStmt::Else(name)
      | ConstructStmt::EndIf(name)
      | ConstructStmt::SelectCase(name)
      | ConstructStmt::Case(name)
      | ConstructStmt::EndSelect(name)
      | ConstructStmt::SelectRank(name)
      | ConstructStmt::SelectRankCase(name)
      | ConstructStmt::SelectType(name)
      | ConstructStmt::TypeGuard(name)
      | ConstructStmt::Associate(name)
      | ConstructStmt::EndAssociate(name)
      | ConstructStmt::Block(name)
      | ConstructStmt::EndBlock(name)
      | ConstructStmt::Critical(name)
      | ConstructStmt::EndCritical(name)
      | ConstructStmt::ChangeTeam(name)
      | ConstructStmt::EndChangeTeam(name) => name.as_deref(),
    }
  }

  /// Checks if the statement continues a construct with another arm.
  pub fn is_intermediate(&self) -> bool {
    matches!(
      self,
      ConstructStmt::ElseIf(_)
        | ConstructStmt::Else(_)
        | ConstructStmt::Case(_)
        | ConstructStmt::SelectRankCase(_)
        | ConstructStmt::TypeGuard(_)
    )
  }

  /// Checks if falling into the statement just leaves the construct.
  pub fn is_nop(&self) -> bool {
    self.is_intermediate() || matches!(self, ConstructStmt::EndIf(_))
  }
}

/// Kind of constructs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstructKind {
  Do,
  If,
  Case,
  SelectRank,
  SelectType,
  Associate,
  Block,
  Critical,
  ChangeTeam,
}

impl ConstructKind {
  /// Returns the name of the construct.
  pub fn name(self) -> &'static str {
    match self {
      ConstructKind::Do => "DoConstruct",
      ConstructKind::If => "IfConstruct",
      ConstructKind::Case => "CaseConstruct",
      ConstructKind::SelectRank => "SelectRankConstruct",
      ConstructKind::SelectType => "SelectTypeConstruct",
      ConstructKind::Associate => "AssociateConstruct",
      ConstructKind::Block => "BlockConstruct",
      ConstructKind::Critical => "CriticalConstruct",
      ConstructKind::ChangeTeam => "ChangeTeamConstruct",
    }
  }
}

/// A construct: arms, each a construct statement with its block, followed
/// by the end statement.
#[derive(Clone, Debug)]
pub struct Construct {
  pub kind: ConstructKind,
  pub arms: Vec<Arm>,
  pub end: Statement<ConstructStmt>,
}

/// An arm of a construct.
#[derive(Clone, Debug)]
pub struct Arm {
  pub stmt: Statement<ConstructStmt>,
  pub body: Vec<Node>,
}

impl Arm {
  /// Creates a new arm.
  pub fn new(stmt: Statement<ConstructStmt>, body: Vec<Node>) -> Self {
    Self { stmt, body }
  }
}

/// A compiler directive applying to a block of nodes.
#[derive(Clone, Debug)]
pub struct Directive {
  pub name: String,
  pub body: Vec<Node>,
}

/// A program: a list of program units.
#[derive(Clone, Debug, Default)]
pub struct Program {
  pub units: Vec<ProgramUnit>,
}

/// A program unit.
#[derive(Clone, Debug)]
pub enum ProgramUnit {
  Subprogram(Subprogram),
  Module(Module),
  BlockData(BlockData),
}

/// Kind of function-like units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubprogramKind {
  Program,
  Function,
  Subroutine,
  MpSubprogram,
}

impl SubprogramKind {
  /// Returns the name of the kind.
  pub fn name(self) -> &'static str {
    match self {
      SubprogramKind::Program => "Program",
      SubprogramKind::Function => "Function",
      SubprogramKind::Subroutine => "Subroutine",
      SubprogramKind::MpSubprogram => "MpSubprogram",
    }
  }
}

/// A main program, function, subroutine or separate module procedure.
#[derive(Clone, Debug)]
pub struct Subprogram {
  pub kind: SubprogramKind,
  /// Name, `None` for an anonymous main program.
  pub name: Option<String>,
  /// Source text of the beginning statement.
  pub header: String,
  /// Subprogram symbol in `scope`, for the primary entry point.
  pub symbol: Option<SymbolId>,
  pub scope: Scope,
  pub body: Vec<Node>,
  /// The end statement, branches to its label leave the unit.
  pub end: Statement<()>,
  pub contains: Vec<Subprogram>,
}

impl Subprogram {
  /// Creates a subprogram with no contained procedures. Its symbol is the
  /// symbol of the same name in `scope`.
  pub fn new(kind: SubprogramKind, name: Option<&str>, scope: Scope, body: Vec<Node>) -> Self {
    let header = match name {
      Some(name) => format!("{} {}", kind.name().to_lowercase(), name),
      None => String::new(),
    };
    Self {
      kind,
      name: name.map(Into::into),
      header,
      symbol: name.and_then(|n| scope.find(n)),
      scope,
      body,
      end: Statement::new("end", ()),
      contains: Vec::new(),
    }
  }
}

/// A module or submodule.
#[derive(Clone, Debug)]
pub struct Module {
  pub name: String,
  pub scope: Scope,
  pub contains: Vec<Subprogram>,
}

/// A block data unit.
#[derive(Clone, Debug)]
pub struct BlockData {
  pub name: Option<String>,
  pub scope: Scope,
}

/// Handle of a symbol in its [`Scope`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub usize);

/// A resolved symbol.
#[derive(Clone, Debug)]
pub struct Symbol {
  pub name: String,
  pub details: Details,
  /// Storage offset in bytes.
  pub offset: usize,
  /// Storage size in bytes.
  pub size: usize,
  pub attrs: SymbolAttrs,
}

impl Symbol {
  /// Creates a symbol with no storage and no attributes.
  pub fn new(name: &str, details: Details) -> Self {
    Self {
      name: name.into(),
      details,
      offset: 0,
      size: 0,
      attrs: SymbolAttrs::default(),
    }
  }

  /// Sets the storage of the symbol.
  pub fn with_storage(mut self, offset: usize, size: usize) -> Self {
    self.offset = offset;
    self.size = size;
    self
  }

  /// Sets the attributes of the symbol.
  pub fn with_attrs(mut self, attrs: SymbolAttrs) -> Self {
    self.attrs = attrs;
    self
  }
}

/// Attributes of a symbol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SymbolAttrs {
  pub saved: bool,
  pub allocatable: bool,
  pub pointer: bool,
  pub target: bool,
  pub in_common: bool,
}

/// What a symbol declares.
#[derive(Clone, Debug)]
pub enum Details {
  Object(ObjectDetails),
  Subprogram(SubprogramDetails),
  Procedure,
  Use,
  HostAssoc,
  Namelist,
  Module,
  Misc,
  DerivedType,
}

/// Details of a data object.
#[derive(Clone, Debug)]
pub struct ObjectDetails {
  pub category: TypeCategory,
  /// Kind parameter, the default kind of the category if `None`.
  pub kind: Option<u8>,
  /// Explicit length of a character object.
  pub char_len: Option<Expr>,
  pub shape: Vec<Bounds>,
  pub coshape: Vec<Bounds>,
  pub init: Option<Expr>,
}

impl ObjectDetails {
  /// Creates the details of a scalar with no initializer.
  pub fn scalar(category: TypeCategory) -> Self {
    Self {
      category,
      kind: None,
      char_len: None,
      shape: Vec::new(),
      coshape: Vec::new(),
      init: None,
    }
  }
}

/// Bounds of a dimension, `None` if not explicit.
#[derive(Clone, Debug, Default)]
pub struct Bounds {
  pub lower: Option<Expr>,
  pub upper: Option<Expr>,
}

/// Details of a subprogram or entry symbol.
#[derive(Clone, Debug, Default)]
pub struct SubprogramDetails {
  /// Dummy arguments, `None` for alternate return specifiers.
  pub dummy_args: Vec<Option<SymbolId>>,
  /// Result symbol of a function.
  pub result: Option<SymbolId>,
}

/// Symbol table of a unit.
///
/// Iteration is in name order.
#[derive(Clone, Debug, Default)]
pub struct Scope {
  symbols: Vec<Symbol>,
  by_name: BTreeMap<String, SymbolId>,
  equivalence_sets: Vec<Vec<SymbolId>>,
}

impl Scope {
  /// Creates an empty scope.
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a symbol to the scope.
  ///
  /// # Panics
  ///
  /// Panics if a symbol of the same name exists.
  pub fn add(&mut self, symbol: Symbol) -> SymbolId {
    let id = SymbolId(self.symbols.len());
    let prev = self.by_name.insert(symbol.name.clone(), id);
    assert!(prev.is_none(), "symbol '{}' already exists", symbol.name);
    self.symbols.push(symbol);
    id
  }

  /// Records an equivalence set.
  pub fn add_equivalence(&mut self, set: Vec<SymbolId>) {
    self.equivalence_sets.push(set);
  }

  /// Returns the equivalence sets.
  pub fn equivalence_sets(&self) -> &[Vec<SymbolId>] {
    &self.equivalence_sets
  }

  /// Returns the symbol of the given handle.
  ///
  /// # Panics
  ///
  /// Panics if the handle is not of this scope.
  pub fn symbol(&self, id: SymbolId) -> &Symbol {
    &self.symbols[id.0]
  }

  /// Finds a symbol by its name.
  pub fn find(&self, name: &str) -> Option<SymbolId> {
    self.by_name.get(name).copied()
  }

  /// Returns all symbols in name order.
  pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
    self.by_name.values().map(move |id| (*id, &self.symbols[id.0]))
  }

  /// Returns the number of symbols.
  pub fn len(&self) -> usize {
    self.symbols.len()
  }

  /// Checks if the scope has no symbols.
  pub fn is_empty(&self) -> bool {
    self.symbols.is_empty()
  }
}
