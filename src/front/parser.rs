//! FIR parser ([`Parser`]) related implementations.

use crate::front::ast::{self, Ast, AstBox, Name, Operand, Operation};
use crate::front::lexer::Lexer;
use crate::front::span::{Error, Span};
use crate::front::token::{Token, TokenKind};
use crate::ir::{Attr, AttrMap, CaseTag, CmpFPredicate, CmpIPredicate, Extent, Linkage, OpKind, Type};
use std::io::Read;

/// Parser of FIR.
pub struct Parser<T: Read> {
  lexer: Lexer<T>,
  cur_token: Token,
  last_span: Span,
}

/// Result returned by `Parser`
pub type Result = std::result::Result<AstBox, Error>;

type PResult<T> = std::result::Result<T, Error>;

/// Reads the value of the specific kind of token from lexer.
macro_rules! read {
  ($self:ident, $p:path, $prompt:expr) => {{
    let Token { span, kind } = &$self.cur_token;
    if let $p(v) = kind {
      let v = v.clone();
      $self.next_token()?;
      Ok(v)
    } else {
      span.log_error(&format!("expected {}, found {}", $prompt, kind))
    }
  }};
}

/// Attribute dictionary built in place.
macro_rules! attrs {
  ($($name:expr => $attr:expr),* $(,)?) => {{
    #[allow(unused_mut)]
    let mut attrs = AttrMap::new();
    $(attrs.insert($name.into(), $attr);)*
    attrs
  }};
}

/// Module level operations, where error recovery at module level stops.
const MODULE_OPS: &[&str] = &["func", "fir.global", "fir.dispatch_table"];

fn int_vec(sizes: impl IntoIterator<Item = usize>) -> Attr {
  Attr::IntVec(sizes.into_iter().map(|s| s as i64).collect())
}

impl<T: Read> Parser<T> {
  /// Creates a new `Parser` from the specific `Lexer`.
  pub fn new(lexer: Lexer<T>) -> Self {
    let mut parser = Self {
      lexer,
      cur_token: Token::default(),
      last_span: Span::default(),
    };
    // skip leading lexer errors, they have been reported
    while let Err(e) = parser.next_token() {
      if e.is_fatal() {
        break;
      }
    }
    parser
  }

  /// Parses the next module level operation.
  ///
  /// Returns an error AST if the operation is malformed and the parser
  /// recovered from the error, or an end AST at end of file.
  pub fn parse_next(&mut self) -> Result {
    let span = self.span();
    if self.is_token(TokenKind::End) {
      return Ok(Ast::end(span));
    }
    match self.parse_op() {
      Err(e) if !e.is_fatal() => self.recover(span, true),
      result => result,
    }
  }

  /// Gets the next token.
  fn next_token(&mut self) -> PResult<()> {
    self.last_span = self.cur_token.span;
    self.cur_token = self.lexer.next_token()?;
    Ok(())
  }

  /// Gets the current span.
  fn span(&self) -> Span {
    self.cur_token.span
  }

  /// Skips tokens until the start of the next operation, and returns an
  /// error AST covering the skipped tokens.
  ///
  /// Nested regions are skipped as a whole. At module level, only module
  /// level operations are recognized as the start of an operation.
  fn recover(&mut self, span: Span, top: bool) -> Result {
    let mut depth = 0usize;
    let mut last = span;
    let mut skipped = span;
    loop {
      let Token { span: cur, kind } = &self.cur_token;
      if depth == 0 {
        let new_line = !last.is_in_same_line_as(cur);
        let starts_op = match kind {
          TokenKind::Ident(name) if top => MODULE_OPS.contains(&name.as_str()),
          TokenKind::Ident(_) | TokenKind::Value(_) | TokenKind::Block(_) => !top,
          _ => false,
        };
        let closes = !top && *kind == TokenKind::Other('}');
        if *kind == TokenKind::End || closes || (new_line && starts_op) {
          break;
        }
      }
      match kind {
        TokenKind::Other('{') => depth += 1,
        TokenKind::Other('}') => depth = depth.saturating_sub(1),
        _ => {}
      }
      last = *cur;
      skipped.update_span(*cur);
      match self.next_token() {
        Err(e) if e.is_fatal() => return Err(e),
        _ => {}
      }
    }
    Ok(Ast::error(skipped))
  }

  /// Parses an operation, with the names of its results.
  fn parse_op(&mut self) -> Result {
    let span = self.span();
    // get result names
    let mut results = Vec::new();
    if matches!(self.cur_token.kind, TokenKind::Value(_)) {
      loop {
        results.push(self.parse_name()?);
        if !self.is_token(TokenKind::Other(',')) {
          break;
        }
        self.next_token()?;
      }
      self.expect(TokenKind::Other('='))?;
    }
    // get operation name
    let name_span = self.span();
    let name = read!(self, TokenKind::Ident, "operation name")?;
    let kind = match OpKind::from_name(&name) {
      Some(kind) => kind,
      None => return name_span.log_error(&format!("unknown operation '{}'", name)),
    };
    let mut op = match kind {
      OpKind::Func => self.parse_func(),
      OpKind::Global => self.parse_global(),
      OpKind::DispatchTable => self.parse_dispatch_table(),
      OpKind::DoLoop | OpKind::IterateWhile => self.parse_loop(kind),
      OpKind::If => self.parse_if(),
      OpKind::CmpF | OpKind::CmpI => self.parse_cmp(kind),
      OpKind::Constant => self.parse_constant(),
      OpKind::Br => self.parse_br(),
      OpKind::CondBr => self.parse_cond_br(),
      kind if kind.is_select() => self.parse_select(kind),
      kind => self.parse_generic(kind),
    }?;
    let span = span.into_updated_span(self.last_span);
    if results.len() != op.result_tys.len() {
      return span.log_error(&format!(
        "'{}' defines {} results, but {} names are given",
        kind,
        op.result_tys.len(),
        results.len()
      ));
    }
    op.results = results;
    Ok(Ast::op(span, op))
  }

  /// Parses operations in the generic form.
  fn parse_generic(&mut self, kind: OpKind) -> PResult<Operation> {
    let span = self.span();
    let names = self.parse_list('(', ')', |s| s.parse_name())?;
    let attrs = if self.is_token(TokenKind::Other('{')) {
      self.parse_attr_dict()?
    } else {
      AttrMap::new()
    };
    self.expect(TokenKind::Other(':'))?;
    let (params, results) = self.parse_fn_sig()?;
    let operands = self.typed_operands(span, names, params)?;
    let mut op = Operation::new(kind, operands, attrs);
    op.result_tys = results;
    Ok(op)
  }

  /// Parses constants, like `fir.constant 1.5 : f32`.
  fn parse_constant(&mut self) -> PResult<Operation> {
    let value = self.parse_attr()?;
    self.expect(TokenKind::Other(':'))?;
    let ty = self.parse_type()?;
    let mut op = Operation::new(OpKind::Constant, vec![], attrs! { "value" => value });
    op.result_tys = vec![ty];
    Ok(op)
  }

  /// Parses comparisons, like `fir.cmpf "olt", %0, %1 : f32`.
  fn parse_cmp(&mut self, kind: OpKind) -> PResult<Operation> {
    let span = self.span();
    let pred = read!(self, TokenKind::Str, "predicate")?;
    let index = match kind {
      OpKind::CmpF => CmpFPredicate::from_name(&pred).map(CmpFPredicate::index),
      _ => CmpIPredicate::from_name(&pred).map(CmpIPredicate::index),
    };
    let index = match index {
      Some(index) => index,
      None => return span.log_error(&format!("invalid predicate \"{}\" of '{}'", pred, kind)),
    };
    self.expect(TokenKind::Other(','))?;
    let lhs = self.parse_name()?;
    self.expect(TokenKind::Other(','))?;
    let rhs = self.parse_name()?;
    self.expect(TokenKind::Other(':'))?;
    let ty = self.parse_type()?;
    let operands = vec![typed(lhs, &ty), typed(rhs, &ty)];
    let mut op = Operation::new(kind, operands, attrs! { "predicate" => Attr::Int(index) });
    op.result_tys = vec![Type::get_i1()];
    Ok(op)
  }

  /// Parses unconditional branches, like `br ^bb1(%0 : i32)`.
  fn parse_br(&mut self) -> PResult<Operation> {
    let (dest, args) = self.parse_successor()?;
    let mut op = Operation::new(OpKind::Br, args, AttrMap::new());
    op.successors.push(dest);
    Ok(op)
  }

  /// Parses conditional branches, like `cond_br %c, ^bb1, ^bb2(%0 : i32)`.
  fn parse_cond_br(&mut self) -> PResult<Operation> {
    let cond = self.parse_name()?;
    self.expect(TokenKind::Other(','))?;
    let (then_dest, then_args) = self.parse_successor()?;
    self.expect(TokenKind::Other(','))?;
    let (else_dest, else_args) = self.parse_successor()?;
    let attrs = attrs! {
      "target_operand_offsets" => int_vec([then_args.len(), else_args.len()]),
    };
    let operands = std::iter::once(typed(cond, &Type::get_i1()))
      .chain(then_args)
      .chain(else_args)
      .collect();
    let mut op = Operation::new(OpKind::CondBr, operands, attrs);
    op.successors = vec![then_dest, else_dest];
    Ok(op)
  }

  /// Parses multi-way branches, like
  /// `fir.select_case %0 : i32 [#fir.point, %1, ^bb1, unit, ^bb2]`.
  fn parse_select(&mut self, kind: OpKind) -> PResult<Operation> {
    let selector = self.parse_name()?;
    self.expect(TokenKind::Other(':'))?;
    let ty = self.parse_type()?;
    self.expect(TokenKind::Other('['))?;
    let mut cases = Vec::new();
    let mut compare = Vec::new();
    let mut targets = Vec::new();
    let mut dests = Vec::new();
    if !self.is_token(TokenKind::Other(']')) {
      loop {
        cases.push(self.parse_attr()?);
        self.expect(TokenKind::Other(','))?;
        // compare operands only appear in `select_case`
        let mut operands = Vec::new();
        while kind == OpKind::SelectCase && matches!(self.cur_token.kind, TokenKind::Value(_)) {
          operands.push(typed(self.parse_name()?, &ty));
          self.expect(TokenKind::Other(','))?;
        }
        let (dest, args) = self.parse_successor()?;
        compare.push(operands);
        targets.push(args);
        dests.push(dest);
        if !self.is_token(TokenKind::Other(',')) {
          break;
        }
        self.next_token()?;
      }
    }
    self.expect(TokenKind::Other(']'))?;
    let attrs = attrs! {
      "cases" => Attr::Array(cases),
      "compare_operand_offsets" => int_vec(compare.iter().map(Vec::len)),
      "target_operand_offsets" => int_vec(targets.iter().map(Vec::len)),
    };
    let operands = std::iter::once(typed(selector, &ty))
      .chain(compare.into_iter().flatten())
      .chain(targets.into_iter().flatten())
      .collect();
    let mut op = Operation::new(kind, operands, attrs);
    op.successors = dests;
    Ok(op)
  }

  /// Parses loops, like
  /// `fir.do_loop %lb to %ub step %st unordered iter_args(%x : f32) {...}`
  /// or `fir.iterate_while %lb to %ub step %st and %ok {...}`.
  fn parse_loop(&mut self, kind: OpKind) -> PResult<Operation> {
    let index = Type::get_index();
    let lower = self.parse_name()?;
    self.expect_ident("to")?;
    let upper = self.parse_name()?;
    self.expect_ident("step")?;
    let step = self.parse_name()?;
    let mut operands = vec![typed(lower, &index), typed(upper, &index), typed(step, &index)];
    let mut attrs = AttrMap::new();
    if kind == OpKind::IterateWhile {
      self.expect_ident("and")?;
      operands.push(typed(self.parse_name()?, &Type::get_i1()));
    } else if self.cur_token.kind.is_ident("unordered") {
      self.next_token()?;
      attrs.insert("unordered".into(), Attr::Unit);
    }
    let mut inits = Vec::new();
    if self.cur_token.kind.is_ident("iter_args") {
      self.next_token()?;
      inits = self.parse_operand_group()?;
    }
    let mut result_tys: Vec<_> = inits.iter().map(|o| o.ty.clone()).collect();
    if kind == OpKind::IterateWhile {
      result_tys.insert(0, Type::get_i1());
    }
    operands.extend(inits);
    let region = self.parse_region()?;
    let mut op = Operation::new(kind, operands, attrs);
    op.result_tys = result_tys;
    op.regions.push(region);
    Ok(op)
  }

  /// Parses conditionals, like `fir.if %c -> (i32) {...} else {...}`.
  fn parse_if(&mut self) -> PResult<Operation> {
    let cond = self.parse_name()?;
    let mut result_tys = Vec::new();
    if self.is_token(TokenKind::Arrow) {
      self.next_token()?;
      result_tys = self.parse_list('(', ')', |s| s.parse_type())?;
    }
    let then_region = self.parse_region()?;
    let else_region = if self.cur_token.kind.is_ident("else") {
      self.next_token()?;
      self.parse_region()?
    } else {
      ast::Region::default()
    };
    let mut op = Operation::new(OpKind::If, vec![typed(cond, &Type::get_i1())], AttrMap::new());
    op.result_tys = result_tys;
    op.regions = vec![then_region, else_region];
    Ok(op)
  }

  /// Parses functions, like `func @foo : (i32) -> () {...}`. Declarations
  /// have no body.
  fn parse_func(&mut self) -> PResult<Operation> {
    let name = read!(self, TokenKind::Symbol, "function name")?;
    self.expect(TokenKind::Other(':'))?;
    let span = self.span();
    let ty = self.parse_type()?;
    if ty.function_sig().is_none() {
      return span.log_error(&format!("expected function type, found '{}'", ty));
    }
    let attrs = attrs! {
      "sym_name" => Attr::Str(name[1..].into()),
      "type" => Attr::Type(ty),
    };
    let mut op = Operation::new(OpKind::Func, vec![], attrs);
    op.regions.push(self.parse_optional_region()?);
    Ok(op)
  }

  /// Parses globals, like `fir.global internal @x (1) constant : i32`.
  fn parse_global(&mut self) -> PResult<Operation> {
    let mut attrs = AttrMap::new();
    if let TokenKind::Ident(linkage) = &self.cur_token.kind {
      match Linkage::from_name(linkage) {
        Some(linkage) => attrs.insert("linkage".into(), Attr::Str(linkage.name().into())),
        None => {
          return self.span().log_error(&format!(
            "invalid linkage '{}', expected 'internal', 'common' or 'weak'",
            linkage
          ))
        }
      };
      self.next_token()?;
    }
    let name = read!(self, TokenKind::Symbol, "global name")?;
    attrs.insert("sym_name".into(), Attr::Str(name[1..].into()));
    if self.is_token(TokenKind::Other('(')) {
      self.next_token()?;
      attrs.insert("init_val".into(), self.parse_attr()?);
      self.expect(TokenKind::Other(')'))?;
    }
    if self.cur_token.kind.is_ident("constant") {
      self.next_token()?;
      attrs.insert("constant".into(), Attr::Unit);
    }
    self.expect(TokenKind::Other(':'))?;
    attrs.insert("type".into(), Attr::Type(self.parse_type()?));
    let mut op = Operation::new(OpKind::Global, vec![], attrs);
    op.regions.push(self.parse_optional_region()?);
    Ok(op)
  }

  /// Parses dispatch tables, like `fir.dispatch_table @t {...}`.
  fn parse_dispatch_table(&mut self) -> PResult<Operation> {
    let name = read!(self, TokenKind::Symbol, "dispatch table name")?;
    let attrs = attrs! { "sym_name" => Attr::Str(name[1..].into()) };
    let mut op = Operation::new(OpKind::DispatchTable, vec![], attrs);
    op.regions.push(self.parse_optional_region()?);
    Ok(op)
  }

  /// Parses a region if there is one, returns an empty region otherwise.
  fn parse_optional_region(&mut self) -> PResult<ast::Region> {
    if self.is_token(TokenKind::Other('{')) {
      self.parse_region()
    } else {
      Ok(ast::Region::default())
    }
  }

  /// Parses regions.
  fn parse_region(&mut self) -> PResult<ast::Region> {
    self.expect(TokenKind::Other('{'))?;
    let mut blocks = Vec::new();
    while !self.is_token(TokenKind::Other('}')) && !self.is_token(TokenKind::End) {
      blocks.push(self.parse_block()?);
    }
    self.expect(TokenKind::Other('}'))?;
    Ok(ast::Region { blocks })
  }

  /// Parses blocks, like `^bb0(%0: index):` followed by operations.
  fn parse_block(&mut self) -> PResult<ast::Block> {
    let span = self.span();
    let name = read!(self, TokenKind::Block, "block header")?;
    let mut args = Vec::new();
    if self.is_token(TokenKind::Other('(')) {
      args = self.parse_list('(', ')', |s| {
        let name = s.parse_name()?;
        s.expect(TokenKind::Other(':'))?;
        Ok(typed(name, &s.parse_type()?))
      })?;
    }
    self.expect(TokenKind::Other(':'))?;
    let span = span.into_updated_span(self.last_span);
    let mut ops = Vec::new();
    while !matches!(
      self.cur_token.kind,
      TokenKind::Block(_) | TokenKind::Other('}') | TokenKind::End
    ) {
      let op_span = self.span();
      ops.push(match self.parse_op() {
        Err(e) if !e.is_fatal() => self.recover(op_span, false),
        result => result,
      }?);
    }
    Ok(ast::Block {
      span,
      name,
      args,
      ops,
    })
  }

  /// Parses successors, like `^bb1(%0, %1 : i32, f32)`.
  fn parse_successor(&mut self) -> PResult<(Name, Vec<Operand>)> {
    let span = self.span();
    let name = read!(self, TokenKind::Block, "successor block")?;
    let args = if self.is_token(TokenKind::Other('(')) {
      self.parse_operand_group()?
    } else {
      Vec::new()
    };
    Ok((Name { span, name }, args))
  }

  /// Parses groups of typed operands, like `(%0, %1 : i32, f32)`.
  fn parse_operand_group(&mut self) -> PResult<Vec<Operand>> {
    let span = self.span();
    self.expect(TokenKind::Other('('))?;
    if self.is_token(TokenKind::Other(')')) {
      self.next_token()?;
      return Ok(Vec::new());
    }
    let mut names = Vec::new();
    loop {
      names.push(self.parse_name()?);
      if !self.is_token(TokenKind::Other(',')) {
        break;
      }
      self.next_token()?;
    }
    self.expect(TokenKind::Other(':'))?;
    let mut tys = Vec::new();
    loop {
      tys.push(self.parse_type()?);
      if !self.is_token(TokenKind::Other(',')) {
        break;
      }
      self.next_token()?;
    }
    self.expect(TokenKind::Other(')'))?;
    self.typed_operands(span, names, tys)
  }

  /// Pairs value names with their types.
  fn typed_operands(&self, span: Span, names: Vec<Name>, tys: Vec<Type>) -> PResult<Vec<Operand>> {
    if names.len() != tys.len() {
      let span = span.into_updated_span(self.last_span);
      return span.log_error(&format!("{} operands, but {} types are given", names.len(), tys.len()));
    }
    Ok(names.into_iter().zip(tys).map(|(n, t)| typed(n, &t)).collect())
  }

  /// Parses value names.
  fn parse_name(&mut self) -> PResult<Name> {
    let span = self.span();
    read!(self, TokenKind::Value, "value").map(|name| Name { span, name })
  }

  /// Parses types.
  fn parse_type(&mut self) -> PResult<Type> {
    let Token { span, kind } = &self.cur_token;
    let span = *span;
    match kind {
      TokenKind::Ident(name) => {
        let ty = match name.as_str() {
          "index" => Some(Type::get_index()),
          "f16" => Some(Type::get_real(2)),
          "bf16" => Some(Type::get_real(3)),
          "f32" => Some(Type::get_real(4)),
          "f64" => Some(Type::get_real(8)),
          "none" => Some(Type::get_void()),
          name => name
            .strip_prefix('i')
            .and_then(|bits| bits.parse().ok())
            .filter(|bits| *bits > 0)
            .map(Type::get_int),
        };
        match ty {
          Some(ty) => {
            self.next_token()?;
            Ok(ty)
          }
          None => span.log_error(&format!("expected type, found {}", kind)),
        }
      }
      TokenKind::Dialect(name) => {
        let name = name.clone();
        self.next_token()?;
        match name.as_str() {
          "!fir.ref" => self.parse_wrapped(Type::get_ref),
          "!fir.ptr" => self.parse_wrapped(Type::get_ptr),
          "!fir.heap" => self.parse_wrapped(Type::get_heap),
          "!fir.box" => self.parse_wrapped(Type::get_box),
          "!fir.tdesc" => self.parse_wrapped(Type::get_tdesc),
          "!fir.real" => self.parse_kind().map(Type::get_real),
          "!fir.complex" => self.parse_kind().map(Type::get_complex),
          "!fir.logical" => self.parse_kind().map(Type::get_logical),
          "!fir.char" => self.parse_kind().map(Type::get_char),
          "!fir.array" => self.parse_array_type(),
          "!fir.type" => self.parse_record_type(),
          _ => span.log_error(&format!("unknown type '{}'", name)),
        }
      }
      TokenKind::Other('(') => {
        let (params, results) = self.parse_fn_sig()?;
        Ok(Type::get_function(params, results))
      }
      _ => span.log_error(&format!("expected type, found {}", kind)),
    }
  }

  /// Parses `<T>` of a wrapper type.
  fn parse_wrapped(&mut self, wrap: fn(Type) -> Type) -> PResult<Type> {
    self.expect(TokenKind::Other('<'))?;
    let ty = self.parse_type()?;
    self.expect(TokenKind::Other('>'))?;
    Ok(wrap(ty))
  }

  /// Parses `<kind>` of an intrinsic type.
  fn parse_kind(&mut self) -> PResult<u8> {
    self.expect(TokenKind::Other('<'))?;
    let span = self.span();
    let kind = read!(self, TokenKind::Int, "kind")?;
    self.expect(TokenKind::Other('>'))?;
    match u8::try_from(kind) {
      Ok(kind) if kind > 0 => Ok(kind),
      _ => span.log_error(&format!("invalid kind {}", kind)),
    }
  }

  /// Parses array types, like `!fir.array<10 x ? x i32>`.
  fn parse_array_type(&mut self) -> PResult<Type> {
    self.expect(TokenKind::Other('<'))?;
    let mut shape = Vec::new();
    loop {
      let Token { span, kind } = &self.cur_token;
      match kind {
        TokenKind::Int(n) if *n >= 0 => shape.push(Extent::Known(*n as u64)),
        TokenKind::Int(n) => return span.log_error(&format!("invalid extent {}", n)),
        TokenKind::Other('?') => shape.push(Extent::Unknown),
        // assumed rank, no dimensions
        TokenKind::Other('*') if shape.is_empty() => {}
        _ => break,
      }
      self.next_token()?;
      self.expect_ident("x")?;
    }
    let elem = self.parse_type()?;
    self.expect(TokenKind::Other('>'))?;
    Ok(Type::get_sequence(shape, elem))
  }

  /// Parses record types, like `!fir.type<t(1){a : i32}>`.
  fn parse_record_type(&mut self) -> PResult<Type> {
    let span = self.span();
    self.expect(TokenKind::Other('<'))?;
    let name = read!(self, TokenKind::Ident, "record name")?;
    let ty = Type::get_record(&name);
    let mut len_params = 0;
    if self.is_token(TokenKind::Other('(')) {
      self.next_token()?;
      let lp_span = self.span();
      let n = read!(self, TokenKind::Int, "length parameter count")?;
      len_params = match usize::try_from(n) {
        Ok(n) => n,
        Err(_) => return lp_span.log_error(&format!("invalid length parameter count {}", n)),
      };
      self.expect(TokenKind::Other(')'))?;
    }
    let fields = if self.is_token(TokenKind::Other('{')) {
      Some(self.parse_list('{', '}', |s| {
        let field = read!(s, TokenKind::Ident, "field name")?;
        s.expect(TokenKind::Other(':'))?;
        Ok((field, s.parse_type()?))
      })?)
    } else {
      None
    };
    self.expect(TokenKind::Other('>'))?;
    if let Some(fields) = fields {
      let span = span.into_updated_span(self.last_span);
      match ty.record_body() {
        Some(body) if body.fields != fields || body.len_params != len_params => {
          return span.log_error(&format!("record '{}' is redefined with a different body", name));
        }
        Some(_) => {}
        None => ty.set_record_body(fields, len_params),
      }
    }
    Ok(ty)
  }

  /// Parses function signatures, like `(i32, f32) -> (i1)`.
  fn parse_fn_sig(&mut self) -> PResult<(Vec<Type>, Vec<Type>)> {
    let params = self.parse_list('(', ')', |s| s.parse_type())?;
    self.expect(TokenKind::Arrow)?;
    let results = self.parse_list('(', ')', |s| s.parse_type())?;
    Ok((params, results))
  }

  /// Parses attributes.
  fn parse_attr(&mut self) -> PResult<Attr> {
    let Token { span, kind } = &self.cur_token;
    let span = *span;
    let attr = match kind {
      TokenKind::Ident(name) => match name.as_str() {
        "unit" => Attr::Unit,
        "true" => Attr::Bool(true),
        "false" => Attr::Bool(false),
        "dense" => {
          self.next_token()?;
          let ints = self.parse_list('<', '>', |s| read!(s, TokenKind::Int, "integer"))?;
          return Ok(Attr::IntVec(ints));
        }
        _ => return self.parse_type().map(Attr::Type),
      },
      TokenKind::Int(i) => Attr::Int(*i),
      TokenKind::Float(f) => Attr::Float(*f),
      TokenKind::Str(s) => Attr::Str(s.clone()),
      TokenKind::Symbol(s) => Attr::Symbol(s[1..].into()),
      TokenKind::Attr(name) => match CaseTag::from_name(name) {
        Some(tag) => Attr::Case(tag),
        None => return span.log_error(&format!("unknown attribute '{}'", name)),
      },
      TokenKind::Other('[') => {
        return self.parse_list('[', ']', |s| s.parse_attr()).map(Attr::Array);
      }
      TokenKind::Dialect(_) | TokenKind::Other('(') => return self.parse_type().map(Attr::Type),
      _ => return span.log_error(&format!("expected attribute, found {}", kind)),
    };
    self.next_token()?;
    Ok(attr)
  }

  /// Parses attribute dictionaries, like `{callee = @f, unordered}`.
  fn parse_attr_dict(&mut self) -> PResult<AttrMap> {
    let entries = self.parse_list('{', '}', |s| {
      let span = s.cur_token.span;
      let name = read!(s, TokenKind::Ident, "attribute name")?;
      if s.is_token(TokenKind::Other('=')) {
        s.next_token()?;
        Ok((span, name, s.parse_attr()?))
      } else {
        Ok((span, name, Attr::Unit))
      }
    })?;
    let mut attrs = AttrMap::new();
    for (span, name, attr) in entries {
      if attrs.insert(name.clone(), attr).is_some() {
        span.log_warning(&format!("attribute '{}' is redefined, the last one is used", name));
      }
    }
    Ok(attrs)
  }

  /// Parses comma-seperated lists.
  fn parse_list<F, U>(&mut self, open: char, close: char, parser: F) -> PResult<Vec<U>>
  where
    F: Fn(&mut Self) -> PResult<U>,
  {
    // check & eat left bracket
    self.expect(TokenKind::Other(open))?;
    // get items
    let mut items = Vec::new();
    if !self.is_token(TokenKind::Other(close)) {
      loop {
        // get item
        items.push(parser(self)?);
        // eat ','
        if !self.is_token(TokenKind::Other(',')) {
          break;
        }
        self.next_token()?;
      }
    }
    // check & eat right bracket
    self.expect(TokenKind::Other(close))?;
    Ok(items)
  }

  /// Checks if the current token is the specific token.
  fn is_token(&self, tk: TokenKind) -> bool {
    self.cur_token.kind == tk
  }

  /// Expects the specific token from lexer.
  fn expect(&mut self, tk: TokenKind) -> PResult<Span> {
    let Token { span, kind } = &self.cur_token;
    if kind == &tk {
      let span = *span;
      self.next_token()?;
      Ok(span)
    } else {
      span.log_error(&format!("expected {}, found {}", tk, kind))
    }
  }

  /// Expects the specific identifier from lexer.
  fn expect_ident(&mut self, ident: &str) -> PResult<Span> {
    self.expect(TokenKind::Ident(ident.into()))
  }
}

/// Attaches a type to a value name.
fn typed(name: Name, ty: &Type) -> Operand {
  Operand {
    span: name.span,
    name: name.name,
    ty: ty.clone(),
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::front::ast::AstKind;
  use std::io::Cursor;

  fn parser(text: &str) -> Parser<Cursor<&str>> {
    Parser::new(Lexer::new(Cursor::new(text)))
  }

  fn unwrap_op(ast: AstBox) -> Operation {
    match ast.kind {
      AstKind::Op(op) => op,
      kind => panic!("expected an operation, found {:?}", kind),
    }
  }

  #[test]
  fn parse_func() {
    let mut parser = parser(
      r#"
      func @sum : (index) -> (f32) {
      ^bb0(%0: index):
        %1 = fir.constant 0.0 : f32
        %2 = fir.constant 1 : index
        %3 = fir.do_loop %2 to %0 step %2 iter_args(%1 : f32) {
        ^bb0(%4: index, %5: f32):
          %6 = fir.addf(%5, %5) : (f32, f32) -> (f32)
          fir.result(%6) : (f32) -> ()
        }
        return(%3) : (f32) -> ()
      }
      "#,
    );
    let func = unwrap_op(parser.parse_next().unwrap());
    assert_eq!(func.kind, OpKind::Func);
    assert_eq!(func.attrs["sym_name"], Attr::Str("sum".into()));
    let entry = &func.regions[0].blocks[0];
    assert_eq!(entry.name, "^bb0");
    assert_eq!(entry.args[0].ty, Type::get_index());
    assert_eq!(entry.ops.len(), 4);
    let ops: Vec<_> = func.regions.into_iter().flat_map(|r| r.blocks).flat_map(|b| b.ops).collect();
    let mut ops = ops.into_iter().map(unwrap_op);
    let zero = ops.next().unwrap();
    assert_eq!(zero.attrs["value"], Attr::Float(0.0));
    assert_eq!(zero.results[0].name, "%1");
    let _ = ops.next();
    let do_loop = ops.next().unwrap();
    assert_eq!(do_loop.kind, OpKind::DoLoop);
    assert_eq!(do_loop.operands.len(), 4);
    assert_eq!(do_loop.result_tys, vec![Type::get_real(4)]);
    assert_eq!(do_loop.regions[0].blocks[0].args.len(), 2);
    assert!(matches!(parser.parse_next().unwrap().kind, AstKind::End));
  }

  #[test]
  fn parse_branches() {
    let mut parser = parser(
      r#"
      func @br : (i32, i1) -> () {
      ^bb0(%0: i32, %1: i1):
        fir.select_case %0 : i32 [#fir.interval, %0, %0, ^bb1(%0 : i32), unit, ^bb2]
      ^bb1(%2: i32):
        cond_br %1, ^bb2, ^bb1(%2 : i32)
      ^bb2:
        return() : () -> ()
      }
      "#,
    );
    let func = unwrap_op(parser.parse_next().unwrap());
    let mut blocks = func.regions.into_iter().next().unwrap().blocks.into_iter();
    let select = unwrap_op(blocks.next().unwrap().ops.remove(0));
    assert_eq!(select.operands.len(), 4);
    assert_eq!(select.attrs["compare_operand_offsets"], Attr::IntVec(vec![2, 0]));
    assert_eq!(select.attrs["target_operand_offsets"], Attr::IntVec(vec![1, 0]));
    assert_eq!(select.successors.len(), 2);
    let cond_br = unwrap_op(blocks.next().unwrap().ops.remove(0));
    assert_eq!(cond_br.attrs["target_operand_offsets"], Attr::IntVec(vec![0, 1]));
    assert_eq!(cond_br.operands[0].ty, Type::get_i1());
  }

  #[test]
  fn parse_types() {
    let mut parser = parser("!fir.ref<!fir.array<* x !fir.type<prs_t(1){a : i32, p : !fir.ptr<!fir.type<prs_t>>}>>>");
    let ty = parser.parse_type().unwrap();
    let rec = Type::get_record("prs_t");
    assert_eq!(ty, Type::get_ref(Type::get_sequence(vec![], rec.clone())));
    let body = rec.record_body().unwrap();
    assert_eq!(body.len_params, 1);
    assert_eq!(body.fields[1].1, Type::get_ptr(rec));
  }

  #[test]
  fn redefined_attr() {
    Span::reset_buffer("");
    let mut parser = parser(
      r#"
      func @dup : (f32) -> () {
      ^bb0(%0: f32):
        %1 = fir.addf(%0, %0) {fastmath = 1, fastmath = 3} : (f32, f32) -> (f32)
        return() : () -> ()
      }
      "#,
    );
    let func = unwrap_op(parser.parse_next().unwrap());
    assert_eq!(Span::warning_count(), 1);
    assert!(!Span::has_error());
    let mut blocks = func.regions.into_iter().next().unwrap().blocks;
    let addf = unwrap_op(blocks[0].ops.remove(0));
    assert_eq!(addf.attrs["fastmath"], Attr::Int(3));
  }

  #[test]
  fn parse_error() {
    let mut parser = parser(
      r#"
      fir.global external @x : i32
      fir.global weak @y (1 : i32) : i32

      func @f : () -> () {
      ^bb0:
        %0 = fir.nope(%1) : () -> ()
        fir.unreachable() : () -> ()
      }
      "#,
    );
    assert!(matches!(parser.parse_next().unwrap().kind, AstKind::Error));
    // the initializer is not closed
    assert!(matches!(parser.parse_next().unwrap().kind, AstKind::Error));
    let func = unwrap_op(parser.parse_next().unwrap());
    let ops = &func.regions[0].blocks[0].ops;
    assert!(matches!(ops[0].kind, AstKind::Error));
    assert!(matches!(ops[1].kind, AstKind::Op(_)));
    assert!(matches!(parser.parse_next().unwrap().kind, AstKind::End));
  }
}
