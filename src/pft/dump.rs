use crate::pft::program::*;
use crate::pft::syntax::{OtherStmt, SubprogramKind};
use std::io::{Result, Write};

/// Dumps the given tree in text form.
///
/// Units are numbered in order, statements are prefixed by their print
/// index. `^` marks statements that begin a new block, `*` statements with
/// local blocks, `!` unstructured evaluations, and `-> n` their control
/// successors or the exits of constructs.
pub fn dump<W: Write>(w: &mut W, pft: &Program) -> Result<()> {
  Dumper {
    w,
    pft,
    next_index: 1,
  }
  .dump()
}

/// Dumps the given function-like unit in text form.
pub fn dump_function<W: Write>(w: &mut W, pft: &Program, func: FuncId) -> Result<()> {
  Dumper {
    w,
    pft,
    next_index: 1,
  }
  .dump_function(func)
}

struct Dumper<'w, 'p, 'a, W: Write> {
  w: &'w mut W,
  pft: &'p Program<'a>,
  next_index: usize,
}

impl<'w, 'p, 'a, W: Write> Dumper<'w, 'p, 'a, W> {
  fn dump(&mut self) -> Result<()> {
    let pft = self.pft;
    for unit in pft.units() {
      match unit {
        Unit::Function(func) => self.dump_function(*func)?,
        Unit::Module(module) => {
          let index = self.node_index();
          writeln!(self.w, "{} ModuleLike:", index)?;
          writeln!(self.w, "Contains")?;
          for func in &module.nested_functions {
            self.dump_function(*func)?;
          }
          write!(self.w, "EndContains\nEndModuleLike\n\n")?;
        }
        Unit::BlockData(_) => {
          let index = self.node_index();
          write!(self.w, "{} BlockData:\nEndBlockData\n\n", index)?;
        }
      }
    }
    Ok(())
  }

  fn dump_function(&mut self, func: FuncId) -> Result<()> {
    let index = self.node_index();
    let pft = self.pft;
    let unit = pft.func(func);
    let kind = unit.syntax.kind.name();
    let name = unit.name().unwrap_or("<anonymous>");
    write!(self.w, "{} {} {}", index, kind, name)?;
    if unit.syntax.kind != SubprogramKind::Program && !unit.syntax.header.is_empty() {
      write!(self.w, ": {}", unit.syntax.header)?;
    }
    writeln!(self.w)?;
    self.dump_list(&unit.evaluations, 1)?;
    if !unit.nested_functions.is_empty() {
      write!(self.w, "\nContains\n")?;
      for nested in &unit.nested_functions {
        self.dump_function(*nested)?;
      }
      writeln!(self.w, "EndContains")?;
    }
    write!(self.w, "End{} {}\n\n", kind, name)
  }

  fn dump_list(&mut self, list: &[EvalId], indent: usize) -> Result<()> {
    for eval in list {
      self.dump_evaluation(*eval, indent)?;
    }
    Ok(())
  }

  fn dump_evaluation(&mut self, id: EvalId, indent: usize) -> Result<()> {
    let pft = self.pft;
    let eval = &pft[id];
    let name = eval.node.name();
    let bang = if eval.is_unstructured { "!" } else { "" };
    write!(self.w, "{:1$}", "", indent * 2)?;
    if let Some(nested) = &eval.evaluations {
      write!(self.w, "<<{}{}>>", name, bang)?;
      if let Some(exit) = eval.construct_exit {
        write!(self.w, " -> {}", pft[exit].print_index)?;
      }
      writeln!(self.w)?;
      self.dump_list(nested, indent + 1)?;
      write!(self.w, "{:1$}", "", indent * 2)?;
      return writeln!(self.w, "<<End {}{}>>", name, bang);
    }
    if eval.print_index != 0 {
      write!(self.w, "{} ", eval.print_index)?;
    }
    if eval.is_new_block {
      write!(self.w, "^")?;
    }
    if eval.local_blocks != 0 {
      write!(self.w, "*")?;
    }
    write!(self.w, "{}{}", name, bang)?;
    let succ = if eval.is_executable() {
      eval.control_successor
    } else if let EvalNode::Other(OtherStmt::Entry(_)) = eval.node {
      eval.lexical_successor
    } else {
      None
    };
    if let Some(succ) = succ {
      write!(self.w, " -> {}", pft[succ].print_index)?;
    }
    if !eval.source.is_empty() {
      write!(self.w, ": {}", eval.source)?;
    }
    writeln!(self.w)
  }

  fn node_index(&mut self) -> usize {
    self.next_index += 1;
    self.next_index - 1
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::pft::syntax::{self, *};
  use crate::pft::{create_pft, Options};

  fn to_string(program: &syntax::Program) -> String {
    let pft = create_pft(program, &Options::default());
    let mut buf = Vec::new();
    dump(&mut buf, &pft).unwrap();
    String::from_utf8(buf).unwrap()
  }

  #[test]
  fn dump_loop() {
    let do_stmt = ConstructStmt::Do {
      name: None,
      control: Some(LoopControl::Bounds(TypeCategory::Integer)),
    };
    let goto = Statement::new("goto 10", ActionStmt::Goto(10));
    let body = vec![
      Node::action("if (a(i) < 0) goto 10", ActionStmt::If(Box::new(goto))),
      Node::action("s = s + a(i)", ActionStmt::Assignment),
    ];
    let arms = vec![Arm::new(Statement::new("do i = 1, n", do_stmt), body)];
    let end = Statement::new("end do", ConstructStmt::EndDo(None));
    let body = vec![
      Node::construct(ConstructKind::Do, arms, end),
      Node::labeled(10, "10 continue", ActionStmt::Continue),
    ];
    let sub = Subprogram::new(SubprogramKind::Subroutine, Some("s"), Scope::new(), body);
    let program = syntax::Program {
      units: vec![ProgramUnit::Subprogram(sub)],
    };
    assert_eq!(
      to_string(&program),
      r#"1 Subroutine s: subroutine s
  <<DoConstruct!>> -> 6
    1 *NonLabelDoStmt -> 5: do i = 1, n
    2 ^IfStmt! -> 4: if (a(i) < 0) goto 10
    3 ^GotoStmt! -> 6: goto 10
    4 ^AssignmentStmt: s = s + a(i)
    5 EndDoStmt -> 1: end do
  <<End DoConstruct!>>
  6 ^ContinueStmt: 10 continue
EndSubroutine s

"#
    );
  }

  #[test]
  fn dump_units() {
    let body = vec![Node::action("x = 1", ActionStmt::Assignment)];
    let module = Module {
      name: "m".into(),
      scope: Scope::new(),
      contains: vec![Subprogram::new(SubprogramKind::Subroutine, Some("t"), Scope::new(), body)],
    };
    let mut main = Subprogram::new(SubprogramKind::Program, None, Scope::new(), vec![]);
    main.contains.push(Subprogram::new(SubprogramKind::Function, Some("f"), Scope::new(), vec![]));
    let program = syntax::Program {
      units: vec![
        ProgramUnit::Module(module),
        ProgramUnit::BlockData(BlockData {
          name: None,
          scope: Scope::new(),
        }),
        ProgramUnit::Subprogram(main),
      ],
    };
    assert_eq!(
      to_string(&program),
      r#"1 ModuleLike:
Contains
2 Subroutine t: subroutine t
  1 AssignmentStmt: x = 1
  2 ContinueStmt: end
EndSubroutine t

EndContains
EndModuleLike

3 BlockData:
EndBlockData

4 Program <anonymous>
  1 ContinueStmt: end

Contains
5 Function f: function f
  1 ContinueStmt: end
EndFunction f

EndContains
EndProgram <anonymous>

"#
    );
  }
}
