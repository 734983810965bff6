//! Branch analysis of legacy statements: arithmetic IF, ASSIGN and
//! assigned GOTO.

use crate::pft::branches::Analyzer;
use crate::pft::program::{EvalId, EvalNode};
use crate::pft::syntax::{Label, OtherStmt, SymbolId, TypeCategory};

impl<'p, 'a> Analyzer<'p, 'a> {
  /// Marks the negative, zero and positive targets of an arithmetic IF.
  pub(super) fn analyze_arithmetic_if(
    &mut self,
    eval: EvalId,
    category: TypeCategory,
    labels: &[Label; 3],
  ) {
    for label in labels {
      self.mark_branch_label(eval, *label);
    }
    // comparing a real value takes one more block
    if category == TypeCategory::Real {
      self.pft[eval].local_blocks += 1;
    }
  }

  /// Records the label assigned to a variable. The label may become the
  /// target of an assigned GOTO, unless it is a format.
  pub(super) fn analyze_assign(&mut self, label: Label, symbol: SymbolId) {
    let target = self.lookup_label(label);
    if !matches!(self.pft[target].node, EvalNode::Other(OtherStmt::Format)) {
      self.pft[target].is_new_block = true;
    }
    let func = self.func();
    self
      .pft
      .func_mut(func)
      .assign_symbol_labels
      .entry(symbol)
      .or_default()
      .insert(label);
  }

  /// An assigned GOTO has no explicit targets, so its successor is marked
  /// here.
  pub(super) fn analyze_assigned_goto(&mut self, eval: EvalId) {
    self.pft[eval].is_unstructured = true;
    self.mark_successor_as_new_block(eval);
  }
}

#[cfg(test)]
mod test {
  use crate::pft::program::FuncId;
  use crate::pft::syntax::*;
  use crate::pft::{create_pft, Options};

  fn build(scope: Scope, body: Vec<Node>) -> Program {
    let sub = Subprogram::new(SubprogramKind::Subroutine, Some("s"), scope, body);
    Program {
      units: vec![ProgramUnit::Subprogram(sub)],
    }
  }

  #[test]
  fn arithmetic_if() {
    for (category, blocks) in [(TypeCategory::Integer, 0), (TypeCategory::Real, 1)] {
      let program = build(
        Scope::new(),
        vec![
          Node::action(
            "if (x) 10, 20, 10",
            ActionStmt::ArithmeticIf {
              category,
              labels: [10, 20, 10],
            },
          ),
          Node::labeled(10, "10 x = 1", ActionStmt::Assignment),
          Node::labeled(20, "20 continue", ActionStmt::Continue),
        ],
      );
      let pft = create_pft(&program, &Options::default());
      let func = pft.func(FuncId(0));
      let arith_if = func.evaluations[0];
      assert!(pft[arith_if].is_unstructured);
      assert_eq!(pft[arith_if].local_blocks, blocks);
      assert_eq!(pft[arith_if].control_successor, Some(func.lookup_label(10)));
      assert!(pft[func.lookup_label(20)].is_new_block);
    }
  }

  #[test]
  fn assign_and_assigned_goto() {
    let mut scope = Scope::new();
    let details = Details::Object(ObjectDetails::scalar(TypeCategory::Integer));
    let k = scope.add(Symbol::new("k", details).with_storage(0, 4));
    let program = build(
      scope,
      vec![
        Node::action("assign 10 to k", ActionStmt::Assign { label: 10, symbol: k }),
        Node::action("assign 30 to k", ActionStmt::Assign { label: 30, symbol: k }),
        Node::action("goto k", ActionStmt::AssignedGoto { symbol: k }),
        Node::labeled(10, "10 x = 1", ActionStmt::Assignment),
        Node::Other(Statement::labeled(30, "30 format(i5)", OtherStmt::Format)),
        Node::action("y = 2", ActionStmt::Assignment),
      ],
    );
    let pft = create_pft(&program, &Options::default());
    let func = pft.func(FuncId(0));
    let labels: Vec<_> = func.assign_symbol_labels[&k].iter().copied().collect();
    assert_eq!(labels, [10, 30]);
    assert!(pft[func.lookup_label(10)].is_new_block);
    assert!(!pft[func.lookup_label(30)].is_new_block);
    let goto = func.evaluations[2];
    assert!(pft[goto].is_unstructured);
    assert!(pft[goto].control_successor.is_none());
  }
}
