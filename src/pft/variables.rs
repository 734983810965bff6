//! Ordering of the variables of a scope by the dependences of their
//! declarations.

use crate::pft::syntax::{Bounds, Details, Scope, Symbol, SymbolId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// A variable lowering has to allocate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Variable {
  /// A named variable.
  Nominal {
    symbol: SymbolId,
    /// Dependence height, `0` if the declaration depends on no other
    /// variable.
    depth: usize,
    global: bool,
    heap_alloc: bool,
    pointer: bool,
    target: bool,
    /// Offset of the store this variable is mapped into.
    alias_offset: Option<usize>,
  },
  /// Storage shared by overlapping variables.
  IntervalStore {
    offset: usize,
    size: usize,
    global: bool,
    members: Vec<SymbolId>,
  },
}

impl Variable {
  /// Returns the dependence height of the variable.
  pub fn depth(&self) -> usize {
    match self {
      Variable::Nominal { depth, .. } => *depth,
      Variable::IntervalStore { .. } => 0,
    }
  }

  /// Returns the symbol of a nominal variable.
  pub fn symbol(&self) -> Option<SymbolId> {
    match self {
      Variable::Nominal { symbol, .. } => Some(*symbol),
      Variable::IntervalStore { .. } => None,
    }
  }

  /// Returns an object that displays the variable with the symbol names
  /// of the given scope.
  pub fn display<'v, 's>(&'v self, scope: &'s Scope) -> Display<'v, 's> {
    Display { var: self, scope }
  }
}

/// Helper for displaying a [`Variable`].
pub struct Display<'v, 's> {
  var: &'v Variable,
  scope: &'s Scope,
}

impl fmt::Display for Display<'_, '_> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self.var {
      Variable::Nominal {
        symbol,
        depth,
        global,
        heap_alloc,
        pointer,
        target,
        alias_offset,
      } => {
        write!(f, "symbol: {} (depth: {})", self.scope.symbol(*symbol).name, depth)?;
        let flags = [
          (*global, "global"),
          (*heap_alloc, "allocatable"),
          (*pointer, "pointer"),
          (*target, "target"),
        ];
        for (_, name) in flags.iter().filter(|(set, _)| *set) {
          write!(f, ", {}", name)?;
        }
        if let Some(offset) = alias_offset {
          write!(f, ", equivalence({})", offset)?;
        }
        Ok(())
      }
      Variable::IntervalStore {
        offset,
        size,
        global,
        members,
      } => {
        write!(f, "interval[{}, {}]:", offset, size)?;
        if *global {
          write!(f, ", global")?;
        }
        if !members.is_empty() {
          let names: Vec<_> = members
            .iter()
            .map(|m| self.scope.symbol(*m).name.as_str())
            .collect();
          write!(f, ", vars: {{{}}}", names.join(", "))?;
        }
        Ok(())
      }
    }
  }
}

/// Orders the variables of the given scope.
///
/// Every variable appears after the variables its bounds, length and
/// initializer refer to. Overlapping storage of equivalenced variables is
/// merged into interval stores, which come first.
///
/// # Panics
///
/// Panics if a derived type definition reaches the analysis.
pub fn order_variables(scope: &Scope) -> Vec<Variable> {
  let mut analyzer = DependenceDepth::new(scope);
  if !scope.equivalence_sets().is_empty() {
    analyzer.analyze_aliases();
  }
  for (id, _) in scope.iter() {
    analyzer.analyze(id);
  }
  analyzer.finish()
}

/// Merged set of inclusive intervals.
#[derive(Default)]
struct IntervalSet {
  intervals: BTreeMap<usize, usize>,
}

impl IntervalSet {
  /// Adds `[lo, hi]`, merging it with all overlapping intervals.
  fn merge(&mut self, mut lo: usize, mut hi: usize) {
    let overlapping: Vec<_> = self
      .intervals
      .range(..=hi)
      .filter(|(_, h)| **h >= lo)
      .map(|(l, h)| (*l, *h))
      .collect();
    for (l, h) in overlapping {
      self.intervals.remove(&l);
      lo = lo.min(l);
      hi = hi.max(h);
    }
    self.intervals.insert(lo, hi);
  }

  /// Finds the interval containing the given point.
  fn find(&self, point: usize) -> Option<(usize, usize)> {
    self
      .intervals
      .range(..=point)
      .next_back()
      .filter(|(_, h)| **h >= point)
      .map(|(l, h)| (*l, *h))
  }
}

/// Dependence depth analysis of a scope.
struct DependenceDepth<'s> {
  scope: &'s Scope,
  /// Depth of each analyzed symbol, `None` while in progress.
  depths: HashMap<SymbolId, Option<usize>>,
  buckets: Vec<Vec<Variable>>,
  alias_syms: HashSet<SymbolId>,
  stores: Vec<Variable>,
}

impl<'s> DependenceDepth<'s> {
  fn new(scope: &'s Scope) -> Self {
    Self {
      scope,
      depths: HashMap::new(),
      buckets: Vec::new(),
      alias_syms: HashSet::new(),
      stores: Vec::new(),
    }
  }

  /// Builds the interval stores of overlapping variables.
  fn analyze_aliases(&mut self) {
    let mut intervals = IntervalSet::default();
    let candidates: Vec<_> = self
      .scope
      .iter()
      .filter(|(_, sym)| !skip_alias(sym))
      .collect();
    for (_, sym) in &candidates {
      intervals.merge(sym.offset, sym.offset + sym.size.max(1) - 1);
    }
    let mut alias_sets: BTreeMap<usize, (Vec<SymbolId>, bool)> = BTreeMap::new();
    for (id, sym) in &candidates {
      if let Some((lo, _)) = intervals.find(sym.offset) {
        let set = alias_sets.entry(lo).or_default();
        set.0.push(*id);
        set.1 |= is_global(sym);
      }
    }
    for (lo, (members, global)) in alias_sets {
      if members.len() < 2 {
        continue;
      }
      self.alias_syms.extend(members.iter().copied());
      let (lo, hi) = intervals.find(lo).expect("interval does not exist");
      self.stores.push(Variable::IntervalStore {
        offset: lo,
        size: hi - lo + 1,
        global,
        members,
      });
    }
  }

  /// Returns the dependence height of the given symbol, and appends it to
  /// the bucket of its height once analyzed.
  fn analyze(&mut self, id: SymbolId) -> usize {
    match self.depths.get(&id) {
      Some(Some(depth)) => return *depth,
      // cyclic dependence
      Some(None) => return 0,
      None => {}
    }
    self.depths.insert(id, None);
    let sym = self.scope.symbol(id);
    let details = match &sym.details {
      Details::Object(details) => details,
      Details::DerivedType => panic!("derived type '{}' can not be analyzed", sym.name),
      _ => {
        self.depths.insert(id, Some(0));
        return 0;
      }
    };
    let mut global = sym.attrs.saved || sym.attrs.in_common;
    // aliases come after their stores
    let mut depth = if self.alias_syms.contains(&id) { 1 } else { 0 };
    let mut deps: Vec<SymbolId> = Vec::new();
    if let Some(len) = &details.char_len {
      deps.extend(&len.symbols);
    }
    for Bounds { lower, upper } in details.shape.iter().chain(&details.coshape) {
      for bound in lower.iter().chain(upper) {
        deps.extend(&bound.symbols);
      }
    }
    if let Some(init) = &details.init {
      global = true;
      deps.extend(&init.symbols);
    }
    for dep in deps {
      depth = depth.max(self.analyze(dep) + 1);
    }
    let alias_offset = if self.alias_syms.contains(&id) {
      Some(self.find_store(sym.offset))
    } else {
      None
    };
    if self.buckets.len() <= depth {
      self.buckets.resize_with(depth + 1, Vec::new);
    }
    self.buckets[depth].push(Variable::Nominal {
      symbol: id,
      depth,
      global,
      heap_alloc: sym.attrs.allocatable,
      pointer: sym.attrs.pointer,
      target: sym.attrs.target,
      alias_offset,
    });
    self.depths.insert(id, Some(depth));
    depth
  }

  /// Returns the offset of the store containing the given offset.
  fn find_store(&self, offset: usize) -> usize {
    self
      .stores
      .iter()
      .find_map(|store| match store {
        Variable::IntervalStore { offset: lo, size, .. } if offset >= *lo && offset < lo + size => {
          Some(*lo)
        }
        _ => None,
      })
      .expect("interval store does not exist")
  }

  fn finish(self) -> Vec<Variable> {
    self
      .stores
      .into_iter()
      .chain(self.buckets.into_iter().flatten())
      .collect()
  }
}

/// Checks if the symbol takes no part in storage overlap analysis.
fn skip_alias(sym: &Symbol) -> bool {
  !matches!(sym.details, Details::Object(_)) || sym.attrs.in_common
}

/// Checks if the storage of the symbol is static.
fn is_global(sym: &Symbol) -> bool {
  let initialized = matches!(&sym.details, Details::Object(d) if d.init.is_some());
  sym.attrs.saved || sym.attrs.in_common || initialized
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::pft::syntax::{Expr, ObjectDetails, SymbolAttrs, TypeCategory};

  fn object(category: TypeCategory) -> ObjectDetails {
    ObjectDetails::scalar(category)
  }

  fn position(vars: &[Variable], id: SymbolId) -> usize {
    vars.iter().position(|v| v.symbol() == Some(id)).unwrap()
  }

  #[test]
  fn bounds_dependence() {
    let mut scope = Scope::new();
    let n = scope.add(Symbol::new("n", Details::Object(object(TypeCategory::Integer))));
    let mut arr = object(TypeCategory::Real);
    arr.shape.push(Bounds {
      lower: None,
      upper: Some(Expr::of(TypeCategory::Integer, vec![n])),
    });
    // sorts before `n`
    let a = scope.add(Symbol::new("arr", Details::Object(arr)));
    scope.add(Symbol::new("f", Details::Procedure));
    let vars = order_variables(&scope);
    assert_eq!(vars.len(), 2);
    assert!(position(&vars, n) < position(&vars, a));
    assert_eq!(vars[position(&vars, n)].depth(), 0);
    assert_eq!(vars[position(&vars, a)].depth(), 1);
  }

  #[test]
  fn dependence_chains() {
    // `v0` depends on nothing, each `vi` on `v(i-1)`, declared in reverse
    for len in 1..8 {
      let mut scope = Scope::new();
      let mut prev: Option<SymbolId> = None;
      let mut ids = Vec::new();
      for i in 0..len {
        let mut details = object(TypeCategory::Character);
        if let Some(prev) = prev {
          details.char_len = Some(Expr::of(TypeCategory::Integer, vec![prev]));
        }
        let name = format!("v{}", len - i);
        let id = scope.add(Symbol::new(&name, Details::Object(details)));
        ids.push(id);
        prev = Some(id);
      }
      let vars = order_variables(&scope);
      assert_eq!(vars.len(), len);
      for pair in ids.windows(2) {
        assert!(position(&vars, pair[0]) < position(&vars, pair[1]));
      }
      for (i, id) in ids.iter().enumerate() {
        assert_eq!(vars[position(&vars, *id)].depth(), i);
      }
    }
  }

  #[test]
  fn alias_merge() {
    let mut scope = Scope::new();
    let x = scope.add(Symbol::new("x", Details::Object(object(TypeCategory::Real))).with_storage(0, 4));
    let i = scope.add(Symbol::new("i", Details::Object(object(TypeCategory::Integer))).with_storage(0, 4));
    let y = scope.add(Symbol::new("y", Details::Object(object(TypeCategory::Real))).with_storage(8, 4));
    scope.add_equivalence(vec![i, x]);
    let vars = order_variables(&scope);
    let stores: Vec<_> = vars
      .iter()
      .filter(|v| matches!(v, Variable::IntervalStore { .. }))
      .collect();
    assert_eq!(stores.len(), 1);
    assert_eq!(
      stores[0],
      &Variable::IntervalStore {
        offset: 0,
        size: 4,
        global: false,
        members: vec![i, x],
      }
    );
    // the store comes first, its members after it
    assert!(matches!(vars[0], Variable::IntervalStore { .. }));
    for member in [i, x] {
      match &vars[position(&vars, member)] {
        Variable::Nominal {
          depth,
          alias_offset,
          ..
        } => {
          assert_eq!(*depth, 1);
          assert_eq!(*alias_offset, Some(0));
        }
        _ => unreachable!(),
      }
    }
    match &vars[position(&vars, y)] {
      Variable::Nominal { alias_offset, .. } => assert!(alias_offset.is_none()),
      _ => unreachable!(),
    }
    assert_eq!(vars[0].display(&scope).to_string(), "interval[0, 4]:, vars: {i, x}");
  }

  #[test]
  fn partial_overlap() {
    let mut scope = Scope::new();
    let attrs = SymbolAttrs {
      saved: true,
      ..SymbolAttrs::default()
    };
    let a = scope.add(
      Symbol::new("a", Details::Object(object(TypeCategory::Real)))
        .with_storage(0, 8)
        .with_attrs(attrs),
    );
    let b = scope.add(Symbol::new("b", Details::Object(object(TypeCategory::Real))).with_storage(4, 8));
    scope.add_equivalence(vec![a, b]);
    let vars = order_variables(&scope);
    assert_eq!(
      vars[0],
      Variable::IntervalStore {
        offset: 0,
        size: 12,
        global: true,
        members: vec![a, b],
      }
    );
    assert_eq!(
      vars[position(&vars, b)].display(&scope).to_string(),
      "symbol: b (depth: 1), equivalence(0)"
    );
    assert_eq!(
      vars[position(&vars, a)].display(&scope).to_string(),
      "symbol: a (depth: 1), global, equivalence(0)"
    );
  }

  #[test]
  fn flags() {
    let mut scope = Scope::new();
    let attrs = SymbolAttrs {
      allocatable: true,
      target: true,
      ..SymbolAttrs::default()
    };
    let mut init = object(TypeCategory::Integer);
    init.init = Some(Expr::constant(TypeCategory::Integer));
    let p = scope.add(Symbol::new("p", Details::Object(init)));
    let h = scope.add(Symbol::new("h", Details::Object(object(TypeCategory::Real))).with_attrs(attrs));
    let vars = order_variables(&scope);
    assert_eq!(vars[position(&vars, p)].display(&scope).to_string(), "symbol: p (depth: 0), global");
    assert_eq!(
      vars[position(&vars, h)].display(&scope).to_string(),
      "symbol: h (depth: 0), allocatable, target"
    );
  }

  #[test]
  #[should_panic]
  fn derived_type() {
    let mut scope = Scope::new();
    scope.add(Symbol::new("t", Details::DerivedType));
    order_variables(&scope);
  }

  #[test]
  fn interval_set() {
    let mut set = IntervalSet::default();
    set.merge(0, 3);
    set.merge(8, 11);
    assert_eq!(set.find(2), Some((0, 3)));
    assert_eq!(set.find(5), None);
    set.merge(2, 9);
    assert_eq!(set.find(5), Some((0, 11)));
    assert_eq!(set.intervals.len(), 1);
  }
}
