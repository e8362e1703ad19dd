// Unit propagation over a set of pseudo-Boolean constraints, in two flavors that must always
// agree: `propagate_naive` rescans every constraint to a fixpoint and exists as the reference
// semantics; `propagate_watched` reaches the same fixpoint by only rescanning constraints whose
// assigned literals actually changed, using a literal -> constraint index built once per call.
use std::collections::VecDeque;

use fxhash::{FxHashMap, FxHashSet};
use num_traits::Signed;

use crate::constraint::Constraint;
use crate::literal::Literal;

#[derive(Debug, PartialEq, Eq)]
pub enum PropagationResult {
    /// Some constraint's slack went negative: the constraint set is unsatisfiable under the
    /// literals forced so far.
    Falsified,
    Known(FxHashSet<Literal>),
}

enum ScanOutcome {
    Falsified,
    Forced(Vec<Literal>),
    NoChange,
}

/// Computes slack (`Σc − R` over unassigned terms) for `constraint` given what's `known` so
/// far, and reports either a falsified constraint or any newly forced literals.
fn scan_constraint(constraint: &Constraint, known: &FxHashSet<Literal>) -> ScanOutcome {
    let mut slack = -constraint.rhs().clone();
    let mut unassigned = Vec::new();
    for (lit, coef) in constraint.terms() {
        if known.contains(&lit) {
            slack += coef;
        } else if known.contains(&lit.negate()) {
            // Discharged false: contributes nothing to either side.
        } else {
            slack += coef;
            unassigned.push((coef.clone(), lit));
        }
    }
    if slack.is_negative() {
        return ScanOutcome::Falsified;
    }
    let forced: Vec<Literal> = unassigned
        .into_iter()
        .filter(|(coef, _)| *coef > slack)
        .map(|(_, lit)| lit)
        .collect();
    if forced.is_empty() {
        ScanOutcome::NoChange
    } else {
        ScanOutcome::Forced(forced)
    }
}

/// Reference propagator: rescans every constraint every round until nothing new is forced.
pub fn propagate_naive(constraints: &[&Constraint]) -> PropagationResult {
    let mut known: FxHashSet<Literal> = FxHashSet::default();
    loop {
        let before = known.len();
        for constraint in constraints {
            match scan_constraint(constraint, &known) {
                ScanOutcome::Falsified => return PropagationResult::Falsified,
                ScanOutcome::Forced(lits) => known.extend(lits),
                ScanOutcome::NoChange => {}
            }
        }
        if known.len() == before {
            return PropagationResult::Known(known);
        }
    }
}

/// Indexed propagator: builds a `literal -> constraint indices` map once, seeds the worklist
/// with every constraint (the initial pass has to look at everything, just like the reference
/// propagator's first round), then after each newly forced literal `ℓ` only re-examines the
/// constraints that mention `¬ℓ` — those are the only ones whose slack can have shrunk.
/// Constraints mentioning `ℓ` only ever gain slack and cannot newly force anything, so they are
/// not requeued.
pub fn propagate_watched(constraints: &[&Constraint]) -> PropagationResult {
    let mut literal_index: FxHashMap<Literal, Vec<usize>> = FxHashMap::default();
    for (i, constraint) in constraints.iter().enumerate() {
        for (lit, _) in constraint.terms() {
            literal_index.entry(lit).or_default().push(i);
        }
    }

    let mut known: FxHashSet<Literal> = FxHashSet::default();
    let mut queued = vec![true; constraints.len()];
    let mut worklist: VecDeque<usize> = (0..constraints.len()).collect();

    while let Some(i) = worklist.pop_front() {
        queued[i] = false;
        match scan_constraint(constraints[i], &known) {
            ScanOutcome::Falsified => return PropagationResult::Falsified,
            ScanOutcome::Forced(lits) => {
                for lit in lits {
                    if known.insert(lit) {
                        if let Some(dependents) = literal_index.get(&lit.negate()) {
                            for &j in dependents {
                                if !queued[j] {
                                    queued[j] = true;
                                    worklist.push_back(j);
                                }
                            }
                        }
                    }
                }
            }
            ScanOutcome::NoChange => {}
        }
    }
    PropagationResult::Known(known)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::VariableTable;
    use num_bigint::BigInt;

    fn c(table: &mut VariableTable, terms: Vec<(i64, &str)>, rhs: i64) -> Constraint {
        let raw = terms
            .into_iter()
            .map(|(coef, name)| (BigInt::from(coef), table.parse_literal(name)))
            .collect();
        Constraint::new(1, raw, BigInt::from(rhs)).unwrap()
    }

    #[test]
    fn unit_constraint_forces_its_literal() {
        let mut t = VariableTable::new();
        let unit = c(&mut t, vec![(1, "x1")], 1);
        let refs = vec![&unit];
        let x1 = t.parse_literal("x1");
        match propagate_naive(&refs) {
            PropagationResult::Known(known) => assert!(known.contains(&x1)),
            PropagationResult::Falsified => panic!("should not be falsified"),
        }
    }

    #[test]
    fn chained_propagation_reaches_a_contradiction() {
        let mut t = VariableTable::new();
        let a = c(&mut t, vec![(1, "x1")], 1);
        let b = c(&mut t, vec![(1, "~x1"), (1, "x2")], 2);
        let contradiction = c(&mut t, vec![(1, "~x2")], 1);
        let refs = vec![&a, &b, &contradiction];
        assert_eq!(propagate_naive(&refs), PropagationResult::Falsified);
    }

    #[test]
    fn naive_and_watched_agree_on_a_propagation_chain() {
        let mut t = VariableTable::new();
        let a = c(&mut t, vec![(1, "x1")], 1);
        let b = c(&mut t, vec![(1, "~x1"), (1, "x2")], 2);
        let d = c(&mut t, vec![(1, "~x2"), (1, "x3")], 2);
        let refs = vec![&a, &b, &d];
        let naive = propagate_naive(&refs);
        let watched = propagate_watched(&refs);
        match (naive, watched) {
            (PropagationResult::Known(n), PropagationResult::Known(w)) => assert_eq!(n, w),
            _ => panic!("expected both propagators to reach the same non-falsified fixpoint"),
        }
    }

    #[test]
    fn naive_and_watched_agree_on_a_falsified_set() {
        let mut t = VariableTable::new();
        let a = c(&mut t, vec![(1, "x1")], 1);
        let b = c(&mut t, vec![(1, "~x1")], 1);
        let refs = vec![&a, &b];
        assert_eq!(propagate_naive(&refs), PropagationResult::Falsified);
        assert_eq!(propagate_watched(&refs), PropagationResult::Falsified);
    }

    #[test]
    fn an_empty_constraint_set_propagates_nothing() {
        let refs: Vec<&Constraint> = Vec::new();
        match propagate_watched(&refs) {
            PropagationResult::Known(known) => assert!(known.is_empty()),
            PropagationResult::Falsified => panic!("should not be falsified"),
        }
    }
}
