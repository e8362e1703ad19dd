// The canonicalized pseudo-Boolean constraint and its cutting-planes operator set.
//
// A constraint is a linear inequality `Σ cᵢ·ℓᵢ ≥ R` maintained in canonical form: every
// coefficient strictly positive, R non-negative, and at most one polarity of each variable
// present. Every operator below takes a constraint in canonical form and produces one in
// canonical form; none of them mutate a constraint reachable from the database, only the
// evaluator's own stack copies (see evaluator.rs).
use std::cmp::Ordering;
use std::fmt;

use fxhash::{FxHashMap, FxHashSet};
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::error::{CheckerError, Result};
use crate::literal::{Literal, VariableTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    terms: FxHashMap<Literal, BigInt>,
    rhs: BigInt,
}

fn div_ceil_nonneg(x: &BigInt, d: &BigInt) -> BigInt {
    (x + d - BigInt::one()) / d
}

impl Constraint {
    /// Builds a constraint from an arbitrary term list and RHS, normalizing negative
    /// coefficients and a negative RHS per (I1)-(I4). Rejects a term list that mentions the
    /// same variable twice, in either polarity, as malformed input (a verifier error tied to
    /// `line`, since every public entry point into this constructor is parsing either an `a`,
    /// `u`, `i`, `j`, `e` line, or an OPB assertion).
    pub fn new(line: usize, raw_terms: Vec<(BigInt, Literal)>, rhs0: BigInt) -> Result<Constraint> {
        let mut seen: FxHashSet<_> = FxHashSet::default();
        let mut terms = FxHashMap::default();
        let mut rhs = rhs0;
        for (coef, lit) in raw_terms {
            let var = lit.var();
            if !seen.insert(var) {
                return Err(CheckerError::verify(
                    line,
                    format!("variable {} appears more than once in a constraint", var),
                ));
            }
            if coef.is_zero() {
                continue;
            }
            if coef.is_negative() {
                let flipped = lit.negate();
                rhs -= &coef;
                terms.insert(flipped, -coef);
            } else {
                terms.insert(lit, coef);
            }
        }
        if rhs.is_negative() {
            rhs = BigInt::zero();
        }
        Ok(Constraint { terms, rhs })
    }

    /// Like `new`, but for operators that rebuild a constraint from the terms of an existing
    /// canonical constraint. Those terms can never collide on a variable, so there is nothing
    /// for the caller to handle: if they did collide, that would be a bug in the operator
    /// itself, not malformed proof input.
    fn rebuild(raw_terms: Vec<(BigInt, Literal)>, rhs: BigInt) -> Constraint {
        Constraint::new(0, raw_terms, rhs)
            .expect("operator on a canonical constraint cannot introduce a duplicate variable")
    }

    pub fn empty(rhs: BigInt) -> Constraint {
        Constraint {
            terms: FxHashMap::default(),
            rhs: if rhs.is_negative() { BigInt::zero() } else { rhs },
        }
    }

    pub fn rhs(&self) -> &BigInt {
        &self.rhs
    }

    pub fn terms(&self) -> impl Iterator<Item = (Literal, &BigInt)> {
        self.terms.iter().map(|(lit, c)| (*lit, c))
    }

    pub fn coefficient(&self, lit: Literal) -> Option<&BigInt> {
        self.terms.get(&lit)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// `¬(Σcℓ ≥ R) ≡ Σ(−c)ℓ ≥ 1 − R`, canonicalized.
    pub fn negated(&self) -> Constraint {
        let raw = self.terms.iter().map(|(lit, c)| (-c.clone(), *lit)).collect();
        let rhs = BigInt::one() - &self.rhs;
        Constraint::rebuild(raw, rhs)
    }

    /// Given one half `Σcℓ ≥ R` of an equality `Σcℓ = R`, returns the other half `Σcℓ ≤ R`.
    pub fn other_half_of_equality(&self) -> Constraint {
        let raw = self.terms.iter().map(|(lit, c)| (-c.clone(), *lit)).collect();
        let rhs = -self.rhs.clone();
        Constraint::rebuild(raw, rhs)
    }

    /// Coefficient-wise addition with literal cancellation. Must branch strictly on
    /// `a > c'`, `a = c'`, `a < c'`: collapsing this into two independent `if`s can
    /// double-apply the cancellation when the opposing coefficients are equal.
    pub fn add(mut self, other: &Constraint) -> Constraint {
        let mut rhs = self.rhs;
        for (lit, coef) in &other.terms {
            let opposite = lit.negate();
            if let Some(existing) = self.terms.get(lit).cloned() {
                self.terms.insert(*lit, existing + coef);
            } else if let Some(existing) = self.terms.get(&opposite).cloned() {
                match existing.cmp(coef) {
                    Ordering::Greater => {
                        rhs -= coef;
                        self.terms.insert(opposite, existing - coef);
                    }
                    Ordering::Equal => {
                        rhs -= coef;
                        self.terms.remove(&opposite);
                    }
                    Ordering::Less => {
                        rhs -= &existing;
                        self.terms.remove(&opposite);
                        self.terms.insert(*lit, coef - &existing);
                    }
                }
            } else {
                self.terms.insert(*lit, coef.clone());
            }
        }
        rhs += &other.rhs;
        Constraint { terms: self.terms, rhs }
    }

    pub fn multiply(mut self, line: usize, m: &BigInt) -> Result<Constraint> {
        if !m.is_positive() {
            return Err(CheckerError::verify(line, format!("multiply by non-positive {}", m)));
        }
        for coef in self.terms.values_mut() {
            *coef *= m;
        }
        self.rhs *= m;
        Ok(self)
    }

    pub fn divide(mut self, line: usize, d: &BigInt) -> Result<Constraint> {
        if !d.is_positive() {
            return Err(CheckerError::verify(line, format!("divide by non-positive {}", d)));
        }
        for coef in self.terms.values_mut() {
            *coef = div_ceil_nonneg(coef, d);
        }
        self.rhs = div_ceil_nonneg(&self.rhs, d);
        Ok(self)
    }

    pub fn saturate(mut self) -> Constraint {
        let rhs = self.rhs.clone();
        for coef in self.terms.values_mut() {
            if *coef > rhs {
                *coef = rhs.clone();
            }
        }
        self
    }

    pub fn equals(&self, other: &Constraint) -> bool {
        self.terms == other.terms && self.rhs == other.rhs
    }

    /// A cheap sufficient test that every model of `self` satisfies `other`. Incomplete by
    /// design: a `false` result does not mean the implication fails, only that this quick
    /// check couldn't show it.
    pub fn syntactically_implies(&self, other: &Constraint) -> bool {
        let mut delta = BigInt::zero();
        for (lit, d) in &other.terms {
            let opposite = lit.negate();
            if let Some(a) = self.terms.get(&opposite) {
                delta += a;
            } else if let Some(a) = self.terms.get(lit) {
                if a > d {
                    delta += a - d;
                }
            }
        }
        other.rhs <= &self.rhs - &delta
    }

    /// True iff this is the canonical unsatisfiable constraint `0 ≥ R` with `R > 0`.
    pub fn is_contradiction(&self) -> bool {
        self.terms.is_empty() && self.rhs.is_positive()
    }

    pub fn display<'a>(&'a self, table: &'a VariableTable) -> ConstraintDisplay<'a> {
        ConstraintDisplay { constraint: self, table }
    }
}

pub struct ConstraintDisplay<'a> {
    constraint: &'a Constraint,
    table: &'a VariableTable,
}

impl<'a> fmt::Display for ConstraintDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut terms: Vec<_> = self.constraint.terms.iter().collect();
        terms.sort_by_key(|(lit, _)| lit.var().index());
        for (lit, coef) in terms {
            write!(f, "{} {} ", coef, self.table.literal_name(lit))?;
        }
        write!(f, ">= {}", self.constraint.rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(table: &mut VariableTable, name: &str) -> Literal {
        table.parse_literal(name)
    }

    fn c(line: usize, terms: Vec<(i64, Literal)>, rhs: i64) -> Constraint {
        let raw = terms
            .into_iter()
            .map(|(coef, l)| (BigInt::from(coef), l))
            .collect();
        Constraint::new(line, raw, BigInt::from(rhs)).unwrap()
    }

    #[test]
    fn negative_coefficients_move_into_the_literal() {
        let mut t = VariableTable::new();
        let x1 = lit(&mut t, "x1");
        // -1 x1 >= 1  ==  1 ~x1 >= 0
        let constraint = c(1, vec![(-1, x1)], 1);
        assert_eq!(constraint.coefficient(x1.negate()), Some(&BigInt::from(1)));
        assert_eq!(constraint.rhs(), &BigInt::from(0));
    }

    #[test]
    fn duplicate_variable_is_rejected() {
        let mut t = VariableTable::new();
        let x1 = lit(&mut t, "x1");
        let err = Constraint::new(3, vec![(BigInt::from(1), x1), (BigInt::from(1), x1.negate())], BigInt::from(0));
        assert!(matches!(err, Err(CheckerError::Verify { line: 3, .. })));
    }

    #[test]
    fn double_negation_is_semantically_identity() {
        let mut t = VariableTable::new();
        let x1 = lit(&mut t, "x1");
        let x2 = lit(&mut t, "x2");
        let constraint = c(1, vec![(2, x1), (3, x2)], 4);
        let back = constraint.negated().negated();
        assert!(constraint.equals(&back));
    }

    #[test]
    fn add_cancels_opposite_literals_with_equal_coefficients() {
        // 1 x1 1 x2 >= 1  +  1 ~x1 1 x2 >= 1  =>  2 x2 >= 1
        let mut t = VariableTable::new();
        let x1 = lit(&mut t, "x1");
        let x2 = lit(&mut t, "x2");
        let a = c(1, vec![(1, x1), (1, x2)], 1);
        let b = c(1, vec![(1, x1.negate()), (1, x2)], 1);
        let sum = a.add(&b);
        assert_eq!(sum.coefficient(x1), None);
        assert_eq!(sum.coefficient(x1.negate()), None);
        assert_eq!(sum.coefficient(x2), Some(&BigInt::from(2)));
        assert_eq!(sum.rhs(), &BigInt::from(1));
    }

    #[test]
    fn add_is_commutative() {
        let mut t = VariableTable::new();
        let x1 = lit(&mut t, "x1");
        let x2 = lit(&mut t, "x2");
        let a = c(1, vec![(3, x1), (1, x2.negate())], 2);
        let b = c(1, vec![(1, x1.negate()), (2, x2)], 1);
        let ab = a.clone().add(&b);
        let ba = b.add(&a);
        assert!(ab.equals(&ba));
    }

    #[test]
    fn divide_rounds_up() {
        let mut t = VariableTable::new();
        let x1 = lit(&mut t, "x1");
        let x2 = lit(&mut t, "x2");
        let constraint = c(1, vec![(3, x1), (2, x2)], 2);
        let divided = constraint.divide(1, &BigInt::from(2)).unwrap();
        assert_eq!(divided.coefficient(x1), Some(&BigInt::from(2)));
        assert_eq!(divided.coefficient(x2), Some(&BigInt::from(1)));
        assert_eq!(divided.rhs(), &BigInt::from(1));
    }

    #[test]
    fn saturate_clamps_to_rhs() {
        let mut t = VariableTable::new();
        let x1 = lit(&mut t, "x1");
        let x2 = lit(&mut t, "x2");
        let x3 = lit(&mut t, "x3");
        let constraint = c(1, vec![(3, x1), (2, x2), (1, x3)], 2);
        let saturated = constraint.saturate();
        assert_eq!(saturated.coefficient(x1), Some(&BigInt::from(2)));
        assert_eq!(saturated.coefficient(x2), Some(&BigInt::from(2)));
        assert_eq!(saturated.coefficient(x3), Some(&BigInt::from(1)));
        assert_eq!(saturated.rhs(), &BigInt::from(2));
    }

    #[test]
    fn syntactic_implication_example() {
        let mut t = VariableTable::new();
        let x1 = lit(&mut t, "x1");
        let x2 = lit(&mut t, "x2");
        // 2 x1 2 x2 >= 2  implies  1 x1 1 x2 >= 1
        let strong = c(1, vec![(2, x1), (2, x2)], 2);
        let weak = c(1, vec![(1, x1), (1, x2)], 1);
        assert!(strong.syntactically_implies(&weak));
    }

    #[test]
    fn multiply_rejects_non_positive() {
        let mut t = VariableTable::new();
        let x1 = lit(&mut t, "x1");
        let constraint = c(1, vec![(1, x1)], 1);
        assert!(constraint.multiply(7, &BigInt::from(0)).is_err());
    }
}
