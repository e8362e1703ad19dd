// Dispatches each line of a proof to its rule handler and maintains the checker's running
// state: the constraint database, the variable table, the objective (once an instance has been
// loaded), and whether a contradiction has been found.
use fxhash::FxHashSet;
use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::constraint::Constraint;
use crate::database::ConstraintDatabase;
use crate::error::{CheckerError, Result};
use crate::evaluator;
use crate::instance;
use crate::literal::{Literal, Variable, VariableTable};
use crate::propagate::{self, PropagationResult};
use crate::token::Line;

pub struct ProofEngine {
    pub table: VariableTable,
    db: ConstraintDatabase,
    objective: Option<Vec<(BigInt, Literal)>>,
    vars_in_model: FxHashSet<Variable>,
    pub contradiction_found: bool,
    pub verbose: bool,
}

impl ProofEngine {
    pub fn new() -> ProofEngine {
        ProofEngine {
            table: VariableTable::new(),
            db: ConstraintDatabase::new(),
            objective: None,
            vars_in_model: FxHashSet::default(),
            contradiction_found: false,
            verbose: false,
        }
    }

    fn insert(&mut self, constraint: Constraint) -> u64 {
        let id = self.db.insert(constraint);
        if self.verbose {
            println!("  {}: {}", id, self.db.get(0, id).unwrap().display(&self.table));
        }
        id
    }

    /// Loads the OPB instance named by an `f` line, inserting its assertions and recording its
    /// objective. `text` is the full text of the instance file.
    pub fn load_instance(&mut self, line: usize, text: &str) -> Result<()> {
        let parsed = instance::parse(text, &mut self.table)?;
        let before = self.db.len();
        for assertion in parsed.assertions {
            self.insert(assertion);
        }
        self.objective = parsed.objective;
        self.recompute_vars_in_model();

        if let Some((declared_vars, declared_constraints)) = parsed.declared_counts {
            if declared_vars as usize != self.vars_in_model.len() {
                eprintln!("Warning: number of vars disagrees with first line of OPB file.");
            }
            let expected_constraints = before + declared_constraints as usize;
            if expected_constraints != self.db.len() {
                eprintln!("Warning: number of constraints disagrees with first line of OPB file.");
            }
        }
        let _ = line;
        Ok(())
    }

    fn recompute_vars_in_model(&mut self) {
        let mut vars = FxHashSet::default();
        for constraint in self.db.iter() {
            for (lit, _) in constraint.terms() {
                vars.insert(lit.var());
            }
        }
        if let Some(objective) = &self.objective {
            for (_, lit) in objective {
                vars.insert(lit.var());
            }
        }
        self.vars_in_model = vars;
    }

    fn parse_leading_id(line: &Line) -> Result<u64> {
        let id_tok = line
            .tokens
            .get(1)
            .ok_or_else(|| CheckerError::parse(line.number, "missing constraint id"))?;
        id_tok
            .parse()
            .map_err(|_| CheckerError::parse(line.number, format!("bad constraint id '{}'", id_tok)))
    }

    /// Shared by `o` and `v`: checks that propagating the database together with `assignment`
    /// neither falsifies anything nor stalls before every variable in the model is known.
    fn check_full_assignment(&self, line: usize, assignment: &Constraint, rule: &str) -> Result<()> {
        let mut all: Vec<&Constraint> = self.db.iter().collect();
        all.push(assignment);
        match propagate::propagate_watched(&all) {
            PropagationResult::Falsified => {
                Err(CheckerError::verify(line, format!("'{}' rule's assignment contradicts the database", rule)))
            }
            PropagationResult::Known(known) => {
                let known_vars: FxHashSet<Variable> = known.iter().map(|l| l.var()).collect();
                if self.vars_in_model.iter().all(|v| known_vars.contains(v)) {
                    Ok(())
                } else {
                    Err(CheckerError::verify(
                        line,
                        format!("'{}' rule's assignment does not fix every variable in the model", rule),
                    ))
                }
            }
        }
    }

    fn handle_a(&mut self, line: &Line) -> Result<()> {
        let (constraint, _) = instance::parse_opb_constraint(line.number, &line.tokens[1..], &mut self.table, false)?;
        self.insert(constraint);
        Ok(())
    }

    fn handle_p(&mut self, line: &Line) -> Result<()> {
        let constraint = evaluator::evaluate(line.number, &line.tokens[1..], &self.db, &mut self.table)?;
        self.insert(constraint);
        Ok(())
    }

    fn handle_u(&mut self, line: &Line) -> Result<()> {
        let (constraint, _) = instance::parse_opb_constraint(line.number, &line.tokens[1..], &mut self.table, false)?;
        let opposite = constraint.negated();
        let mut all: Vec<&Constraint> = self.db.iter().collect();
        all.push(&opposite);
        if !matches!(propagate::propagate_watched(&all), PropagationResult::Falsified) {
            return Err(CheckerError::verify(
                line.number,
                "reverse unit propagation did not reach a contradiction",
            ));
        }
        self.insert(constraint);
        Ok(())
    }

    fn handle_i(&mut self, line: &Line) -> Result<()> {
        let k = Self::parse_leading_id(line)?;
        let (candidate, _) = instance::parse_opb_constraint(line.number, &line.tokens[2..], &mut self.table, false)?;
        let known = self.db.get(line.number, k)?;
        if !known.syntactically_implies(&candidate) {
            return Err(CheckerError::verify(
                line.number,
                format!("constraint {} does not syntactically imply the given constraint", k),
            ));
        }
        Ok(())
    }

    fn handle_j(&mut self, line: &Line) -> Result<()> {
        let k = Self::parse_leading_id(line)?;
        let (candidate, _) = instance::parse_opb_constraint(line.number, &line.tokens[2..], &mut self.table, false)?;
        {
            let known = self.db.get(line.number, k)?;
            if !known.syntactically_implies(&candidate) {
                return Err(CheckerError::verify(
                    line.number,
                    format!("constraint {} does not syntactically imply the given constraint", k),
                ));
            }
        }
        self.insert(candidate);
        Ok(())
    }

    fn handle_e(&mut self, line: &Line) -> Result<()> {
        let k = Self::parse_leading_id(line)?;
        let (candidate, _) = instance::parse_opb_constraint(line.number, &line.tokens[2..], &mut self.table, false)?;
        let known = self.db.get(line.number, k)?;
        if !known.equals(&candidate) {
            return Err(CheckerError::verify(
                line.number,
                format!("constraint {} is not syntactically equal to the given constraint", k),
            ));
        }
        Ok(())
    }

    fn parse_assignment(&mut self, line: &Line) -> Result<Constraint> {
        let literals: Vec<Literal> = line.tokens[1..].iter().map(|t| self.table.parse_literal(t)).collect();
        let rhs = BigInt::from(literals.len());
        let raw: Vec<(BigInt, Literal)> = literals.into_iter().map(|l| (BigInt::from(1), l)).collect();
        Constraint::new(line.number, raw, rhs)
    }

    fn handle_o(&mut self, line: &Line) -> Result<()> {
        let assignment = self.parse_assignment(line)?;
        let objective = self.objective.clone().unwrap_or_default();
        let vars_in_line: FxHashSet<Variable> = assignment.terms().map(|(lit, _)| lit.var()).collect();
        for (_, lit) in &objective {
            if !vars_in_line.contains(&lit.var()) {
                return Err(CheckerError::verify(
                    line.number,
                    "a variable in the objective does not appear in the 'o' line",
                ));
            }
        }
        self.check_full_assignment(line.number, &assignment, "o")?;

        let satisfied: FxHashSet<Literal> = assignment.terms().map(|(lit, _)| lit).collect();
        let mut f_star = BigInt::zero();
        for (coef, lit) in &objective {
            if satisfied.contains(lit) {
                f_star += coef;
            }
        }
        let raw_bound: Vec<(BigInt, Literal)> = objective.iter().map(|(c, l)| (-c.clone(), *l)).collect();
        let bound = Constraint::new(line.number, raw_bound, BigInt::one() - f_star)?;
        self.insert(bound);
        Ok(())
    }

    fn handle_v(&mut self, line: &Line) -> Result<()> {
        let assignment = self.parse_assignment(line)?;
        self.check_full_assignment(line.number, &assignment, "v")?;
        self.insert(assignment.negated());
        Ok(())
    }

    fn handle_d(&mut self, line: &Line) -> Result<()> {
        let ids = &line.tokens[1..];
        if ids.last().copied() != Some("0") {
            return Err(CheckerError::parse(line.number, "'d' rule must be terminated by 0"));
        }
        for tok in &ids[..ids.len() - 1] {
            let id: u64 = tok
                .parse()
                .map_err(|_| CheckerError::parse(line.number, format!("bad constraint id '{}'", tok)))?;
            self.db.delete(id);
        }
        Ok(())
    }

    fn handle_set_level(&mut self, line: &Line) -> Result<()> {
        let tok = line
            .tokens
            .get(1)
            .ok_or_else(|| CheckerError::parse(line.number, "'#' rule needs a level"))?;
        let level: i64 = tok
            .parse()
            .map_err(|_| CheckerError::parse(line.number, format!("bad level '{}'", tok)))?;
        self.db.set_level(level);
        Ok(())
    }

    fn handle_wipe(&mut self, line: &Line) -> Result<()> {
        let tok = line
            .tokens
            .get(1)
            .ok_or_else(|| CheckerError::parse(line.number, "'w' rule needs a level"))?;
        let level: i64 = tok
            .parse()
            .map_err(|_| CheckerError::parse(line.number, format!("bad level '{}'", tok)))?;
        self.db.wipe_level(level);
        Ok(())
    }

    fn handle_c(&mut self, line: &Line) -> Result<()> {
        let tok = line
            .tokens
            .get(1)
            .ok_or_else(|| CheckerError::parse(line.number, "'c' rule needs a constraint id"))?;
        let id: u64 = tok
            .parse()
            .map_err(|_| CheckerError::parse(line.number, format!("bad constraint id '{}'", tok)))?;
        let constraint = self.db.get(line.number, id)?;
        if constraint.is_contradiction() {
            self.contradiction_found = true;
            Ok(())
        } else {
            Err(CheckerError::verify(
                line.number,
                format!("constraint {} is not an empty constraint with positive right-hand side", id),
            ))
        }
    }

    /// Processes one tokenized proof line. `load_instance_text` supplies the contents of the
    /// OPB file named on an `f` line, since the engine itself never touches the filesystem.
    pub fn process_line(&mut self, line: &Line, load_instance_text: impl FnOnce() -> Result<String>) -> Result<()> {
        match line.tokens[0] {
            tok if tok.starts_with('*') => {}
            "pseudo-Boolean" => {}
            "f" => {
                let text = load_instance_text()?;
                self.load_instance(line.number, &text)?;
            }
            "a" => self.handle_a(line)?,
            "p" => self.handle_p(line)?,
            "u" => self.handle_u(line)?,
            "i" => self.handle_i(line)?,
            "j" => self.handle_j(line)?,
            "e" => self.handle_e(line)?,
            "o" => self.handle_o(line)?,
            "v" => self.handle_v(line)?,
            "d" => self.handle_d(line)?,
            "#" => self.handle_set_level(line)?,
            "w" => self.handle_wipe(line)?,
            "c" => self.handle_c(line)?,
            other => return Err(CheckerError::parse(line.number, format!("unrecognized rule '{}'", other))),
        }
        Ok(())
    }
}

impl Default for ProofEngine {
    fn default() -> ProofEngine {
        ProofEngine::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize_lines;
    use indoc::indoc;

    fn run(proof: &str, instance: &str) -> Result<ProofEngine> {
        let mut engine = ProofEngine::new();
        for line in tokenize_lines(proof) {
            engine.process_line(&line, || Ok(instance.to_string()))?;
        }
        Ok(engine)
    }

    #[test]
    fn assert_then_contradict_on_a_unit_conflict() {
        let instance = "* #variable= 1 #constraint= 0\n";
        let proof = indoc! {"
            pseudo-Boolean
            f 1
            a 1 x1 >= 1 ;
            a 1 ~x1 >= 1 ;
            p 1 2 + 0
            c 3
        "};
        let engine = run(proof, instance).unwrap();
        assert!(engine.contradiction_found);
    }

    #[test]
    fn rup_accepts_a_constraint_implied_by_propagation() {
        let instance = indoc! {"
            * #variable= 2 #constraint= 1
            1 x1 1 x2 >= 1 ;
        "};
        let proof = "pseudo-Boolean\nf 1\nu 1 x1 1 x2 >= 1 ;\n";
        // RUP on a constraint already present should succeed trivially.
        assert!(run(proof, instance).is_ok());
    }

    #[test]
    fn rup_rejects_an_unsupported_constraint() {
        let instance = "* #variable= 2 #constraint= 0\n";
        let proof = "pseudo-Boolean\nf 1\nu 1 x1 >= 1 ;\n";
        assert!(run(proof, instance).is_err());
    }

    #[test]
    fn deleting_a_constraint_makes_its_id_unusable() {
        let instance = "* #variable= 1 #constraint= 1\n1 x1 >= 1 ;\n";
        let proof = "pseudo-Boolean\nf 1\nd 1 0\ne 1 1 x1 >= 1 ;\n";
        assert!(run(proof, instance).is_err());
    }

    #[test]
    fn wiping_a_level_removes_constraints_introduced_there() {
        let instance = "* #variable= 1 #constraint= 0\n";
        let proof = indoc! {"
            pseudo-Boolean
            f 1
            # 1
            a 1 x1 >= 1 ;
            w 1
            e 2 1 x1 >= 1 ;
        "};
        assert!(run(proof, instance).is_err());
    }

    #[test]
    fn o_rule_rejects_a_line_missing_an_objective_variable() {
        let instance = indoc! {"
            * #variable= 2 #constraint= 1
            min: 1 x1 1 x2 ;
            1 x1 1 x2 >= 1 ;
        "};
        // x2 is in the objective but not mentioned in the 'o' line itself.
        let proof = "pseudo-Boolean\nf 1\no x1\n";
        assert!(run(proof, instance).is_err());
    }

    #[test]
    fn o_rule_accepts_a_line_covering_every_objective_variable() {
        let instance = indoc! {"
            * #variable= 2 #constraint= 1
            min: 1 x1 1 x2 ;
            1 x1 1 x2 >= 1 ;
        "};
        let proof = "pseudo-Boolean\nf 1\no x1 ~x2\n";
        assert!(run(proof, instance).is_ok());
    }
}
