// Parses the OPB instance text: the header, the optional objective, and the assertions.
// Also used by the proof engine's `a`/`u`/`i`/`j`/`e` rule handlers to parse a single PB
// inequality argument, since both formats share the same `c1 l1 ... cn ln OP R ;` grammar.
use num_bigint::BigInt;

use crate::constraint::Constraint;
use crate::error::{CheckerError, Result};
use crate::literal::{Literal, VariableTable};
use crate::token::tokenize_lines;

pub struct ParsedInstance {
    /// `(#variable, #constraint)` as declared by the header line, if present.
    pub declared_counts: Option<(u64, u64)>,
    pub objective: Option<Vec<(BigInt, Literal)>>,
    /// Assertions in file order. An equality line contributes two entries back to back: the
    /// `≥` half, then the `≤` half.
    pub assertions: Vec<Constraint>,
}

fn parse_bigint(line: usize, token: &str) -> Result<BigInt> {
    token
        .parse::<BigInt>()
        .map_err(|_| CheckerError::parse(line, format!("'{}' is not an integer", token)))
}

/// Parses `c1 l1 c2 l2 ... cn ln OP R ;` (the rule letter and any leading id have already been
/// stripped by the caller). Returns the canonicalized `≥` form and whether the source line used
/// `=`. Equality is only permitted when parsing the instance body; every proof rule that embeds
/// a constraint argument (`a`, `u`, `i`, `j`, `e`) requires a plain `>=`.
pub fn parse_opb_constraint(
    line: usize,
    tokens: &[&str],
    table: &mut VariableTable,
    allow_equality: bool,
) -> Result<(Constraint, bool)> {
    if tokens.last().copied() != Some(";") {
        return Err(CheckerError::parse(line, "constraint must end with ';'"));
    }
    let body = &tokens[..tokens.len() - 1];
    if body.len() < 2 {
        return Err(CheckerError::parse(line, "constraint has no comparison operator"));
    }
    let rhs_tok = body[body.len() - 1];
    let op_tok = body[body.len() - 2];
    let is_equality = match op_tok {
        ">=" => false,
        "=" => true,
        _ => return Err(CheckerError::parse(line, format!("expected '>=' or '=', found '{}'", op_tok))),
    };
    if is_equality && !allow_equality {
        return Err(CheckerError::parse(line, "equality constraint not permitted here"));
    }
    let term_tokens = &body[..body.len() - 2];
    if term_tokens.len() % 2 != 0 {
        return Err(CheckerError::parse(line, "constraint has an unpaired coefficient or literal"));
    }
    let rhs = parse_bigint(line, rhs_tok)?;
    let mut raw = Vec::with_capacity(term_tokens.len() / 2);
    for pair in term_tokens.chunks(2) {
        let coef = parse_bigint(line, pair[0])?;
        let lit = table.parse_literal(pair[1]);
        raw.push((coef, lit));
    }
    let constraint = Constraint::new(line, raw, rhs)?;
    Ok((constraint, is_equality))
}

/// Parses `min: c1 l1 ... cn ln ;`. `tokens` excludes the leading `min:` token.
fn parse_objective(line: usize, tokens: &[&str], table: &mut VariableTable) -> Result<Vec<(BigInt, Literal)>> {
    if tokens.last().copied() != Some(";") {
        return Err(CheckerError::parse(line, "objective must end with ';'"));
    }
    let body = &tokens[..tokens.len() - 1];
    if body.len() % 2 != 0 {
        return Err(CheckerError::parse(line, "objective has an unpaired coefficient or literal"));
    }
    let mut objective = Vec::with_capacity(body.len() / 2);
    for pair in body.chunks(2) {
        let coef = parse_bigint(line, pair[0])?;
        let lit = table.parse_literal(pair[1]);
        objective.push((coef, lit));
    }
    Ok(objective)
}

pub fn parse(text: &str, table: &mut VariableTable) -> Result<ParsedInstance> {
    let lines = tokenize_lines(text);
    let mut declared_counts = None;
    let mut start = 0;
    if let Some(first) = lines.first() {
        if first.tokens.first().copied() == Some("*") && first.tokens.len() >= 5 && first.tokens[1] == "#variable=" {
            let v = first.tokens[2].parse::<u64>().ok();
            let c = first.tokens[4].parse::<u64>().ok();
            if let (Some(v), Some(c)) = (v, c) {
                declared_counts = Some((v, c));
            }
            start = 1;
        }
    }

    let mut objective = None;
    let mut assertions = Vec::new();
    for entry in &lines[start..] {
        let tokens = &entry.tokens;
        if tokens[0].starts_with('*') {
            continue;
        }
        if tokens[0] == "min:" {
            objective = Some(parse_objective(entry.number, &tokens[1..], table)?);
            continue;
        }
        let (constraint, is_equality) = parse_opb_constraint(entry.number, tokens, table, true)?;
        if is_equality {
            let other_half = constraint.other_half_of_equality();
            assertions.push(constraint);
            assertions.push(other_half);
        } else {
            assertions.push(constraint);
        }
    }

    Ok(ParsedInstance {
        declared_counts,
        objective,
        assertions,
    })
}
