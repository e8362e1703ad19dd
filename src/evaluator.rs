// The cutting-planes stack machine that interprets a `p` rule's reverse-Polish trace.
//
// Grammar, read left to right until a terminating `0`:
//   <positive integer>        push a copy of that constraint id from the database
//   <literal>                 push the unit constraint `1·ℓ ≥ 0`
//   <positive integer> `*`     pop C, push C multiplied by the integer
//   <positive integer> `d`     pop C, push C divided (rounding up) by the integer
//   `s`                        pop C, push C saturated
//   `+`                       pop C2 then C1, push C1 + C2
// The trace must leave exactly one constraint on the stack.
use num_bigint::BigInt;

use crate::constraint::Constraint;
use crate::database::ConstraintDatabase;
use crate::error::{CheckerError, Result};
use crate::literal::VariableTable;

fn is_numeral(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

fn parse_bigint(line: usize, token: &str) -> Result<BigInt> {
    token
        .parse::<BigInt>()
        .map_err(|_| CheckerError::parse(line, format!("'{}' is not an integer", token)))
}

fn pop(stack: &mut Vec<Constraint>, line: usize) -> Result<Constraint> {
    stack
        .pop()
        .ok_or_else(|| CheckerError::verify(line, "cutting-planes trace popped an empty stack"))
}

pub fn evaluate(
    line: usize,
    tokens: &[&str],
    db: &ConstraintDatabase,
    table: &mut VariableTable,
) -> Result<Constraint> {
    let mut stack: Vec<Constraint> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        if is_numeral(token) && tokens.get(i + 1) == Some(&"*") {
            let operand = pop(&mut stack, line)?;
            let m = parse_bigint(line, token)?;
            stack.push(operand.multiply(line, &m)?);
            i += 2;
        } else if is_numeral(token) && tokens.get(i + 1) == Some(&"d") {
            let operand = pop(&mut stack, line)?;
            let d = parse_bigint(line, token)?;
            stack.push(operand.divide(line, &d)?);
            i += 2;
        } else if token == "s" {
            let operand = pop(&mut stack, line)?;
            stack.push(operand.saturate());
            i += 1;
        } else if token == "+" {
            let rhs = pop(&mut stack, line)?;
            let lhs = pop(&mut stack, line)?;
            stack.push(lhs.add(&rhs));
            i += 1;
        } else if is_numeral(token) {
            let id: u64 = token
                .parse()
                .map_err(|_| CheckerError::parse(line, format!("bad constraint id '{}'", token)))?;
            if id == 0 {
                break;
            }
            stack.push(db.get(line, id)?.clone());
            i += 1;
        } else {
            let lit = table.parse_literal(token);
            let unit = Constraint::new(line, vec![(BigInt::from(1), lit)], BigInt::from(0))?;
            stack.push(unit);
            i += 1;
        }
    }
    if stack.len() != 1 {
        return Err(CheckerError::verify(
            line,
            format!("cutting-planes trace left {} constraints on the stack instead of 1", stack.len()),
        ));
    }
    Ok(stack.pop().unwrap())
}
