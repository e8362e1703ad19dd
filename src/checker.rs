// The top-level driver: reads the proof file line by line, lazily loads the instance file the
// first time an `f` rule asks for it, and reports whether the proof reached a contradiction.
use std::fs;
use std::path::Path;

use crate::engine::ProofEngine;
use crate::error::{CheckerError, Result};
use crate::token::tokenize_lines;

/// The result of checking a complete proof.
pub struct Outcome {
    pub contradiction_found: bool,
}

/// Checks `proof_path` against `instance_path`. When `verbose` is set, every proof line is
/// echoed as it is read and every constraint is echoed as it enters the database; otherwise a
/// running percentage is printed to stderr so a long proof still shows signs of life.
pub fn check(instance_path: &Path, proof_path: &Path, verbose: bool) -> Result<Outcome> {
    let proof_text = fs::read_to_string(proof_path)
        .map_err(|e| CheckerError::parse(0, format!("cannot read '{}': {}", proof_path.display(), e)))?;

    let mut engine = ProofEngine::new();
    engine.verbose = verbose;

    let lines = tokenize_lines(&proof_text);
    let total = lines.len();
    for (i, line) in lines.iter().enumerate() {
        if verbose {
            println!("{}", line.tokens.join(" "));
        } else if total > 0 {
            eprint!("\r{}% ", (i + 1) * 100 / total);
        }
        engine.process_line(line, || {
            fs::read_to_string(instance_path).map_err(|e| {
                CheckerError::parse(line.number, format!("cannot read '{}': {}", instance_path.display(), e))
            })
        })?;
    }
    if !verbose && total > 0 {
        eprintln!();
    }

    Ok(Outcome {
        contradiction_found: engine.contradiction_found,
    })
}
