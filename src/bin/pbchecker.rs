use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use pbchecker::checker;

/// Checks a machine-generated pseudo-Boolean refutation or optimization proof against an OPB
/// instance.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The OPB instance the proof refers to.
    instance: PathBuf,

    /// The proof to check.
    proof: PathBuf,

    /// Echo every proof line and every constraint as it enters the database.
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match checker::check(&args.instance, &args.proof, args.verbose) {
        Ok(outcome) => {
            if outcome.contradiction_found {
                println!("Contradiction found.");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
