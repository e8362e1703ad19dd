// Errors that happen while checking a proof.
// Every error is tied to the 1-based line number of the instance or proof file it came from,
// since that is the only location information either text format carries.
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckerError {
    /// Malformed tokens: missing operator, unexpected keyword, bad integer literal.
    Parse { line: usize, message: String },

    /// A rule's semantic precondition failed.
    Verify { line: usize, message: String },
}

impl CheckerError {
    pub fn parse(line: usize, message: impl Into<String>) -> CheckerError {
        CheckerError::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn verify(line: usize, message: impl Into<String>) -> CheckerError {
        CheckerError::Verify {
            line,
            message: message.into(),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            CheckerError::Parse { line, .. } => *line,
            CheckerError::Verify { line, .. } => *line,
        }
    }

    /// The exit code the CLI should use when the run fails with this error.
    /// Parser and verifier failures are kept on different codes so scripts can tell a
    /// malformed file apart from a rejected proof without scraping stderr text.
    pub fn exit_code(&self) -> i32 {
        match self {
            CheckerError::Parse { .. } => 2,
            CheckerError::Verify { .. } => 1,
        }
    }
}

impl fmt::Display for CheckerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckerError::Parse { line, message } => {
                write!(f, "line {}: parse error: {}", line, message)
            }
            CheckerError::Verify { line, message } => {
                write!(f, "line {}: verification failed: {}", line, message)
            }
        }
    }
}

impl std::error::Error for CheckerError {}

pub type Result<T> = std::result::Result<T, CheckerError>;
