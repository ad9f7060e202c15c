//! Error types for the format-script interpreter.
//!
//! Every error is terminal: the interpreter never recovers and continues,
//! so one [`ScriptError`] aborts the whole run. The `Display` output is
//! the exact string handed to the embedding host.

use std::fmt;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// An error produced while interpreting a format script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// 1-based source line, if known.
    pub line: Option<usize>,
}

impl ScriptError {
    /// Create a new error.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    /// Attach a source line number.
    #[must_use]
    pub const fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = self.line {
            write!(f, "line {line}: {}", self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ScriptError {}

// ---------------------------------------------------------------------------
// Error kinds
// ---------------------------------------------------------------------------

/// Categories of errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown command, invalid variable name, malformed header,
    /// stray `elif`/`else`, misplaced `break`/`continue`.
    Syntax,
    /// A block expected but absent, or inconsistent indentation.
    Indentation,
    /// Malformed expression: empty, truncated, unmatched parenthesis,
    /// trailing token.
    Expression,
    /// An identifier with no binding and no valid numeric literal form.
    UndefinedVariable,
    /// The input-data stream ran out of tokens.
    UnexpectedEndOfInput,
    /// An input-data token did not parse as a number.
    ExpectedNumber,
    /// The wall-clock execution budget was exceeded.
    Timeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax error"),
            Self::Indentation => write!(f, "indentation error"),
            Self::Expression => write!(f, "expression error"),
            Self::UndefinedVariable => write!(f, "undefined variable"),
            Self::UnexpectedEndOfInput => write!(f, "unexpected end of input"),
            Self::ExpectedNumber => write!(f, "expected number"),
            Self::Timeout => write!(f, "execution timed out"),
        }
    }
}

/// Convenience type alias for results using [`ScriptError`].
pub type RunResult<T> = Result<T, ScriptError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
