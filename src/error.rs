//! Error types for the parsing runtime
//!
//! Failure comes in two shapes with very different propagation rules:
//!
//! - A rule that cannot match at the current position returns `Ok(None)`.
//!   That is not an error; it drives backtracking and is recovered by the
//!   nearest enclosing alternative.
//! - A raised [`ParseError`] is terminal. It unwinds through every
//!   enclosing rule via `?` and reaches the driver uncaught. Only
//!   `expect_forced` raises a syntax error from inside the grammar;
//!   the other variants originate in the token producer.

use std::fmt;

use crate::token::Token;

/// Result alias used throughout the runtime.
pub type ParseResult<T> = Result<T, ParseError>;

/// The outcome of one rule invocation: a node on success, `None` on a
/// local (backtrackable) match failure, `Err` on a raised error.
pub type RuleResult = ParseResult<Option<crate::arena::NodeId>>;

/// A structured syntax error, as handed to tooling.
///
/// The field layout is part of the interoperability contract: message,
/// filename, 1-based line number, 1-based column number (the offending
/// token's start column plus one), and the literal source line text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Human-readable description of what was expected or wrong
    pub message: String,
    /// Name of the input ("<stdin>" when reading standard input)
    pub filename: String,
    /// 1-based line number of the offending token
    pub line: usize,
    /// 1-based column number (token start column + 1)
    pub column: usize,
    /// Literal text of the offending source line
    pub text: String,
}

impl SyntaxError {
    /// Build a syntax error from the cursor's diagnostic token.
    pub fn new(message: impl Into<String>, filename: impl Into<String>, token: &Token) -> Self {
        Self {
            message: message.into(),
            filename: filename.into(),
            line: token.start.line,
            column: token.start.column + 1,
            text: token.line.clone(),
        }
    }

    /// Format with the source line and a caret under the error column.
    pub fn format_with_line(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("  File \"{}\", line {}\n", self.filename, self.line));
        let text = self.text.trim_end_matches('\n');
        if !text.is_empty() {
            output.push_str(&format!("    {}\n", text));
            output.push_str("    ");
            for _ in 0..self.column.saturating_sub(1) {
                output.push(' ');
            }
            output.push_str("^\n");
        }
        output.push_str(&format!("SyntaxError: {}", self.message));
        output
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.filename, self.line, self.column, self.message
        )
    }
}

impl std::error::Error for SyntaxError {}

/// A raised, terminal parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A forced expectation failed; the grammar asserted a construct
    /// must be present and it was not
    Syntax(SyntaxError),

    /// The upstream token producer rejected its input
    Tokenize {
        /// Producer-supplied description of the problem
        message: String,
        /// 1-based line number where tokenization failed
        line: usize,
        /// 0-based column where tokenization failed
        column: usize,
    },

    /// The upstream token producer ran dry while another token was
    /// required
    EndOfStream {
        /// Number of tokens buffered before the stream ended
        position: usize,
    },
}

impl ParseError {
    /// The syntax error carried by this error, if it is one.
    #[inline]
    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            ParseError::Syntax(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Syntax(err) => err.fmt(f),
            ParseError::Tokenize {
                message,
                line,
                column,
            } => {
                write!(f, "tokenize error at {}.{}: {}", line, column, message)
            }
            ParseError::EndOfStream { position } => {
                write!(
                    f,
                    "token stream ended unexpectedly after {} tokens",
                    position
                )
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Syntax(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SyntaxError> for ParseError {
    fn from(err: SyntaxError) -> Self {
        ParseError::Syntax(err)
    }
}
