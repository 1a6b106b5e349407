//! Token records and categories
//!
//! A [`Token`] is the unit the runtime matches against: a category, the
//! literal text, start/end coordinates, and the text of the source line
//! it came from (kept for error reporting). Tokens are immutable once
//! produced and are owned by the cursor's buffer.
//!
//! Coordinates follow the producer convention: lines are 1-based,
//! columns are 0-based. The syntax-error surface adds one to the column
//! when reporting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in the source: 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (0-based)
    pub column: usize,
}

impl Position {
    /// Create a new position.
    #[inline]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.line, self.column)
    }
}

/// Token category.
///
/// The runtime is grammar-agnostic but the matchers need to recognize a
/// fixed set of structural categories. Producers whose lexers assign a
/// distinct category per punctuation token use [`TokenKind::Exact`] with
/// codes registered in the grammar's [`Vocabulary`](crate::Vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// End of input; always the last meaningful token of a stream
    EndMarker,
    /// Identifier or keyword
    Name,
    /// Numeric literal
    Number,
    /// String literal
    Str,
    /// Generic operator or punctuation
    Op,
    /// End of a logical line (end-of-statement)
    Newline,
    /// A non-logical line break (blank line, "no content"); filtered by
    /// the cursor
    Nl,
    /// Increase of indentation
    Indent,
    /// Decrease of indentation
    Dedent,
    /// Comment text; filtered by the cursor
    Comment,
    /// Annotation comment carrying a type hint
    TypeComment,
    /// Lexically malformed input the producer chose to pass through
    ErrorToken,
    /// Grammar-assigned exact punctuation/operator category
    Exact(u16),
}

impl TokenKind {
    /// Resolve a generic reserved-token category name ("NAME",
    /// "NEWLINE", ...) as used by `expect` descriptors.
    pub fn from_name(name: &str) -> Option<TokenKind> {
        match name {
            "ENDMARKER" => Some(TokenKind::EndMarker),
            "NAME" => Some(TokenKind::Name),
            "NUMBER" => Some(TokenKind::Number),
            "STRING" => Some(TokenKind::Str),
            "OP" => Some(TokenKind::Op),
            "NEWLINE" => Some(TokenKind::Newline),
            "NL" => Some(TokenKind::Nl),
            "INDENT" => Some(TokenKind::Indent),
            "DEDENT" => Some(TokenKind::Dedent),
            "COMMENT" => Some(TokenKind::Comment),
            "TYPE_COMMENT" => Some(TokenKind::TypeComment),
            "ERRORTOKEN" => Some(TokenKind::ErrorToken),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::EndMarker => write!(f, "ENDMARKER"),
            TokenKind::Name => write!(f, "NAME"),
            TokenKind::Number => write!(f, "NUMBER"),
            TokenKind::Str => write!(f, "STRING"),
            TokenKind::Op => write!(f, "OP"),
            TokenKind::Newline => write!(f, "NEWLINE"),
            TokenKind::Nl => write!(f, "NL"),
            TokenKind::Indent => write!(f, "INDENT"),
            TokenKind::Dedent => write!(f, "DEDENT"),
            TokenKind::Comment => write!(f, "COMMENT"),
            TokenKind::TypeComment => write!(f, "TYPE_COMMENT"),
            TokenKind::ErrorToken => write!(f, "ERRORTOKEN"),
            TokenKind::Exact(code) => write!(f, "EXACT({})", code),
        }
    }
}

/// One token from the upstream producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token category
    pub kind: TokenKind,
    /// Literal text of the token
    pub text: String,
    /// Start coordinate
    pub start: Position,
    /// End coordinate
    pub end: Position,
    /// Text of the source line this token came from
    pub line: String,
}

impl Token {
    /// Short single-line rendering used by trace output, padded and
    /// truncated to 25 columns.
    pub fn short(&self) -> String {
        let full = format!("{}: {}:{:?}", self.start, self.kind, self.text);
        format!("{:<25.25}", full)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.kind, self.text)
    }
}
