//! Backtracking token cursor
//!
//! [`TokenCursor`] pulls tokens lazily from an upstream [`TokenSource`],
//! buffers every token it accepts, and exposes position save/restore so
//! that rules can backtrack freely. The buffer only grows: a [`Mark`]
//! handed out once stays valid for the rest of the parse.
//!
//! Noise never reaches the buffer. While pulling, the cursor discards
//! comment tokens, blank-line ("no content") tokens, whitespace-only
//! error tokens, and a second consecutive end-of-statement token
//! immediately following one already buffered. Matchers therefore see
//! the same token sequence whether or not the producer interleaves
//! noise.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use ahash::RandomState;
use hashbrown::{HashMap, HashSet};

use crate::error::{ParseError, ParseResult};
use crate::token::{Token, TokenKind};

/// Opaque position in the buffered token sequence.
///
/// Marks are produced only by [`TokenCursor::mark`] and are
/// monotonically non-decreasing as the parse advances. Consumers treat
/// them as comparable handles; [`Mark::index`] exists for diagnostics
/// and progress checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mark(usize);

impl Mark {
    #[inline]
    pub(crate) fn at(index: usize) -> Self {
        Mark(index)
    }

    /// The buffer position this mark denotes.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upstream token producer.
///
/// `Ok(None)` signals end-of-stream. Producer failures propagate
/// through the cursor unmodified; the runtime performs no recovery.
pub trait TokenSource {
    /// Pull the next raw token, or `None` when the stream is exhausted.
    fn next_token(&mut self) -> ParseResult<Option<Token>>;
}

/// Adapter turning a prebuilt token vector into a [`TokenSource`].
///
/// Mainly useful in tests and small drivers where the whole token
/// sequence is known up front.
#[derive(Debug)]
pub struct TokenStream {
    tokens: std::vec::IntoIter<Token>,
}

impl TokenStream {
    /// Wrap a vector of tokens.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter(),
        }
    }
}

impl From<Vec<Token>> for TokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        Self::new(tokens)
    }
}

impl TokenSource for TokenStream {
    fn next_token(&mut self) -> ParseResult<Option<Token>> {
        Ok(self.tokens.next())
    }
}

/// Buffering, backtrackable view over a [`TokenSource`].
pub struct TokenCursor<S> {
    source: S,
    tokens: Vec<Token>,
    index: usize,
    /// Source line texts by line number, collected while buffering.
    /// Populated only when no backing path is available.
    lines: HashMap<usize, String, RandomState>,
    path: Option<PathBuf>,
}

impl<S: TokenSource> TokenCursor<S> {
    /// Create a cursor with no backing file; source line texts are
    /// indexed in memory as tokens are buffered.
    pub fn new(source: S) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            index: 0,
            lines: HashMap::default(),
            path: None,
        }
    }

    /// Create a cursor backed by a file path; [`resolve_lines`] will
    /// re-read the file instead of keeping an in-memory index.
    ///
    /// [`resolve_lines`]: TokenCursor::resolve_lines
    pub fn with_path(source: S, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            index: 0,
            lines: HashMap::default(),
            path: Some(path.into()),
        }
    }

    /// The token at the current position, without advancing.
    ///
    /// Pulls from the producer while the buffer is exhausted, dropping
    /// noise tokens. Pulling on a dry producer raises
    /// [`ParseError::EndOfStream`]; a grammar that consumes its
    /// end-of-input token never triggers this.
    pub fn peek(&mut self) -> ParseResult<&Token> {
        while self.index == self.tokens.len() {
            let tok = match self.source.next_token()? {
                Some(tok) => tok,
                None => {
                    return Err(ParseError::EndOfStream {
                        position: self.tokens.len(),
                    })
                }
            };
            if matches!(tok.kind, TokenKind::Nl | TokenKind::Comment) {
                continue;
            }
            if tok.kind == TokenKind::ErrorToken && tok.text.trim().is_empty() {
                continue;
            }
            if tok.kind == TokenKind::Newline
                && self
                    .tokens
                    .last()
                    .is_some_and(|last| last.kind == TokenKind::Newline)
            {
                continue;
            }
            if self.path.is_none() {
                self.lines.insert(tok.start.line, tok.line.clone());
            }
            self.tokens.push(tok);
        }
        Ok(&self.tokens[self.index])
    }

    /// Return the token at the current position and advance past it.
    pub fn getnext(&mut self) -> ParseResult<&Token> {
        let cached = self.index != self.tokens.len();
        self.peek()?;
        self.index += 1;
        self.report(cached, false);
        Ok(&self.tokens[self.index - 1])
    }

    /// The current position.
    #[inline]
    pub fn mark(&self) -> Mark {
        Mark(self.index)
    }

    /// Restore a previously saved position. No-op when already there.
    ///
    /// A mark outside `[0, buffer length]` is a programming error, not
    /// a recoverable failure.
    pub fn reset(&mut self, mark: Mark) {
        if mark.0 == self.index {
            return;
        }
        assert!(
            mark.0 <= self.tokens.len(),
            "mark {} out of range (buffer holds {} tokens)",
            mark.0,
            self.tokens.len()
        );
        let back = mark.0 < self.index;
        self.index = mark.0;
        self.report(true, back);
    }

    /// The most recently buffered token, fetching one first if the
    /// buffer is empty. For error reporting only; never drives
    /// matching.
    pub fn diagnose(&mut self) -> ParseResult<&Token> {
        if self.tokens.is_empty() {
            self.peek()?;
        }
        let last = self.tokens.len() - 1;
        Ok(&self.tokens[last])
    }

    /// The most recent consumed token that is not end-of-input,
    /// end-of-statement, or indentation bookkeeping.
    pub fn last_non_whitespace_token(&self) -> Option<&Token> {
        self.tokens[..self.index].iter().rev().find(|tok| {
            !matches!(
                tok.kind,
                TokenKind::EndMarker
                    | TokenKind::Newline
                    | TokenKind::Nl
                    | TokenKind::Indent
                    | TokenKind::Dedent
            )
        })
    }

    /// Literal text for each requested line number.
    ///
    /// Served from the in-memory index when one was collected, else by
    /// re-reading the backing file and scanning until every requested
    /// line has been seen.
    pub fn resolve_lines(&self, line_numbers: &[usize]) -> io::Result<Vec<String>> {
        if !self.lines.is_empty() {
            return Ok(line_numbers
                .iter()
                .map(|n| self.lines.get(n).cloned().unwrap_or_default())
                .collect());
        }

        let path = self.path.as_ref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "no source available for line lookup")
        })?;
        let wanted: HashSet<usize, RandomState> = line_numbers.iter().copied().collect();
        let mut found: HashMap<usize, String, RandomState> = HashMap::default();
        let reader = BufReader::new(File::open(path)?);
        for (count, line) in reader.lines().enumerate() {
            let number = count + 1;
            if wanted.contains(&number) {
                found.insert(number, line?);
                if found.len() == wanted.len() {
                    break;
                }
            }
        }
        Ok(line_numbers
            .iter()
            .map(|n| found.get(n).cloned().unwrap_or_default())
            .collect())
    }

    /// Number of buffered tokens.
    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether nothing has been buffered yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The buffered tokens, in order.
    #[inline]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Trace a progress line: `--->` for a cached step, `---*` for a
    /// freshly pulled token, `----` for a backward reset.
    fn report(&self, cached: bool, back: bool) {
        if !log::log_enabled!(log::Level::Trace) {
            return;
        }
        let tip = if back {
            '-'
        } else if cached {
            '>'
        } else {
            '*'
        };
        let fill: String = std::iter::repeat('-').take(self.index).chain([tip]).collect();
        if self.index == 0 {
            log::trace!("{} (bof)", fill);
        } else {
            log::trace!("{} {}", fill, self.tokens[self.index - 1].short());
        }
    }
}
