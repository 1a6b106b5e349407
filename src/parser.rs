//! The parse session and the built-in terminal matchers
//!
//! [`Parser`] owns everything that lives exactly as long as one parse:
//! the token cursor, the memoization cache, the tree arena, the
//! grammar's vocabulary, and the diagnostic state (trace depth and the
//! left-recursion guard). A generated grammar layer drives it through
//! a deliberately small surface: the cursor's positioning operations,
//! [`memoize`](Parser::memoize) / [`memoize_left_rec`](Parser::memoize_left_rec),
//! and the terminal matchers below.
//!
//! Every terminal matcher is itself a memoized rule with an identifier
//! in the reserved `0xFF00..` range, so `name()` called twice at one
//! position peeks the token stream once.

use crate::arena::{NodeId, TreeArena};
use crate::cache::{MemoCache, RuleArgs, RuleId};
use crate::cursor::{TokenCursor, TokenSource};
use crate::error::{ParseError, ParseResult, RuleResult, SyntaxError};
use crate::memo::RecursionGuard;
use crate::token::TokenKind;
use crate::vocab::Vocabulary;

/// A rule descriptor: cache identity plus a display name for tracing.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Identity used in cache keys
    pub id: RuleId,
    /// Name shown in trace output
    pub name: &'static str,
}

impl Rule {
    /// Create a rule descriptor.
    pub const fn new(id: RuleId, name: &'static str) -> Self {
        Self { id, name }
    }
}

// Reserved identifiers for the built-in terminal matchers.
const NAME: Rule = Rule::new(RuleId(0xFF00), "name");
const NUMBER: Rule = Rule::new(RuleId(0xFF01), "number");
const STRING: Rule = Rule::new(RuleId(0xFF02), "string");
const OP: Rule = Rule::new(RuleId(0xFF03), "op");
const TYPE_COMMENT: Rule = Rule::new(RuleId(0xFF04), "type_comment");
const SOFT_KEYWORD: Rule = Rule::new(RuleId(0xFF05), "soft_keyword");
const EXPECT: Rule = Rule::new(RuleId(0xFF06), "expect");

/// One parse session over a token stream.
///
/// Created at parse start, discarded at parse end; cache, buffer and
/// arena never survive across parses.
pub struct Parser<S: TokenSource> {
    pub(crate) cursor: TokenCursor<S>,
    pub(crate) cache: MemoCache,
    pub(crate) arena: TreeArena,
    pub(crate) vocab: Vocabulary,
    pub(crate) filename: String,
    /// Trace indentation depth
    pub(crate) level: usize,
    pub(crate) guard: RecursionGuard,
}

impl<S: TokenSource> Parser<S> {
    /// Create a session over `cursor` for the grammar described by
    /// `vocab`. `filename` is used only for syntax errors.
    pub fn new(cursor: TokenCursor<S>, vocab: Vocabulary, filename: impl Into<String>) -> Self {
        Self {
            cursor,
            cache: MemoCache::new(),
            arena: TreeArena::new(),
            vocab,
            filename: filename.into(),
            level: 0,
            guard: RecursionGuard::default(),
        }
    }

    /// The current cursor position.
    #[inline]
    pub fn mark(&self) -> crate::cursor::Mark {
        self.cursor.mark()
    }

    /// Restore a previously saved cursor position.
    #[inline]
    pub fn reset(&mut self, mark: crate::cursor::Mark) {
        self.cursor.reset(mark)
    }

    /// The underlying cursor.
    #[inline]
    pub fn cursor(&self) -> &TokenCursor<S> {
        &self.cursor
    }

    /// The underlying cursor, mutably (peek/getnext for hand-written
    /// terminal logic).
    #[inline]
    pub fn cursor_mut(&mut self) -> &mut TokenCursor<S> {
        &mut self.cursor
    }

    /// The tree arena.
    #[inline]
    pub fn arena(&self) -> &TreeArena {
        &self.arena
    }

    /// The tree arena, mutably (rule bodies build branch nodes here).
    #[inline]
    pub fn arena_mut(&mut self) -> &mut TreeArena {
        &mut self.arena
    }

    /// The memoization cache (for statistics).
    #[inline]
    pub fn cache(&self) -> &MemoCache {
        &self.cache
    }

    /// Whether execution is currently inside a left-recursive rule's
    /// fixed-point loop. Error-context only; never drives matching.
    #[inline]
    pub fn in_left_recursion(&self) -> bool {
        self.guard.active()
    }

    /// Short rendering of the token currently peeked, for traces.
    pub fn showpeek(&mut self) -> ParseResult<String> {
        let tok = self.cursor.peek()?;
        Ok(format!("{}: {}:{:?}", tok.start, tok.kind, tok.text))
    }

    // ------------------------------------------------------------------
    // Terminal matchers
    // ------------------------------------------------------------------

    /// Match an identifier: a `Name` token whose text is not a reserved
    /// keyword. Soft keywords do match; they are ordinary names outside
    /// their special contexts.
    pub fn name(&mut self) -> RuleResult {
        self.memoize(NAME, RuleArgs::None, |p| {
            let matched = {
                let tok = p.cursor.peek()?;
                tok.kind == TokenKind::Name && !p.vocab.is_keyword(&tok.text)
            };
            if matched {
                p.consume()
            } else {
                Ok(None)
            }
        })
    }

    /// Match a numeric literal.
    pub fn number(&mut self) -> RuleResult {
        self.memoize(NUMBER, RuleArgs::None, |p| {
            if p.cursor.peek()?.kind == TokenKind::Number {
                p.consume()
            } else {
                Ok(None)
            }
        })
    }

    /// Match a string literal.
    pub fn string(&mut self) -> RuleResult {
        self.memoize(STRING, RuleArgs::None, |p| {
            if p.cursor.peek()?.kind == TokenKind::Str {
                p.consume()
            } else {
                Ok(None)
            }
        })
    }

    /// Match a generic operator token.
    pub fn op(&mut self) -> RuleResult {
        self.memoize(OP, RuleArgs::None, |p| {
            if p.cursor.peek()?.kind == TokenKind::Op {
                p.consume()
            } else {
                Ok(None)
            }
        })
    }

    /// Match an annotation comment.
    pub fn type_comment(&mut self) -> RuleResult {
        self.memoize(TYPE_COMMENT, RuleArgs::None, |p| {
            if p.cursor.peek()?.kind == TokenKind::TypeComment {
                p.consume()
            } else {
                Ok(None)
            }
        })
    }

    /// Match a context-sensitive soft keyword: a `Name` token whose
    /// text is in the grammar's soft-keyword set.
    pub fn soft_keyword(&mut self) -> RuleResult {
        self.memoize(SOFT_KEYWORD, RuleArgs::None, |p| {
            let matched = {
                let tok = p.cursor.peek()?;
                tok.kind == TokenKind::Name && p.vocab.is_soft_keyword(&tok.text)
            };
            if matched {
                p.consume()
            } else {
                Ok(None)
            }
        })
    }

    /// Match a specific token by descriptor.
    ///
    /// Succeeds when the token's literal text equals `descriptor`, or
    /// the vocabulary registers `descriptor` as an exact category the
    /// token carries, or `descriptor` names a generic reserved-token
    /// category ("NEWLINE", "ENDMARKER", ...) matching the token's
    /// kind.
    pub fn expect(&mut self, descriptor: &'static str) -> RuleResult {
        self.memoize(EXPECT, RuleArgs::Text(descriptor), |p| {
            let matched = {
                let tok = p.cursor.peek()?;
                tok.text == descriptor
                    || p.vocab.exact_kind(descriptor) == Some(tok.kind)
                    || TokenKind::from_name(descriptor) == Some(tok.kind)
            };
            if matched {
                p.consume()
            } else {
                Ok(None)
            }
        })
    }

    /// Assert that a construct was present.
    ///
    /// Passes a present result through unchanged; converts absence into
    /// a raised syntax error naming `expectation` at the diagnostic
    /// position. This is the sole place a local match failure becomes a
    /// raised error.
    pub fn expect_forced(&mut self, result: Option<NodeId>, expectation: &str) -> RuleResult {
        match result {
            Some(node) => Ok(Some(node)),
            None => Err(self.make_syntax_error(format!("expected {}", expectation))),
        }
    }

    /// Run `rule` at the current position and report whether it
    /// succeeded, restoring the position regardless of outcome.
    pub fn positive_lookahead<F>(&mut self, mut rule: F) -> ParseResult<bool>
    where
        F: FnMut(&mut Self) -> RuleResult,
    {
        let mark = self.cursor.mark();
        let outcome = rule(self);
        self.cursor.reset(mark);
        Ok(outcome?.is_some())
    }

    /// Run `rule` at the current position and report whether it
    /// failed, restoring the position regardless of outcome.
    pub fn negative_lookahead<F>(&mut self, mut rule: F) -> ParseResult<bool>
    where
        F: FnMut(&mut Self) -> RuleResult,
    {
        let mark = self.cursor.mark();
        let outcome = rule(self);
        self.cursor.reset(mark);
        Ok(outcome?.is_none())
    }

    /// Build a syntax error at the cursor's diagnostic token.
    ///
    /// The reported column is the token's start column plus one. If the
    /// producer fails while fetching the diagnostic token, that failure
    /// is returned instead.
    pub fn make_syntax_error(&mut self, message: impl Into<String>) -> ParseError {
        let filename = self.filename.clone();
        match self.cursor.diagnose() {
            Ok(tok) => ParseError::Syntax(SyntaxError::new(message, filename, tok)),
            Err(err) => err,
        }
    }

    /// Consume the peeked token into a leaf node.
    fn consume(&mut self) -> RuleResult {
        let mark = self.cursor.mark();
        self.cursor.getnext()?;
        Ok(Some(self.arena.leaf(mark)))
    }
}
