//! Pegrat - Generic PEG Parsing Runtime
//!
//! This is the engine a generated recursive-descent parser sits on top
//! of. It provides:
//! - A backtracking token cursor with lazy pulling and noise filtering
//! - Packrat memoization (at most one evaluation per position/rule/args)
//! - A fixed-point resolver that makes left-recursive rules terminate
//! - Terminal matchers for generated grammar rules to compose
//! - Arena-allocated parse trees
//! - Rule and cursor tracing through the `log` facade
//!
//! The per-grammar rule bodies are generated elsewhere from a grammar
//! description; so is the lexical scanner that produces tokens. This
//! crate is everything in between.
//!
//! ## Quick Start
//!
//! ```rust
//! use pegrat::{Parser, Rule, RuleArgs, RuleId, TokenCursor, TokenStream, Vocabulary};
//! use pegrat::{Position, Token, TokenKind};
//!
//! // A one-token stream: the number 7.
//! let tokens = vec![
//!     Token {
//!         kind: TokenKind::Number,
//!         text: "7".to_string(),
//!         start: Position::new(1, 0),
//!         end: Position::new(1, 1),
//!         line: "7\n".to_string(),
//!     },
//! ];
//! let cursor = TokenCursor::new(TokenStream::new(tokens));
//! let mut parser = Parser::new(cursor, Vocabulary::default(), "<demo>");
//!
//! // A generated rule is a function that wraps its body in `memoize`.
//! const ATOM: Rule = Rule::new(RuleId(1), "atom");
//! let tree = parser
//!     .memoize(ATOM, RuleArgs::None, |p| p.number())
//!     .unwrap();
//! assert!(tree.is_some());
//! ```

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]

// Prelude module for convenient imports
pub mod prelude;

pub mod arena;
pub mod cache;
pub mod cursor;
pub mod debug;
pub mod error;
pub mod memo;
pub mod parser;
pub mod token;
pub mod vocab;

// ============================================================================
// Core Types
// ============================================================================

pub use arena::{NodeId, TreeArena, TreeNode};
pub use cursor::{Mark, TokenCursor, TokenSource, TokenStream};
pub use parser::{Parser, Rule};
pub use token::{Position, Token, TokenKind};
pub use vocab::Vocabulary;

// ============================================================================
// Memoization
// ============================================================================

pub use cache::{CacheEntry, CacheKey, EntryState, MemoCache, RuleArgs, RuleId};
pub use memo::RecursionGuard;

// ============================================================================
// Error Handling
// ============================================================================

pub use error::{ParseError, ParseResult, RuleResult, SyntaxError};

// ============================================================================
// Debug Tools
// ============================================================================

pub use debug::{render_compact, tree_to_value, TreePrinter};
