//! Prelude module for convenient imports
//!
//! Importing this module with a wildcard brings the whole runtime
//! surface a generated grammar needs into scope:
//!
//! ```
//! use pegrat::prelude::*;
//! ```

// ============================================================================
// Core Types
// ============================================================================

pub use crate::arena::{NodeId, TreeArena};
pub use crate::cursor::{Mark, TokenCursor, TokenSource, TokenStream};
pub use crate::parser::{Parser, Rule};
pub use crate::token::{Position, Token, TokenKind};
pub use crate::vocab::Vocabulary;

// ============================================================================
// Memoization
// ============================================================================

pub use crate::cache::{RuleArgs, RuleId};

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::error::{ParseError, ParseResult, RuleResult, SyntaxError};

// ============================================================================
// Debug Tools
// ============================================================================

pub use crate::debug::TreePrinter;
