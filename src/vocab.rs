//! Grammar vocabulary
//!
//! The generated grammar layer declares its lexical vocabulary here:
//! the reserved keywords an identifier match must reject, the
//! context-sensitive soft keywords, and the exact-token table mapping
//! punctuation descriptors ("(", "+=") to the categories the producer's
//! lexer assigns them. The runtime itself never hardcodes any of these.

use ahash::RandomState;
use hashbrown::{HashMap, HashSet};

use crate::token::TokenKind;

/// Vocabulary of one grammar: keyword sets and exact-token table.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    keywords: HashSet<&'static str, RandomState>,
    soft_keywords: HashSet<&'static str, RandomState>,
    exact_tokens: HashMap<&'static str, TokenKind, RandomState>,
}

impl Vocabulary {
    /// Create a vocabulary from the grammar's keyword lists.
    pub fn new(keywords: &[&'static str], soft_keywords: &[&'static str]) -> Self {
        Self {
            keywords: keywords.iter().copied().collect(),
            soft_keywords: soft_keywords.iter().copied().collect(),
            exact_tokens: HashMap::default(),
        }
    }

    /// Register an exact punctuation/operator descriptor and the
    /// category the producer's lexer assigns it.
    pub fn with_exact_token(mut self, descriptor: &'static str, kind: TokenKind) -> Self {
        self.exact_tokens.insert(descriptor, kind);
        self
    }

    /// Whether `text` is a reserved keyword.
    #[inline]
    pub fn is_keyword(&self, text: &str) -> bool {
        self.keywords.contains(text)
    }

    /// Whether `text` is a context-sensitive soft keyword.
    #[inline]
    pub fn is_soft_keyword(&self, text: &str) -> bool {
        self.soft_keywords.contains(text)
    }

    /// The exact category registered for `descriptor`, if any.
    #[inline]
    pub fn exact_kind(&self, descriptor: &str) -> Option<TokenKind> {
        self.exact_tokens.get(descriptor).copied()
    }
}
