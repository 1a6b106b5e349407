//! Packrat memoization cache
//!
//! Results are cached per (position, rule identity, argument record),
//! which guarantees at most one real evaluation per key per parse and
//! bounds total work to O(rules x input length) even with unbounded
//! backtracking. A cached failure is as binding as a cached success: a
//! rule that failed at a position with given arguments is never retried
//! there.
//!
//! Entries are append-only except during left-recursion resolution,
//! where one entry cycles through an explicit lifecycle:
//!
//! ```text
//! Seeded -> Iterating -> Finalized
//! ```
//!
//! The `Seeded` failure sentinel is what breaks infinite recursion; the
//! resolver overwrites it with each accepted iteration (`Iterating`) and
//! pins the best result at the end (`Finalized`). Entries created by
//! plain memoization are born `Finalized`. Once finalized, an entry is
//! stable for the rest of the parse.

use ahash::RandomState;
use hashbrown::HashMap;

use crate::arena::NodeId;
use crate::cursor::Mark;
use crate::token::TokenKind;

/// Identifier of one grammar rule, fixed at grammar-generation time.
///
/// Identifiers `0xFF00..` are reserved for the runtime's built-in
/// terminal matchers; generated grammars should number their rules
/// below that range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(
    /// Numeric identifier assigned at grammar-generation time
    pub u16,
);

/// Rule argument record admitted into cache keys.
///
/// Arguments are compared by value. Rules taking arguments outside
/// these kinds (such as the lookahead combinators, which take another
/// rule) are not memoized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleArgs {
    /// No arguments
    None,
    /// A static string argument, e.g. an `expect` descriptor
    Text(&'static str),
    /// A token-category argument
    Kind(TokenKind),
    /// An integer argument
    Int(i64),
}

impl std::fmt::Display for RuleArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleArgs::None => Ok(()),
            RuleArgs::Text(text) => write!(f, "{:?}", text),
            RuleArgs::Kind(kind) => write!(f, "{}", kind),
            RuleArgs::Int(value) => write!(f, "{}", value),
        }
    }
}

/// Uniquely identifies one evaluation context within a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Position the rule was entered at
    pub mark: Mark,
    /// Which rule
    pub rule: RuleId,
    /// With which arguments
    pub args: RuleArgs,
}

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Failure sentinel planted before iterating a left-recursive rule
    Seeded,
    /// Provisional best result of an in-progress fixed-point iteration
    Iterating,
    /// Stable for the rest of the parse
    Finalized,
}

/// A cached rule outcome: the result (or failure) and the position the
/// cursor ends at when the result is replayed.
#[derive(Debug, Clone, Copy)]
pub struct CacheEntry {
    /// Parse tree on success, `None` for a recorded failure
    pub result: Option<NodeId>,
    /// Cursor position after the rule
    pub end: Mark,
    /// Lifecycle state
    pub state: EntryState,
}

/// The memoization table for one parse session.
#[derive(Debug, Default)]
pub struct MemoCache {
    map: HashMap<CacheKey, CacheEntry, RandomState>,
    hits: u64,
    misses: u64,
}

impl MemoCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry, counting the hit or miss.
    #[inline]
    pub fn lookup(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        match self.map.get(key) {
            Some(entry) => {
                self.hits += 1;
                Some(*entry)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Record a plain memoized outcome. The entry is final immediately.
    #[inline]
    pub fn record(&mut self, key: CacheKey, result: Option<NodeId>, end: Mark) {
        self.map.insert(
            key,
            CacheEntry {
                result,
                end,
                state: EntryState::Finalized,
            },
        );
    }

    /// Plant the failure sentinel for a left-recursive rule entered at
    /// `mark`. Nested same-position calls will hit it and bail out.
    #[inline]
    pub fn seed(&mut self, key: CacheKey, mark: Mark) {
        self.map.insert(
            key,
            CacheEntry {
                result: None,
                end: mark,
                state: EntryState::Seeded,
            },
        );
    }

    /// Overwrite the entry with an accepted iteration's result.
    #[inline]
    pub fn advance(&mut self, key: CacheKey, result: Option<NodeId>, end: Mark) {
        debug_assert!(self.map.contains_key(&key), "advance on unseeded key");
        self.map.insert(
            key,
            CacheEntry {
                result,
                end,
                state: EntryState::Iterating,
            },
        );
    }

    /// Pin the best result of a finished fixed-point iteration.
    #[inline]
    pub fn finalize(&mut self, key: CacheKey, result: Option<NodeId>, end: Mark) {
        self.map.insert(
            key,
            CacheEntry {
                result,
                end,
                state: EntryState::Finalized,
            },
        );
    }

    /// Number of cached entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Lookup statistics: (hits, misses, hit rate).
    pub fn stats(&self) -> (u64, u64, f64) {
        let total = self.hits + self.misses;
        let hit_rate = if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        };
        (self.hits, self.misses, hit_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(mark: usize, rule: u16) -> CacheKey {
        CacheKey {
            mark: Mark::at(mark),
            rule: RuleId(rule),
            args: RuleArgs::None,
        }
    }

    #[test]
    fn test_lookup_miss_then_hit() {
        let mut cache = MemoCache::new();
        let k = key(0, 1);
        assert!(cache.lookup(&k).is_none());

        cache.record(k, None, Mark::at(0));
        let entry = cache.lookup(&k).unwrap();
        assert_eq!(entry.result, None);
        assert_eq!(entry.state, EntryState::Finalized);

        let (hits, misses, rate) = cache.stats();
        assert_eq!((hits, misses), (1, 1));
        assert!((rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distinct_args_are_distinct_keys() {
        let mut cache = MemoCache::new();
        let plus = CacheKey {
            mark: Mark::at(0),
            rule: RuleId(9),
            args: RuleArgs::Text("+"),
        };
        let minus = CacheKey {
            mark: Mark::at(0),
            rule: RuleId(9),
            args: RuleArgs::Text("-"),
        };
        cache.record(plus, None, Mark::at(0));
        assert!(cache.lookup(&minus).is_none());
        assert!(cache.lookup(&plus).is_some());
    }

    #[test]
    fn test_left_recursion_entry_lifecycle() {
        let mut cache = MemoCache::new();
        let k = key(2, 5);

        cache.seed(k, Mark::at(2));
        let entry = cache.lookup(&k).unwrap();
        assert_eq!(entry.state, EntryState::Seeded);
        assert_eq!(entry.result, None);
        assert_eq!(entry.end, Mark::at(2));

        // An arena is not needed to exercise the lifecycle; a failure
        // result stands in for a node.
        cache.advance(k, None, Mark::at(4));
        assert_eq!(cache.lookup(&k).unwrap().state, EntryState::Iterating);

        cache.finalize(k, None, Mark::at(4));
        let entry = cache.lookup(&k).unwrap();
        assert_eq!(entry.state, EntryState::Finalized);
        assert_eq!(entry.end, Mark::at(4));
        assert_eq!(cache.len(), 1, "lifecycle reuses one entry");
    }

    #[test]
    fn test_args_display() {
        assert_eq!(RuleArgs::None.to_string(), "");
        assert_eq!(RuleArgs::Text("+").to_string(), "\"+\"");
        assert_eq!(RuleArgs::Kind(TokenKind::Name).to_string(), "NAME");
        assert_eq!(RuleArgs::Int(3).to_string(), "3");
    }
}
