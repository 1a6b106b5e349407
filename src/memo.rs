//! Memoizing rule invocation and the left-recursion fixed point
//!
//! Both entry points wrap a rule body (a closure over the parser) in
//! the packrat cache. [`Parser::memoize`] is the plain path every
//! ordinary rule and terminal matcher routes through.
//! [`Parser::memoize_left_rec`] is the path for rules that may call
//! themselves at the same position before consuming input; plain
//! memoization cannot help there because the recursion happens before
//! any entry exists to hit.
//!
//! The fixed point works by priming the cache with a failure sentinel,
//! then re-running the rule body from the entry mark: nested
//! same-position calls hit the sentinel (or a previous iteration's
//! result) instead of recursing, and each successful run may therefore
//! reach one token further than the last. Iteration stops when the body
//! fails or stops making progress; the best result is finalized.
//! Every accepted iteration strictly increases the end mark and end
//! marks are bounded by the input length, so the loop terminates within
//! `input length - entry mark + 1` iterations.

use crate::arena::NodeId;
use crate::cache::{CacheKey, RuleArgs};
use crate::cursor::TokenSource;
use crate::error::RuleResult;
use crate::parser::{Parser, Rule};

/// Session-scoped counter tracking whether execution is inside a
/// left-recursive rule's fixed-point loop.
///
/// Diagnostics and error context only; never consulted for matching.
/// The depth is restored on every exit path from a left-recursive
/// invocation, including a raised error, so sibling rule calls never
/// observe leaked state.
#[derive(Debug, Default)]
pub struct RecursionGuard {
    depth: u32,
}

impl RecursionGuard {
    #[inline]
    fn enter(&mut self) {
        self.depth += 1;
    }

    #[inline]
    fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Whether any fixed-point iteration is currently executing.
    #[inline]
    pub fn active(&self) -> bool {
        self.depth > 0
    }

    /// Current nesting depth.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

impl<S: TokenSource> Parser<S> {
    /// Invoke `body` as the memoized rule `rule` with `args`.
    ///
    /// The key is (current mark, rule identity, args). On a cache hit
    /// the cursor moves to the entry's end mark and the cached result
    /// is returned without running `body`, a cached failure included:
    /// a rule that failed at a position is never retried there.
    /// Otherwise `body` runs exactly once, advancing the cursor as a
    /// side effect of matching, and its result and end mark are
    /// recorded.
    pub fn memoize<F>(&mut self, rule: Rule, args: RuleArgs, body: F) -> RuleResult
    where
        F: FnOnce(&mut Self) -> RuleResult,
    {
        let mark = self.cursor.mark();
        let key = CacheKey {
            mark,
            rule: rule.id,
            args,
        };

        if let Some(entry) = self.cache.lookup(&key) {
            if log::log_enabled!(log::Level::Debug) {
                log::debug!(
                    "{}{}({}) -> {} [cached]",
                    self.fill(),
                    rule.name,
                    args,
                    self.show_result(entry.result)
                );
            }
            self.cursor.reset(entry.end);
            return Ok(entry.result);
        }

        if log::log_enabled!(log::Level::Debug) {
            let peeking = self.showpeek()?;
            log::debug!(
                "{}{}({}) ... (looking at {})",
                self.fill(),
                rule.name,
                args,
                peeking
            );
        }
        self.level += 1;
        let outcome = body(self);
        self.level -= 1;
        let tree = outcome?;
        let end = self.cursor.mark();
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "{}... {}({}) -> {}",
                self.fill(),
                rule.name,
                args,
                self.show_result(tree)
            );
        }
        self.cache.record(key, tree, end);
        Ok(tree)
    }

    /// Invoke `body` as the left-recursive rule `rule`, iterating to a
    /// fixed point.
    ///
    /// A finalized entry short-circuits like any cache hit. Otherwise
    /// the entry is seeded with a failure sentinel and the body is run
    /// repeatedly from the entry mark; nested same-position calls to
    /// the same rule read the sentinel (or the previous iteration's
    /// result) out of the cache and return immediately, which is what
    /// breaks the infinite recursion. An iteration's result is accepted
    /// only while it strictly extends the previous accepted end mark.
    /// On total failure the cursor lands back on the entry mark.
    pub fn memoize_left_rec<F>(&mut self, rule: Rule, mut body: F) -> RuleResult
    where
        F: FnMut(&mut Self) -> RuleResult,
    {
        let mark = self.cursor.mark();
        let key = CacheKey {
            mark,
            rule: rule.id,
            args: RuleArgs::None,
        };

        if let Some(entry) = self.cache.lookup(&key) {
            if log::log_enabled!(log::Level::Debug) {
                log::debug!(
                    "{}{}() -> {} [cached]",
                    self.fill(),
                    rule.name,
                    self.show_result(entry.result)
                );
            }
            self.cursor.reset(entry.end);
            return Ok(entry.result);
        }

        if log::log_enabled!(log::Level::Debug) {
            let peeking = self.showpeek()?;
            log::debug!(
                "{}{}() ... (looking at {})",
                self.fill(),
                rule.name,
                peeking
            );
        }
        self.level += 1;

        // Prime the cache with a failure.
        self.cache.seed(key, mark);
        let mut best: Option<NodeId> = None;
        let mut best_end = mark;
        let mut depth = 0u32;
        log::debug!(
            "{}recursive {} at {} depth {}",
            self.fill(),
            rule.name,
            mark,
            depth
        );

        loop {
            self.cursor.reset(mark);
            self.guard.enter();
            let attempt = body(self);
            self.guard.exit();
            let result = match attempt {
                Ok(result) => result,
                Err(err) => {
                    self.level -= 1;
                    return Err(err);
                }
            };
            let end = self.cursor.mark();
            depth += 1;
            if log::log_enabled!(log::Level::Debug) {
                log::debug!(
                    "{}recursive {} at {} depth {}: {} to {}",
                    self.fill(),
                    rule.name,
                    mark,
                    depth,
                    self.show_result(result),
                    end
                );
            }
            let Some(node) = result else {
                if log::log_enabled!(log::Level::Debug) {
                    log::debug!(
                        "{}fail with {} to {}",
                        self.fill(),
                        self.show_result(best),
                        best_end
                    );
                }
                break;
            };
            if end <= best_end {
                if log::log_enabled!(log::Level::Debug) {
                    log::debug!(
                        "{}bailing with {} to {}",
                        self.fill(),
                        self.show_result(best),
                        best_end
                    );
                }
                break;
            }
            best = Some(node);
            best_end = end;
            self.cache.advance(key, best, best_end);
        }

        self.cursor.reset(best_end);
        self.level -= 1;

        let end = if best.is_some() {
            self.cursor.mark()
        } else {
            // Total failure leaves the cursor on the entry mark. The
            // reset is already a no-op here, but the observable end
            // state is part of the contract.
            self.cursor.reset(mark);
            mark
        };
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "{}{}() -> {}",
                self.fill(),
                rule.name,
                self.show_result(best)
            );
        }
        self.cache.finalize(key, best, end);
        Ok(best)
    }

    /// Trace indentation for the current call depth.
    pub(crate) fn fill(&self) -> String {
        "  ".repeat(self.level)
    }

    /// Trace rendering of a rule result, truncated to 200 characters.
    pub(crate) fn show_result(&self, result: Option<NodeId>) -> String {
        match result {
            None => "None".to_string(),
            Some(node) => {
                let rendered =
                    crate::debug::render_compact(node, &self.arena, self.cursor.tokens());
                if rendered.len() > 200 {
                    let mut cut = 200;
                    while !rendered.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    format!("{}...", &rendered[..cut])
                } else {
                    rendered
                }
            }
        }
    }
}
