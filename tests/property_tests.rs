//! Property-based tests using proptest
//!
//! These tests verify the cursor and memoization invariants across
//! arbitrary token streams and call patterns.

use std::cell::Cell;

use proptest::prelude::*;

use pegrat::{
    Parser, Position, Rule, RuleArgs, RuleId, Token, TokenCursor, TokenKind, TokenStream,
    Vocabulary,
};

// =============================================================================
// Strategies
// =============================================================================

fn make(kind: TokenKind, text: String) -> Token {
    Token {
        start: Position::new(1, 0),
        end: Position::new(1, text.len()),
        line: format!("{}\n", text),
        kind,
        text,
    }
}

fn end_marker() -> Token {
    make(TokenKind::EndMarker, String::new())
}

/// A meaningful (non-noise) token.
fn arb_token() -> impl Strategy<Value = Token> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(|s| make(TokenKind::Name, s)),
        "[0-9]{1,6}".prop_map(|s| make(TokenKind::Number, s)),
        prop_oneof![Just("+"), Just("-"), Just("*"), Just("(")]
            .prop_map(|s| make(TokenKind::Op, s.to_string())),
    ]
}

fn arb_stream() -> impl Strategy<Value = Vec<Token>> {
    prop::collection::vec(arb_token(), 1..16).prop_map(|mut tokens| {
        tokens.push(end_marker());
        tokens
    })
}

fn cursor(tokens: Vec<Token>) -> TokenCursor<TokenStream> {
    TokenCursor::new(TokenStream::new(tokens))
}

fn parser(tokens: Vec<Token>) -> Parser<TokenStream> {
    Parser::new(cursor(tokens), Vocabulary::default(), "<prop>")
}

// =============================================================================
// Cursor Properties
// =============================================================================

proptest! {
    /// Repeated peek with no intervening getnext/reset returns the
    /// identical token every time.
    #[test]
    fn prop_peek_is_stable(tokens in arb_stream(), repeats in 1usize..8) {
        let mut cur = cursor(tokens.clone());
        let first = cur.peek().unwrap().clone();
        for _ in 0..repeats {
            prop_assert_eq!(cur.peek().unwrap(), &first);
        }
        prop_assert_eq!(cur.len(), 1);
    }

    /// reset(mark()) round-trips for any reachable position.
    #[test]
    fn prop_mark_reset_round_trip(
        tokens in arb_stream(),
        consumed in 0usize..16,
        extra in 0usize..16,
    ) {
        let total = tokens.len();
        let consumed = consumed % total;
        let mut cur = cursor(tokens);

        for _ in 0..consumed {
            cur.getnext().unwrap();
        }
        let saved = cur.mark();
        let expected = cur.peek().unwrap().clone();

        let extra = extra % (total - consumed);
        for _ in 0..extra {
            cur.getnext().unwrap();
        }

        cur.reset(saved);
        prop_assert_eq!(cur.mark(), saved);
        prop_assert_eq!(cur.peek().unwrap(), &expected);
    }

    /// Marks never move backwards as tokens are consumed.
    #[test]
    fn prop_marks_are_monotonic(tokens in arb_stream()) {
        let total = tokens.len();
        let mut cur = cursor(tokens);
        let mut previous = cur.mark();
        for _ in 0..total {
            cur.getnext().unwrap();
            let current = cur.mark();
            prop_assert!(current > previous);
            previous = current;
        }
    }
}

// =============================================================================
// Memoization Properties
// =============================================================================

proptest! {
    /// However many times a rule is invoked at one mark, its body runs
    /// exactly once, and every invocation agrees on result and end mark.
    #[test]
    fn prop_rule_body_runs_once(tokens in arb_stream(), repeats in 1usize..8) {
        let mut p = parser(tokens);
        let rule = Rule::new(RuleId(1), "probe");
        let calls = Cell::new(0u32);

        let entry = p.mark();
        let mut outcomes = Vec::new();
        for _ in 0..repeats {
            p.reset(entry);
            let result = p
                .memoize(rule, RuleArgs::None, |p| {
                    calls.set(calls.get() + 1);
                    p.name()
                })
                .unwrap();
            outcomes.push((result, p.mark()));
        }

        prop_assert_eq!(calls.get(), 1);
        for window in outcomes.windows(2) {
            prop_assert_eq!(window[0], window[1]);
        }
    }

    /// Lookaheads never move the cursor, whatever the stream holds.
    #[test]
    fn prop_lookaheads_restore_mark(tokens in arb_stream(), consumed in 0usize..16) {
        let total = tokens.len();
        let consumed = consumed % total;
        let mut p = parser(tokens);
        for _ in 0..consumed {
            p.cursor_mut().getnext().unwrap();
        }

        let before = p.mark();
        let positive = p.positive_lookahead(|p| p.name()).unwrap();
        prop_assert_eq!(p.mark(), before);
        let negative = p.negative_lookahead(|p| p.name()).unwrap();
        prop_assert_eq!(p.mark(), before);
        prop_assert_ne!(positive, negative);
    }
}
