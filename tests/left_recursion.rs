//! Integration tests for the left-recursion fixed point
//!
//! The grammar under test is the classic left-recursive expression
//! form:
//!
//! ```text
//! expr := expr '+' term | term
//! term := NAME | NUMBER
//! ```

use std::cell::{Cell, RefCell};

use pegrat::debug::render_compact;
use pegrat::{
    Parser, Position, Rule, RuleArgs, RuleId, RuleResult, Token, TokenCursor, TokenKind,
    TokenStream, Vocabulary,
};

// ============================================================================
// Helpers
// ============================================================================

const R_EXPR: Rule = Rule::new(RuleId(1), "expr");
const R_TERM: Rule = Rule::new(RuleId(2), "term");

fn tok(kind: TokenKind, text: &str, column: usize) -> Token {
    Token {
        kind,
        text: text.to_string(),
        start: Position::new(1, column),
        end: Position::new(1, column + text.len()),
        line: "a + 1\n".to_string(),
    }
}

fn end_marker() -> Token {
    Token {
        kind: TokenKind::EndMarker,
        text: String::new(),
        start: Position::new(2, 0),
        end: Position::new(2, 0),
        line: String::new(),
    }
}

fn parser(tokens: Vec<Token>) -> Parser<TokenStream> {
    Parser::new(
        TokenCursor::new(TokenStream::new(tokens)),
        Vocabulary::default(),
        "<test>",
    )
}

/// Tracked left-recursive `expr`: counts fixed-point body runs and
/// records the cursor position each body run ends at.
fn expr(
    p: &mut Parser<TokenStream>,
    runs: &Cell<u32>,
    ends: &RefCell<Vec<usize>>,
) -> RuleResult {
    p.memoize_left_rec(R_EXPR, |p| {
        runs.set(runs.get() + 1);
        let result = expr_alternatives(p, runs, ends)?;
        ends.borrow_mut().push(p.mark().index());
        Ok(result)
    })
}

fn expr_alternatives(
    p: &mut Parser<TokenStream>,
    runs: &Cell<u32>,
    ends: &RefCell<Vec<usize>>,
) -> RuleResult {
    let mark = p.mark();
    if let Some(lhs) = expr(p, runs, ends)? {
        if let Some(op) = p.expect("+")? {
            if let Some(rhs) = term(p)? {
                return Ok(Some(p.arena_mut().branch("add", &[lhs, op, rhs])));
            }
        }
    }
    p.reset(mark);
    term(p)
}

fn term(p: &mut Parser<TokenStream>) -> RuleResult {
    p.memoize(R_TERM, RuleArgs::None, |p| {
        if let Some(name) = p.name()? {
            return Ok(Some(name));
        }
        p.number()
    })
}

fn a_plus_one() -> Vec<Token> {
    vec![
        tok(TokenKind::Name, "a", 0),
        tok(TokenKind::Op, "+", 2),
        tok(TokenKind::Number, "1", 4),
        end_marker(),
    ]
}

// ============================================================================
// Convergence
// ============================================================================

#[test]
fn test_a_plus_one_converges_in_two_accepted_iterations() {
    let mut p = parser(a_plus_one());
    let runs = Cell::new(0);
    let ends = RefCell::new(Vec::new());

    let tree = expr(&mut p, &runs, &ends).unwrap().expect("parse succeeds");

    assert_eq!(
        render_compact(tree, p.arena(), p.cursor().tokens()),
        "(add NAME:\"a\" OP:\"+\" NUMBER:\"1\")"
    );
    assert_eq!(p.mark().index(), 3, "cursor lands after the accepted span");

    // First iteration accepts `term -> a` (one token), second accepts
    // the full `expr '+' term` (three tokens), third makes no progress.
    let ends = ends.borrow();
    assert_eq!(&*ends, &[1, 3, 1]);
    assert_eq!(ends[1] - ends[0], 2, "second accepted end mark is 2 tokens further");
    assert_eq!(runs.get(), 3);
}

#[test]
fn test_iteration_count_is_bounded_by_remaining_tokens() {
    // `a + 1` has four buffered tokens from the entry mark; the loop
    // may run at most five times.
    let mut p = parser(a_plus_one());
    let runs = Cell::new(0);
    let ends = RefCell::new(Vec::new());

    expr(&mut p, &runs, &ends).unwrap();
    assert!(runs.get() <= 5, "ran {} times", runs.get());
}

#[test]
fn test_longer_chain_keeps_strict_progress() {
    let tokens = vec![
        tok(TokenKind::Name, "a", 0),
        tok(TokenKind::Op, "+", 2),
        tok(TokenKind::Number, "1", 4),
        tok(TokenKind::Op, "+", 6),
        tok(TokenKind::Number, "2", 8),
        end_marker(),
    ];
    let mut p = parser(tokens);
    let runs = Cell::new(0);
    let ends = RefCell::new(Vec::new());

    let tree = expr(&mut p, &runs, &ends).unwrap().expect("parse succeeds");

    assert_eq!(
        render_compact(tree, p.arena(), p.cursor().tokens()),
        "(add (add NAME:\"a\" OP:\"+\" NUMBER:\"1\") OP:\"+\" NUMBER:\"2\")",
        "left associativity falls out of the fixed point"
    );
    assert_eq!(p.mark().index(), 5);

    // Accepted end marks strictly increase: 1, 3, 5.
    let ends = ends.borrow();
    assert_eq!(&ends[..3], &[1, 3, 5]);
}

// ============================================================================
// Failure and Reuse
// ============================================================================

#[test]
fn test_total_failure_leaves_cursor_on_entry_mark() {
    let mut p = parser(vec![tok(TokenKind::Op, "+", 0), end_marker()]);
    let runs = Cell::new(0);
    let ends = RefCell::new(Vec::new());

    let result = expr(&mut p, &runs, &ends).unwrap();
    assert!(result.is_none());
    assert_eq!(p.mark().index(), 0, "cursor is back on the entry mark");
    assert_eq!(runs.get(), 1, "one body run, no accepted iteration");

    // The failure is finalized: asking again replays it without
    // running the body.
    let again = expr(&mut p, &runs, &ends).unwrap();
    assert!(again.is_none());
    assert_eq!(runs.get(), 1);
    assert_eq!(p.mark().index(), 0);
}

#[test]
fn test_finalized_entry_is_replayed_not_reiterated() {
    let mut p = parser(a_plus_one());
    let runs = Cell::new(0);
    let ends = RefCell::new(Vec::new());

    let entry = p.mark();
    let first = expr(&mut p, &runs, &ends).unwrap();
    let runs_after_first = runs.get();

    p.reset(entry);
    let second = expr(&mut p, &runs, &ends).unwrap();

    assert_eq!(first, second, "same node replayed from the cache");
    assert_eq!(p.mark().index(), 3, "replay moves the cursor to the end mark");
    assert_eq!(runs.get(), runs_after_first, "no re-iteration");
}

#[test]
fn test_guard_is_restored_after_parse() {
    let mut p = parser(a_plus_one());
    let runs = Cell::new(0);
    let ends = RefCell::new(Vec::new());

    assert!(!p.in_left_recursion());
    expr(&mut p, &runs, &ends).unwrap();
    assert!(!p.in_left_recursion(), "guard restored on exit");
}

#[test]
fn test_guard_is_restored_when_body_raises() {
    let mut p = parser(vec![tok(TokenKind::Name, "a", 0), end_marker()]);
    let raising = Rule::new(RuleId(3), "raising");

    let err = p.memoize_left_rec(raising, |p| {
        let missing = p.op()?;
        p.expect_forced(missing, "an operator")
    });
    assert!(err.is_err());
    assert!(
        !p.in_left_recursion(),
        "guard restored even when the body raises"
    );
}

#[test]
fn test_guard_is_active_inside_the_loop() {
    let mut p = parser(a_plus_one());
    let observed = Cell::new(false);

    let watching = Rule::new(RuleId(3), "watching");
    p.memoize_left_rec(watching, |p| {
        observed.set(p.in_left_recursion());
        p.name()
    })
    .unwrap();

    assert!(observed.get(), "guard visible inside the fixed-point loop");
    assert!(!p.in_left_recursion());
}
