//! Demo driver for the pegrat runtime
//!
//! Parses arithmetic expressions with a small hand-written grammar that
//! stands in for generated code: it wires terminal matchers, plain
//! memoized rules and left-recursive rules through the runtime exactly
//! the way a generated grammar layer would.
//!
//! ```text
//! start := expr NEWLINE? ENDMARKER
//! expr  := expr '+' term | expr '-' term | term
//! term  := term '*' atom | term '/' atom | atom
//! atom  := '(' expr ')' | NAME | NUMBER
//! ```
//!
//! Verbosity: `-v` prints timing and cache statistics, `-vv` adds
//! parser rule tracing, `-vvv` token cursor tracing only, `-vvvv`
//! everything.

use std::io::{self, Read};
use std::process;
use std::time::Instant;

use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;

use pegrat::debug::{tree_to_value, TreePrinter};
use pegrat::{
    ParseError, ParseResult, Position, Rule, RuleArgs, RuleId, RuleResult, Token, TokenCursor,
    TokenKind, TokenSource, Vocabulary,
};

/// Command-line arguments, mirroring the classic simple parser main.
#[derive(Parser, Debug)]
#[command(name = "pegrat", version, about = "Parse expressions with the pegrat demo grammar")]
struct Cli {
    /// Print timing stats; repeat for more debug output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Don't print the parsed tree
    #[arg(short, long)]
    quiet: bool,

    /// Print the tree as JSON instead of the indented form
    #[arg(long)]
    json: bool,

    /// Input file ('-' to use stdin)
    filename: String,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (source, filename) = match read_input(&cli.filename) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("pegrat: {}: {}", cli.filename, err);
            process::exit(1);
        }
    };

    if let Err(err) = run(&cli, &source, &filename) {
        match &err {
            ParseError::Syntax(syntax) => eprintln!("{}", syntax.format_with_line()),
            other => eprintln!("pegrat: {}", other),
        }
        process::exit(1);
    }
}

fn run(cli: &Cli, source: &str, filename: &str) -> ParseResult<()> {
    let t0 = Instant::now();

    let lexer = DemoLexer::new(source);
    let cursor = if filename == "<stdin>" {
        TokenCursor::new(lexer)
    } else {
        TokenCursor::with_path(lexer, filename)
    };
    let mut parser = DemoParser::new(cursor, vocabulary(), filename);

    let tree = start(&mut parser)?;
    let dt = t0.elapsed();

    let Some(root) = tree else {
        return Err(parser.make_syntax_error("invalid syntax"));
    };

    if !cli.quiet {
        if cli.json {
            let value = tree_to_value(root, parser.arena(), parser.cursor().tokens());
            println!(
                "{}",
                serde_json::to_string_pretty(&value).expect("tree serialization cannot fail")
            );
        } else {
            print!(
                "{}",
                TreePrinter::new().print(root, parser.arena(), parser.cursor().tokens())
            );
        }
    }

    if cli.verbose > 0 {
        let (nlines, hit_end) = {
            let diag = parser.cursor_mut().diagnose()?;
            (diag.end.line, diag.kind == TokenKind::EndMarker)
        };
        let nlines = if hit_end { nlines.saturating_sub(1) } else { nlines };
        let secs = dt.as_secs_f64();
        print!(
            "Total time: {:.3} sec; {} lines ({} bytes)",
            secs,
            nlines,
            source.len()
        );
        if secs > 0.0 {
            println!("; {:.0} lines/sec", nlines as f64 / secs);
        } else {
            println!();
        }
        let (hits, misses, hit_rate) = parser.cache().stats();
        println!("Cache sizes:");
        println!("  token array : {:>10}", parser.cursor().len());
        println!("        cache : {:>10}", parser.cache().len());
        println!(
            "  hits/misses : {}/{} ({:.0}% hit rate)",
            hits,
            misses,
            hit_rate * 100.0
        );
    }

    Ok(())
}

fn read_input(filename: &str) -> io::Result<(String, String)> {
    if filename == "-" || filename.is_empty() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok((buffer, "<stdin>".to_string()))
    } else {
        Ok((std::fs::read_to_string(filename)?, filename.to_string()))
    }
}

/// Map the `-v` count onto log filters: parser rule tracing lives at
/// debug level, cursor progress tracing at trace level.
fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.format_timestamp(None).format_target(false);
    match verbose {
        0 | 1 => {}
        2 => {
            builder.filter_module("pegrat", log::LevelFilter::Debug);
        }
        3 => {
            builder.filter_module("pegrat::cursor", log::LevelFilter::Trace);
        }
        _ => {
            builder.filter_module("pegrat", log::LevelFilter::Trace);
        }
    }
    builder.init();
}

// ============================================================================
// Demo grammar
// ============================================================================

type DemoParser = pegrat::Parser<DemoLexer>;

const R_START: Rule = Rule::new(RuleId(1), "start");
const R_EXPR: Rule = Rule::new(RuleId(2), "expr");
const R_TERM: Rule = Rule::new(RuleId(3), "term");
const R_ATOM: Rule = Rule::new(RuleId(4), "atom");

fn vocabulary() -> Vocabulary {
    Vocabulary::new(&[], &[])
}

fn start(p: &mut DemoParser) -> RuleResult {
    p.memoize(R_START, RuleArgs::None, |p| {
        let Some(body) = expr(p)? else {
            return Ok(None);
        };
        p.expect("NEWLINE")?;
        if p.expect("ENDMARKER")?.is_none() {
            return Ok(None);
        }
        Ok(Some(body))
    })
}

fn expr(p: &mut DemoParser) -> RuleResult {
    p.memoize_left_rec(R_EXPR, |p| {
        let mark = p.mark();
        if let Some(lhs) = expr(p)? {
            if let Some(op) = p.expect("+")? {
                if let Some(rhs) = term(p)? {
                    return Ok(Some(p.arena_mut().branch("add", &[lhs, op, rhs])));
                }
            }
        }
        p.reset(mark);
        if let Some(lhs) = expr(p)? {
            if let Some(op) = p.expect("-")? {
                if let Some(rhs) = term(p)? {
                    return Ok(Some(p.arena_mut().branch("sub", &[lhs, op, rhs])));
                }
            }
        }
        p.reset(mark);
        term(p)
    })
}

fn term(p: &mut DemoParser) -> RuleResult {
    p.memoize_left_rec(R_TERM, |p| {
        let mark = p.mark();
        if let Some(lhs) = term(p)? {
            if let Some(op) = p.expect("*")? {
                if let Some(rhs) = atom(p)? {
                    return Ok(Some(p.arena_mut().branch("mul", &[lhs, op, rhs])));
                }
            }
        }
        p.reset(mark);
        if let Some(lhs) = term(p)? {
            if let Some(op) = p.expect("/")? {
                if let Some(rhs) = atom(p)? {
                    return Ok(Some(p.arena_mut().branch("div", &[lhs, op, rhs])));
                }
            }
        }
        p.reset(mark);
        atom(p)
    })
}

fn atom(p: &mut DemoParser) -> RuleResult {
    p.memoize(R_ATOM, RuleArgs::None, |p| {
        let mark = p.mark();
        if let Some(open) = p.expect("(")? {
            if let Some(inner) = expr(p)? {
                let close = p.expect(")")?;
                if let Some(close) = p.expect_forced(close, "')'")? {
                    return Ok(Some(p.arena_mut().branch("group", &[open, inner, close])));
                }
            }
        }
        p.reset(mark);
        if let Some(name) = p.name()? {
            return Ok(Some(name));
        }
        p.reset(mark);
        if let Some(number) = p.number()? {
            return Ok(Some(number));
        }
        Ok(None)
    })
}

// ============================================================================
// Demo lexer
// ============================================================================

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(?:\.[0-9]+)?").expect("static pattern"));
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").expect("static pattern"));

/// Line-oriented scanner for the demo grammar's tokens.
struct DemoLexer {
    lines: Vec<String>,
    row: usize,
    col: usize,
    /// Whether the current line produced a meaningful token yet; a line
    /// holding only a comment ends in NL rather than NEWLINE
    content_seen: bool,
    done: bool,
}

impl DemoLexer {
    fn new(source: &str) -> Self {
        Self {
            lines: source.split_inclusive('\n').map(String::from).collect(),
            row: 0,
            col: 0,
            content_seen: false,
            done: false,
        }
    }

    fn token(&self, kind: TokenKind, text: &str, line_no: usize, col: usize) -> Token {
        let line = self.lines.get(self.row).cloned().unwrap_or_default();
        Token {
            kind,
            text: text.to_string(),
            start: Position::new(line_no, col),
            end: Position::new(line_no, col + text.len()),
            line,
        }
    }
}

impl TokenSource for DemoLexer {
    fn next_token(&mut self) -> ParseResult<Option<Token>> {
        if self.row >= self.lines.len() {
            if self.done {
                return Ok(None);
            }
            self.done = true;
            let line_no = self.lines.len() + 1;
            return Ok(Some(Token {
                kind: TokenKind::EndMarker,
                text: String::new(),
                start: Position::new(line_no, 0),
                end: Position::new(line_no, 0),
                line: String::new(),
            }));
        }

        let line = self.lines[self.row].clone();
        let line_no = self.row + 1;

        if self.col == 0 && line.trim().is_empty() {
            let tok = self.token(TokenKind::Nl, &line, line_no, 0);
            self.row += 1;
            return Ok(Some(tok));
        }

        let bytes = line.as_bytes();
        while self.col < bytes.len() && (bytes[self.col] == b' ' || bytes[self.col] == b'\t') {
            self.col += 1;
        }

        let rest = &line[self.col..];
        let content = rest.trim_end_matches(['\n', '\r']);
        if content.is_empty() {
            let kind = if self.content_seen {
                TokenKind::Newline
            } else {
                TokenKind::Nl
            };
            let tok = self.token(kind, "\n", line_no, self.col);
            self.row += 1;
            self.col = 0;
            self.content_seen = false;
            return Ok(Some(tok));
        }

        if content.starts_with('#') {
            let tok = self.token(TokenKind::Comment, content, line_no, self.col);
            self.col += content.len();
            return Ok(Some(tok));
        }

        if let Some(found) = NUMBER_RE.find(content) {
            let tok = self.token(TokenKind::Number, found.as_str(), line_no, self.col);
            self.col += found.end();
            self.content_seen = true;
            return Ok(Some(tok));
        }

        if let Some(found) = NAME_RE.find(content) {
            let tok = self.token(TokenKind::Name, found.as_str(), line_no, self.col);
            self.col += found.end();
            self.content_seen = true;
            return Ok(Some(tok));
        }

        let ch = content.chars().next().expect("content is non-empty");
        if "+-*/()".contains(ch) {
            let text = ch.to_string();
            let tok = self.token(TokenKind::Op, &text, line_no, self.col);
            self.col += ch.len_utf8();
            self.content_seen = true;
            return Ok(Some(tok));
        }

        Err(ParseError::Tokenize {
            message: format!("unexpected character {:?}", ch),
            line: line_no,
            column: self.col,
        })
    }
}
