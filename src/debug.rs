//! Parse tree rendering
//!
//! The runtime treats trees as opaque, so everything that looks inside
//! one lives here: an indented pretty printer for humans, a compact
//! single-line rendering for trace output, and a `serde_json` view for
//! tooling.

use serde_json::{json, Value};

use crate::arena::{NodeId, TreeArena, TreeNode};
use crate::token::Token;

/// Parse tree pretty printer.
pub struct TreePrinter {
    /// Indentation string
    indent: String,
    /// Maximum depth to print
    max_depth: Option<usize>,
}

impl TreePrinter {
    /// Create a printer with two-space indentation and no depth limit.
    pub fn new() -> Self {
        Self {
            indent: "  ".to_string(),
            max_depth: None,
        }
    }

    /// Set the indentation string.
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Set the maximum depth to print.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Render a tree, one node per line.
    pub fn print(&self, node: NodeId, arena: &TreeArena, tokens: &[Token]) -> String {
        let mut output = String::new();
        self.print_node(node, arena, tokens, 0, &mut output);
        output
    }

    fn print_node(
        &self,
        node: NodeId,
        arena: &TreeArena,
        tokens: &[Token],
        depth: usize,
        output: &mut String,
    ) {
        if let Some(max) = self.max_depth {
            if depth > max {
                output.push_str(&self.indent.repeat(depth));
                output.push_str("...\n");
                return;
            }
        }

        output.push_str(&self.indent.repeat(depth));
        match arena.get(node) {
            TreeNode::Leaf { token } => {
                output.push_str(&leaf_text(token, tokens));
                output.push('\n');
            }
            TreeNode::Branch { label, .. } => {
                output.push_str(label);
                output.push('\n');
                for &child in arena.children(node) {
                    self.print_node(child, arena, tokens, depth + 1, output);
                }
            }
        }
    }
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Compact single-line rendering, `(label child ...)` style. Used by
/// rule traces.
pub fn render_compact(node: NodeId, arena: &TreeArena, tokens: &[Token]) -> String {
    match arena.get(node) {
        TreeNode::Leaf { token } => leaf_text(token, tokens),
        TreeNode::Branch { label, .. } => {
            let mut output = String::new();
            output.push('(');
            output.push_str(label);
            for &child in arena.children(node) {
                output.push(' ');
                output.push_str(&render_compact(child, arena, tokens));
            }
            output.push(')');
            output
        }
    }
}

/// Convert a tree to a `serde_json` value.
///
/// Leaves become `{"kind", "text", "start"}` objects; branches become
/// single-key objects mapping the label to the child list.
pub fn tree_to_value(node: NodeId, arena: &TreeArena, tokens: &[Token]) -> Value {
    match arena.get(node) {
        TreeNode::Leaf { token } => match tokens.get(token as usize) {
            Some(tok) => json!({
                "kind": tok.kind,
                "text": tok.text,
                "start": [tok.start.line, tok.start.column],
            }),
            None => Value::Null,
        },
        TreeNode::Branch { label, .. } => {
            let children: Vec<Value> = arena
                .children(node)
                .iter()
                .map(|&child| tree_to_value(child, arena, tokens))
                .collect();
            let mut object = serde_json::Map::new();
            object.insert(label.to_string(), Value::Array(children));
            Value::Object(object)
        }
    }
}

fn leaf_text(token: u32, tokens: &[Token]) -> String {
    match tokens.get(token as usize) {
        Some(tok) => format!("{}:{:?}", tok.kind, tok.text),
        None => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Mark;
    use crate::token::{Position, TokenKind};

    fn tokens() -> Vec<Token> {
        ["a", "+", "1"]
            .iter()
            .enumerate()
            .map(|(i, text)| Token {
                kind: match i {
                    0 => TokenKind::Name,
                    1 => TokenKind::Op,
                    _ => TokenKind::Number,
                },
                text: text.to_string(),
                start: Position::new(1, i * 2),
                end: Position::new(1, i * 2 + 1),
                line: "a + 1\n".to_string(),
            })
            .collect()
    }

    fn sample() -> (TreeArena, NodeId) {
        let mut arena = TreeArena::new();
        let a = arena.leaf(Mark::at(0));
        let plus = arena.leaf(Mark::at(1));
        let one = arena.leaf(Mark::at(2));
        let term = arena.branch("term", &[a]);
        let expr = arena.branch("add", &[term, plus, one]);
        (arena, expr)
    }

    #[test]
    fn test_print_indents_children() {
        let (arena, expr) = sample();
        let output = TreePrinter::new().print(expr, &arena, &tokens());
        assert_eq!(
            output,
            "add\n  term\n    NAME:\"a\"\n  OP:\"+\"\n  NUMBER:\"1\"\n"
        );
    }

    #[test]
    fn test_max_depth_elides() {
        let (arena, expr) = sample();
        let output = TreePrinter::new().max_depth(1).print(expr, &arena, &tokens());
        assert!(output.contains("..."));
        assert!(!output.contains("NAME"));
    }

    #[test]
    fn test_render_compact() {
        let (arena, expr) = sample();
        assert_eq!(
            render_compact(expr, &arena, &tokens()),
            "(add (term NAME:\"a\") OP:\"+\" NUMBER:\"1\")"
        );
    }

    #[test]
    fn test_tree_to_value_shape() {
        let (arena, expr) = sample();
        let value = tree_to_value(expr, &arena, &tokens());
        let children = value.get("add").and_then(Value::as_array).unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children[1]["text"], "+");
    }
}
