// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Go syntax trees and the small expression model used for message
//! arguments.

use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::error::LoadError;

/// Node kinds the Go grammar uses for basic literals.
const LITERAL_KINDS: &[&str] = &[
    "interpreted_string_literal",
    "raw_string_literal",
    "int_literal",
    "float_literal",
    "imaginary_literal",
    "rune_literal",
];

/// Create a parser for Go source code.
pub fn go_parser() -> Result<Parser, LoadError> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_go::LANGUAGE.into())?;
    Ok(parser)
}

/// Parse `source` and reject trees with syntax errors.
///
/// The `path` is only used for error messages.
pub fn parse(parser: &mut Parser, path: &Path, source: &str) -> Result<Tree, LoadError> {
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| LoadError::ParseFailed(path.to_path_buf()))?;
    if let Some(node) = first_error(tree.root_node()) {
        let position = node.start_position();
        return Err(LoadError::Syntax {
            path: path.to_path_buf(),
            line: position.row + 1,
            column: position.column + 1,
            near: node_text(node, source).lines().next().unwrap_or("").to_owned(),
        });
    }
    Ok(tree)
}

/// Find the first `ERROR` or `MISSING` node in document order.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children = node.children(&mut cursor).collect::<Vec<_>>();
    children.into_iter().find_map(first_error)
}

/// The source text covered by `node`.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// An argument expression, reduced to the shapes the evaluator cares
/// about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A basic literal, holding the raw token text including quotes.
    Literal(String),
    /// A binary expression such as `"foo" + "bar"`.
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Anything else: identifiers, calls, selectors, parentheses, ...
    Other { kind: String, text: String },
}

impl Expr {
    /// Lower a syntax node into an [`Expr`].
    pub fn lower(node: Node<'_>, source: &str) -> Expr {
        let kind = node.kind();
        if LITERAL_KINDS.contains(&kind) {
            return Expr::Literal(node_text(node, source).to_owned());
        }
        if kind == "binary_expression" {
            let parts = (
                node.child_by_field_name("left"),
                node.child_by_field_name("operator"),
                node.child_by_field_name("right"),
            );
            if let (Some(left), Some(op), Some(right)) = parts {
                return Expr::Binary {
                    op: op.kind().to_owned(),
                    left: Box::new(Expr::lower(left, source)),
                    right: Box::new(Expr::lower(right, source)),
                };
            }
        }
        Expr::Other {
            kind: kind.to_owned(),
            text: node_text(node, source).to_owned(),
        }
    }
}

/// A call of the form `X.Name(args...)`.
#[derive(Debug, Clone)]
pub struct CallSite<'tree> {
    /// The selector operand, `X` above.
    pub receiver: Node<'tree>,
    /// The selected name, `Name` above.
    pub name: &'tree str,
    /// The argument nodes, comments excluded.
    pub arguments: Vec<Node<'tree>>,
    /// 1-based line where the call expression starts.
    pub line: usize,
    source: &'tree str,
}

impl<'tree> CallSite<'tree> {
    /// Build a call site from a `call_expression` node.
    ///
    /// Returns `None` when the callee is not a selector expression.
    pub fn from_node(node: Node<'tree>, source: &'tree str) -> Option<Self> {
        let function = node.child_by_field_name("function")?;
        if function.kind() != "selector_expression" {
            return None;
        }
        let receiver = function.child_by_field_name("operand")?;
        let field = function.child_by_field_name("field")?;
        let arguments = match node.child_by_field_name("arguments") {
            Some(list) => {
                let mut cursor = list.walk();
                let arguments = list
                    .named_children(&mut cursor)
                    .filter(|child| child.kind() != "comment")
                    .collect();
                arguments
            }
            None => Vec::new(),
        };
        Some(CallSite {
            receiver,
            name: node_text(field, source),
            arguments,
            line: node.start_position().row + 1,
            source,
        })
    }

    /// The receiver name if the receiver is a plain identifier.
    pub fn receiver_ident(&self) -> Option<&'tree str> {
        (self.receiver.kind() == "identifier").then(|| node_text(self.receiver, self.source))
    }

    /// Lower argument `idx`.
    pub fn argument(&self, idx: usize) -> Option<Expr> {
        self.arguments
            .get(idx)
            .map(|node| Expr::lower(*node, self.source))
    }
}

/// Visit every call site in `tree` in pre-order.
///
/// Stops at the first error returned by `visit`.
pub fn for_each_call<'tree, E, F>(tree: &'tree Tree, source: &'tree str, mut visit: F) -> Result<(), E>
where
    F: FnMut(CallSite<'tree>) -> Result<(), E>,
{
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        if node.kind() == "call_expression" {
            if let Some(call) = CallSite::from_node(node, source) {
                visit(call)?;
            }
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return Ok(());
            }
        }
    }
}
