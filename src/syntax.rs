//! Concrete parse tree produced by the generated Clojure parser.
//!
//! The tree is an explicit two-variant union: rule nodes own ordered children,
//! terminal nodes carry only the text of the token they consumed. Both record the
//! index of the grammar rule that produced them (see [`rules::RuleNames`]).

use serde::{Deserialize, Serialize};

pub mod parser;
pub mod rules;

/// Represents a span in the source code (byte offsets).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A successful match of a named parser rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleNode {
    pub rule_index: usize,
    pub children: Vec<ParseNode>,
    pub span: Span,
}

impl RuleNode {
    pub fn new(rule_index: usize, children: Vec<ParseNode>, span: Span) -> Self {
        Self {
            rule_index,
            children,
            span,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A single consumed token. `rule_index` is the token rule (token type) that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalNode {
    pub rule_index: usize,
    pub text: String,
    pub span: Span,
}

impl TerminalNode {
    pub fn new(rule_index: usize, text: impl Into<String>, span: Span) -> Self {
        Self {
            rule_index,
            text: text.into(),
            span,
        }
    }
}

/// A node of the concrete parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseNode {
    Rule(RuleNode),
    Terminal(TerminalNode),
}

impl ParseNode {
    pub fn span(&self) -> Span {
        match self {
            ParseNode::Rule(node) => node.span,
            ParseNode::Terminal(node) => node.span,
        }
    }

    pub fn rule_index(&self) -> usize {
        match self {
            ParseNode::Rule(node) => node.rule_index,
            ParseNode::Terminal(node) => node.rule_index,
        }
    }

    pub fn as_rule(&self) -> Option<&RuleNode> {
        match self {
            ParseNode::Rule(node) => Some(node),
            ParseNode::Terminal(_) => None,
        }
    }

    /// Terminal nodes in document order.
    pub fn terminals(&self) -> Terminals<'_> {
        Terminals { stack: vec![self] }
    }

    /// Total number of nodes in this subtree, the root included.
    pub fn node_count(&self) -> usize {
        match self {
            ParseNode::Terminal(_) => 1,
            ParseNode::Rule(node) => 1 + node.children.iter().map(Self::node_count).sum::<usize>(),
        }
    }
}

impl From<RuleNode> for ParseNode {
    fn from(node: RuleNode) -> Self {
        ParseNode::Rule(node)
    }
}

impl From<TerminalNode> for ParseNode {
    fn from(node: TerminalNode) -> Self {
        ParseNode::Terminal(node)
    }
}

/// Depth-first, left-to-right iterator over the terminals of a parse tree.
pub struct Terminals<'a> {
    stack: Vec<&'a ParseNode>,
}

impl<'a> Iterator for Terminals<'a> {
    type Item = &'a TerminalNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                ParseNode::Terminal(terminal) => return Some(terminal),
                ParseNode::Rule(rule) => self.stack.extend(rule.children.iter().rev()),
            }
        }
        None
    }
}
