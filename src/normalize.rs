//! Tree normalizer: concrete parse tree -> hiccup.
//!
//! A terminal becomes its matched text. A rule node becomes a sequence headed by
//! its display name, followed by its normalized children. Whether a child rule
//! nests as its own sequence or is spliced into the parent is decided by the
//! [`FlattenPolicy`]; the root is never spliced.
//!
//! Normalization is pure: the input tree and the rule table are only read, the
//! output owns all of its strings, and any failure discards the partial result.

use std::collections::BTreeSet;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::diagnostics::ErrorContext;
use crate::hiccup::Hiccup;
use crate::syntax::rules::{RuleEntry, RuleKind, RuleNames};
use crate::syntax::{ParseNode, RuleNode, TerminalNode};
use crate::{err_msg, ParceraError};

/// How child rule matches are placed in their parent's sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FlattenPolicy {
    /// Every child rule nests as its own `[name, ...]` sequence.
    Nested,
    /// Children of passthrough rules are spliced; every other child rule nests.
    #[default]
    Passthrough,
    /// Every child rule is spliced: the root name followed by all leaves.
    Flat,
}

/// Normalizes with the default policy.
pub fn normalize(node: &ParseNode, rule_names: &RuleNames) -> Result<Hiccup, ParceraError> {
    Normalizer::new(rule_names).normalize(node)
}

/// A normalizer bound to one rule table and one flatten policy.
#[derive(Debug, Clone)]
pub struct Normalizer<'r> {
    rules: &'r RuleNames,
    policy: FlattenPolicy,
    extra_splice: BTreeSet<usize>,
}

impl<'r> Normalizer<'r> {
    pub fn new(rules: &'r RuleNames) -> Self {
        Self {
            rules,
            policy: FlattenPolicy::default(),
            extra_splice: BTreeSet::new(),
        }
    }

    pub fn with_policy(mut self, policy: FlattenPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Treats the parser rule `name` as a passthrough rule in addition to the
    /// ones the table marks.
    pub fn splice(mut self, name: &str) -> Result<Self, ParceraError> {
        let index = self
            .rules
            .index_of(name)
            .ok_or_else(|| err_msg!(UnknownRule, "no grammar rule is named '{}'", name))?;
        if self.rules.resolve(index)?.kind == RuleKind::Token {
            return Err(err_msg!(
                Config,
                "'{}' is a token rule; only parser rules can be spliced",
                name
            ));
        }
        self.extra_splice.insert(index);
        Ok(self)
    }

    pub fn policy(&self) -> FlattenPolicy {
        self.policy
    }

    pub fn rules(&self) -> &'r RuleNames {
        self.rules
    }

    /// Walks the tree with an explicit stack, so nesting depth is bounded by the
    /// heap rather than the call stack.
    pub fn normalize(&self, node: &ParseNode) -> Result<Hiccup, ParceraError> {
        let root = match node {
            ParseNode::Terminal(terminal) => return self.leaf(terminal),
            ParseNode::Rule(rule) => rule,
        };
        let entry = self.parser_entry(root)?;
        let mut stack = vec![Frame::open(root, entry)];

        while let Some(top) = stack.last_mut() {
            match top.children.next() {
                Some(ParseNode::Terminal(terminal)) => {
                    let leaf = self.leaf(terminal)?;
                    target(&mut stack)?.push(leaf);
                }
                Some(ParseNode::Rule(sub)) => {
                    let entry = self.parser_entry(sub)?;
                    if self.splices(sub.rule_index, entry) {
                        stack.push(Frame::spliced(sub));
                    } else {
                        stack.push(Frame::open(sub, entry));
                    }
                }
                None => {
                    let Some(Frame {
                        open: Some((name, parts)),
                        ..
                    }) = stack.pop()
                    else {
                        continue;
                    };
                    let done = Hiccup::Rule {
                        name: name.to_string(),
                        parts,
                    };
                    if stack.is_empty() {
                        return Ok(done);
                    }
                    target(&mut stack)?.push(done);
                }
            }
        }
        Err(err_msg!(Internal, "normalizer lost the root sequence"))
    }

    fn splices(&self, index: usize, entry: &RuleEntry) -> bool {
        match self.policy {
            FlattenPolicy::Nested => false,
            FlattenPolicy::Passthrough => entry.passthrough || self.extra_splice.contains(&index),
            FlattenPolicy::Flat => true,
        }
    }

    fn leaf(&self, terminal: &TerminalNode) -> Result<Hiccup, ParceraError> {
        match self.rules.get(terminal.rule_index) {
            Some(entry) if entry.kind == RuleKind::Token => Ok(Hiccup::Leaf(terminal.text.clone())),
            Some(entry) => Err(unexpected(
                format!(
                    "terminal '{}' carries parser rule '{}' instead of a token rule",
                    terminal.text, entry.name
                ),
                terminal,
            )),
            None => Err(unexpected(
                format!(
                    "terminal '{}' carries token index {}, which is not in the rule-name table",
                    terminal.text, terminal.rule_index
                ),
                terminal,
            )),
        }
    }

    fn parser_entry(&self, rule: &RuleNode) -> Result<&'r RuleEntry, ParceraError> {
        let entry = self.rules.resolve(rule.rule_index).map_err(|e| match e {
            ParceraError::UnknownRule { message, source, .. } => ParceraError::UnknownRule {
                message,
                ctx: ErrorContext::with_span(rule.span),
                source,
            },
            other => other,
        })?;
        if entry.kind == RuleKind::Token {
            return Err(ParceraError::UnexpectedNodeKind {
                message: format!(
                    "rule node with {} children carries token rule '{}'",
                    rule.children.len(),
                    entry.name
                ),
                ctx: ErrorContext::with_span(rule.span),
                source: None,
            });
        }
        Ok(entry)
    }
}

/// One rule node being normalized. `open` holds the sequence under construction,
/// or `None` when the rule is spliced into its nearest open ancestor.
struct Frame<'t, 'r> {
    children: std::slice::Iter<'t, ParseNode>,
    open: Option<(&'r str, Vec<Hiccup>)>,
}

impl<'t, 'r> Frame<'t, 'r> {
    fn open(rule: &'t RuleNode, entry: &'r RuleEntry) -> Self {
        Self {
            children: rule.children.iter(),
            open: Some((entry.name.as_str(), Vec::with_capacity(rule.children.len()))),
        }
    }

    fn spliced(rule: &'t RuleNode) -> Self {
        Self {
            children: rule.children.iter(),
            open: None,
        }
    }
}

/// The parts of the innermost sequence still open.
fn target<'a>(stack: &'a mut [Frame<'_, '_>]) -> Result<&'a mut Vec<Hiccup>, ParceraError> {
    stack
        .iter_mut()
        .rev()
        .find_map(|frame| frame.open.as_mut().map(|(_, parts)| parts))
        .ok_or_else(|| err_msg!(Internal, "spliced rule has no enclosing sequence"))
}

fn unexpected(message: String, terminal: &TerminalNode) -> ParceraError {
    ParceraError::UnexpectedNodeKind {
        message,
        ctx: ErrorContext::with_span(terminal.span),
        source: None,
    }
}
