//! Clojure parser glue
//!
//! Drives the parser generated from `grammar.pest` and converts its pairs into the
//! two-variant parse tree. Token rules become terminals; parser rules become rule
//! nodes. The generator's end-of-input marker is dropped.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use pest::{
    error::{Error, ErrorVariant, InputLocation},
    iterators::{Pair, Pairs},
    Parser,
};
use pest_derive::Parser;

use crate::diagnostics::{to_error_source, ErrorContext};
use crate::syntax::rules::{RuleEntry, RuleKind, RuleNames};
use crate::syntax::{ParseNode, RuleNode, Span, TerminalNode};
use crate::{err_ctx, ParceraError};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct ClojureParser;

// ============================================================================
// RULE TABLE
// ============================================================================

/// Every rule of the grammar that can appear in a parse tree, in index order.
const CLOJURE_GRAMMAR: &[(Rule, RuleKind, bool)] = &[
    (Rule::code, RuleKind::Parser, false),
    (Rule::tokens, RuleKind::Parser, false),
    (Rule::forms, RuleKind::Parser, true),
    (Rule::form, RuleKind::Parser, false),
    (Rule::collection, RuleKind::Parser, false),
    (Rule::list, RuleKind::Parser, false),
    (Rule::vector, RuleKind::Parser, false),
    (Rule::map, RuleKind::Parser, false),
    (Rule::set, RuleKind::Parser, false),
    (Rule::fn_literal, RuleKind::Parser, false),
    (Rule::reader_conditional, RuleKind::Parser, false),
    (Rule::namespaced_map, RuleKind::Parser, false),
    (Rule::reader_macro, RuleKind::Parser, false),
    (Rule::quote, RuleKind::Parser, false),
    (Rule::backtick, RuleKind::Parser, false),
    (Rule::unquote_splicing, RuleKind::Parser, false),
    (Rule::unquote, RuleKind::Parser, false),
    (Rule::deref, RuleKind::Parser, false),
    (Rule::metadata, RuleKind::Parser, false),
    (Rule::var_quote, RuleKind::Parser, false),
    (Rule::discard, RuleKind::Parser, false),
    (Rule::tagged_literal, RuleKind::Parser, false),
    (Rule::literal, RuleKind::Parser, false),
    (Rule::number, RuleKind::Parser, false),
    (Rule::character, RuleKind::Parser, false),
    (Rule::nil, RuleKind::Parser, false),
    (Rule::boolean, RuleKind::Parser, false),
    (Rule::keyword, RuleKind::Parser, false),
    (Rule::string, RuleKind::Parser, false),
    (Rule::regex, RuleKind::Parser, false),
    (Rule::symbolic_value, RuleKind::Parser, false),
    (Rule::symbol, RuleKind::Parser, false),
    (Rule::LPAREN, RuleKind::Token, false),
    (Rule::RPAREN, RuleKind::Token, false),
    (Rule::LBRACKET, RuleKind::Token, false),
    (Rule::RBRACKET, RuleKind::Token, false),
    (Rule::LBRACE, RuleKind::Token, false),
    (Rule::RBRACE, RuleKind::Token, false),
    (Rule::HASH_BRACE, RuleKind::Token, false),
    (Rule::HASH_PAREN, RuleKind::Token, false),
    (Rule::READER_COND, RuleKind::Token, false),
    (Rule::NS_MAP_PREFIX, RuleKind::Token, false),
    (Rule::QUOTE, RuleKind::Token, false),
    (Rule::BACKTICK, RuleKind::Token, false),
    (Rule::UNQUOTE_SPLICING, RuleKind::Token, false),
    (Rule::UNQUOTE, RuleKind::Token, false),
    (Rule::DEREF, RuleKind::Token, false),
    (Rule::CARET, RuleKind::Token, false),
    (Rule::VAR_QUOTE, RuleKind::Token, false),
    (Rule::DISCARD, RuleKind::Token, false),
    (Rule::TAG, RuleKind::Token, false),
    (Rule::NUMBER, RuleKind::Token, false),
    (Rule::CHARACTER, RuleKind::Token, false),
    (Rule::NIL, RuleKind::Token, false),
    (Rule::BOOLEAN, RuleKind::Token, false),
    (Rule::KEYWORD, RuleKind::Token, false),
    (Rule::STRING, RuleKind::Token, false),
    (Rule::REGEX, RuleKind::Token, false),
    (Rule::SYMBOLIC_VALUE, RuleKind::Token, false),
    (Rule::SYMBOL, RuleKind::Token, false),
];

struct ClojureTable {
    names: RuleNames,
    indices: HashMap<Rule, usize>,
}

static CLOJURE_TABLE: Lazy<ClojureTable> = Lazy::new(|| {
    let entries = CLOJURE_GRAMMAR
        .iter()
        .map(|&(rule, kind, passthrough)| RuleEntry {
            name: format!("{:?}", rule),
            kind,
            passthrough,
        })
        .collect();
    let indices = CLOJURE_GRAMMAR
        .iter()
        .enumerate()
        .map(|(index, &(rule, _, _))| (rule, index))
        .collect();
    ClojureTable {
        // grammar rules are distinct enum variants, so their names are unique
        names: RuleNames::new(entries).expect("duplicate rule in CLOJURE_GRAMMAR"),
        indices,
    }
});

/// The rule-name table matching the generated parser.
pub fn clojure_rules() -> &'static RuleNames {
    &CLOJURE_TABLE.names
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses Clojure source into a parse tree rooted at the `code` rule.
///
/// `name` labels the source in diagnostics. Input nested deeper than
/// [`MAX_NESTING_DEPTH`] is rejected before the grammar runs.
pub fn parse(source: &str, name: &str) -> Result<ParseNode, ParceraError> {
    check_nesting(&tokenize(source, name)?, source, name)?;
    let mut pairs = ClojureParser::parse(Rule::code, source)
        .map_err(|e| convert_parse_error(e, source, name))?;
    let code = pairs.next().ok_or_else(|| {
        crate::err_msg!(Parse, "the parser produced no tree for '{}'", name)
    })?;
    build_node(code).map_err(|e| e.with_source(&to_error_source(name, source)))
}

/// Runs only the lexical stage: the token stream of `source`, in order.
///
/// Delimiters need not be balanced here; only unrecognisable characters fail.
pub fn tokenize(source: &str, name: &str) -> Result<Vec<TerminalNode>, ParceraError> {
    let mut pairs = ClojureParser::parse(Rule::tokens, source)
        .map_err(|e| convert_parse_error(e, source, name))?;
    let Some(stream) = pairs.next() else {
        return Ok(Vec::new());
    };
    stream
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(|p| match build_node(p)? {
            ParseNode::Terminal(token) => Ok(token),
            ParseNode::Rule(node) => Err(unexpected_node(
                format!(
                    "rule '{}' appeared in the token stream",
                    clojure_rules().name(node.rule_index).unwrap_or("?")
                ),
                node.span,
            )),
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.with_source(&to_error_source(name, source)))
}

// ============================================================================
// TREE BUILDING
// ============================================================================

/// Converts a pair and everything below it. The walk keeps its own stack, so deep
/// input costs heap rather than call frames.
fn build_node(root: Pair<Rule>) -> Result<ParseNode, ParceraError> {
    let mut stack = match open_pair(root)? {
        Opened::Terminal(node) => return Ok(node),
        Opened::Rule(pending) => vec![pending],
    };

    while let Some(top) = stack.last_mut() {
        match top.rest.next() {
            Some(pair) if pair.as_rule() == Rule::EOI => {}
            Some(pair) => match open_pair(pair)? {
                Opened::Terminal(node) => top.children.push(node),
                Opened::Rule(pending) => stack.push(pending),
            },
            None => {
                let Some(done) = stack.pop() else { break };
                let node: ParseNode = RuleNode::new(done.index, done.children, done.span).into();
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Ok(node),
                }
            }
        }
    }
    Err(crate::err_msg!(Internal, "parse tree builder lost its root"))
}

/// A parser rule whose children are still being converted.
struct PendingRule<'i> {
    index: usize,
    span: Span,
    children: Vec<ParseNode>,
    rest: Pairs<'i, Rule>,
}

enum Opened<'i> {
    Terminal(ParseNode),
    Rule(PendingRule<'i>),
}

fn open_pair(pair: Pair<'_, Rule>) -> Result<Opened<'_>, ParceraError> {
    let span = get_span(&pair);
    let rule = pair.as_rule();
    let Some(&index) = CLOJURE_TABLE.indices.get(&rule) else {
        return Err(unexpected_node(
            format!("grammar rule {:?} has no entry in the rule-name table", rule),
            span,
        ));
    };

    match CLOJURE_TABLE.names.resolve(index)?.kind {
        RuleKind::Token => {
            if pair.clone().into_inner().next().is_some() {
                return Err(unexpected_node(
                    format!("token rule {:?} matched with nested rules", rule),
                    span,
                ));
            }
            Ok(Opened::Terminal(
                TerminalNode::new(index, pair.as_str(), span).into(),
            ))
        }
        RuleKind::Parser => Ok(Opened::Rule(PendingRule {
            index,
            span,
            children: Vec::new(),
            rest: pair.into_inner(),
        })),
    }
}

// ============================================================================
// NESTING LIMIT
// ============================================================================

/// Deepest nesting of collections and reader macros that `parse` accepts.
pub const MAX_NESTING_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nesting {
    Open,
    Close,
    /// A reader macro waiting for this many forms.
    Prefix(usize),
    Atom,
}

fn nesting_role(rule: Rule) -> Nesting {
    match rule {
        Rule::LPAREN
        | Rule::LBRACKET
        | Rule::LBRACE
        | Rule::HASH_BRACE
        | Rule::HASH_PAREN
        | Rule::READER_COND => Nesting::Open,
        Rule::RPAREN | Rule::RBRACKET | Rule::RBRACE => Nesting::Close,
        Rule::CARET => Nesting::Prefix(2),
        Rule::QUOTE
        | Rule::BACKTICK
        | Rule::UNQUOTE_SPLICING
        | Rule::UNQUOTE
        | Rule::DEREF
        | Rule::VAR_QUOTE
        | Rule::DISCARD
        | Rule::TAG
        | Rule::NS_MAP_PREFIX => Nesting::Prefix(1),
        _ => Nesting::Atom,
    }
}

/// Nesting depth reached after each token. Unbalanced closers are ignored;
/// the grammar reports those.
fn nesting_depths(tokens: &[TerminalNode]) -> impl Iterator<Item = (usize, &TerminalNode)> + '_ {
    let mut open: Vec<Nesting> = Vec::new();
    tokens.iter().map(move |token| {
        let role = CLOJURE_GRAMMAR
            .get(token.rule_index)
            .map_or(Nesting::Atom, |&(rule, _, _)| nesting_role(rule));
        match role {
            Nesting::Open | Nesting::Prefix(_) => open.push(role),
            Nesting::Close => {
                while let Some(Nesting::Prefix(_)) = open.last() {
                    open.pop();
                }
                open.pop();
                complete_form(&mut open);
            }
            Nesting::Atom => complete_form(&mut open),
        }
        (open.len(), token)
    })
}

/// Pops the reader macros that the form just finished satisfies.
fn complete_form(open: &mut Vec<Nesting>) {
    while let Some(Nesting::Prefix(remaining)) = open.last_mut() {
        if *remaining > 1 {
            *remaining -= 1;
            return;
        }
        open.pop();
    }
}

fn check_nesting(tokens: &[TerminalNode], source: &str, name: &str) -> Result<(), ParceraError> {
    match nesting_depths(tokens).find(|&(depth, _)| depth > MAX_NESTING_DEPTH) {
        Some((_, token)) => Err(err_ctx!(
            Parse,
            format!("forms are nested more than {} levels deep", MAX_NESTING_DEPTH),
            &to_error_source(name, source),
            token.span,
            "split the expression into smaller top-level forms"
        )),
        None => Ok(()),
    }
}

fn unexpected_node(message: String, span: Span) -> ParceraError {
    ParceraError::UnexpectedNodeKind {
        message,
        ctx: ErrorContext::with_span(span),
        source: None,
    }
}

fn get_span(pair: &Pair<Rule>) -> Span {
    Span {
        start: pair.as_span().start(),
        end: pair.as_span().end(),
    }
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

fn convert_parse_error(error: Error<Rule>, source: &str, name: &str) -> ParceraError {
    let (start, end) = match error.location {
        InputLocation::Pos(pos) => (pos, pos),
        InputLocation::Span((start, end)) => (start, end),
    };
    let span = clamp_span(start, end, source.len());

    let message = match &error.variant {
        ErrorVariant::ParsingError { positives, .. } => describe_expected(positives),
        ErrorVariant::CustomError { message } => message.clone(),
    };

    let rest = source.get(start..).unwrap_or("");
    let help = if rest.starts_with('"') || rest.starts_with("#\"") {
        Some("string literal is not terminated".to_string())
    } else if start >= source.len() {
        Some("input ended before every delimiter was closed".to_string())
    } else {
        None
    };

    let src = to_error_source(name, source);
    match help {
        Some(help) => err_ctx!(Parse, message, &src, span, help),
        None => err_ctx!(Parse, message, &src, span),
    }
}

/// Keeps the label inside the source so that it can be rendered.
fn clamp_span(start: usize, end: usize, len: usize) -> Span {
    if len == 0 {
        return Span::new(0, 0);
    }
    let start = start.min(len - 1);
    let end = end.max(start + 1).min(len);
    Span::new(start, end)
}

fn describe_expected(positives: &[Rule]) -> String {
    let mut expected: Vec<&'static str> = positives.iter().map(|r| display_rule(*r)).collect();
    expected.sort_unstable();
    expected.dedup();
    match expected.as_slice() {
        [] => "unexpected input".to_string(),
        [one] => format!("expected {}", one),
        many => format!("expected one of {}", many.join(", ")),
    }
}

fn display_rule(rule: Rule) -> &'static str {
    match rule {
        Rule::RPAREN => "')'",
        Rule::RBRACKET => "']'",
        Rule::RBRACE => "'}'",
        Rule::LBRACE | Rule::map => "'{'",
        Rule::EOI => "end of input",
        _ => "form",
    }
}
