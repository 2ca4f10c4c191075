//! Handles all user-facing output for the CLI.
//!
//! Every function here renders to a `String`; the command handlers decide where
//! it goes. This keeps formatting testable without capturing stdout.

use serde_json::{Map, Value};

use crate::hiccup::Hiccup;
use crate::syntax::rules::RuleNames;
use crate::syntax::TerminalNode;
use crate::ParceraError;

/// One JSON document for a single source, or an object keyed by source name.
pub fn render_documents(documents: &[(String, Hiccup)], pretty: bool) -> Result<String, ParceraError> {
    let value = match documents {
        [(_, hiccup)] => to_value(hiccup)?,
        many => {
            let mut map = Map::with_capacity(many.len());
            for (name, hiccup) in many {
                map.insert(name.clone(), to_value(hiccup)?);
            }
            Value::Object(map)
        }
    };
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    json.map_err(internal)
}

/// `NAME start..end text`, one token per line.
pub fn render_tokens(tokens: &[TerminalNode], rules: &RuleNames) -> String {
    let mut out = String::new();
    for token in tokens {
        let name = rules.name(token.rule_index).unwrap_or("?");
        out.push_str(&format!(
            "{:<16} {:>5}..{:<5} {}\n",
            name, token.span.start, token.span.end, token.text
        ));
    }
    out
}

/// `index name kind`, with passthrough rules flagged.
pub fn render_rules(rules: &RuleNames) -> String {
    let mut out = String::new();
    for (index, entry) in rules.iter() {
        let marker = if entry.passthrough { " passthrough" } else { "" };
        out.push_str(&format!(
            "{:>3} {:<20} {}{}\n",
            index,
            entry.name,
            entry.kind.as_str(),
            marker
        ));
    }
    out
}

fn to_value(hiccup: &Hiccup) -> Result<Value, ParceraError> {
    serde_json::to_value(hiccup).map_err(internal)
}

fn internal(e: serde_json::Error) -> ParceraError {
    ParceraError::Internal {
        message: format!("cannot serialize hiccup: {}", e),
        ctx: crate::ErrorContext::none(),
        source: Some(Box::new(e)),
    }
}
