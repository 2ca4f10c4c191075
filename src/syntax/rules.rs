//! Rule-name table: maps grammar rule indices to display names.
//!
//! The table is supplied alongside the generated parser. Besides the name, each
//! entry records whether the rule is a token rule (its matches are leaves) or a
//! parser rule (its matches own children), and whether it is a passthrough rule
//! that only exists to group a `*`/`+` repetition.

use std::collections::HashMap;

use serde::Serialize;

use crate::{err_msg, ParceraError};

/// What a grammar rule produces in the parse tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Owns an ordered sequence of children.
    Parser,
    /// Matches a single token; carries only text.
    Token,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Parser => "parser",
            RuleKind::Token => "token",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleEntry {
    pub name: String,
    pub kind: RuleKind,
    pub passthrough: bool,
}

impl RuleEntry {
    pub fn parser(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RuleKind::Parser,
            passthrough: false,
        }
    }

    pub fn token(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RuleKind::Token,
            passthrough: false,
        }
    }

    /// A parser rule that is spliced into its parent during normalization.
    pub fn passthrough(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RuleKind::Parser,
            passthrough: true,
        }
    }
}

/// Ordered table of grammar rules, indexed by rule index.
#[derive(Debug, Clone, Default)]
pub struct RuleNames {
    entries: Vec<RuleEntry>,
    by_name: HashMap<String, usize>,
}

impl RuleNames {
    /// Builds a table; entry `i` describes rule index `i`. Names must be unique.
    pub fn new(entries: Vec<RuleEntry>) -> Result<Self, ParceraError> {
        let mut by_name = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if by_name.insert(entry.name.clone(), index).is_some() {
                return Err(err_msg!(
                    Config,
                    "rule '{}' is registered twice in the rule-name table",
                    entry.name
                ));
            }
        }
        Ok(Self { entries, by_name })
    }

    /// The table for the shipped Clojure grammar.
    pub fn clojure() -> &'static RuleNames {
        super::parser::clojure_rules()
    }

    pub fn get(&self, index: usize) -> Option<&RuleEntry> {
        self.entries.get(index)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.get(index).map(|entry| entry.name.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Looks up a rule, failing with `UnknownRule` when the index has no entry.
    pub fn resolve(&self, index: usize) -> Result<&RuleEntry, ParceraError> {
        self.get(index).ok_or_else(|| {
            err_msg!(
                UnknownRule,
                "rule index {} has no entry in the rule-name table ({} rules)",
                index,
                self.len()
            )
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &RuleEntry)> {
        self.entries.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorType;

    #[test]
    fn test_lookup_by_index_and_name() {
        let rules = RuleNames::new(vec![
            RuleEntry::parser("code"),
            RuleEntry::passthrough("forms"),
            RuleEntry::token("SYMBOL"),
        ])
        .unwrap();
        assert_eq!(rules.name(1), Some("forms"));
        assert_eq!(rules.index_of("SYMBOL"), Some(2));
        assert!(rules.get(1).unwrap().passthrough);
        assert_eq!(rules.get(2).unwrap().kind, RuleKind::Token);
        assert_eq!(rules.name(3), None);
    }

    #[test]
    fn test_resolve_miss_is_unknown_rule() {
        let rules = RuleNames::new(vec![RuleEntry::parser("code")]).unwrap();
        let err = rules.resolve(4).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::UnknownRule);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = RuleNames::new(vec![RuleEntry::parser("form"), RuleEntry::token("form")])
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }

    #[test]
    fn test_clojure_table_is_consistent() {
        let rules = RuleNames::clojure();
        assert_eq!(rules.name(0), Some("code"));
        let forms = rules.index_of("forms").unwrap();
        assert!(rules.get(forms).unwrap().passthrough);
        let symbol = rules.index_of("SYMBOL").unwrap();
        assert_eq!(rules.get(symbol).unwrap().kind, RuleKind::Token);
    }
}
