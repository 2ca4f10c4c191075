//! The Clojure reader: lexer, parser and normalizer bundled behind one value.
//!
//! A reader is created explicitly and owns its configuration; nothing is
//! registered globally, so independent readers (for example one per test) never
//! interfere. It is `Send + Sync` and can be shared across threads.

use crate::config::ReaderConfig;
use crate::hiccup::Hiccup;
use crate::normalize::Normalizer;
use crate::syntax::parser;
use crate::syntax::rules::RuleNames;
use crate::syntax::{ParseNode, TerminalNode};
use crate::ParceraError;

const DEFAULT_SOURCE_NAME: &str = "<input>";

#[derive(Debug, Clone)]
pub struct ClojureReader {
    config: ReaderConfig,
    normalizer: Normalizer<'static>,
}

impl Default for ClojureReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ClojureReader {
    /// A reader with the default configuration.
    pub fn new() -> Self {
        let config = ReaderConfig::default();
        let normalizer = Normalizer::new(RuleNames::clojure()).with_policy(config.flatten);
        Self { config, normalizer }
    }

    /// Fails when the configuration names a rule the grammar does not have.
    pub fn with_config(config: ReaderConfig) -> Result<Self, ParceraError> {
        let mut normalizer = Normalizer::new(RuleNames::clojure()).with_policy(config.flatten);
        for name in &config.splice {
            normalizer = normalizer.splice(name)?;
        }
        Ok(Self { config, normalizer })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn rule_names(&self) -> &'static RuleNames {
        RuleNames::clojure()
    }

    pub fn normalizer(&self) -> &Normalizer<'static> {
        &self.normalizer
    }

    /// Lexical stage only.
    pub fn tokens(&self, source: &str) -> Result<Vec<TerminalNode>, ParceraError> {
        self.tokens_named(DEFAULT_SOURCE_NAME, source)
    }

    pub fn tokens_named(&self, name: &str, source: &str) -> Result<Vec<TerminalNode>, ParceraError> {
        let tokens = parser::tokenize(source, name)?;
        log::debug!("{}: {} tokens from {} bytes", name, tokens.len(), source.len());
        Ok(tokens)
    }

    /// Builds the concrete parse tree.
    pub fn parse(&self, source: &str) -> Result<ParseNode, ParceraError> {
        self.parse_named(DEFAULT_SOURCE_NAME, source)
    }

    pub fn parse_named(&self, name: &str, source: &str) -> Result<ParseNode, ParceraError> {
        let tree = parser::parse(source, name)?;
        log::debug!(
            "{}: parse tree with {} nodes from {} bytes",
            name,
            tree.node_count(),
            source.len()
        );
        Ok(tree)
    }

    /// Parses and normalizes with the configured flatten policy.
    pub fn read(&self, source: &str) -> Result<Hiccup, ParceraError> {
        self.read_named(DEFAULT_SOURCE_NAME, source)
    }

    pub fn read_named(&self, name: &str, source: &str) -> Result<Hiccup, ParceraError> {
        let tree = self.parse_named(name, source)?;
        log::trace!("{}: normalizing with {:?}", name, self.normalizer.policy());
        self.normalizer
            .normalize(&tree)
            .map_err(|e| e.with_source(&crate::diagnostics::to_error_source(name, source)))
    }

    /// Serializes hiccup according to the `pretty` setting.
    pub fn to_json(&self, hiccup: &Hiccup) -> Result<String, ParceraError> {
        let json = if self.config.pretty {
            hiccup.to_json_pretty()
        } else {
            hiccup.to_json()
        };
        json.map_err(|e| ParceraError::Internal {
            message: format!("cannot serialize hiccup: {}", e),
            ctx: crate::ErrorContext::none(),
            source: Some(Box::new(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::FlattenPolicy;
    use crate::ErrorType;

    #[test]
    fn test_reader_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClojureReader>();
    }

    #[test]
    fn test_read_symbol() {
        let out = ClojureReader::new().read("foo").unwrap();
        assert_eq!(
            out.to_json().unwrap(),
            r#"["code",["form",["literal",["symbol","foo"]]]]"#
        );
    }

    #[test]
    fn test_config_splice_applies() {
        let config = ReaderConfig {
            splice: vec!["form".into(), "literal".into()],
            ..ReaderConfig::default()
        };
        let reader = ClojureReader::with_config(config).unwrap();
        let out = reader.read("foo").unwrap();
        assert_eq!(out.to_json().unwrap(), r#"["code",["symbol","foo"]]"#);
    }

    #[test]
    fn test_config_with_unknown_rule_fails() {
        let config = ReaderConfig {
            splice: vec!["no_such_rule".into()],
            ..ReaderConfig::default()
        };
        let err = ClojureReader::with_config(config).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::UnknownRule);
    }

    #[test]
    fn test_flat_policy_from_config() {
        let config = ReaderConfig {
            flatten: FlattenPolicy::Flat,
            pretty: false,
            ..ReaderConfig::default()
        };
        let reader = ClojureReader::with_config(config).unwrap();
        let out = reader.read("[1 2]").unwrap();
        assert_eq!(reader.to_json(&out).unwrap(), r#"["code","[","1","2","]"]"#);
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = ClojureReader::new().read_named("broken.clj", "(a").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Parse);
        let report = format!("{:?}", miette::Report::new(err));
        assert!(report.contains("broken.clj"));
    }
}
