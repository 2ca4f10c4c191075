// tests/reader_tests.rs

use parcera::config::ReaderConfig;
use parcera::{
    normalize, ClojureReader, ErrorType, FlattenPolicy, Hiccup, Normalizer, ParseNode, RuleNames,
    RuleNode, Span, TerminalNode,
};
use serde_json::json;

mod common;
use common::assert_covers;

fn read(source: &str) -> Hiccup {
    ClojureReader::new().read(source).expect("read should succeed")
}

fn read_compact(source: &str) -> serde_json::Value {
    let config = ReaderConfig {
        splice: vec![
            "form".into(),
            "collection".into(),
            "reader_macro".into(),
            "literal".into(),
        ],
        ..ReaderConfig::default()
    };
    let hiccup = ClojureReader::with_config(config)
        .unwrap()
        .read(source)
        .unwrap();
    serde_json::to_value(&hiccup).unwrap()
}

// ---
// Canonical example
// ---

const EXAMPLE: &str = r#"(john :SHOUTS "hello" @michael pink/this will work)"#;

#[test]
fn test_example_hiccup_shape() {
    let value = serde_json::to_value(read(EXAMPLE)).unwrap();
    let sym = |s: &str| json!(["form", ["literal", ["symbol", s]]]);
    assert_eq!(
        value,
        json!([
            "code",
            ["form", ["collection", [
                "list",
                "(",
                sym("john"),
                ["form", ["literal", ["keyword", ":SHOUTS"]]],
                ["form", ["literal", ["string", "\"hello\""]]],
                ["form", ["reader_macro", ["deref", "@", sym("michael")]]],
                sym("pink/this"),
                sym("will"),
                sym("work"),
                ")"
            ]]]
        ])
    );
}

#[test]
fn test_example_leaves_cover_source() {
    let hiccup = read(EXAMPLE);
    let leaves: Vec<_> = hiccup.leaves().collect();
    assert_eq!(
        leaves,
        [
            "(", "john", ":SHOUTS", "\"hello\"", "@", "michael", "pink/this", "will", "work", ")"
        ]
    );
    assert_covers(EXAMPLE, &leaves);
}

#[test]
fn test_example_with_spliced_wrappers() {
    assert_eq!(
        read_compact(EXAMPLE),
        json!([
            "code",
            [
                "list",
                "(",
                ["symbol", "john"],
                ["keyword", ":SHOUTS"],
                ["string", "\"hello\""],
                ["deref", "@", ["symbol", "michael"]],
                ["symbol", "pink/this"],
                ["symbol", "will"],
                ["symbol", "work"],
                ")"
            ]
        ])
    );
}

// ---
// Grammar coverage through the reader
// ---

#[test]
fn test_collections() {
    assert_eq!(
        read_compact("[1 {:a #{2}} #(inc %)]"),
        json!([
            "code",
            [
                "vector",
                "[",
                ["number", "1"],
                ["map", "{", ["keyword", ":a"], ["set", "#{", ["number", "2"], "}"], "}"],
                ["fn_literal", "#(", ["symbol", "inc"], ["symbol", "%"], ")"],
                "]"
            ]
        ])
    );
}

#[test]
fn test_reader_macros() {
    assert_eq!(
        read_compact("`(a ~b ~@c) 'd #'e #_f ^:meta g"),
        json!([
            "code",
            ["backtick", "`", [
                "list",
                "(",
                ["symbol", "a"],
                ["unquote", "~", ["symbol", "b"]],
                ["unquote_splicing", "~@", ["symbol", "c"]],
                ")"
            ]],
            ["quote", "'", ["symbol", "d"]],
            ["var_quote", "#'", ["symbol", "e"]],
            ["discard", "#_", ["symbol", "f"]],
            ["metadata", "^", ["keyword", ":meta"], ["symbol", "g"]]
        ])
    );
}

#[test]
fn test_repeated_discard_nests() {
    assert_eq!(
        read_compact("#_ #_ a b c"),
        json!([
            "code",
            ["discard", "#_", ["discard", "#_", ["symbol", "a"]]],
            ["symbol", "b"],
            ["symbol", "c"]
        ])
    );
}

#[test]
fn test_dispatch_forms() {
    assert_eq!(
        read_compact(r#"#inst "2020" #?(:clj 1) #::{:a 1} ##NaN #"\d+""#),
        json!([
            "code",
            ["tagged_literal", "#inst", ["string", "\"2020\""]],
            ["reader_conditional", "#?(", ["keyword", ":clj"], ["number", "1"], ")"],
            ["namespaced_map", "#::", ["map", "{", ["keyword", ":a"], ["number", "1"], "}"]],
            ["symbolic_value", "##NaN"],
            ["regex", "#\"\\d+\""]
        ])
    );
}

#[test]
fn test_whitespace_commas_and_comments_are_dropped() {
    let source = "; header\n[1, 2 ;; trailing\n 3]";
    let hiccup = read(source);
    let leaves: Vec<_> = hiccup.leaves().collect();
    assert_eq!(leaves, ["[", "1", "2", "3", "]"]);
    assert_covers(source, &leaves);
}

#[test]
fn test_empty_source_is_bare_code() {
    assert_eq!(read("").to_json().unwrap(), r#"["code"]"#);
    assert_eq!(read("  ;; only a comment\n").to_json().unwrap(), r#"["code"]"#);
}

// ---
// Flatten policies
// ---

#[test]
fn test_passthrough_rule_never_appears_by_default() {
    let json = read("(a (b [c]))").to_json().unwrap();
    assert!(!json.contains("\"forms\""));
}

#[test]
fn test_nested_policy_keeps_forms() {
    let reader = ClojureReader::new();
    let tree = reader.parse("(a)").unwrap();
    let nested = Normalizer::new(reader.rule_names())
        .with_policy(FlattenPolicy::Nested)
        .normalize(&tree)
        .unwrap();
    assert_eq!(nested.name(), Some("code"));
    assert_eq!(nested.parts()[0].name(), Some("forms"));
}

#[test]
fn test_flat_policy_leaves_match_terminals() {
    let reader = ClojureReader::new();
    let tree = reader.parse(EXAMPLE).unwrap();
    let flat = Normalizer::new(reader.rule_names())
        .with_policy(FlattenPolicy::Flat)
        .normalize(&tree)
        .unwrap();
    let terminals: Vec<_> = tree.terminals().map(|t| Hiccup::leaf(t.text.clone())).collect();
    assert_eq!(flat, Hiccup::rule("code", terminals));
}

#[test]
fn test_every_policy_preserves_leaves() {
    let reader = ClojureReader::new();
    let source = "(defn f [x] {:y @x})";
    let tree = reader.parse(source).unwrap();
    for policy in [FlattenPolicy::Nested, FlattenPolicy::Passthrough, FlattenPolicy::Flat] {
        let out = Normalizer::new(reader.rule_names())
            .with_policy(policy)
            .normalize(&tree)
            .unwrap();
        let leaves: Vec<_> = out.leaves().collect();
        assert_covers(source, &leaves);
    }
}

// ---
// Lexer stage
// ---

#[test]
fn test_tokens_agree_with_parse_tree() {
    let reader = ClojureReader::new();
    let tokens = reader.tokens(EXAMPLE).unwrap();
    let tree = reader.parse(EXAMPLE).unwrap();
    let from_tree: Vec<_> = tree.terminals().cloned().collect();
    assert_eq!(tokens, from_tree);
}

// ---
// Failure modes
// ---

#[test]
fn test_unbalanced_input_is_parse_error() {
    for source in ["(a b", "[1 2)", "{:a 1", "(foo \"bar", ")"] {
        let err = ClojureReader::new().read(source).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Parse, "{}", source);
    }
}

#[test]
fn test_synthetic_terminal_with_parser_index_fails_without_output() {
    let rules = RuleNames::clojure();
    let list = rules.index_of("list").unwrap();
    let bogus = TerminalNode::new(list, "(", Span::new(0, 1));
    let tree: ParseNode = RuleNode::new(0, vec![bogus.into()], Span::new(0, 1)).into();
    let err = normalize(&tree, rules).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::UnexpectedNodeKind);
}

#[test]
fn test_rule_index_out_of_table_is_lookup_error() {
    let rules = RuleNames::clojure();
    let tree: ParseNode = RuleNode::new(rules.len() + 10, vec![], Span::default()).into();
    let err = normalize(&tree, rules).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::UnknownRule);
}

#[test]
fn test_parse_and_normalize_concurrently() {
    let reader = std::sync::Arc::new(ClojureReader::new());
    let expected = reader.read(EXAMPLE).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let reader = std::sync::Arc::clone(&reader);
            std::thread::spawn(move || reader.read(EXAMPLE).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_deeply_nested_input_returns_an_error() {
    let source = "[".repeat(2000) + &"]".repeat(2000);
    let err = ClojureReader::new().read(&source).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Parse);
    assert!(err.message().contains("nested"), "{}", err.message());
}

#[test]
fn test_nesting_up_to_the_limit_reads() {
    let depth = parcera::syntax::parser::MAX_NESTING_DEPTH;
    let source = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
    let hiccup = ClojureReader::new().read(&source).unwrap();
    let leaves: Vec<_> = hiccup.leaves().collect();
    assert_eq!(leaves.len(), 2 * depth + 1);
    assert_covers(&source, &leaves);
}
