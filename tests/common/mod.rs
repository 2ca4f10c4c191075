//! Shared helpers for the integration tests.

/// Skips whitespace, commas and line comments.
pub fn skip_trivia(mut source: &str) -> &str {
    loop {
        let trimmed = source.trim_start_matches([' ', '\t', '\r', '\n', ',']);
        let comment = trimmed
            .strip_prefix(';')
            .or_else(|| trimmed.strip_prefix("#!"));
        match comment {
            Some(rest) => source = rest.find('\n').map_or("", |i| &rest[i..]),
            None => return trimmed,
        }
    }
}

/// Asserts that `leaves`, in order, account for every character of `source`
/// except whitespace, commas and comments.
#[allow(dead_code)]
pub fn assert_covers(source: &str, leaves: &[&str]) {
    let mut rest = source;
    for leaf in leaves {
        rest = skip_trivia(rest);
        assert!(
            rest.starts_with(leaf),
            "leaf {:?} does not match source at {:?}",
            leaf,
            rest
        );
        rest = &rest[leaf.len()..];
    }
    assert!(
        skip_trivia(rest).is_empty(),
        "source not covered by leaves: {:?}",
        rest
    );
}
