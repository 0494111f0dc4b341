// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn lit(text: &str) -> Token {
    Token::Literal(text.to_string())
}

fn param(name: &str) -> Token {
    Token::Parameter(name.to_string())
}

#[test]
fn fixed_matcher_is_equality() {
    let matcher = CaptureMatcher::compile(&[lit("a/"), lit("b.csv")]);
    assert!(matcher.is_fixed());
    assert_eq!(matcher.captures("a/b.csv"), Some(vec![]));
    assert!(!matcher.is_match("a/b.csvx"));
    assert!(!matcher.is_match("xa/b.csv"));
}

#[test]
fn trailing_literal_is_matched_greedily() {
    let matcher = CaptureMatcher::compile(&[param("name"), lit(".csv")]);
    assert_eq!(matcher.captures("foo.bar.csv"), Some(vec!["foo.bar"]));
}

#[test]
fn leftmost_capture_is_shortest() {
    let matcher = CaptureMatcher::compile(&[param("a"), lit("."), param("b")]);
    assert_eq!(
        matcher.captures("foo.alpha.beta.csv"),
        Some(vec!["foo", "alpha.beta.csv"])
    );
}

#[test]
fn rightmost_capture_keeps_separators_before_the_tail() {
    let matcher = CaptureMatcher::compile(&[param("a"), lit("-"), param("b"), lit("-x.log")]);
    assert_eq!(matcher.captures("p-q-r-x.log"), Some(vec!["p", "q-r"]));
    assert_eq!(matcher.captures("p-x.log"), None);
}

#[test]
fn multi_character_separators() {
    let matcher = CaptureMatcher::compile(&[param("a"), lit(".-/"), param("b")]);
    assert_eq!(matcher.captures("x.-/y.-/z"), Some(vec!["x", "y.-/z"]));
}

#[test]
fn adjacent_captures_give_the_first_one_character() {
    let matcher = CaptureMatcher::compile(&[param("a"), param("b")]);
    assert_eq!(matcher.captures("hello"), Some(vec!["h", "ello"]));
    assert_eq!(matcher.captures("h"), None);
}

#[parameterized(
    terminal_takes_rest = { "foo.csv", Some("foo.csv") },
    unicode = { "données.csv", Some("données.csv") },
    empty_input = { "", None },
)]
fn single_capture(input: &str, expected: Option<&str>) {
    let matcher = CaptureMatcher::compile(&[param("name")]);
    assert_eq!(matcher.captures(input).map(|v| v[0]), expected);
}

#[parameterized(
    suffix_beyond_literal = { "bob.txtoutput" },
    missing_literal = { "bob" },
    empty_capture = { ".txt" },
)]
fn rejects_without_panicking(input: &str) {
    let matcher = CaptureMatcher::compile(&[param("name"), lit(".txt")]);
    assert_eq!(matcher.captures(input), None);
}

#[test]
fn leading_literal_must_be_a_prefix() {
    let matcher = CaptureMatcher::compile(&[lit("in-"), param("id"), lit(".json")]);
    assert_eq!(matcher.captures("in-42.json"), Some(vec!["42"]));
    assert_eq!(matcher.captures("out-42.json"), None);
    assert_eq!(matcher.capture_count(), 1);
}

fn dashed(names: &[&str], tail: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            tokens.push(lit("-"));
        }
        tokens.push(param(name));
    }
    tokens.push(lit(tail));
    tokens
}

#[test]
fn hostile_name_fails_in_bounded_time() {
    let matcher = CaptureMatcher::compile(&dashed(&["a", "b", "c", "d", "e"], ".csv"));
    let name = "-".repeat(1024);

    let start = std::time::Instant::now();
    assert_eq!(matcher.captures(&name), None);
    assert!(
        start.elapsed() < std::time::Duration::from_secs(5),
        "took {:?}",
        start.elapsed()
    );
}

#[test]
fn long_name_keeps_leftmost_shortest_captures() {
    let matcher = CaptureMatcher::compile(&dashed(&["a", "b", "c", "d", "e"], ".csv"));
    let name = format!("{}x-y-z-w-v.csv", "-".repeat(1000));

    let captures = matcher.captures(&name).unwrap();
    assert_eq!(&captures[..4], ["-", "-", "-", "-"]);
    assert_eq!(captures[4], "-".repeat(992) + "x-y-z-w-v");
}
