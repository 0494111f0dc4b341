// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capture matcher compiled from a pattern's token sequence
//!
//! Matching is anchored at both ends. Tie-breaks between captures are fixed
//! rather than left to a regex engine's backtracking order:
//!
//! - every capture except the rightmost one takes the *shortest* run that
//!   lets the remaining fragments still match (leftmost-shortest);
//! - the rightmost capture takes everything up to the literal text that must
//!   close the input (rightmost-greedy).
//!
//! So `{name}.csv` against `foo.bar.csv` captures `foo.bar`, and `{a}.{b}`
//! against `foo.alpha.beta.csv` captures `foo` and `alpha.beta.csv`.
//! Captures are never empty.

use super::Token;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Fragment {
    Literal(String),
    Capture,
}

/// Matcher for one pattern segment
#[derive(Debug, Clone)]
pub struct CaptureMatcher {
    fragments: Vec<Fragment>,
    /// Index of the rightmost capture fragment
    last_capture: Option<usize>,
    /// Literal text that must close the input after the rightmost capture
    tail: String,
    capture_count: usize,
}

impl CaptureMatcher {
    /// Compile a token sequence, merging adjacent literals
    pub fn compile(tokens: &[Token]) -> Self {
        let mut fragments: Vec<Fragment> = Vec::with_capacity(tokens.len());
        for token in tokens {
            match token {
                Token::Literal(text) if text.is_empty() => {}
                Token::Literal(text) => match fragments.last_mut() {
                    Some(Fragment::Literal(prev)) => prev.push_str(text),
                    _ => fragments.push(Fragment::Literal(text.clone())),
                },
                Token::Parameter(_) => fragments.push(Fragment::Capture),
            }
        }

        let last_capture = fragments
            .iter()
            .rposition(|f| matches!(f, Fragment::Capture));
        let tail = match last_capture {
            Some(index) => fragments[index + 1..]
                .iter()
                .filter_map(|f| match f {
                    Fragment::Literal(text) => Some(text.as_str()),
                    Fragment::Capture => None,
                })
                .collect(),
            None => String::new(),
        };
        let capture_count = fragments
            .iter()
            .filter(|f| matches!(f, Fragment::Capture))
            .count();

        Self {
            fragments,
            last_capture,
            tail,
            capture_count,
        }
    }

    /// True when the segment has no captures and matching is plain equality
    pub fn is_fixed(&self) -> bool {
        self.last_capture.is_none()
    }

    pub fn capture_count(&self) -> usize {
        self.capture_count
    }

    /// Captured values in fragment order, or `None` when the input does not match
    pub fn captures<'a>(&self, input: &'a str) -> Option<Vec<&'a str>> {
        let mut search = Search {
            fragments: &self.fragments,
            last_capture: self.last_capture,
            tail: &self.tail,
            input,
            failed: HashSet::new(),
            out: Vec::with_capacity(self.capture_count),
        };
        if search.match_from(0, 0) {
            Some(search.out)
        } else {
            None
        }
    }

    pub fn is_match(&self, input: &str) -> bool {
        self.captures(input).is_some()
    }
}

/// One backtracking search over an input
///
/// Whether fragments `index..` match the input from a byte offset does not
/// depend on earlier captures, so a failed `(index, offset)` pair never has
/// to be explored twice. That keeps the search polynomial in the input
/// length no matter how many captures the pattern has.
struct Search<'m, 'a> {
    fragments: &'m [Fragment],
    last_capture: Option<usize>,
    tail: &'m str,
    input: &'a str,
    failed: HashSet<(usize, usize)>,
    out: Vec<&'a str>,
}

impl<'a> Search<'_, 'a> {
    fn match_from(&mut self, index: usize, offset: usize) -> bool {
        let fragments = self.fragments;
        let input = self.input;
        let rest = &input[offset..];
        let Some(fragment) = fragments.get(index) else {
            return rest.is_empty();
        };

        match fragment {
            Fragment::Literal(text) => {
                if rest.starts_with(text.as_str()) {
                    self.match_from(index + 1, offset + text.len())
                } else {
                    false
                }
            }

            Fragment::Capture if Some(index) == self.last_capture => {
                match rest.strip_suffix(self.tail) {
                    Some(value) if !value.is_empty() => {
                        self.out.push(value);
                        true
                    }
                    _ => false,
                }
            }

            Fragment::Capture => {
                if self.failed.contains(&(index, offset)) {
                    return false;
                }
                let next_literal = match fragments.get(index + 1) {
                    Some(Fragment::Literal(text)) => Some(text.as_str()),
                    _ => None,
                };
                // A later capture still needs at least one character, so the
                // end of `rest` is never a candidate here.
                for (end, _) in rest.char_indices().skip(1) {
                    if next_literal.is_some_and(|literal| !rest[end..].starts_with(literal)) {
                        continue;
                    }
                    self.out.push(&rest[..end]);
                    if self.match_from(index + 1, offset + end) {
                        return true;
                    }
                    self.out.pop();
                }
                self.failed.insert((index, offset));
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
