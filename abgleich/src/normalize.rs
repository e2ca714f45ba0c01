//! Address key normalization
//!
//! Canonicalizes a (street, house number) pair into the matching key shared
//! by both datasets. The function is total: any pair of strings yields a
//! key, garbage in produces a garbage key rather than an error.

use regex::Regex;

/// Ordered abbreviation expansions applied to the lower-cased street.
///
/// The third field restricts the token to word starts. "str." and "pl."
/// must match inside compounds ("waldstr." → "waldstrasse"), the others are
/// prone to false in-word matches and only expand at the start of a word.
/// Order matters: "str." runs before "st." so it consumes the longer token
/// first.
const ABBREVIATIONS: &[(&str, &str, bool)] = &[
    ("str.", "strasse", false),
    ("pl.", "platz", false),
    ("dr.", "doktor", true),
    ("bgm.", "bürgermeister", true),
    ("st.", "sankt", true),
    ("prof.", "professor", true),
    ("v.", "von", true),
];

/// Computes normalized matching keys.
///
/// Holds the compiled parenthetical regex; create once and reuse.
pub struct Normalizer {
    parens: Regex,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            // Constant pattern, compilation cannot fail
            parens: Regex::new(r"\([^)]*\)").expect("valid parenthetical regex"),
        }
    }

    /// Returns the full matching key for a street / house number pair
    pub fn key(&self, street: &str, housenumber: &str) -> String {
        let mut key = self.street_key(street);
        key.push_str(&housenumber_key(housenumber));
        key
    }

    /// Normalizes the street part of the key
    pub fn street_key(&self, street: &str) -> String {
        let lower = street.to_lowercase();
        let mut s = self.parens.replace_all(&lower, "").into_owned();
        for &(from, to, word_start_only) in ABBREVIATIONS {
            if s.contains(from) {
                s = replace_abbreviation(&s, from, to, word_start_only);
            }
        }
        strip_separators(&s.replace('ß', "ss"))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalizes the house number part of the key
fn housenumber_key(housenumber: &str) -> String {
    strip_separators(&housenumber.to_lowercase())
}

/// Substring replacement with an optional word-start constraint
fn replace_abbreviation(s: &str, from: &str, to: &str, word_start_only: bool) -> String {
    let mut out = String::with_capacity(s.len() + to.len());
    let mut prev: Option<char> = None;
    let mut i = 0;
    while i < s.len() {
        let rest = &s[i..];
        let at_word_start = prev.map_or(true, |c| !c.is_alphabetic());
        if rest.starts_with(from) && (!word_start_only || at_word_start) {
            out.push_str(to);
            prev = to.chars().next_back();
            i += from.len();
            continue;
        }
        match rest.chars().next() {
            Some(c) => {
                out.push(c);
                prev = Some(c);
                i += c.len_utf8();
            }
            None => break,
        }
    }
    out
}

/// Drops whitespace, hyphens, periods, slashes and commas
fn strip_separators(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '.' | '/' | ','))
        .collect()
}
