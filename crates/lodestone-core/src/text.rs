//! Tokenization and stemming.
//!
//! Raw text becomes index terms in two steps: a clean-and-split pass that
//! strips everything non-alphabetic and case-folds, then a Snowball
//! (Porter2) English stem. Query lines go through the same pipeline so
//! query terms and index terms always agree.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

/// Characters stripped before splitting: anything that is neither
/// alphabetic nor whitespace (digits, punctuation, symbols).
static CLEAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\p{Alphabetic}\s]+").expect("clean pattern is valid")
});

static STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// Splits `text` into cleaned, case-folded, unstemmed tokens in order.
pub fn tokenize(text: &str) -> Vec<String> {
    CLEAN
        .replace_all(text, "")
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Stems a single already-cleaned token.
pub fn stem(token: &str) -> String {
    STEMMER.stem(token).into_owned()
}

/// Splits and stems `text`, preserving token order and duplicates.
///
/// This is the indexing pipeline: the position of each returned term is
/// its 1-based ordinal in the document's token stream.
pub fn stems(text: &str) -> Vec<String> {
    tokenize(text).iter().map(|token| stem(token)).collect()
}

/// Splits and stems one line, returning the sorted set of distinct terms.
///
/// This is the query pipeline: two lines that stem and dedupe to the same
/// set are the same query.
pub fn unique_stems(line: &str) -> BTreeSet<String> {
    tokenize(line).iter().map(|token| stem(token)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_strips_punctuation_and_digits() {
        let tokens = tokenize("Hello, world! 42 ook-ook.");
        assert_eq!(tokens, vec!["hello", "world", "ookook"]);
    }

    #[test]
    fn tokenize_case_folds() {
        assert_eq!(tokenize("RuSt RUST rust"), vec!["rust", "rust", "rust"]);
    }

    #[test]
    fn stems_preserve_order_and_duplicates() {
        let stemmed = stems("running runs run");
        assert_eq!(stemmed, vec!["run", "run", "run"]);
    }

    #[test]
    fn unique_stems_sorts_and_dedupes() {
        let set = unique_stems("dogs DOG cats");
        let terms: Vec<_> = set.iter().cloned().collect();
        assert_eq!(terms, vec!["cat", "dog"]);
    }

    #[test]
    fn empty_line_yields_no_terms() {
        assert!(unique_stems("").is_empty());
        assert!(unique_stems("123 !!! ...").is_empty());
    }
}
