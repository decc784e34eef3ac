// src/utils/text.rs

//! Text normalization, tokenization, and hashing helpers.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

/// Collapse all whitespace runs into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased word set of a text, using Unicode word boundaries.
///
/// Single-character tokens are dropped; they are noise for skill matching.
pub fn keyword_set(text: &str) -> HashSet<String> {
    text.unicode_words()
        .filter(|w| w.chars().count() > 1)
        .map(|w| w.to_lowercase())
        .collect()
}

/// Check whether a multi-word phrase occurs in a text, case-insensitively.
///
/// Single-word phrases go through the tokenized keyword set instead; this is
/// for skills like "machine learning" that span word boundaries.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    text.to_lowercase().contains(&phrase.to_lowercase())
}

/// SHA-256 hex digest of the input.
pub fn content_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_keyword_set_lowercases_and_drops_short_tokens() {
        let set = keyword_set("Build a Rust API, with Rust!");
        assert!(set.contains("rust"));
        assert!(set.contains("api"));
        assert!(!set.contains("a"));
        // duplicates collapse
        assert_eq!(set.iter().filter(|w| *w == "rust").count(), 1);
    }

    #[test]
    fn test_contains_phrase() {
        assert!(contains_phrase(
            "Looking for Machine Learning expertise",
            "machine learning"
        ));
        assert!(!contains_phrase("Looking for ML expertise", "machine learning"));
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = content_hash("same input");
        let b = content_hash("same input");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, content_hash("other input"));
    }
}
