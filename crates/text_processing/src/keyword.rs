//! Search keyword extraction
//!
//! Turns a free-form shopper question into the term used for the catalog
//! lookup. Two passes:
//! 1. An intent marker ("tìm", "mua", "find", ...) followed by a phrase that
//!    runs up to an optional locative marker ("ở", "khu", "in", ...) or the
//!    end of the question. The phrase is the keyword.
//! 2. Otherwise, drop stop words and keep what is left, in order.
//!
//! Both markers and stop words cover Vietnamese and English. Extraction is
//! total: the worst case is the lower-cased, trimmed question.
//!
//! Static patterns are compiled once using `once_cell::sync::Lazy`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Words meaning find / buy / need / search
const INTENT_MARKERS: &[&str] = &[
    "tìm", "mua", "cần", "kiếm", "find", "buy", "need", "search", "get",
];

/// Words meaning at / in / zone / area
const LOCATIVE_MARKERS: &[&str] = &["khu vực", "ở", "tại", "khu", "zone", "area", "at", "in"];

const STOP_WORDS: &[&str] = &[
    // pronouns
    "tôi", "mình", "em", "anh", "chị", "bạn", "tớ", "i", "me", "my", "we", "you",
    // wanting / finding
    "muốn", "cần", "tìm", "kiếm", "mua", "hỏi", "want", "need", "find", "buy", "search",
    "looking", "look", "for", "get",
    // locative question words
    "ở", "đâu", "nào", "chỗ", "tại", "khu", "vực", "where", "which", "is", "are", "can",
    // particles
    "ạ", "vậy", "nhỉ", "please",
];

static INTENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let intents = alternation(INTENT_MARKERS);
    let locatives = alternation(LOCATIVE_MARKERS);
    Regex::new(&format!(
        r"(?:^|\s)(?:(?:{intents})\s+)+(.+?)(?:\s+(?:{locatives})(?:\s.*)?)?$"
    ))
    .expect("intent pattern is valid")
});

/// Single-word markers that must never survive in an extracted phrase
static MARKER_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    INTENT_MARKERS
        .iter()
        .chain(LOCATIVE_MARKERS.iter())
        .flat_map(|m| m.split_whitespace())
        .collect()
});

static STOP_WORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOP_WORDS.iter().copied().collect());

fn alternation(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|")
}

fn starts_with_locative(phrase: &str) -> bool {
    LOCATIVE_MARKERS.iter().any(|m| {
        phrase
            .strip_prefix(m)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

/// Strip surrounding punctuation from a token
fn clean_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Keyword extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordExtractor;

impl KeywordExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the search keyword from a question
    pub fn extract(&self, question: &str) -> String {
        let normalized = question.trim().to_lowercase();

        if let Some(phrase) = Self::intent_phrase(&normalized) {
            tracing::trace!(question = %normalized, keyword = %phrase, "Keyword from intent marker");
            return phrase;
        }

        let keyword = Self::strip_stop_words(&normalized);
        tracing::trace!(question = %normalized, keyword = %keyword, "Keyword from stop-word filter");
        keyword
    }

    /// Pass 1: phrase captured after an intent marker, with any leftover
    /// marker words and punctuation removed
    ///
    /// `None` when the intent marker sits right before the locative marker
    /// ("sữa tươi mua ở đâu"), since the product then precedes the marker.
    fn intent_phrase(normalized: &str) -> Option<String> {
        let captured = INTENT_PATTERN.captures(normalized)?.get(1)?.as_str();

        if starts_with_locative(captured) || Self::strip_stop_words(captured).is_empty() {
            return None;
        }

        let phrase = captured
            .split_whitespace()
            .map(clean_token)
            .filter(|t| !t.is_empty() && !MARKER_WORDS.contains(t))
            .collect::<Vec<_>>()
            .join(" ");

        (!phrase.is_empty()).then_some(phrase)
    }

    /// Pass 2: tokens that are not stop words or bare punctuation
    fn strip_stop_words(normalized: &str) -> String {
        normalized
            .split_whitespace()
            .map(clean_token)
            .filter(|t| !t.is_empty() && !STOP_WORD_SET.contains(t))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
