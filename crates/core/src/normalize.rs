//! Keyword and color normalization.
//!
//! Keywords are NFKC-normalized, case-folded and trimmed so that sets
//! coming from users, vision models and the store compare cleanly.
//! Colors are upper-cased and given a `#` when they are bare hex.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Separators for direct tokenization.
static TOKEN_SPLIT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,;]+").unwrap());

/// A bare six digit hex color without the leading `#`.
static BARE_HEX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Fa-f]{6}$").unwrap());

/// Characters trimmed off token edges (quotes, brackets, sentence punctuation).
const EDGE_PUNCTUATION: &[char] = &[
    '.', ':', '!', '?', '"', '\'', '(', ')', '[', ']', '{', '}', '<', '>', '`', '\u{201C}',
    '\u{201D}', '\u{2018}', '\u{2019}',
];

/// Words dropped by direct tokenization.
const STOPWORDS: &[&str] = &[
    // Function words
    "a", "an", "the", "and", "or", "but", "of", "to", "in", "on", "for", "with", "at", "by",
    "from", "as", "is", "are", "was", "were", "be", "been", "it", "its", "this", "that",
    "these", "those", "my", "our", "your", "me", "we", "you", "i", "some", "any", "about",
    "into", "than", "then", "so", "very", "can", "will", "should", "would", "please", "use",
    // Deck request filler
    "design", "designs", "slide", "slides", "presentation", "presentations", "deck", "create",
    "make",
];

/// Minimum token length kept by direct tokenization.
const MIN_TOKEN_LEN: usize = 2;

/// Fold a single keyword: NFKC, lowercase, trimmed.
pub fn fold_keyword(keyword: &str) -> String {
    keyword.nfkc().collect::<String>().to_lowercase().trim().to_string()
}

/// Fold and deduplicate keywords, keeping first-seen order and dropping empties.
pub fn normalize_keywords<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for keyword in keywords {
        let folded = fold_keyword(keyword.as_ref());
        if folded.is_empty() {
            continue;
        }
        if seen.insert(folded.clone()) {
            out.push(folded);
        }
    }

    out
}

/// Split free text into keywords: lowercase, split on whitespace, commas
/// and semicolons, drop short tokens and stopwords. No stemming.
pub fn tokenize_keywords(text: &str) -> Vec<String> {
    let folded = fold_keyword(text);

    let tokens = TOKEN_SPLIT_REGEX
        .split(&folded)
        .map(|t| t.trim_matches(EDGE_PUNCTUATION))
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .filter(|t| !STOPWORDS.contains(t));

    normalize_keywords(tokens)
}

/// Case-insensitive symmetric containment: equal, or either contains the other.
pub fn keywords_match(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(&b) || b.contains(&a)
}

/// Normalize a color string.
///
/// Upper-cases everything; a bare six digit hex value gets a `#` prefix.
/// Anything else (named colors, `rgb()` forms) passes through upper-cased.
pub fn normalize_color(color: &str) -> String {
    let trimmed = color.trim();
    if BARE_HEX_REGEX.is_match(trimmed) {
        format!("#{}", trimmed.to_uppercase())
    } else {
        trimmed.to_uppercase()
    }
}

/// Normalize every color of a palette, dropping empty entries.
pub fn normalize_palette<I, S>(colors: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    colors
        .into_iter()
        .map(|c| normalize_color(c.as_ref()))
        .filter(|c| !c.is_empty())
        .collect()
}

/// Truncate text to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(
            tokenize_keywords("Modern, minimal; corporate   theme"),
            vec!["modern", "minimal", "corporate", "theme"]
        );
    }

    #[test]
    fn test_tokenize_drops_short_and_stopwords() {
        assert_eq!(tokenize_keywords("a modern design for the team"), vec!["modern", "team"]);
        assert_eq!(tokenize_keywords("x y z"), Vec::<String>::new());
    }

    #[test]
    fn test_tokenize_dedupes_case_insensitively() {
        assert_eq!(tokenize_keywords("Blue blue BLUE"), vec!["blue"]);
    }

    #[test]
    fn test_tokenize_trims_punctuation() {
        assert_eq!(tokenize_keywords("\"bold\" (orange)."), vec!["bold", "orange"]);
    }

    #[test]
    fn test_tokenize_no_stemming() {
        assert_eq!(tokenize_keywords("charts charting"), vec!["charts", "charting"]);
    }

    #[test]
    fn test_fold_keyword_nfkc() {
        // Fullwidth letters fold to ASCII
        assert_eq!(fold_keyword("ＭＡＴＨ"), "math");
        assert_eq!(fold_keyword("  Tech "), "tech");
    }

    #[test]
    fn test_normalize_keywords() {
        assert_eq!(
            normalize_keywords(["Modern", " modern", "", "Blue"]),
            vec!["modern", "blue"]
        );
    }

    #[test]
    fn test_keywords_match_containment() {
        assert!(keywords_match("math", "mathematics"));
        assert!(keywords_match("Mathematics", "math"));
        assert!(keywords_match("blue", "BLUE"));
        assert!(!keywords_match("red", "blue"));
        assert!(!keywords_match("", "blue"));
    }

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color("#ff6b35"), "#FF6B35");
        assert_eq!(normalize_color("ff6b35"), "#FF6B35");
        assert_eq!(normalize_color("navy"), "NAVY");
        assert_eq!(normalize_color("#fff"), "#FFF");
        assert_eq!(normalize_color(" 123abc "), "#123ABC");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
