//! Keyword and provenance predicates shared by post and comment filtering.

use regex::RegexSet;
use std::sync::OnceLock;

const SELF_REFERENCE_PATTERNS: &[&str] = &[
    r"reddit\.com/r/",
    r"reddit\.com/user/",
    r"reddit\.com/u/",
    r"\br/\w+",
    r"\bu/\w+",
    r"\bsubreddit\b",
    r"\bredditors?\b",
    r"join (our|this) sub",
    r"crosspost",
    r"x-post",
    r"check out (r/|u/)",
];

static SELF_REFERENCE: OnceLock<RegexSet> = OnceLock::new();

fn self_reference_set() -> &'static RegexSet {
    SELF_REFERENCE.get_or_init(|| {
        RegexSet::new(SELF_REFERENCE_PATTERNS).expect("self-reference patterns are valid")
    })
}

/// True iff `keywords` is non-empty and one of them occurs in `text`,
/// compared case-insensitively.
///
/// An empty set yields `false`; callers decide whether that means "no
/// filtering" or "excluded".
pub fn matches<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    if keywords.is_empty() {
        return false;
    }
    let text_lower = text.to_lowercase();
    keywords
        .iter()
        .any(|keyword| text_lower.contains(&keyword.as_ref().to_lowercase()))
}

/// Detects links and phrasing that point back at the platform's own
/// communities or users (cross-posts, "join our sub" and the like).
pub fn is_source_self_referential(text: &str) -> bool {
    self_reference_set().is_match(&text.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_is_case_insensitive() {
        assert!(matches("Learning RUST today", &["rust"]));
        assert!(matches("learning rust today", &["RuSt"]));
        assert!(matches("async runtimes", &["tokio", "async"]));
        assert!(!matches("learning go today", &["rust", "zig"]));
    }

    #[test]
    fn test_matches_substring_not_word() {
        assert!(matches("trustworthy", &["rust"]));
    }

    #[test]
    fn test_empty_keywords_never_match() {
        let none: [&str; 0] = [];
        assert!(!matches("anything at all", &none));
        assert!(!matches("", &none));
    }

    #[test]
    fn test_self_reference_links_and_namespaces() {
        assert!(is_source_self_referential(
            "see https://www.reddit.com/r/rust/comments/abc"
        ));
        assert!(is_source_self_referential("posted on reddit.com/user/someone"));
        assert!(is_source_self_referential("ask over at r/learnprogramming"));
        assert!(is_source_self_referential("thanks u/helper"));
    }

    #[test]
    fn test_self_reference_phrasing() {
        assert!(is_source_self_referential("Join our sub for more!"));
        assert!(is_source_self_referential("this is a CROSSPOST from elsewhere"));
        assert!(is_source_self_referential("x-post from the other thread"));
        assert!(is_source_self_referential("Fellow Redditors, hear me out"));
        assert!(is_source_self_referential("best subreddit ever"));
    }

    #[test]
    fn test_plain_text_is_not_self_referential() {
        assert!(!is_source_self_referential("Great answer, thanks!"));
        assert!(!is_source_self_referential("I/O bound work is fine here"));
        assert!(!is_source_self_referential("subreddits"));
        assert!(!is_source_self_referential(""));
    }
}
