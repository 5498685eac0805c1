//! Tag extraction from markdown content.
//!
//! A tag is a hash-prefixed alphanumeric/underscore token anywhere in the
//! body. Extraction preserves order of appearance and keeps duplicates;
//! case-folding and catalog-level deduplication belong to the tag-catalog
//! collaborator, not here.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[A-Za-z0-9_]+").expect("tag pattern is valid"));

/// Extracts tag texts from card content, `#` stripped.
#[must_use]
pub fn extract(content: &str) -> Vec<String> {
    TAG_TOKEN
        .find_iter(content)
        .map(|m| m.as_str()[1..].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_order_and_duplicates() {
        assert_eq!(extract("#a #b #a"), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_extract_token_charset() {
        assert_eq!(
            extract("work on #tech_debt2 before #release"),
            vec!["tech_debt2", "release"]
        );
        // Punctuation terminates the token
        assert_eq!(extract("#wip: almost"), vec!["wip"]);
    }

    #[test]
    fn test_extract_none() {
        assert!(extract("no tags here").is_empty());
        assert!(extract("").is_empty());
        // A bare hash is not a tag
        assert!(extract("# heading").is_empty());
    }

    #[test]
    fn test_extract_keeps_case() {
        assert_eq!(extract("#Bug #bug"), vec!["Bug", "bug"]);
    }
}
