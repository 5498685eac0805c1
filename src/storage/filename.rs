//! Filename codec: (title, id) ↔ task filename.
//!
//! Two formats coexist on disk:
//!
//! - canonical: `<sanitized-title>-<id>.md`
//! - legacy: `<id>.md` (no title segment)
//!
//! The trailing dash-separated segment is authoritative for identity: when
//! the stem ends in the canonical id pattern, that suffix is the id and the
//! rest is the title. Otherwise the whole stem is taken as a legacy id.
//! Title round-trips are lossy for titles with leading/trailing/duplicate
//! whitespace or embedded dashes; the id round-trip always holds.

use crate::models::TaskId;
use once_cell::sync::Lazy;
use regex::Regex;

/// Markdown extension carried by every task file.
pub const MD_EXTENSION: &str = ".md";

/// Trailing canonical id (8-4-4-4-12 hex) at the end of a filename stem.
static TRAILING_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("trailing id pattern is valid")
});

/// Whitespace runs collapsed to a single dash during sanitization.
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// A decoded task filename.
///
/// The two on-disk formats are modeled explicitly rather than sniffed
/// implicitly; the trailing-id-pattern match takes precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFilename {
    /// Canonical `<slug>-<id>.md` with a title segment.
    Canonical {
        /// Title recovered from the slug, dash-separated segments joined
        /// with spaces.
        title: String,
        /// The trailing canonical id.
        id: TaskId,
    },
    /// Legacy `<id>.md` with no title segment.
    Legacy {
        /// The whole stem, taken as the id.
        id: TaskId,
    },
}

impl TaskFilename {
    /// The task id carried by the filename.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        match self {
            Self::Canonical { id, .. } | Self::Legacy { id } => id,
        }
    }

    /// The title carried by the filename; empty for legacy files.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Canonical { title, .. } => title,
            Self::Legacy { .. } => "",
        }
    }
}

/// Sanitizes a title into a filename slug.
///
/// Collapses whitespace runs to single dashes and trims leading/trailing
/// dashes. All other characters pass through untouched.
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    WHITESPACE_RUN
        .replace_all(title, "-")
        .trim_matches('-')
        .to_string()
}

/// Encodes a title and id into a task filename.
///
/// A title that sanitizes to an empty slug falls back to the legacy
/// id-only form.
#[must_use]
pub fn encode(title: &str, id: &TaskId) -> String {
    let slug = sanitize_title(title);
    if slug.is_empty() {
        format!("{id}{MD_EXTENSION}")
    } else {
        format!("{slug}-{id}{MD_EXTENSION}")
    }
}

/// Decodes a task filename into its tagged representation.
///
/// Accepts names with or without the `.md` extension.
#[must_use]
pub fn decode(filename: &str) -> TaskFilename {
    let stem = filename.strip_suffix(MD_EXTENSION).unwrap_or(filename);

    if let Some(found) = TRAILING_ID.find(stem) {
        let id = TaskId::new(found.as_str());
        let prefix = stem[..found.start()].trim_end_matches('-');
        if prefix.is_empty() {
            // Stem is exactly the id: legacy form.
            return TaskFilename::Legacy { id };
        }
        return TaskFilename::Canonical {
            title: prefix.replace('-', " "),
            id,
        };
    }

    TaskFilename::Legacy {
        id: TaskId::new(stem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> TaskId {
        TaskId::new("123e4567-e89b-42d3-a456-426614174000")
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_title("Fix the bug"), "Fix-the-bug");
        assert_eq!(sanitize_title("  padded   title "), "padded-title");
        assert_eq!(sanitize_title("tabs\tand\nnewlines"), "tabs-and-newlines");
        assert_eq!(sanitize_title("   "), "");
    }

    #[test]
    fn test_encode_canonical() {
        assert_eq!(
            encode("Fix bug", &id()),
            "Fix-bug-123e4567-e89b-42d3-a456-426614174000.md"
        );
    }

    #[test]
    fn test_encode_empty_title_is_legacy() {
        assert_eq!(encode("", &id()), "123e4567-e89b-42d3-a456-426614174000.md");
        assert_eq!(
            encode("   ", &id()),
            "123e4567-e89b-42d3-a456-426614174000.md"
        );
    }

    #[test]
    fn test_decode_canonical() {
        let decoded = decode("Fix-bug-123e4567-e89b-42d3-a456-426614174000.md");
        assert_eq!(
            decoded,
            TaskFilename::Canonical {
                title: "Fix bug".to_string(),
                id: id(),
            }
        );
    }

    #[test]
    fn test_decode_legacy() {
        let decoded = decode("123e4567-e89b-42d3-a456-426614174000.md");
        assert_eq!(decoded, TaskFilename::Legacy { id: id() });
        assert_eq!(decoded.title(), "");
    }

    #[test]
    fn test_decode_non_uuid_stem_is_legacy_id() {
        let decoded = decode("random-notes.md");
        assert_eq!(
            decoded,
            TaskFilename::Legacy {
                id: TaskId::new("random-notes"),
            }
        );
    }

    #[test]
    fn test_id_roundtrip() {
        for title in ["", "a", "Fix the bug", "  messy -- title  ", "ümlaut ok"] {
            let encoded = encode(title, &id());
            assert_eq!(decode(&encoded).id(), &id(), "title: {title:?}");
        }
    }

    #[test]
    fn test_title_roundtrip_is_lossy_but_stable() {
        let encoded = encode("a - b", &id());
        // Embedded dashes are indistinguishable from whitespace-derived ones.
        assert_eq!(decode(&encoded).title(), "a   b");
    }
}
