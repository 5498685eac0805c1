//! Task types and identifiers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Canonical id pattern: 32 hex digits grouped 8-4-4-4-12.
static ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("id pattern is valid")
});

/// Unique identifier for a task.
///
/// Opaque to callers; generated ids follow the canonical pattern, but legacy
/// files may carry arbitrary stems as ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a task ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random id in the canonical pattern.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a string matches the canonical id pattern.
    #[must_use]
    pub fn is_canonical(s: &str) -> bool {
        ID_PATTERN.is_match(s)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A task on the board.
///
/// The consumable surface for the bridge and any REST caller: lane, id,
/// title, raw markdown content, and the read-only derived tag list.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    /// Unique identifier, carried in the filename.
    pub id: TaskId,
    /// The lane (directory) currently holding the task.
    pub lane: String,
    /// Title decoded from the filename; empty for legacy files.
    pub title: String,
    /// Raw markdown body.
    pub content: String,
    /// Tags derived from content, in order of appearance, duplicates kept.
    pub tags: Vec<String>,
    /// Resolved path of the task file.
    pub path: PathBuf,
}

/// Partial update for [`crate::TaskRepository::update_task`].
///
/// With neither `content` nor `new_lane` set, the update is an
/// existence-confirming no-op returning the current record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    /// Replacement content, written in place.
    pub content: Option<String>,
    /// Hint for the task's current lane, skipping the board-wide search.
    pub lane: Option<String>,
    /// Destination lane; a move happens only when it differs from the
    /// current lane.
    pub new_lane: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_is_canonical() {
        let id = TaskId::generate();
        assert!(TaskId::is_canonical(id.as_str()));
    }

    #[test]
    fn test_canonical_pattern() {
        assert!(TaskId::is_canonical("123e4567-e89b-42d3-a456-426614174000"));
        assert!(TaskId::is_canonical("ABCDEF01-2345-6789-abcd-ef0123456789"));
        assert!(!TaskId::is_canonical("123e4567-e89b-42d3-a456"));
        assert!(!TaskId::is_canonical("not-a-uuid"));
        assert!(!TaskId::is_canonical(""));
        // Trailing garbage must not match
        assert!(!TaskId::is_canonical(
            "123e4567-e89b-42d3-a456-426614174000x"
        ));
    }

    #[test]
    fn test_id_display_roundtrip() {
        let id = TaskId::new("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(TaskId::from("abc"), id);
    }
}
