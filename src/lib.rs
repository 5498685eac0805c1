//! # Lanefile
//!
//! A kanban board whose lanes are directories and whose tasks are markdown
//! files. Lanefile is the task-storage core behind a board UI: it encodes
//! durable task identity into filenames that also carry a human title,
//! resolves tasks by id when the owning lane is unknown, and performs
//! lane/task mutations as multi-step filesystem operations. AI agents reach
//! the same operations through an MCP-style JSON-RPC tool bridge.
//!
//! ## Layout
//!
//! ```text
//! <board-root>/<lane>/<sanitized-title>-<id>.md   (canonical)
//! <board-root>/<lane>/<id>.md                     (legacy)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use lanefile::{BoardConfig, TaskRepository};
//!
//! let repo = TaskRepository::new(&BoardConfig::load_default());
//! let task = repo.create_task("backlog", "Fix bug", "details #bug")?;
//! assert_eq!(task.tags, vec!["bug"]);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod mcp;
pub mod models;
pub mod storage;

// Re-exports for convenience
pub use config::{BoardConfig, Ownership};
pub use mcp::{BridgeMode, McpBridge, SessionStore, ToolRegistry};
pub use models::{Task, TaskId, TaskUpdate};
pub use storage::{LaneStore, TaskRepository, TaskResolver};

/// Error type for lanefile operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `NotFound` | A task id resolves to no file, or a lane directory is absent |
/// | `InvalidInput` | A tool call is missing a required parameter, malformed JSON arguments |
/// | `OperationFailed` | Underlying filesystem I/O fails (permissions, disk, races) |
/// | `Unauthorized` | Missing or unknown session token in the stateful bridge |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A task or lane does not exist.
    ///
    /// Raised when:
    /// - No lane contains a file whose decoded id matches the requested id
    /// - A lane hint names a directory with no matching task file
    /// - A lane operation targets a directory that is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A `tools/call` omits a parameter the tool schema marks required
    /// - Tool arguments fail JSON deserialization
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem reads, writes, renames, or removals fail
    /// - The ownership policy cannot be applied to a created path
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A stateful bridge request carried no valid session token.
    ///
    /// Raised when:
    /// - `tools/list` or `tools/call` arrives without a token
    /// - The token was never issued, was removed, or was evicted by TTL
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

/// Result type alias for lanefile operations.
pub type Result<T> = std::result::Result<T, Error>;
