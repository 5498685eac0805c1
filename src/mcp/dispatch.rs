//! Method dispatch for the JSON-RPC bridge.
//!
//! The supported method set is closed: a tagged enum rather than an
//! open-ended conditional chain, so adding a method means adding a variant
//! and the compiler points at every match that needs extending.

use std::fmt;

/// JSON-RPC method identifier.
///
/// Unknown methods are captured for error reporting rather than rejected at
/// parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum McpMethod {
    /// Start a session (stateful mode) and report server capabilities.
    Initialize,
    /// Client acknowledgement completing the session handshake.
    NotifyInitialized,
    /// List available tools.
    ListTools,
    /// Call a specific tool.
    CallTool,
    /// Unknown method (for error handling).
    Unknown(String),
}

impl McpMethod {
    /// Returns the protocol method name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::Initialize => "initialize",
            Self::NotifyInitialized => "notifications/initialized",
            Self::ListTools => "tools/list",
            Self::CallTool => "tools/call",
            Self::Unknown(s) => s.as_str(),
        }
    }

    /// Returns true if this is a known method.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Returns all known methods.
    #[must_use]
    pub const fn known_methods() -> &'static [Self] {
        &[
            Self::Initialize,
            Self::NotifyInitialized,
            Self::ListTools,
            Self::CallTool,
        ]
    }
}

impl From<&str> for McpMethod {
    fn from(s: &str) -> Self {
        match s {
            "initialize" => Self::Initialize,
            "notifications/initialized" => Self::NotifyInitialized,
            "tools/list" => Self::ListTools,
            "tools/call" => Self::CallTool,
            unknown => Self::Unknown(unknown.to_string()),
        }
    }
}

impl fmt::Display for McpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
