//! MCP tool bridge.
//!
//! Exposes [`crate::TaskRepository`] operations as named, schema-validated
//! tools over a JSON-RPC envelope, with session handling in stateful mode.
//! The bridge is transport-agnostic: the session token travels out-of-band
//! (an HTTP header, or the stdio loop's connection state), never inside the
//! JSON-RPC payload.

mod dispatch;
mod server;
mod session;
mod tools;

pub use dispatch::McpMethod;
pub use server::{BridgeMode, BridgeReply, McpBridge, serve_stdio};
pub use session::{Session, SessionStore};
pub use tools::{ToolContent, ToolDefinition, ToolRegistry, ToolResult};
