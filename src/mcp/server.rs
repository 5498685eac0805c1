//! JSON-RPC bridge framing and transport loop.
//!
//! The bridge never raises out of [`McpBridge::handle_request`]: tool-level
//! failures are framed in-band (`isError: true`) so the caller's
//! request/response pairing survives logical failures. Everything else
//! (malformed envelope, unknown method, missing session) becomes a top-level
//! protocol error echoing the request id (or null).

use crate::config::BoardConfig;
use crate::mcp::dispatch::McpMethod;
use crate::mcp::session::SessionStore;
use crate::mcp::tools::ToolRegistry;
use crate::storage::TaskRepository;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use tracing::info_span;

/// MCP protocol version.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported by `initialize`.
const SERVER_NAME: &str = "lanefile";

/// Result type for method dispatch.
type DispatchResult = std::result::Result<Value, (i32, String)>;

/// Session discipline for the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BridgeMode {
    /// `initialize` mints a session token required by every later call.
    #[default]
    Stateful,
    /// Every request is served without a session requirement.
    Stateless,
}

/// A framed bridge reply.
#[derive(Debug)]
pub struct BridgeReply {
    /// The serialized JSON-RPC response line.
    pub body: String,
    /// A freshly minted session token, handed to the transport out-of-band.
    pub session_id: Option<String>,
}

/// The JSON-RPC tool bridge over a [`TaskRepository`].
pub struct McpBridge {
    tools: ToolRegistry,
    sessions: SessionStore,
    mode: BridgeMode,
}

impl McpBridge {
    /// Creates a stateful bridge whose sessions never expire.
    #[must_use]
    pub fn stateful(repo: Arc<TaskRepository>) -> Self {
        Self {
            tools: ToolRegistry::new(repo),
            sessions: SessionStore::new(),
            mode: BridgeMode::Stateful,
        }
    }

    /// Creates a stateful bridge evicting sessions older than `ttl_secs`.
    #[must_use]
    pub fn stateful_with_ttl(repo: Arc<TaskRepository>, ttl_secs: i64) -> Self {
        Self {
            tools: ToolRegistry::new(repo),
            sessions: SessionStore::with_ttl_secs(ttl_secs),
            mode: BridgeMode::Stateful,
        }
    }

    /// Creates a stateless bridge; callers build one per request.
    #[must_use]
    pub fn stateless(repo: Arc<TaskRepository>) -> Self {
        Self {
            tools: ToolRegistry::new(repo),
            sessions: SessionStore::new(),
            mode: BridgeMode::Stateless,
        }
    }

    /// Returns the bridge mode.
    #[must_use]
    pub const fn mode(&self) -> BridgeMode {
        self.mode
    }

    /// Number of live sessions (stateful mode).
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Terminates a session, freeing its slot.
    pub fn terminate_session(&mut self, token: &str) -> bool {
        self.sessions.remove(token)
    }

    /// Handles one JSON-RPC request line.
    ///
    /// `session` is the out-of-band token accompanying the request, if any.
    pub fn handle_request(&mut self, raw: &str, session: Option<&str>) -> BridgeReply {
        let span = info_span!(
            "mcp.request",
            rpc.method = tracing::field::Empty,
            status = tracing::field::Empty
        );
        let _guard = span.enter();

        let parsed: std::result::Result<JsonRpcRequest, _> = serde_json::from_str(raw);
        let Ok(req) = parsed else {
            span.record("status", "parse_error");
            return BridgeReply {
                body: format_error(Value::Null, -32700, "Parse error: invalid JSON-RPC envelope"),
                session_id: None,
            };
        };

        span.record("rpc.method", req.method.as_str());
        let id = req.id.unwrap_or(Value::Null);
        tracing::debug!(method = %req.method, "Processing bridge request");

        let mut minted = None;
        let result = self.dispatch_method(&req.method, req.params, session, &mut minted);
        span.record("status", if result.is_ok() { "success" } else { "error" });

        BridgeReply {
            body: format_response(id, result),
            session_id: minted,
        }
    }

    /// Dispatches on the closed method set.
    fn dispatch_method(
        &mut self,
        method: &str,
        params: Option<Value>,
        session: Option<&str>,
        minted: &mut Option<String>,
    ) -> DispatchResult {
        match McpMethod::from(method) {
            McpMethod::Initialize => Ok(self.handle_initialize(params, minted)),
            McpMethod::NotifyInitialized => self.handle_notify_initialized(session),
            McpMethod::ListTools => {
                self.require_session(session)?;
                Ok(self.handle_list_tools())
            },
            McpMethod::CallTool => {
                self.require_session(session)?;
                self.handle_call_tool(params)
            },
            McpMethod::Unknown(name) => Err((-32601, format!("Method not found: {name}"))),
        }
    }

    /// Rejects stateful requests lacking a previously issued token.
    fn require_session(&mut self, session: Option<&str>) -> std::result::Result<(), (i32, String)> {
        if self.mode == BridgeMode::Stateless {
            return Ok(());
        }
        let err = |detail: &str| {
            (
                -32000,
                Error::Unauthorized(detail.to_string()).to_string(),
            )
        };
        let token = session.ok_or_else(|| err("missing session token"))?;
        if self.sessions.get(token).is_none() {
            return Err(err("unknown session token"));
        }
        Ok(())
    }

    /// Handles `initialize`, minting a session in stateful mode.
    fn handle_initialize(&mut self, params: Option<Value>, minted: &mut Option<String>) -> Value {
        if self.mode == BridgeMode::Stateful {
            let client_info = params
                .as_ref()
                .and_then(|p| p.get("clientInfo"))
                .cloned();
            let token = self.sessions.create(client_info);
            tracing::debug!(sessions = self.sessions.len(), "Minted bridge session");
            *minted = Some(token);
        }

        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    /// Handles `notifications/initialized`, completing the handshake.
    fn handle_notify_initialized(&mut self, session: Option<&str>) -> DispatchResult {
        if self.mode == BridgeMode::Stateless {
            return Ok(json!({}));
        }
        let valid = session.is_some_and(|token| self.sessions.mark_initialized(token));
        if valid {
            Ok(json!({}))
        } else {
            Err((
                -32000,
                Error::Unauthorized("unknown session token".to_string()).to_string(),
            ))
        }
    }

    /// Handles `tools/list`.
    fn handle_list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .list_tools()
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    /// Handles `tools/call`.
    ///
    /// Unknown tool names and handler failures are framed in-band; a missing
    /// required parameter is a malformed request and fails the protocol call.
    fn handle_call_tool(&self, params: Option<Value>) -> DispatchResult {
        let params = params.ok_or((-32602, "Missing params".to_string()))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or((-32602, "Missing tool name".to_string()))?;
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let span = info_span!("mcp.tool.call", tool.name = name);
        let _guard = span.enter();

        if self.tools.get_tool(name).is_none() {
            return Ok(tool_error(&format!("Error: Unknown tool: {name}")));
        }
        if let Err(e) = self.tools.validate_arguments(name, &arguments) {
            return Err((-32602, e.to_string()));
        }

        match self.tools.execute(name, arguments) {
            Ok(result) => Ok(json!({
                "content": result.content,
                "isError": result.is_error
            })),
            Err(e) => {
                tracing::debug!(tool = name, error = %e, "Tool call failed");
                Ok(tool_error(&format!("Error: {e}")))
            },
        }
    }
}

/// Wraps an error message as an in-band tool failure.
fn tool_error(message: &str) -> Value {
    json!({
        "content": [{ "type": "text", "text": message }],
        "isError": true
    })
}

/// Formats a response, echoing the request id.
fn format_response(id: Value, result: DispatchResult) -> String {
    match result {
        Ok(value) => {
            let response = JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(value),
                error: None,
            };
            serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
        },
        Err((code, message)) => format_error(id, code, &message),
    }
}

/// Formats a top-level protocol error.
fn format_error(id: Value, code: i32, message: &str) -> String {
    let response = JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_string(),
            data: None,
        }),
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC version (required by protocol but not used in code).
    #[serde(rename = "jsonrpc")]
    _jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC response. The id is always present, null when unrecoverable.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// Runs the bridge over line-delimited stdio.
///
/// In stateful mode one bridge serves the whole connection and the loop
/// carries the minted token between requests, the stdio equivalent of an
/// out-of-band session header. In stateless mode a fresh bridge is built per
/// request, paying tool registration per line for zero shared state.
///
/// # Errors
///
/// Returns an error if stdin or stdout fails.
pub fn serve_stdio(config: &BoardConfig, mode: BridgeMode) -> Result<()> {
    let repo = Arc::new(TaskRepository::new(config));
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let reader = BufReader::new(stdin.lock());

    let mut bridge = match (mode, config.session_ttl_secs) {
        (BridgeMode::Stateless, _) => McpBridge::stateless(Arc::clone(&repo)),
        (BridgeMode::Stateful, Some(ttl)) => McpBridge::stateful_with_ttl(Arc::clone(&repo), ttl),
        (BridgeMode::Stateful, None) => McpBridge::stateful(Arc::clone(&repo)),
    };
    let mut current_session: Option<String> = None;

    for line in reader.lines() {
        let line = line.map_err(|e| Error::OperationFailed {
            operation: "read_stdin".to_string(),
            cause: e.to_string(),
        })?;
        if line.is_empty() {
            continue;
        }

        let reply = if mode == BridgeMode::Stateless {
            // Fresh instance per request: no shared state between lines.
            McpBridge::stateless(Arc::clone(&repo)).handle_request(&line, None)
        } else {
            bridge.handle_request(&line, current_session.as_deref())
        };

        if let Some(token) = reply.session_id {
            current_session = Some(token);
        }

        writeln!(stdout, "{}", reply.body).map_err(|e| Error::OperationFailed {
            operation: "write_stdout".to_string(),
            cause: e.to_string(),
        })?;
        stdout.flush().map_err(|e| Error::OperationFailed {
            operation: "flush_stdout".to_string(),
            cause: e.to_string(),
        })?;
    }

    // Connection closed: explicit termination frees the session slot.
    if let Some(token) = current_session {
        bridge.terminate_session(&token);
    }
    Ok(())
}
