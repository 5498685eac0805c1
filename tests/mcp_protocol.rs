//! MCP bridge protocol tests.
//!
//! Drives the bridge with raw JSON-RPC lines against a real temporary board,
//! verifying envelope shape, session discipline, tool dispatch, and error
//! framing end to end.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use lanefile::config::BoardConfig;
use lanefile::mcp::McpBridge;
use lanefile::storage::TaskRepository;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

fn stateful_bridge(tmp: &TempDir) -> McpBridge {
    McpBridge::stateful(Arc::new(TaskRepository::new(&BoardConfig::new(tmp.path()))))
}

fn request(method: &str, params: Value, id: u64) -> String {
    json!({"jsonrpc": "2.0", "method": method, "params": params, "id": id}).to_string()
}

/// Initializes a session and returns its token.
fn handshake(bridge: &mut McpBridge) -> String {
    let init = bridge.handle_request(&request("initialize", json!({}), 1), None);
    let token = init.session_id.expect("stateful initialize mints a token");
    bridge.handle_request(
        &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
        Some(&token),
    );
    token
}

fn call_tool(bridge: &mut McpBridge, token: &str, name: &str, arguments: Value, id: u64) -> Value {
    let reply = bridge.handle_request(
        &request("tools/call", json!({"name": name, "arguments": arguments}), id),
        Some(token),
    );
    serde_json::from_str(&reply.body).unwrap()
}

/// Unwraps the text payload of a successful tool call.
fn tool_payload(response: &Value) -> Value {
    assert_eq!(response["result"]["isError"], false, "tool errored: {response}");
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

mod envelope {
    use super::*;

    #[test]
    fn test_response_echoes_request_id() {
        let tmp = TempDir::new().unwrap();
        let mut bridge = stateful_bridge(&tmp);
        let reply = bridge.handle_request(&request("initialize", json!({}), 42), None);
        let parsed: Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(parsed["jsonrpc"], "2.0");
        assert_eq!(parsed["id"], 42);
        assert_eq!(parsed["result"]["protocolVersion"], "2024-11-05");
    }

    #[test]
    fn test_malformed_envelope_is_parse_error_with_null_id() {
        let tmp = TempDir::new().unwrap();
        let mut bridge = stateful_bridge(&tmp);
        let reply = bridge.handle_request("{not json", None);
        let parsed: Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(parsed["error"]["code"], -32700);
        assert_eq!(parsed["id"], Value::Null);
    }

    #[test]
    fn test_unknown_method_is_method_not_found() {
        let tmp = TempDir::new().unwrap();
        let mut bridge = stateful_bridge(&tmp);
        let reply = bridge.handle_request(&request("prompts/list", json!({}), 3), None);
        let parsed: Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(parsed["error"]["code"], -32601);
        assert_eq!(parsed["id"], 3);
    }
}

mod sessions {
    use super::*;

    #[test]
    fn test_tokens_are_never_reissued() {
        let tmp = TempDir::new().unwrap();
        let mut bridge = stateful_bridge(&tmp);
        let mut seen = std::collections::HashSet::new();
        for i in 0..32 {
            let reply = bridge.handle_request(&request("initialize", json!({}), i), None);
            assert!(seen.insert(reply.session_id.unwrap()));
        }
    }

    #[test]
    fn test_tool_methods_require_token() {
        let tmp = TempDir::new().unwrap();
        let mut bridge = stateful_bridge(&tmp);

        for (method, params) in [
            ("tools/list", json!({})),
            ("tools/call", json!({"name": "list_lanes", "arguments": {}})),
        ] {
            let reply = bridge.handle_request(&request(method, params, 9), None);
            let parsed: Value = serde_json::from_str(&reply.body).unwrap();
            assert_eq!(parsed["error"]["code"], -32000, "{method} must be rejected");
            assert!(
                parsed["error"]["message"].as_str().unwrap().contains("unauthorized"),
                "{method} error should be authentication-style"
            );
        }
    }

    #[test]
    fn test_handshake_marks_session_initialized() {
        let tmp = TempDir::new().unwrap();
        let mut bridge = stateful_bridge(&tmp);
        let token = handshake(&mut bridge);

        let reply = bridge.handle_request(&request("tools/list", json!({}), 2), Some(&token));
        let parsed: Value = serde_json::from_str(&reply.body).unwrap();
        assert!(parsed["error"].is_null());
    }

    #[test]
    fn test_client_info_is_retained() {
        let tmp = TempDir::new().unwrap();
        let mut bridge = stateful_bridge(&tmp);
        let reply = bridge.handle_request(
            &request(
                "initialize",
                json!({"clientInfo": {"name": "agent", "version": "1.0"}}),
                1,
            ),
            None,
        );
        assert!(reply.session_id.is_some());
    }
}

mod tool_calls {
    use super::*;

    #[test]
    fn test_list_tools_exposes_schemas() {
        let tmp = TempDir::new().unwrap();
        let mut bridge = stateful_bridge(&tmp);
        let token = handshake(&mut bridge);

        let reply = bridge.handle_request(&request("tools/list", json!({}), 2), Some(&token));
        let parsed: Value = serde_json::from_str(&reply.body).unwrap();
        let tools = parsed["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 12);
        for tool in tools {
            assert!(tool["name"].is_string());
            assert!(tool["description"].is_string());
            assert_eq!(tool["inputSchema"]["type"], "object");
        }
    }

    #[test]
    fn test_board_flow_over_the_wire() {
        let tmp = TempDir::new().unwrap();
        let mut bridge = stateful_bridge(&tmp);
        let token = handshake(&mut bridge);

        let created = call_tool(
            &mut bridge,
            &token,
            "create_task",
            json!({"lane": "backlog", "title": "Fix bug", "content": "desc #bug"}),
            2,
        );
        let task = &tool_payload(&created)["task"];
        let id = task["id"].as_str().unwrap().to_string();
        assert_eq!(task["lane"], "backlog");
        assert_eq!(task["tags"], json!(["bug"]));

        let moved = call_tool(
            &mut bridge,
            &token,
            "move_task",
            json!({"taskId": id, "fromLane": "backlog", "toLane": "done"}),
            3,
        );
        assert_eq!(tool_payload(&moved)["task"]["lane"], "done");

        let lanes = call_tool(&mut bridge, &token, "list_lanes", json!({}), 4);
        let payload = tool_payload(&lanes);
        let names: Vec<&str> = payload["lanes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert!(names.contains(&"backlog") && names.contains(&"done"));

        let listed = call_tool(
            &mut bridge,
            &token,
            "get_lane_tasks",
            json!({"lane": "backlog"}),
            5,
        );
        assert_eq!(tool_payload(&listed)["total"], 0);

        let deleted = call_tool(
            &mut bridge,
            &token,
            "delete_task",
            json!({"taskId": id, "lane": "done"}),
            6,
        );
        assert_eq!(tool_payload(&deleted)["success"], true);
    }

    #[test]
    fn test_unknown_tool_is_in_band_with_matching_id() {
        let tmp = TempDir::new().unwrap();
        let mut bridge = stateful_bridge(&tmp);
        let token = handshake(&mut bridge);

        let response = call_tool(&mut bridge, &token, "no_such_tool", json!({}), 77);
        assert_eq!(response["id"], 77);
        assert!(response["error"].is_null());
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Unknown tool"));
    }

    #[test]
    fn test_missing_required_parameter_fails_the_protocol_call() {
        let tmp = TempDir::new().unwrap();
        let mut bridge = stateful_bridge(&tmp);
        let token = handshake(&mut bridge);

        let response = call_tool(&mut bridge, &token, "create_task", json!({"lane": "a"}), 8);
        assert_eq!(response["error"]["code"], -32602);
        assert!(
            response["error"]["message"].as_str().unwrap().contains("title")
        );
    }

    #[test]
    fn test_failing_handler_keeps_request_response_pairing() {
        let tmp = TempDir::new().unwrap();
        let mut bridge = stateful_bridge(&tmp);
        let token = handshake(&mut bridge);

        let response = call_tool(
            &mut bridge,
            &token,
            "get_task_content",
            json!({"taskId": "does-not-exist"}),
            13,
        );
        assert_eq!(response["id"], 13);
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("not found"));
    }
}

mod stateless {
    use super::*;

    #[test]
    fn test_fresh_instances_serve_without_sessions() {
        let tmp = TempDir::new().unwrap();
        let repo = Arc::new(TaskRepository::new(&BoardConfig::new(tmp.path())));

        // Each request gets its own bridge, as the stateless transport does.
        let created = McpBridge::stateless(Arc::clone(&repo)).handle_request(
            &request(
                "tools/call",
                json!({"name": "create_task", "arguments": {"lane": "a", "title": "t"}}),
                1,
            ),
            None,
        );
        let parsed: Value = serde_json::from_str(&created.body).unwrap();
        assert_eq!(parsed["result"]["isError"], false);

        let listed = McpBridge::stateless(Arc::clone(&repo))
            .handle_request(&request("tools/list", json!({}), 2), None);
        let parsed: Value = serde_json::from_str(&listed.body).unwrap();
        assert!(parsed["error"].is_null());

        // State persisted on disk, not in the bridge.
        let cards = McpBridge::stateless(repo).handle_request(
            &request(
                "tools/call",
                json!({"name": "list_all_tasks", "arguments": {}}),
                3,
            ),
            None,
        );
        let parsed: Value = serde_json::from_str(&cards.body).unwrap();
        let text = parsed["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["total"], 1);
    }
}
