//! Board tools exposed over the bridge.
//!
//! Each tool declares a JSON-schema descriptor with typed, required/optional
//! named parameters. The bridge validates required parameters against the
//! schema before a handler runs; handlers return text content blocks, and a
//! handler failure is framed in-band rather than failing the protocol call.
//! Wire field names (`taskId`, `newLane`, ...) are part of the stable tool
//! surface.

use crate::models::{TaskId, TaskUpdate};
use crate::storage::TaskRepository;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of board tools bound to a repository.
pub struct ToolRegistry {
    repo: Arc<TaskRepository>,
    tools: HashMap<String, ToolDefinition>,
}

/// A tool descriptor as surfaced by `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for input validation.
    pub input_schema: Value,
}

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the result represents an error.
    pub is_error: bool,
}

impl ToolResult {
    /// Wraps a payload as a successful text block.
    fn text(text: String) -> Self {
        Self {
            content: vec![ToolContent::Text { text }],
            is_error: false,
        }
    }
}

/// Content types that can be returned by tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

impl ToolRegistry {
    /// Creates a registry with every board tool registered.
    #[must_use]
    pub fn new(repo: Arc<TaskRepository>) -> Self {
        let mut tools = HashMap::new();

        let mut register = |name: &str, description: &str, input_schema: Value| {
            tools.insert(
                name.to_string(),
                ToolDefinition {
                    name: name.to_string(),
                    description: description.to_string(),
                    input_schema,
                },
            );
        };

        register(
            "list_lanes",
            "List all available task lanes",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        );

        register(
            "get_lane_tasks",
            "Get all tasks from a specific lane",
            json!({
                "type": "object",
                "properties": {
                    "lane": {
                        "type": "string",
                        "description": "The name of the lane to get tasks from"
                    }
                },
                "required": ["lane"]
            }),
        );

        register(
            "list_all_tasks",
            "List all tasks across all lanes",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        );

        register(
            "create_task",
            "Create a new task in a lane",
            json!({
                "type": "object",
                "properties": {
                    "lane": {
                        "type": "string",
                        "description": "The lane to create the task in"
                    },
                    "title": {
                        "type": "string",
                        "description": "The title of the task, carried in its filename"
                    },
                    "content": {
                        "type": "string",
                        "description": "Optional markdown content for the task"
                    }
                },
                "required": ["lane", "title"]
            }),
        );

        register(
            "update_task",
            "Update an existing task's content or move it to a different lane",
            json!({
                "type": "object",
                "properties": {
                    "taskId": {
                        "type": "string",
                        "description": "The ID of the task to update"
                    },
                    "content": {
                        "type": "string",
                        "description": "New content for the task"
                    },
                    "newLane": {
                        "type": "string",
                        "description": "New lane to move the task to"
                    },
                    "lane": {
                        "type": "string",
                        "description": "Current lane of the task (skips the board-wide search)"
                    }
                },
                "required": ["taskId"]
            }),
        );

        register(
            "rename_task",
            "Rename a task, recomputing its filename with the same ID",
            json!({
                "type": "object",
                "properties": {
                    "taskId": {
                        "type": "string",
                        "description": "The ID of the task to rename"
                    },
                    "title": {
                        "type": "string",
                        "description": "The new title"
                    },
                    "lane": {
                        "type": "string",
                        "description": "The lane currently holding the task"
                    }
                },
                "required": ["taskId", "title", "lane"]
            }),
        );

        register(
            "move_task",
            "Move a task from one lane to another",
            json!({
                "type": "object",
                "properties": {
                    "taskId": {
                        "type": "string",
                        "description": "The ID of the task to move"
                    },
                    "fromLane": {
                        "type": "string",
                        "description": "The lane currently holding the task"
                    },
                    "toLane": {
                        "type": "string",
                        "description": "The destination lane (created if absent)"
                    }
                },
                "required": ["taskId", "fromLane", "toLane"]
            }),
        );

        register(
            "delete_task",
            "Delete a task",
            json!({
                "type": "object",
                "properties": {
                    "taskId": {
                        "type": "string",
                        "description": "The ID of the task to delete"
                    },
                    "lane": {
                        "type": "string",
                        "description": "Current lane of the task (skips the board-wide search)"
                    }
                },
                "required": ["taskId"]
            }),
        );

        register(
            "get_task_content",
            "Get the content and metadata of a specific task",
            json!({
                "type": "object",
                "properties": {
                    "taskId": {
                        "type": "string",
                        "description": "The ID of the task to retrieve"
                    },
                    "lane": {
                        "type": "string",
                        "description": "Current lane of the task (skips the board-wide search)"
                    }
                },
                "required": ["taskId"]
            }),
        );

        register(
            "create_lane",
            "Create a new task lane",
            json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Name for the new lane (auto-generated if not provided)"
                    }
                },
                "required": []
            }),
        );

        register(
            "rename_lane",
            "Rename a lane; task IDs are unaffected",
            json!({
                "type": "object",
                "properties": {
                    "lane": {
                        "type": "string",
                        "description": "The lane to rename"
                    },
                    "newName": {
                        "type": "string",
                        "description": "The new lane name"
                    }
                },
                "required": ["lane", "newName"]
            }),
        );

        register(
            "delete_lane",
            "Delete a lane and every task inside it (irreversible)",
            json!({
                "type": "object",
                "properties": {
                    "lane": {
                        "type": "string",
                        "description": "The lane to delete"
                    }
                },
                "required": ["lane"]
            }),
        );

        Self { repo, tools }
    }

    /// Returns all tool definitions.
    #[must_use]
    pub fn list_tools(&self) -> Vec<&ToolDefinition> {
        self.tools.values().collect()
    }

    /// Gets a tool definition by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Checks that every parameter the tool's schema marks required is
    /// present in the arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] naming the first missing parameter.
    pub fn validate_arguments(&self, name: &str, arguments: &Value) -> Result<()> {
        let Some(tool) = self.tools.get(name) else {
            return Err(Error::InvalidInput(format!("Unknown tool: {name}")));
        };
        let required = tool.input_schema["required"].as_array();
        for param in required.into_iter().flatten() {
            let Some(param) = param.as_str() else { continue };
            if arguments.get(param).is_none_or(Value::is_null) {
                return Err(Error::InvalidInput(format!(
                    "tool '{name}' is missing required parameter '{param}'"
                )));
            }
        }
        Ok(())
    }

    /// Executes a tool with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown tools, malformed arguments, or a failing
    /// repository operation. The bridge frames these in-band.
    pub fn execute(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        match name {
            "list_lanes" => self.execute_list_lanes(),
            "get_lane_tasks" => self.execute_get_lane_tasks(arguments),
            "list_all_tasks" => self.execute_list_all_tasks(),
            "create_task" => self.execute_create_task(arguments),
            "update_task" => self.execute_update_task(arguments),
            "rename_task" => self.execute_rename_task(arguments),
            "move_task" => self.execute_move_task(arguments),
            "delete_task" => self.execute_delete_task(arguments),
            "get_task_content" => self.execute_get_task_content(arguments),
            "create_lane" => self.execute_create_lane(arguments),
            "rename_lane" => self.execute_rename_lane(arguments),
            "delete_lane" => self.execute_delete_lane(arguments),
            _ => Err(Error::InvalidInput(format!("Unknown tool: {name}"))),
        }
    }

    fn execute_list_lanes(&self) -> Result<ToolResult> {
        let lanes = self.repo.store().list_lanes()?;
        let total = lanes.len();
        Ok(ToolResult::text(pretty(&json!({
            "lanes": lanes,
            "total": total
        }))))
    }

    fn execute_get_lane_tasks(&self, arguments: Value) -> Result<ToolResult> {
        let args: LaneArgs = parse_args(arguments)?;
        let tasks = self.repo.get_lane_tasks(&args.lane)?;
        let total = tasks.len();
        Ok(ToolResult::text(pretty(&json!({
            "lane": args.lane,
            "tasks": tasks,
            "total": total
        }))))
    }

    fn execute_list_all_tasks(&self) -> Result<ToolResult> {
        let tasks = self.repo.get_cards()?;
        let total = tasks.len();
        Ok(ToolResult::text(pretty(&json!({
            "tasks": tasks,
            "total": total
        }))))
    }

    fn execute_create_task(&self, arguments: Value) -> Result<ToolResult> {
        let args: CreateTaskArgs = parse_args(arguments)?;
        let task = self
            .repo
            .create_task(&args.lane, &args.title, args.content.as_deref().unwrap_or(""))?;
        Ok(ToolResult::text(pretty(&json!({
            "success": true,
            "task": task
        }))))
    }

    fn execute_update_task(&self, arguments: Value) -> Result<ToolResult> {
        let args: UpdateTaskArgs = parse_args(arguments)?;
        let task = self.repo.update_task(
            &TaskId::new(args.task_id),
            TaskUpdate {
                content: args.content,
                lane: args.lane,
                new_lane: args.new_lane,
            },
        )?;
        Ok(ToolResult::text(pretty(&json!({
            "success": true,
            "task": task
        }))))
    }

    fn execute_rename_task(&self, arguments: Value) -> Result<ToolResult> {
        let args: RenameTaskArgs = parse_args(arguments)?;
        let task =
            self.repo
                .update_task_title(&TaskId::new(args.task_id), &args.title, &args.lane)?;
        Ok(ToolResult::text(pretty(&json!({
            "success": true,
            "task": task
        }))))
    }

    fn execute_move_task(&self, arguments: Value) -> Result<ToolResult> {
        let args: MoveTaskArgs = parse_args(arguments)?;
        let task = self
            .repo
            .move_task(&TaskId::new(args.task_id), &args.from_lane, &args.to_lane)?;
        Ok(ToolResult::text(pretty(&json!({
            "success": true,
            "task": task
        }))))
    }

    fn execute_delete_task(&self, arguments: Value) -> Result<ToolResult> {
        let args: TaskRefArgs = parse_args(arguments)?;
        let id = TaskId::new(args.task_id);
        self.repo.delete_task(&id, args.lane.as_deref())?;
        Ok(ToolResult::text(pretty(&json!({
            "success": true,
            "deletedTask": { "id": id }
        }))))
    }

    fn execute_get_task_content(&self, arguments: Value) -> Result<ToolResult> {
        let args: TaskRefArgs = parse_args(arguments)?;
        let task = self
            .repo
            .get_task(&TaskId::new(args.task_id), args.lane.as_deref())?;
        Ok(ToolResult::text(pretty(&json!(task))))
    }

    fn execute_create_lane(&self, arguments: Value) -> Result<ToolResult> {
        let args: CreateLaneArgs = parse_args(arguments)?;
        let lane = self.repo.create_lane(args.name.as_deref())?;
        Ok(ToolResult::text(pretty(&json!({
            "success": true,
            "lane": lane
        }))))
    }

    fn execute_rename_lane(&self, arguments: Value) -> Result<ToolResult> {
        let args: RenameLaneArgs = parse_args(arguments)?;
        let lane = self.repo.rename_lane(&args.lane, &args.new_name)?;
        Ok(ToolResult::text(pretty(&json!({
            "success": true,
            "lane": lane
        }))))
    }

    fn execute_delete_lane(&self, arguments: Value) -> Result<ToolResult> {
        let args: LaneArgs = parse_args(arguments)?;
        self.repo.delete_lane(&args.lane)?;
        Ok(ToolResult::text(pretty(&json!({
            "success": true,
            "deletedLane": args.lane
        }))))
    }
}

/// Deserializes tool arguments, mapping failures to `InvalidInput`.
fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| Error::InvalidInput(e.to_string()))
}

/// Pretty-prints a tool payload for the text content block.
fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Arguments naming a single lane.
#[derive(Debug, Deserialize)]
struct LaneArgs {
    lane: String,
}

/// Arguments for the `create_task` tool.
#[derive(Debug, Deserialize)]
struct CreateTaskArgs {
    lane: String,
    title: String,
    content: Option<String>,
}

/// Arguments for the `update_task` tool.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskArgs {
    task_id: String,
    content: Option<String>,
    new_lane: Option<String>,
    lane: Option<String>,
}

/// Arguments for the `rename_task` tool.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameTaskArgs {
    task_id: String,
    title: String,
    lane: String,
}

/// Arguments for the `move_task` tool.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveTaskArgs {
    task_id: String,
    from_lane: String,
    to_lane: String,
}

/// Arguments naming a task by id with an optional lane hint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRefArgs {
    task_id: String,
    lane: Option<String>,
}

/// Arguments for the `create_lane` tool.
#[derive(Debug, Deserialize)]
struct CreateLaneArgs {
    name: Option<String>,
}

/// Arguments for the `rename_lane` tool.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameLaneArgs {
    lane: String,
    new_name: String,
}
