//! `update_task` — change a task's title, description, priority, or category.

use crate::{parse_category, parse_priority, store_err, validate_description, validate_title};
use serde::Deserialize;
use serde_json::{json, Value};
use taskmind_core::error::ToolError;
use taskmind_core::provider::ToolDefinition;
use taskmind_core::task::{TaskPatch, TaskStore};
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskArgs {
    pub task_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl UpdateTaskArgs {
    pub fn validate(&self) -> Result<(), ToolError> {
        if let Some(t) = &self.title {
            validate_title(t)?;
        }
        validate_description(self.description.as_deref())?;
        if let Some(p) = &self.priority {
            parse_priority(p)?;
        }
        if let Some(c) = &self.category {
            parse_category(c)?;
        }
        Ok(())
    }
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "update_task".into(),
        description: "Update a task's title, description, priority, or category.".into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "task_id": {
                    "type": "integer",
                    "description": "ID of the task to update"
                },
                "title": {
                    "type": "string",
                    "description": "New task title (1-200 characters)"
                },
                "description": {
                    "type": "string",
                    "description": "New task description (max 1000 characters)"
                },
                "priority": {
                    "type": "string",
                    "enum": ["high", "medium", "low", "none"],
                    "description": "New priority"
                },
                "category": {
                    "type": "string",
                    "enum": ["work", "personal", "shopping", "health", "other"],
                    "description": "New category"
                }
            },
            "required": ["task_id"]
        }),
        output_schema: json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "title": {"type": "string"},
                "description": {"type": ["string", "null"]},
                "priority": {"type": "string"},
                "category": {"type": "string"},
                "completed": {"type": "boolean"},
                "updated_at": {"type": "string"}
            }
        }),
    }
}

pub async fn run(
    store: &dyn TaskStore,
    owner: &str,
    args: UpdateTaskArgs,
) -> Result<Value, ToolError> {
    let patch = TaskPatch {
        title: args.title,
        description: args.description,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        category: args.category.as_deref().map(parse_category).transpose()?,
    };

    if patch.is_empty() {
        debug!(task_id = args.task_id, "update_task with no fields; only touching timestamp");
    }

    let task = store
        .update_task(owner, args.task_id, patch)
        .await
        .map_err(store_err)?;

    Ok(json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "priority": task.priority,
        "category": task.category,
        "completed": task.completed,
        "updated_at": task.updated_at.to_rfc3339(),
    }))
}
