//! `add_task` — create a task on the caller's todo list.

use crate::{parse_category, parse_priority, store_err, validate_description, validate_title};
use serde::Deserialize;
use serde_json::{json, Value};
use taskmind_core::error::ToolError;
use taskmind_core::provider::ToolDefinition;
use taskmind_core::task::{NewTask, TaskStore};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddTaskArgs {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl AddTaskArgs {
    pub fn validate(&self) -> Result<(), ToolError> {
        validate_title(&self.title)?;
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
        name: "add_task".into(),
        description: "Add a new task to the user's todo list.".into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Task title (1-200 characters)"
                },
                "description": {
                    "type": "string",
                    "description": "Optional task description (max 1000 characters)"
                },
                "priority": {
                    "type": "string",
                    "enum": ["high", "medium", "low", "none"],
                    "description": "Task priority (default: none)"
                },
                "category": {
                    "type": "string",
                    "enum": ["work", "personal", "shopping", "health", "other"],
                    "description": "Task category (default: other)"
                }
            },
            "required": ["title"]
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
                "created_at": {"type": "string"}
            }
        }),
    }
}

pub async fn run(store: &dyn TaskStore, owner: &str, args: AddTaskArgs) -> Result<Value, ToolError> {
    let priority = args
        .priority
        .as_deref()
        .map(parse_priority)
        .transpose()?
        .unwrap_or_default();
    let category = args
        .category
        .as_deref()
        .map(parse_category)
        .transpose()?
        .unwrap_or_default();

    let task = store
        .create_task(
            owner,
            NewTask {
                title: args.title,
                // An empty description means "no description".
                description: args.description.filter(|d| !d.is_empty()),
                priority,
                category,
            },
        )
        .await
        .map_err(store_err)?;

    Ok(json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "priority": task.priority,
        "category": task.category,
        "completed": task.completed,
        "created_at": task.created_at.to_rfc3339(),
    }))
}
