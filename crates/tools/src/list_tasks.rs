//! `list_tasks` — list the caller's tasks with optional filters.

use crate::{parse_category, parse_priority, parse_status, store_err};
use serde::Deserialize;
use serde_json::{json, Value};
use taskmind_core::error::ToolError;
use taskmind_core::provider::ToolDefinition;
use taskmind_core::task::{TaskFilter, TaskRecord, TaskStore};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListTasksArgs {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ListTasksArgs {
    pub fn validate(&self) -> Result<(), ToolError> {
        if let Some(s) = &self.status {
            parse_status(s)?;
        }
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
        name: "list_tasks".into(),
        description: "List the user's tasks with optional status, priority, and category filters."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": ["all", "pending", "completed"],
                    "description": "Filter by completion status (default: all)"
                },
                "priority": {
                    "type": "string",
                    "enum": ["high", "medium", "low", "none"],
                    "description": "Only tasks with this priority"
                },
                "category": {
                    "type": "string",
                    "enum": ["work", "personal", "shopping", "health", "other"],
                    "description": "Only tasks in this category"
                }
            }
        }),
        output_schema: json!({
            "type": "object",
            "properties": {
                "count": {"type": "integer"},
                "tasks": {"type": "array", "items": {"type": "object"}}
            }
        }),
    }
}

fn task_view(task: &TaskRecord) -> Value {
    json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "priority": task.priority,
        "category": task.category,
        "completed": task.completed,
        "created_at": task.created_at.to_rfc3339(),
        "updated_at": task.updated_at.to_rfc3339(),
    })
}

pub async fn run(
    store: &dyn TaskStore,
    owner: &str,
    args: ListTasksArgs,
) -> Result<Value, ToolError> {
    let filter = TaskFilter {
        status: args
            .status
            .as_deref()
            .map(parse_status)
            .transpose()?
            .unwrap_or_default(),
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        category: args.category.as_deref().map(parse_category).transpose()?,
    };

    let tasks = store.list_tasks(owner, filter).await.map_err(store_err)?;

    Ok(json!({
        "count": tasks.len(),
        "tasks": tasks.iter().map(task_view).collect::<Vec<_>>(),
    }))
}
