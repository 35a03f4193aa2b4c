//! `complete_task` — mark a task complete or incomplete.

use crate::store_err;
use serde::Deserialize;
use serde_json::{json, Value};
use taskmind_core::error::ToolError;
use taskmind_core::provider::ToolDefinition;
use taskmind_core::task::TaskStore;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompleteTaskArgs {
    pub task_id: i64,
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "complete_task".into(),
        description: "Mark a task as complete, or as incomplete again.".into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "task_id": {
                    "type": "integer",
                    "description": "ID of the task to update"
                },
                "completed": {
                    "type": "boolean",
                    "description": "true to mark complete, false to reopen (default: true)"
                }
            },
            "required": ["task_id"]
        }),
        output_schema: json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "title": {"type": "string"},
                "completed": {"type": "boolean"},
                "updated_at": {"type": "string"}
            }
        }),
    }
}

pub async fn run(
    store: &dyn TaskStore,
    owner: &str,
    args: CompleteTaskArgs,
) -> Result<Value, ToolError> {
    let task = store
        .set_completed(owner, args.task_id, args.completed)
        .await
        .map_err(store_err)?;

    Ok(json!({
        "id": task.id,
        "title": task.title,
        "completed": task.completed,
        "updated_at": task.updated_at.to_rfc3339(),
    }))
}
