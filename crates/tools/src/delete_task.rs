//! `delete_task` — remove a task from the caller's todo list.

use crate::store_err;
use serde::Deserialize;
use serde_json::{json, Value};
use taskmind_core::error::ToolError;
use taskmind_core::provider::ToolDefinition;
use taskmind_core::task::TaskStore;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteTaskArgs {
    pub task_id: i64,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "delete_task".into(),
        description: "Delete a task from the user's todo list.".into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "task_id": {
                    "type": "integer",
                    "description": "ID of the task to delete"
                }
            },
            "required": ["task_id"]
        }),
        output_schema: json!({
            "type": "object",
            "properties": {
                "success": {"type": "boolean"},
                "message": {"type": "string"}
            }
        }),
    }
}

pub async fn run(
    store: &dyn TaskStore,
    owner: &str,
    args: DeleteTaskArgs,
) -> Result<Value, ToolError> {
    let task = store
        .delete_task(owner, args.task_id)
        .await
        .map_err(store_err)?;

    Ok(json!({
        "success": true,
        "message": format!("Task '{}' (id: {}) deleted successfully", task.title, task.id),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{add_task, list_tasks};
    use taskmind_store::SqliteStore;

    async fn store_with_task() -> (SqliteStore, i64) {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();
        let payload = add_task::run(
            &store,
            "alice",
            serde_json::from_value(json!({"title": "old chore"})).unwrap(),
        )
        .await
        .unwrap();
        let id = payload["id"].as_i64().unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn deletes_and_confirms() {
        let (store, id) = store_with_task().await;
        let payload = run(
            &store,
            "alice",
            serde_json::from_value(json!({"task_id": id})).unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(payload["success"], true);
        let message = payload["message"].as_str().unwrap();
        assert!(message.contains("old chore"));
        assert!(message.contains(&format!("id: {id}")));

        let listing = list_tasks::run(
            &store,
            "alice",
            serde_json::from_value(json!({})).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(listing["count"], 0);
    }

    #[tokio::test]
    async fn missing_task_is_not_found() {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();
        let err = run(
            &store,
            "alice",
            serde_json::from_value(json!({"task_id": 99})).unwrap(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn foreign_task_survives_delete_attempt() {
        let (store, id) = store_with_task().await;
        let err = run(
            &store,
            "mallory",
            serde_json::from_value(json!({"task_id": id})).unwrap(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "not_found");

        let listing = list_tasks::run(
            &store,
            "alice",
            serde_json::from_value(json!({})).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(listing["count"], 1);
    }
}
