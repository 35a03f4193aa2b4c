//! The task tool catalog for the TaskMind assistant.
//!
//! Tools give the model the ability to manage the user's todo list:
//! add, list, complete, update, and delete tasks.
//!
//! The catalog is closed: a raw `{name, arguments}` pair from the model is
//! parsed into a `ToolInvocation` variant before anything runs, so an
//! unknown name or malformed arguments is an error value, never an
//! execution. The owner is injected by the caller from the authenticated
//! request; it is not a tool argument and the model cannot supply it.

pub mod add_task;
pub mod complete_task;
pub mod delete_task;
pub mod list_tasks;
pub mod update_task;

use serde::de::DeserializeOwned;
use std::sync::Arc;
use taskmind_core::error::{StoreError, ToolError};
use taskmind_core::message::ToolCallRequest;
use taskmind_core::provider::ToolDefinition;
use taskmind_core::task::{StatusFilter, TaskCategory, TaskPriority, TaskStore};
use taskmind_core::{DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};

/// Bumped whenever a tool is added, removed, or changes its schema.
pub const CATALOG_VERSION: &str = "1";

/// Definitions for every tool in the catalog, in a stable order.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        add_task::definition(),
        list_tasks::definition(),
        complete_task::definition(),
        update_task::definition(),
        delete_task::definition(),
    ]
}

/// One fully parsed and validated tool invocation.
#[derive(Debug)]
pub enum ToolInvocation {
    AddTask(add_task::AddTaskArgs),
    ListTasks(list_tasks::ListTasksArgs),
    CompleteTask(complete_task::CompleteTaskArgs),
    UpdateTask(update_task::UpdateTaskArgs),
    DeleteTask(delete_task::DeleteTaskArgs),
}

impl ToolInvocation {
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::AddTask(_) => "add_task",
            Self::ListTasks(_) => "list_tasks",
            Self::CompleteTask(_) => "complete_task",
            Self::UpdateTask(_) => "update_task",
            Self::DeleteTask(_) => "delete_task",
        }
    }
}

/// The closed set of task tools, bound to a task store.
pub struct ToolCatalog {
    store: Arc<dyn TaskStore>,
}

impl ToolCatalog {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Definitions to advertise to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        definitions()
    }

    /// Parse a raw tool call into a typed invocation.
    ///
    /// Fails with `UnknownTool` for names outside the catalog and
    /// `InvalidArguments` for malformed or out-of-range argument values.
    pub fn parse(&self, call: &ToolCallRequest) -> Result<ToolInvocation, ToolError> {
        match call.name.as_str() {
            "add_task" => {
                let args: add_task::AddTaskArgs = parse_args(&call.arguments)?;
                args.validate()?;
                Ok(ToolInvocation::AddTask(args))
            }
            "list_tasks" => {
                let args: list_tasks::ListTasksArgs = parse_args(&call.arguments)?;
                args.validate()?;
                Ok(ToolInvocation::ListTasks(args))
            }
            "complete_task" => {
                let args: complete_task::CompleteTaskArgs = parse_args(&call.arguments)?;
                Ok(ToolInvocation::CompleteTask(args))
            }
            "update_task" => {
                let args: update_task::UpdateTaskArgs = parse_args(&call.arguments)?;
                args.validate()?;
                Ok(ToolInvocation::UpdateTask(args))
            }
            "delete_task" => {
                let args: delete_task::DeleteTaskArgs = parse_args(&call.arguments)?;
                Ok(ToolInvocation::DeleteTask(args))
            }
            other => Err(ToolError::UnknownTool {
                name: other.to_string(),
            }),
        }
    }

    /// Run a parsed invocation on behalf of `owner`.
    pub async fn execute(
        &self,
        owner: &str,
        invocation: ToolInvocation,
    ) -> Result<serde_json::Value, ToolError> {
        match invocation {
            ToolInvocation::AddTask(args) => add_task::run(self.store.as_ref(), owner, args).await,
            ToolInvocation::ListTasks(args) => {
                list_tasks::run(self.store.as_ref(), owner, args).await
            }
            ToolInvocation::CompleteTask(args) => {
                complete_task::run(self.store.as_ref(), owner, args).await
            }
            ToolInvocation::UpdateTask(args) => {
                update_task::run(self.store.as_ref(), owner, args).await
            }
            ToolInvocation::DeleteTask(args) => {
                delete_task::run(self.store.as_ref(), owner, args).await
            }
        }
    }
}

// --- Shared argument helpers ---

/// Deserialize a tool's argument JSON. Some models send an empty string for
/// a no-argument call, which we read as `{}`.
fn parse_args<T: DeserializeOwned>(raw: &str) -> Result<T, ToolError> {
    let raw = if raw.trim().is_empty() { "{}" } else { raw };
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
        reason: e.to_string(),
    })
}

pub(crate) fn parse_priority(value: &str) -> Result<TaskPriority, ToolError> {
    TaskPriority::parse(value).ok_or_else(|| ToolError::InvalidArguments {
        reason: format!("Invalid priority '{value}'. Must be one of: high, medium, low, none"),
    })
}

pub(crate) fn parse_category(value: &str) -> Result<TaskCategory, ToolError> {
    TaskCategory::parse(value).ok_or_else(|| ToolError::InvalidArguments {
        reason: format!(
            "Invalid category '{value}'. Must be one of: work, personal, shopping, health, other"
        ),
    })
}

pub(crate) fn parse_status(value: &str) -> Result<StatusFilter, ToolError> {
    StatusFilter::parse(value).ok_or_else(|| ToolError::InvalidArguments {
        reason: format!("Invalid status '{value}'. Must be one of: all, pending, completed"),
    })
}

pub(crate) fn validate_title(title: &str) -> Result<(), ToolError> {
    if title.trim().is_empty() {
        return Err(ToolError::InvalidArguments {
            reason: "Task title must not be empty".into(),
        });
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(ToolError::InvalidArguments {
            reason: format!("Task title exceeds {TITLE_MAX_CHARS} characters"),
        });
    }
    Ok(())
}

pub(crate) fn validate_description(description: Option<&str>) -> Result<(), ToolError> {
    if let Some(d) = description {
        if d.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(ToolError::InvalidArguments {
                reason: format!("Task description exceeds {DESCRIPTION_MAX_CHARS} characters"),
            });
        }
    }
    Ok(())
}

/// Keep store misses as tool-level not-found so the model sees a clean
/// message instead of a database error.
pub(crate) fn store_err(e: StoreError) -> ToolError {
    match e {
        StoreError::NotFound { what } => ToolError::NotFound { what },
        other => ToolError::Store(other),
    }
}
