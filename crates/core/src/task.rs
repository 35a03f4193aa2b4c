//! Task domain types and the storage trait the tools run against.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum task title length, in characters.
pub const TITLE_MAX_CHARS: usize = 200;
/// Maximum task description length, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

// ── Enumerations ────────────────────────────────────────────────────────────

/// Task priority. `None` means the caller did not assign one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 4] = [Self::High, Self::Medium, Self::Low, Self::None];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task category. `Other` is the catch-all default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Work,
    Personal,
    Shopping,
    Health,
    #[default]
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 5] = [
        Self::Work,
        Self::Personal,
        Self::Shopping,
        Self::Health,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Shopping => "shopping",
            Self::Health => "health",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "work" => Some(Self::Work),
            "personal" => Some(Self::Personal),
            "shopping" => Some(Self::Shopping),
            "health" => Some(Self::Health),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion-state filter for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

// ── Records ─────────────────────────────────────────────────────────────────

/// A task row as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub owner: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a task to be created. Validation happens at the tool boundary;
/// the store trusts its input.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub category: TaskCategory,
}

/// A partial update. `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub category: Option<TaskCategory>,
}

impl TaskPatch {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.category.is_none()
    }
}

/// Filter for task listings. Default matches everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub priority: Option<TaskPriority>,
    pub category: Option<TaskCategory>,
}

// ── Storage trait ───────────────────────────────────────────────────────────

/// Durable storage for tasks. Every operation is owner-scoped: a task id
/// belonging to another owner behaves exactly like a missing id.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, owner: &str, task: NewTask) -> Result<TaskRecord, StoreError>;

    /// `owner`'s tasks matching `filter`, newest first.
    async fn list_tasks(
        &self,
        owner: &str,
        filter: TaskFilter,
    ) -> Result<Vec<TaskRecord>, StoreError>;

    /// Flip the completion flag. Returns the updated row, or
    /// `StoreError::NotFound` if the id does not exist for this owner.
    async fn set_completed(
        &self,
        owner: &str,
        task_id: i64,
        completed: bool,
    ) -> Result<TaskRecord, StoreError>;

    /// Apply a partial update. Returns the updated row, or
    /// `StoreError::NotFound` if the id does not exist for this owner.
    async fn update_task(
        &self,
        owner: &str,
        task_id: i64,
        patch: TaskPatch,
    ) -> Result<TaskRecord, StoreError>;

    /// Delete a task. Returns the deleted row, or `StoreError::NotFound`
    /// if the id does not exist for this owner.
    async fn delete_task(&self, owner: &str, task_id: i64) -> Result<TaskRecord, StoreError>;
}
