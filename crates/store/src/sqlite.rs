//! SQLite storage for conversations, messages, and tasks.
//!
//! Uses a single SQLite database file with three tables:
//! - `conversations` — one row per conversation, scoped to an owner
//! - `messages` — append-only chat transcript rows
//! - `tasks` — the todo items the assistant manages on the user's behalf
//!
//! All mutations that must hit exactly one row use `RETURNING`, so a miss
//! (wrong id or wrong owner) is detected from the same statement that would
//! have written.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use taskmind_core::chat::{ChatStore, ConversationRecord, StoredMessage, StoredRole};
use taskmind_core::error::StoreError;
use taskmind_core::task::{
    NewTask, StatusFilter, TaskCategory, TaskFilter, TaskPatch, TaskPriority, TaskRecord, TaskStore,
};
use tracing::{debug, info};

/// How long to wait for a pool connection before reporting the store as
/// unavailable.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// A production SQLite store backing both the chat history and the task list.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` with the default pool timeout.
    ///
    /// Pass `":memory:"` for an in-process ephemeral database (useful for
    /// tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        Self::connect(path, DEFAULT_ACQUIRE_TIMEOUT).await
    }

    /// Open (or create) the database at `path`.
    ///
    /// The database and all tables/indexes are created automatically.
    pub async fn connect(path: &str, acquire_timeout: Duration) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Database(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    /// Round-trip a trivial query, proving the pool can still reach the
    /// database. Used by the health endpoint.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("SELECT 1", e))?;
        Ok(())
    }

    /// Run schema migrations — creates tables and indexes.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                owner       TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("conversations table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversations_owner
             ON conversations(owner, updated_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("conversations index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id INTEGER NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                owner           TEXT NOT NULL,
                role            TEXT NOT NULL,
                content         TEXT NOT NULL,
                created_at      TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation
             ON messages(conversation_id, id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("messages index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                owner       TEXT NOT NULL,
                title       TEXT NOT NULL,
                description TEXT,
                completed   INTEGER NOT NULL DEFAULT 0,
                priority    TEXT NOT NULL DEFAULT 'none',
                category    TEXT NOT NULL DEFAULT 'other',
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("tasks table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner, created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("tasks index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `ConversationRecord` from a SQLite row.
    fn row_to_conversation(row: &sqlx::sqlite::SqliteRow) -> Result<ConversationRecord, StoreError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::Database(format!("id column: {e}")))?;
        let owner: String = row
            .try_get("owner")
            .map_err(|e| StoreError::Database(format!("owner column: {e}")))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::Database(format!("created_at column: {e}")))?;
        let updated_at: String = row
            .try_get("updated_at")
            .map_err(|e| StoreError::Database(format!("updated_at column: {e}")))?;

        Ok(ConversationRecord {
            id,
            owner,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    /// Parse a `StoredMessage` from a SQLite row.
    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<StoredMessage, StoreError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::Database(format!("id column: {e}")))?;
        let conversation_id: i64 = row
            .try_get("conversation_id")
            .map_err(|e| StoreError::Database(format!("conversation_id column: {e}")))?;
        let owner: String = row
            .try_get("owner")
            .map_err(|e| StoreError::Database(format!("owner column: {e}")))?;
        let role_text: String = row
            .try_get("role")
            .map_err(|e| StoreError::Database(format!("role column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| StoreError::Database(format!("content column: {e}")))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::Database(format!("created_at column: {e}")))?;

        let role = StoredRole::parse(&role_text)
            .ok_or_else(|| StoreError::Database(format!("unknown message role '{role_text}'")))?;

        Ok(StoredMessage {
            id,
            conversation_id,
            owner,
            role,
            content,
            created_at: parse_timestamp(&created_at),
        })
    }

    /// Parse a `TaskRecord` from a SQLite row.
    fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<TaskRecord, StoreError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::Database(format!("id column: {e}")))?;
        let owner: String = row
            .try_get("owner")
            .map_err(|e| StoreError::Database(format!("owner column: {e}")))?;
        let title: String = row
            .try_get("title")
            .map_err(|e| StoreError::Database(format!("title column: {e}")))?;
        let description: Option<String> = row
            .try_get("description")
            .map_err(|e| StoreError::Database(format!("description column: {e}")))?;
        let completed: bool = row
            .try_get("completed")
            .map_err(|e| StoreError::Database(format!("completed column: {e}")))?;
        let priority: String = row
            .try_get("priority")
            .map_err(|e| StoreError::Database(format!("priority column: {e}")))?;
        let category: String = row
            .try_get("category")
            .map_err(|e| StoreError::Database(format!("category column: {e}")))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::Database(format!("created_at column: {e}")))?;
        let updated_at: String = row
            .try_get("updated_at")
            .map_err(|e| StoreError::Database(format!("updated_at column: {e}")))?;

        Ok(TaskRecord {
            id,
            owner,
            title,
            description,
            completed,
            priority: TaskPriority::parse(&priority).unwrap_or_default(),
            category: TaskCategory::parse(&category).unwrap_or_default(),
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }
}

/// Parse an RFC3339 timestamp column, tolerating junk.
fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Translate a sqlx error, separating pool exhaustion from real failures.
fn db_err(context: &str, e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable("database connection pool timed out".into())
        }
        other => StoreError::Database(format!("{context}: {other}")),
    }
}

// ── ChatStore ───────────────────────────────────────────────────────────────

#[async_trait]
impl ChatStore for SqliteStore {
    async fn create_conversation(&self, owner: &str) -> Result<ConversationRecord, StoreError> {
        let now = Utc::now().to_rfc3339();
        let row = sqlx::query(
            r#"
            INSERT INTO conversations (owner, created_at, updated_at)
            VALUES (?1, ?2, ?2)
            RETURNING id, owner, created_at, updated_at
            "#,
        )
        .bind(owner)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("INSERT conversation", e))?;

        let conversation = Self::row_to_conversation(&row)?;
        debug!(conversation_id = conversation.id, "Created conversation");
        Ok(conversation)
    }

    async fn get_conversation(
        &self,
        id: i64,
        owner: &str,
    ) -> Result<Option<ConversationRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, owner, created_at, updated_at FROM conversations
             WHERE id = ?1 AND owner = ?2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("SELECT conversation", e))?;

        match row {
            Some(ref r) => Ok(Some(Self::row_to_conversation(r)?)),
            None => Ok(None),
        }
    }

    async fn list_conversations(&self, owner: &str) -> Result<Vec<ConversationRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, owner, created_at, updated_at FROM conversations
             WHERE owner = ?1
             ORDER BY updated_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("SELECT conversations", e))?;

        rows.iter().map(Self::row_to_conversation).collect()
    }

    async fn append_message(
        &self,
        conversation_id: i64,
        owner: &str,
        role: StoredRole,
        content: &str,
    ) -> Result<StoredMessage, StoreError> {
        let now = Utc::now().to_rfc3339();

        // Insert the row and bump the conversation atomically, so a
        // half-recorded turn can never survive a crash.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("BEGIN append", e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO messages (conversation_id, owner, role, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, conversation_id, owner, role, content, created_at
            "#,
        )
        .bind(conversation_id)
        .bind(owner)
        .bind(role.as_str())
        .bind(content)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_err("INSERT message", e))?;

        sqlx::query("UPDATE conversations SET updated_at = ?1 WHERE id = ?2")
            .bind(&now)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("UPDATE conversation timestamp", e))?;

        tx.commit().await.map_err(|e| db_err("COMMIT append", e))?;

        Self::row_to_message(&row)
    }

    async fn recent_messages(
        &self,
        conversation_id: i64,
        limit: u32,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, owner, role, content, created_at FROM messages
             WHERE conversation_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )
        .bind(conversation_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("SELECT recent messages", e))?;

        let mut messages: Vec<StoredMessage> =
            rows.iter().map(Self::row_to_message).collect::<Result<_, _>>()?;
        messages.reverse(); // newest-first query, oldest-first result
        Ok(messages)
    }

    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<StoredMessage>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, owner, role, content, created_at FROM messages
             WHERE conversation_id = ?1
             ORDER BY id",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("SELECT messages", e))?;

        rows.iter().map(Self::row_to_message).collect()
    }
}

// ── TaskStore ───────────────────────────────────────────────────────────────

#[async_trait]
impl TaskStore for SqliteStore {
    async fn create_task(&self, owner: &str, task: NewTask) -> Result<TaskRecord, StoreError> {
        let now = Utc::now().to_rfc3339();
        let row = sqlx::query(
            r#"
            INSERT INTO tasks (owner, title, description, completed, priority, category, created_at, updated_at)
            VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?6)
            RETURNING id, owner, title, description, completed, priority, category, created_at, updated_at
            "#,
        )
        .bind(owner)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(task.category.as_str())
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("INSERT task", e))?;

        let task = Self::row_to_task(&row)?;
        debug!(task_id = task.id, "Created task");
        Ok(task)
    }

    async fn list_tasks(
        &self,
        owner: &str,
        filter: TaskFilter,
    ) -> Result<Vec<TaskRecord>, StoreError> {
        let mut sql = String::from(
            "SELECT id, owner, title, description, completed, priority, category, created_at, updated_at
             FROM tasks WHERE owner = ?",
        );
        match filter.status {
            StatusFilter::Pending => sql.push_str(" AND completed = 0"),
            StatusFilter::Completed => sql.push_str(" AND completed = 1"),
            StatusFilter::All => {}
        }
        if filter.priority.is_some() {
            sql.push_str(" AND priority = ?");
        }
        if filter.category.is_some() {
            sql.push_str(" AND category = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut query = sqlx::query(&sql).bind(owner);
        if let Some(priority) = filter.priority {
            query = query.bind(priority.as_str());
        }
        if let Some(category) = filter.category {
            query = query.bind(category.as_str());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_err("SELECT tasks", e))?;

        rows.iter().map(Self::row_to_task).collect()
    }

    async fn set_completed(
        &self,
        owner: &str,
        task_id: i64,
        completed: bool,
    ) -> Result<TaskRecord, StoreError> {
        let now = Utc::now().to_rfc3339();
        let row = sqlx::query(
            r#"
            UPDATE tasks SET completed = ?1, updated_at = ?2
            WHERE id = ?3 AND owner = ?4
            RETURNING id, owner, title, description, completed, priority, category, created_at, updated_at
            "#,
        )
        .bind(completed)
        .bind(&now)
        .bind(task_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("UPDATE task completion", e))?;

        match row {
            Some(ref r) => Self::row_to_task(r),
            None => Err(StoreError::NotFound {
                what: format!("task {task_id}"),
            }),
        }
    }

    async fn update_task(
        &self,
        owner: &str,
        task_id: i64,
        patch: TaskPatch,
    ) -> Result<TaskRecord, StoreError> {
        let now = Utc::now().to_rfc3339();
        // COALESCE keeps the stored value wherever the patch is None.
        let row = sqlx::query(
            r#"
            UPDATE tasks SET
                title       = COALESCE(?1, title),
                description = COALESCE(?2, description),
                priority    = COALESCE(?3, priority),
                category    = COALESCE(?4, category),
                updated_at  = ?5
            WHERE id = ?6 AND owner = ?7
            RETURNING id, owner, title, description, completed, priority, category, created_at, updated_at
            "#,
        )
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.priority.map(TaskPriority::as_str))
        .bind(patch.category.map(TaskCategory::as_str))
        .bind(&now)
        .bind(task_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("UPDATE task", e))?;

        match row {
            Some(ref r) => Self::row_to_task(r),
            None => Err(StoreError::NotFound {
                what: format!("task {task_id}"),
            }),
        }
    }

    async fn delete_task(&self, owner: &str, task_id: i64) -> Result<TaskRecord, StoreError> {
        let row = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE id = ?1 AND owner = ?2
            RETURNING id, owner, title, description, completed, priority, category, created_at, updated_at
            "#,
        )
        .bind(task_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("DELETE task", e))?;

        match row {
            Some(ref r) => Self::row_to_task(r),
            None => Err(StoreError::NotFound {
                what: format!("task {task_id}"),
            }),
        }
    }
}
