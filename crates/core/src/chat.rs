//! Persisted chat rows and the storage trait behind them.
//!
//! Conversations and messages are the only request-scoped state in the
//! system and they live exclusively in the database: any process instance
//! can serve any request. Messages are append-only; a row is never updated
//! after it is written.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum chat message length, in characters.
pub const MESSAGE_MAX_CHARS: usize = 5000;

/// A conversation row. The owner is fixed at creation and never changes;
/// `updated_at` is bumped whenever a message is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: i64,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The closed set of roles a persisted message may carry.
///
/// System and tool transcript entries are rebuilt per turn and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredRole {
    User,
    Assistant,
}

impl StoredRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for StoredRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message row. Immutable once written; cascade-deleted with its
/// conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub conversation_id: i64,
    pub owner: String,
    pub role: StoredRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Durable storage for conversations and messages.
///
/// Every read is owner-scoped where an owner is given; a conversation that
/// exists but belongs to someone else is indistinguishable from one that
/// does not exist.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Create a fresh conversation for `owner`.
    async fn create_conversation(&self, owner: &str) -> Result<ConversationRecord, StoreError>;

    /// Load a conversation if it exists and belongs to `owner`.
    async fn get_conversation(
        &self,
        id: i64,
        owner: &str,
    ) -> Result<Option<ConversationRecord>, StoreError>;

    /// All of `owner`'s conversations, most recently updated first.
    async fn list_conversations(&self, owner: &str) -> Result<Vec<ConversationRecord>, StoreError>;

    /// Append a message and bump the conversation's `updated_at` in one
    /// transaction.
    async fn append_message(
        &self,
        conversation_id: i64,
        owner: &str,
        role: StoredRole,
        content: &str,
    ) -> Result<StoredMessage, StoreError>;

    /// The most recent `limit` messages of a conversation, oldest first.
    async fn recent_messages(
        &self,
        conversation_id: i64,
        limit: u32,
    ) -> Result<Vec<StoredMessage>, StoreError>;

    /// Every message of a conversation, oldest first.
    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<StoredMessage>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_role_round_trips_through_text() {
        assert_eq!(StoredRole::parse("user"), Some(StoredRole::User));
        assert_eq!(StoredRole::parse("assistant"), Some(StoredRole::Assistant));
        assert_eq!(StoredRole::User.as_str(), "user");
        assert_eq!(StoredRole::Assistant.to_string(), "assistant");
    }

    #[test]
    fn stored_role_rejects_transcript_only_roles() {
        assert_eq!(StoredRole::parse("system"), None);
        assert_eq!(StoredRole::parse("tool"), None);
        assert_eq!(StoredRole::parse(""), None);
    }
}
