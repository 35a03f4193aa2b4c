//! Conversation lifecycle and the bounded context window.
//!
//! The gateway never talks to `ChatStore` directly for chat traffic; it goes
//! through this manager so owner checks and the history window stay in one
//! place.

use std::sync::Arc;
use taskmind_core::chat::{ChatStore, ConversationRecord, StoredMessage, StoredRole};
use taskmind_core::error::StoreError;
use tracing::debug;

/// Opens conversations and replays their recent history.
#[derive(Clone)]
pub struct HistoryManager {
    chat: Arc<dyn ChatStore>,
    window: u32,
}

impl HistoryManager {
    /// `window` is the maximum number of stored messages replayed per turn.
    pub fn new(chat: Arc<dyn ChatStore>, window: u32) -> Self {
        Self { chat, window }
    }

    /// Create a conversation, or load an existing one.
    ///
    /// A conversation that exists but belongs to a different owner resolves
    /// to `StoreError::NotFound`, same as one that never existed.
    pub async fn open(
        &self,
        owner: &str,
        conversation_id: Option<i64>,
    ) -> Result<ConversationRecord, StoreError> {
        match conversation_id {
            None => {
                let conversation = self.chat.create_conversation(owner).await?;
                debug!(conversation_id = conversation.id, "Started new conversation");
                Ok(conversation)
            }
            Some(id) => self
                .chat
                .get_conversation(id, owner)
                .await?
                .ok_or_else(|| StoreError::NotFound {
                    what: format!("conversation {id}"),
                }),
        }
    }

    /// The most recent messages of a conversation, oldest first, capped at
    /// the configured window. Older messages are simply not replayed.
    pub async fn context_window(
        &self,
        conversation: &ConversationRecord,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        self.chat
            .recent_messages(conversation.id, self.window)
            .await
    }

    /// Persist a user message.
    pub async fn record_user(
        &self,
        conversation: &ConversationRecord,
        content: &str,
    ) -> Result<StoredMessage, StoreError> {
        self.chat
            .append_message(conversation.id, &conversation.owner, StoredRole::User, content)
            .await
    }

    /// Persist an assistant reply.
    pub async fn record_assistant(
        &self,
        conversation: &ConversationRecord,
        content: &str,
    ) -> Result<StoredMessage, StoreError> {
        self.chat
            .append_message(
                conversation.id,
                &conversation.owner,
                StoredRole::Assistant,
                content,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteStore;

    async fn test_history(window: u32) -> HistoryManager {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();
        HistoryManager::new(Arc::new(store), window)
    }

    #[tokio::test]
    async fn open_without_id_creates() {
        let history = test_history(50).await;
        let conv = history.open("alice", None).await.unwrap();
        assert_eq!(conv.owner, "alice");

        let again = history.open("alice", Some(conv.id)).await.unwrap();
        assert_eq!(again.id, conv.id);
    }

    #[tokio::test]
    async fn open_foreign_conversation_is_not_found() {
        let history = test_history(50).await;
        let conv = history.open("alice", None).await.unwrap();

        let err = history.open("mallory", Some(conv.id)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn open_missing_conversation_is_not_found() {
        let history = test_history(50).await;
        let err = history.open("alice", Some(404)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn context_window_truncates_oldest() {
        let history = test_history(4).await;
        let conv = history.open("alice", None).await.unwrap();

        for i in 0..6 {
            history.record_user(&conv, &format!("u{i}")).await.unwrap();
        }

        let window = history.context_window(&conv).await.unwrap();
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].content, "u2");
        assert_eq!(window[3].content, "u5");
    }

    #[tokio::test]
    async fn records_carry_roles() {
        let history = test_history(50).await;
        let conv = history.open("alice", None).await.unwrap();

        history.record_user(&conv, "add milk to my list").await.unwrap();
        history.record_assistant(&conv, "Added!").await.unwrap();

        let window = history.context_window(&conv).await.unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].role, StoredRole::User);
        assert_eq!(window[1].role, StoredRole::Assistant);
        assert_eq!(window[1].owner, "alice");
    }
}
