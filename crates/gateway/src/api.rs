//! The chat API — everything nested under `/api/{user_id}`.
//!
//! Endpoints:
//!
//! - `POST /api/{user_id}/chat`        — send a message, get the reply
//! - `POST /api/{user_id}/chat/stream` — send a message, get SSE events
//! - `GET  /api/{user_id}/conversations` — list conversations, newest activity first
//! - `GET  /api/{user_id}/conversations/{conversation_id}` — one full transcript
//!
//! The auth middleware has already established who the caller is; every
//! handler still checks that the `{user_id}` in the path matches, so a valid
//! token never reads another user's data.

use axum::extract::{Path, State};
use axum::response::sse::{Event as SseEvent, Sse};
use axum::response::Json;
use axum::routing::{get, post};
use axum::{Extension, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use taskmind_core::chat::{ChatStore, ConversationRecord, StoredMessage, StoredRole, MESSAGE_MAX_CHARS};
use taskmind_core::tool::ToolCallSummary;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};

use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::SharedState;

/// Streamed replies are re-chunked into SSE events of at most this many
/// characters.
const STREAM_CHUNK_CHARS: usize = 48;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the chat API router. Nest this under "/api" in the main router.
pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/{user_id}/chat", post(chat_handler))
        .route("/{user_id}/chat/stream", post(chat_stream_handler))
        .route("/{user_id}/conversations", get(list_conversations_handler))
        .route(
            "/{user_id}/conversations/{conversation_id}",
            get(get_conversation_handler),
        )
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatRequest {
    /// The user's message.
    message: String,
    /// Existing conversation id (omit to start a new one).
    #[serde(default)]
    conversation_id: Option<i64>,
}

#[derive(Serialize)]
struct ChatResponse {
    conversation_id: i64,
    response: String,
    tool_calls: Vec<ToolCallSummary>,
}

#[derive(Serialize)]
struct ConversationDto {
    id: i64,
    user_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ConversationDetailDto {
    id: i64,
    user_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    messages: Vec<MessageDto>,
}

#[derive(Serialize)]
struct MessageDto {
    id: i64,
    role: StoredRole,
    content: String,
    created_at: DateTime<Utc>,
}

fn conversation_dto(record: ConversationRecord) -> ConversationDto {
    ConversationDto {
        id: record.id,
        user_id: record.owner,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

fn message_dto(message: StoredMessage) -> MessageDto {
    MessageDto {
        id: message.id,
        role: message.role,
        content: message.content,
        created_at: message.created_at,
    }
}

// ── Guards ────────────────────────────────────────────────────────────────

/// Reject a path addressing someone other than the authenticated caller.
fn check_owner(caller: &AuthedUser, user_id: &str) -> Result<(), ApiError> {
    if caller.0 != user_id {
        return Err(ApiError::OwnerMismatch);
    }
    Ok(())
}

/// Validate the message body. Runs before anything is persisted, so a
/// rejected request leaves no trace.
fn check_message(message: &str) -> Result<(), ApiError> {
    if message.trim().is_empty() {
        return Err(ApiError::Validation("Message cannot be empty".into()));
    }
    if message.chars().count() > MESSAGE_MAX_CHARS {
        return Err(ApiError::Validation(format!(
            "Message cannot exceed {MESSAGE_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

// ── Chat handlers ─────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedState>,
    Extension(caller): Extension<AuthedUser>,
    Path(user_id): Path<String>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    check_owner(&caller, &user_id)?;
    check_message(&payload.message)?;

    info!(
        conversation = ?payload.conversation_id,
        message_len = payload.message.len(),
        "chat request"
    );

    let conversation = state.history.open(&user_id, payload.conversation_id).await?;
    // The window is read before the new message is recorded; the runner
    // appends the user message to its transcript itself.
    let history = state.history.context_window(&conversation).await?;
    state
        .history
        .record_user(&conversation, &payload.message)
        .await?;

    let outcome = state
        .runner
        .run(&user_id, &history, &payload.message)
        .await?;

    state
        .history
        .record_assistant(&conversation, &outcome.reply)
        .await?;

    Ok(Json(ChatResponse {
        conversation_id: conversation.id,
        response: outcome.reply,
        tool_calls: outcome.tool_calls,
    }))
}

// ── SSE Streaming ─────────────────────────────────────────────────────────

/// Same turn as [`chat_handler`], delivered as an SSE stream: zero or more
/// `chunk` events, then exactly one `done` (or one `error`).
async fn chat_stream_handler(
    State(state): State<SharedState>,
    Extension(caller): Extension<AuthedUser>,
    Path(user_id): Path<String>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    check_owner(&caller, &user_id)?;
    check_message(&payload.message)?;

    let message = payload.message;
    let conversation = state.history.open(&user_id, payload.conversation_id).await?;
    let history = state.history.context_window(&conversation).await?;
    state.history.record_user(&conversation, &message).await?;

    info!(conversation = conversation.id, "chat stream request");

    let (tx, rx) = mpsc::channel::<Result<SseEvent, Infallible>>(16);

    // The turn finishes on its own task. Sends are allowed to fail: a client
    // that disconnects mid-stream must not stop the reply from being
    // recorded.
    let task_state = state.clone();
    tokio::spawn(async move {
        match task_state
            .runner
            .run(&conversation.owner, &history, &message)
            .await
        {
            Ok(outcome) => {
                for chunk in split_chunks(&outcome.reply, STREAM_CHUNK_CHARS) {
                    let event = SseEvent::default()
                        .event("chunk")
                        .data(json!({ "content": chunk }).to_string());
                    let _ = tx.send(Ok(event)).await;
                }

                if let Err(e) = task_state
                    .history
                    .record_assistant(&conversation, &outcome.reply)
                    .await
                {
                    error!(error = %e, "Failed to record streamed reply");
                }

                let done = json!({
                    "conversation_id": conversation.id,
                    "tool_calls": outcome.tool_calls,
                });
                let _ = tx
                    .send(Ok(SseEvent::default().event("done").data(done.to_string())))
                    .await;
            }
            Err(e) => {
                let err = ApiError::from(e);
                let body = json!({ "kind": err.kind(), "message": err.to_string() });
                let _ = tx
                    .send(Ok(SseEvent::default().event("error").data(body.to_string())))
                    .await;
            }
        }
    });

    Ok(Sse::new(ReceiverStream::new(rx)))
}

/// Split a reply into chunks of at most `size` characters, never splitting a
/// character.
fn split_chunks(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

// ── Conversation reads ────────────────────────────────────────────────────

async fn list_conversations_handler(
    State(state): State<SharedState>,
    Extension(caller): Extension<AuthedUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ConversationDto>>, ApiError> {
    check_owner(&caller, &user_id)?;

    let conversations = state
        .store
        .list_conversations(&user_id)
        .await?
        .into_iter()
        .map(conversation_dto)
        .collect();

    Ok(Json(conversations))
}

async fn get_conversation_handler(
    State(state): State<SharedState>,
    Extension(caller): Extension<AuthedUser>,
    Path((user_id, conversation_id)): Path<(String, i64)>,
) -> Result<Json<ConversationDetailDto>, ApiError> {
    check_owner(&caller, &user_id)?;

    // A conversation owned by someone else resolves to the same 404 as one
    // that never existed.
    let conversation = state.history.open(&user_id, Some(conversation_id)).await?;
    let messages = state.store.list_messages(conversation.id).await?;

    Ok(Json(ConversationDetailDto {
        id: conversation.id,
        user_id: conversation.owner,
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
        messages: messages.into_iter().map(message_dto).collect(),
    }))
}
