//! End-to-end scenarios for the TaskMind chat service.
//!
//! Each test drives the real HTTP router with a scripted provider and an
//! in-memory SQLite store, so one scenario covers the whole path: bearer
//! auth, conversation lookup, the reasoning-and-tools loop, and persistence.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use taskmind_agent::TurnRunner;
use taskmind_core::chat::{ChatStore, StoredRole};
use taskmind_core::error::ProviderError;
use taskmind_core::message::{Message, Role, ToolCallRequest};
use taskmind_core::provider::{Provider, ProviderRequest, ProviderResponse};
use taskmind_core::task::{TaskFilter, TaskStore};
use taskmind_gateway::auth::{issue_token, AuthVerifier};
use taskmind_gateway::{build_router, GatewayState, SharedState};
use taskmind_store::{HistoryManager, SqliteStore};
use taskmind_tools::ToolCatalog;
use tower::ServiceExt;

const SECRET: &str = "e2e-signing-secret";

// ── Scripted provider ───────────────────────────────────────────────────

/// Plays canned responses in order and records every request it saw.
struct ScriptedProvider {
    script: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(script: Vec<ProviderResponse>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, index: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e-scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            return Err(ProviderError::MalformedResponse("script exhausted".into()));
        }
        Ok(script.remove(0))
    }
}

/// Never answers inside any sane test budget.
struct StalledProvider;

#[async_trait::async_trait]
impl Provider for StalledProvider {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(text_response("too late"))
    }
}

fn text_response(reply: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(reply),
        usage: None,
        model: "e2e-model".into(),
    }
}

fn tool_response(name: &str, arguments: serde_json::Value) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_calls(
            "",
            vec![ToolCallRequest {
                id: "call_1".into(),
                name: name.into(),
                arguments: arguments.to_string(),
            }],
        ),
        usage: None,
        model: "e2e-model".into(),
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────

async fn state_with(provider: Arc<dyn Provider>) -> SharedState {
    let store = Arc::new(SqliteStore::new("sqlite::memory:").await.unwrap());
    let catalog = Arc::new(ToolCatalog::new(store.clone()));
    let runner = Arc::new(TurnRunner::new(provider, catalog, "e2e-model"));
    Arc::new(GatewayState {
        runner,
        history: HistoryManager::new(store.clone(), 50),
        store,
        verifier: AuthVerifier::new(SECRET),
    })
}

fn bearer(user: &str) -> String {
    format!("Bearer {}", issue_token(SECRET, user, None).unwrap())
}

fn chat_request(user: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/{user}/chat"))
        .header("content-type", "application/json")
        .header("authorization", bearer(user))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// ── E2E: tool-backed chat ───────────────────────────────────────────────

#[tokio::test]
async fn e2e_chat_creates_task_and_replies() {
    let provider = ScriptedProvider::new(vec![
        tool_response("add_task", json!({"title": "Buy milk"})),
        text_response("Done! I've added \"Buy milk\" to your list."),
    ]);
    let state = state_with(provider.clone()).await;
    let app = build_router(state.clone());

    let response = app
        .oneshot(chat_request("alice", json!({"message": "add buy milk"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["response"], "Done! I've added \"Buy milk\" to your list.");
    assert_eq!(body["tool_calls"][0]["name"], "add_task");
    assert!(body["conversation_id"].as_i64().unwrap() > 0);

    // One reasoning round to call the tool, one to phrase the answer.
    assert_eq!(provider.calls(), 2);
    // The first request carried the persona plus the user message.
    assert_eq!(provider.request(0).messages.len(), 2);
    assert_eq!(provider.request(0).messages[0].role, Role::System);

    // The side effect is durable and owner-scoped.
    let tasks = state
        .store
        .list_tasks("alice", TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Buy milk");
    assert_eq!(tasks[0].owner, "alice");
}

#[tokio::test]
async fn e2e_follow_up_turn_replays_history() {
    let provider = ScriptedProvider::new(vec![
        tool_response("add_task", json!({"title": "Buy milk"})),
        text_response("Added \"Buy milk\" to your list."),
        text_response("Just one: buy milk."),
    ]);
    let state = state_with(provider.clone()).await;
    let app = build_router(state.clone());

    let response = app
        .clone()
        .oneshot(chat_request(
            "alice",
            json!({"message": "Add a task to buy milk"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = read_json(response).await;
    let conversation_id = first["conversation_id"].as_i64().unwrap();

    let response = app
        .oneshot(chat_request(
            "alice",
            json!({"message": "What's on my list?", "conversation_id": conversation_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = read_json(response).await;
    assert_eq!(second["conversation_id"].as_i64().unwrap(), conversation_id);
    assert_eq!(second["response"], "Just one: buy milk.");

    // The second turn's request replayed the stored exchange verbatim.
    let replay = provider.request(2).messages;
    assert_eq!(replay.len(), 4);
    assert_eq!(replay[1].content, "Add a task to buy milk");
    assert_eq!(replay[2].role, Role::Assistant);
    assert_eq!(replay[2].content, "Added \"Buy milk\" to your list.");
    assert_eq!(replay[3].content, "What's on my list?");

    // Both exchanges are in the transcript, oldest first.
    let messages = state.store.list_messages(conversation_id).await.unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].role, StoredRole::User);
    assert_eq!(messages[1].role, StoredRole::Assistant);
    assert_eq!(messages[3].content, "Just one: buy milk.");
}

#[tokio::test]
async fn e2e_add_then_delete_across_turns() {
    let provider = ScriptedProvider::new(vec![
        tool_response("add_task", json!({"title": "Buy milk"})),
        text_response("Added it."),
        // Fresh database, so the first task id is 1.
        tool_response("delete_task", json!({"task_id": 1})),
        text_response("Gone. Your list is empty again."),
    ]);
    let state = state_with(provider.clone()).await;
    let app = build_router(state.clone());

    let response = app
        .clone()
        .oneshot(chat_request("alice", json!({"message": "add buy milk"})))
        .await
        .unwrap();
    let conversation_id = read_json(response).await["conversation_id"]
        .as_i64()
        .unwrap();

    let response = app
        .oneshot(chat_request(
            "alice",
            json!({"message": "actually, remove it", "conversation_id": conversation_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["tool_calls"][0]["name"], "delete_task");
    assert!(body["tool_calls"][0]["error"].is_null());

    let tasks = state
        .store
        .list_tasks("alice", TaskFilter::default())
        .await
        .unwrap();
    assert!(tasks.is_empty());
}

// ── E2E: failures the loop absorbs ──────────────────────────────────────

#[tokio::test]
async fn e2e_missing_task_error_reaches_the_model() {
    let provider = ScriptedProvider::new(vec![
        tool_response("complete_task", json!({"task_id": 4242})),
        text_response("I couldn't find that task. Could you check the id?"),
    ]);
    let state = state_with(provider.clone()).await;
    let app = build_router(state);

    let response = app
        .oneshot(chat_request("alice", json!({"message": "mark 4242 done"})))
        .await
        .unwrap();

    // A failed tool call is not a failed turn.
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(
        body["response"],
        "I couldn't find that task. Could you check the id?"
    );
    assert_eq!(body["tool_calls"][0]["error"]["kind"], "not_found");
    assert!(body["tool_calls"][0].get("output").is_none());

    // Round two replayed the structured failure for the model to read.
    let replay = provider.request(1).messages;
    let tool_entry = replay.iter().find(|m| m.role == Role::Tool).unwrap();
    assert!(tool_entry.content.contains("not_found"));
}

#[tokio::test]
async fn e2e_reasoning_stall_returns_503_but_keeps_the_message() {
    let store = Arc::new(SqliteStore::new("sqlite::memory:").await.unwrap());
    let catalog = Arc::new(ToolCatalog::new(store.clone()));
    let runner = TurnRunner::new(Arc::new(StalledProvider), catalog, "e2e-model")
        .with_reasoning_timeout(Duration::from_millis(50));
    let state = Arc::new(GatewayState {
        runner: Arc::new(runner),
        history: HistoryManager::new(store.clone(), 50),
        store,
        verifier: AuthVerifier::new(SECRET),
    });
    let app = build_router(state.clone());

    let response = app
        .oneshot(chat_request("alice", json!({"message": "hello?"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = read_json(response).await;
    assert_eq!(body["error"]["kind"], "orchestrator_timeout");

    // The user's message survived, so a retry picks up where they left off.
    let conversations = state.store.list_conversations("alice").await.unwrap();
    assert_eq!(conversations.len(), 1);
    let messages = state
        .store
        .list_messages(conversations[0].id)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, StoredRole::User);
    assert_eq!(messages[0].content, "hello?");
}

// ── E2E: guardrails before any model call ───────────────────────────────

#[tokio::test]
async fn e2e_overlength_message_rejected_up_front() {
    let provider = ScriptedProvider::new(vec![]);
    let state = state_with(provider.clone()).await;
    let app = build_router(state.clone());

    let response = app
        .oneshot(chat_request("alice", json!({"message": "x".repeat(6000)})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json(response).await;
    assert_eq!(body["error"]["kind"], "validation_error");
    assert_eq!(
        body["error"]["message"],
        "Message cannot exceed 5000 characters"
    );

    // Rejected before the provider or the store saw anything.
    assert_eq!(provider.calls(), 0);
    assert!(state
        .store
        .list_conversations("alice")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn e2e_foreign_conversation_is_invisible() {
    let provider = ScriptedProvider::new(vec![]);
    let state = state_with(provider.clone()).await;
    let app = build_router(state.clone());

    let bobs = state.store.create_conversation("bob").await.unwrap();

    let response = app
        .oneshot(chat_request(
            "alice",
            json!({"message": "hi", "conversation_id": bobs.id}),
        ))
        .await
        .unwrap();

    // Same 404 as a conversation that never existed.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["error"]["kind"], "not_found");

    assert_eq!(provider.calls(), 0);
    let messages = state.store.list_messages(bobs.id).await.unwrap();
    assert!(messages.is_empty());
}

// ── E2E: minted tokens against the live router ──────────────────────────

#[tokio::test]
async fn e2e_minted_token_opens_the_api_for_its_user_only() {
    let state = state_with(ScriptedProvider::new(vec![])).await;
    let app = build_router(state);

    // Carol's own token works and her list starts empty.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/carol/conversations")
                .header("authorization", bearer("carol"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, json!([]));

    // The same token does not open anyone else's history.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/dave/conversations")
                .header("authorization", bearer("carol"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json(response).await;
    assert_eq!(body["error"]["kind"], "owner_mismatch");
}
