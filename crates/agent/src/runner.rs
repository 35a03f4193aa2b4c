//! The bounded reasoning-and-tool-call loop for one chat turn.

use serde_json::{Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};
use taskmind_core::chat::{StoredMessage, StoredRole};
use taskmind_core::error::{ProviderError, StoreError, ToolError};
use taskmind_core::message::{Message, ToolCallRequest};
use taskmind_core::provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
use taskmind_core::tool::{ToolCallSummary, ToolResult};
use taskmind_tools::ToolCatalog;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::prompt;

/// Reasoning rounds before the loop gives up on tools.
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 6;

/// Budget for one reasoning call.
pub const DEFAULT_REASONING_TIMEOUT: Duration = Duration::from_secs(30);

/// Budget for one tool call.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(5);

/// Reply synthesized when the round cap is reached.
const ROUND_CAP_REPLY: &str = "I'm sorry, I couldn't finish working through that request. \
Could you try rephrasing it, or break it into smaller steps?";

/// The outcome of one completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant's final text reply
    pub reply: String,

    /// Every tool call performed this turn, in execution order
    pub tool_calls: Vec<ToolCallSummary>,

    /// Reasoning rounds used (1 = answered without tools)
    pub rounds: u32,
}

/// A turn-level failure.
///
/// Tool errors never appear here; they are folded into the transcript as
/// structured results the model can read. Only the reasoning side can abort
/// a turn, and the caller's message stays persisted, so a retry is safe.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("reasoning call exceeded {timeout_secs}s")]
    ReasoningTimeout { timeout_secs: u64 },

    #[error("reasoning call failed: {0}")]
    Reasoning(#[from] ProviderError),
}

impl TurnError {
    /// True when the turn failed waiting on the reasoning backend, which
    /// callers surface as an upstream-timeout response.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ReasoningTimeout { .. } | Self::Reasoning(ProviderError::Timeout(_))
        )
    }
}

/// Loop state for one turn.
enum TurnState {
    /// Waiting on the provider with the transcript so far
    Thinking,
    /// Executing the calls the provider requested, in order
    Invoking(Vec<ToolCallRequest>),
    /// Final reply produced
    Done(String),
}

/// Drives one user turn: reasoning rounds interleaved with sequential tool
/// execution, bounded by a round cap and per-step timeouts.
///
/// The runner holds no per-turn state; one instance is shared across
/// concurrent requests.
pub struct TurnRunner {
    provider: Arc<dyn Provider>,
    catalog: Arc<ToolCatalog>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_tool_rounds: u32,
    reasoning_timeout: Duration,
    tool_timeout: Duration,
    system_prompt: String,
}

impl TurnRunner {
    /// Create a runner with default limits and the standard system prompt.
    pub fn new(
        provider: Arc<dyn Provider>,
        catalog: Arc<ToolCatalog>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            catalog,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            reasoning_timeout: DEFAULT_REASONING_TIMEOUT,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            system_prompt: prompt::SYSTEM_PROMPT.to_string(),
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens per reasoning response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the reasoning round cap.
    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Set the budget for one reasoning call.
    pub fn with_reasoning_timeout(mut self, budget: Duration) -> Self {
        self.reasoning_timeout = budget;
        self
    }

    /// Set the budget for one tool call.
    pub fn with_tool_timeout(mut self, budget: Duration) -> Self {
        self.tool_timeout = budget;
        self
    }

    /// Replace the standard system prompt.
    pub fn with_system_prompt(mut self, prompt_text: impl Into<String>) -> Self {
        self.system_prompt = prompt_text.into();
        self
    }

    /// Run one turn for `owner`: prior messages plus the new user message
    /// in, final reply plus the record of performed tool calls out.
    ///
    /// The transcript lives only for the duration of this call; persisting
    /// the user message and the reply is the caller's job.
    pub async fn run(
        &self,
        owner: &str,
        history: &[StoredMessage],
        user_message: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let mut transcript = Vec::with_capacity(history.len() + 2);
        transcript.push(Message::system(&self.system_prompt));
        transcript.extend(history.iter().map(transcript_entry));
        transcript.push(Message::user(user_message));

        debug!(owner, history = history.len(), "starting chat turn");

        let tools = self.catalog.definitions();
        let mut summaries: Vec<ToolCallSummary> = Vec::new();
        let mut rounds = 0u32;

        let mut state = TurnState::Thinking;
        let reply = loop {
            state = match state {
                TurnState::Thinking => {
                    if rounds >= self.max_tool_rounds {
                        warn!(rounds, "tool round cap reached, synthesizing fallback reply");
                        break ROUND_CAP_REPLY.to_string();
                    }
                    rounds += 1;

                    let response = self.think(&transcript, &tools).await?;
                    if response.message.tool_calls.is_empty() {
                        TurnState::Done(response.message.content)
                    } else {
                        let mut message = response.message;
                        assign_call_ids(&mut message);
                        let calls = message.tool_calls.clone();
                        transcript.push(message);
                        TurnState::Invoking(calls)
                    }
                }
                TurnState::Invoking(calls) => {
                    for call in &calls {
                        let (result, summary) = self.invoke(owner, call).await;
                        transcript.push(Message::tool_result(
                            &result.call_id,
                            result.transcript_content(),
                        ));
                        summaries.push(summary);
                    }
                    TurnState::Thinking
                }
                TurnState::Done(reply) => break reply,
            };
        };

        info!(rounds, tool_calls = summaries.len(), "chat turn complete");
        Ok(TurnOutcome {
            reply,
            tool_calls: summaries,
            rounds,
        })
    }

    /// One reasoning round under the reasoning budget.
    async fn think(
        &self,
        transcript: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ProviderResponse, TurnError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: transcript.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: tools.to_vec(),
        };

        match timeout(self.reasoning_timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) => {
                if let Some(usage) = &response.usage {
                    debug!(
                        model = %response.model,
                        total_tokens = usage.total_tokens,
                        "reasoning round complete"
                    );
                }
                Ok(response)
            }
            Ok(Err(e)) => Err(TurnError::Reasoning(e)),
            Err(_) => Err(TurnError::ReasoningTimeout {
                timeout_secs: self.reasoning_timeout.as_secs(),
            }),
        }
    }

    /// Parse and execute one requested call, producing both the transcript
    /// entry fed back to the model and the caller-facing summary.
    async fn invoke(&self, owner: &str, call: &ToolCallRequest) -> (ToolResult, ToolCallSummary) {
        let input = summary_input(&call.arguments);

        let invocation = match self.catalog.parse(call) {
            Ok(invocation) => invocation,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "rejected tool call");
                return (
                    ToolResult::failed(&call.id, &call.name, &e),
                    ToolCallSummary::failure(&call.name, input, &e),
                );
            }
        };

        // The call runs on its own task: neither the tool budget elapsing
        // nor the request future being dropped may abort a mutation
        // mid-write, so the task always runs to completion.
        let catalog = Arc::clone(&self.catalog);
        let task_owner = owner.to_string();
        let mut handle =
            tokio::spawn(async move { catalog.execute(&task_owner, invocation).await });

        let started = Instant::now();
        let outcome = match timeout(self.tool_timeout, &mut handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join)) => Err(ToolError::Store(StoreError::Database(format!(
                "tool task failed: {join}"
            )))),
            Err(_) => Err(ToolError::Timeout {
                tool_name: call.name.clone(),
                timeout_secs: self.tool_timeout.as_secs(),
            }),
        };

        match outcome {
            Ok(payload) => {
                debug!(
                    tool = %call.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "tool call complete"
                );
                (
                    ToolResult::ok(&call.id, &call.name, payload.clone()),
                    ToolCallSummary::success(&call.name, input, payload),
                )
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool call failed");
                (
                    ToolResult::failed(&call.id, &call.name, &e),
                    ToolCallSummary::failure(&call.name, input, &e),
                )
            }
        }
    }
}

/// A persisted row as a transcript entry.
fn transcript_entry(stored: &StoredMessage) -> Message {
    match stored.role {
        StoredRole::User => Message::user(&stored.content),
        StoredRole::Assistant => Message::assistant(&stored.content),
    }
}

/// Backends occasionally omit call ids; synthesize them up front so the
/// assistant entry and its tool results stay linked in the transcript.
fn assign_call_ids(message: &mut Message) {
    for call in &mut message.tool_calls {
        if call.id.trim().is_empty() {
            call.id = format!("call_{}", Uuid::new_v4().simple());
        }
    }
}

/// The arguments as recorded in the caller-facing summary. Unparseable text
/// is carried as a raw string so the record survives a bad call.
fn summary_input(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
