//! Tool invocation result types.
//!
//! [`ToolResult`] is what the orchestrator feeds back into the transcript as
//! a tool-role entry; [`ToolCallSummary`] is the caller-facing record of one
//! call included in the chat response payload. The catalog of executable
//! operations itself lives in `taskmind-tools` as a closed enum.

use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// The structured outcome of one tool invocation, fed back to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call id this result answers
    pub call_id: String,

    /// The tool that was invoked (or requested, for protocol errors)
    pub name: String,

    /// Whether the invocation succeeded
    pub success: bool,

    /// Success value, or `{"error": {"kind", "message"}}` on failure
    pub payload: Value,
}

impl ToolResult {
    /// A successful invocation with its operation-specific payload.
    pub fn ok(call_id: impl Into<String>, name: impl Into<String>, payload: Value) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            success: true,
            payload,
        }
    }

    /// A failed invocation; the error is folded into a structured payload so
    /// the model can read it and recover conversationally.
    pub fn failed(call_id: impl Into<String>, name: impl Into<String>, error: &ToolError) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            success: false,
            payload: json!({
                "error": { "kind": error.kind(), "message": error.to_string() }
            }),
        }
    }

    /// The payload as transcript text for a tool-role message.
    pub fn transcript_content(&self) -> String {
        self.payload.to_string()
    }
}

/// One entry of the `tool_calls` array in the chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallSummary {
    /// Tool name as requested
    pub name: String,

    /// Parsed input arguments (raw text when parsing itself failed)
    pub input: Value,

    /// Success payload, absent on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,

    /// Failure detail, absent on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolFailure>,
}

/// Stable kind plus human-readable message for a failed call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: String,
    pub message: String,
}

impl ToolCallSummary {
    /// Record a successful call.
    pub fn success(name: impl Into<String>, input: Value, output: Value) -> Self {
        Self {
            name: name.into(),
            input,
            output: Some(output),
            error: None,
        }
    }

    /// Record a failed call.
    pub fn failure(name: impl Into<String>, input: Value, error: &ToolError) -> Self {
        Self {
            name: name.into(),
            input,
            output: None,
            error: Some(ToolFailure {
                kind: error.kind().to_string(),
                message: error.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_embeds_kind_and_message() {
        let err = ToolError::NotFound {
            what: "task 999".into(),
        };
        let result = ToolResult::failed("call_1", "complete_task", &err);

        assert!(!result.success);
        assert_eq!(result.payload["error"]["kind"], "not_found");
        assert_eq!(result.payload["error"]["message"], "task 999 not found");
    }

    #[test]
    fn transcript_content_is_compact_json() {
        let result = ToolResult::ok("call_1", "add_task", json!({"task_id": 1}));
        assert_eq!(result.transcript_content(), r#"{"task_id":1}"#);
    }

    #[test]
    fn summary_success_omits_error() {
        let summary =
            ToolCallSummary::success("add_task", json!({"title": "buy milk"}), json!({"task_id": 1}));
        let wire = serde_json::to_value(&summary).unwrap();

        assert_eq!(wire["name"], "add_task");
        assert_eq!(wire["output"]["task_id"], 1);
        assert!(wire.get("error").is_none());
    }

    #[test]
    fn summary_failure_omits_output() {
        let err = ToolError::UnknownTool {
            name: "send_email".into(),
        };
        let summary = ToolCallSummary::failure("send_email", json!({}), &err);
        let wire = serde_json::to_value(&summary).unwrap();

        assert!(wire.get("output").is_none());
        assert_eq!(wire["error"]["kind"], "protocol_error");
    }
}
