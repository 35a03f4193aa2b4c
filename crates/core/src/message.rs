//! Transcript types exchanged with the reasoning provider.
//!
//! These are ephemeral, per-turn value objects: the orchestrator rebuilds a
//! transcript from persisted rows on every request and throws it away when
//! the turn ends. Persisted chat rows live in [`crate::chat`].

use serde::{Deserialize, Serialize};

/// The role of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (assistant persona, tool guidance)
    System,
    /// The end user
    User,
    /// The reasoning provider's output
    Assistant,
    /// A structured tool execution result
    Tool,
}

/// A single transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who produced this entry
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,

    /// For tool results, the id of the call being answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create an assistant message with no tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create an assistant message carrying requested tool calls.
    pub fn assistant_with_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a tool result answering the call with `tool_call_id`.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A raw tool call as requested by the reasoning provider.
///
/// `arguments` is the unparsed JSON text; the tool catalog parses it against
/// the closed operation set at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned id for this call
    pub id: String,

    /// Name of the requested tool
    pub name: String,

    /// Arguments as a JSON string
    pub arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Add a task to buy milk");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Add a task to buy milk");
        assert!(msg.tool_calls.is_empty());
        assert!(msg.tool_call_id.is_none());
    }

    #[test]
    fn tool_result_carries_call_id() {
        let msg = Message::tool_result("call_1", r#"{"task_id":1}"#);
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn assistant_with_calls_keeps_order() {
        let calls = vec![
            ToolCallRequest {
                id: "a".into(),
                name: "list_tasks".into(),
                arguments: "{}".into(),
            },
            ToolCallRequest {
                id: "b".into(),
                name: "complete_task".into(),
                arguments: r#"{"task_id":2}"#.into(),
            },
        ];
        let msg = Message::assistant_with_calls("", calls);
        assert_eq!(msg.tool_calls.len(), 2);
        assert_eq!(msg.tool_calls[0].name, "list_tasks");
        assert_eq!(msg.tool_calls[1].name, "complete_task");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Role::Tool).unwrap(), "\"tool\"");
    }
}
