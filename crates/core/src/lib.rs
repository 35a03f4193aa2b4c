//! # TaskMind Core
//!
//! Domain types, traits, and error definitions for the TaskMind assistant
//! backend. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod chat;
pub mod error;
pub mod message;
pub mod provider;
pub mod task;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use chat::{ChatStore, ConversationRecord, StoredMessage, StoredRole, MESSAGE_MAX_CHARS};
pub use error::{Error, ProviderError, Result, StoreError, ToolError};
pub use message::{Message, Role, ToolCallRequest};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use task::{
    NewTask, StatusFilter, TaskCategory, TaskFilter, TaskPatch, TaskPriority, TaskRecord,
    TaskStore, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS,
};
pub use tool::{ToolCallSummary, ToolFailure, ToolResult};
