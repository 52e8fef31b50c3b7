//! Message domain types.
//!
//! A conversation with the model is an ordered sequence of role-tagged
//! messages. Assistant turns may carry tool calls; tool turns answer a
//! specific call via `tool_call_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (agent role, prompts)
    System,
    /// The end user (the task)
    User,
    /// The model
    Assistant,
    /// Tool execution result
    Tool,
}

/// A tool call requested by the model.
///
/// `arguments` is the serialized JSON object exactly as the backend
/// produced it; it is decoded (and checked against the tool's schema)
/// just before invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque call ID, assigned by the driver backend
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON string
    pub arguments: String,
}

/// A single message in the agent's scratchpad.
///
/// Invariant: a `Role::Tool` message always carries the `tool_call_id` of a
/// tool call emitted by a preceding assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content, absent on assistant turns that only call tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn base(role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::base(Role::System)
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::base(Role::User)
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::base(Role::Assistant)
        }
    }

    /// Create an assistant message carrying tool calls.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content,
            tool_calls,
            ..Self::base(Role::Assistant)
        }
    }

    /// Create a tool result message answering `tool_call_id`.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_call_id: Some(tool_call_id.into()),
            ..Self::base(Role::Tool)
        }
    }
}
