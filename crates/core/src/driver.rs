//! Driver trait — the abstraction over LLM backends.
//!
//! A driver turns an ordered message sequence (plus an optional tool menu)
//! into text or tool-call decisions. The agent loop calls `generate()`
//! without knowing which backend is behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DriverError;
use crate::message::{Message, ToolCall};
use crate::tool::ToolSchema;

/// Whether the model may, must, or must not call tools for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// The model must not call tools.
    None,
    /// The model decides.
    #[default]
    Auto,
    /// The model must call at least one tool.
    Required,
}

/// A request to the model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverInput {
    /// The conversation so far
    pub messages: Vec<Message>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature, 0.0 (deterministic) to 2.0
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Tools the model is allowed to call for this request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSchema>,

    /// Tool-choice policy; only meaningful when `tools` is non-empty
    #[serde(default)]
    pub tool_choice: ToolChoice,
}

fn default_temperature() -> f32 {
    0.7
}

impl DriverInput {
    /// A plain text request: no tools exposed, default temperature.
    pub fn text(messages: Vec<Message>) -> Self {
        Self {
            messages,
            max_tokens: None,
            temperature: default_temperature(),
            tools: Vec::new(),
            tool_choice: ToolChoice::None,
        }
    }

    /// A request exposing `tools` with the given choice policy.
    pub fn with_tools(messages: Vec<Message>, tools: Vec<ToolSchema>, choice: ToolChoice) -> Self {
        Self {
            messages,
            max_tokens: None,
            temperature: default_temperature(),
            tools,
            tool_choice: choice,
        }
    }

    /// Override the temperature.
    pub fn at_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Token usage accounting, all counts ≥ 0.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete response from the backend.
///
/// `content` and `tool_calls` are not mutually exclusive; both may be
/// absent if the model declines, though under [`ToolChoice::Required`]
/// at least one tool call is guaranteed by contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverResponse {
    /// Generated text, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool calls the model wants executed, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Token usage for this request
    pub usage: Usage,
}

/// The core Driver trait.
///
/// Transport-level failures propagate unmodified; the core never retries.
/// An unsupported model identifier is rejected eagerly at driver
/// construction, not here.
#[async_trait]
pub trait Driver: Send + Sync {
    /// The model identifier this driver was constructed with.
    fn model(&self) -> &str;

    /// Send a request and get a complete response.
    async fn generate(&self, input: DriverInput) -> Result<DriverResponse, DriverError>;
}

impl std::fmt::Debug for dyn Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("model", &self.model())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_input_defaults() {
        let input = DriverInput::text(vec![Message::user("hi")]);
        assert!((input.temperature - 0.7).abs() < f32::EPSILON);
        assert!(input.tools.is_empty());
        assert_eq!(input.tool_choice, ToolChoice::None);
        assert!(input.max_tokens.is_none());
    }

    #[test]
    fn temperature_override() {
        let input = DriverInput::text(vec![]).at_temperature(0.0);
        assert_eq!(input.temperature, 0.0);
    }

    #[test]
    fn tool_choice_serializes_lowercase() {
        let json = serde_json::to_string(&ToolChoice::Required).unwrap();
        assert_eq!(json, r#""required""#);
    }

    #[test]
    fn response_defaults_are_empty() {
        let resp = DriverResponse::default();
        assert!(resp.content.is_none());
        assert!(resp.tool_calls.is_empty());
        assert_eq!(resp.usage.total_tokens, 0);
    }
}
