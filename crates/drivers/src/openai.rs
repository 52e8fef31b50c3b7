//! OpenAI chat-completions driver.
//!
//! Marshals the driver contract onto the `/v1/chat/completions` endpoint:
//! messages, function-calling tool schemas, tool-choice policy, and usage
//! accounting. The model identifier is validated against the supported set
//! at construction, not at call time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stride_core::driver::{Driver, DriverInput, DriverResponse, ToolChoice, Usage};
use stride_core::error::DriverError;
use stride_core::message::{Message, Role, ToolCall};
use stride_core::tool::ToolSchema;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Models this driver accepts.
const SUPPORTED_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-4-turbo-2024-04-09",
    "gpt-4-turbo-preview",
    "gpt-4-0125-preview",
    "gpt-4-1106-preview",
    "gpt-4",
    "gpt-4-0613",
    "gpt-3.5-turbo",
    "gpt-3.5-turbo-0125",
    "gpt-3.5-turbo-1106",
    "gpt-3.5-turbo-0613",
];

/// A driver backed by the OpenAI chat-completions API.
#[derive(Debug)]
pub struct OpenAiDriver {
    model: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiDriver {
    /// Create a driver for `model`, failing eagerly if the model is not in
    /// the supported set.
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Result<Self, DriverError> {
        let model = model.into();
        if !SUPPORTED_MODELS.contains(&model.as_str()) {
            return Err(DriverError::ModelNotSupported(model));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create a driver with the API key taken from `OPENAI_API_KEY`.
    pub fn from_env(model: impl Into<String>) -> Result<Self, DriverError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            DriverError::AuthenticationFailed("OPENAI_API_KEY is not set".into())
        })?;
        Self::new(model, api_key)
    }

    /// Point at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert our messages to the wire format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::System => "system".into(),
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::Tool => "tool".into(),
                },
                content: m.content.clone(),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    /// Convert tool schemas to the function-calling wire format.
    fn to_api_tools(tools: &[ToolSchema]) -> Vec<serde_json::Value> {
        tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters_json(),
                    }
                })
            })
            .collect()
    }

    fn tool_choice_value(choice: ToolChoice) -> &'static str {
        match choice {
            ToolChoice::None => "none",
            ToolChoice::Auto => "auto",
            ToolChoice::Required => "required",
        }
    }
}

#[async_trait]
impl Driver for OpenAiDriver {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, input: DriverInput) -> Result<DriverResponse, DriverError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(&input.messages),
            "temperature": input.temperature,
        });

        if let Some(max_tokens) = input.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !input.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&input.tools));
            body["tool_choice"] = serde_json::json!(Self::tool_choice_value(input.tool_choice));
        }

        debug!(model = %self.model, messages = input.messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DriverError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(DriverError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(DriverError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Backend returned error");
            return Err(DriverError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| DriverError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::MalformedResponse("No choices in response".into()))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        let usage = api_response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(DriverResponse {
            content: choice.message.content,
            tool_calls,
            usage,
        })
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
