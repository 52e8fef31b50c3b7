//! Shared test helpers: a scripted mock driver and a counting echo tool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use stride_core::driver::{Driver, DriverInput, DriverResponse, Usage};
use stride_core::error::{DriverError, ToolError};
use stride_core::message::ToolCall;
use stride_core::tool::{ParamSpec, ParamType, Tool, ToolSchema};

/// A mock driver that returns a sequence of scripted responses.
///
/// Each call to `generate` returns the next response in the queue and
/// records the input it was given. Panics if more calls are made than
/// responses provided — a scripted test must account for every call,
/// including condensation follow-ups.
pub struct ScriptedDriver {
    responses: Mutex<Vec<DriverResponse>>,
    inputs: Mutex<Vec<DriverInput>>,
}

impl ScriptedDriver {
    pub fn new(responses: Vec<DriverResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// How many generate calls have been made.
    pub fn call_count(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    /// Snapshot of every input seen so far.
    pub fn inputs(&self) -> Vec<DriverInput> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Driver for ScriptedDriver {
    fn model(&self) -> &str {
        "scripted-mock"
    }

    async fn generate(&self, input: DriverInput) -> Result<DriverResponse, DriverError> {
        let mut inputs = self.inputs.lock().unwrap();
        let mut responses = self.responses.lock().unwrap();

        assert!(
            !responses.is_empty(),
            "ScriptedDriver: no more responses (call #{})",
            inputs.len() + 1,
        );

        inputs.push(input);
        Ok(responses.remove(0))
    }
}

/// A text-only response (no tool calls).
pub fn text_response(text: &str) -> DriverResponse {
    DriverResponse {
        content: Some(text.into()),
        tool_calls: Vec::new(),
        usage: Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        },
    }
}

/// A response carrying tool calls and optional text.
pub fn tool_call_response(content: Option<&str>, tool_calls: Vec<ToolCall>) -> DriverResponse {
    DriverResponse {
        content: content.map(String::from),
        tool_calls,
        usage: Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        },
    }
}

/// Build a tool call with serialized arguments.
pub fn make_tool_call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.into(),
        name: name.into(),
        arguments: args.to_string(),
    }
}

/// An echo tool that counts how many times it ran — lets tests assert
/// that nothing was invoked on a fatal dispatch path.
pub struct CountingEchoTool {
    schema: ToolSchema,
    invocations: AtomicUsize,
}

impl CountingEchoTool {
    pub fn new() -> Self {
        Self {
            schema: ToolSchema {
                name: "echo_tool".into(),
                description: "Echoes back the given text".into(),
                arguments: vec![ParamSpec::required("text", ParamType::String)],
            },
            invocations: AtomicUsize::new(0),
        }
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl Default for CountingEchoTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CountingEchoTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<String, ToolError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        args["text"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| ToolError::InvalidArguments("'text' must be a string".into()))
    }
}
