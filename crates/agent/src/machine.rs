//! The agent state machine scaffolding.
//!
//! Both agent variants are explicit finite-state machines: an enumerated
//! [`NextStep`] field plus a transition function keyed on it. All mutable
//! execution state (scratchpad, pending calls, step index) lives in the
//! machine struct, scoped to one execution and rebuilt for the next.

use std::sync::Arc;

use async_trait::async_trait;
use stride_core::driver::{Driver, DriverInput};
use stride_core::error::{Error, Result, ToolError};
use stride_core::message::{Message, ToolCall};
use stride_core::tool::Tool;
use tracing::{debug, warn};

use crate::finish::FINISH_TOOL_NAME;
use crate::output::{AgentOutput, AgentResult};

/// The state the machine will run on its next transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Plan,
    Action,
    Observe,
    /// Final-answer synthesis; only the plan-first variant reaches it.
    Output,
}

/// The product of one transition.
pub struct StepOutcome {
    pub output: AgentOutput,
    /// True when this transition hands control back to the top of the
    /// loop — the execution driver charges one iteration against the
    /// budget at each cycle boundary.
    pub end_of_cycle: bool,
}

impl StepOutcome {
    pub fn step(output: AgentOutput) -> Self {
        Self {
            output,
            end_of_cycle: false,
        }
    }

    pub fn cycle_end(output: AgentOutput) -> Self {
        Self {
            output,
            end_of_cycle: true,
        }
    }
}

/// A state machine the execution driver can advance one transition at a
/// time. Each transition issues at most a handful of driver/tool calls and
/// produces exactly one [`AgentOutput`].
#[async_trait]
pub trait StateMachine: Send {
    async fn transition(&mut self) -> Result<StepOutcome>;
}

/// Merge optional caller input into the task text.
pub(crate) fn compose_task(task: &str, input: Option<&str>) -> String {
    match input {
        Some(extra) => format!("{task}\n\nSOME INFO YOU ARE GIVEN TO START THE TASK:\n{extra}"),
        None => task.to_string(),
    }
}

/// What a dispatched batch of tool calls produced.
#[derive(Debug)]
pub(crate) enum Observed {
    /// The finish tool was invoked; execution is over.
    Finished(AgentResult),
    /// Every call ran and was condensed. `messages` are the tool-role
    /// turns to append after the assistant turn that requested them;
    /// `texts` are the condensed observation strings in call order.
    Observations {
        messages: Vec<Message>,
        texts: Vec<String>,
    },
}

/// Dispatch a batch of tool calls, strictly in the order the model
/// returned them.
///
/// Every name is resolved against the catalog before anything is invoked;
/// an unmatched name is fatal and no tool runs. The finish tool ends the
/// batch immediately, ignoring any calls after it. Every other result is
/// condensed through a follow-up driver call before it is stored — the
/// backpressure that keeps raw tool output (full page scrapes and the
/// like) out of the model's context window.
pub(crate) async fn dispatch_tool_calls(
    driver: &Arc<dyn Driver>,
    memory: &[Message],
    tools: &[Arc<dyn Tool>],
    calls: &[ToolCall],
) -> Result<Observed> {
    for call in calls {
        if !tools.iter().any(|t| t.name() == call.name) {
            warn!(tool = %call.name, "Model requested a tool that is not registered");
            return Err(Error::ToolMismatch {
                name: call.name.clone(),
            });
        }
    }

    let mut messages = Vec::new();
    let mut texts = Vec::new();

    for call in calls {
        let Some(tool) = tools.iter().find(|t| t.name() == call.name) else {
            return Err(Error::ToolMismatch {
                name: call.name.clone(),
            });
        };

        let args: serde_json::Value = serde_json::from_str(&call.arguments).map_err(|e| {
            ToolError::InvalidArguments(format!(
                "Arguments for '{}' are not valid JSON: {e}",
                call.name
            ))
        })?;
        tool.schema().validate_args(&args)?;

        if call.name == FINISH_TOOL_NAME {
            debug!("Finish tool invoked, ending execution");
            let content = tool.invoke(args).await?;
            return Ok(Observed::Finished(AgentResult { content }));
        }

        debug!(tool = %call.name, id = %call.id, "Invoking tool");
        let raw = tool.invoke(args).await?;

        let observation = condense(driver, memory, &raw).await?;
        messages.push(Message::tool_result(&call.id, &observation));
        texts.push(observation);
    }

    Ok(Observed::Observations { messages, texts })
}

/// Ask the driver to compress raw tool output into a short observation.
async fn condense(driver: &Arc<dyn Driver>, memory: &[Message], raw: &str) -> Result<String> {
    let prompt = format!("EXTRACT THE MOST RELEVANT INFORMATION FROM THE FOLLOWING:\n\n{raw}");

    let mut messages = memory.to_vec();
    messages.push(Message::system(prompt));

    let response = driver
        .generate(DriverInput::text(messages).at_temperature(0.0))
        .await?;

    Ok(response.content.unwrap_or_default())
}

/// One line per call, e.g. `google_search({"query":"rust"})`.
pub(crate) fn describe_calls(calls: &[ToolCall]) -> String {
    calls
        .iter()
        .map(|c| format!("{}({})", c.name, c.arguments))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{make_tool_call, text_response, CountingEchoTool, ScriptedDriver};

    fn echo_catalog() -> (Vec<Arc<dyn Tool>>, Arc<CountingEchoTool>) {
        let echo = Arc::new(CountingEchoTool::new());
        let tools: Vec<Arc<dyn Tool>> = vec![echo.clone(), Arc::new(crate::finish::FinishTool::new())];
        (tools, echo)
    }

    #[test]
    fn compose_task_merges_input() {
        let merged = compose_task("Find X", Some("X lives in Y"));
        assert!(merged.starts_with("Find X"));
        assert!(merged.contains("X lives in Y"));
        assert_eq!(compose_task("Find X", None), "Find X");
    }

    #[test]
    fn describe_calls_one_line_per_call() {
        let calls = vec![
            make_tool_call("c1", "echo_tool", serde_json::json!({"text": "a"})),
            make_tool_call("c2", "echo_tool", serde_json::json!({"text": "b"})),
        ];
        let desc = describe_calls(&calls);
        assert_eq!(desc.lines().count(), 2);
        assert!(desc.contains("echo_tool"));
    }

    #[tokio::test]
    async fn unmatched_name_is_fatal_before_any_invocation() {
        let (tools, echo) = echo_catalog();
        let driver: Arc<dyn Driver> = Arc::new(ScriptedDriver::new(vec![]));
        let calls = vec![
            make_tool_call("c1", "echo_tool", serde_json::json!({"text": "hi"})),
            make_tool_call("c2", "no_such_tool", serde_json::json!({})),
        ];

        let err = dispatch_tool_calls(&driver, &[], &tools, &calls)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolMismatch { ref name } if name == "no_such_tool"));
        assert_eq!(echo.invocations(), 0, "no tool may run when any name is unmatched");
    }

    #[tokio::test]
    async fn finish_short_circuits_remaining_calls() {
        let (tools, echo) = echo_catalog();
        let driver: Arc<dyn Driver> = Arc::new(ScriptedDriver::new(vec![]));
        let calls = vec![
            make_tool_call("c1", FINISH_TOOL_NAME, serde_json::json!({"result": "done"})),
            make_tool_call("c2", "echo_tool", serde_json::json!({"text": "hi"})),
        ];

        match dispatch_tool_calls(&driver, &[], &tools, &calls).await.unwrap() {
            Observed::Finished(result) => assert_eq!(result.content, "done"),
            Observed::Observations { .. } => panic!("Expected finish"),
        }
        assert_eq!(echo.invocations(), 0);
    }

    #[tokio::test]
    async fn results_are_condensed_not_stored_verbatim() {
        let (tools, _echo) = echo_catalog();
        let driver: Arc<dyn Driver> =
            Arc::new(ScriptedDriver::new(vec![text_response("CONDENSED: hi")]));
        let calls = vec![make_tool_call(
            "c1",
            "echo_tool",
            serde_json::json!({"text": "raw raw raw"}),
        )];

        match dispatch_tool_calls(&driver, &[], &tools, &calls).await.unwrap() {
            Observed::Observations { messages, texts } => {
                assert_eq!(texts, vec!["CONDENSED: hi".to_string()]);
                assert_eq!(messages.len(), 1);
                assert_eq!(messages[0].tool_call_id.as_deref(), Some("c1"));
                assert_eq!(messages[0].content.as_deref(), Some("CONDENSED: hi"));
            }
            Observed::Finished(_) => panic!("Expected observations"),
        }
    }

    #[tokio::test]
    async fn invalid_json_arguments_are_rejected() {
        let (tools, echo) = echo_catalog();
        let driver: Arc<dyn Driver> = Arc::new(ScriptedDriver::new(vec![]));
        let calls = vec![ToolCall {
            id: "c1".into(),
            name: "echo_tool".into(),
            arguments: "not json".into(),
        }];

        let err = dispatch_tool_calls(&driver, &[], &tools, &calls)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Tool(ToolError::InvalidArguments(_))));
        assert_eq!(echo.invocations(), 0);
    }

    #[tokio::test]
    async fn missing_required_argument_is_rejected() {
        let (tools, echo) = echo_catalog();
        let driver: Arc<dyn Driver> = Arc::new(ScriptedDriver::new(vec![]));
        let calls = vec![make_tool_call("c1", "echo_tool", serde_json::json!({}))];

        let err = dispatch_tool_calls(&driver, &[], &tools, &calls)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Tool(ToolError::InvalidArguments(_))));
        assert_eq!(echo.invocations(), 0);
    }
}
