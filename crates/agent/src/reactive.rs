//! The reactive agent — Plan → Act → Observe with no upfront plan.
//!
//! Each cycle asks the model for a short free-text plan, then for tool
//! calls (or a direct answer), then dispatches and condenses whatever the
//! model requested. The loop ends when the model calls `agent_finish` or
//! the iteration budget runs out.

use std::sync::Arc;

use async_trait::async_trait;
use stride_core::driver::{Driver, DriverInput, ToolChoice};
use stride_core::error::{Error, Result};
use stride_core::message::{Message, ToolCall};
use stride_core::tool::{Tool, ToolSchema};
use tracing::{debug, info};

use crate::executor::{AgentExecution, ExecutionStream};
use crate::finish::with_finish_tool;
use crate::machine::{
    compose_task, describe_calls, dispatch_tool_calls, NextStep, Observed, StateMachine,
    StepOutcome,
};
use crate::output::{AgentOutput, AgentStep, StepKind};

const ACTION_PROMPT: &str = "USE THE GIVEN TOOLS TO EXECUTE YOUR PLAN.";

/// A reactive Plan-Act-Observe agent.
///
/// Configuration is immutable after construction; all runtime state lives
/// in the machine built fresh for each execution, so nothing leaks between
/// unrelated tasks.
#[derive(Debug)]
pub struct Agent {
    driver: Arc<dyn Driver>,
    name: String,
    description: String,
    tools: Vec<Arc<dyn Tool>>,
    max_iterations: u32,
    is_entry: bool,
}

impl Agent {
    /// Create a new agent. The finish tool is appended to `tools` exactly
    /// once; the effective catalog is validated eagerly.
    pub fn new(
        driver: Arc<dyn Driver>,
        name: impl Into<String>,
        description: impl Into<String>,
        tools: Vec<Arc<dyn Tool>>,
    ) -> Result<Self> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(Error::Config {
                message: "Agent must have a role description".into(),
            });
        }

        Ok(Self {
            driver,
            name: name.into(),
            description,
            tools: with_finish_tool(tools)?,
            max_iterations: 10,
            is_entry: false,
        })
    }

    /// Set the maximum number of plan/act/observe cycles per execution.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Mark this agent as the entry point for multi-agent composition.
    /// The flag is carried but unused by the loop itself.
    pub fn with_is_entry(mut self, is_entry: bool) -> Self {
        self.is_entry = is_entry;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_entry(&self) -> bool {
        self.is_entry
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Names of the effective tool catalog, in the order the model sees.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Start a streaming execution: a pull-based stream of outputs ending
    /// at the first result.
    pub fn stream(&self, task: &str, input: Option<&str>) -> ExecutionStream<ReactiveMachine> {
        info!(
            agent = %self.name,
            max_iterations = self.max_iterations,
            "Starting execution"
        );
        let machine = ReactiveMachine::new(
            self.driver.clone(),
            &self.description,
            self.tools.clone(),
            task,
            input,
        );
        ExecutionStream::new(machine, self.max_iterations)
    }

    /// Run to completion, collecting every step and the final result.
    pub async fn execute(&self, task: &str, input: Option<&str>) -> Result<AgentExecution> {
        self.stream(task, input).collect().await
    }
}

/// Tool calls handed from the action phase to the observe phase.
struct PendingCalls {
    content: Option<String>,
    calls: Vec<ToolCall>,
}

/// The reactive state machine. One instance per execution.
pub struct ReactiveMachine {
    driver: Arc<dyn Driver>,
    tools: Vec<Arc<dyn Tool>>,
    memory: Vec<Message>,
    next_step: NextStep,
    pending: Option<PendingCalls>,
}

impl ReactiveMachine {
    fn new(
        driver: Arc<dyn Driver>,
        description: &str,
        tools: Vec<Arc<dyn Tool>>,
        task: &str,
        input: Option<&str>,
    ) -> Self {
        let memory = vec![
            Message::system(description),
            Message::user(compose_task(task, input)),
        ];
        Self {
            driver,
            tools,
            memory,
            next_step: NextStep::Plan,
            pending: None,
        }
    }

    fn catalog(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema().clone()).collect()
    }

    async fn plan(&mut self) -> Result<StepOutcome> {
        let tools_json = serde_json::to_string(&self.catalog())?;
        let prompt = format!(
            "YOU CAN USE THE FOLLOWING TOOLS:\n{tools_json}\n\n\
             WRITE A BRIEF PLAN FOR WHAT YOU SHOULD DO AT THIS POINT IN TIME:"
        );

        let mut messages = self.memory.clone();
        messages.push(Message::system(prompt));

        let response = self.driver.generate(DriverInput::text(messages)).await?;
        let plan = response.content.unwrap_or_default();

        self.memory.push(Message::assistant(&plan));
        self.next_step = NextStep::Action;

        Ok(StepOutcome::step(AgentOutput::Step(AgentStep::new(
            StepKind::Plan,
            plan,
        ))))
    }

    async fn action(&mut self) -> Result<StepOutcome> {
        let mut messages = self.memory.clone();
        messages.push(Message::system(ACTION_PROMPT));

        let response = self
            .driver
            .generate(DriverInput::with_tools(
                messages,
                self.catalog(),
                ToolChoice::Auto,
            ))
            .await?;

        // No tool calls: the model's text is this iteration's leaf answer.
        if response.tool_calls.is_empty() {
            let content = response.content.unwrap_or_default();
            self.memory.push(Message::assistant(&content));
            self.next_step = NextStep::Plan;
            return Ok(StepOutcome::cycle_end(AgentOutput::Step(AgentStep::new(
                StepKind::Action,
                content,
            ))));
        }

        debug!(count = response.tool_calls.len(), "Model requested tool calls");
        let description = describe_calls(&response.tool_calls);
        self.pending = Some(PendingCalls {
            content: response.content,
            calls: response.tool_calls,
        });
        self.next_step = NextStep::Observe;

        Ok(StepOutcome::step(AgentOutput::Step(AgentStep::new(
            StepKind::Action,
            format!("Calling the following tools:\n{description}"),
        ))))
    }

    async fn observe(&mut self) -> Result<StepOutcome> {
        let Some(pending) = self.pending.take() else {
            return Err(Error::Config {
                message: "Observe state reached with no pending tool calls".into(),
            });
        };

        match dispatch_tool_calls(&self.driver, &self.memory, &self.tools, &pending.calls).await? {
            Observed::Finished(result) => {
                Ok(StepOutcome::cycle_end(AgentOutput::Result(result)))
            }
            Observed::Observations { messages, texts } => {
                self.memory
                    .push(Message::assistant_tool_calls(pending.content, pending.calls));
                self.memory.extend(messages);
                self.next_step = NextStep::Plan;
                Ok(StepOutcome::cycle_end(AgentOutput::Step(AgentStep::new(
                    StepKind::Observe,
                    texts.join("\n\n"),
                ))))
            }
        }
    }
}

#[async_trait]
impl StateMachine for ReactiveMachine {
    async fn transition(&mut self) -> Result<StepOutcome> {
        match self.next_step {
            NextStep::Plan => self.plan().await,
            NextStep::Action => self.action().await,
            NextStep::Observe => self.observe().await,
            NextStep::Output => unreachable!("the reactive loop never schedules the output state"),
        }
    }
}
