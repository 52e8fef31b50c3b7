//! The plan-first agent — a fixed upfront plan worked step by step.
//!
//! One planning pass produces a strict-JSON list of step descriptions.
//! The action phase works only on the current step; after each action an
//! observe-time completeness check decides whether to advance the step
//! index. When the plan is exhausted the output phase synthesizes the
//! final answer from the full scratchpad.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stride_core::driver::{Driver, DriverInput, ToolChoice};
use stride_core::error::{Error, Result};
use stride_core::message::Message;
use stride_core::tool::{Tool, ToolSchema};
use tracing::{debug, info};

use crate::executor::{AgentExecution, ExecutionStream};
use crate::finish::with_finish_tool;
use crate::machine::{
    compose_task, describe_calls, dispatch_tool_calls, NextStep, Observed, StateMachine,
    StepOutcome,
};
use crate::output::{AgentOutput, AgentResult, AgentStep, StepKind};

const PLAN_PROMPT: &str = r#"WRITE A BRIEF PLAN FOR WHAT YOU SHOULD DO AT THIS POINT IN TIME.

The output must be a single JSON object conforming to the schema below, with no surrounding prose.

{"type": "object", "properties": {"steps": {"type": "array", "items": {"type": "string"}, "description": "List of steps to take to complete the task"}}, "required": ["steps"]}"#;

const STEP_CHECK_SCHEMA: &str = r#"The output must be a single JSON object conforming to the schema below, with no surrounding prose.

{"type": "object", "properties": {"complete": {"type": "boolean", "description": "true if the current step is complete"}}, "required": ["complete"]}"#;

const OUTPUT_PROMPT: &str =
    "GIVEN YOUR PROGRESS, PRODUCE A FINAL RESULT THAT BEST ANSWERS THE ORIGINAL USER TASK.";

/// The strict-JSON shape of the upfront plan.
#[derive(Debug, Serialize, Deserialize)]
struct PlanSteps {
    steps: Vec<String>,
}

/// The strict-JSON shape of the completeness check.
#[derive(Debug, Serialize, Deserialize)]
struct StepCheck {
    complete: bool,
}

/// A plan-first agent. Same public surface as the reactive [`crate::Agent`].
pub struct PlanAgent {
    driver: Arc<dyn Driver>,
    name: String,
    description: String,
    tools: Vec<Arc<dyn Tool>>,
    max_iterations: u32,
    is_entry: bool,
}

impl PlanAgent {
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

    /// Set the maximum number of act/observe cycles per execution.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Mark this agent as the entry point for multi-agent composition.
    pub fn with_is_entry(mut self, is_entry: bool) -> Self {
        self.is_entry = is_entry;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_entry(&self) -> bool {
        self.is_entry
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Start a streaming execution.
    pub fn stream(&self, task: &str, input: Option<&str>) -> ExecutionStream<PlannerMachine> {
        info!(
            agent = %self.name,
            max_iterations = self.max_iterations,
            "Starting plan-first execution"
        );
        let machine = PlannerMachine::new(
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

/// The plan-first state machine. One instance per execution.
pub struct PlannerMachine {
    driver: Arc<dyn Driver>,
    tools: Vec<Arc<dyn Tool>>,
    memory: Vec<Message>,
    next_step: NextStep,
    plan: Vec<String>,
    step_index: usize,
}

impl PlannerMachine {
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
            plan: Vec::new(),
            step_index: 0,
        }
    }

    fn catalog(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema().clone()).collect()
    }

    /// The step currently being worked on.
    fn current_step(&self) -> Result<&str> {
        self.plan
            .get(self.step_index)
            .map(String::as_str)
            .ok_or_else(|| Error::Config {
                message: "Action state reached past the end of the plan".into(),
            })
    }

    /// Ask the driver a question whose answer must be strict JSON.
    async fn generate_json<T: for<'de> Deserialize<'de>>(&self, prompt: &str) -> Result<T> {
        let mut messages = self.memory.clone();
        messages.push(Message::system(prompt));

        let response = self
            .driver
            .generate(DriverInput::text(messages).at_temperature(0.0))
            .await?;

        let content = response.content.unwrap_or_default();
        Ok(serde_json::from_str(&content)?)
    }

    async fn plan(&mut self) -> Result<StepOutcome> {
        let parsed: PlanSteps = self.generate_json(PLAN_PROMPT).await?;
        debug!(steps = parsed.steps.len(), "Upfront plan generated");

        self.plan = parsed.steps;
        self.next_step = if self.plan.is_empty() {
            NextStep::Output
        } else {
            NextStep::Action
        };

        let listing = self
            .plan
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {step}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(StepOutcome::step(AgentOutput::Step(AgentStep::new(
            StepKind::Plan,
            listing,
        ))))
    }

    async fn action(&mut self) -> Result<StepOutcome> {
        let current = self.current_step()?.to_string();
        let prompt = format!("WORK ON THE CURRENT STEP ONLY (DO NOT MOVE AHEAD):\n\n{current}");

        let mut messages = self.memory.clone();
        messages.push(Message::system(prompt));

        let response = self
            .driver
            .generate(
                DriverInput::with_tools(messages, self.catalog(), ToolChoice::Auto)
                    .at_temperature(0.0),
            )
            .await?;

        self.next_step = NextStep::Observe;

        if response.tool_calls.is_empty() {
            let content = response.content.unwrap_or_default();
            self.memory.push(Message::assistant(&content));
            return Ok(StepOutcome::step(AgentOutput::Step(AgentStep::new(
                StepKind::Action,
                content,
            ))));
        }

        let calls = response.tool_calls;
        let description = describe_calls(&calls);

        match dispatch_tool_calls(&self.driver, &self.memory, &self.tools, &calls).await? {
            Observed::Finished(result) => {
                Ok(StepOutcome::cycle_end(AgentOutput::Result(result)))
            }
            Observed::Observations { messages, texts } => {
                self.memory
                    .push(Message::assistant_tool_calls(response.content, calls));
                self.memory.extend(messages);
                Ok(StepOutcome::step(AgentOutput::Step(AgentStep::new(
                    StepKind::Action,
                    format!("{description}\n\n{}", texts.join("\n\n")),
                ))))
            }
        }
    }

    async fn observe(&mut self) -> Result<StepOutcome> {
        let current = self.current_step()?.to_string();
        let prompt = format!(
            "DO YOU BELIEVE THAT THE CURRENT STEP HAS BEEN COMPLETED?\n\n\
             CURRENT STEP: {current}\n\n{STEP_CHECK_SCHEMA}"
        );

        let check: StepCheck = self.generate_json(&prompt).await?;

        let content = if check.complete {
            self.step_index += 1;
            self.next_step = if self.step_index >= self.plan.len() {
                NextStep::Output
            } else {
                NextStep::Action
            };
            format!("Completed step: {current}")
        } else {
            self.next_step = NextStep::Action;
            format!("Continuing step: {current}")
        };

        Ok(StepOutcome::cycle_end(AgentOutput::Step(AgentStep::new(
            StepKind::Observe,
            content,
        ))))
    }

    async fn output(&mut self) -> Result<StepOutcome> {
        let mut messages = self.memory.clone();
        messages.push(Message::system(OUTPUT_PROMPT));

        let response = self
            .driver
            .generate(DriverInput::text(messages).at_temperature(0.0))
            .await?;

        Ok(StepOutcome::cycle_end(AgentOutput::Result(AgentResult {
            content: response.content.unwrap_or_default(),
        })))
    }
}

#[async_trait]
impl StateMachine for PlannerMachine {
    async fn transition(&mut self) -> Result<StepOutcome> {
        match self.next_step {
            NextStep::Plan => self.plan().await,
            NextStep::Action => self.action().await,
            NextStep::Observe => self.observe().await,
            NextStep::Output => self.output().await,
        }
    }
}
