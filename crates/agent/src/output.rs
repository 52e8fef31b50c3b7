//! Agent output types.
//!
//! Everything an execution produces is an [`AgentOutput`]: either an
//! intermediate [`AgentStep`] (a plan, an action, an observation — no
//! termination meaning) or the terminal [`AgentResult`], which always ends
//! the execution.

use serde::{Deserialize, Serialize};

/// Which phase of the loop produced a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Plan,
    Action,
    Observe,
}

/// An intermediate artifact of one loop phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStep {
    pub kind: StepKind,
    pub content: String,
}

impl AgentStep {
    pub fn new(kind: StepKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }
}

/// The final answer of an execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub content: String,
}

/// One unit of agent output, streamed step by step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentOutput {
    Step(AgentStep),
    Result(AgentResult),
}

impl AgentOutput {
    /// Whether this output terminates the execution.
    pub fn is_result(&self) -> bool {
        matches!(self, AgentOutput::Result(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_is_not_terminal() {
        let out = AgentOutput::Step(AgentStep::new(StepKind::Plan, "search first"));
        assert!(!out.is_result());
    }

    #[test]
    fn result_is_terminal() {
        let out = AgentOutput::Result(AgentResult {
            content: "42".into(),
        });
        assert!(out.is_result());
    }

    #[test]
    fn output_serializes_tagged() {
        let out = AgentOutput::Step(AgentStep::new(StepKind::Observe, "saw it"));
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains(r#""type":"step""#));
        assert!(json.contains(r#""kind":"observe""#));
    }

    #[test]
    fn output_deserializes_result() {
        let json = r#"{"type":"result","content":"done"}"#;
        let out: AgentOutput = serde_json::from_str(json).unwrap();
        match out {
            AgentOutput::Result(r) => assert_eq!(r.content, "done"),
            other => panic!("Expected result, got {other:?}"),
        }
    }
}
