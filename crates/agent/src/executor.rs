//! The execution driver: runs a state machine to completion or to the
//! iteration cap.
//!
//! Streaming is pull-based. Each `next().await` runs exactly one
//! state-machine transition and yields its output; the consumer cancels by
//! dropping the stream — an already-issued driver or tool call simply runs
//! to completion.

use stride_core::error::{Error, Result};
use tracing::{debug, info, warn};

use crate::machine::StateMachine;
use crate::output::{AgentOutput, AgentResult, AgentStep};

/// The non-streaming return value: every intermediate step plus exactly
/// one terminal result.
#[derive(Debug, Clone)]
pub struct AgentExecution {
    pub steps: Vec<AgentStep>,
    pub result: AgentResult,
}

/// A pull-based stream of [`AgentOutput`]s over one execution.
///
/// Ends at the first [`AgentOutput::Result`]. If `max_iterations` full
/// cycles elapse without one, the next pull yields
/// [`Error::MaxIterationsExceeded`] — the budget is a hard failure, never
/// a silently truncated answer.
pub struct ExecutionStream<M: StateMachine> {
    machine: M,
    max_iterations: u32,
    cycles: u32,
    finished: bool,
}

impl<M: StateMachine> ExecutionStream<M> {
    pub(crate) fn new(machine: M, max_iterations: u32) -> Self {
        Self {
            machine,
            max_iterations,
            cycles: 0,
            finished: false,
        }
    }

    /// Advance the machine one transition. Returns `None` once the stream
    /// has yielded a result or an error.
    pub async fn next(&mut self) -> Option<Result<AgentOutput>> {
        if self.finished {
            return None;
        }

        // `cycles` only advances at a cycle boundary, so this can only
        // trip when the machine is about to start a fresh cycle.
        if self.cycles >= self.max_iterations {
            self.finished = true;
            warn!(
                limit = self.max_iterations,
                "Iteration budget exhausted without a result"
            );
            return Some(Err(Error::MaxIterationsExceeded {
                limit: self.max_iterations,
            }));
        }

        match self.machine.transition().await {
            Ok(outcome) => {
                if outcome.end_of_cycle {
                    self.cycles += 1;
                    debug!(cycle = self.cycles, "Cycle complete");
                }
                if outcome.output.is_result() {
                    self.finished = true;
                    info!(cycles = self.cycles, "Execution complete");
                }
                Some(Ok(outcome.output))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }

    /// Drain the stream, collecting steps until the terminal result.
    pub async fn collect(mut self) -> Result<AgentExecution> {
        let mut steps = Vec::new();

        while let Some(item) = self.next().await {
            match item? {
                AgentOutput::Step(step) => steps.push(step),
                AgentOutput::Result(result) => return Ok(AgentExecution { steps, result }),
            }
        }

        // The stream only ends after a result or an error, so this is the
        // exhausted-budget case surfacing through a fully drained stream.
        Err(Error::MaxIterationsExceeded {
            limit: self.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{StepOutcome, StateMachine};
    use crate::output::StepKind;
    use async_trait::async_trait;

    /// A machine that emits `cycles_of` steps per cycle and never finishes.
    struct EndlessMachine {
        per_cycle: u32,
        emitted: u32,
    }

    #[async_trait]
    impl StateMachine for EndlessMachine {
        async fn transition(&mut self) -> Result<StepOutcome> {
            self.emitted += 1;
            let output = AgentOutput::Step(AgentStep::new(
                StepKind::Plan,
                format!("step {}", self.emitted),
            ));
            if self.emitted % self.per_cycle == 0 {
                Ok(StepOutcome::cycle_end(output))
            } else {
                Ok(StepOutcome::step(output))
            }
        }
    }

    /// A machine that finishes on its n-th transition.
    struct FinishingMachine {
        remaining: u32,
    }

    #[async_trait]
    impl StateMachine for FinishingMachine {
        async fn transition(&mut self) -> Result<StepOutcome> {
            if self.remaining == 0 {
                return Ok(StepOutcome::cycle_end(AgentOutput::Result(AgentResult {
                    content: "done".into(),
                })));
            }
            self.remaining -= 1;
            Ok(StepOutcome::cycle_end(AgentOutput::Step(AgentStep::new(
                StepKind::Action,
                "working",
            ))))
        }
    }

    #[tokio::test]
    async fn cap_fires_after_exactly_n_cycles() {
        let mut stream = ExecutionStream::new(
            EndlessMachine {
                per_cycle: 3,
                emitted: 0,
            },
            2,
        );

        // 2 cycles of 3 transitions each are allowed through.
        for _ in 0..6 {
            let item = stream.next().await.unwrap();
            assert!(item.is_ok());
        }
        // The 7th pull is the budget failure.
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, Error::MaxIterationsExceeded { limit: 2 }));
        // And the stream is over.
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn zero_budget_fails_before_any_transition() {
        let mut stream = ExecutionStream::new(
            EndlessMachine {
                per_cycle: 1,
                emitted: 0,
            },
            0,
        );
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, Error::MaxIterationsExceeded { limit: 0 }));
    }

    #[tokio::test]
    async fn stream_ends_at_first_result() {
        let mut stream = ExecutionStream::new(FinishingMachine { remaining: 2 }, 10);

        let mut outputs = Vec::new();
        while let Some(item) = stream.next().await {
            outputs.push(item.unwrap());
        }

        assert_eq!(outputs.len(), 3);
        assert!(outputs[2].is_result());
    }

    #[tokio::test]
    async fn collect_bundles_steps_and_result() {
        let stream = ExecutionStream::new(FinishingMachine { remaining: 2 }, 10);
        let execution = stream.collect().await.unwrap();
        assert_eq!(execution.steps.len(), 2);
        assert_eq!(execution.result.content, "done");
    }

    #[tokio::test]
    async fn collect_surfaces_the_cap_error() {
        let stream = ExecutionStream::new(
            EndlessMachine {
                per_cycle: 1,
                emitted: 0,
            },
            3,
        );
        let err = stream.collect().await.unwrap_err();
        assert!(matches!(err, Error::MaxIterationsExceeded { limit: 3 }));
    }
}
