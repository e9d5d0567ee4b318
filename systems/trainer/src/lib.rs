#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure trainer-side driver system for Wavegrid episodes.
//!
//! The trainer consumes world events and responds with the next command
//! batch: one step command per resolved collapse, re-armed by environment
//! resets and halted by terminal events. It stands in for the external
//! reinforcement-learning loop at the same command/event boundary, so
//! adapters and integration tests can drive full episodes deterministically.

use wavegrid_core::{AdjustmentSignal, Command, Event};

/// Produces the adjustment signal supplied with each step command.
#[derive(Clone, Debug)]
pub enum AdjustmentPolicy {
    /// Emits the same signal on every step.
    Constant(AdjustmentSignal),
    /// Walks a fixed schedule step by step, holding the final entry once the
    /// schedule is exhausted.
    Schedule(Vec<AdjustmentSignal>),
}

impl AdjustmentPolicy {
    fn signal(&self, step_index: usize) -> AdjustmentSignal {
        match self {
            Self::Constant(signal) => *signal,
            Self::Schedule(signals) => signals
                .get(step_index)
                .or_else(|| signals.last())
                .copied()
                .unwrap_or_else(AdjustmentSignal::neutral),
        }
    }
}

/// Stateful pure system that drives generation one collapse at a time.
#[derive(Clone, Debug)]
pub struct Trainer {
    policy: AdjustmentPolicy,
    step_index: usize,
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(AdjustmentPolicy::Constant(AdjustmentSignal::neutral()))
    }
}

impl Trainer {
    /// Creates a new trainer using the supplied adjustment policy.
    #[must_use]
    pub fn new(policy: AdjustmentPolicy) -> Self {
        Self {
            policy,
            step_index: 0,
        }
    }

    /// Consumes world events and emits the next step command, if any.
    ///
    /// A reset re-arms the schedule and requests the first step; each
    /// resolved collapse requests the next one; completion, failure, and
    /// rejection end the episode's stepping until the next reset.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut wants_step = false;

        for event in events {
            match event {
                Event::EnvironmentReset { .. } => {
                    self.step_index = 0;
                    wants_step = true;
                }
                Event::CellCollapsed { .. } => wants_step = true,
                Event::GenerationCompleted { .. }
                | Event::GenerationFailed { .. }
                | Event::StepRejected { .. } => wants_step = false,
            }
        }

        if wants_step {
            let adjustment = self.policy.signal(self.step_index);
            self.step_index += 1;
            out.push(Command::StepGeneration { adjustment });
        }
    }
}
