//! Attack orchestration
//!
//! A single orchestrator task owns the cycle state and the learning model.
//! It selects one target at a time, runs the attack through the backend for
//! the current mode and feeds the outcome back into the model. Mode changes,
//! operator commands and shutdown are only honored at IDLE boundaries.

mod config;
mod control;
mod engine;
mod mode;
mod state;

#[cfg(test)]
mod tests;

pub use config::OrchestratorConfig;
pub use control::{Command, ControlError, ControlHandle, COMMAND_CAPACITY};
pub use engine::{CycleOutcome, CycleReport, Orchestrator, OrchestratorBuilder};
pub use mode::{decide, ModeDecision, ModeDetector, ModePreference};
pub use state::{InvalidTransition, OrchestratorState};
