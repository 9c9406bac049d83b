//! Orchestrator state and cycle transitions

use crate::models::{Bssid, CycleState, Mode, Mood};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Attacks needed before the agent can look smart
const SMART_MIN_ATTACKS: u64 = 10;
const SMART_SUCCESS_RATE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid cycle transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: CycleState,
    pub to: CycleState,
}

/// The single orchestrator context, mutated only by the orchestrator task
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorState {
    pub mode: Mode,
    pub cycle_state: CycleState,
    pub current_target: Option<Bssid>,
    pub cycle_count: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub paused: bool,
    /// Attacks completed in this session
    pub attacks: u64,
    /// Handshakes captured in this session
    pub handshakes: u64,
    /// Result of the most recent capability probe
    pub last_probe_ok: bool,
    pub mood: Mood,
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self::new(Mode::Simulation)
    }
}

impl OrchestratorState {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            cycle_state: CycleState::Idle,
            current_target: None,
            cycle_count: 0,
            last_cycle_at: None,
            paused: false,
            attacks: 0,
            handshakes: 0,
            last_probe_ok: false,
            mood: Mood::Learning,
        }
    }

    /// Whether `from -> to` is an edge of the attack cycle
    pub fn is_valid_transition(from: CycleState, to: CycleState) -> bool {
        use CycleState::*;
        matches!(
            (from, to),
            (Idle, Selecting)
                | (Selecting, Idle)
                | (Selecting, Attacking)
                | (Attacking, AwaitingResult)
                | (Attacking, Recording)
                | (AwaitingResult, Recording)
                | (Recording, Idle)
        )
    }

    /// Move to `next`, returning the previous state
    pub fn transition(&mut self, next: CycleState) -> Result<CycleState, InvalidTransition> {
        let from = self.cycle_state;
        if !Self::is_valid_transition(from, next) {
            return Err(InvalidTransition { from, to: next });
        }
        self.cycle_state = next;
        self.mood = match next {
            CycleState::Selecting => Mood::Hunting,
            CycleState::Attacking => Mood::Attacking,
            _ => self.mood,
        };
        Ok(from)
    }

    /// Force IDLE and clear the in-flight target
    pub fn reset_to_idle(&mut self) {
        self.cycle_state = CycleState::Idle;
        self.current_target = None;
    }

    /// Count a finished attack and pick the resulting mood
    pub fn record_attack(&mut self, succeeded: bool) {
        self.attacks = self.attacks.saturating_add(1);
        if succeeded {
            self.handshakes = self.handshakes.saturating_add(1);
        }
        let smart =
            self.attacks >= SMART_MIN_ATTACKS && self.success_rate() >= SMART_SUCCESS_RATE;
        self.mood = if smart {
            Mood::Smart
        } else if succeeded {
            Mood::Excited
        } else {
            Mood::Thinking
        };
    }

    /// Note a cycle that ended without a target
    pub fn record_idle_cycle(&mut self) {
        self.mood = Mood::Learning;
    }

    /// Close the current cycle at `at`
    pub fn finish_cycle(&mut self, at: DateTime<Utc>) {
        self.cycle_count = self.cycle_count.saturating_add(1);
        self.last_cycle_at = Some(at);
        self.current_target = None;
    }

    pub fn success_rate(&self) -> f64 {
        if self.attacks == 0 {
            0.0
        } else {
            self.handshakes as f64 / self.attacks as f64
        }
    }
}
