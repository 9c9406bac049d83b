//! Operator control channel
//!
//! Readers get point-in-time copies through `watch` channels; writers queue
//! commands that the orchestrator applies at IDLE boundaries.

use super::mode::ModePreference;
use crate::models::{Bssid, StatusSnapshot, TargetSummary};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

/// Default depth of the command queue
pub const COMMAND_CAPACITY: usize = 32;

/// Commands accepted from the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Use this BSSID at the next SELECTING
    Override(Bssid),
    ForceMode(ModePreference),
    Pause,
    Resume,
    /// Forget every learned history and persist the empty model
    ResetLearning,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("orchestrator is not running")]
    Unavailable,

    #[error("command queue is full")]
    Busy,
}

/// Cloneable handle for the dashboard and display
#[derive(Debug, Clone)]
pub struct ControlHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<StatusSnapshot>,
    targets: watch::Receiver<Vec<TargetSummary>>,
}

impl ControlHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        status: watch::Receiver<StatusSnapshot>,
        targets: watch::Receiver<Vec<TargetSummary>>,
    ) -> Self {
        Self {
            commands,
            status,
            targets,
        }
    }

    /// Latest published status
    pub fn status(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }

    /// Latest ranked target list
    pub fn targets(&self) -> Vec<TargetSummary> {
        self.targets.borrow().clone()
    }

    /// Receiver that wakes on every status publication
    pub fn subscribe_status(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.clone()
    }

    /// Queue a command without waiting
    pub fn send(&self, command: Command) -> Result<(), ControlError> {
        self.commands.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ControlError::Busy,
            mpsc::error::TrySendError::Closed(_) => ControlError::Unavailable,
        })
    }

    pub fn is_available(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// Orchestrator side of the control channel
pub(crate) struct ControlEndpoint {
    pub commands: mpsc::Receiver<Command>,
    pub status: watch::Sender<StatusSnapshot>,
    pub targets: watch::Sender<Vec<TargetSummary>>,
}

/// Create a connected endpoint and handle
pub(crate) fn channel(capacity: usize) -> (ControlEndpoint, ControlHandle) {
    let (command_tx, command_rx) = mpsc::channel(capacity.max(1));
    let (status_tx, status_rx) = watch::channel(StatusSnapshot::default());
    let (targets_tx, targets_rx) = watch::channel(Vec::new());

    (
        ControlEndpoint {
            commands: command_rx,
            status: status_tx,
            targets: targets_tx,
        },
        ControlHandle::new(command_tx, status_rx, targets_rx),
    )
}
