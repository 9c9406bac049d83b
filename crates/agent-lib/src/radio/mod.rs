//! Radio I/O boundary
//!
//! The orchestrator only ever talks to the radio through these two traits.
//! Real frame injection is provided by an external driver implementing
//! [`AttackBackend`]; [`SimulatedRadio`] stands in for it in SIMULATION mode.

mod probe;
mod simulated;

pub use probe::{FixedProbe, SysfsMonitorProbe, ARPHRD_IEEE80211_RADIOTAP};
pub use simulated::{SimulatedRadio, SimulatedRadioConfig};

use crate::error::RadioError;
use crate::models::Bssid;
use std::time::Duration;

pub use async_trait::async_trait;

/// Executes the deauthentication sequence and watches for a handshake
#[async_trait]
pub trait AttackBackend: Send + Sync {
    /// Send a burst of deauthentication frames on `channel`
    async fn send_deauth(&self, bssid: &Bssid, channel: u16) -> Result<(), RadioError>;

    /// Wait up to `timeout` for a handshake from `bssid`; `Ok(false)` means none captured
    async fn capture_handshake(&self, bssid: &Bssid, timeout: Duration)
        -> Result<bool, RadioError>;

    /// Called before each attack with the score that selected the target.
    /// Real drivers ignore it.
    fn expect_target(&self, _bssid: &Bssid, _score: f64) {}

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Reports whether a monitor-mode capable radio is present
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    async fn probe_capability(&self) -> bool;

    fn name(&self) -> &str;
}
