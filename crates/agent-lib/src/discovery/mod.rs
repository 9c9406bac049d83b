//! Network discovery
//!
//! This module keeps the observation store current: scanners produce
//! snapshots of nearby access points and the discovery loop merges them into
//! the store on its own schedule, independent of the attack cycle.

mod iwlist;
mod r#loop;
mod simulated;
mod store;


pub use iwlist::{parse_scan_output, IwlistScanner, SCAN_TIMEOUT};
pub use r#loop::{DiscoveryConfig, DiscoveryLoop, DiscoveryLoopBuilder, ScanResults};
pub use simulated::SimulatedScanner;
pub use store::ObservationStore;

use crate::models::NetworkObservation;
use anyhow::Result;

pub use async_trait::async_trait;

/// Trait for network scanning implementations
#[async_trait]
pub trait NetworkScanner: Send + Sync {
    /// Scan once and return every network currently visible
    async fn scan(&self) -> Result<Vec<NetworkObservation>>;

    /// Short name used in logs
    fn name(&self) -> &str;
}
