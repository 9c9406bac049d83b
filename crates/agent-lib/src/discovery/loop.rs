//! Network discovery loop
//!
//! Periodically scans for networks and feeds the observation store. Runs
//! independently of the attack cycle; a failed scan never stops the loop.

use super::{NetworkScanner, ObservationStore};
use crate::health::{Component, HealthRegistry};
use crate::observability::AgentMetrics;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Configuration for the discovery loop
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Interval between scans (default: 15 seconds)
    pub interval: Duration,
    /// Networks unseen for longer than this are dropped (default: 1 hour)
    pub retention: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            retention: Duration::from_secs(60 * 60),
        }
    }
}

/// Result of one scan pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanResults {
    pub observed: usize,
    pub pruned: usize,
}

/// Producer task feeding the observation store
pub struct DiscoveryLoop {
    scanner: Arc<dyn NetworkScanner>,
    store: Arc<ObservationStore>,
    config: DiscoveryConfig,
    health: Option<HealthRegistry>,
    metrics: Option<AgentMetrics>,
    consecutive_failures: u32,
}

impl DiscoveryLoop {
    pub fn new(
        scanner: Arc<dyn NetworkScanner>,
        store: Arc<ObservationStore>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            scanner,
            store,
            config,
            health: None,
            metrics: None,
            consecutive_failures: 0,
        }
    }

    /// Start the discovery loop; returns when `shutdown` fires
    pub async fn run(mut self, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(
            scanner = self.scanner.name(),
            interval_secs = self.config.interval.as_secs(),
            "Starting network discovery loop"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.scan_once().await {
                        Ok(results) => {
                            debug!(
                                observed = results.observed,
                                pruned = results.pruned,
                                total = self.store.len(),
                                "Scan complete"
                            );
                        }
                        Err(e) => {
                            warn!(
                                scanner = self.scanner.name(),
                                consecutive_failures = self.consecutive_failures,
                                error = %e,
                                "Network scan failed"
                            );
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down network discovery loop");
                    break;
                }
            }
        }
    }

    /// Run a single scan, update the store and prune stale entries
    pub async fn scan_once(&mut self) -> Result<ScanResults> {
        let start = Instant::now();
        let outcome = self.scanner.scan().await;

        if let Some(metrics) = &self.metrics {
            metrics.observe_scan_latency(start.elapsed().as_secs_f64());
        }

        let networks = match outcome {
            Ok(networks) => networks,
            Err(e) => {
                self.consecutive_failures += 1;
                if let Some(metrics) = &self.metrics {
                    metrics.inc_scan_errors();
                }
                if let Some(health) = &self.health {
                    health
                        .fault(Component::Discovery, format!("scan failed: {}", e))
                        .await;
                }
                return Err(e);
            }
        };

        let observed = networks.len();
        self.store.upsert_batch(networks);

        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.config.retention)
                .unwrap_or_else(|_| chrono::Duration::hours(1));
        let pruned = self.store.prune_older_than(cutoff);

        if self.consecutive_failures > 0 {
            info!(
                failures = self.consecutive_failures,
                "Network scanning recovered"
            );
            self.consecutive_failures = 0;
        }
        if let Some(health) = &self.health {
            health.succeeded(Component::Discovery).await;
        }
        if let Some(metrics) = &self.metrics {
            metrics.set_networks_observed(self.store.len() as i64);
        }

        Ok(ScanResults { observed, pruned })
    }
}

/// Builder for creating the discovery loop
pub struct DiscoveryLoopBuilder {
    scanner: Option<Arc<dyn NetworkScanner>>,
    store: Option<Arc<ObservationStore>>,
    config: DiscoveryConfig,
    health: Option<HealthRegistry>,
    metrics: Option<AgentMetrics>,
}

impl DiscoveryLoopBuilder {
    pub fn new() -> Self {
        Self {
            scanner: None,
            store: None,
            config: DiscoveryConfig::default(),
            health: None,
            metrics: None,
        }
    }

    /// Set the network scanner
    pub fn scanner(mut self, scanner: Arc<dyn NetworkScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Set the observation store to feed
    pub fn store(mut self, store: Arc<ObservationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the scan interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Set the retention window for unseen networks
    pub fn retention(mut self, retention: Duration) -> Self {
        self.config.retention = retention;
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn metrics(mut self, metrics: AgentMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the discovery loop
    pub fn build(self) -> Result<DiscoveryLoop> {
        let scanner = self
            .scanner
            .ok_or_else(|| anyhow::anyhow!("Scanner is required"))?;
        let store = self
            .store
            .ok_or_else(|| anyhow::anyhow!("Observation store is required"))?;

        let mut discovery = DiscoveryLoop::new(scanner, store, self.config);
        discovery.health = self.health;
        discovery.metrics = self.metrics;
        Ok(discovery)
    }
}

impl Default for DiscoveryLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_config_default() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.interval, Duration::from_secs(15));
        assert_eq!(config.retention, Duration::from_secs(3600));
    }

    #[test]
    fn test_builder_requires_scanner() {
        let result = DiscoveryLoopBuilder::new()
            .store(Arc::new(ObservationStore::new()))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_requires_store() {
        let result = DiscoveryLoopBuilder::new()
            .scanner(Arc::new(crate::discovery::SimulatedScanner::default()))
            .build();
        assert!(result.is_err());
    }
}
