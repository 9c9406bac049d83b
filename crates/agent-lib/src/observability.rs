//! Observability infrastructure for the handshake agent
//!
//! Provides:
//! - Prometheus metrics (cycle latency, scan latency, attack outcomes, mode)
//! - Structured JSON logging with tracing

use crate::models::{Bssid, Mode};
use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter,
    IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for cycle and scan durations (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AgentMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct AgentMetricsInner {
    cycle_latency_seconds: Histogram,
    scan_latency_seconds: Histogram,
    attacks_total: IntCounter,
    handshakes_total: IntCounter,
    idle_cycles_total: IntCounter,
    radio_errors_total: IntCounter,
    persist_errors_total: IntCounter,
    scan_errors_total: IntCounter,
    networks_observed: IntGauge,
    histories_tracked: IntGauge,
    mode: IntGauge,
}

impl AgentMetricsInner {
    fn new() -> Self {
        Self {
            cycle_latency_seconds: register_histogram!(
                "handshake_agent_cycle_latency_seconds",
                "Time spent in one select-attack-record cycle",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_latency_seconds"),

            scan_latency_seconds: register_histogram!(
                "handshake_agent_scan_latency_seconds",
                "Time spent scanning for nearby networks",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register scan_latency_seconds"),

            attacks_total: register_int_counter!(
                "handshake_agent_attacks_total",
                "Total number of attack cycles that reached recording"
            )
            .expect("Failed to register attacks_total"),

            handshakes_total: register_int_counter!(
                "handshake_agent_handshakes_total",
                "Total number of captured handshakes"
            )
            .expect("Failed to register handshakes_total"),

            idle_cycles_total: register_int_counter!(
                "handshake_agent_idle_cycles_total",
                "Total number of cycles that found no eligible target"
            )
            .expect("Failed to register idle_cycles_total"),

            radio_errors_total: register_int_counter!(
                "handshake_agent_radio_errors_total",
                "Total number of radio errors and timeouts during attacks"
            )
            .expect("Failed to register radio_errors_total"),

            persist_errors_total: register_int_counter!(
                "handshake_agent_persist_errors_total",
                "Total number of failed learning store writes"
            )
            .expect("Failed to register persist_errors_total"),

            scan_errors_total: register_int_counter!(
                "handshake_agent_scan_errors_total",
                "Total number of failed network scans"
            )
            .expect("Failed to register scan_errors_total"),

            networks_observed: register_int_gauge!(
                "handshake_agent_networks_observed",
                "Number of networks currently held in the observation store"
            )
            .expect("Failed to register networks_observed"),

            histories_tracked: register_int_gauge!(
                "handshake_agent_histories_tracked",
                "Number of BSSIDs with attack history in the learning model"
            )
            .expect("Failed to register histories_tracked"),

            mode: register_int_gauge!(
                "handshake_agent_mode",
                "Orchestrator mode (0 = simulation, 1 = real)"
            )
            .expect("Failed to register mode"),
        }
    }
}

/// Agent metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct AgentMetrics {
    _private: (),
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AgentMetricsInner {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new)
    }

    pub fn observe_cycle_latency(&self, duration_secs: f64) {
        self.inner().cycle_latency_seconds.observe(duration_secs);
    }

    pub fn observe_scan_latency(&self, duration_secs: f64) {
        self.inner().scan_latency_seconds.observe(duration_secs);
    }

    /// Count one recorded attack and whether it captured a handshake
    pub fn record_attack(&self, succeeded: bool) {
        self.inner().attacks_total.inc();
        if succeeded {
            self.inner().handshakes_total.inc();
        }
    }

    pub fn inc_idle_cycles(&self) {
        self.inner().idle_cycles_total.inc();
    }

    pub fn inc_radio_errors(&self) {
        self.inner().radio_errors_total.inc();
    }

    pub fn inc_persist_errors(&self) {
        self.inner().persist_errors_total.inc();
    }

    pub fn inc_scan_errors(&self) {
        self.inner().scan_errors_total.inc();
    }

    pub fn set_networks_observed(&self, count: i64) {
        self.inner().networks_observed.set(count);
    }

    pub fn set_histories_tracked(&self, count: i64) {
        self.inner().histories_tracked.set(count);
    }

    pub fn set_mode(&self, mode: Mode) {
        let value = match mode {
            Mode::Simulation => 0,
            Mode::Real => 1,
        };
        self.inner().mode.set(value);
    }
}

/// Structured logger for agent events
///
/// Provides consistent JSON-formatted logging for attacks, mode changes,
/// and other significant events.
#[derive(Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    /// Log a completed attack cycle
    pub fn log_attack(&self, bssid: &Bssid, ssid: &str, mode: Mode, score: f64, succeeded: bool) {
        if succeeded {
            info!(
                event = "attack_completed",
                node = %self.node_name,
                bssid = %bssid,
                ssid = %ssid,
                mode = %mode,
                score = score,
                succeeded = true,
                "Handshake captured"
            );
        } else {
            info!(
                event = "attack_completed",
                node = %self.node_name,
                bssid = %bssid,
                ssid = %ssid,
                mode = %mode,
                score = score,
                succeeded = false,
                "Attack finished without handshake"
            );
        }
    }

    /// Log a mode transition
    pub fn log_mode_change(&self, from: Mode, to: Mode, reason: &str) {
        warn!(
            event = "mode_changed",
            node = %self.node_name,
            from = %from,
            to = %to,
            reason = %reason,
            "Orchestrator mode changed"
        );
    }

    /// Log the learning model falling back to memory only
    pub fn log_learning_degraded(&self, error: &str) {
        warn!(
            event = "learning_degraded",
            node = %self.node_name,
            error = %error,
            "Learning store unavailable, continuing in memory only"
        );
    }

    /// Log an operator wiping learned statistics
    pub fn log_learning_reset(&self, forgotten: usize, attempts: u64) {
        warn!(
            event = "learning_reset",
            node = %self.node_name,
            forgotten = forgotten,
            attempts = attempts,
            "Learned attack history discarded"
        );
    }

    /// Log a dashboard target override
    pub fn log_target_override(&self, bssid: &Bssid, accepted: bool, reason: &str) {
        if accepted {
            info!(
                event = "target_override",
                node = %self.node_name,
                bssid = %bssid,
                accepted = true,
                "Manual target override applied"
            );
        } else {
            warn!(
                event = "target_override",
                node = %self.node_name,
                bssid = %bssid,
                accepted = false,
                reason = %reason,
                "Manual target override dropped"
            );
        }
    }

    /// Log agent startup
    pub fn log_startup(&self, version: &str, mode: Mode, histories: usize) {
        info!(
            event = "agent_started",
            node = %self.node_name,
            agent_version = %version,
            mode = %mode,
            histories = histories,
            "Handshake agent started"
        );
    }

    /// Log agent shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            node = %self.node_name,
            reason = %reason,
            "Handshake agent shutting down"
        );
    }
}
