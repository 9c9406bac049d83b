//! Agent health
//!
//! Subsystems report faults and recoveries here. Repeated faults escalate a
//! component from degraded to unhealthy, except the learning store: learning
//! carries on in memory when the state file cannot be written. One
//! [`HealthReport`] backs `/healthz`, `/readyz` and the dashboard's
//! `/api/health`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Consecutive faults before an escalating component turns unhealthy
pub const DEFAULT_FAULT_THRESHOLD: u32 = 5;

/// Subsystems tracked by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Orchestrator,
    Discovery,
    LearningStore,
    Radio,
}

impl Component {
    /// Whether repeated faults make this component unhealthy
    fn escalates(self) -> bool {
        !matches!(self, Component::LearningStore)
    }

    /// Whether an unhealthy component takes the agent out of readiness.
    /// A failing radio still leaves simulated cycles running.
    fn gates_readiness(self) -> bool {
        matches!(self, Component::Orchestrator | Component::Discovery)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Orchestrator => "orchestrator",
            Component::Discovery => "discovery",
            Component::LearningStore => "learning_store",
            Component::Radio => "radio",
        };
        f.write_str(name)
    }
}

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Faulting but the agent keeps attacking
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    /// Last fault, cleared on recovery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub consecutive_faults: u32,
    /// When `status` last changed
    pub since: DateTime<Utc>,
}

impl ComponentHealth {
    fn healthy() -> Self {
        Self {
            status: ComponentStatus::Healthy,
            reason: None,
            consecutive_faults: 0,
            since: Utc::now(),
        }
    }

    fn set_status(&mut self, status: ComponentStatus) {
        if self.status != status {
            self.status = status;
            self.since = Utc::now();
        }
    }
}

/// Point-in-time health of the whole agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Worst component status
    pub status: ComponentStatus,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_ready_reason: Option<String>,
    pub components: BTreeMap<Component, ComponentHealth>,
}

impl HealthReport {
    /// `component: reason` for every component that is not healthy, worst first
    pub fn degradations(&self) -> Vec<String> {
        let mut faulted: Vec<_> = self
            .components
            .iter()
            .filter(|(_, health)| health.status != ComponentStatus::Healthy)
            .collect();
        faulted.sort_by(|a, b| b.1.status.cmp(&a.1.status).then(a.0.cmp(b.0)));
        faulted
            .into_iter()
            .map(|(component, health)| match &health.reason {
                Some(reason) => format!("{}: {}", component, reason),
                None => component.to_string(),
            })
            .collect()
    }
}

#[derive(Debug)]
struct Registry {
    components: BTreeMap<Component, ComponentHealth>,
    ready: bool,
    fault_threshold: u32,
}

/// Shared, cloneable view of component health
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::with_fault_threshold(DEFAULT_FAULT_THRESHOLD)
    }

    pub fn with_fault_threshold(fault_threshold: u32) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Registry {
                components: BTreeMap::new(),
                ready: false,
                fault_threshold: fault_threshold.max(1),
            })),
        }
    }

    /// Start tracking `component` as healthy; keeps any state already reported
    pub async fn register(&self, component: Component) {
        let mut registry = self.inner.write().await;
        registry
            .components
            .entry(component)
            .or_insert_with(ComponentHealth::healthy);
    }

    /// Record a successful operation, clearing earlier faults
    pub async fn succeeded(&self, component: Component) {
        let mut registry = self.inner.write().await;
        let health = registry
            .components
            .entry(component)
            .or_insert_with(ComponentHealth::healthy);
        if health.status != ComponentStatus::Healthy {
            info!(
                component = %component,
                faults = health.consecutive_faults,
                "Component recovered"
            );
        }
        health.set_status(ComponentStatus::Healthy);
        health.reason = None;
        health.consecutive_faults = 0;
    }

    /// Record a fault and return the resulting status
    pub async fn fault(
        &self,
        component: Component,
        reason: impl Into<String>,
    ) -> ComponentStatus {
        let mut registry = self.inner.write().await;
        let threshold = registry.fault_threshold;
        let health = registry
            .components
            .entry(component)
            .or_insert_with(ComponentHealth::healthy);

        health.consecutive_faults = health.consecutive_faults.saturating_add(1);
        health.reason = Some(reason.into());
        let status = if component.escalates() && health.consecutive_faults >= threshold {
            ComponentStatus::Unhealthy
        } else {
            ComponentStatus::Degraded
        };
        if status != health.status {
            warn!(
                component = %component,
                status = ?status,
                faults = health.consecutive_faults,
                reason = health.reason.as_deref().unwrap_or_default(),
                "Component health changed"
            );
        }
        health.set_status(status);
        status
    }

    /// Mark `component` unhealthy at once, e.g. when its task has exited
    pub async fn set_unhealthy(&self, component: Component, reason: impl Into<String>) {
        let mut registry = self.inner.write().await;
        let health = registry
            .components
            .entry(component)
            .or_insert_with(ComponentHealth::healthy);
        health.reason = Some(reason.into());
        health.set_status(ComponentStatus::Unhealthy);
    }

    pub async fn set_ready(&self, ready: bool) {
        self.inner.write().await.ready = ready;
    }

    pub async fn status_of(&self, component: Component) -> Option<ComponentStatus> {
        self.inner
            .read()
            .await
            .components
            .get(&component)
            .map(|health| health.status)
    }

    pub async fn report(&self) -> HealthReport {
        let registry = self.inner.read().await;
        let components = registry.components.clone();
        let status = components
            .values()
            .map(|health| health.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy);

        let blocker = components.iter().find(|(component, health)| {
            component.gates_readiness() && health.status == ComponentStatus::Unhealthy
        });
        let not_ready_reason = match (registry.ready, blocker) {
            (false, _) => Some("agent not started".to_string()),
            (true, Some((component, health))) => Some(match &health.reason {
                Some(reason) => format!("{} unhealthy: {}", component, reason),
                None => format!("{} unhealthy", component),
            }),
            (true, None) => None,
        };

        HealthReport {
            status,
            ready: not_ready_reason.is_none(),
            not_ready_reason,
            components,
        }
    }
}
