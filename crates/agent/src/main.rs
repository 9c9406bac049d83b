//! Handshake Agent - unattended WiFi handshake capture
//!
//! Discovers nearby networks, scores them against learned history and
//! attacks the best eligible target each cycle, in real or simulated mode.

use agent_lib::{
    discovery::{
        DiscoveryLoopBuilder, IwlistScanner, NetworkScanner, ObservationStore, SimulatedScanner,
    },
    display::{DisplayLoop, LogDisplay},
    health::{Component, HealthRegistry},
    learning::LearningStore,
    observability::{AgentMetrics, StructuredLogger},
    orchestrator::OrchestratorBuilder,
    radio::{CapabilityProbe, FixedProbe, SimulatedRadio, SimulatedRadioConfig, SysfsMonitorProbe},
};
use anyhow::Result;
use config::ScannerKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting handshake-agent");

    // Load configuration; invalid settings stop startup here
    let config = config::AgentConfig::load()?;
    let orchestrator_config = config.orchestrator_config()?;
    info!(
        node_name = %config.node_name,
        mode = %config.mode,
        state_path = %config.state_path.display(),
        "Agent configured"
    );

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(Component::Discovery).await;

    // Initialize metrics
    let metrics = AgentMetrics::new();

    // Initialize structured logger
    let logger = StructuredLogger::new(&config.node_name);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Network discovery
    let observations = Arc::new(ObservationStore::new());
    let scanner: Arc<dyn NetworkScanner> = match config.discovery.scanner {
        ScannerKind::Iwlist => Arc::new(IwlistScanner::new(&config.discovery.interface)),
        ScannerKind::Simulated => Arc::new(SimulatedScanner::new(
            config.discovery.simulated_networks,
            config.cycle.rng_seed.unwrap_or_else(rand::random),
        )),
    };
    let discovery = DiscoveryLoopBuilder::new()
        .scanner(scanner)
        .store(observations.clone())
        .interval(Duration::from_secs(config.discovery.interval_secs))
        .retention(Duration::from_secs(config.discovery.retention_secs))
        .health(health_registry.clone())
        .metrics(metrics.clone())
        .build()?;

    // Radio capability
    let probe: Arc<dyn CapabilityProbe> = match &config.monitor_interface {
        Some(interface) => Arc::new(SysfsMonitorProbe::new(interface)),
        None => Arc::new(FixedProbe(false)),
    };
    let simulator = SimulatedRadio::from_entropy(SimulatedRadioConfig {
        latency: Duration::from_millis(config.simulation.latency_ms),
        ..SimulatedRadioConfig::default()
    });

    let mut builder = OrchestratorBuilder::new()
        .config(orchestrator_config)
        .observations(observations)
        .learning_store(LearningStore::new(&config.state_path))
        .simulator(Arc::new(simulator))
        .probe(probe)
        .mode_preference(config.mode)
        .health(health_registry.clone())
        .metrics(metrics.clone())
        .logger(logger.clone());
    if let Some(seed) = config.cycle.rng_seed {
        builder = builder.rng_seed(seed);
    }
    let (orchestrator, control) = builder.build()?;

    let discovery_handle = tokio::spawn(discovery.run(shutdown_tx.subscribe()));

    let display = DisplayLoop::new(
        Arc::new(LogDisplay),
        control.subscribe_status(),
        Duration::from_secs(config.display.refresh_secs),
    );
    let display_handle = tokio::spawn(display.run(shutdown_tx.subscribe()));

    let mut orchestrator_handle = tokio::spawn(orchestrator.run(shutdown_tx.subscribe()));

    // Start health, metrics and dashboard server
    let api_port = config.api_port;
    let api_health = health_registry.clone();
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, api_health, control).await {
            error!(error = %e, "API server failed");
        }
    });

    // Mark agent as ready after initialization
    health_registry.set_ready(true).await;

    // Wait for shutdown signal. An orchestrator that dies first is reported
    // through /healthz so a supervisor can restart the agent.
    let early_exit = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            None
        }
        joined = &mut orchestrator_handle => Some(joined),
    };
    if let Some(joined) = &early_exit {
        let reason = match joined {
            Ok(_) => "attack cycle stopped before shutdown".to_string(),
            Err(e) => format!("attack cycle task failed: {}", e),
        };
        error!(reason = %reason, "Orchestrator exited early");
        health_registry
            .set_unhealthy(Component::Orchestrator, reason)
            .await;
        tokio::signal::ctrl_c().await?;
    }
    info!("Shutting down");
    health_registry.set_ready(false).await;
    let _ = shutdown_tx.send(());

    // The orchestrator persists learning before it returns
    let joined = match early_exit {
        Some(joined) => joined,
        None => orchestrator_handle.await,
    };
    match joined {
        Ok(state) => info!(
            cycles = state.cycle_count,
            attacks = state.attacks,
            handshakes = state.handshakes,
            "Orchestrator stopped"
        ),
        Err(e) => error!(error = %e, "Orchestrator task failed"),
    }
    let _ = discovery_handle.await;
    let _ = display_handle.await;

    Ok(())
}
