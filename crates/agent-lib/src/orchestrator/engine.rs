//! Attack cycle
//!
//! `IDLE -> SELECTING -> ATTACKING -> AWAITING_RESULT -> RECORDING -> IDLE`.
//! One target is in flight at a time. Commands and mode changes are only
//! applied while the cycle sits in IDLE.

use super::config::OrchestratorConfig;
use super::control::{self, Command, ControlEndpoint, ControlHandle, COMMAND_CAPACITY};
use super::mode::{ModeDetector, ModePreference};
use super::state::OrchestratorState;
use crate::discovery::ObservationStore;
use crate::error::{PersistenceError, RadioError};
use crate::health::{Component, HealthRegistry};
use crate::learning::{LearningModel, LearningStore};
use crate::models::{
    Bssid, CycleState, LearningSummary, Mode, NetworkObservation, StatusSnapshot,
};
use crate::observability::{AgentMetrics, StructuredLogger};
use crate::radio::{AttackBackend, CapabilityProbe, FixedProbe, SimulatedRadio};
use crate::targeting::{in_cooldown, rank_targets, score, select_target_exploring, Candidate};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, error, info, warn};

/// What one cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No eligible target; the cycle returned to IDLE early
    Idle,
    Attacked {
        bssid: Bssid,
        score: f64,
        mode: Mode,
        succeeded: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// How long to stay in IDLE before the next cycle
    pub next_delay: Duration,
}

/// The attack orchestrator.
///
/// Sole writer of the orchestrator state and the learning model. Readers see
/// them only through the snapshots published on the [`ControlHandle`].
pub struct Orchestrator {
    config: OrchestratorConfig,
    state: OrchestratorState,
    observations: Arc<ObservationStore>,
    model: LearningModel,
    store: Option<LearningStore>,
    simulator: Arc<dyn AttackBackend>,
    real_backend: Option<Arc<dyn AttackBackend>>,
    detector: ModeDetector,
    endpoint: ControlEndpoint,
    pending_override: Option<Bssid>,
    learning_degraded: bool,
    load_error: Option<String>,
    health: Option<HealthRegistry>,
    metrics: Option<AgentMetrics>,
    logger: StructuredLogger,
    rng: StdRng,
}

impl Orchestrator {
    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn model(&self) -> &LearningModel {
        &self.model
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// True while learned statistics only live in memory
    pub fn is_learning_degraded(&self) -> bool {
        self.learning_degraded
    }

    /// Drive the cycle until `shutdown` fires, then tear down to IDLE
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> OrchestratorState {
        self.announce_startup().await;

        let mut next_delay = Duration::ZERO;
        let mut commands_open = true;

        'cycle: loop {
            let deadline = Instant::now() + next_delay;

            // IDLE: wait out the delay while applying commands
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break 'cycle,
                    command = self.endpoint.commands.recv(), if commands_open => match command {
                        Some(command) => self.handle_command(command).await,
                        None => commands_open = false,
                    },
                    _ = sleep_until(deadline), if !self.state.paused => break,
                }
            }

            self.drain_commands().await;
            if self.state.paused {
                continue;
            }
            self.reconcile_mode().await;
            let report = self.step(Utc::now()).await;
            next_delay = report.next_delay;
        }

        self.teardown("shutdown requested").await
    }

    /// Run one full cycle starting and ending in IDLE.
    ///
    /// `now` is the selection time: cooldown and the outcome timestamp are
    /// both measured from it.
    pub async fn step(&mut self, now: DateTime<Utc>) -> CycleReport {
        let started = Instant::now();
        self.enter(CycleState::Selecting);

        let observations = self.observations.snapshot();
        self.model.observe_cycle(&observations);
        if let Some(cutoff) = chrono::Duration::from_std(self.config.selector.cooldown)
            .ok()
            .and_then(|cooldown| now.checked_sub_signed(cooldown))
        {
            self.model.prune_attempts_before(cutoff);
        }

        let candidate = match self.take_override(&observations, now) {
            Some(candidate) => Some(candidate),
            None => select_target_exploring(
                &observations,
                &self.model,
                now,
                &self.config.selector,
                &self.config.scoring,
                self.config.exploration_rate,
                &mut self.rng,
            ),
        };

        let report = match candidate {
            None => {
                debug!(networks = observations.len(), "No eligible target, backing off");
                self.enter(CycleState::Idle);
                self.state.record_idle_cycle();
                if let Some(metrics) = &self.metrics {
                    metrics.inc_idle_cycles();
                }
                CycleReport {
                    outcome: CycleOutcome::Idle,
                    next_delay: self.config.no_target_backoff,
                }
            }
            Some(candidate) => {
                let mode = self.state.mode;
                let succeeded = self.attack(&candidate).await;
                self.record(&candidate, succeeded, now).await;
                self.enter(CycleState::Idle);
                CycleReport {
                    outcome: CycleOutcome::Attacked {
                        bssid: candidate.bssid(),
                        score: candidate.score,
                        mode,
                        succeeded,
                    },
                    next_delay: self.config.inter_cycle_delay,
                }
            }
        };

        self.state.finish_cycle(now);
        if let Some(metrics) = &self.metrics {
            metrics.observe_cycle_latency(started.elapsed().as_secs_f64());
        }
        self.publish_targets(&observations, now);
        self.publish_status();
        report
    }

    /// Probe the radio (bounded by `attack_timeout`) and apply the resulting
    /// mode. Only call in IDLE.
    pub async fn reconcile_mode(&mut self) -> Mode {
        let decision = self.detector.detect(self.config.attack_timeout).await;
        self.state.last_probe_ok = decision.probe_ok;

        if decision.mode != self.state.mode {
            let from = self.state.mode;
            self.state.mode = decision.mode;
            self.logger.log_mode_change(from, decision.mode, decision.reason);
            if let Some(metrics) = &self.metrics {
                metrics.set_mode(decision.mode);
            }
        } else if decision.mode == Mode::Simulation
            && self.detector.preference() == ModePreference::Real
        {
            debug!(reason = decision.reason, "REAL mode requested but unavailable");
        }

        decision.mode
    }

    async fn attack(&mut self, candidate: &Candidate) -> bool {
        let bssid = candidate.bssid();
        let channel = candidate.observation.channel;
        self.state.current_target = Some(bssid);
        self.enter(CycleState::Attacking);

        let backend = self.backend();
        backend.expect_target(&bssid, candidate.score);
        // ATTACKING and AWAITING_RESULT share one budget
        let deadline = Instant::now() + self.config.attack_timeout;

        debug!(
            bssid = %bssid,
            channel = channel,
            score = candidate.score,
            backend = backend.name(),
            "Sending deauthentication burst"
        );
        let deauth = match timeout_at(deadline, backend.send_deauth(&bssid, channel)).await {
            Ok(result) => result,
            Err(_) => Err(RadioError::Timeout),
        };
        if let Err(e) = deauth {
            self.radio_failure(&bssid, &e).await;
            return false;
        }

        self.enter(CycleState::AwaitingResult);
        let remaining = deadline.saturating_duration_since(Instant::now());
        let capture = backend.capture_handshake(&bssid, remaining);
        let capture = match timeout_at(deadline, capture).await {
            Ok(result) => result,
            Err(_) => Err(RadioError::Timeout),
        };
        match capture {
            Ok(captured) => {
                if let Some(health) = &self.health {
                    health.succeeded(Component::Radio).await;
                }
                captured
            }
            Err(e) => {
                self.radio_failure(&bssid, &e).await;
                false
            }
        }
    }

    async fn record(&mut self, candidate: &Candidate, succeeded: bool, at: DateTime<Utc>) {
        self.enter(CycleState::Recording);

        let bssid = candidate.bssid();
        self.model
            .record_outcome(bssid, candidate.observation.channel, succeeded, at);
        self.state.record_attack(succeeded);

        if let Some(metrics) = &self.metrics {
            metrics.record_attack(succeeded);
            metrics.set_histories_tracked(self.model.len() as i64);
        }
        self.logger.log_attack(
            &bssid,
            &candidate.observation.ssid,
            self.state.mode,
            candidate.score,
            succeeded,
        );

        if self.model.needs_persist() {
            self.persist().await;
        }
    }

    /// Consume a pending override if it is still actionable
    fn take_override(
        &mut self,
        observations: &[NetworkObservation],
        now: DateTime<Utc>,
    ) -> Option<Candidate> {
        let bssid = self.pending_override.take()?;

        let Some(observation) = observations.iter().find(|o| o.bssid == bssid) else {
            self.logger
                .log_target_override(&bssid, false, "not in observation store");
            return None;
        };
        if in_cooldown(&self.model, &bssid, now, self.config.selector.cooldown) {
            self.logger.log_target_override(&bssid, false, "in cooldown");
            return None;
        }

        self.logger.log_target_override(&bssid, true, "operator override");
        Some(Candidate {
            observation: observation.clone(),
            score: score(
                observation,
                self.model.history(&bssid),
                now,
                &self.config.scoring,
            ),
        })
    }

    /// Apply every queued command without waiting
    pub(crate) async fn drain_commands(&mut self) {
        while let Ok(command) = self.endpoint.commands.try_recv() {
            self.handle_command(command).await;
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Override(bssid) => {
                info!(bssid = %bssid, "Target override queued for next cycle");
                self.pending_override = Some(bssid);
            }
            Command::ForceMode(preference) => {
                info!(preference = %preference, "Mode preference changed");
                self.detector.set_preference(preference);
                self.reconcile_mode().await;
            }
            Command::Pause => {
                if !self.state.paused {
                    info!("Attack cycle paused");
                }
                self.state.paused = true;
            }
            Command::Resume => {
                if self.state.paused {
                    info!("Attack cycle resumed");
                }
                self.state.paused = false;
            }
            Command::ResetLearning => self.reset_learning().await,
        }
        self.publish_status();
    }

    async fn reset_learning(&mut self) {
        let (attempts, _) = self.model.totals();
        self.logger.log_learning_reset(self.model.len(), attempts);
        self.model.reset();
        self.pending_override = None;
        if let Some(metrics) = &self.metrics {
            metrics.set_histories_tracked(0);
        }
        self.persist().await;

        let observations = self.observations.snapshot();
        self.publish_targets(&observations, Utc::now());
    }

    fn backend(&self) -> Arc<dyn AttackBackend> {
        match (self.state.mode, &self.real_backend) {
            (Mode::Real, Some(real)) => Arc::clone(real),
            _ => Arc::clone(&self.simulator),
        }
    }

    fn enter(&mut self, next: CycleState) {
        if let Err(e) = self.state.transition(next) {
            error!(error = %e, "Invalid cycle transition, resetting to IDLE");
            self.state.reset_to_idle();
        }
        self.publish_status();
    }

    async fn radio_failure(&self, bssid: &Bssid, e: &RadioError) {
        warn!(
            bssid = %bssid,
            state = ?self.state.cycle_state,
            mode = %self.state.mode,
            error = %e,
            "Radio operation failed, recording attempt as unsuccessful"
        );
        if let Some(metrics) = &self.metrics {
            metrics.inc_radio_errors();
        }
        if let Some(health) = &self.health {
            health
                .fault(Component::Radio, format!("{} on {}", e, bssid))
                .await;
        }
    }

    /// Save the model; failures leave it in memory and flag degraded mode
    async fn persist(&mut self) -> bool {
        let Some(store) = &self.store else {
            return true;
        };

        match store.save(&self.model) {
            Ok(()) => {
                self.model.mark_persisted();
                if self.learning_degraded {
                    info!(path = %store.path().display(), "Learning store writable again");
                    self.learning_degraded = false;
                    if let Some(health) = &self.health {
                        health.succeeded(Component::LearningStore).await;
                    }
                }
                true
            }
            Err(e) => {
                self.persistence_failure(&e).await;
                false
            }
        }
    }

    async fn persistence_failure(&mut self, e: &PersistenceError) {
        warn!(
            state = ?self.state.cycle_state,
            error = %e,
            "Failed to persist learning model"
        );
        if let Some(metrics) = &self.metrics {
            metrics.inc_persist_errors();
        }
        if !self.learning_degraded {
            self.logger.log_learning_degraded(&e.to_string());
        }
        self.learning_degraded = true;
        if let Some(health) = &self.health {
            health.fault(Component::LearningStore, e.to_string()).await;
        }
    }

    async fn announce_startup(&mut self) {
        if let Some(health) = &self.health {
            health.register(Component::Orchestrator).await;
            health.register(Component::LearningStore).await;
            health.register(Component::Radio).await;
            if let Some(err) = &self.load_error {
                health
                    .fault(Component::LearningStore, format!("cold start: {}", err))
                    .await;
            }
        }
        if let Some(err) = &self.load_error {
            self.logger.log_learning_degraded(err);
        }

        self.reconcile_mode().await;
        if let Some(metrics) = &self.metrics {
            metrics.set_mode(self.state.mode);
            metrics.set_histories_tracked(self.model.len() as i64);
        }
        self.logger.log_startup(
            env!("CARGO_PKG_VERSION"),
            self.state.mode,
            self.model.len(),
        );

        let observations = self.observations.snapshot();
        self.publish_targets(&observations, Utc::now());
        self.publish_status();
    }

    async fn teardown(mut self, reason: &str) -> OrchestratorState {
        self.state.reset_to_idle();
        self.persist().await;
        self.logger.log_shutdown(reason);
        self.publish_status();
        self.state
    }

    /// Point-in-time status for readers
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            mode: self.state.mode,
            cycle_state: self.state.cycle_state,
            current_target: self.state.current_target,
            networks_count: self.observations.len(),
            attacks_count: self.state.attacks,
            handshakes_count: self.state.handshakes,
            success_rate: self.state.success_rate(),
            mood: self.state.mood,
            face: self.state.mood.face().to_string(),
            cycle_count: self.state.cycle_count,
            paused: self.state.paused,
            learning_degraded: self.learning_degraded,
            last_cycle_at: self.state.last_cycle_at,
            learning: self.learning_summary(),
        }
    }

    /// Lifetime statistics of the learning model
    pub fn learning_summary(&self) -> LearningSummary {
        let (total_attempts, total_successes) = self.model.totals();
        let success_rate = if total_attempts > 0 {
            total_successes as f64 / total_attempts as f64
        } else {
            0.0
        };
        LearningSummary {
            total_attempts,
            total_successes,
            success_rate,
            networks_learned: self.model.len(),
            best_channel: self.model.best_channel(),
            exploration_rate: self.config.exploration_rate,
        }
    }

    fn publish_status(&self) {
        self.endpoint.status.send_replace(self.snapshot());
    }

    fn publish_targets(&self, observations: &[NetworkObservation], now: DateTime<Utc>) {
        let ranked = rank_targets(
            observations,
            &self.model,
            now,
            &self.config.selector,
            &self.config.scoring,
        );
        self.endpoint.targets.send_replace(ranked);
    }
}

/// Builder for the orchestrator and its control handle
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    observations: Option<Arc<ObservationStore>>,
    store: Option<LearningStore>,
    simulator: Option<Arc<dyn AttackBackend>>,
    real_backend: Option<Arc<dyn AttackBackend>>,
    probe: Option<Arc<dyn CapabilityProbe>>,
    preference: ModePreference,
    health: Option<HealthRegistry>,
    metrics: Option<AgentMetrics>,
    logger: Option<StructuredLogger>,
    seed: Option<u64>,
    command_capacity: usize,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            config: OrchestratorConfig::default(),
            observations: None,
            store: None,
            simulator: None,
            real_backend: None,
            probe: None,
            preference: ModePreference::Auto,
            health: None,
            metrics: None,
            logger: None,
            seed: None,
            command_capacity: COMMAND_CAPACITY,
        }
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the observation store fed by discovery
    pub fn observations(mut self, observations: Arc<ObservationStore>) -> Self {
        self.observations = Some(observations);
        self
    }

    /// Persist the learning model here; without it the model is memory-only
    pub fn learning_store(mut self, store: LearningStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Backend used in SIMULATION mode
    pub fn simulator(mut self, simulator: Arc<dyn AttackBackend>) -> Self {
        self.simulator = Some(simulator);
        self
    }

    /// Injection driver used in REAL mode
    pub fn real_backend(mut self, backend: Arc<dyn AttackBackend>) -> Self {
        self.real_backend = Some(backend);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn CapabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn mode_preference(mut self, preference: ModePreference) -> Self {
        self.preference = preference;
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

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Seed the exploration RNG
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    /// Validate the configuration, load the learning store and wire the
    /// control channel
    pub fn build(self) -> Result<(Orchestrator, ControlHandle)> {
        self.config.validate()?;
        let observations = self
            .observations
            .ok_or_else(|| anyhow::anyhow!("Observation store is required"))?;

        let (model, load_error) = match &self.store {
            None => (LearningModel::new(self.config.learning.clone()), None),
            Some(store) => match store.load(self.config.learning.clone()) {
                Ok(model) => (model, None),
                Err(e) => {
                    warn!(
                        path = %store.path().display(),
                        error = %e,
                        "Learning store unusable, starting cold"
                    );
                    if !matches!(e, PersistenceError::Io { .. }) {
                        if let Err(qe) = store.quarantine() {
                            warn!(error = %qe, "Failed to quarantine learning store");
                        }
                    }
                    (
                        LearningModel::new(self.config.learning.clone()),
                        Some(e.to_string()),
                    )
                }
            },
        };

        let simulator = self
            .simulator
            .unwrap_or_else(|| Arc::new(SimulatedRadio::default()));
        let probe = self.probe.unwrap_or_else(|| Arc::new(FixedProbe(false)));
        let detector = ModeDetector::new(probe, self.preference, self.real_backend.is_some());
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (endpoint, handle) = control::channel(self.command_capacity);

        let orchestrator = Orchestrator {
            config: self.config,
            state: OrchestratorState::new(Mode::Simulation),
            observations,
            model,
            store: self.store,
            simulator,
            real_backend: self.real_backend,
            detector,
            endpoint,
            pending_override: None,
            learning_degraded: load_error.is_some(),
            load_error,
            health: self.health,
            metrics: self.metrics,
            logger: self
                .logger
                .unwrap_or_else(|| StructuredLogger::new("handshake-agent")),
            rng,
        };
        orchestrator.publish_status();

        Ok((orchestrator, handle))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
