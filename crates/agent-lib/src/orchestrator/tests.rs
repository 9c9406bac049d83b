use super::*;
use crate::discovery::ObservationStore;
use crate::error::RadioError;
use crate::health::{Component, ComponentStatus, HealthRegistry};
use crate::learning::LearningStore;
use crate::models::{Bssid, CycleState, Encryption, Mode, NetworkObservation};
use crate::radio::{
    async_trait, AttackBackend, CapabilityProbe, SimulatedRadio, SimulatedRadioConfig,
};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;

fn bssid(last: u8) -> Bssid {
    Bssid::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, last])
}

fn network(
    last: u8,
    signal: i32,
    encryption: Encryption,
    seen_at: DateTime<Utc>,
) -> NetworkObservation {
    NetworkObservation::new(bssid(last), format!("net-{}", last), 6, signal, encryption, seen_at)
}

fn instant_radio(seed: u64) -> Arc<SimulatedRadio> {
    Arc::new(SimulatedRadio::new(
        SimulatedRadioConfig {
            latency: Duration::ZERO,
            ..Default::default()
        },
        seed,
    ))
}

fn builder(observations: Arc<ObservationStore>) -> OrchestratorBuilder {
    OrchestratorBuilder::new()
        .observations(observations)
        .simulator(instant_radio(11))
        .rng_seed(5)
}

/// Backend with a fixed answer that counts its calls
struct FixedBackend {
    captured: bool,
    calls: AtomicUsize,
}

impl FixedBackend {
    fn new(captured: bool) -> Self {
        Self {
            captured,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AttackBackend for FixedBackend {
    async fn send_deauth(&self, _bssid: &Bssid, _channel: u16) -> Result<(), RadioError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn capture_handshake(
        &self,
        _bssid: &Bssid,
        _timeout: Duration,
    ) -> Result<bool, RadioError> {
        Ok(self.captured)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Backend whose radio is always busy
struct BusyBackend;

#[async_trait]
impl AttackBackend for BusyBackend {
    async fn send_deauth(&self, _bssid: &Bssid, _channel: u16) -> Result<(), RadioError> {
        Err(RadioError::Busy("wlan0mon".to_string()))
    }

    async fn capture_handshake(
        &self,
        _bssid: &Bssid,
        _timeout: Duration,
    ) -> Result<bool, RadioError> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "busy"
    }
}

/// Backend that never answers the capture poll
struct HangingBackend;

#[async_trait]
impl AttackBackend for HangingBackend {
    async fn send_deauth(&self, _bssid: &Bssid, _channel: u16) -> Result<(), RadioError> {
        Ok(())
    }

    async fn capture_handshake(
        &self,
        _bssid: &Bssid,
        _timeout: Duration,
    ) -> Result<bool, RadioError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(true)
    }

    fn name(&self) -> &str {
        "hanging"
    }
}

/// Probe that can be plugged and unplugged, remembering its last answer
#[derive(Default)]
struct SwitchableProbe {
    present: AtomicBool,
    last_answer: Arc<AtomicBool>,
}

#[async_trait]
impl CapabilityProbe for SwitchableProbe {
    async fn probe_capability(&self) -> bool {
        let present = self.present.load(Ordering::SeqCst);
        self.last_answer.store(present, Ordering::SeqCst);
        present
    }

    fn name(&self) -> &str {
        "switchable"
    }
}

/// Real backend that flags any call made without a confirmed radio
struct GuardedBackend {
    last_probe: Arc<AtomicBool>,
    calls: AtomicUsize,
    violations: AtomicUsize,
}

#[async_trait]
impl AttackBackend for GuardedBackend {
    async fn send_deauth(&self, _bssid: &Bssid, _channel: u16) -> Result<(), RadioError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.last_probe.load(Ordering::SeqCst) {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn capture_handshake(
        &self,
        _bssid: &Bssid,
        _timeout: Duration,
    ) -> Result<bool, RadioError> {
        if !self.last_probe.load(Ordering::SeqCst) {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(false)
    }

    fn name(&self) -> &str {
        "guarded"
    }
}

#[tokio::test]
async fn test_no_candidates_returns_to_idle_with_short_backoff() {
    let observations = Arc::new(ObservationStore::new());
    let (mut orchestrator, handle) = builder(observations).build().unwrap();

    let report = orchestrator.step(Utc::now()).await;

    assert_eq!(report.outcome, CycleOutcome::Idle);
    assert_eq!(report.next_delay, orchestrator.config().no_target_backoff);
    assert_eq!(orchestrator.state().cycle_state, CycleState::Idle);
    assert_eq!(orchestrator.state().cycle_count, 1);
    assert_eq!(handle.status().cycle_state, CycleState::Idle);
}

#[tokio::test]
async fn test_cold_start_without_store_selects_target() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("learning.json");
    let now = Utc::now();
    let observations = Arc::new(ObservationStore::new());
    observations.upsert(network(1, -50, Encryption::Wpa2, now));

    let (mut orchestrator, _handle) = builder(observations)
        .learning_store(LearningStore::new(&path))
        .build()
        .unwrap();
    assert!(!orchestrator.is_learning_degraded());

    let report = orchestrator.step(now).await;

    match report.outcome {
        CycleOutcome::Attacked { bssid: target, mode, .. } => {
            assert_eq!(target, bssid(1));
            assert_eq!(mode, Mode::Simulation);
        }
        other => panic!("expected an attack, got {:?}", other),
    }
    assert_eq!(report.next_delay, Duration::from_secs(20));
    assert_eq!(orchestrator.state().cycle_state, CycleState::Idle);
    assert!(orchestrator.state().current_target.is_none());
    assert_eq!(orchestrator.model().history(&bssid(1)).unwrap().attempts, 1);
    assert!(path.exists());
}

#[tokio::test]
async fn test_corrupt_store_degrades_to_cold_start() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("learning.json");
    std::fs::write(&path, b"\x00\x01 definitely not json").unwrap();

    let now = Utc::now();
    let observations = Arc::new(ObservationStore::new());
    observations.upsert(network(1, -50, Encryption::Wpa2, now));

    let (mut orchestrator, handle) = builder(observations)
        .learning_store(LearningStore::new(&path))
        .build()
        .unwrap();

    assert!(orchestrator.model().is_empty());
    assert!(orchestrator.is_learning_degraded());
    assert!(handle.status().learning_degraded);
    assert!(dir.path().join("learning.json.corrupt").exists());

    // The first successful save clears the degraded flag
    orchestrator.step(now).await;
    assert!(!orchestrator.is_learning_degraded());
    assert!(path.exists());
}

#[tokio::test]
async fn test_unwritable_store_keeps_learning_in_memory() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();

    let now = Utc::now();
    let observations = Arc::new(ObservationStore::new());
    observations.upsert(network(1, -50, Encryption::Wpa2, now));
    let health = HealthRegistry::new();
    health.register(Component::LearningStore).await;

    let (mut orchestrator, handle) = builder(observations)
        .learning_store(LearningStore::new(blocker.join("learning.json")))
        .health(health.clone())
        .build()
        .unwrap();

    let report = orchestrator.step(now).await;

    assert!(matches!(report.outcome, CycleOutcome::Attacked { .. }));
    assert!(orchestrator.is_learning_degraded());
    assert!(handle.status().learning_degraded);
    assert_eq!(orchestrator.model().history(&bssid(1)).unwrap().attempts, 1);
    assert_eq!(
        health.status_of(Component::LearningStore).await,
        Some(ComponentStatus::Degraded)
    );
}

#[tokio::test]
async fn test_radio_error_recorded_as_failure() {
    let now = Utc::now();
    let observations = Arc::new(ObservationStore::new());
    observations.upsert(network(1, -50, Encryption::Wpa2, now));
    let health = HealthRegistry::new();

    let (mut orchestrator, _handle) = builder(observations)
        .simulator(Arc::new(BusyBackend))
        .health(health.clone())
        .build()
        .unwrap();

    let report = orchestrator.step(now).await;

    match report.outcome {
        CycleOutcome::Attacked { succeeded, .. } => assert!(!succeeded),
        other => panic!("expected an attack, got {:?}", other),
    }
    let history = orchestrator.model().history(&bssid(1)).unwrap();
    assert_eq!(history.attempts, 1);
    assert_eq!(history.successes, 0);
    assert_eq!(orchestrator.state().cycle_state, CycleState::Idle);
    assert_eq!(
        health.status_of(Component::Radio).await,
        Some(ComponentStatus::Degraded)
    );
}

#[tokio::test]
async fn test_capture_timeout_is_failed_attempt() {
    let now = Utc::now();
    let observations = Arc::new(ObservationStore::new());
    observations.upsert(network(1, -50, Encryption::Wpa2, now));

    let config = OrchestratorConfig {
        attack_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let (mut orchestrator, _handle) = builder(observations)
        .config(config)
        .simulator(Arc::new(HangingBackend))
        .build()
        .unwrap();

    let started = std::time::Instant::now();
    let report = orchestrator.step(now).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(
        report.outcome,
        CycleOutcome::Attacked {
            succeeded: false,
            ..
        }
    ));
    assert_eq!(orchestrator.state().cycle_state, CycleState::Idle);
}

#[tokio::test]
async fn test_target_not_reselected_within_cooldown() {
    let base = Utc::now();
    let observations = Arc::new(ObservationStore::new());
    let (mut orchestrator, _handle) = builder(observations.clone()).build().unwrap();
    let cooldown = chrono::Duration::from_std(orchestrator.config().selector.cooldown).unwrap();

    let mut attacked_at: Vec<DateTime<Utc>> = Vec::new();
    for tick in 0..12 {
        let now = base + chrono::Duration::seconds(tick * 15);
        observations.upsert(network(1, -45, Encryption::Wpa2, now));
        if let CycleOutcome::Attacked { bssid: target, .. } = orchestrator.step(now).await.outcome {
            assert_eq!(target, bssid(1));
            attacked_at.push(now);
        }
    }

    assert!(attacked_at.len() >= 2);
    for pair in attacked_at.windows(2) {
        assert!(pair[1] - pair[0] >= cooldown);
    }
}

fn no_cooldown() -> OrchestratorConfig {
    OrchestratorConfig {
        selector: crate::targeting::SelectorConfig {
            cooldown: Duration::ZERO,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_repeated_failures_shift_preference() {
    let now = Utc::now();
    let observations = Arc::new(ObservationStore::new());
    observations.upsert(network(1, -50, Encryption::Wpa2, now));
    observations.upsert(network(2, -50, Encryption::Wpa2, now));

    let (mut orchestrator, handle) = builder(observations)
        .config(no_cooldown())
        .simulator(Arc::new(FixedBackend::new(false)))
        .build()
        .unwrap();

    for i in 0..3 {
        handle.send(Command::Override(bssid(1))).unwrap();
        orchestrator.drain_commands().await;
        let at = now + chrono::Duration::seconds(i);
        match orchestrator.step(at).await.outcome {
            CycleOutcome::Attacked { bssid: target, .. } => assert_eq!(target, bssid(1)),
            other => panic!("expected an attack, got {:?}", other),
        }
    }
    assert_eq!(orchestrator.model().history(&bssid(1)).unwrap().successes, 0);

    let later = now + chrono::Duration::seconds(3);
    match orchestrator.step(later).await.outcome {
        CycleOutcome::Attacked { bssid: target, .. } => assert_eq!(target, bssid(2)),
        other => panic!("expected an attack, got {:?}", other),
    }
}

#[tokio::test]
async fn test_real_mode_needs_registered_backend() {
    let probe = Arc::new(SwitchableProbe::default());
    probe.present.store(true, Ordering::SeqCst);

    let (mut orchestrator, _handle) = builder(Arc::new(ObservationStore::new()))
        .probe(probe)
        .build()
        .unwrap();

    assert_eq!(orchestrator.reconcile_mode().await, Mode::Simulation);
    assert!(orchestrator.state().last_probe_ok);
}

#[tokio::test]
async fn test_real_actions_only_after_positive_probe() {
    let probe = Arc::new(SwitchableProbe::default());
    let real = Arc::new(GuardedBackend {
        last_probe: probe.last_answer.clone(),
        calls: AtomicUsize::new(0),
        violations: AtomicUsize::new(0),
    });
    let simulator = Arc::new(FixedBackend::new(false));
    let observations = Arc::new(ObservationStore::new());

    let (mut orchestrator, _handle) = builder(observations.clone())
        .config(no_cooldown())
        .simulator(simulator.clone())
        .real_backend(real.clone())
        .probe(probe.clone())
        .build()
        .unwrap();

    let mut rng = StdRng::seed_from_u64(99);
    let base = Utc::now();
    for tick in 0..60 {
        probe.present.store(rng.gen_bool(0.5), Ordering::SeqCst);
        let mode = orchestrator.reconcile_mode().await;
        assert_eq!(mode == Mode::Real, probe.last_answer.load(Ordering::SeqCst));

        // Radio unplugged after the probe: this cycle keeps its mode and
        // the next boundary falls back
        if rng.gen_bool(0.3) {
            probe.present.store(false, Ordering::SeqCst);
        }

        let now = base + chrono::Duration::seconds(tick);
        observations.upsert(network(1, -45, Encryption::Wpa2, now));
        let report = orchestrator.step(now).await;
        if let CycleOutcome::Attacked { mode: used, .. } = report.outcome {
            assert_eq!(used, mode);
        }
    }

    assert!(real.calls.load(Ordering::SeqCst) > 0);
    assert!(simulator.calls.load(Ordering::SeqCst) > 0);
    assert_eq!(real.violations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_override_bypasses_scoring_but_not_cooldown() {
    let now = Utc::now();
    let observations = Arc::new(ObservationStore::new());
    observations.upsert(network(1, -35, Encryption::Wpa2, now));
    observations.upsert(network(2, -80, Encryption::Open, now));

    let (mut orchestrator, handle) = builder(observations.clone()).build().unwrap();

    // Open networks are never picked by the selector, but an override wins
    handle.send(Command::Override(bssid(2))).unwrap();
    orchestrator.drain_commands().await;
    match orchestrator.step(now).await.outcome {
        CycleOutcome::Attacked { bssid: target, .. } => assert_eq!(target, bssid(2)),
        other => panic!("expected an attack, got {:?}", other),
    }

    // Same target again inside the cooldown: dropped, normal selection runs
    let soon = now + chrono::Duration::seconds(5);
    handle.send(Command::Override(bssid(2))).unwrap();
    orchestrator.drain_commands().await;
    match orchestrator.step(soon).await.outcome {
        CycleOutcome::Attacked { bssid: target, .. } => assert_eq!(target, bssid(1)),
        other => panic!("expected an attack, got {:?}", other),
    }
}

#[tokio::test]
async fn test_override_for_unknown_network_dropped() {
    let now = Utc::now();
    let observations = Arc::new(ObservationStore::new());
    observations.upsert(network(1, -35, Encryption::Wpa2, now));

    let (mut orchestrator, handle) = builder(observations).build().unwrap();
    handle.send(Command::Override(bssid(9))).unwrap();
    orchestrator.drain_commands().await;

    match orchestrator.step(now).await.outcome {
        CycleOutcome::Attacked { bssid: target, .. } => assert_eq!(target, bssid(1)),
        other => panic!("expected an attack, got {:?}", other),
    }
    // Consumed by exactly one cycle
    let later = now + chrono::Duration::seconds(1);
    assert_eq!(orchestrator.step(later).await.outcome, CycleOutcome::Idle);
}

#[tokio::test]
async fn test_run_honors_pause_and_shutdown() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("learning.json");
    let observations = Arc::new(ObservationStore::new());
    observations.upsert(network(1, -50, Encryption::Wpa2, Utc::now()));

    let config = OrchestratorConfig {
        inter_cycle_delay: Duration::from_millis(10),
        no_target_backoff: Duration::from_millis(10),
        ..Default::default()
    };
    let (orchestrator, handle) = builder(observations)
        .config(config)
        .learning_store(LearningStore::new(&path))
        .build()
        .unwrap();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let task = tokio::spawn(orchestrator.run(shutdown_rx));

    let mut status = handle.subscribe_status();
    tokio::time::timeout(Duration::from_secs(5), async {
        while status.borrow_and_update().cycle_count == 0 {
            status.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    handle.send(Command::Pause).unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !status.borrow_and_update().paused {
            status.changed().await.unwrap();
        }
    })
    .await
    .unwrap();
    let paused_at = handle.status().cycle_count;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handle.status().cycle_count, paused_at);

    shutdown_tx.send(()).unwrap();
    let final_state = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(final_state.cycle_state, CycleState::Idle);
    assert!(final_state.current_target.is_none());
    assert!(path.exists());
    assert!(!handle.is_available());
}

#[tokio::test]
async fn test_builder_rejects_invalid_config() {
    let mut config = OrchestratorConfig::default();
    config.scoring.weights.signal = -1.0;

    let result = builder(Arc::new(ObservationStore::new())).config(config).build();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_builder_requires_observations() {
    assert!(OrchestratorBuilder::new().build().is_err());
}


/// Backend whose deauth burst eats most of the budget and whose capture
/// never answers; records the budget it was handed for the capture
#[derive(Default)]
struct SlowDeauthBackend {
    capture_budget: std::sync::Mutex<Option<Duration>>,
}

#[async_trait]
impl AttackBackend for SlowDeauthBackend {
    async fn send_deauth(&self, _bssid: &Bssid, _channel: u16) -> Result<(), RadioError> {
        tokio::time::sleep(Duration::from_millis(180)).await;
        Ok(())
    }

    async fn capture_handshake(
        &self,
        _bssid: &Bssid,
        timeout: Duration,
    ) -> Result<bool, RadioError> {
        *self.capture_budget.lock().unwrap() = Some(timeout);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(true)
    }

    fn name(&self) -> &str {
        "slow-deauth"
    }
}

#[tokio::test]
async fn test_deauth_and_capture_share_one_budget() {
    let now = Utc::now();
    let observations = Arc::new(ObservationStore::new());
    observations.upsert(network(1, -50, Encryption::Wpa2, now));

    let budget = Duration::from_millis(200);
    let config = OrchestratorConfig {
        attack_timeout: budget,
        ..Default::default()
    };
    let backend = Arc::new(SlowDeauthBackend::default());
    let (mut orchestrator, _handle) = builder(observations)
        .config(config)
        .simulator(backend.clone())
        .build()
        .unwrap();

    let started = std::time::Instant::now();
    let report = orchestrator.step(now).await;
    let elapsed = started.elapsed();

    // Two separate budgets would take at least 380ms
    assert!(elapsed < Duration::from_millis(340), "attack took {:?}", elapsed);
    assert!(matches!(
        report.outcome,
        CycleOutcome::Attacked {
            succeeded: false,
            ..
        }
    ));

    let handed = backend.capture_budget.lock().unwrap().expect("capture was polled");
    assert!(handed < Duration::from_millis(100), "capture got {:?}", handed);
}

#[tokio::test]
async fn test_cooldown_survives_history_eviction() {
    let base = Utc::now();
    let observations = Arc::new(ObservationStore::new());
    let mut config = OrchestratorConfig::default();
    config.learning.max_tracked = 1;
    let cooldown = chrono::Duration::from_std(config.selector.cooldown).unwrap();

    let (mut orchestrator, _handle) = builder(observations.clone())
        .config(config)
        .simulator(Arc::new(FixedBackend::new(false)))
        .build()
        .unwrap();

    let mut picks: Vec<(DateTime<Utc>, Bssid)> = Vec::new();
    for tick in 0..12 {
        let now = base + chrono::Duration::seconds(tick * 20);
        observations.upsert(network(1, -45, Encryption::Wpa2, now));
        observations.upsert(network(2, -45, Encryption::Wpa2, now));
        if let CycleOutcome::Attacked { bssid: target, .. } = orchestrator.step(now).await.outcome {
            picks.push((now, target));
        }
        assert!(orchestrator.model().len() <= 1);
    }

    assert!(picks.iter().any(|(_, b)| *b == bssid(1)));
    assert!(picks.iter().any(|(_, b)| *b == bssid(2)));
    for target in [bssid(1), bssid(2)] {
        let times: Vec<_> = picks
            .iter()
            .filter(|(_, b)| *b == target)
            .map(|(at, _)| *at)
            .collect();
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= cooldown, "{} reselected early", target);
        }
    }
}

/// Capability check that never answers
struct WedgedRadioCheck;

#[async_trait]
impl CapabilityProbe for WedgedRadioCheck {
    async fn probe_capability(&self) -> bool {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        true
    }

    fn name(&self) -> &str {
        "stuck"
    }
}

#[tokio::test]
async fn test_unresponsive_radio_check_does_not_stall_cycle_or_shutdown() {
    let config = OrchestratorConfig {
        attack_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let (mut orchestrator, _handle) = builder(Arc::new(ObservationStore::new()))
        .config(config.clone())
        .probe(Arc::new(WedgedRadioCheck))
        .real_backend(Arc::new(FixedBackend::new(true)))
        .build()
        .unwrap();

    let started = std::time::Instant::now();
    assert_eq!(orchestrator.reconcile_mode().await, Mode::Simulation);
    assert!(!orchestrator.state().last_probe_ok);
    assert!(started.elapsed() < Duration::from_secs(5));

    let (orchestrator, _handle) = builder(Arc::new(ObservationStore::new()))
        .config(config)
        .probe(Arc::new(WedgedRadioCheck))
        .real_backend(Arc::new(FixedBackend::new(true)))
        .build()
        .unwrap();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let task = tokio::spawn(orchestrator.run(shutdown_rx));
    shutdown_tx.send(()).unwrap();

    let state = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("orchestrator stopped")
        .unwrap();
    assert_eq!(state.cycle_state, CycleState::Idle);
    assert_eq!(state.mode, Mode::Simulation);
}

#[tokio::test]
async fn test_repeated_radio_faults_mark_radio_unhealthy() {
    let now = Utc::now();
    let observations = Arc::new(ObservationStore::new());
    observations.upsert(network(1, -50, Encryption::Wpa2, now));
    observations.upsert(network(2, -55, Encryption::Wpa2, now));
    let health = HealthRegistry::with_fault_threshold(2);

    let (mut orchestrator, _handle) = builder(observations)
        .simulator(Arc::new(BusyBackend))
        .health(health.clone())
        .build()
        .unwrap();

    orchestrator.step(now).await;
    assert_eq!(
        health.status_of(Component::Radio).await,
        Some(ComponentStatus::Degraded)
    );

    orchestrator.step(now).await;
    let report = health.report().await;
    assert_eq!(
        report.components[&Component::Radio].status,
        ComponentStatus::Unhealthy
    );
    assert_eq!(report.components[&Component::Radio].consecutive_faults, 2);
}

#[tokio::test]
async fn test_reset_learning_persists_empty_model() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("learning.json");
    let now = Utc::now();
    let observations = Arc::new(ObservationStore::new());
    observations.upsert(network(1, -50, Encryption::Wpa2, now));

    let (mut orchestrator, handle) = builder(observations)
        .learning_store(LearningStore::new(&path))
        .build()
        .unwrap();
    orchestrator.step(now).await;
    let config = orchestrator.config().learning.clone();
    assert_eq!(LearningStore::new(&path).load(config.clone()).unwrap().len(), 1);

    handle.send(Command::ResetLearning).unwrap();
    orchestrator.drain_commands().await;

    assert!(orchestrator.model().is_empty());
    assert_eq!(handle.status().learning.total_attempts, 0);
    assert!(handle.targets().iter().all(|t| t.attempts == 0));
    assert!(LearningStore::new(&path).load(config).unwrap().is_empty());
}
