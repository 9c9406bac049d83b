//! Synthetic attack backend
//!
//! Outcomes are drawn at random, with the capture probability driven by the
//! score that selected the target, so the learning loop sees the same kind of
//! signal it would get from a real radio.

use super::AttackBackend;
use crate::error::RadioError;
use crate::models::Bssid;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Tunables for [`SimulatedRadio`]
#[derive(Debug, Clone)]
pub struct SimulatedRadioConfig {
    /// Delay applied to each deauth burst and capture wait
    pub latency: Duration,
    /// Capture probability for a target with score 0
    pub base_probability: f64,
    /// Added capture probability per unit of score
    pub score_gain: f64,
    /// Upper bound on the capture probability
    pub max_probability: f64,
}

impl Default for SimulatedRadioConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_secs(2),
            base_probability: 0.1,
            score_gain: 0.6,
            max_probability: 0.95,
        }
    }
}

/// Randomized stand-in for the radio I/O collaborator
pub struct SimulatedRadio {
    config: SimulatedRadioConfig,
    rng: Mutex<StdRng>,
    expected: Mutex<Option<(Bssid, f64)>>,
}

impl SimulatedRadio {
    pub fn new(config: SimulatedRadioConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            expected: Mutex::new(None),
        }
    }

    /// Simulator seeded from OS entropy
    pub fn from_entropy(config: SimulatedRadioConfig) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::from_entropy()),
            expected: Mutex::new(None),
        }
    }

    /// Capture probability for a target selected with `score`
    pub fn capture_probability(&self, score: f64) -> f64 {
        let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
        (self.config.base_probability + self.config.score_gain * score)
            .clamp(0.0, self.config.max_probability.clamp(0.0, 1.0))
    }

    fn score_for(&self, bssid: &Bssid) -> f64 {
        match self.expected.lock() {
            Ok(expected) => match *expected {
                Some((target, score)) if target == *bssid => score,
                _ => 0.5,
            },
            Err(_) => 0.5,
        }
    }

    fn roll(&self, probability: f64) -> Result<bool, RadioError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| RadioError::Busy("simulator state poisoned".to_string()))?;
        Ok(rng.gen_bool(probability))
    }
}

impl Default for SimulatedRadio {
    fn default() -> Self {
        Self::from_entropy(SimulatedRadioConfig::default())
    }
}

#[async_trait]
impl AttackBackend for SimulatedRadio {
    async fn send_deauth(&self, bssid: &Bssid, channel: u16) -> Result<(), RadioError> {
        debug!(bssid = %bssid, channel = channel, "Simulated deauth burst");
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
        Ok(())
    }

    async fn capture_handshake(
        &self,
        bssid: &Bssid,
        timeout: Duration,
    ) -> Result<bool, RadioError> {
        if self.config.latency > timeout {
            tokio::time::sleep(timeout).await;
            return Err(RadioError::Timeout);
        }
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        let probability = self.capture_probability(self.score_for(bssid));
        let captured = self.roll(probability)?;
        debug!(
            bssid = %bssid,
            probability = probability,
            captured = captured,
            "Simulated capture result"
        );
        Ok(captured)
    }

    fn expect_target(&self, bssid: &Bssid, score: f64) {
        if let Ok(mut expected) = self.expected.lock() {
            *expected = Some((*bssid, score));
        }
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
