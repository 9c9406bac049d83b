//! Target scoring
//!
//! Pure mapping from an observation and its attack history to a desirability
//! score in [0, 1]. Identical inputs always give bit-identical output.

use crate::error::ConfigError;
use crate::learning::AttackHistory;
use crate::models::{Encryption, NetworkObservation};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Relative weight of each scoring term
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub signal: f64,
    pub encryption: f64,
    pub history: f64,
    pub time_of_day: f64,
    pub congestion: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            signal: 0.25,
            encryption: 0.25,
            history: 0.25,
            time_of_day: 0.10,
            congestion: 0.15,
        }
    }
}

impl ScoringWeights {
    fn as_array(&self) -> [(&'static str, f64); 5] {
        [
            ("weights.signal", self.signal),
            ("weights.encryption", self.encryption),
            ("weights.history", self.history),
            ("weights.time_of_day", self.time_of_day),
            ("weights.congestion", self.congestion),
        ]
    }

    pub fn total(&self) -> f64 {
        self.as_array().iter().map(|(_, w)| w).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, weight) in self.as_array() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be finite and non-negative, got {}", weight),
                ));
            }
        }
        if self.total() <= 0.0 {
            return Err(ConfigError::invalid("weights", "at least one weight must be positive"));
        }
        Ok(())
    }
}

/// Scoring parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    /// Attempts required before the observed success rate replaces the prior
    pub min_samples: u64,
    /// Value used for every history-derived term lacking data
    pub neutral_prior: f64,
    /// Signal at or below this maps to 0
    pub signal_floor_dbm: i32,
    /// Signal at or above this maps to 1
    pub signal_ceiling_dbm: i32,
    /// Congestion at which the congestion term drops to one half
    pub congestion_scale: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            min_samples: 3,
            neutral_prior: 0.5,
            signal_floor_dbm: -90,
            signal_ceiling_dbm: -30,
            congestion_scale: 5.0,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if !(0.0..=1.0).contains(&self.neutral_prior) {
            return Err(ConfigError::invalid(
                "neutral_prior",
                format!("must be within [0, 1], got {}", self.neutral_prior),
            ));
        }
        if self.signal_floor_dbm >= self.signal_ceiling_dbm {
            return Err(ConfigError::invalid(
                "signal_floor_dbm",
                "must be below signal_ceiling_dbm",
            ));
        }
        if !self.congestion_scale.is_finite() || self.congestion_scale <= 0.0 {
            return Err(ConfigError::invalid("congestion_scale", "must be positive"));
        }
        Ok(())
    }
}

/// Every term of a score, each in [0, 1], plus the weighted total.
/// Served per target on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub signal: f64,
    pub encryption: f64,
    pub history: f64,
    pub time_of_day: f64,
    pub congestion: f64,
    pub total: f64,
}

/// Score a network; `history` is `None` for never-attacked networks
pub fn score(
    observation: &NetworkObservation,
    history: Option<&AttackHistory>,
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> f64 {
    breakdown(observation, history, now, config).total
}

/// Score a network and keep every term
pub fn breakdown(
    observation: &NetworkObservation,
    history: Option<&AttackHistory>,
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> ScoreBreakdown {
    let signal = signal_term(observation.signal_dbm, config);
    let encryption = encryption_term(observation.encryption);
    let history_t = history_term(history, config);
    let time_of_day = time_of_day_term(history, now, config);
    let congestion = congestion_term(history, config);

    let w = &config.weights;
    let total_weight = w.total();
    let total = if total_weight > 0.0 {
        (w.signal * signal
            + w.encryption * encryption
            + w.history * history_t
            + w.time_of_day * time_of_day
            + w.congestion * congestion)
            / total_weight
    } else {
        config.neutral_prior
    };

    ScoreBreakdown {
        signal,
        encryption,
        history: history_t,
        time_of_day,
        congestion,
        total: sanitize(total, config.neutral_prior),
    }
}

/// Linear map of dBm onto [0, 1] between floor and ceiling
fn signal_term(signal_dbm: i32, config: &ScoringConfig) -> f64 {
    let floor = config.signal_floor_dbm as f64;
    let span = (config.signal_ceiling_dbm - config.signal_floor_dbm) as f64;
    if span <= 0.0 {
        return config.neutral_prior;
    }
    ((signal_dbm as f64 - floor) / span).clamp(0.0, 1.0)
}

fn encryption_term(encryption: Encryption) -> f64 {
    match encryption.effective() {
        Encryption::Open | Encryption::Wep => 1.0,
        Encryption::Wpa1 | Encryption::Wpa2 => 1.0,
        // Protected management frames blunt deauthentication
        Encryption::Wpa3 => 0.2,
        Encryption::Unknown => 1.0,
    }
}

fn history_term(history: Option<&AttackHistory>, config: &ScoringConfig) -> f64 {
    match history {
        Some(h) if h.attempts >= config.min_samples.max(1) => {
            h.successes as f64 / h.attempts as f64
        }
        _ => config.neutral_prior,
    }
}

/// Current hour's success rate relative to the network's own average
fn time_of_day_term(
    history: Option<&AttackHistory>,
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> f64 {
    let Some(history) = history else {
        return config.neutral_prior;
    };
    let (Some(bucket_rate), Some(overall_rate)) =
        (history.bucket(now.hour()).success_rate(), history.success_rate())
    else {
        return config.neutral_prior;
    };
    if overall_rate <= 0.0 {
        return config.neutral_prior;
    }
    (0.5 * bucket_rate / overall_rate).clamp(0.0, 1.0)
}

fn congestion_term(history: Option<&AttackHistory>, config: &ScoringConfig) -> f64 {
    match history {
        Some(h) if h.attempts > 0 && h.congestion.is_finite() && h.congestion >= 0.0 => {
            1.0 / (1.0 + h.congestion / config.congestion_scale)
        }
        _ => config.neutral_prior,
    }
}

fn sanitize(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback.clamp(0.0, 1.0)
    }
}
