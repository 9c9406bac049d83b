//! Target selection
//!
//! Filters observations by cooldown, encryption class, freshness and signal,
//! then picks the best score. Ties go to the most recently seen network.

use super::scoring::{breakdown, score, ScoreBreakdown, ScoringConfig};
use crate::error::ConfigError;
use crate::learning::LearningModel;
use crate::models::{Bssid, Encryption, NetworkObservation, TargetSummary};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Duration;

/// Selection rules
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorConfig {
    /// Minimum time between two selections of the same BSSID (default: 60s)
    pub cooldown: Duration,
    /// Observations older than this are not actionable (default: 5 minutes)
    pub freshness: Duration,
    /// Encryption classes eligible for attack
    pub attackable: HashSet<Encryption>,
    /// Networks weaker than this are skipped
    pub min_signal_dbm: Option<i32>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(60),
            freshness: Duration::from_secs(5 * 60),
            attackable: [Encryption::Wpa1, Encryption::Wpa2, Encryption::Wpa3]
                .into_iter()
                .collect(),
            min_signal_dbm: Some(-85),
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attackable.is_empty() {
            return Err(ConfigError::invalid(
                "attackable",
                "at least one encryption class must be attackable",
            ));
        }
        if self.freshness.is_zero() {
            return Err(ConfigError::invalid("freshness_secs", "must be non-zero"));
        }
        Ok(())
    }
}

/// A chosen target together with the score that won it
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub observation: NetworkObservation,
    pub score: f64,
}

impl Candidate {
    pub fn bssid(&self) -> Bssid {
        self.observation.bssid
    }
}

/// Whether `bssid` was attempted less than `cooldown` before `now`
pub fn in_cooldown(
    model: &LearningModel,
    bssid: &Bssid,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> bool {
    let Some(last) = model.last_attempt_at(bssid) else {
        return false;
    };
    match now.signed_duration_since(last).to_std() {
        Ok(elapsed) => elapsed < cooldown,
        // Attempt stamped in the future
        Err(_) => true,
    }
}

/// Whether an observation passes every selection filter
pub fn is_eligible(
    observation: &NetworkObservation,
    model: &LearningModel,
    now: DateTime<Utc>,
    config: &SelectorConfig,
) -> bool {
    if in_cooldown(model, &observation.bssid, now, config.cooldown) {
        return false;
    }
    if !config
        .attackable
        .contains(&observation.encryption.effective())
    {
        return false;
    }
    if let Ok(age) = now.signed_duration_since(observation.last_seen).to_std() {
        if age > config.freshness {
            return false;
        }
    }
    if let Some(min) = config.min_signal_dbm {
        if observation.signal_dbm < min {
            return false;
        }
    }
    true
}

/// Score every eligible candidate
pub fn eligible_candidates(
    observations: &[NetworkObservation],
    model: &LearningModel,
    now: DateTime<Utc>,
    selector: &SelectorConfig,
    scoring: &ScoringConfig,
) -> Vec<Candidate> {
    observations
        .iter()
        .filter(|obs| is_eligible(obs, model, now, selector))
        .map(|obs| Candidate {
            observation: obs.clone(),
            score: score(obs, model.history(&obs.bssid), now, scoring),
        })
        .collect()
}

/// Ordering used for ranking: score, then most recent sighting, then BSSID
fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.observation.last_seen.cmp(&a.observation.last_seen))
        .then_with(|| a.observation.bssid.cmp(&b.observation.bssid))
}

/// Pick the next attack target; `None` means an idle cycle
pub fn select_target(
    observations: &[NetworkObservation],
    model: &LearningModel,
    now: DateTime<Utc>,
    selector: &SelectorConfig,
    scoring: &ScoringConfig,
) -> Option<Candidate> {
    eligible_candidates(observations, model, now, selector, scoring)
        .into_iter()
        .min_by(rank)
}

/// Like [`select_target`], but with probability `exploration_rate` pick a
/// uniformly random eligible candidate instead of the best one
pub fn select_target_exploring<R: Rng + ?Sized>(
    observations: &[NetworkObservation],
    model: &LearningModel,
    now: DateTime<Utc>,
    selector: &SelectorConfig,
    scoring: &ScoringConfig,
    exploration_rate: f64,
    rng: &mut R,
) -> Option<Candidate> {
    let mut candidates = eligible_candidates(observations, model, now, selector, scoring);
    if candidates.is_empty() {
        return None;
    }
    if exploration_rate > 0.0 && rng.gen_bool(exploration_rate.clamp(0.0, 1.0)) {
        let index = rng.gen_range(0..candidates.len());
        return Some(candidates.swap_remove(index));
    }
    candidates.into_iter().min_by(rank)
}

/// Ranked view of every observation for the dashboard, best first
pub fn rank_targets(
    observations: &[NetworkObservation],
    model: &LearningModel,
    now: DateTime<Utc>,
    selector: &SelectorConfig,
    scoring: &ScoringConfig,
) -> Vec<TargetSummary> {
    let mut rows: Vec<(Candidate, ScoreBreakdown, bool)> = observations
        .iter()
        .map(|obs| {
            let terms = breakdown(obs, model.history(&obs.bssid), now, scoring);
            let candidate = Candidate {
                observation: obs.clone(),
                score: terms.total,
            };
            (candidate, terms, is_eligible(obs, model, now, selector))
        })
        .collect();
    rows.sort_by(|(a, _, a_ok), (b, _, b_ok)| b_ok.cmp(a_ok).then_with(|| rank(a, b)));

    rows.into_iter()
        .map(|(candidate, terms, eligible)| {
            let history = model.history(&candidate.observation.bssid);
            let obs = candidate.observation;
            TargetSummary {
                bssid: obs.bssid,
                ssid: obs.ssid,
                channel: obs.channel,
                signal_dbm: obs.signal_dbm,
                encryption: obs.encryption,
                score: candidate.score,
                eligible,
                attempts: history.map(|h| h.attempts).unwrap_or(0),
                successes: history.map(|h| h.successes).unwrap_or(0),
                last_attempt_at: history.and_then(|h| h.last_attempt_at),
                terms,
            }
        })
        .collect()
}
