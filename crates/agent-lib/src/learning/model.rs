//! Learning model
//!
//! Mutable per-BSSID statistics updated after every attack outcome, plus a
//! per-channel load estimate refreshed once per observation cycle.

use super::history::AttackHistory;
use crate::error::ConfigError;
use crate::models::{Bssid, NetworkObservation};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Default cap on tracked BSSIDs
pub const DEFAULT_MAX_TRACKED: usize = 500;

/// Default smoothing constant for the channel load estimate
pub const DEFAULT_CONGESTION_DECAY: f64 = 0.9;

/// Configuration for the learning model
#[derive(Debug, Clone, PartialEq)]
pub struct LearningConfig {
    /// Least recently attacked histories beyond this cap are evicted
    pub max_tracked: usize,
    /// Weight kept from the previous channel load on each cycle, in (0, 1)
    pub congestion_decay: f64,
    /// Persist after this many outcome updates
    pub persist_every: u32,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            max_tracked: DEFAULT_MAX_TRACKED,
            congestion_decay: DEFAULT_CONGESTION_DECAY,
            persist_every: 1,
        }
    }
}

impl LearningConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tracked == 0 {
            return Err(ConfigError::invalid("max_tracked", "must be at least 1"));
        }
        if !(self.congestion_decay > 0.0 && self.congestion_decay < 1.0) {
            return Err(ConfigError::invalid(
                "congestion_decay",
                format!("must be within (0, 1), got {}", self.congestion_decay),
            ));
        }
        if self.persist_every == 0 {
            return Err(ConfigError::invalid("persist_every", "must be at least 1"));
        }
        Ok(())
    }
}

/// Attack statistics for every tracked BSSID
#[derive(Debug, Clone)]
pub struct LearningModel {
    histories: HashMap<Bssid, AttackHistory>,
    /// Smoothed number of networks per channel
    channel_load: HashMap<u16, f64>,
    /// Last attempt of evicted BSSIDs, kept until the cooldown has passed
    evicted_attempts: HashMap<Bssid, DateTime<Utc>>,
    config: LearningConfig,
    updates_since_persist: u32,
}

impl LearningModel {
    pub fn new(config: LearningConfig) -> Self {
        Self {
            histories: HashMap::new(),
            channel_load: HashMap::new(),
            evicted_attempts: HashMap::new(),
            config,
            updates_since_persist: 0,
        }
    }

    /// Rebuild a model from persisted histories, applying the eviction cap
    pub fn from_histories(
        config: LearningConfig,
        histories: impl IntoIterator<Item = (Bssid, AttackHistory)>,
    ) -> Self {
        let mut model = Self::new(config);
        model.histories = histories.into_iter().collect();
        model.evict_excess(None);
        model
    }

    /// Record one attack outcome.
    ///
    /// Attempts (and successes, when `succeeded`) grow by exactly one, the
    /// hour bucket for `timestamp` is updated and the congestion estimate is
    /// refreshed from the current load of `channel`.
    pub fn record_outcome(
        &mut self,
        bssid: Bssid,
        channel: u16,
        succeeded: bool,
        timestamp: DateTime<Utc>,
    ) -> &AttackHistory {
        let congestion = self.channel_load.get(&channel).copied().unwrap_or(0.0);

        self.evicted_attempts.remove(&bssid);
        let history = self.histories.entry(bssid).or_default();
        history.record(succeeded, timestamp);
        history.channel = channel;
        history.congestion = congestion;

        self.updates_since_persist = self.updates_since_persist.saturating_add(1);
        self.evict_excess(Some(bssid));

        debug!(
            bssid = %bssid,
            channel = channel,
            succeeded = succeeded,
            congestion = congestion,
            "Recorded attack outcome"
        );

        self.histories.entry(bssid).or_default()
    }

    /// Apply one observation cycle to the channel load estimate.
    ///
    /// Call once per cycle, not per attack.
    pub fn observe_cycle(&mut self, observations: &[NetworkObservation]) {
        let mut counts: HashMap<u16, f64> = HashMap::new();
        for obs in observations {
            *counts.entry(obs.channel).or_insert(0.0) += 1.0;
        }

        let decay = self.config.congestion_decay;
        for load in self.channel_load.values_mut() {
            *load *= decay;
        }
        for (channel, count) in counts {
            let load = self.channel_load.entry(channel).or_insert(0.0);
            *load += (1.0 - decay) * count;
        }

        self.channel_load.retain(|_, load| *load >= 0.01);
    }

    pub fn history(&self, bssid: &Bssid) -> Option<&AttackHistory> {
        self.histories.get(bssid)
    }

    /// Most recent attempt on `bssid`, surviving eviction of its history
    pub fn last_attempt_at(&self, bssid: &Bssid) -> Option<DateTime<Utc>> {
        self.histories
            .get(bssid)
            .and_then(|h| h.last_attempt_at)
            .or_else(|| self.evicted_attempts.get(bssid).copied())
    }

    /// Forget evicted attempts older than `cutoff`
    pub fn prune_attempts_before(&mut self, cutoff: DateTime<Utc>) {
        self.evicted_attempts.retain(|_, at| *at >= cutoff);
    }

    pub fn histories(&self) -> impl Iterator<Item = (&Bssid, &AttackHistory)> {
        self.histories.iter()
    }

    pub fn channel_load(&self, channel: u16) -> f64 {
        self.channel_load.get(&channel).copied().unwrap_or(0.0)
    }

    /// Total (attempts, successes) across every tracked BSSID
    pub fn totals(&self) -> (u64, u64) {
        self.histories.values().fold((0, 0), |(a, s), h| {
            (a.saturating_add(h.attempts), s.saturating_add(h.successes))
        })
    }

    /// Channel with the most successes across tracked histories.
    /// Ties go to the lower channel; `None` until something succeeds.
    pub fn best_channel(&self) -> Option<u16> {
        let mut by_channel: HashMap<u16, u64> = HashMap::new();
        for history in self.histories.values().filter(|h| h.successes > 0) {
            *by_channel.entry(history.channel).or_insert(0) += history.successes;
        }
        by_channel
            .into_iter()
            .max_by(|(a_ch, a), (b_ch, b)| a.cmp(b).then(b_ch.cmp(a_ch)))
            .map(|(channel, _)| channel)
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// Whether enough outcomes accumulated since the last persist
    pub fn needs_persist(&self) -> bool {
        self.updates_since_persist >= self.config.persist_every
    }

    pub fn mark_persisted(&mut self) {
        self.updates_since_persist = 0;
    }

    /// Drop all learned statistics. Last attempts survive so that cooldown
    /// still holds for networks attacked just before the reset.
    pub fn reset(&mut self) {
        for (bssid, history) in self.histories.drain() {
            if let Some(at) = history.last_attempt_at {
                self.evicted_attempts.insert(bssid, at);
            }
        }
        self.channel_load.clear();
        self.updates_since_persist = 0;
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Evict least recently attacked histories beyond the cap, never `keep`
    fn evict_excess(&mut self, keep: Option<Bssid>) {
        while self.histories.len() > self.config.max_tracked {
            let oldest = self
                .histories
                .iter()
                .filter(|(bssid, _)| Some(**bssid) != keep)
                .min_by_key(|(bssid, h)| (h.last_attempt_at, **bssid))
                .map(|(bssid, _)| *bssid);

            match oldest {
                Some(bssid) => {
                    let evicted = self.histories.remove(&bssid);
                    if let Some(at) = evicted.and_then(|h| h.last_attempt_at) {
                        self.evicted_attempts.insert(bssid, at);
                    }
                    debug!(bssid = %bssid, "Evicted least recently attacked history");
                }
                None => break,
            }
        }
    }
}

impl Default for LearningModel {
    fn default() -> Self {
        Self::new(LearningConfig::default())
    }
}
