//! Per-BSSID attack history

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Number of hour-of-day buckets
pub const HOURS_PER_DAY: usize = 24;

/// Attempts and successes within one hour-of-day bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourBucket {
    pub attempts: u32,
    pub successes: u32,
}

impl HourBucket {
    pub fn success_rate(&self) -> Option<f64> {
        if self.attempts == 0 {
            None
        } else {
            Some(self.successes as f64 / self.attempts as f64)
        }
    }
}

/// Learned statistics for one BSSID.
///
/// `successes <= attempts` holds for the totals and for every bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackHistory {
    pub attempts: u64,
    pub successes: u64,
    pub hourly: [HourBucket; HOURS_PER_DAY],
    /// Channel the network was on at the most recent attack
    pub channel: u16,
    /// Smoothed count of networks sharing that channel at attack time
    pub congestion: f64,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl Default for AttackHistory {
    fn default() -> Self {
        Self {
            attempts: 0,
            successes: 0,
            hourly: [HourBucket::default(); HOURS_PER_DAY],
            channel: 0,
            congestion: 0.0,
            last_attempt_at: None,
            last_success_at: None,
        }
    }
}

impl AttackHistory {
    /// Count one attack outcome at `timestamp`
    pub fn record(&mut self, succeeded: bool, timestamp: DateTime<Utc>) {
        let bucket = &mut self.hourly[timestamp.hour() as usize];
        bucket.attempts = bucket.attempts.saturating_add(1);
        self.attempts = self.attempts.saturating_add(1);

        if succeeded {
            // Saturation on attempts must never let successes overtake it
            bucket.successes = bucket.successes.saturating_add(1).min(bucket.attempts);
            self.successes = self.successes.saturating_add(1).min(self.attempts);
            self.last_success_at = Some(timestamp);
        }

        self.last_attempt_at = Some(timestamp);
    }

    /// Overall success rate, `None` before the first attempt
    pub fn success_rate(&self) -> Option<f64> {
        if self.attempts == 0 {
            None
        } else {
            Some(self.successes as f64 / self.attempts as f64)
        }
    }

    pub fn bucket(&self, hour: u32) -> &HourBucket {
        &self.hourly[(hour as usize) % HOURS_PER_DAY]
    }

    /// Check the counter invariants; used when loading persisted records
    pub fn is_consistent(&self) -> bool {
        self.successes <= self.attempts
            && self.congestion.is_finite()
            && self.congestion >= 0.0
            && self
                .hourly
                .iter()
                .all(|b| b.successes <= b.attempts)
    }
}
