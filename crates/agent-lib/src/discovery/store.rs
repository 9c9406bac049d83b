//! Observation store
//!
//! Latest known state of every discovered network, keyed by BSSID. The
//! discovery loop is the producer; readers only ever get point-in-time copies.

use crate::models::{Bssid, NetworkObservation};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

/// Concurrent map of BSSID -> latest observation
#[derive(Debug, Default)]
pub struct ObservationStore {
    networks: DashMap<Bssid, NetworkObservation>,
}

impl ObservationStore {
    pub fn new() -> Self {
        Self {
            networks: DashMap::new(),
        }
    }

    /// Insert or refresh an observation.
    ///
    /// The first-seen timestamp of an already known BSSID is preserved; every
    /// other field is last-write-wins.
    pub fn upsert(&self, mut observation: NetworkObservation) {
        match self.networks.entry(observation.bssid) {
            Entry::Occupied(mut entry) => {
                observation.first_seen = entry.get().first_seen.min(observation.first_seen);
                entry.insert(observation);
            }
            Entry::Vacant(entry) => {
                debug!(
                    bssid = %observation.bssid,
                    ssid = %observation.ssid,
                    "New network discovered"
                );
                entry.insert(observation);
            }
        }
    }

    /// Insert a batch of observations from one scan
    pub fn upsert_batch(&self, observations: Vec<NetworkObservation>) {
        for observation in observations {
            self.upsert(observation);
        }
    }

    pub fn get(&self, bssid: &Bssid) -> Option<NetworkObservation> {
        self.networks.get(bssid).map(|r| r.clone())
    }

    /// Point-in-time copy of every observation, sorted by BSSID
    pub fn snapshot(&self) -> Vec<NetworkObservation> {
        let mut all: Vec<NetworkObservation> =
            self.networks.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|o| o.bssid);
        all
    }

    /// Drop networks not seen since `cutoff`; returns how many were removed
    pub fn prune_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.networks.len();
        self.networks.retain(|_, obs| obs.last_seen >= cutoff);
        before - self.networks.len()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}
