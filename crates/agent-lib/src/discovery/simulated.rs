//! Synthetic network source for headless and simulation runs

use super::NetworkScanner;
use crate::models::{Bssid, Encryption, NetworkObservation};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Static description of one synthetic access point
#[derive(Debug, Clone)]
struct SyntheticAp {
    bssid: Bssid,
    ssid: String,
    channel: u16,
    base_signal_dbm: i32,
    encryption: Encryption,
}

/// Scanner that reports a fixed population of access points with jittering signal
pub struct SimulatedScanner {
    aps: Vec<SyntheticAp>,
    /// Maximum signal deviation per scan, in dB
    jitter_db: i32,
    rng: Mutex<StdRng>,
}

const CHANNELS: &[u16] = &[1, 6, 11, 1, 6, 11, 36, 44];

const ENCRYPTIONS: &[Encryption] = &[
    Encryption::Wpa2,
    Encryption::Wpa2,
    Encryption::Wpa2,
    Encryption::Wpa1,
    Encryption::Wpa3,
    Encryption::Open,
];

impl SimulatedScanner {
    /// Generate `count` access points deterministically from `seed`
    pub fn new(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let aps = (0..count)
            .map(|i| SyntheticAp {
                bssid: Bssid::new([0x02, 0x5A, 0x11, rng.gen(), rng.gen(), i as u8]),
                ssid: format!("SimNet-{:02}", i),
                channel: CHANNELS[i % CHANNELS.len()],
                base_signal_dbm: rng.gen_range(-88..=-35),
                encryption: ENCRYPTIONS[rng.gen_range(0..ENCRYPTIONS.len())],
            })
            .collect();

        Self {
            aps,
            jitter_db: 4,
            rng: Mutex::new(rng),
        }
    }

    /// Set the per-scan signal jitter
    pub fn with_jitter(mut self, jitter_db: i32) -> Self {
        self.jitter_db = jitter_db.max(0);
        self
    }

    pub fn len(&self) -> usize {
        self.aps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aps.is_empty()
    }
}

impl Default for SimulatedScanner {
    fn default() -> Self {
        Self::new(12, 0x5EED)
    }
}

#[async_trait]
impl NetworkScanner for SimulatedScanner {
    async fn scan(&self) -> Result<Vec<NetworkObservation>> {
        let now = Utc::now();
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow::anyhow!("simulated scanner RNG poisoned"))?;

        let networks = self
            .aps
            .iter()
            .map(|ap| {
                let jitter = if self.jitter_db > 0 {
                    rng.gen_range(-self.jitter_db..=self.jitter_db)
                } else {
                    0
                };
                NetworkObservation::new(
                    ap.bssid,
                    ap.ssid.clone(),
                    ap.channel,
                    (ap.base_signal_dbm + jitter).clamp(-100, 0),
                    ap.encryption,
                    now,
                )
            })
            .collect();

        Ok(networks)
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
