//! Durable storage for the learning model
//!
//! One JSON document holding a record per BSSID, a schema version and a
//! SHA-256 checksum over the records. Writes go through a temp file and a
//! rename so a crash never leaves a half-written store behind.

use super::history::{AttackHistory, HourBucket, HOURS_PER_DAY};
use super::model::{LearningConfig, LearningModel};
use crate::error::PersistenceError;
use crate::models::Bssid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Current on-disk schema version
pub const SCHEMA_VERSION: u32 = 1;

/// One persisted BSSID record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub bssid: Bssid,
    pub attempts: u64,
    pub successes: u64,
    pub hourly: [HourBucket; HOURS_PER_DAY],
    pub channel: u16,
    pub congestion: f64,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl HistoryRecord {
    fn from_history(bssid: Bssid, history: &AttackHistory) -> Self {
        Self {
            bssid,
            attempts: history.attempts,
            successes: history.successes,
            hourly: history.hourly,
            channel: history.channel,
            congestion: history.congestion,
            last_attempt_at: history.last_attempt_at,
            last_success_at: history.last_success_at,
        }
    }

    fn into_history(self) -> (Bssid, AttackHistory) {
        (
            self.bssid,
            AttackHistory {
                attempts: self.attempts,
                successes: self.successes,
                hourly: self.hourly,
                channel: self.channel,
                congestion: self.congestion,
                last_attempt_at: self.last_attempt_at,
                last_success_at: self.last_success_at,
            },
        )
    }
}

/// Top-level persisted document
#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    schema_version: u32,
    saved_at: DateTime<Utc>,
    checksum: String,
    records: Vec<HistoryRecord>,
}

/// File-backed learning store
#[derive(Debug, Clone)]
pub struct LearningStore {
    path: PathBuf,
}

impl LearningStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted model.
    ///
    /// A missing file is a cold start and yields an empty model. Records that
    /// violate the counter invariants are dropped individually.
    pub fn load(&self, config: LearningConfig) -> Result<LearningModel, PersistenceError> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No learning store found, starting cold");
                return Ok(LearningModel::new(config));
            }
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let document: StoreDocument = serde_json::from_slice(&data)
            .map_err(|e| PersistenceError::Corrupt(e.to_string()))?;

        if document.schema_version != SCHEMA_VERSION {
            return Err(PersistenceError::UnsupportedVersion(document.schema_version));
        }

        let actual = checksum(&document.records)?;
        if actual != document.checksum {
            return Err(PersistenceError::ChecksumMismatch {
                expected: document.checksum,
                actual,
            });
        }

        let total = document.records.len();
        let histories: Vec<(Bssid, AttackHistory)> = document
            .records
            .into_iter()
            .map(HistoryRecord::into_history)
            .filter(|(bssid, history)| {
                let ok = history.is_consistent();
                if !ok {
                    warn!(bssid = %bssid, "Dropping inconsistent persisted history");
                }
                ok
            })
            .collect();

        info!(
            path = %self.path.display(),
            records = total,
            loaded = histories.len(),
            saved_at = %document.saved_at,
            "Loaded learning store"
        );

        Ok(LearningModel::from_histories(config, histories))
    }

    /// Persist the full history table
    pub fn save(&self, model: &LearningModel) -> Result<(), PersistenceError> {
        let mut records: Vec<HistoryRecord> = model
            .histories()
            .map(|(bssid, history)| HistoryRecord::from_history(*bssid, history))
            .collect();
        records.sort_by_key(|r| r.bssid);

        let document = StoreDocument {
            schema_version: SCHEMA_VERSION,
            saved_at: Utc::now(),
            checksum: checksum(&records)?,
            records,
        };
        let json = serde_json::to_vec_pretty(&document)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        let io_err = |source| PersistenceError::Io {
            path: temp_path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(io_err)?;
        file.write_all(&json).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        std::fs::rename(&temp_path, &self.path).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            path = %self.path.display(),
            records = document.records.len(),
            "Learning store saved"
        );
        Ok(())
    }

    /// Move an unreadable store aside so the next save does not destroy it
    pub fn quarantine(&self) -> Result<PathBuf, PersistenceError> {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        let target = PathBuf::from(name);

        std::fs::rename(&self.path, &target).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        warn!(
            path = %self.path.display(),
            moved_to = %target.display(),
            "Quarantined unreadable learning store"
        );
        Ok(target)
    }
}

/// Hex SHA-256 of the serialized records
fn checksum(records: &[HistoryRecord]) -> Result<String, PersistenceError> {
    let bytes = serde_json::to_vec(records)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
