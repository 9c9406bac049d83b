//! Learning model and its persistence
//!
//! Per-BSSID attack statistics fed back from every recorded outcome. The
//! model is owned by the orchestrator; the store keeps it across restarts.

mod history;
mod model;
mod store;

pub use history::{AttackHistory, HourBucket, HOURS_PER_DAY};
pub use model::{LearningConfig, LearningModel, DEFAULT_CONGESTION_DECAY, DEFAULT_MAX_TRACKED};
pub use store::{HistoryRecord, LearningStore, SCHEMA_VERSION};
