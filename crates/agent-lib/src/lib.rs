//! Core library for the handshake agent
//!
//! This crate provides:
//! - Network discovery and the observation store
//! - Target scoring and selection
//! - The learning model and its persistence
//! - The attack orchestrator and mode detection
//! - Display push loop and dashboard API
//! - Health checks and observability

pub mod dashboard;
pub mod discovery;
pub mod display;
pub mod error;
pub mod health;
pub mod learning;
pub mod models;
pub mod observability;
pub mod orchestrator;
pub mod radio;
pub mod targeting;

pub use error::{ConfigError, PersistenceError, RadioError};
pub use health::{Component, ComponentHealth, ComponentStatus, HealthRegistry, HealthReport};
pub use models::*;
pub use observability::{AgentMetrics, StructuredLogger};
