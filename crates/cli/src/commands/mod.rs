//! CLI command implementations

pub mod control;
pub mod status;
