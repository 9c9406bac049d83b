//! Target scoring and selection

pub mod scoring;
pub mod selector;

pub use scoring::{breakdown, score, ScoreBreakdown, ScoringConfig, ScoringWeights};
pub use selector::{
    eligible_candidates, in_cooldown, is_eligible, rank_targets, select_target,
    select_target_exploring, Candidate, SelectorConfig,
};
