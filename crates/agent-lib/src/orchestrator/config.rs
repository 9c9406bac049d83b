use crate::error::ConfigError;
use crate::learning::LearningConfig;
use crate::targeting::{ScoringConfig, SelectorConfig};
use std::time::Duration;

/// Timing and policy for the attack cycle
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Pause in IDLE after a completed attack (default: 20s)
    pub inter_cycle_delay: Duration,
    /// Pause in IDLE after a cycle that found no target (default: 5s)
    pub no_target_backoff: Duration,
    /// Budget shared by ATTACKING and AWAITING_RESULT together (default: 10s)
    pub attack_timeout: Duration,
    /// Probability of picking a random eligible candidate instead of the best
    pub exploration_rate: f64,
    pub selector: SelectorConfig,
    pub scoring: ScoringConfig,
    pub learning: LearningConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            inter_cycle_delay: Duration::from_secs(20),
            no_target_backoff: Duration::from_secs(5),
            attack_timeout: Duration::from_secs(10),
            exploration_rate: 0.0,
            selector: SelectorConfig::default(),
            scoring: ScoringConfig::default(),
            learning: LearningConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Check every setting; any error here is fatal at startup
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attack_timeout.is_zero() {
            return Err(ConfigError::invalid("attack_timeout_secs", "must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(ConfigError::invalid(
                "exploration_rate",
                format!("must be within [0, 1], got {}", self.exploration_rate),
            ));
        }
        self.selector.validate()?;
        self.scoring.validate()?;
        self.learning.validate()?;
        Ok(())
    }
}
