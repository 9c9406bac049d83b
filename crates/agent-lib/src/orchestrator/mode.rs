//! Mode detection
//!
//! REAL mode needs both a registered injection backend and a capability
//! probe that just answered true. Everything else is SIMULATION.

use crate::models::Mode;
use crate::radio::CapabilityProbe;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Operator preference for the execution mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModePreference {
    /// REAL whenever the radio allows it
    #[default]
    Auto,
    /// Request REAL; still refused without a capable radio
    Real,
    /// Never leave SIMULATION
    Simulation,
}

impl fmt::Display for ModePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModePreference::Auto => f.write_str("auto"),
            ModePreference::Real => f.write_str("real"),
            ModePreference::Simulation => f.write_str("simulation"),
        }
    }
}

impl FromStr for ModePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ModePreference::Auto),
            "real" => Ok(ModePreference::Real),
            "simulation" | "sim" => Ok(ModePreference::Simulation),
            other => Err(format!("unknown mode `{}`", other)),
        }
    }
}

/// Outcome of one mode evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDecision {
    pub mode: Mode,
    pub probe_ok: bool,
    pub reason: &'static str,
}

/// Pure mode decision from the latest probe result
pub fn decide(
    probe_ok: bool,
    preference: ModePreference,
    real_backend_available: bool,
) -> ModeDecision {
    let (mode, reason) = if preference == ModePreference::Simulation {
        (Mode::Simulation, "simulation forced by operator")
    } else if !real_backend_available {
        (Mode::Simulation, "no injection backend registered")
    } else if !probe_ok {
        (Mode::Simulation, "no monitor-mode radio detected")
    } else {
        (Mode::Real, "monitor-mode radio detected")
    };
    ModeDecision {
        mode,
        probe_ok,
        reason,
    }
}

/// Probes the radio and applies [`decide`]
pub struct ModeDetector {
    probe: Arc<dyn CapabilityProbe>,
    preference: ModePreference,
    real_backend_available: bool,
}

impl ModeDetector {
    pub fn new(
        probe: Arc<dyn CapabilityProbe>,
        preference: ModePreference,
        real_backend_available: bool,
    ) -> Self {
        Self {
            probe,
            preference,
            real_backend_available,
        }
    }

    pub fn preference(&self) -> ModePreference {
        self.preference
    }

    pub fn set_preference(&mut self, preference: ModePreference) {
        self.preference = preference;
    }

    /// Probe the radio now and decide the mode for the next cycle.
    ///
    /// A probe that does not answer within `budget` counts as a failed one.
    pub async fn detect(&self, budget: Duration) -> ModeDecision {
        let probe_ok = match timeout(budget, self.probe.probe_capability()).await {
            Ok(answer) => answer,
            Err(_) => {
                warn!(
                    probe = self.probe.name(),
                    budget_ms = budget.as_millis() as u64,
                    "Capability probe timed out, assuming no capable radio"
                );
                false
            }
        };
        decide(probe_ok, self.preference, self.real_backend_available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::{async_trait, FixedProbe};

    const BUDGET: Duration = Duration::from_secs(1);

    #[test]
    fn test_failed_probe_always_simulation() {
        for preference in [
            ModePreference::Auto,
            ModePreference::Real,
            ModePreference::Simulation,
        ] {
            for backend in [true, false] {
                assert_eq!(decide(false, preference, backend).mode, Mode::Simulation);
            }
        }
    }

    #[test]
    fn test_real_requires_backend() {
        assert_eq!(decide(true, ModePreference::Auto, false).mode, Mode::Simulation);
        assert_eq!(decide(true, ModePreference::Auto, true).mode, Mode::Real);
        assert_eq!(decide(true, ModePreference::Real, true).mode, Mode::Real);
    }

    #[test]
    fn test_forced_simulation_wins() {
        let decision = decide(true, ModePreference::Simulation, true);
        assert_eq!(decision.mode, Mode::Simulation);
        assert!(decision.probe_ok);
    }

    #[test]
    fn test_preference_parsing() {
        assert_eq!("AUTO".parse::<ModePreference>(), Ok(ModePreference::Auto));
        assert_eq!("real".parse::<ModePreference>(), Ok(ModePreference::Real));
        assert_eq!(
            "simulation".parse::<ModePreference>(),
            Ok(ModePreference::Simulation)
        );
        assert!("turbo".parse::<ModePreference>().is_err());
    }

    #[tokio::test]
    async fn test_detector_uses_probe() {
        let mut detector =
            ModeDetector::new(Arc::new(FixedProbe(true)), ModePreference::Auto, true);
        assert_eq!(detector.detect(BUDGET).await.mode, Mode::Real);

        detector.set_preference(ModePreference::Simulation);
        assert_eq!(detector.detect(BUDGET).await.mode, Mode::Simulation);
    }

    /// Capability check stuck on a wedged driver
    struct WedgedRadioCheck;

    #[async_trait]
    impl CapabilityProbe for WedgedRadioCheck {
        async fn probe_capability(&self) -> bool {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            true
        }

        fn name(&self) -> &str {
            "stuck"
        }
    }

    #[tokio::test]
    async fn test_unresponsive_radio_check_falls_back_to_simulation() {
        let detector =
            ModeDetector::new(Arc::new(WedgedRadioCheck), ModePreference::Real, true);

        let started = std::time::Instant::now();
        let decision = detector.detect(Duration::from_millis(50)).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(decision.mode, Mode::Simulation);
        assert!(!decision.probe_ok);
    }
}
