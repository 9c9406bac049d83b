//! Agent configuration
//!
//! An optional TOML file (path from `AGENT_CONFIG_FILE`) overlaid by
//! `AGENT_*` environment variables. Nested keys use `__`, for example
//! `AGENT_SELECTOR__COOLDOWN_SECS=90`.

use agent_lib::error::ConfigError;
use agent_lib::learning::LearningConfig;
use agent_lib::models::Encryption;
use agent_lib::orchestrator::{ModePreference, OrchestratorConfig};
use agent_lib::targeting::{ScoringConfig, ScoringWeights, SelectorConfig};
use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_FILE: &str = "/etc/handshake-agent/agent.toml";

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Name reported in structured logs
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// Port for health, metrics and the dashboard API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Location of the persisted learning store
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Monitor-mode interface probed for REAL mode; unset means simulation only
    #[serde(default)]
    pub monitor_interface: Option<String>,

    /// Operator mode preference at startup
    #[serde(default)]
    pub mode: ModePreference,

    #[serde(default)]
    pub cycle: CycleSettings,

    #[serde(default)]
    pub selector: SelectorSettings,

    #[serde(default)]
    pub scoring: ScoringSettings,

    #[serde(default)]
    pub learning: LearningSettings,

    #[serde(default)]
    pub discovery: DiscoverySettings,

    #[serde(default)]
    pub display: DisplaySettings,

    #[serde(default)]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CycleSettings {
    #[serde(default = "default_inter_cycle_delay")]
    pub inter_cycle_delay_secs: u64,
    #[serde(default = "default_no_target_backoff")]
    pub no_target_backoff_secs: u64,
    #[serde(default = "default_attack_timeout")]
    pub attack_timeout_secs: u64,
    #[serde(default)]
    pub exploration_rate: f64,
    /// Fixed seed for exploration, for reproducible runs
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectorSettings {
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    #[serde(default = "default_freshness")]
    pub freshness_secs: u64,
    #[serde(default = "default_attackable")]
    pub attackable: Vec<Encryption>,
    #[serde(default = "default_min_signal")]
    pub min_signal_dbm: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightSettings {
    #[serde(default = "default_weight_quarter")]
    pub signal: f64,
    #[serde(default = "default_weight_quarter")]
    pub encryption: f64,
    #[serde(default = "default_weight_quarter")]
    pub history: f64,
    #[serde(default = "default_weight_time_of_day")]
    pub time_of_day: f64,
    #[serde(default = "default_weight_congestion")]
    pub congestion: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightSettings,
    #[serde(default = "default_min_samples")]
    pub min_samples: u64,
    #[serde(default = "default_neutral_prior")]
    pub neutral_prior: f64,
    #[serde(default = "default_signal_floor")]
    pub signal_floor_dbm: i32,
    #[serde(default = "default_signal_ceiling")]
    pub signal_ceiling_dbm: i32,
    #[serde(default = "default_congestion_scale")]
    pub congestion_scale: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LearningSettings {
    #[serde(default = "default_max_tracked")]
    pub max_tracked: usize,
    #[serde(default = "default_congestion_decay")]
    pub congestion_decay: f64,
    #[serde(default = "default_persist_every")]
    pub persist_every: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScannerKind {
    #[default]
    Iwlist,
    Simulated,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default)]
    pub scanner: ScannerKind,
    /// Managed-mode interface used for scanning
    #[serde(default = "default_scan_interface")]
    pub interface: String,
    #[serde(default = "default_scan_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_retention")]
    pub retention_secs: u64,
    /// Population size for the simulated scanner
    #[serde(default = "default_simulated_networks")]
    pub simulated_networks: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "default_display_refresh")]
    pub refresh_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationSettings {
    /// Delay of each simulated deauth burst and capture wait
    #[serde(default = "default_simulated_latency")]
    pub latency_ms: u64,
}

fn default_node_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "handshake-agent".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_state_path() -> PathBuf {
    PathBuf::from("/var/lib/handshake-agent/learning.json")
}

fn default_inter_cycle_delay() -> u64 {
    20
}

fn default_no_target_backoff() -> u64 {
    5
}

fn default_attack_timeout() -> u64 {
    10
}

fn default_cooldown() -> u64 {
    60
}

fn default_freshness() -> u64 {
    300
}

fn default_attackable() -> Vec<Encryption> {
    vec![Encryption::Wpa1, Encryption::Wpa2, Encryption::Wpa3]
}

fn default_min_signal() -> Option<i32> {
    Some(-85)
}

fn default_weight_quarter() -> f64 {
    0.25
}

fn default_weight_time_of_day() -> f64 {
    0.10
}

fn default_weight_congestion() -> f64 {
    0.15
}

fn default_min_samples() -> u64 {
    3
}

fn default_neutral_prior() -> f64 {
    0.5
}

fn default_signal_floor() -> i32 {
    -90
}

fn default_signal_ceiling() -> i32 {
    -30
}

fn default_congestion_scale() -> f64 {
    5.0
}

fn default_max_tracked() -> usize {
    500
}

fn default_congestion_decay() -> f64 {
    0.9
}

fn default_persist_every() -> u32 {
    1
}

fn default_scan_interface() -> String {
    "wlan0".to_string()
}

fn default_scan_interval() -> u64 {
    15
}

fn default_retention() -> u64 {
    3600
}

fn default_simulated_networks() -> usize {
    12
}

fn default_display_refresh() -> u64 {
    30
}

fn default_simulated_latency() -> u64 {
    2000
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            inter_cycle_delay_secs: default_inter_cycle_delay(),
            no_target_backoff_secs: default_no_target_backoff(),
            attack_timeout_secs: default_attack_timeout(),
            exploration_rate: 0.0,
            rng_seed: None,
        }
    }
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            freshness_secs: default_freshness(),
            attackable: default_attackable(),
            min_signal_dbm: default_min_signal(),
        }
    }
}

impl Default for WeightSettings {
    fn default() -> Self {
        Self {
            signal: default_weight_quarter(),
            encryption: default_weight_quarter(),
            history: default_weight_quarter(),
            time_of_day: default_weight_time_of_day(),
            congestion: default_weight_congestion(),
        }
    }
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: WeightSettings::default(),
            min_samples: default_min_samples(),
            neutral_prior: default_neutral_prior(),
            signal_floor_dbm: default_signal_floor(),
            signal_ceiling_dbm: default_signal_ceiling(),
            congestion_scale: default_congestion_scale(),
        }
    }
}

impl Default for LearningSettings {
    fn default() -> Self {
        Self {
            max_tracked: default_max_tracked(),
            congestion_decay: default_congestion_decay(),
            persist_every: default_persist_every(),
        }
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            scanner: ScannerKind::default(),
            interface: default_scan_interface(),
            interval_secs: default_scan_interval(),
            retention_secs: default_retention(),
            simulated_networks: default_simulated_networks(),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            refresh_secs: default_display_refresh(),
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            latency_ms: default_simulated_latency(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from the config file and environment
    pub fn load() -> Result<Self> {
        let path = std::env::var("AGENT_CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path, None)
    }

    /// Load from `path` (absence tolerated), overlaid by `env` or, when
    /// `None`, the process environment
    pub fn load_from(path: &Path, env: Option<HashMap<String, String>>) -> Result<Self> {
        let environment = config::Environment::with_prefix("AGENT")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("selector.attackable")
            .try_parsing(true)
            .source(env);

        let config = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(environment)
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validate and convert into the orchestrator configuration
    pub fn orchestrator_config(&self) -> Result<OrchestratorConfig, ConfigError> {
        if self.discovery.interval_secs == 0 {
            return Err(ConfigError::invalid("discovery.interval_secs", "must be non-zero"));
        }
        if self.display.refresh_secs == 0 {
            return Err(ConfigError::invalid("display.refresh_secs", "must be non-zero"));
        }

        let weights = &self.scoring.weights;
        let config = OrchestratorConfig {
            inter_cycle_delay: Duration::from_secs(self.cycle.inter_cycle_delay_secs),
            no_target_backoff: Duration::from_secs(self.cycle.no_target_backoff_secs),
            attack_timeout: Duration::from_secs(self.cycle.attack_timeout_secs),
            exploration_rate: self.cycle.exploration_rate,
            selector: SelectorConfig {
                cooldown: Duration::from_secs(self.selector.cooldown_secs),
                freshness: Duration::from_secs(self.selector.freshness_secs),
                attackable: self.selector.attackable.iter().copied().collect(),
                min_signal_dbm: self.selector.min_signal_dbm,
            },
            scoring: ScoringConfig {
                weights: ScoringWeights {
                    signal: weights.signal,
                    encryption: weights.encryption,
                    history: weights.history,
                    time_of_day: weights.time_of_day,
                    congestion: weights.congestion,
                },
                min_samples: self.scoring.min_samples,
                neutral_prior: self.scoring.neutral_prior,
                signal_floor_dbm: self.scoring.signal_floor_dbm,
                signal_ceiling_dbm: self.scoring.signal_ceiling_dbm,
                congestion_scale: self.scoring.congestion_scale,
            },
            learning: LearningConfig {
                max_tracked: self.learning.max_tracked,
                congestion_decay: self.learning.congestion_decay,
                persist_every: self.learning.persist_every,
            },
        };
        config.validate()?;
        Ok(config)
    }
}
