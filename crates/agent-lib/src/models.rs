//! Core data models for the handshake agent

use crate::targeting::ScoreBreakdown;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 48-bit hardware address of an access point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bssid([u8; 6]);

impl Bssid {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

/// Error returned when a BSSID string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid BSSID `{0}`")]
pub struct ParseBssidError(pub String);

impl FromStr for Bssid {
    type Err = ParseBssidError;

    /// Accepts `AA:BB:CC:DD:EE:FF` or `aa-bb-cc-dd-ee-ff`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parts: Vec<&str> = trimmed.split(|c| c == ':' || c == '-').collect();
        if parts.len() != 6 {
            return Err(ParseBssidError(s.to_string()));
        }

        let mut octets = [0u8; 6];
        for (slot, part) in octets.iter_mut().zip(parts) {
            if part.len() != 2 {
                return Err(ParseBssidError(s.to_string()));
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| ParseBssidError(s.to_string()))?;
        }

        Ok(Self(octets))
    }
}

impl Serialize for Bssid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Bssid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Encryption class advertised by an access point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encryption {
    Open,
    Wep,
    Wpa1,
    Wpa2,
    Wpa3,
    /// Scanner could not classify the network
    Unknown,
}

impl Encryption {
    /// Encryption class used for scoring and filtering.
    ///
    /// Unknown encryption is treated as WPA2: attackable, primary class.
    pub fn effective(self) -> Encryption {
        match self {
            Encryption::Unknown => Encryption::Wpa2,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Encryption::Open => "open",
            Encryption::Wep => "wep",
            Encryption::Wpa1 => "wpa1",
            Encryption::Wpa2 => "wpa2",
            Encryption::Wpa3 => "wpa3",
            Encryption::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Encryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encryption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" | "none" => Ok(Encryption::Open),
            "wep" => Ok(Encryption::Wep),
            "wpa" | "wpa1" => Ok(Encryption::Wpa1),
            "wpa2" => Ok(Encryption::Wpa2),
            "wpa3" | "sae" => Ok(Encryption::Wpa3),
            "unknown" => Ok(Encryption::Unknown),
            other => Err(format!("unknown encryption class `{}`", other)),
        }
    }
}

/// Latest known state of one discovered network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkObservation {
    pub bssid: Bssid,
    /// Empty for hidden networks
    pub ssid: String,
    pub channel: u16,
    pub signal_dbm: i32,
    pub encryption: Encryption,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl NetworkObservation {
    /// Create an observation first and last seen at `seen_at`
    pub fn new(
        bssid: Bssid,
        ssid: impl Into<String>,
        channel: u16,
        signal_dbm: i32,
        encryption: Encryption,
        seen_at: DateTime<Utc>,
    ) -> Self {
        Self {
            bssid,
            ssid: ssid.into(),
            channel,
            signal_dbm,
            encryption,
            first_seen: seen_at,
            last_seen: seen_at,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.ssid.is_empty()
    }
}

/// Execution mode of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Simulation,
    Real,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Simulation => f.write_str("simulation"),
            Mode::Real => f.write_str("real"),
        }
    }
}

/// Position of the orchestrator within one attack cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Idle,
    Selecting,
    Attacking,
    AwaitingResult,
    Recording,
}

/// Agent mood shown on the display and dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Learning,
    Thinking,
    Hunting,
    Attacking,
    Excited,
    Smart,
}

impl Mood {
    pub fn face(&self) -> &'static str {
        match self {
            Mood::Learning => "(◕‿‿◕)",
            Mood::Thinking => "(◔_◔)",
            Mood::Hunting => "(⌐■_■)",
            Mood::Attacking => "(◣_◢)",
            Mood::Excited => "(ᵔ◡◡ᵔ)",
            Mood::Smart => "(✜‿‿✜)",
        }
    }
}

/// Point-in-time status published to the display and dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub mode: Mode,
    pub cycle_state: CycleState,
    pub current_target: Option<Bssid>,
    pub networks_count: usize,
    pub attacks_count: u64,
    pub handshakes_count: u64,
    /// Fraction of attacks that captured a handshake, in [0, 1]
    pub success_rate: f64,
    pub mood: Mood,
    pub face: String,
    pub cycle_count: u64,
    pub paused: bool,
    /// True while the learning model runs in-memory only
    pub learning_degraded: bool,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub learning: LearningSummary,
}

/// What the learning model has accumulated over the agent's lifetime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningSummary {
    pub total_attempts: u64,
    pub total_successes: u64,
    /// `total_successes / total_attempts`, 0 before the first attack
    pub success_rate: f64,
    pub networks_learned: usize,
    /// Channel with the most captured handshakes
    pub best_channel: Option<u16>,
    pub exploration_rate: f64,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            mode: Mode::Simulation,
            cycle_state: CycleState::Idle,
            current_target: None,
            networks_count: 0,
            attacks_count: 0,
            handshakes_count: 0,
            success_rate: 0.0,
            mood: Mood::Learning,
            face: Mood::Learning.face().to_string(),
            cycle_count: 0,
            paused: false,
            learning_degraded: false,
            last_cycle_at: None,
            learning: LearningSummary::default(),
        }
    }
}

/// One row of the ranked target list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    pub bssid: Bssid,
    pub ssid: String,
    pub channel: u16,
    pub signal_dbm: i32,
    pub encryption: Encryption,
    pub score: f64,
    /// Whether the selector would currently consider this network
    pub eligible: bool,
    pub attempts: u64,
    pub successes: u64,
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Unweighted terms behind `score`
    pub terms: ScoreBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bssid_parse_and_display() {
        let bssid: Bssid = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(bssid.to_string(), "AA:BB:CC:DD:EE:FF");

        let dashed: Bssid = "AA-BB-CC-DD-EE-FF".parse().unwrap();
        assert_eq!(bssid, dashed);
    }

    #[test]
    fn test_bssid_rejects_malformed() {
        assert!("aa:bb:cc:dd:ee".parse::<Bssid>().is_err());
        assert!("aa:bb:cc:dd:ee:gg".parse::<Bssid>().is_err());
        assert!("aabb:cc:dd:ee:ff:00".parse::<Bssid>().is_err());
        assert!("".parse::<Bssid>().is_err());
    }

    #[test]
    fn test_bssid_serde_as_string() {
        let bssid = Bssid::new([0xAA, 0xBB, 0xCC, 0x00, 0x11, 0x22]);
        let json = serde_json::to_string(&bssid).unwrap();
        assert_eq!(json, "\"AA:BB:CC:00:11:22\"");

        let back: Bssid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bssid);
    }

    #[test]
    fn test_unknown_encryption_is_wpa2() {
        assert_eq!(Encryption::Unknown.effective(), Encryption::Wpa2);
        assert_eq!(Encryption::Wpa3.effective(), Encryption::Wpa3);
    }

    #[test]
    fn test_encryption_from_str() {
        assert_eq!("WPA2".parse::<Encryption>().unwrap(), Encryption::Wpa2);
        assert_eq!("wpa".parse::<Encryption>().unwrap(), Encryption::Wpa1);
        assert_eq!("none".parse::<Encryption>().unwrap(), Encryption::Open);
        assert!("wpa4".parse::<Encryption>().is_err());
    }

    #[test]
    fn test_default_snapshot_is_idle_simulation() {
        let snapshot = StatusSnapshot::default();
        assert_eq!(snapshot.mode, Mode::Simulation);
        assert_eq!(snapshot.cycle_state, CycleState::Idle);
        assert_eq!(snapshot.face, Mood::Learning.face());
    }
}
