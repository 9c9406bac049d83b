//! Managed-mode scanning through `iwlist`
//!
//! Parses the cell listing printed by `iwlist <iface> scan` into
//! observations. Cells with an unparseable address are skipped.

use super::NetworkScanner;
use crate::models::{Bssid, Encryption, NetworkObservation};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Upper bound for one `iwlist` invocation
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(30);

/// Scanner backed by the `iwlist` wireless tool
pub struct IwlistScanner {
    interface: String,
    binary: String,
}

impl IwlistScanner {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            binary: "/sbin/iwlist".to_string(),
        }
    }

    /// Override the `iwlist` binary path
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }
}

#[async_trait]
impl NetworkScanner for IwlistScanner {
    async fn scan(&self) -> Result<Vec<NetworkObservation>> {
        let output = tokio::time::timeout(
            SCAN_TIMEOUT,
            Command::new(&self.binary)
                .arg(&self.interface)
                .arg("scan")
                .kill_on_drop(true)
                .output(),
        )
        .await
        .context("iwlist scan timed out")?
        .with_context(|| format!("Failed to run {}", self.binary))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("iwlist exited with {}: {}", output.status, stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let networks = parse_scan_output(&stdout, Utc::now());
        debug!(interface = %self.interface, networks = networks.len(), "iwlist scan parsed");
        Ok(networks)
    }

    fn name(&self) -> &str {
        "iwlist"
    }
}

/// Per-cell accumulator while walking the listing
struct CellBuilder {
    bssid: Bssid,
    ssid: String,
    channel: u16,
    signal_dbm: i32,
    key_enabled: bool,
    wpa1: bool,
    wpa2: bool,
    sae: bool,
}

impl CellBuilder {
    fn new(bssid: Bssid) -> Self {
        Self {
            bssid,
            ssid: String::new(),
            channel: 0,
            signal_dbm: -100,
            key_enabled: false,
            wpa1: false,
            wpa2: false,
            sae: false,
        }
    }

    fn encryption(&self) -> Encryption {
        if !self.key_enabled {
            Encryption::Open
        } else if self.sae {
            Encryption::Wpa3
        } else if self.wpa2 {
            Encryption::Wpa2
        } else if self.wpa1 {
            Encryption::Wpa1
        } else {
            Encryption::Wep
        }
    }

    fn finish(self, seen_at: DateTime<Utc>) -> NetworkObservation {
        let encryption = self.encryption();
        NetworkObservation::new(
            self.bssid,
            self.ssid,
            self.channel,
            self.signal_dbm,
            encryption,
            seen_at,
        )
    }
}

/// Parse the full output of `iwlist <iface> scan`
pub fn parse_scan_output(output: &str, seen_at: DateTime<Utc>) -> Vec<NetworkObservation> {
    let mut networks = Vec::new();
    let mut current: Option<CellBuilder> = None;

    for raw in output.lines() {
        let line = raw.trim();

        if line.starts_with("Cell ") {
            if let Some(cell) = current.take() {
                networks.push(cell.finish(seen_at));
            }
            let address = line
                .split("Address:")
                .nth(1)
                .map(str::trim)
                .unwrap_or_default();
            match address.parse::<Bssid>() {
                Ok(bssid) => current = Some(CellBuilder::new(bssid)),
                Err(e) => warn!(error = %e, "Skipping scan cell with invalid address"),
            }
            continue;
        }

        let Some(cell) = current.as_mut() else {
            continue;
        };

        if let Some(rest) = line.strip_prefix("ESSID:") {
            cell.ssid = rest.trim().trim_matches('"').to_string();
        } else if let Some(rest) = line.strip_prefix("Channel:") {
            if let Ok(channel) = rest.trim().parse() {
                cell.channel = channel;
            }
        } else if line.starts_with("Frequency:") {
            if let Some(channel) = parse_frequency_channel(line) {
                cell.channel = channel;
            }
        } else if line.contains("Signal level=") {
            if let Some(signal) = parse_signal_level(line) {
                cell.signal_dbm = signal;
            }
        } else if let Some(rest) = line.strip_prefix("Encryption key:") {
            cell.key_enabled = rest.trim().eq_ignore_ascii_case("on");
        } else if line.contains("IEEE 802.11i/WPA2") {
            cell.wpa2 = true;
        } else if line.contains("WPA Version 1") {
            cell.wpa1 = true;
        } else if line.starts_with("Authentication Suites") && line.contains("SAE") {
            cell.sae = true;
        }
    }

    if let Some(cell) = current.take() {
        networks.push(cell.finish(seen_at));
    }

    networks
}

/// `Frequency:2.437 GHz (Channel 6)` -> 6
fn parse_frequency_channel(line: &str) -> Option<u16> {
    let start = line.find("(Channel ")? + "(Channel ".len();
    let rest = &line[start..];
    let end = rest.find(')')?;
    rest[..end].trim().parse().ok()
}

/// `Quality=70/70  Signal level=-40 dBm` -> -40
fn parse_signal_level(line: &str) -> Option<i32> {
    let rest = line.split("Signal level=").nth(1)?;
    let value = rest.split_whitespace().next()?;
    // Some drivers report `-40/100` style levels
    let value = value.split('/').next()?;
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"wlan0     Scan completed :
          Cell 01 - Address: AA:BB:CC:DD:EE:01
                    Channel:6
                    Frequency:2.437 GHz (Channel 6)
                    Quality=70/70  Signal level=-40 dBm
                    Encryption key:on
                    ESSID:"HomeNet"
                    IE: IEEE 802.11i/WPA2 Version 1
                        Group Cipher : CCMP
                        Pairwise Ciphers (1) : CCMP
                        Authentication Suites (1) : PSK
          Cell 02 - Address: AA:BB:CC:DD:EE:02
                    Frequency:5.18 GHz (Channel 36)
                    Quality=40/70  Signal level=-72 dBm
                    Encryption key:off
                    ESSID:"CoffeeShop"
          Cell 03 - Address: AA:BB:CC:DD:EE:03
                    Channel:11
                    Quality=30/70  Signal level=-80 dBm
                    Encryption key:on
                    ESSID:""
          Cell 04 - Address: AA:BB:CC:DD:EE:04
                    Channel:1
                    Quality=50/70  Signal level=-60 dBm
                    Encryption key:on
                    ESSID:"Modern"
                    IE: IEEE 802.11i/WPA2 Version 1
                        Authentication Suites (1) : SAE
          Cell 05 - Address: AA:BB:CC:DD:EE:05
                    Channel:3
                    Quality=50/70  Signal level=-66 dBm
                    Encryption key:on
                    ESSID:"Legacy"
                    IE: WPA Version 1
"#;

    #[test]
    fn test_parse_sample_listing() {
        let seen_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let networks = parse_scan_output(SAMPLE, seen_at);

        assert_eq!(networks.len(), 5);

        let home = &networks[0];
        assert_eq!(home.bssid.to_string(), "AA:BB:CC:DD:EE:01");
        assert_eq!(home.ssid, "HomeNet");
        assert_eq!(home.channel, 6);
        assert_eq!(home.signal_dbm, -40);
        assert_eq!(home.encryption, Encryption::Wpa2);
        assert_eq!(home.last_seen, seen_at);

        let coffee = &networks[1];
        assert_eq!(coffee.channel, 36);
        assert_eq!(coffee.encryption, Encryption::Open);

        let hidden = &networks[2];
        assert!(hidden.is_hidden());
        assert_eq!(hidden.encryption, Encryption::Wep);

        assert_eq!(networks[3].encryption, Encryption::Wpa3);
        assert_eq!(networks[4].encryption, Encryption::Wpa1);
    }

    #[test]
    fn test_parse_skips_bad_address() {
        let output = "Cell 01 - Address: not-a-mac\n ESSID:\"x\"\n";
        let networks = parse_scan_output(output, Utc::now());
        assert!(networks.is_empty());
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_scan_output("wlan0     No scan results", Utc::now()).is_empty());
    }

    #[test]
    fn test_parse_signal_level_variants() {
        assert_eq!(parse_signal_level("Quality=70/70  Signal level=-40 dBm"), Some(-40));
        assert_eq!(parse_signal_level("Quality:0  Signal level=-55/100"), Some(-55));
        assert_eq!(parse_signal_level("Signal level=unknown"), None);
    }
}
