//! Capability probes

use super::CapabilityProbe;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Link type reported by the kernel for radiotap (monitor mode) interfaces
pub const ARPHRD_IEEE80211_RADIOTAP: &str = "803";

/// Checks `/sys/class/net/<iface>/type` for a radiotap link type
#[derive(Debug, Clone)]
pub struct SysfsMonitorProbe {
    interface: String,
    sysfs_root: PathBuf,
}

impl SysfsMonitorProbe {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            sysfs_root: PathBuf::from("/sys"),
        }
    }

    /// Override the sysfs mount point (used in tests)
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    fn type_path(&self) -> PathBuf {
        self.sysfs_root
            .join("class")
            .join("net")
            .join(&self.interface)
            .join("type")
    }
}

#[async_trait]
impl CapabilityProbe for SysfsMonitorProbe {
    async fn probe_capability(&self) -> bool {
        let path = self.type_path();
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents.trim() == ARPHRD_IEEE80211_RADIOTAP,
            Err(e) => {
                debug!(
                    interface = %self.interface,
                    path = %path.display(),
                    error = %e,
                    "Monitor interface not present"
                );
                false
            }
        }
    }

    fn name(&self) -> &str {
        "sysfs"
    }
}

/// Probe with a constant answer, for simulation-only deployments
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedProbe(pub bool);

#[async_trait]
impl CapabilityProbe for FixedProbe {
    async fn probe_capability(&self) -> bool {
        self.0
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_type(root: &TempDir, iface: &str, value: &str) {
        let dir = root.path().join("class").join("net").join(iface);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("type"), value).unwrap();
    }

    #[tokio::test]
    async fn test_monitor_interface_detected() {
        let root = TempDir::new().unwrap();
        write_type(&root, "wlan0mon", "803\n");

        let probe = SysfsMonitorProbe::new("wlan0mon").with_sysfs_root(root.path());
        assert!(probe.probe_capability().await);
    }

    #[tokio::test]
    async fn test_managed_interface_rejected() {
        let root = TempDir::new().unwrap();
        write_type(&root, "wlan0", "1\n");

        let probe = SysfsMonitorProbe::new("wlan0").with_sysfs_root(root.path());
        assert!(!probe.probe_capability().await);
    }

    #[tokio::test]
    async fn test_missing_interface_rejected() {
        let root = TempDir::new().unwrap();
        let probe = SysfsMonitorProbe::new("wlan9mon").with_sysfs_root(root.path());
        assert!(!probe.probe_capability().await);
    }

    #[test]
    fn test_fixed_probe() {
        assert!(tokio_test::block_on(FixedProbe(true).probe_capability()));
        assert!(!tokio_test::block_on(FixedProbe::default().probe_capability()));
    }
}
