//! Finds the wireless devices a mesh could run on.
//!
//! In production the device list comes from `/sys/class/net`; a device is
//! wireless when its sysfs directory has a `wireless/` subdirectory.

use std::path::PathBuf;

use super::NetworkDevice;
use crate::error::{ConfigdError, NoDeviceReason};

/// Loopback is never a mesh candidate.
pub const LOOPBACK: &str = "lo";

/// Where the host's network devices are listed.
pub trait DeviceSource {
    /// All network devices, in the order the host reports them.
    fn devices(&self) -> Result<Vec<String>, ConfigdError>;

    /// Whether `device` exposes the wireless capability marker.
    fn is_wireless(&self, device: &str) -> bool;
}

/// Reads devices from a sysfs `class/net` directory.
#[derive(Debug, Clone)]
pub struct SysfsDevices {
    root: PathBuf,
}

impl SysfsDevices {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for SysfsDevices {
    fn default() -> Self {
        Self::new("/sys/class/net")
    }
}

impl DeviceSource for SysfsDevices {
    fn devices(&self) -> Result<Vec<String>, ConfigdError> {
        let entries = std::fs::read_dir(&self.root).map_err(ConfigdError::Enumerate)?;
        Ok(entries
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect())
    }

    fn is_wireless(&self, device: &str) -> bool {
        self.root.join(device).join("wireless").is_dir()
    }
}

/// List wireless devices, skipping loopback and anything in `exclude`.
///
/// Fails with [`ConfigdError::NoDevice`] when nothing is left, either
/// before the wireless filter or after it.
pub fn list_wireless_devices(
    source: &dyn DeviceSource,
    exclude: &[String],
) -> Result<Vec<NetworkDevice>, ConfigdError> {
    let candidates: Vec<String> = source
        .devices()?
        .into_iter()
        .filter(|name| name != LOOPBACK && !exclude.contains(name))
        .collect();

    if candidates.is_empty() {
        tracing::error!("no network interfaces found");
        return Err(ConfigdError::NoDevice(NoDeviceReason::NoNetworkDevices));
    }

    let wireless: Vec<NetworkDevice> = candidates
        .into_iter()
        .filter(|name| source.is_wireless(name))
        .map(NetworkDevice::new)
        .collect();

    if wireless.is_empty() {
        tracing::error!("no wireless interfaces found");
        return Err(ConfigdError::NoDevice(NoDeviceReason::NoWirelessDevices));
    }

    tracing::info!(
        devices = ?wireless.iter().map(NetworkDevice::as_str).collect::<Vec<_>>(),
        "found wireless interfaces"
    );
    Ok(wireless)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::FakeDevices;

    fn names(devices: &[NetworkDevice]) -> Vec<&str> {
        devices.iter().map(NetworkDevice::as_str).collect()
    }

    #[test]
    fn keeps_only_wireless() {
        let source = FakeDevices::new(&["lo", "eth0", "wlan0"], &["wlan0"]);
        let found = list_wireless_devices(&source, &[]).unwrap();
        assert_eq!(names(&found), ["wlan0"]);
    }

    #[test]
    fn loopback_never_returned() {
        // even when loopback claims to be wireless
        let source = FakeDevices::new(&["lo", "wlan0"], &["lo", "wlan0"]);
        let found = list_wireless_devices(&source, &[]).unwrap();
        assert_eq!(names(&found), ["wlan0"]);
    }

    #[test]
    fn exclusions_respected_in_host_order() {
        let source = FakeDevices::new(&["wlan2", "wlan0", "wlan1"], &["wlan0", "wlan1", "wlan2"]);
        let found = list_wireless_devices(&source, &["wlan0".to_string()]).unwrap();
        assert_eq!(names(&found), ["wlan2", "wlan1"]);
    }

    #[test]
    fn only_loopback_is_no_network_devices() {
        let source = FakeDevices::new(&["lo"], &[]);
        let err = list_wireless_devices(&source, &[]).unwrap_err();
        assert!(matches!(
            err,
            ConfigdError::NoDevice(NoDeviceReason::NoNetworkDevices)
        ));
    }

    #[test]
    fn wired_only_is_no_wireless_devices() {
        let source = FakeDevices::new(&["lo", "eth0"], &[]);
        let err = list_wireless_devices(&source, &[]).unwrap_err();
        assert!(matches!(
            err,
            ConfigdError::NoDevice(NoDeviceReason::NoWirelessDevices)
        ));
    }

    #[test]
    fn excluding_every_wireless_device_fails() {
        let source = FakeDevices::new(&["eth0", "wlan0"], &["wlan0"]);
        let err = list_wireless_devices(&source, &["wlan0".to_string()]).unwrap_err();
        assert!(matches!(err, ConfigdError::NoDevice(_)));
    }

    #[test]
    fn sysfs_wireless_marker() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("lo")).unwrap();
        std::fs::create_dir_all(root.join("eth0")).unwrap();
        std::fs::create_dir_all(root.join("wlan0").join("wireless")).unwrap();

        let source = SysfsDevices::new(root);
        let mut all = source.devices().unwrap();
        all.sort();
        assert_eq!(all, ["eth0", "lo", "wlan0"]);
        assert!(source.is_wireless("wlan0"));
        assert!(!source.is_wireless("eth0"));

        let found = list_wireless_devices(&source, &[]).unwrap();
        assert_eq!(names(&found), ["wlan0"]);
    }

    #[test]
    fn missing_sysfs_is_an_enumeration_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = SysfsDevices::new(dir.path().join("class").join("net"));
        assert!(matches!(
            list_wireless_devices(&source, &[]),
            Err(ConfigdError::Enumerate(_))
        ));
    }
}
