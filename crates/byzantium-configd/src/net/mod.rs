//! Network devices as the host reports them.

pub mod devices;

pub use devices::{list_wireless_devices, DeviceSource, SysfsDevices};

/// A device name as reported by the host's network subsystem (`wlan0`),
/// or an alias of one (`wlan0:1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetworkDevice(String);

impl NetworkDevice {
    pub fn new(name: impl Into<String>) -> Self {
        NetworkDevice(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Alias sub-interface `<device>:<number>` on the same physical device.
    pub fn alias(&self, number: u32) -> NetworkDevice {
        NetworkDevice(format!("{}:{}", self.physical(), number))
    }

    /// Name of the underlying physical device (the part before `:`).
    pub fn physical(&self) -> &str {
        self.0.split(':').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for NetworkDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NetworkDevice {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
