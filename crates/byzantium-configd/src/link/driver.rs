//! Commands that change and report a device's wireless
//! state.
//!
//! [`IwconfigDriver`] uses the wireless-tools CLIs. Every configuration
//! command is followed by the inter-command delay: some chipsets (Atheros
//! in particular) silently reset and drop out of ad-hoc mode when they are
//! reconfigured too quickly.

use std::path::PathBuf;
use std::time::Duration;

use byzantium_common::{OperatingMode, Settings};

use crate::error::ConfigdError;
use crate::net::NetworkDevice;
use crate::shell::{CommandRunner, ShellCommand};

/// One wireless parameter to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSetting<'a> {
    Mode(OperatingMode),
    Essid(&'a str),
    Bssid(&'a str),
    Channel(u8),
}

/// Commands against a single wireless device.
pub trait LinkDriver {
    fn set_down(&self, device: &NetworkDevice) -> Result<(), ConfigdError>;
    fn set_up(&self, device: &NetworkDevice) -> Result<(), ConfigdError>;
    /// Apply one setting as a single discrete command.
    fn apply(&self, device: &NetworkDevice, setting: LinkSetting<'_>) -> Result<(), ConfigdError>;
    /// Raw multi-line status text for `device`.
    fn read_status(&self, device: &NetworkDevice) -> Result<String, ConfigdError>;
}

impl<T: LinkDriver + ?Sized> LinkDriver for &T {
    fn set_down(&self, device: &NetworkDevice) -> Result<(), ConfigdError> {
        (**self).set_down(device)
    }

    fn set_up(&self, device: &NetworkDevice) -> Result<(), ConfigdError> {
        (**self).set_up(device)
    }

    fn apply(&self, device: &NetworkDevice, setting: LinkSetting<'_>) -> Result<(), ConfigdError> {
        (**self).apply(device, setting)
    }

    fn read_status(&self, device: &NetworkDevice) -> Result<String, ConfigdError> {
        (**self).read_status(device)
    }
}

/// Drives devices with `ifconfig` and `iwconfig`.
pub struct IwconfigDriver<R> {
    shell: R,
    ifconfig: PathBuf,
    iwconfig: PathBuf,
    delay: Duration,
}

impl<R: CommandRunner> IwconfigDriver<R> {
    pub fn new(shell: R, settings: &Settings) -> Self {
        IwconfigDriver {
            shell,
            ifconfig: settings.configd.tools.ifconfig.clone(),
            iwconfig: settings.configd.tools.iwconfig.clone(),
            delay: settings.configd.inter_command_delay,
        }
    }

    fn ifconfig(&self, device: &NetworkDevice, action: &str) -> Result<(), ConfigdError> {
        let cmd = ShellCommand::new(&self.ifconfig)
            .args([device.as_str(), action])
            .delay_after(self.delay);
        self.shell.run_checked(&cmd).map(drop)
    }
}

impl<R: CommandRunner> LinkDriver for IwconfigDriver<R> {
    fn set_down(&self, device: &NetworkDevice) -> Result<(), ConfigdError> {
        self.ifconfig(device, "down")
    }

    fn set_up(&self, device: &NetworkDevice) -> Result<(), ConfigdError> {
        self.ifconfig(device, "up")
    }

    fn apply(&self, device: &NetworkDevice, setting: LinkSetting<'_>) -> Result<(), ConfigdError> {
        let (key, value) = match setting {
            LinkSetting::Mode(mode) => ("mode", mode.as_arg().to_string()),
            LinkSetting::Essid(essid) => ("essid", essid.to_string()),
            LinkSetting::Bssid(bssid) => ("ap", bssid.to_string()),
            LinkSetting::Channel(channel) => ("channel", channel.to_string()),
        };
        let cmd = ShellCommand::new(&self.iwconfig)
            .args([device.as_str(), key])
            .arg(value)
            .delay_after(self.delay);
        self.shell.run_checked(&cmd).map(drop)
    }

    fn read_status(&self, device: &NetworkDevice) -> Result<String, ConfigdError> {
        let cmd = ShellCommand::new(&self.iwconfig)
            .arg(device)
            .capture_output();
        let output = self.shell.run_checked(&cmd)?;
        Ok(output.lines().join("\n"))
    }
}
