//! Duplicate-address probing.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use byzantium_common::Settings;

use crate::error::ConfigdError;
use crate::net::NetworkDevice;
use crate::shell::{CommandRunner, ShellCommand};

/// Answers whether an address already answers on the local segment.
pub trait ReachabilityProbe {
    /// `Ok(true)` when some host holds `addr`. An error means the probe
    /// itself could not run.
    fn in_use(&self, device: &NetworkDevice, addr: Ipv4Addr) -> Result<bool, ConfigdError>;
}

impl<T: ReachabilityProbe + ?Sized> ReachabilityProbe for &T {
    fn in_use(&self, device: &NetworkDevice, addr: Ipv4Addr) -> Result<bool, ConfigdError> {
        (**self).in_use(device, addr)
    }
}

/// Probes with `arping` in duplicate address detection mode.
///
/// `arping -D` exits successfully when nobody replied, i.e. the address is
/// free. Probes always go out on the physical device, never an alias.
pub struct ArpingProbe<R> {
    shell: R,
    arping: PathBuf,
    count: u32,
    timeout_secs: u64,
}

impl<R: CommandRunner> ArpingProbe<R> {
    pub fn new(shell: R, settings: &Settings) -> Self {
        Self {
            shell,
            arping: settings.configd.tools.arping.clone(),
            count: settings.configd.probe_count,
            timeout_secs: settings.configd.probe_timeout.as_secs().max(1),
        }
    }

    fn command(&self, device: &NetworkDevice, addr: Ipv4Addr) -> ShellCommand {
        ShellCommand::new(&self.arping)
            .arg("-c")
            .arg(self.count)
            .arg("-w")
            .arg(self.timeout_secs)
            .args(["-D", "-f", "-q", "-I"])
            .arg(device.physical())
            .arg(addr)
    }
}

impl<R: CommandRunner> ReachabilityProbe for ArpingProbe<R> {
    fn in_use(&self, device: &NetworkDevice, addr: Ipv4Addr) -> Result<bool, ConfigdError> {
        let output = self.shell.run(&self.command(device, addr))?;
        let in_use = !output.success();
        tracing::debug!(device = device.physical(), %addr, in_use, "arping probe");
        Ok(in_use)
    }
}
