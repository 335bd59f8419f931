//! Error taxonomy of the configuration daemon.

use std::path::PathBuf;

use byzantium_common::InterfaceRole;
use thiserror::Error;

/// Why device enumeration came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDeviceReason {
    /// Nothing besides loopback and excluded devices exists.
    NoNetworkDevices,
    /// Devices exist but none is wireless-capable.
    NoWirelessDevices,
}

impl std::fmt::Display for NoDeviceReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoDeviceReason::NoNetworkDevices => write!(f, "no network interfaces found"),
            NoDeviceReason::NoWirelessDevices => write!(f, "no wireless interfaces found"),
        }
    }
}

/// Bring-up step a best-effort action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CommotionRoute,
    CaptivePortal,
    HostsFile,
    DnsmasqInclude,
    DnsmasqRestart,
    RoutingDaemon,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::CommotionRoute => "commotion-route",
            Step::CaptivePortal => "captive-portal",
            Step::HostsFile => "hosts-file",
            Step::DnsmasqInclude => "dnsmasq-include",
            Step::DnsmasqRestart => "dnsmasq-restart",
            Step::RoutingDaemon => "routing-daemon",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ConfigdError {
    #[error("{0}")]
    NoDevice(NoDeviceReason),

    #[error("no mesh interface could be configured (tried: {})", .tried.join(", "))]
    MeshUnavailable { tried: Vec<String> },

    #[error("{role} address allocation exhausted after {attempts} probes")]
    AllocationExhausted { role: InterfaceRole, attempts: u32 },

    #[error("invalid allocation request {prefix}/{mask}: generation mask is neither a netmask nor a host mask")]
    InvalidPrefix {
        prefix: std::net::Ipv4Addr,
        mask: std::net::Ipv4Addr,
    },

    #[error("{step} failed: {source}")]
    ExternalAction {
        step: Step,
        #[source]
        source: Box<ConfigdError>,
    },

    #[error("`{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to enumerate network devices: {0}")]
    Enumerate(#[source] std::io::Error),
}

impl ConfigdError {
    /// Wrap a failure of a best-effort bring-up step.
    pub fn external(step: Step, source: ConfigdError) -> Self {
        ConfigdError::ExternalAction {
            step,
            source: Box::new(source),
        }
    }
}
