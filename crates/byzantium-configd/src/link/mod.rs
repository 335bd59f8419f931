//! # Link Configuration
//!
//! Drives a wireless device into the mesh's operating state and proves it
//! got there. Each attempt moves through:
//!
//! ```text
//! Down → Configuring → Validating → Up
//!            ↑             │
//!            └─────────────┘ mismatch, attempts remain
//!                          ↓
//!                        Failed
//! ```
//!
//! Validation reads the device's live status back and compares mode,
//! ESSID, BSSID and the frequency of the requested channel exactly.

use std::fmt;
use std::net::Ipv4Addr;

use byzantium_common::settings::MeshSettings;
use byzantium_common::{InterfaceRole, OperatingMode, Spectrum};

use crate::net::NetworkDevice;
use crate::wireless::{frequency_of, Frequency};

pub mod configurator;
pub mod driver;

pub use configurator::{Configure, LinkConfigurator};
pub use driver::{IwconfigDriver, LinkDriver, LinkSetting};

/// Requested wireless parameters of a link.
///
/// The frequency is always derived from channel and spectrum so the two
/// can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    pub mode: OperatingMode,
    pub channel: u8,
    pub essid: String,
    pub bssid: String,
    pub spectrum: Spectrum,
}

impl LinkSpec {
    pub fn from_settings(mesh: &MeshSettings) -> Self {
        LinkSpec {
            mode: mesh.mode,
            channel: mesh.channel,
            essid: mesh.essid.clone(),
            bssid: mesh.bssid.clone(),
            spectrum: mesh.spectrum,
        }
    }

    /// Centre frequency of the requested channel, `None` if the channel is
    /// not allocated in the requested spectrum.
    pub fn frequency(&self) -> Option<Frequency> {
        frequency_of(self.channel, self.spectrum)
    }
}

/// An interface being brought up, with whatever has been established so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceState {
    pub device: NetworkDevice,
    pub role: InterfaceRole,
    pub spec: LinkSpec,
    pub assigned_address: Option<Ipv4Addr>,
    pub netmask: Ipv4Addr,
    /// Set only once the live status matched `spec` after the last apply.
    pub validated: bool,
}

impl InterfaceState {
    pub fn new(device: NetworkDevice, role: InterfaceRole, spec: LinkSpec, netmask: Ipv4Addr) -> Self {
        InterfaceState {
            device,
            role,
            spec,
            assigned_address: None,
            netmask,
            validated: false,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.validated
    }
}

/// Lifecycle phase of one `configure` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkPhase {
    #[default]
    Down,
    Configuring,
    Validating,
    Up,
    Failed,
}

impl LinkPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkPhase::Down => "down",
            LinkPhase::Configuring => "configuring",
            LinkPhase::Validating => "validating",
            LinkPhase::Up => "up",
            LinkPhase::Failed => "failed",
        }
    }
}

/// A field compared during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    Mode,
    Essid,
    Bssid,
    Frequency,
}

impl fmt::Display for LinkField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkField::Mode => write!(f, "mode"),
            LinkField::Essid => write!(f, "ESSID"),
            LinkField::Bssid => write!(f, "BSSID"),
            LinkField::Frequency => write!(f, "frequency"),
        }
    }
}

/// Why a device did not validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// The live value of `field` differs from the requested one.
    Mismatch {
        field: LinkField,
        expected: String,
        found: Option<String>,
    },
    /// Applying settings or reading status failed outright.
    Driver(String),
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::Mismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "wrong {field} ({}), expected {expected}",
                found.as_deref().unwrap_or("unset")
            ),
            ValidationFailure::Driver(reason) => write!(f, "driver error: {reason}"),
        }
    }
}

/// Result of driving one device through configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The device validated after being brought up.
    Up(InterfaceState),
    /// The attempt budget ran out, or the device lost its settings on the
    /// way up.
    Failed {
        state: InterfaceState,
        attempts: u32,
        failure: ValidationFailure,
    },
}

impl LinkOutcome {
    pub fn phase(&self) -> LinkPhase {
        match self {
            LinkOutcome::Up(_) => LinkPhase::Up,
            LinkOutcome::Failed { .. } => LinkPhase::Failed,
        }
    }

    pub fn state(&self) -> &InterfaceState {
        match self {
            LinkOutcome::Up(state) | LinkOutcome::Failed { state, .. } => state,
        }
    }
}
