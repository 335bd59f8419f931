//! Link models shared between the settings layer and the configuration daemon.

use serde::Deserialize;

// ── Interface Role ──────────────────────────────────────────────────

/// Which side of the node an interface serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceRole {
    /// The ad-hoc link joining this node to its mesh peers.
    Mesh,
    /// The sub-interface ordinary client devices associate with.
    Client,
}

impl InterfaceRole {
    /// Settings section holding this role's addressing keys.
    pub fn section(&self) -> &'static str {
        match self {
            InterfaceRole::Mesh => "mesh",
            InterfaceRole::Client => "client",
        }
    }
}

impl std::fmt::Display for InterfaceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterfaceRole::Mesh => write!(f, "Mesh"),
            InterfaceRole::Client => write!(f, "Client"),
        }
    }
}

// ── Spectrum ────────────────────────────────────────────────────────

/// IEEE 802.11 band a channel number is interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Spectrum {
    Ghz2_4,
    Ghz3_6,
    Ghz5,
}

impl Spectrum {
    pub const ALL: [Spectrum; 3] = [Spectrum::Ghz2_4, Spectrum::Ghz3_6, Spectrum::Ghz5];

    pub fn as_str(&self) -> &'static str {
        match self {
            Spectrum::Ghz2_4 => "2.4GHz",
            Spectrum::Ghz3_6 => "3.6GHz",
            Spectrum::Ghz5 => "5GHz",
        }
    }
}

impl std::fmt::Display for Spectrum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Spectrum {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2.4GHz" => Ok(Spectrum::Ghz2_4),
            "3.6GHz" => Ok(Spectrum::Ghz3_6),
            "5GHz" => Ok(Spectrum::Ghz5),
            other => Err(format!("unknown spectrum: {other}")),
        }
    }
}

impl TryFrom<String> for Spectrum {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ── Operating Mode ──────────────────────────────────────────────────

/// Wireless operating mode of a device.
///
/// `iwconfig` takes the mode in lower case (`mode ad-hoc`) but reports it
/// capitalised (`Mode:Ad-Hoc`), so both spellings are carried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum OperatingMode {
    AdHoc,
    Managed,
    Master,
    Monitor,
}

impl OperatingMode {
    /// Argument spelling passed to the configuration tool.
    pub fn as_arg(&self) -> &'static str {
        match self {
            OperatingMode::AdHoc => "ad-hoc",
            OperatingMode::Managed => "managed",
            OperatingMode::Master => "master",
            OperatingMode::Monitor => "monitor",
        }
    }

    /// Spelling the status tool reports once the mode is active.
    pub fn reported(&self) -> &'static str {
        match self {
            OperatingMode::AdHoc => "Ad-Hoc",
            OperatingMode::Managed => "Managed",
            OperatingMode::Master => "Master",
            OperatingMode::Monitor => "Monitor",
        }
    }
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reported())
    }
}

impl std::str::FromStr for OperatingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ad-hoc" | "adhoc" => Ok(OperatingMode::AdHoc),
            "managed" => Ok(OperatingMode::Managed),
            "master" => Ok(OperatingMode::Master),
            "monitor" => Ok(OperatingMode::Monitor),
            other => Err(format!("unknown operating mode: {other}")),
        }
    }
}

impl TryFrom<String> for OperatingMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectrum_parses_settings_spelling() {
        for band in Spectrum::ALL {
            assert_eq!(band.as_str().parse::<Spectrum>().unwrap(), band);
        }
        assert!("2.4 GHz".parse::<Spectrum>().is_err());
    }

    #[test]
    fn operating_mode_accepts_both_spellings() {
        assert_eq!("ad-hoc".parse::<OperatingMode>().unwrap(), OperatingMode::AdHoc);
        assert_eq!("Ad-Hoc".parse::<OperatingMode>().unwrap(), OperatingMode::AdHoc);
        assert_eq!(OperatingMode::AdHoc.as_arg(), "ad-hoc");
        assert_eq!(OperatingMode::AdHoc.reported(), "Ad-Hoc");
        assert!("ibss".parse::<OperatingMode>().is_err());
    }

    #[test]
    fn role_labels() {
        assert_eq!(InterfaceRole::Mesh.to_string(), "Mesh");
        assert_eq!(InterfaceRole::Client.section(), "client");
    }
}
