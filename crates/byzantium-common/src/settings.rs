//! Node settings.
//!
//! Settings are read from a sectioned TOML file into a [`SettingsStore`],
//! which offers typed key lookups with defaults. The daemon resolves the
//! store into a [`Settings`] snapshot exactly once at start-up and passes
//! that snapshot by reference to every component that needs it.
//!
//! Keys keep their hyphenated spelling:
//!
//! ```toml
//! [mesh]
//! channel = 5
//! essid = "Byzantium"
//!
//! [configd]
//! max-tries = 15
//! inter-command-delay = 5
//! ```

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{InterfaceRole, OperatingMode, Spectrum};

/// Default settings location when `BYZANTIUM_CONFIG` is unset.
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/byzantium/configd.toml";

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("section [{section}] is not a table")]
    NotATable { section: String },
    #[error("[{section}] {key}: {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// ── Store ───────────────────────────────────────────────────────────

/// Raw sectioned key/value settings with typed lookups.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    root: toml::Table,
}

impl SettingsStore {
    pub fn from_toml_str(input: &str) -> Result<Self, SettingsError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let root: toml::Table = toml::from_str(input)?;
        Ok(Self { root })
    }

    /// Load settings from `path`. A missing file yields an empty store so
    /// that every lookup falls back to its default.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Look up `key` in `[section]`, converting it to `T`.
    ///
    /// Returns `Ok(None)` when the section or key is absent.
    pub fn get<T: DeserializeOwned>(
        &self,
        section: &str,
        key: &str,
    ) -> Result<Option<T>, SettingsError> {
        let Some(table) = self.root.get(section) else {
            return Ok(None);
        };
        let Some(table) = table.as_table() else {
            return Err(SettingsError::NotATable {
                section: section.to_string(),
            });
        };
        let Some(value) = table.get(key) else {
            return Ok(None);
        };
        value
            .clone()
            .try_into::<T>()
            .map(Some)
            .map_err(|e| SettingsError::InvalidValue {
                section: section.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    /// Look up `key` in `[section]`, falling back to `default` when absent.
    pub fn get_or<T: DeserializeOwned>(
        &self,
        section: &str,
        key: &str,
        default: T,
    ) -> Result<T, SettingsError> {
        Ok(self.get(section, key)?.unwrap_or(default))
    }
}

// ── Snapshot ────────────────────────────────────────────────────────

/// Network and masks a role allocates its address from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressingSettings {
    /// Network prefix with zeroed host octets (`ipv4_network`).
    pub network: Ipv4Addr,
    /// Range candidate addresses are generated in (`gen_netmask`).
    pub generation_mask: Ipv4Addr,
    /// Netmask assigned to the interface (`ipv4_netmask`).
    pub netmask: Ipv4Addr,
}

/// `[mesh]`: the ad-hoc link every Byzantium/Commotion node agrees on.
#[derive(Debug, Clone)]
pub struct MeshSettings {
    pub mode: OperatingMode,
    pub channel: u8,
    pub essid: String,
    pub bssid: String,
    pub spectrum: Spectrum,
    pub addressing: AddressingSettings,
}

/// `[client]`: the access sub-interface.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub addressing: AddressingSettings,
    /// Canonical name of this node in the generated hosts table.
    pub hostname: String,
}

/// `[commotion]`: range advertised by Commotion Wireless nodes.
#[derive(Debug, Clone)]
pub struct CommotionSettings {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

/// `[files]`: where generated artifacts are written.
#[derive(Debug, Clone)]
pub struct FileSettings {
    pub hosts_mesh: PathBuf,
    pub dnsmasq_include: PathBuf,
}

/// `[captive-portal]`
#[derive(Debug, Clone)]
pub struct CaptivePortalSettings {
    pub script: PathBuf,
}

/// Paths of the system utilities the daemon drives.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub ifconfig: PathBuf,
    pub iwconfig: PathBuf,
    pub route: PathBuf,
    pub arping: PathBuf,
    pub dnsmasq_init: PathBuf,
    pub olsrd: PathBuf,
}

/// `[configd]`: retry bounds, delays and tool locations.
#[derive(Debug, Clone)]
pub struct DaemonSettings {
    /// Apply/validate cycles per device before giving up on it.
    pub max_tries: u32,
    /// Pause after each wireless configuration command.
    pub inter_command_delay: Duration,
    /// Candidate addresses probed before allocation is abandoned.
    pub max_probe_attempts: u32,
    /// ARP requests sent per probe.
    pub probe_count: u32,
    /// Deadline for a single probe.
    pub probe_timeout: Duration,
    /// Alias index of the client sub-interface (`wlan0:1`).
    pub client_number: u32,
    /// Devices never considered for the mesh.
    pub exclude: Vec<String>,
    /// Argument passed to the DHCP/DNS init script.
    pub dnsmasq_action: String,
    pub tools: ToolPaths,
}

/// Immutable settings snapshot resolved once at start-up.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mesh: MeshSettings,
    pub client: ClientSettings,
    pub commotion: CommotionSettings,
    pub files: FileSettings,
    pub captive_portal: CaptivePortalSettings,
    pub configd: DaemonSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mesh: MeshSettings {
                mode: OperatingMode::AdHoc,
                channel: 5,
                essid: "Byzantium".into(),
                bssid: "02:CA:FF:EE:BA:BE".into(),
                spectrum: Spectrum::Ghz2_4,
                addressing: AddressingSettings {
                    network: Ipv4Addr::new(192, 168, 0, 0),
                    generation_mask: Ipv4Addr::new(255, 255, 0, 0),
                    netmask: Ipv4Addr::new(255, 255, 0, 0),
                },
            },
            client: ClientSettings {
                addressing: AddressingSettings {
                    network: Ipv4Addr::new(10, 0, 0, 0),
                    generation_mask: Ipv4Addr::new(255, 0, 0, 0),
                    netmask: Ipv4Addr::new(255, 255, 255, 0),
                },
                hostname: "byzantium.byzantium.mesh".into(),
            },
            commotion: CommotionSettings {
                network: Ipv4Addr::new(5, 0, 0, 0),
                netmask: Ipv4Addr::new(255, 0, 0, 0),
            },
            files: FileSettings {
                hosts_mesh: PathBuf::from("/etc/hosts.mesh"),
                dnsmasq_include: PathBuf::from("/etc/dnsmasq.conf.include"),
            },
            captive_portal: CaptivePortalSettings {
                script: PathBuf::from("/usr/local/sbin/captive_portal.py"),
            },
            configd: DaemonSettings {
                max_tries: 15,
                inter_command_delay: Duration::from_secs(5),
                max_probe_attempts: 32,
                probe_count: 5,
                probe_timeout: Duration::from_secs(3),
                client_number: 1,
                exclude: Vec::new(),
                dnsmasq_action: "restart".into(),
                tools: ToolPaths {
                    ifconfig: PathBuf::from("/sbin/ifconfig"),
                    iwconfig: PathBuf::from("/sbin/iwconfig"),
                    route: PathBuf::from("/sbin/route"),
                    arping: PathBuf::from("/sbin/arping"),
                    dnsmasq_init: PathBuf::from("/etc/rc.d/rc.dnsmasq"),
                    olsrd: PathBuf::from("/usr/sbin/olsrd"),
                },
            },
        }
    }
}

impl Settings {
    pub fn from_toml_str(input: &str) -> Result<Self, SettingsError> {
        Self::from_store(&SettingsStore::from_toml_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        Self::from_store(&SettingsStore::load(path)?)
    }

    /// Resolve a snapshot, taking every key absent from `store` from
    /// [`Settings::default`].
    pub fn from_store(store: &SettingsStore) -> Result<Self, SettingsError> {
        let d = Settings::default();

        let mesh = MeshSettings {
            mode: store.get_or("mesh", "mode", d.mesh.mode)?,
            channel: store.get_or("mesh", "channel", d.mesh.channel)?,
            essid: store.get_or("mesh", "essid", d.mesh.essid)?,
            bssid: store.get_or("mesh", "bssid", d.mesh.bssid)?,
            spectrum: store.get_or("mesh", "spectrum", d.mesh.spectrum)?,
            addressing: resolve_addressing(store, InterfaceRole::Mesh.section(), d.mesh.addressing)?,
        };

        let client = ClientSettings {
            addressing: resolve_addressing(store, InterfaceRole::Client.section(), d.client.addressing)?,
            hostname: store.get_or("client", "hostname", d.client.hostname)?,
        };

        let commotion = CommotionSettings {
            network: store.get_or("commotion", "ipv4_network", d.commotion.network)?,
            netmask: store.get_or("commotion", "ipv4_netmask", d.commotion.netmask)?,
        };

        let files = FileSettings {
            hosts_mesh: store.get_or("files", "hosts-mesh", d.files.hosts_mesh)?,
            dnsmasq_include: store.get_or("files", "dnsmasq-include", d.files.dnsmasq_include)?,
        };

        let captive_portal = CaptivePortalSettings {
            script: store.get_or("captive-portal", "script", d.captive_portal.script)?,
        };

        let c = d.configd;
        let configd = DaemonSettings {
            max_tries: store.get_or("configd", "max-tries", c.max_tries)?,
            inter_command_delay: Duration::from_secs(store.get_or(
                "configd",
                "inter-command-delay",
                c.inter_command_delay.as_secs(),
            )?),
            max_probe_attempts: store
                .get_or("configd", "max-probe-attempts", c.max_probe_attempts)?
                .max(1),
            probe_count: store.get_or("configd", "probe-count", c.probe_count)?.max(1),
            probe_timeout: Duration::from_secs(store.get_or(
                "configd",
                "probe-timeout",
                c.probe_timeout.as_secs(),
            )?),
            client_number: store.get_or("configd", "client-number", c.client_number)?,
            exclude: store.get_or("configd", "exclude", c.exclude)?,
            dnsmasq_action: store.get_or("configd", "dnsmasq-action", c.dnsmasq_action)?,
            tools: ToolPaths {
                ifconfig: store.get_or("configd", "ifconfig", c.tools.ifconfig)?,
                iwconfig: store.get_or("configd", "iwconfig", c.tools.iwconfig)?,
                route: store.get_or("configd", "route", c.tools.route)?,
                arping: store.get_or("configd", "arping", c.tools.arping)?,
                dnsmasq_init: store.get_or("configd", "dnsmasq-init", c.tools.dnsmasq_init)?,
                olsrd: store.get_or("configd", "olsrd", c.tools.olsrd)?,
            },
        };

        Ok(Settings {
            mesh,
            client,
            commotion,
            files,
            captive_portal,
            configd,
        })
    }

    /// Addressing keys for `role`.
    pub fn addressing(&self, role: InterfaceRole) -> &AddressingSettings {
        match role {
            InterfaceRole::Mesh => &self.mesh.addressing,
            InterfaceRole::Client => &self.client.addressing,
        }
    }
}

fn resolve_addressing(
    store: &SettingsStore,
    section: &str,
    defaults: AddressingSettings,
) -> Result<AddressingSettings, SettingsError> {
    Ok(AddressingSettings {
        network: store.get_or(section, "ipv4_network", defaults.network)?,
        generation_mask: store.get_or(section, "gen_netmask", defaults.generation_mask)?,
        netmask: store.get_or(section, "ipv4_netmask", defaults.netmask)?,
    })
}
