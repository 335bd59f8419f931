//! In-memory stand-ins for the host: a recording shell, a fake device
//! list, a simulated radio, scripted probes and collaborators.
//!
//! Used by unit tests in this crate and by the integration tests under
//! `tests/`.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use byzantium_common::{InterfaceRole, OperatingMode, Spectrum};

use crate::addr::{AddressAllocationRequest, Allocate, ReachabilityProbe};
use crate::error::ConfigdError;
use crate::fs::FileWriter;
use crate::link::{Configure, InterfaceState, LinkDriver, LinkOutcome, LinkSetting, ValidationFailure};
use crate::net::{DeviceSource, NetworkDevice};
use crate::shell::{CommandOutput, CommandRunner, ShellCommand};
use crate::wireless::frequency_of;

/// Records every command and answers from a per-program script.
///
/// Programs are matched by file name (`iwconfig`, not `/sbin/iwconfig`).
/// Unscripted programs succeed with no output.
#[derive(Default)]
pub struct RecordingShell {
    commands: RefCell<Vec<ShellCommand>>,
    responses: RefCell<HashMap<String, Vec<String>>>,
    failing: RefCell<HashSet<String>>,
    missing: RefCell<HashSet<String>>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured stdout for `program`.
    pub fn respond(&self, program: &str, lines: &[&str]) {
        self.responses.borrow_mut().insert(
            program.to_string(),
            lines.iter().map(|l| l.to_string()).collect(),
        );
    }

    /// Make `program` exit unsuccessfully.
    pub fn fail(&self, program: &str) {
        self.failing.borrow_mut().insert(program.to_string());
    }

    /// Make `program` impossible to start.
    pub fn missing(&self, program: &str) {
        self.missing.borrow_mut().insert(program.to_string());
    }

    pub fn commands(&self) -> Vec<ShellCommand> {
        self.commands.borrow().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.commands.borrow().iter().map(|c| c.to_string()).collect()
    }

    /// Commands run for `program`.
    pub fn runs_of(&self, program: &str) -> Vec<ShellCommand> {
        self.commands
            .borrow()
            .iter()
            .filter(|c| c.program_name() == program)
            .cloned()
            .collect()
    }
}

impl CommandRunner for RecordingShell {
    fn run(&self, cmd: &ShellCommand) -> Result<CommandOutput, ConfigdError> {
        self.commands.borrow_mut().push(cmd.clone());
        let program = cmd.program_name();

        if self.missing.borrow().contains(program) {
            return Err(ConfigdError::Command {
                command: cmd.to_string(),
                reason: "No such file or directory (os error 2)".into(),
            });
        }

        let success = !self.failing.borrow().contains(program);
        Ok(if cmd.background {
            if !success {
                return Err(ConfigdError::Command {
                    command: cmd.to_string(),
                    reason: "failed to spawn".into(),
                });
            }
            CommandOutput::Spawned { pid: 4242 }
        } else if cmd.capture {
            CommandOutput::Lines {
                success,
                lines: self
                    .responses
                    .borrow()
                    .get(program)
                    .cloned()
                    .unwrap_or_default(),
            }
        } else {
            CommandOutput::Completed {
                success,
                code: Some(if success { 0 } else { 1 }),
            }
        })
    }
}

/// A fixed device list with a fixed set of wireless devices.
pub struct FakeDevices {
    all: Vec<String>,
    wireless: HashSet<String>,
}

impl FakeDevices {
    pub fn new(all: &[&str], wireless: &[&str]) -> Self {
        Self {
            all: all.iter().map(|d| d.to_string()).collect(),
            wireless: wireless.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl DeviceSource for FakeDevices {
    fn devices(&self) -> Result<Vec<String>, ConfigdError> {
        Ok(self.all.clone())
    }

    fn is_wireless(&self, device: &str) -> bool {
        self.wireless.contains(device)
    }
}

#[derive(Debug, Clone)]
struct RadioState {
    mode: OperatingMode,
    essid: Option<String>,
    bssid: Option<String>,
    channel: Option<u8>,
}

impl Default for RadioState {
    fn default() -> Self {
        Self {
            mode: OperatingMode::Managed,
            essid: None,
            bssid: None,
            channel: None,
        }
    }
}

/// A simulated wireless chipset driven through [`LinkDriver`].
///
/// Status is rendered as `iwconfig` text from whatever was applied, so the
/// real status parser is exercised.
pub struct FakeRadio {
    state: RefCell<RadioState>,
    spectrum: Spectrum,
    calls: RefCell<Vec<String>>,
    /// Mode changes still to be ignored; `None` ignores them forever.
    dropped_modes: Cell<Option<u32>>,
    reset_on_up: Cell<bool>,
    broken: Cell<bool>,
}

impl FakeRadio {
    fn with_drops(dropped_modes: Option<u32>) -> Self {
        Self {
            state: RefCell::new(RadioState::default()),
            spectrum: Spectrum::Ghz2_4,
            calls: RefCell::new(Vec::new()),
            dropped_modes: Cell::new(dropped_modes),
            reset_on_up: Cell::new(false),
            broken: Cell::new(false),
        }
    }

    /// Applies every setting as asked.
    pub fn cooperative() -> Self {
        Self::with_drops(Some(0))
    }

    /// Never leaves managed mode.
    pub fn stubborn() -> Self {
        Self::with_drops(None)
    }

    /// Ignores the first `n` mode changes.
    pub fn flaky(n: u32) -> Self {
        Self::with_drops(Some(n))
    }

    /// Forget all settings when brought up.
    pub fn reset_on_up(&self, reset: bool) {
        self.reset_on_up.set(reset);
    }

    /// Fail every driver call.
    pub fn break_driver(&self, broken: bool) {
        self.broken.set(broken);
    }

    /// How many times `name` (`down`, `up`, `mode`, `essid`, `ap`,
    /// `channel`, `status`) was called.
    pub fn count(&self, name: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == name).count()
    }

    /// Apply cycles started, counted by mode changes.
    pub fn apply_cycles(&self) -> usize {
        self.count("mode")
    }

    fn call(&self, name: &str, device: &NetworkDevice) -> Result<(), ConfigdError> {
        self.calls.borrow_mut().push(name.to_string());
        if self.broken.get() {
            return Err(ConfigdError::Command {
                command: format!("fake {name} {device}"),
                reason: "exit status 255".into(),
            });
        }
        Ok(())
    }

    fn render(&self, device: &NetworkDevice) -> String {
        let state = self.state.borrow();
        let mut text = format!(
            "{device}     IEEE 802.11bg  ESSID:\"{}\"\n          Mode:{}",
            state.essid.as_deref().unwrap_or("off/any"),
            state.mode.reported()
        );
        if let Some(freq) = state.channel.and_then(|c| frequency_of(c, self.spectrum)) {
            text.push_str(&format!("  Frequency:{freq} GHz"));
        }
        match &state.bssid {
            Some(bssid) => text.push_str(&format!("  Cell: {bssid}")),
            None => text.push_str("  Cell: Not-Associated"),
        }
        text.push_str("\n          Tx-Power=20 dBm");
        text
    }
}

impl LinkDriver for FakeRadio {
    fn set_down(&self, device: &NetworkDevice) -> Result<(), ConfigdError> {
        self.call("down", device)
    }

    fn set_up(&self, device: &NetworkDevice) -> Result<(), ConfigdError> {
        self.call("up", device)?;
        if self.reset_on_up.get() {
            *self.state.borrow_mut() = RadioState::default();
        }
        Ok(())
    }

    fn apply(&self, device: &NetworkDevice, setting: LinkSetting<'_>) -> Result<(), ConfigdError> {
        let name = match setting {
            LinkSetting::Mode(_) => "mode",
            LinkSetting::Essid(_) => "essid",
            LinkSetting::Bssid(_) => "ap",
            LinkSetting::Channel(_) => "channel",
        };
        self.call(name, device)?;

        let mut state = self.state.borrow_mut();
        match setting {
            LinkSetting::Mode(mode) => match self.dropped_modes.get() {
                None => {}
                Some(0) => state.mode = mode,
                Some(n) => self.dropped_modes.set(Some(n - 1)),
            },
            LinkSetting::Essid(essid) => state.essid = Some(essid.to_string()),
            LinkSetting::Bssid(bssid) => state.bssid = Some(bssid.to_string()),
            LinkSetting::Channel(channel) => state.channel = Some(channel),
        }
        Ok(())
    }

    fn read_status(&self, device: &NetworkDevice) -> Result<String, ConfigdError> {
        self.call("status", device)?;
        Ok(self.render(device))
    }
}

/// Configures only the devices it was told will come up.
#[derive(Default)]
pub struct ScriptedConfigurator {
    up: HashSet<String>,
    tried: RefCell<Vec<String>>,
}

impl ScriptedConfigurator {
    pub fn new(up: &[&str]) -> Self {
        Self {
            up: up.iter().map(|d| d.to_string()).collect(),
            tried: RefCell::new(Vec::new()),
        }
    }

    /// Devices `configure` was called for, in call order.
    pub fn tried(&self) -> Vec<String> {
        self.tried.borrow().clone()
    }
}

impl Configure for ScriptedConfigurator {
    fn configure(&self, mut state: InterfaceState, max_attempts: u32) -> LinkOutcome {
        self.tried.borrow_mut().push(state.device.to_string());
        if self.up.contains(state.device.as_str()) {
            state.validated = true;
            LinkOutcome::Up(state)
        } else {
            LinkOutcome::Failed {
                state,
                attempts: max_attempts,
                failure: ValidationFailure::Mismatch {
                    field: crate::link::LinkField::Mode,
                    expected: "Ad-Hoc".into(),
                    found: Some("Managed".into()),
                },
            }
        }
    }
}

/// Hands out a fixed address per role.
#[derive(Default)]
pub struct FixedAllocator {
    addresses: HashMap<InterfaceRole, Ipv4Addr>,
    calls: Vec<(String, InterfaceRole)>,
}

impl FixedAllocator {
    pub fn new(mesh: Ipv4Addr, client: Ipv4Addr) -> Self {
        Self {
            addresses: HashMap::from([(InterfaceRole::Mesh, mesh), (InterfaceRole::Client, client)]),
            calls: Vec::new(),
        }
    }

    /// Exhaust every request for `role`.
    pub fn exhaust(mut self, role: InterfaceRole) -> Self {
        self.addresses.remove(&role);
        self
    }

    /// `(device, role)` of every request, in order.
    pub fn calls(&self) -> &[(String, InterfaceRole)] {
        &self.calls
    }
}

impl Allocate for FixedAllocator {
    fn allocate(
        &mut self,
        device: &NetworkDevice,
        request: &AddressAllocationRequest,
    ) -> Result<Ipv4Addr, ConfigdError> {
        self.calls.push((device.to_string(), request.role()));
        self.addresses
            .get(&request.role())
            .copied()
            .ok_or(ConfigdError::AllocationExhausted {
                role: request.role(),
                attempts: 0,
            })
    }
}

/// Reports a fixed set of addresses as in use and records every probe.
#[derive(Default)]
pub struct ScriptedProbe {
    in_use: HashSet<Ipv4Addr>,
    probed: RefCell<Vec<(String, Ipv4Addr)>>,
}

impl ScriptedProbe {
    /// Every address is free.
    pub fn all_free() -> Self {
        Self::default()
    }

    pub fn with_in_use(addresses: impl IntoIterator<Item = Ipv4Addr>) -> Self {
        Self {
            in_use: addresses.into_iter().collect(),
            probed: RefCell::new(Vec::new()),
        }
    }

    /// `(device, address)` of every probe, in order.
    pub fn probed(&self) -> Vec<(String, Ipv4Addr)> {
        self.probed.borrow().clone()
    }
}

impl ReachabilityProbe for ScriptedProbe {
    fn in_use(&self, device: &NetworkDevice, addr: Ipv4Addr) -> Result<bool, ConfigdError> {
        self.probed.borrow_mut().push((device.to_string(), addr));
        Ok(self.in_use.contains(&addr))
    }
}

/// Files kept in memory, keyed by path.
#[derive(Default)]
pub struct MemoryFiles {
    files: RefCell<BTreeMap<PathBuf, String>>,
    read_only: RefCell<HashSet<PathBuf>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes to `path` fail.
    pub fn read_only(&self, path: impl Into<PathBuf>) {
        self.read_only.borrow_mut().insert(path.into());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.borrow().get(path.as_ref()).cloned()
    }
}

impl FileWriter for MemoryFiles {
    fn write(&self, path: &Path, contents: &str) -> Result<(), ConfigdError> {
        if self.read_only.borrow().contains(path) {
            return Err(ConfigdError::Write {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}
