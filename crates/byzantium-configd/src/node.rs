//! Node orchestrator: one full bring-up of a mesh node.
//!
//! Enumeration, mesh configuration and both address assignments must
//! succeed or the run is aborted. Everything after that (Commotion route,
//! captive portal, DHCP/DNS artifacts and restart, routing daemon) is
//! best-effort: failures are logged, collected in the [`NodeReport`], and
//! the run carries on. Nothing already done is rolled back.

use byzantium_common::{InterfaceRole, Settings};

use crate::addr::{AddressAllocationRequest, Allocate};
use crate::artifacts;
use crate::error::{ConfigdError, Step};
use crate::fs::FileWriter;
use crate::link::{Configure, InterfaceState, LinkOutcome, LinkSpec};
use crate::net::{list_wireless_devices, DeviceSource, NetworkDevice};
use crate::services::Services;
use crate::shell::CommandRunner;

/// What a completed run set up, and which best-effort steps failed.
#[derive(Debug)]
pub struct NodeReport {
    pub mesh: InterfaceState,
    pub client: InterfaceState,
    pub failures: Vec<ConfigdError>,
}

impl NodeReport {
    pub fn failed_steps(&self) -> Vec<Step> {
        self.failures
            .iter()
            .filter_map(|e| match e {
                ConfigdError::ExternalAction { step, .. } => Some(*step),
                _ => None,
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The collaborators a bring-up runs against.
pub struct NodeOrchestrator<'a> {
    settings: &'a Settings,
    devices: &'a dyn DeviceSource,
    configurator: &'a dyn Configure,
    allocator: &'a mut dyn Allocate,
    shell: &'a dyn CommandRunner,
    files: &'a dyn FileWriter,
}

impl<'a> NodeOrchestrator<'a> {
    pub fn new(
        settings: &'a Settings,
        devices: &'a dyn DeviceSource,
        configurator: &'a dyn Configure,
        allocator: &'a mut dyn Allocate,
        shell: &'a dyn CommandRunner,
        files: &'a dyn FileWriter,
    ) -> Self {
        Self {
            settings,
            devices,
            configurator,
            allocator,
            shell,
            files,
        }
    }

    pub fn run(&mut self) -> Result<NodeReport, ConfigdError> {
        let candidates = list_wireless_devices(self.devices, &self.settings.configd.exclude)?;

        let mut mesh = self.bring_up_mesh(candidates)?;
        self.address(&mut mesh)?;

        let mut client = self.client_interface(&mesh);
        self.address(&mut client)?;

        let mut failures = Vec::new();
        self.start_services(&mesh, &client, &mut failures);

        if failures.is_empty() {
            tracing::info!(mesh = %mesh.device, client = %client.device, "node configured");
        } else {
            tracing::warn!(
                mesh = %mesh.device,
                client = %client.device,
                failed = failures.len(),
                "node configured with failed steps"
            );
        }

        Ok(NodeReport {
            mesh,
            client,
            failures,
        })
    }

    /// Configure candidates in order; the first to come up is the mesh
    /// interface.
    fn bring_up_mesh(&self, candidates: Vec<NetworkDevice>) -> Result<InterfaceState, ConfigdError> {
        let spec = LinkSpec::from_settings(&self.settings.mesh);
        let netmask = self.settings.mesh.addressing.netmask;
        let mut tried = Vec::with_capacity(candidates.len());

        for device in candidates {
            let state = InterfaceState::new(device, InterfaceRole::Mesh, spec.clone(), netmask);
            match self.configurator.configure(state, self.settings.configd.max_tries) {
                LinkOutcome::Up(state) => return Ok(state),
                LinkOutcome::Failed {
                    state,
                    attempts,
                    failure,
                } => {
                    tracing::warn!(
                        device = %state.device,
                        role = %state.role,
                        attempts,
                        %failure,
                        "interface did not come up"
                    );
                    tried.push(state.device.to_string());
                }
            }
        }

        tracing::error!(?tried, "no mesh interface could be configured");
        Err(ConfigdError::MeshUnavailable { tried })
    }

    /// Client alias on the mesh device, sharing its wireless parameters.
    fn client_interface(&self, mesh: &InterfaceState) -> InterfaceState {
        let mut client = InterfaceState::new(
            mesh.device.alias(self.settings.configd.client_number),
            InterfaceRole::Client,
            mesh.spec.clone(),
            self.settings.client.addressing.netmask,
        );
        client.validated = mesh.validated;
        client
    }

    fn address(&mut self, state: &mut InterfaceState) -> Result<(), ConfigdError> {
        let request =
            AddressAllocationRequest::from_settings(self.settings.addressing(state.role), state.role)?;
        let address = self.allocator.allocate(&state.device, &request)?;
        Services::new(self.shell, self.settings).assign_address(&state.device, address, state.netmask)?;
        state.assigned_address = Some(address);
        Ok(())
    }

    fn start_services(
        &self,
        mesh: &InterfaceState,
        client: &InterfaceState,
        failures: &mut Vec<ConfigdError>,
    ) {
        let services = Services::new(self.shell, self.settings);
        let files = &self.settings.files;
        let mut best_effort = |step: Step, result: Result<(), ConfigdError>| {
            if let Err(e) = result {
                let err = ConfigdError::external(step, e);
                tracing::warn!(%step, error = %err, "best-effort step failed");
                failures.push(err);
            }
        };

        best_effort(Step::CommotionRoute, services.add_commotion_route(&mesh.device));

        // Both interfaces were assigned before this point.
        let Some(client_addr) = client.assigned_address else {
            return;
        };

        best_effort(
            Step::CaptivePortal,
            services.start_captive_portal(&client.device, client_addr),
        );
        best_effort(
            Step::HostsFile,
            artifacts::write_hosts_table(
                self.files,
                &files.hosts_mesh,
                client_addr,
                &self.settings.client.hostname,
            ),
        );
        best_effort(
            Step::DnsmasqInclude,
            artifacts::write_dhcp_include(self.files, &files.dnsmasq_include, client_addr),
        );
        best_effort(Step::DnsmasqRestart, services.restart_dnsmasq());
        best_effort(Step::RoutingDaemon, services.start_olsrd(&mesh.device));
    }
}
