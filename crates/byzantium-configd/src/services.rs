//! Host-side actions around a configured interface: address assignment,
//! the Commotion route, and the companion services (captive portal,
//! DHCP/DNS, routing daemon).

use std::net::Ipv4Addr;

use byzantium_common::Settings;

use crate::error::ConfigdError;
use crate::net::NetworkDevice;
use crate::shell::{CommandRunner, ShellCommand};

pub struct Services<'a> {
    shell: &'a dyn CommandRunner,
    settings: &'a Settings,
}

impl<'a> Services<'a> {
    pub fn new(shell: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self { shell, settings }
    }

    /// `ifconfig <dev> <addr> netmask <mask> up`
    pub fn assign_address(
        &self,
        device: &NetworkDevice,
        address: Ipv4Addr,
        netmask: Ipv4Addr,
    ) -> Result<(), ConfigdError> {
        let cmd = ShellCommand::new(&self.settings.configd.tools.ifconfig)
            .arg(device)
            .arg(address)
            .arg("netmask")
            .arg(netmask)
            .arg("up")
            .delay_after(self.settings.configd.inter_command_delay);
        self.shell.run_checked(&cmd)?;
        tracing::info!(%device, %address, %netmask, "assigned address");
        Ok(())
    }

    /// Route the Commotion mesh range through the mesh device.
    pub fn add_commotion_route(&self, mesh: &NetworkDevice) -> Result<(), ConfigdError> {
        let commotion = &self.settings.commotion;
        let cmd = ShellCommand::new(&self.settings.configd.tools.route)
            .args(["add", "-net"])
            .arg(commotion.network)
            .arg("netmask")
            .arg(commotion.netmask)
            .arg("dev")
            .arg(mesh);
        self.shell.run_checked(&cmd).map(drop)
    }

    pub fn start_captive_portal(
        &self,
        client: &NetworkDevice,
        address: Ipv4Addr,
    ) -> Result<(), ConfigdError> {
        let cmd = ShellCommand::new(&self.settings.captive_portal.script)
            .arg("-i")
            .arg(client)
            .arg("-a")
            .arg(address)
            .background();
        self.shell.run_checked(&cmd).map(drop)
    }

    pub fn restart_dnsmasq(&self) -> Result<(), ConfigdError> {
        let cmd = ShellCommand::new(&self.settings.configd.tools.dnsmasq_init)
            .arg(&self.settings.configd.dnsmasq_action);
        self.shell.run_checked(&cmd).map(drop)
    }

    pub fn start_olsrd(&self, mesh: &NetworkDevice) -> Result<(), ConfigdError> {
        let cmd = ShellCommand::new(&self.settings.configd.tools.olsrd)
            .arg("-i")
            .arg(mesh)
            .background();
        self.shell.run_checked(&cmd).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::RecordingShell;

    #[test]
    fn command_lines() {
        let shell = RecordingShell::new();
        let settings = Settings::default();
        let services = Services::new(&shell, &settings);
        let mesh = NetworkDevice::new("wlan0");
        let client = mesh.alias(1);

        services
            .assign_address(&mesh, Ipv4Addr::new(192, 168, 4, 20), Ipv4Addr::new(255, 255, 0, 0))
            .unwrap();
        services.add_commotion_route(&mesh).unwrap();
        services.start_captive_portal(&client, Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        services.restart_dnsmasq().unwrap();
        services.start_olsrd(&mesh).unwrap();

        assert_eq!(
            shell.command_lines(),
            [
                "/sbin/ifconfig wlan0 192.168.4.20 netmask 255.255.0.0 up",
                "/sbin/route add -net 5.0.0.0 netmask 255.0.0.0 dev wlan0",
                "/usr/local/sbin/captive_portal.py -i wlan0:1 -a 10.0.0.1",
                "/etc/rc.d/rc.dnsmasq restart",
                "/usr/sbin/olsrd -i wlan0",
            ]
        );
        let cmds = shell.commands();
        assert!(cmds[2].background && cmds[4].background);
        assert!(!cmds[1].background && !cmds[3].background);
    }

    #[test]
    fn failing_route_is_an_error() {
        let shell = RecordingShell::new();
        shell.fail("route");
        let settings = Settings::default();
        let err = Services::new(&shell, &settings)
            .add_commotion_route(&NetworkDevice::new("wlan0"))
            .unwrap_err();
        assert!(err.to_string().contains("/sbin/route add -net"));
    }
}
