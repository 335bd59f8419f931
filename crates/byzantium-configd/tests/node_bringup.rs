//! End-to-end node bring-up against in-memory host fakes.

use std::net::Ipv4Addr;
use std::time::Duration;

use byzantium_common::{InterfaceRole, Settings};
use byzantium_configd::addr::{AddressAllocator, ArpingProbe};
use byzantium_configd::link::{IwconfigDriver, LinkConfigurator};
use byzantium_configd::test_util::{FakeDevices, FakeRadio, FixedAllocator, MemoryFiles, RecordingShell};
use byzantium_configd::NodeOrchestrator;
use rand::rngs::StdRng;
use rand::SeedableRng;

const ADHOC_STATUS: &[&str] = &[
    "wlan0     IEEE 802.11bg  ESSID:\"Byzantium\"",
    "          Mode:Ad-Hoc  Frequency:2.432 GHz  Cell: 02:CA:FF:EE:BA:BE",
    "          Tx-Power=20 dBm",
];

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.configd.inter_command_delay = Duration::ZERO;
    settings
}

#[test]
fn services_start_once_in_order() {
    let settings = settings();
    let devices = FakeDevices::new(&["lo", "eth0", "wlan0"], &["wlan0"]);
    let radio = FakeRadio::cooperative();
    let configurator = LinkConfigurator::new(&radio);
    let mut allocator = FixedAllocator::new(Ipv4Addr::new(192, 168, 12, 34), Ipv4Addr::new(10, 0, 0, 1));
    let shell = RecordingShell::new();
    let files = MemoryFiles::new();

    let report = NodeOrchestrator::new(&settings, &devices, &configurator, &mut allocator, &shell, &files)
        .run()
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(radio.apply_cycles(), 1);

    let programs: Vec<String> = shell
        .commands()
        .iter()
        .map(|c| c.program_name().to_string())
        .collect();
    assert_eq!(
        programs,
        ["ifconfig", "ifconfig", "route", "captive_portal.py", "rc.dnsmasq", "olsrd"]
    );
    assert_eq!(shell.runs_of("route").len(), 1);
    assert_eq!(shell.runs_of("rc.dnsmasq").len(), 1);
    assert_eq!(shell.runs_of("olsrd").len(), 1);

    let hosts = files.get("/etc/hosts.mesh").unwrap();
    assert!(hosts.starts_with("10.0.0.1\tbyzantium.byzantium.mesh\n10.0.0.2\tclient-10.0.0.2.byzantium.mesh"));
    assert_eq!(hosts.lines().count(), 254);
    assert_eq!(
        files.get("/etc/dnsmasq.conf.include").unwrap(),
        "dhcp-range=10.0.0.2,10.0.0.254,5m"
    );
}

#[test]
fn full_stack_over_recorded_tools() {
    let settings = settings();
    let devices = FakeDevices::new(&["lo", "wlan0"], &["wlan0"]);
    let shell = RecordingShell::new();
    shell.respond("iwconfig", ADHOC_STATUS);
    let configurator = LinkConfigurator::new(IwconfigDriver::new(&shell, &settings));
    let probe = ArpingProbe::new(&shell, &settings);
    let mut allocator = AddressAllocator::new(probe, StdRng::seed_from_u64(2012), 32);
    let files = MemoryFiles::new();

    let report = NodeOrchestrator::new(&settings, &devices, &configurator, &mut allocator, &shell, &files)
        .run()
        .unwrap();

    let mesh_addr = report.mesh.assigned_address.unwrap();
    let client_addr = report.client.assigned_address.unwrap();
    assert_eq!(&mesh_addr.octets()[..2], &[192, 168]);
    assert_eq!((client_addr.octets()[0], client_addr.octets()[3]), (10, 1));
    assert_eq!(report.client.role, InterfaceRole::Client);

    let lines = shell.command_lines();
    let expected_prefix = [
        "/sbin/ifconfig wlan0 down",
        "/sbin/iwconfig wlan0 mode ad-hoc",
        "/sbin/iwconfig wlan0 essid Byzantium",
        "/sbin/iwconfig wlan0 ap 02:CA:FF:EE:BA:BE",
        "/sbin/iwconfig wlan0 channel 5",
        "/sbin/iwconfig wlan0",
        "/sbin/ifconfig wlan0 up",
        "/sbin/iwconfig wlan0",
    ];
    assert_eq!(&lines[..expected_prefix.len()], &expected_prefix);

    let rest = &lines[expected_prefix.len()..];
    assert_eq!(
        rest,
        [
            format!("/sbin/arping -c 5 -w 3 -D -f -q -I wlan0 {mesh_addr}"),
            format!("/sbin/ifconfig wlan0 {mesh_addr} netmask 255.255.0.0 up"),
            format!("/sbin/arping -c 5 -w 3 -D -f -q -I wlan0 {client_addr}"),
            format!("/sbin/ifconfig wlan0:1 {client_addr} netmask 255.255.255.0 up"),
            "/sbin/route add -net 5.0.0.0 netmask 255.0.0.0 dev wlan0".to_string(),
            format!("/usr/local/sbin/captive_portal.py -i wlan0:1 -a {client_addr}"),
            "/etc/rc.d/rc.dnsmasq restart".to_string(),
            "/usr/sbin/olsrd -i wlan0".to_string(),
        ]
    );
}

#[test]
fn misconfigured_radio_is_never_used() {
    let mut settings = settings();
    settings.configd.max_tries = 3;
    let devices = FakeDevices::new(&["wlan0"], &["wlan0"]);
    let shell = RecordingShell::new();
    // Driver keeps reporting managed mode.
    shell.respond("iwconfig", &["wlan0  ESSID:\"Byzantium\"", "  Mode:Managed  Frequency:2.432 GHz"]);
    let configurator = LinkConfigurator::new(IwconfigDriver::new(&shell, &settings));
    let mut allocator = FixedAllocator::new(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(10, 0, 0, 1));
    let files = MemoryFiles::new();

    let err = NodeOrchestrator::new(&settings, &devices, &configurator, &mut allocator, &shell, &files)
        .run()
        .unwrap_err();

    assert!(err.to_string().contains("wlan0"));
    let modes = shell
        .command_lines()
        .iter()
        .filter(|l| l.ends_with("mode ad-hoc"))
        .count();
    assert_eq!(modes, 3);
    assert!(shell.runs_of("arping").is_empty());
    assert!(files.get("/etc/hosts.mesh").is_none());
}
