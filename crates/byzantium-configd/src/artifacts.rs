//! Generated configuration artifacts for the client network.
//!
//! The client network is treated as a /24 around the client address: the
//! node itself gets the configured host name and every other host address
//! gets a synthetic `client-<addr>.byzantium.mesh` name so DNS answers for
//! any DHCP lease.

use std::net::Ipv4Addr;
use std::path::Path;

use crate::error::ConfigdError;
use crate::fs::FileWriter;

/// Domain for synthetic client host names.
pub const CLIENT_DOMAIN: &str = "byzantium.mesh";

/// DHCP lease time handed to clients.
pub const LEASE_TIME: &str = "5m";

/// Hosts table for the /24 of `client`: the node first, then every other
/// host address in ascending order. Lines are `<address>\t<name>` joined
/// with `\n`.
pub fn hosts_table(client: Ipv4Addr, node_name: &str) -> String {
    let [a, b, c, own] = client.octets();
    let mut lines = Vec::with_capacity(254);
    lines.push(format!("{client}\t{node_name}"));
    lines.extend((1..=254u8).filter(|&i| i != own).map(|i| {
        let host = Ipv4Addr::new(a, b, c, i);
        format!("{host}\tclient-{host}.{CLIENT_DOMAIN}")
    }));
    lines.join("\n")
}

/// DHCP range line covering `.2` through `.254` of the client /24.
pub fn dhcp_range(client: Ipv4Addr) -> String {
    let [a, b, c, _] = client.octets();
    format!(
        "dhcp-range={},{},{LEASE_TIME}",
        Ipv4Addr::new(a, b, c, 2),
        Ipv4Addr::new(a, b, c, 254)
    )
}

pub fn write_hosts_table(
    files: &dyn FileWriter,
    path: &Path,
    client: Ipv4Addr,
    node_name: &str,
) -> Result<(), ConfigdError> {
    files.write(path, &hosts_table(client, node_name))
}

pub fn write_dhcp_include(
    files: &dyn FileWriter,
    path: &Path,
    client: Ipv4Addr,
) -> Result<(), ConfigdError> {
    files.write(path, &dhcp_range(client))
}
