//! # Address Allocation
//!
//! Mesh nodes have no coordinator, so addresses are picked at random inside
//! a configured range and checked for conflicts with a duplicate-address
//! probe before use.
//!
//! A request is a network prefix plus a *generation mask* marking which
//! octets may be randomized. The mask is accepted in either netmask form
//! (`255.255.0.0`) or host-mask form (`0.0.255.255`); both mean "the last
//! two octets". Randomization walks from the last octet toward the first
//! and stops at the first prefix octet that is already set, so
//! `10.1.0.0` with `255.0.0.0` only ever varies the last two octets.

use std::net::Ipv4Addr;

use byzantium_common::settings::AddressingSettings;
use byzantium_common::InterfaceRole;
use rand::Rng;

use crate::error::ConfigdError;

pub mod allocator;
pub mod probe;

pub use allocator::{AddressAllocator, Allocate};
pub use probe::{ArpingProbe, ReachabilityProbe};

/// Highest value drawn for a single octet; 255 is never generated.
const MAX_OCTET: u8 = 254;

/// What range to allocate from, and for which role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressAllocationRequest {
    network_prefix: Ipv4Addr,
    /// Normalised to host-mask form.
    host_mask: Ipv4Addr,
    role: InterfaceRole,
}

impl AddressAllocationRequest {
    /// Build a request, rejecting masks that are neither a contiguous
    /// netmask nor a contiguous host mask.
    ///
    /// Prefix octets set inside the generation range are kept: they end the
    /// randomized run of trailing octets.
    pub fn new(
        network_prefix: Ipv4Addr,
        generation_mask: Ipv4Addr,
        role: InterfaceRole,
    ) -> Result<Self, ConfigdError> {
        let host_mask = host_mask_of(generation_mask).ok_or(ConfigdError::InvalidPrefix {
            prefix: network_prefix,
            mask: generation_mask,
        })?;

        Ok(Self {
            network_prefix,
            host_mask,
            role,
        })
    }

    pub fn from_settings(
        addressing: &AddressingSettings,
        role: InterfaceRole,
    ) -> Result<Self, ConfigdError> {
        Self::new(addressing.network, addressing.generation_mask, role)
    }

    pub fn network_prefix(&self) -> Ipv4Addr {
        self.network_prefix
    }

    pub fn host_mask(&self) -> Ipv4Addr {
        self.host_mask
    }

    pub fn role(&self) -> InterfaceRole {
        self.role
    }

    /// Octets replaced by random draws: the trailing run of zero prefix
    /// octets whose host-mask octet is non-zero.
    fn randomized(&self) -> [bool; 4] {
        let prefix = self.network_prefix.octets();
        let wildcard = self.host_mask.octets();
        let mut randomized = [false; 4];
        for i in (0..4).rev() {
            if prefix[i] != 0 || wildcard[i] == 0 {
                break;
            }
            randomized[i] = true;
        }
        randomized
    }

    /// Whether `addr` is a candidate this request could have produced.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let prefix = self.network_prefix.octets();
        let wildcard = self.host_mask.octets();
        let randomized = self.randomized();
        addr.octets().iter().enumerate().all(|(i, &octet)| {
            if i == 3 && self.role == InterfaceRole::Client {
                octet == 1
            } else if randomized[i] {
                octet <= wildcard[i].min(MAX_OCTET)
            } else {
                octet == prefix[i]
            }
        })
    }
}

/// Convert a netmask or host mask to host-mask form. `None` when the mask
/// is neither.
fn host_mask_of(mask: Ipv4Addr) -> Option<Ipv4Addr> {
    let bits = u32::from(mask);
    if bits.leading_ones() + bits.trailing_zeros() == 32 {
        Some(Ipv4Addr::from(!bits))
    } else if bits.leading_zeros() + bits.trailing_ones() == 32 {
        Some(mask)
    } else {
        None
    }
}

/// Draw one candidate address for `request`.
///
/// Zero prefix octets inside the generation range are replaced, last octet
/// first, by a value in `[0, min(254, host-mask octet)]`. Client addresses
/// always end in `.1`.
pub fn generate_candidate<R: Rng + ?Sized>(
    request: &AddressAllocationRequest,
    rng: &mut R,
) -> Ipv4Addr {
    let mut octets = request.network_prefix.octets();
    let wildcard = request.host_mask.octets();

    for (i, randomized) in request.randomized().into_iter().enumerate() {
        if randomized {
            octets[i] = rng.random_range(0..=wildcard[i].min(MAX_OCTET));
        }
    }

    if request.role == InterfaceRole::Client {
        octets[3] = 1;
    }
    Ipv4Addr::from(octets)
}
