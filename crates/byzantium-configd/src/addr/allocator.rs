//! Randomized, probe-checked address allocation.

use std::net::Ipv4Addr;

use rand::Rng;

use super::{generate_candidate, AddressAllocationRequest, ReachabilityProbe};
use crate::error::ConfigdError;
use crate::net::NetworkDevice;

/// Picks a free address for an interface.
pub trait Allocate {
    fn allocate(
        &mut self,
        device: &NetworkDevice,
        request: &AddressAllocationRequest,
    ) -> Result<Ipv4Addr, ConfigdError>;
}

/// Draws candidates from `rng` until `probe` finds one free, giving up
/// after `max_attempts` probes.
pub struct AddressAllocator<P, R> {
    probe: P,
    rng: R,
    max_attempts: u32,
}

impl<P: ReachabilityProbe, R: Rng> AddressAllocator<P, R> {
    pub fn new(probe: P, rng: R, max_attempts: u32) -> Self {
        Self {
            probe,
            rng,
            max_attempts: max_attempts.max(1),
        }
    }
}

impl<P: ReachabilityProbe, R: Rng> Allocate for AddressAllocator<P, R> {
    fn allocate(
        &mut self,
        device: &NetworkDevice,
        request: &AddressAllocationRequest,
    ) -> Result<Ipv4Addr, ConfigdError> {
        let role = request.role();
        for attempt in 1..=self.max_attempts {
            let candidate = generate_candidate(request, &mut self.rng);
            if self.probe.in_use(device, candidate)? {
                tracing::debug!(%device, %role, attempt, %candidate, "address in use, retrying");
                continue;
            }
            tracing::info!(%device, %role, attempt, address = %candidate, "allocated address");
            return Ok(candidate);
        }

        tracing::error!(%device, %role, attempts = self.max_attempts, "address allocation exhausted");
        Err(ConfigdError::AllocationExhausted {
            role,
            attempts: self.max_attempts,
        })
    }
}
