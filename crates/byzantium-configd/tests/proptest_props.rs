//! Property-based tests for the channel table, the status parser and
//! address allocation.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use byzantium_common::{InterfaceRole, Spectrum};
use byzantium_configd::addr::{AddressAllocationRequest, AddressAllocator, Allocate};
use byzantium_configd::error::ConfigdError;
use byzantium_configd::net::NetworkDevice;
use byzantium_configd::test_util::ScriptedProbe;
use byzantium_configd::wireless::frequency::channels;
use byzantium_configd::wireless::{channel_of, frequency_of, Frequency, LinkStatus};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn band() -> impl Strategy<Value = Spectrum> {
    prop::sample::select(Spectrum::ALL.to_vec())
}

// ─── Channel Table ──────────────────────────────────────────────────────────

proptest! {
    /// Every allocated channel maps to a frequency and back.
    #[test]
    fn channel_frequency_round_trip(band in band(), idx in any::<prop::sample::Index>()) {
        let table = channels(band);
        let entry = table[idx.index(table.len())];
        let freq = frequency_of(entry.channel, band);
        prop_assert_eq!(freq, Some(entry.frequency));
        prop_assert_eq!(channel_of(entry.frequency, band), Some(entry.channel));
    }

    /// Channels outside the table have no frequency.
    #[test]
    fn unallocated_channels_have_no_frequency(band in band(), channel in any::<u8>()) {
        let allocated = channels(band).iter().any(|e| e.channel == channel);
        prop_assert_eq!(frequency_of(channel, band).is_some(), allocated);
    }

    /// The rendered GHz text parses back to the same frequency, so a
    /// status report of a configured channel always validates.
    #[test]
    fn reported_frequency_parses_exactly(band in band(), idx in any::<prop::sample::Index>()) {
        let table = channels(band);
        let entry = table[idx.index(table.len())];
        let text = format!("wlan0  Mode:Ad-Hoc  Frequency:{} GHz", entry.frequency);
        let status = LinkStatus::parse(&text);
        prop_assert_eq!(status.frequency, Some(entry.frequency));
        prop_assert_eq!(Frequency::parse_ghz(&entry.frequency.to_string()), Some(entry.frequency));
    }
}

// ─── Address Allocation ─────────────────────────────────────────────────────

fn mesh_request(host_bits: u32) -> AddressAllocationRequest {
    let host_mask = Ipv4Addr::from((1u32 << host_bits) - 1);
    AddressAllocationRequest::new(Ipv4Addr::new(192, 168, 0, 0), host_mask, InterfaceRole::Mesh)
        .unwrap()
}

proptest! {
    /// An allocated address is never one the probe reported in use, and
    /// always lies inside the requested range.
    #[test]
    fn never_returns_an_in_use_address(
        host_bits in 1u32..=16,
        taken in prop::collection::vec(any::<u16>(), 0..64),
        seed in any::<u64>(),
    ) {
        let request = mesh_request(host_bits);
        let mask = u32::from(request.host_mask());
        let in_use: HashSet<Ipv4Addr> = taken
            .iter()
            .map(|t| Ipv4Addr::from(u32::from(request.network_prefix()) | (u32::from(*t) & mask)))
            .collect();
        let probe = ScriptedProbe::with_in_use(in_use.iter().copied());
        let mut allocator = AddressAllocator::new(&probe, StdRng::seed_from_u64(seed), 32);

        match allocator.allocate(&NetworkDevice::new("wlan0"), &request) {
            Ok(addr) => {
                prop_assert!(!in_use.contains(&addr));
                prop_assert!(request.contains(addr));
                prop_assert!(addr.octets().iter().all(|&o| o != 255));
            }
            Err(e) => {
                let exhausted = matches!(e, ConfigdError::AllocationExhausted { attempts: 32, .. });
                prop_assert!(exhausted);
            }
        }
        prop_assert!(probe.probed().len() <= 32);
    }

    /// Client addresses always end in `.1`, whatever the range.
    #[test]
    fn client_addresses_end_in_one(prefix_a in 1u8..=223, seed in any::<u64>()) {
        let request = AddressAllocationRequest::new(
            Ipv4Addr::new(prefix_a, 0, 0, 0),
            Ipv4Addr::new(255, 0, 0, 0),
            InterfaceRole::Client,
        )
        .unwrap();
        let probe = ScriptedProbe::all_free();
        let mut allocator = AddressAllocator::new(&probe, StdRng::seed_from_u64(seed), 32);

        let addr = allocator.allocate(&NetworkDevice::new("wlan0").alias(1), &request).unwrap();
        prop_assert_eq!(addr.octets()[0], prefix_a);
        prop_assert_eq!(addr.octets()[3], 1);
        prop_assert_eq!(probe.probed().len(), 1);
    }
}
