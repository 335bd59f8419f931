//! Byzantium node configuration daemon.
//!
//! Brings a node onto the ad-hoc mesh in one synchronous pass: find a
//! wireless device, drive it into the mesh's link parameters and validate
//! them, allocate collision-checked mesh and client addresses, then start
//! the services around them (Commotion route, captive portal, DHCP/DNS,
//! routing daemon).

pub mod addr;
pub mod artifacts;
pub mod error;
pub mod fs;
pub mod link;
pub mod net;
pub mod node;
pub mod services;
pub mod shell;
pub mod wireless;

pub mod test_util;

pub use error::ConfigdError;
pub use node::{NodeOrchestrator, NodeReport};
