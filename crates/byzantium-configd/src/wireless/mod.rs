//! Wireless link knowledge: the IEEE 802.11 channel table and the parser
//! for the status text the link tools print.

pub mod frequency;
pub mod status;

pub use frequency::{channel_of, frequency_of, Frequency};
pub use status::LinkStatus;
