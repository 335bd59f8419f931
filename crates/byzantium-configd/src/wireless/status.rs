//! Parser for `iwconfig <dev>` status output.
//!
//! Only four fields matter for validation: operating mode, ESSID, BSSID
//! and frequency. A typical ad-hoc report looks like:
//!
//! ```text
//! wlan0     IEEE 802.11bg  ESSID:"Byzantium"
//!           Mode:Ad-Hoc  Frequency:2.432 GHz  Cell: 02:CA:FF:EE:BA:BE
//!           Tx-Power=20 dBm
//! ```
//!
//! Several fields share a line, and drivers vary between `Key:value`,
//! `Key: value` and `Key=value`. Each line is scanned for every key at a
//! token boundary; the first occurrence of a key in the output wins.

use super::frequency::Frequency;

/// The fields of a device's live status that configuration is checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkStatus {
    pub mode: Option<String>,
    pub essid: Option<String>,
    pub bssid: Option<String>,
    pub frequency: Option<Frequency>,
}

impl LinkStatus {
    /// Extract the four fields from raw status text.
    pub fn parse(output: &str) -> Self {
        let mut status = LinkStatus::default();

        for line in output.lines() {
            if status.essid.is_none() {
                status.essid = field(line, "ESSID").map(essid_value);
            }
            if status.mode.is_none() {
                status.mode = field(line, "Mode").and_then(first_token);
            }
            if status.bssid.is_none() {
                status.bssid = field(line, "Cell")
                    .or_else(|| field(line, "Access Point"))
                    .and_then(first_token);
            }
            if status.frequency.is_none() {
                status.frequency = field(line, "Frequency")
                    .and_then(first_token)
                    .and_then(|f| Frequency::parse_ghz(&f));
            }
        }

        status
    }
}

/// Text following `key:` / `key=` where `key` starts a token.
fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let mut from = 0;
    while let Some(pos) = line[from..].find(key) {
        let start = from + pos;
        let at_boundary = line[..start]
            .chars()
            .next_back()
            .map_or(true, char::is_whitespace);
        let after = &line[start + key.len()..];
        if at_boundary {
            if let Some(rest) = after.strip_prefix(':').or_else(|| after.strip_prefix('=')) {
                return Some(rest.trim_start());
            }
        }
        from = start + key.len();
    }
    None
}

fn first_token(rest: &str) -> Option<String> {
    rest.split_whitespace().next().map(str::to_string)
}

/// ESSIDs are quoted and may contain spaces; `off/any` is bare.
fn essid_value(rest: &str) -> String {
    match rest.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next().unwrap_or_default().to_string(),
        None => rest.split_whitespace().next().unwrap_or_default().to_string(),
    }
}
