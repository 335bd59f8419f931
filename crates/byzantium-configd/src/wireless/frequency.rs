//! # IEEE 802.11 Channel Table
//!
//! Maps channel numbers to centre frequencies for the three bands a node
//! may be configured in. `iwconfig` reports frequencies rather than
//! channels, so validating a configured channel means translating it
//! through this table.
//!
//! | Band    | Channels                         | Entries |
//! |---------|----------------------------------|---------|
//! | 2.4GHz  | 1–14                             | 14      |
//! | 3.6GHz  | 131–138 (802.11y)                | 8       |
//! | 5GHz    | 7–16, 34–165, 183–196 (4.9GHz)   | 42      |
//!
//! Frequencies are held in kHz: 3.6GHz channels sit on 2.5 MHz steps
//! (`3.6575 GHz`) that a whole-MHz representation cannot express.

use std::fmt;

use byzantium_common::Spectrum;

// ─── Frequency ──────────────────────────────────────────────────────────────

/// A channel centre frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Frequency {
    khz: u32,
}

impl Frequency {
    pub const fn from_khz(khz: u32) -> Self {
        Frequency { khz }
    }

    pub const fn khz(&self) -> u32 {
        self.khz
    }

    /// Parse the GHz text `iwconfig` prints (`2.412`, `5.2 GHz`).
    ///
    /// Exact decimal parsing: no floating point is involved, so equal text
    /// always yields equal frequencies.
    pub fn parse_ghz(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text.strip_suffix("GHz").unwrap_or(text).trim_end();
        let (whole, frac) = text.split_once('.').unwrap_or((text, ""));
        if whole.is_empty() || frac.len() > 6 {
            return None;
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }
        let whole: u32 = whole.parse().ok()?;
        let frac: u32 = if frac.is_empty() {
            0
        } else {
            frac.parse::<u32>().ok()? * 10u32.pow(6 - frac.len() as u32)
        };
        whole
            .checked_mul(1_000_000)?
            .checked_add(frac)
            .map(Frequency::from_khz)
    }
}

impl fmt::Display for Frequency {
    /// Renders in GHz with trailing zeros dropped, the way `iwconfig` does.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.khz / 1_000_000;
        let frac = self.khz % 1_000_000;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:06}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

// ─── Channel Table ──────────────────────────────────────────────────────────

/// One channel allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEntry {
    pub channel: u8,
    pub frequency: Frequency,
}

const fn ch(channel: u8, khz: u32) -> ChannelEntry {
    ChannelEntry {
        channel,
        frequency: Frequency::from_khz(khz),
    }
}

pub const BAND_2_4GHZ: &[ChannelEntry] = &[
    ch(1, 2_412_000),
    ch(2, 2_417_000),
    ch(3, 2_422_000),
    ch(4, 2_427_000),
    ch(5, 2_432_000),
    ch(6, 2_437_000),
    ch(7, 2_442_000),
    ch(8, 2_447_000),
    ch(9, 2_452_000),
    ch(10, 2_457_000),
    ch(11, 2_462_000),
    ch(12, 2_467_000),
    ch(13, 2_472_000),
    ch(14, 2_484_000),
];

pub const BAND_3_6GHZ: &[ChannelEntry] = &[
    ch(131, 3_657_500),
    ch(132, 3_660_000),
    ch(133, 3_665_000),
    ch(134, 3_670_000),
    ch(135, 3_677_500),
    ch(136, 3_680_000),
    ch(137, 3_685_000),
    ch(138, 3_690_000),
];

pub const BAND_5GHZ: &[ChannelEntry] = &[
    // ─── 5.0 GHz (Japan) ───────────────────────────────────────────
    ch(7, 5_035_000),
    ch(8, 5_040_000),
    ch(9, 5_045_000),
    ch(11, 5_055_000),
    ch(12, 5_060_000),
    ch(16, 5_080_000),
    // ─── U-NII-1 / U-NII-2 ─────────────────────────────────────────
    ch(34, 5_170_000),
    ch(36, 5_180_000),
    ch(38, 5_190_000),
    ch(40, 5_200_000),
    ch(42, 5_210_000),
    ch(44, 5_220_000),
    ch(46, 5_230_000),
    ch(48, 5_240_000),
    ch(52, 5_260_000),
    ch(56, 5_280_000),
    ch(60, 5_300_000),
    ch(64, 5_320_000),
    // ─── U-NII-2e ──────────────────────────────────────────────────
    ch(100, 5_500_000),
    ch(104, 5_520_000),
    ch(108, 5_540_000),
    ch(112, 5_560_000),
    ch(116, 5_580_000),
    ch(120, 5_600_000),
    ch(124, 5_620_000),
    ch(128, 5_640_000),
    ch(132, 5_660_000),
    ch(136, 5_680_000),
    ch(140, 5_700_000),
    // ─── U-NII-3 ───────────────────────────────────────────────────
    ch(149, 5_745_000),
    ch(153, 5_765_000),
    ch(157, 5_785_000),
    ch(161, 5_805_000),
    ch(165, 5_825_000),
    // ─── 4.9 GHz public safety ─────────────────────────────────────
    ch(183, 4_915_000),
    ch(184, 4_920_000),
    ch(185, 4_925_000),
    ch(187, 4_935_000),
    ch(188, 4_940_000),
    ch(189, 4_945_000),
    ch(192, 4_960_000),
    ch(196, 4_980_000),
];

/// All allocations in `band`.
pub fn channels(band: Spectrum) -> &'static [ChannelEntry] {
    match band {
        Spectrum::Ghz2_4 => BAND_2_4GHZ,
        Spectrum::Ghz3_6 => BAND_3_6GHZ,
        Spectrum::Ghz5 => BAND_5GHZ,
    }
}

/// Centre frequency of `channel` in `band`, if allocated.
pub fn frequency_of(channel: u8, band: Spectrum) -> Option<Frequency> {
    channels(band)
        .iter()
        .find(|e| e.channel == channel)
        .map(|e| e.frequency)
}

/// Channel whose centre frequency is `frequency` in `band`, if any.
pub fn channel_of(frequency: Frequency, band: Spectrum) -> Option<u8> {
    channels(band)
        .iter()
        .find(|e| e.frequency == frequency)
        .map(|e| e.channel)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_sizes() {
        assert_eq!(channels(Spectrum::Ghz2_4).len(), 14);
        assert_eq!(channels(Spectrum::Ghz3_6).len(), 8);
        assert_eq!(channels(Spectrum::Ghz5).len(), 42);
    }

    #[test]
    fn known_lookups() {
        assert_eq!(
            frequency_of(1, Spectrum::Ghz2_4),
            Some(Frequency::from_khz(2_412_000))
        );
        assert_eq!(
            frequency_of(14, Spectrum::Ghz2_4),
            Some(Frequency::from_khz(2_484_000))
        );
        assert_eq!(
            channel_of(Frequency::from_khz(5_745_000), Spectrum::Ghz5),
            Some(149)
        );
    }

    #[test]
    fn same_channel_number_differs_per_band() {
        assert_eq!(frequency_of(132, Spectrum::Ghz3_6).unwrap().to_string(), "3.66");
        assert_eq!(frequency_of(132, Spectrum::Ghz5).unwrap().to_string(), "5.66");
        assert_eq!(frequency_of(7, Spectrum::Ghz2_4).unwrap().to_string(), "2.442");
        assert_eq!(frequency_of(7, Spectrum::Ghz5).unwrap().to_string(), "5.035");
    }

    #[test]
    fn unknown_pairs_are_not_found() {
        assert_eq!(frequency_of(15, Spectrum::Ghz2_4), None);
        assert_eq!(frequency_of(1, Spectrum::Ghz3_6), None);
        assert_eq!(channel_of(Frequency::from_khz(2_412_000), Spectrum::Ghz5), None);
    }

    #[test]
    fn frequencies_unique_within_band() {
        for band in Spectrum::ALL {
            let mut seen: Vec<_> = channels(band).iter().map(|e| e.frequency).collect();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), channels(band).len(), "duplicate frequency in {band}");
        }
    }

    #[test]
    fn display_matches_iwconfig() {
        assert_eq!(Frequency::from_khz(2_412_000).to_string(), "2.412");
        assert_eq!(Frequency::from_khz(3_657_500).to_string(), "3.6575");
        assert_eq!(Frequency::from_khz(5_200_000).to_string(), "5.2");
        assert_eq!(Frequency::from_khz(5_000_000).to_string(), "5");
    }

    #[test]
    fn parse_ghz_text() {
        assert_eq!(
            Frequency::parse_ghz("2.412"),
            Some(Frequency::from_khz(2_412_000))
        );
        assert_eq!(
            Frequency::parse_ghz("3.6575 GHz"),
            Some(Frequency::from_khz(3_657_500))
        );
        assert_eq!(Frequency::parse_ghz("5.2"), Some(Frequency::from_khz(5_200_000)));
        assert_eq!(Frequency::parse_ghz("5"), Some(Frequency::from_khz(5_000_000)));
        assert_eq!(Frequency::parse_ghz(""), None);
        assert_eq!(Frequency::parse_ghz("2.4a"), None);
        assert_eq!(Frequency::parse_ghz(".412"), None);
        assert_eq!(Frequency::parse_ghz("-2.412"), None);
    }
}
