//! Calibration tables
//!
//! The analog front end and the receiver's digital tuning registers need
//! values that depend on the channel, data rate, PRF, preamble length and PAC
//! size. Those values come from the DW1000 user manual (tables 30 to 38) and
//! are plain data: this module only stores them and looks them up.
//!
//! [`Calibration::DATASHEET`] is the profile the driver uses by default. A
//! board that needs different values can build its own [`Calibration`] from
//! static tables and hand it to [`DW1000::with_calibration`].
//!
//! [`DW1000::with_calibration`]: ../hl/struct.DW1000.html#method.with_calibration

#[cfg(feature = "defmt")]
use defmt::Format;

use crate::configs::{BitRate, PacSize, PreambleLength, PulseRepetitionFrequency, RxTuning, UwbChannel};

/// Values written by [`DW1000::set_rf_channel`]
///
/// [`DW1000::set_rf_channel`]: ../hl/struct.DW1000.html#method.set_rf_channel
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelTuning {
    /// RF_RXCTRLH
    pub rf_rxctrlh: u8,
    /// RF_TXCTRL, 24 bits
    pub rf_txctrl: u32,
    /// TC_PGDELAY
    pub tc_pgdelay: u8,
    /// FS_PLLCFG
    pub fs_pllcfg: u32,
    /// FS_PLLTUNE
    pub fs_plltune: u8,
}

/// Data rate dependent receiver values
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RateTuning {
    /// DRX_TUNE0b for the standard SFD
    pub drx_tune0b: u16,
    /// DRX_TUNE1b
    pub drx_tune1b: u16,
}

/// PRF dependent receiver values
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrfTuning {
    /// DRX_TUNE1a
    pub drx_tune1a: u16,
    /// LDE_CFG2
    pub lde_cfg2: u16,
}

/// Values written by [`DW1000::tune_receiver`]
///
/// [`DW1000::tune_receiver`]: ../hl/struct.DW1000.html#method.tune_receiver
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReceiverTuning {
    /// DRX_TUNE0b
    pub drx_tune0b: u16,
    /// DRX_TUNE1a
    pub drx_tune1a: u16,
    /// DRX_TUNE1b
    pub drx_tune1b: u16,
    /// DRX_TUNE2
    pub drx_tune2: u32,
    /// LDE_CFG2
    pub lde_cfg2: u16,
    /// DRX_TUNE4H
    pub drx_tune4h: u16,
}

/// A complete set of calibration tables
#[derive(Copy, Clone, Debug)]
pub struct Calibration {
    /// Per-channel analog and PLL settings
    pub channels: &'static [(UwbChannel, ChannelTuning)],
    /// Per-data-rate receiver settings
    pub rates: &'static [(BitRate, RateTuning)],
    /// Per-PRF receiver settings
    pub prfs: &'static [(PulseRepetitionFrequency, PrfTuning)],
    /// DRX_TUNE2, keyed by PRF and PAC size
    pub pacs: &'static [((PulseRepetitionFrequency, PacSize), u32)],
    /// DRX_TUNE4H for a 64 symbol preamble
    pub drx_tune4h_short: u16,
    /// DRX_TUNE4H for any longer preamble
    pub drx_tune4h_long: u16,
}

fn find<K: PartialEq, V>(table: &'static [(K, V)], key: &K) -> Option<&'static V> {
    table.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

impl Calibration {
    /// Values from the DW1000 user manual, version 2.02
    ///
    /// The 850 kbps and 6.8 Mbps rows are left out on purpose: the DRX_TUNE0b
    /// and DRX_TUNE1b values the manual gives for them disagree with each
    /// other, so receiver tuning for those rates is reported as unsupported
    /// until they are confirmed.
    pub const DATASHEET: Calibration = Calibration {
        channels: &[
            (UwbChannel::Channel1, ChannelTuning {
                rf_rxctrlh: 0xD8,
                rf_txctrl: 0x00005C40,
                tc_pgdelay: 0xC9,
                fs_pllcfg: 0x09000407,
                fs_plltune: 0x1E,
            }),
            (UwbChannel::Channel2, ChannelTuning {
                rf_rxctrlh: 0xD8,
                rf_txctrl: 0x00045CA0,
                tc_pgdelay: 0xC2,
                fs_pllcfg: 0x08400508,
                fs_plltune: 0x26,
            }),
            (UwbChannel::Channel3, ChannelTuning {
                rf_rxctrlh: 0xD8,
                rf_txctrl: 0x00086CC0,
                tc_pgdelay: 0xC5,
                fs_pllcfg: 0x08401009,
                fs_plltune: 0x5E,
            }),
            (UwbChannel::Channel4, ChannelTuning {
                rf_rxctrlh: 0xBC,
                rf_txctrl: 0x00045C80,
                tc_pgdelay: 0x95,
                fs_pllcfg: 0x08400508,
                fs_plltune: 0x26,
            }),
            (UwbChannel::Channel5, ChannelTuning {
                rf_rxctrlh: 0xD8,
                rf_txctrl: 0x001E3FE0,
                tc_pgdelay: 0xC0,
                fs_pllcfg: 0x0800041D,
                fs_plltune: 0xA6,
            }),
            (UwbChannel::Channel7, ChannelTuning {
                rf_rxctrlh: 0xBC,
                rf_txctrl: 0x001E7DE0,
                tc_pgdelay: 0x93,
                fs_pllcfg: 0x0800041D,
                fs_plltune: 0xA6,
            }),
        ],
        rates: &[
            (BitRate::Kbps110, RateTuning {
                drx_tune0b: 0x000A,
                drx_tune1b: 0x0064,
            }),
        ],
        prfs: &[
            (PulseRepetitionFrequency::Mhz16, PrfTuning {
                drx_tune1a: 0x0087,
                lde_cfg2: 0x1607,
            }),
            (PulseRepetitionFrequency::Mhz64, PrfTuning {
                drx_tune1a: 0x008D,
                lde_cfg2: 0x0607,
            }),
        ],
        pacs: &[
            ((PulseRepetitionFrequency::Mhz16, PacSize::Symbols8), 0x311A002D),
            ((PulseRepetitionFrequency::Mhz64, PacSize::Symbols8), 0x313B006B),
            ((PulseRepetitionFrequency::Mhz16, PacSize::Symbols16), 0x331A0052),
            ((PulseRepetitionFrequency::Mhz64, PacSize::Symbols16), 0x333B00BE),
            ((PulseRepetitionFrequency::Mhz16, PacSize::Symbols32), 0x351A009A),
            ((PulseRepetitionFrequency::Mhz64, PacSize::Symbols32), 0x353B015E),
            ((PulseRepetitionFrequency::Mhz16, PacSize::Symbols64), 0x371A011D),
            ((PulseRepetitionFrequency::Mhz64, PacSize::Symbols64), 0x373B0296),
        ],
        drx_tune4h_short: 0x0010,
        drx_tune4h_long: 0x0028,
    };

    /// Settings for `channel`, if the profile has them
    pub fn channel(&self, channel: UwbChannel) -> Option<&'static ChannelTuning> {
        find(self.channels, &channel)
    }

    /// Receiver settings for `key`
    ///
    /// Returns `None` if any part of the key is missing from the profile.
    pub fn receiver(&self, key: &RxTuning) -> Option<ReceiverTuning> {
        let rate = find(self.rates, &key.bitrate)?;
        let prf = find(self.prfs, &key.pulse_repetition_frequency)?;
        let drx_tune2 = *find(self.pacs, &(key.pulse_repetition_frequency, key.pac_size))?;

        let drx_tune4h = match key.preamble_length {
            PreambleLength::Symbols64 => self.drx_tune4h_short,
            _ => self.drx_tune4h_long,
        };

        Some(ReceiverTuning {
            drx_tune0b: rate.drx_tune0b,
            drx_tune1a: prf.drx_tune1a,
            drx_tune1b: rate.drx_tune1b,
            drx_tune2,
            lde_cfg2: prf.lde_cfg2,
            drx_tune4h,
        })
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Calibration::DATASHEET
    }
}
