//! Radio parameters
//!
//! This module houses the values that control how frames are transmitted and
//! received: data rate, pulse repetition frequency, preamble length, PAC size
//! and channel, plus the sixteen standard operating modes from the DW1000
//! datasheet that combine them.

#[cfg(feature = "defmt")]
use defmt::Format;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// The bitrate at which a message is transmitted
pub enum BitRate {
    /// 110 kilobits per second.
    Kbps110 = 0b00,
    /// 850 kilobits per second.
    Kbps850 = 0b01,
    /// 6.8 megabits per second.
    Kbps6800 = 0b10,
}

impl Default for BitRate {
    fn default() -> Self {
        BitRate::Kbps6800
    }
}

impl BitRate {
    /// Decodes a TXBR field value
    ///
    /// The reserved value `0b11`, and anything that doesn't fit into the
    /// 2-bit field, selects 6.8 Mbps.
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            0b00 => BitRate::Kbps110,
            0b01 => BitRate::Kbps850,
            _ => BitRate::Kbps6800,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// The PRF value
pub enum PulseRepetitionFrequency {
    /// 16 megahertz
    Mhz16 = 0b01,
    /// 64 megahertz
    Mhz64 = 0b10,
}

impl Default for PulseRepetitionFrequency {
    fn default() -> Self {
        PulseRepetitionFrequency::Mhz64
    }
}

impl PulseRepetitionFrequency {
    /// Decodes a TXPRF field value
    ///
    /// `0b00` (4 MHz) is not supported by the receiver and `0b11` is
    /// reserved, so both select 64 MHz, as does anything that doesn't fit
    /// into the 2-bit field.
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            0b01 => PulseRepetitionFrequency::Mhz16,
            _ => PulseRepetitionFrequency::Mhz64,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// An enum that specifies the length of the preamble.
///
/// Longer preambles improve the reception quality and thus range.
/// This comes at the cost of longer transmission times and thus power consumption and bandwidth use.
///
/// The discriminant is the 4-bit value that goes into TX_FCTRL: two bits
/// TXPSR, then two bits PE (table 16 in the user manual).
pub enum PreambleLength {
    /// 64 symbols of preamble.
    /// Only supported at Bitrate::Kbps6800.
    Symbols64 = 0b0001,
    /// 128 symbols of preamble.
    /// Only supported at Bitrate::Kbps850 & Bitrate::Kbps6800.
    Symbols128 = 0b0101,
    /// 256 symbols of preamble.
    /// Only supported at Bitrate::Kbps850 & Bitrate::Kbps6800.
    Symbols256 = 0b1001,
    /// 512 symbols of preamble.
    /// Only supported at Bitrate::Kbps850 & Bitrate::Kbps6800.
    Symbols512 = 0b1101,
    /// 1024 symbols of preamble.
    /// Only supported at Bitrate::Kbps850 & Bitrate::Kbps6800.
    Symbols1024 = 0b0010,
    /// 1536 symbols of preamble.
    /// Only supported at Bitrate::Kbps110.
    Symbols1536 = 0b0110,
    /// 2048 symbols of preamble.
    /// Only supported at Bitrate::Kbps110.
    Symbols2048 = 0b1010,
    /// 4096 symbols of preamble.
    /// Only supported at Bitrate::Kbps110.
    Symbols4096 = 0b0011,
}

impl Default for PreambleLength {
    fn default() -> Self {
        PreambleLength::Symbols1024
    }
}

impl PreambleLength {
    /// Decodes the 4-bit PE + TXPSR code
    ///
    /// Returns `None` for codes that don't name a preamble length.
    pub fn from_code(code: u8) -> Option<Self> {
        match code & 0x0f {
            0b0001 => Some(PreambleLength::Symbols64),
            0b0101 => Some(PreambleLength::Symbols128),
            0b1001 => Some(PreambleLength::Symbols256),
            0b1101 => Some(PreambleLength::Symbols512),
            0b0010 => Some(PreambleLength::Symbols1024),
            0b0110 => Some(PreambleLength::Symbols1536),
            0b1010 => Some(PreambleLength::Symbols2048),
            0b0011 => Some(PreambleLength::Symbols4096),
            _ => None,
        }
    }

    /// Gets the recommended PAC size based on the preamble length.
    pub fn recommended_pac_size(&self) -> PacSize {
        // Values are taken from Table 6 of the DW1000 User manual
        match self {
            PreambleLength::Symbols64 | PreambleLength::Symbols128 => PacSize::Symbols8,
            PreambleLength::Symbols256 | PreambleLength::Symbols512 => PacSize::Symbols16,
            PreambleLength::Symbols1024 => PacSize::Symbols32,
            _ => PacSize::Symbols64,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Preamble acquisition chunk size, in symbols
pub enum PacSize {
    /// 8 symbols
    Symbols8 = 8,
    /// 16 symbols
    Symbols16 = 16,
    /// 32 symbols
    Symbols32 = 32,
    /// 64 symbols
    Symbols64 = 64,
}

impl PacSize {
    /// Looks up the PAC size for a symbol count
    pub fn from_symbols(symbols: u8) -> Option<Self> {
        match symbols {
            8 => Some(PacSize::Symbols8),
            16 => Some(PacSize::Symbols16),
            32 => Some(PacSize::Symbols32),
            64 => Some(PacSize::Symbols64),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// All the available UWB channels.
///
/// Note that while a channel may have more bandwidth than ~900 Mhz, the DW1000 can only send up to ~900 Mhz
pub enum UwbChannel {
    /// Channel 1
    /// - Center frequency: 3494.4 Mhz
    /// - Bandwidth: 499.2 Mhz
    Channel1 = 1,
    /// Channel 2
    /// - Center frequency: 3993.6 Mhz
    /// - Bandwidth: 499.2 Mhz
    Channel2 = 2,
    /// Channel 3
    /// - Center frequency: 4492.8 Mhz
    /// - Bandwidth: 499.2 Mhz
    Channel3 = 3,
    /// Channel 4
    /// - Center frequency: 3993.6 Mhz
    /// - Bandwidth: 1331.2 Mhz
    Channel4 = 4,
    /// Channel 5
    /// - Center frequency: 6489.6 Mhz
    /// - Bandwidth: 499.2 Mhz
    Channel5 = 5,
    /// Channel 7
    /// - Center frequency: 6489.6 Mhz
    /// - Bandwidth: 1081.6 Mhz
    Channel7 = 7,
}

impl Default for UwbChannel {
    fn default() -> Self {
        UwbChannel::Channel5
    }
}

impl UwbChannel {
    /// Looks up a channel by its number
    ///
    /// Channel 6 doesn't exist on the DW1000, so `6` returns `None` like any
    /// other unknown number.
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(UwbChannel::Channel1),
            2 => Some(UwbChannel::Channel2),
            3 => Some(UwbChannel::Channel3),
            4 => Some(UwbChannel::Channel4),
            5 => Some(UwbChannel::Channel5),
            7 => Some(UwbChannel::Channel7),
            _ => None,
        }
    }

    /// The channel number
    pub fn number(&self) -> u8 {
        *self as u8
    }
}

/// Receiver tuning inputs
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RxTuning {
    /// Expected data rate
    pub bitrate: BitRate,
    /// Expected PRF
    pub pulse_repetition_frequency: PulseRepetitionFrequency,
    /// Expected preamble length
    pub preamble_length: PreambleLength,
    /// PAC size to use for acquisition
    pub pac_size: PacSize,
}

/// Everything one of the [`DefaultMode`]s configures
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeSettings {
    /// Transmit data rate
    pub bitrate: BitRate,
    /// Transmit PRF
    pub pulse_repetition_frequency: PulseRepetitionFrequency,
    /// Transmit preamble length
    pub preamble_length: PreambleLength,
    /// Frame length in bytes
    pub frame_length: u16,
    /// How the receiver gets tuned
    pub rx: RxTuning,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// The operating modes listed in the DW1000 datasheet, section 5
#[allow(missing_docs)]
pub enum DefaultMode {
    Mode1 = 1,
    Mode2,
    Mode3,
    Mode4,
    Mode5,
    Mode6,
    Mode7,
    Mode8,
    Mode9,
    Mode10,
    Mode11,
    Mode12,
    Mode13,
    Mode14,
    Mode15,
    Mode16,
}

impl DefaultMode {
    /// Looks up a mode by its number, 1 to 16
    pub fn from_number(number: u8) -> Option<Self> {
        use DefaultMode::*;

        const ALL: [DefaultMode; 16] = [
            Mode1, Mode2, Mode3, Mode4, Mode5, Mode6, Mode7, Mode8, Mode9, Mode10, Mode11,
            Mode12, Mode13, Mode14, Mode15, Mode16,
        ];

        ALL.get((number as usize).checked_sub(1)?).copied()
    }

    /// The values this mode configures
    pub fn settings(&self) -> ModeSettings {
        use BitRate::*;
        use DefaultMode::*;
        use PreambleLength::*;
        use PulseRepetitionFrequency::*;

        // (tx rate, tx prf, preamble, frame length), (rx rate, rx prf, rx preamble, pac)
        let ((bitrate, prf, preamble, frame_length), (rx_rate, rx_prf, rx_preamble, pac)) =
            match self {
                Mode1 => ((Kbps110, Mhz16, Symbols1024, 12), (Kbps110, Mhz16, Symbols1024, 32)),
                Mode2 => ((Kbps6800, Mhz16, Symbols128, 12), (Kbps6800, Mhz16, Symbols128, 8)),
                Mode3 => ((Kbps110, Mhz16, Symbols1024, 30), (Kbps110, Mhz16, Symbols1024, 32)),
                Mode4 => ((Kbps6800, Mhz16, Symbols128, 30), (Kbps6800, Mhz16, Symbols128, 8)),
                Mode5 => ((Kbps6800, Mhz16, Symbols1024, 1023), (Kbps110, Mhz16, Symbols1024, 32)),
                Mode6 => ((Kbps6800, Mhz16, Symbols128, 127), (Kbps6800, Mhz16, Symbols128, 8)),
                Mode7 => ((Kbps110, Mhz16, Symbols1024, 1023), (Kbps110, Mhz16, Symbols1024, 32)),
                Mode8 => ((Kbps110, Mhz16, Symbols1024, 127), (Kbps110, Mhz16, Symbols1024, 32)),
                Mode9 => ((Kbps110, Mhz64, Symbols1024, 12), (Kbps110, Mhz64, Symbols1024, 32)),
                Mode10 => ((Kbps6800, Mhz64, Symbols128, 12), (Kbps6800, Mhz64, Symbols128, 8)),
                Mode11 => ((Kbps110, Mhz64, Symbols1024, 30), (Kbps110, Mhz64, Symbols1024, 32)),
                Mode12 => ((Kbps6800, Mhz64, Symbols128, 30), (Kbps6800, Mhz64, Symbols128, 8)),
                Mode13 => ((Kbps6800, Mhz16, Symbols1024, 1023), (Kbps6800, Mhz64, Symbols1024, 32)),
                Mode14 => ((Kbps6800, Mhz64, Symbols128, 127), (Kbps6800, Mhz64, Symbols128, 8)),
                Mode15 => ((Kbps110, Mhz64, Symbols1024, 1023), (Kbps110, Mhz64, Symbols1024, 32)),
                Mode16 => ((Kbps110, Mhz64, Symbols1024, 127), (Kbps110, Mhz64, Symbols1024, 32)),
            };

        let pac_size = match pac {
            8 => PacSize::Symbols8,
            _ => PacSize::Symbols32,
        };

        ModeSettings {
            bitrate,
            pulse_repetition_frequency: prf,
            preamble_length: preamble,
            frame_length,
            rx: RxTuning {
                bitrate: rx_rate,
                pulse_repetition_frequency: rx_prf,
                preamble_length: rx_preamble,
                pac_size,
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reserved_rate_is_6m8() {
        assert_eq!(BitRate::from_bits(3), BitRate::Kbps6800);
        assert_eq!(BitRate::from_bits(0xff), BitRate::Kbps6800);
        assert_eq!(BitRate::from_bits(0x05), BitRate::Kbps6800);
        assert_eq!(BitRate::from_bits(1), BitRate::Kbps850);
    }

    #[test]
    fn unsupported_prf_is_64mhz() {
        assert_eq!(PulseRepetitionFrequency::from_bits(0), PulseRepetitionFrequency::Mhz64);
        assert_eq!(PulseRepetitionFrequency::from_bits(3), PulseRepetitionFrequency::Mhz64);
        assert_eq!(PulseRepetitionFrequency::from_bits(1), PulseRepetitionFrequency::Mhz16);
        assert_eq!(PulseRepetitionFrequency::from_bits(5), PulseRepetitionFrequency::Mhz64);
    }

    #[test]
    fn preamble_codes_round_trip_through_from_code() {
        for preamble in [
            PreambleLength::Symbols64,
            PreambleLength::Symbols512,
            PreambleLength::Symbols4096,
        ] {
            assert_eq!(PreambleLength::from_code(preamble as u8), Some(preamble));
        }
        assert_eq!(PreambleLength::from_code(0), None);
    }

    #[test]
    fn default_modes_are_numbered_from_one() {
        assert_eq!(DefaultMode::from_number(0), None);
        assert_eq!(DefaultMode::from_number(1), Some(DefaultMode::Mode1));
        assert_eq!(DefaultMode::from_number(16), Some(DefaultMode::Mode16));
        assert_eq!(DefaultMode::from_number(17), None);

        let settings = DefaultMode::Mode6.settings();
        assert_eq!(settings.frame_length, 127);
        assert_eq!(settings.rx.pac_size, PacSize::Symbols8);
    }
}
