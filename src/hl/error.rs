use core::fmt;
use core::fmt::{Display, Formatter};

use embedded_hal::spi;

#[cfg(feature = "defmt")]
use defmt::Format;

use super::DeviceMode;
use crate::{bits::OutOfRange, ll};

/// An error that can occur when configuring the DW1000 or moving it between
/// modes
pub enum Error<SPI>
where
    SPI: spi::ErrorType,
{
    /// Error occured while using SPI bus
    Spi(ll::Error<SPI>),

    /// A bit position outside of a register image
    OutOfRange(OutOfRange),

    /// The frame doesn't fit into the transmit buffer or the PHY header mode
    FrameTooLarge {
        /// Encoded length, including the CRC unless it is suppressed
        len: usize,
        /// Largest length the current configuration allows
        max: usize,
    },

    /// The operation isn't allowed in the current mode
    InvalidModeForOperation {
        /// The mode the driver was in
        mode: DeviceMode,
    },

    /// The calibration profile has no entry for the requested settings
    UnsupportedConfiguration,

    /// Buffer too small
    BufferTooSmall {
        /// Indicates how large a buffer would have been required
        required_len: usize,
    },

    /// Receiver FCS error
    Fcs,

    /// Receiver Reed Solomon Frame Sync Loss
    ReedSolomon,

    /// Leading Edge Detection Processing Error
    LeadingEdgeDetection,
}

impl<SPI> From<ll::Error<SPI>> for Error<SPI>
where
    SPI: spi::ErrorType,
{
    fn from(error: ll::Error<SPI>) -> Self {
        Error::Spi(error)
    }
}

impl<SPI> From<OutOfRange> for Error<SPI>
where
    SPI: spi::ErrorType,
{
    fn from(error: OutOfRange) -> Self {
        Error::OutOfRange(error)
    }
}

impl<SPI> Display for Error<SPI>
where
    SPI: spi::ErrorType,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Spi(_) => write!(f, "SPI transaction failed"),
            Error::OutOfRange(error) => write!(f, "{}", error),
            Error::FrameTooLarge { len, max } => {
                write!(f, "frame of {} bytes exceeds the limit of {}", len, max)
            }
            Error::InvalidModeForOperation { mode } => {
                write!(f, "operation not allowed while {:?}", mode)
            }
            Error::UnsupportedConfiguration => write!(f, "no calibration entry for these settings"),
            Error::BufferTooSmall { required_len } => {
                write!(f, "buffer too small, {} bytes required", required_len)
            }
            Error::Fcs => write!(f, "frame check sequence error"),
            Error::ReedSolomon => write!(f, "Reed Solomon frame sync loss"),
            Error::LeadingEdgeDetection => write!(f, "leading edge detection error"),
        }
    }
}

#[cfg(feature = "std")]
impl<SPI> std::error::Error for Error<SPI>
where
    SPI: spi::ErrorType,
    SPI::Error: fmt::Debug,
{
}

// We can't derive this implementation, as `Debug` is only implemented
// conditionally for `ll::Debug`.
impl<SPI> fmt::Debug for Error<SPI>
where
    SPI: spi::ErrorType,
    SPI::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Spi(error) => write!(f, "Spi({:?})", error),
            Error::OutOfRange(error) => write!(f, "OutOfRange({:?})", error),
            Error::FrameTooLarge { len, max } => {
                write!(f, "FrameTooLarge {{ len: {:?}, max: {:?} }}", len, max)
            }
            Error::InvalidModeForOperation { mode } => {
                write!(f, "InvalidModeForOperation {{ mode: {:?} }}", mode)
            }
            Error::UnsupportedConfiguration => write!(f, "UnsupportedConfiguration"),
            Error::BufferTooSmall { required_len } => {
                write!(f, "BufferTooSmall {{ required_len: {:?} }}", required_len,)
            }
            Error::Fcs => write!(f, "Fcs"),
            Error::ReedSolomon => write!(f, "ReedSolomon"),
            Error::LeadingEdgeDetection => write!(f, "LeadingEdgeDetection"),
        }
    }
}

// We can't derive this implementation, as `Format` is only implemented
// conditionally for `ll::Error`.
#[cfg(feature = "defmt")]
impl<SPI> Format for Error<SPI>
where
    SPI: spi::ErrorType,
{
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Spi(error) => defmt::write!(f, "Spi({:?})", error),
            Error::OutOfRange(error) => defmt::write!(f, "OutOfRange({:?})", error),
            Error::FrameTooLarge { len, max } => {
                defmt::write!(f, "FrameTooLarge {{ len: {:?}, max: {:?} }}", len, max)
            }
            Error::InvalidModeForOperation { mode } => {
                defmt::write!(f, "InvalidModeForOperation {{ mode: {:?} }}", mode)
            }
            Error::UnsupportedConfiguration => defmt::write!(f, "UnsupportedConfiguration"),
            Error::BufferTooSmall { required_len } => {
                defmt::write!(f, "BufferTooSmall {{ required_len: {:?} }}", required_len,)
            }
            Error::Fcs => defmt::write!(f, "Fcs"),
            Error::ReedSolomon => defmt::write!(f, "ReedSolomon"),
            Error::LeadingEdgeDetection => defmt::write!(f, "LeadingEdgeDetection"),
        }
    }
}
