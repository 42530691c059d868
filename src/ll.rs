//! Low-level interface to the DW1000
//!
//! This module implements a register-level interface to the DW1000. Users of
//! this library should typically not need to use this. Please consider using
//! the [high-level interface] instead.
//!
//! Every access is a single SPI transaction made of a 1 to 3 byte header
//! followed by the register payload. The header selects the register file
//! (6-bit id), the direction, and optionally a byte offset into the register
//! file, so that a part of a wide register can be accessed on its own. The
//! DW1000 user manual, section 2.2.1.2, describes the header layout.
//!
//! [high-level interface]: ../hl/index.html

use core::fmt;

use crate::{maybe_async_attr, spi_type};
use embedded_hal::spi;
use spi_type::spi::Operation;

#[cfg(feature = "defmt")]
use defmt::Format;

/// Entry point to the DW1000 driver's low-level API
///
/// Please consider using [hl::DW1000] instead.
///
/// [hl::DW1000]: ../hl/struct.DW1000.html
#[derive(Copy, Clone)]
pub struct DW1000<SPI> {
    pub(crate) spi: SPI,
}

impl<SPI> DW1000<SPI> {
    /// Create a new instance of `DW1000`
    ///
    /// Requires the SPI device that is connected to the DW1000. The device is
    /// expected to manage the chip select line itself, asserting it for the
    /// duration of each transaction.
    pub fn new(spi: SPI) -> Self {
        DW1000 { spi }
    }

    /// Allow access to the SPI bus
    pub fn bus(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Gives back the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> DW1000<SPI>
where
    SPI: spi_type::spi::SpiDevice<u8>,
{
    /// Reads `buffer.len()` bytes starting at `address`
    #[maybe_async_attr]
    pub async fn read(
        &mut self,
        address: RegisterAddress,
        buffer: &mut [u8],
    ) -> Result<(), Error<SPI>> {
        let header = address.header(false);

        self.spi
            .transaction(&mut [
                Operation::Write(header.as_bytes()),
                Operation::Read(buffer),
            ])
            .await
            .map_err(Error::Transfer)
    }

    /// Reads exactly `N` bytes starting at `address`
    #[maybe_async_attr]
    pub async fn read_array<const N: usize>(
        &mut self,
        address: RegisterAddress,
    ) -> Result<[u8; N], Error<SPI>> {
        let mut buffer = [0; N];
        self.read(address, &mut buffer).await?;

        Ok(buffer)
    }

    /// Writes `data` starting at `address`
    #[maybe_async_attr]
    pub async fn write(&mut self, address: RegisterAddress, data: &[u8]) -> Result<(), Error<SPI>> {
        let header = address.header(true);

        self.spi
            .transaction(&mut [
                Operation::Write(header.as_bytes()),
                Operation::Write(data),
            ])
            .await
            .map_err(Error::Write)
    }
}

/// Identifies a register file and, optionally, a byte offset inside it
///
/// A sub-address of `0` is the same as no sub-address: the register is
/// accessed from its first byte with a single-byte header.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegisterAddress {
    id: u8,
    sub: u16,
}

impl RegisterAddress {
    /// Largest register file id
    pub const MAX_ID: u8 = 0x3f;

    /// Largest sub-address the extended header can carry
    pub const MAX_SUB: u16 = 0x3fff;

    /// Creates a new address
    ///
    /// Returns `None` if `id` does not fit into 6 bits or `sub` is larger
    /// than [`RegisterAddress::MAX_SUB`].
    ///
    /// # Example
    ///
    /// ``` rust
    /// use dw1000_ng::ll::RegisterAddress;
    ///
    /// assert!(RegisterAddress::new(0x2e, Some(0x1806)).is_some());
    /// assert!(RegisterAddress::new(0x40, None).is_none());
    /// assert!(RegisterAddress::new(0x2e, Some(0x4000)).is_none());
    /// ```
    pub const fn new(id: u8, sub: Option<u16>) -> Option<Self> {
        let sub = match sub {
            Some(sub) => sub,
            None => 0,
        };

        if id > Self::MAX_ID || sub > Self::MAX_SUB {
            return None;
        }

        Some(RegisterAddress { id, sub })
    }

    // Only used for the register table below, where the values are known to
    // be in range.
    const fn at(id: u8, sub: u16) -> Self {
        RegisterAddress {
            id: id & Self::MAX_ID,
            sub: sub & Self::MAX_SUB,
        }
    }

    /// The register file id
    pub const fn id(&self) -> u8 {
        self.id
    }

    /// The byte offset into the register file, if any
    pub const fn sub(&self) -> Option<u16> {
        if self.sub == 0 {
            None
        } else {
            Some(self.sub)
        }
    }

    /// The same register file, starting `offset` bytes further in
    pub const fn offset(&self, offset: u16) -> Option<Self> {
        match self.sub.checked_add(offset) {
            Some(sub) => Self::new(self.id, Some(sub)),
            None => None,
        }
    }

    /// Builds the SPI header that precedes the payload
    pub fn header(&self, write: bool) -> Header {
        let mut bytes = [0; 3];

        bytes[0] = ((write as u8) << 7) | (self.id & Self::MAX_ID);

        if self.sub == 0 {
            return Header { bytes, len: 1 };
        }

        bytes[0] |= 0x40;

        if self.sub < 0x80 {
            bytes[1] = self.sub as u8;
            return Header { bytes, len: 2 };
        }

        bytes[1] = 0x80 | (self.sub & 0x7f) as u8;
        bytes[2] = (self.sub >> 7) as u8;

        Header { bytes, len: 3 }
    }
}

/// The 1 to 3 header bytes of a register transaction
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct Header {
    bytes: [u8; 3],
    len: usize,
}

impl Header {
    /// The header as it goes on the wire
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// An SPI error that can occur when communicating with the DW1000
pub enum Error<SPI>
where
    SPI: spi::ErrorType,
{
    /// SPI error occured during a read transaction
    Transfer(SPI::Error),

    /// SPI error occured during a write transaction
    Write(SPI::Error),
}

// We can't derive this implementation, as the compiler will complain that the
// associated error type doesn't implement `Debug`.
impl<SPI> fmt::Debug for Error<SPI>
where
    SPI: spi::ErrorType,
    SPI::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Transfer(error) => write!(f, "Transfer({:?})", error),
            Error::Write(error) => write!(f, "Write({:?})", error),
        }
    }
}

#[cfg(feature = "defmt")]
impl<SPI> defmt::Format for Error<SPI>
where
    SPI: spi::ErrorType,
{
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Transfer(_) => defmt::write!(f, "Transfer()"),
            Error::Write(_) => defmt::write!(f, "Write()"),
        }
    }
}

/// Generates the register address table
macro_rules! impl_register {
    (
        $(
            #[$doc:meta]
            $name:ident, $len_name:ident = $id:literal : $sub:literal, $len:literal;
        )*
    ) => {
        $(
            #[$doc]
            pub const $name: RegisterAddress = RegisterAddress::at($id, $sub);

            #[$doc]
            ///
            /// Width in bytes.
            pub const $len_name: usize = $len;
        )*
    };
}

// All registers the driver touches. Follows the syntax
// <NAME>, <NAME_LEN> = <id>:<sub-address>, <length>;
// with the values from the DW1000 user manual, section 7.1.
impl_register! {
    /// Device identifier
    DEV_ID, DEV_ID_LEN = 0x00:0x0000, 4;
    /// System configuration
    SYS_CFG, SYS_CFG_LEN = 0x04:0x0000, 4;
    /// System time counter
    SYS_TIME, SYS_TIME_LEN = 0x06:0x0000, 5;
    /// Transmit frame control
    TX_FCTRL, TX_FCTRL_LEN = 0x08:0x0000, 5;
    /// Transmit data buffer
    TX_BUFFER, TX_BUFFER_LEN = 0x09:0x0000, 1024;
    /// Delayed send or receive time
    DX_TIME, DX_TIME_LEN = 0x0A:0x0000, 5;
    /// System control
    SYS_CTRL, SYS_CTRL_LEN = 0x0D:0x0000, 4;
    /// System event status
    SYS_STATUS, SYS_STATUS_LEN = 0x0F:0x0000, 5;
    /// Receive frame information
    RX_FINFO, RX_FINFO_LEN = 0x10:0x0000, 4;
    /// Receive data buffer
    RX_BUFFER, RX_BUFFER_LEN = 0x11:0x0000, 1024;
    /// Receive time stamp, adjusted by the antenna delay
    RX_STAMP, RX_STAMP_LEN = 0x15:0x0000, 5;
    /// Digital tuning register 0b, SFD detection
    DRX_TUNE0B, DRX_TUNE0B_LEN = 0x27:0x0002, 2;
    /// Digital tuning register 1a, PRF dependent AGC
    DRX_TUNE1A, DRX_TUNE1A_LEN = 0x27:0x0004, 2;
    /// Digital tuning register 1b, data rate and preamble dependent
    DRX_TUNE1B, DRX_TUNE1B_LEN = 0x27:0x0006, 2;
    /// Digital tuning register 2, PAC size and PRF dependent
    DRX_TUNE2, DRX_TUNE2_LEN = 0x27:0x0008, 4;
    /// Digital tuning register 4h, preamble length dependent
    DRX_TUNE4H, DRX_TUNE4H_LEN = 0x27:0x0026, 2;
    /// Analog RX control, high byte
    RF_RXCTRLH, RF_RXCTRLH_LEN = 0x28:0x000B, 1;
    /// Analog TX control
    RF_TXCTRL, RF_TXCTRL_LEN = 0x28:0x000C, 3;
    /// Transmitter pulse generator delay
    TC_PGDELAY, TC_PGDELAY_LEN = 0x2A:0x000B, 1;
    /// Frequency synthesiser PLL configuration
    FS_PLLCFG, FS_PLLCFG_LEN = 0x2B:0x0007, 4;
    /// Frequency synthesiser PLL tuning
    FS_PLLTUNE, FS_PLLTUNE_LEN = 0x2B:0x000B, 1;
    /// Leading edge detection configuration 2
    LDE_CFG2, LDE_CFG2_LEN = 0x2E:0x1806, 2;
}

/// Bit positions in SYS_CFG
pub mod sys_cfg {
    /// Frame filtering enable
    pub const FFEN: usize = 0;
    /// Disable double RX buffer
    pub const DIS_DRXB: usize = 12;
    /// PHR mode, low bit
    pub const PHR_MODE_LSB: usize = 16;
    /// PHR mode, high bit
    pub const PHR_MODE_MSB: usize = 17;
    /// Receiver auto re-enable
    pub const RXAUTR: usize = 29;
}

/// Bit positions in SYS_CTRL
pub mod sys_ctrl {
    /// Suppress auto-FCS transmission
    pub const SFCST: usize = 0;
    /// Transmit start
    pub const TXSTRT: usize = 1;
    /// Transmitter delayed sending
    pub const TXDLYS: usize = 2;
    /// Transceiver off
    pub const TRXOFF: usize = 6;
    /// Wait for response
    pub const WAIT4RESP: usize = 7;
    /// Enable receiver
    pub const RXENAB: usize = 8;
    /// Receiver delayed enable
    pub const RXDLYE: usize = 9;
}

/// Bit positions in SYS_STATUS
///
/// All event bits are sticky and cleared by writing a 1 to them.
pub mod sys_status {
    /// Transmit frame sent
    pub const TXFRS: usize = 7;
    /// LDE processing done
    pub const LDEDONE: usize = 10;
    /// Receiver data frame ready
    pub const RXDFR: usize = 13;
    /// Receiver FCS good
    pub const RXFCG: usize = 14;
    /// Receiver FCS error
    pub const RXFCE: usize = 15;
    /// Receiver Reed Solomon frame sync loss
    pub const RXRFSL: usize = 16;
    /// Leading edge detection processing error
    pub const LDEERR: usize = 18;
}

/// Field layout of TX_FCTRL
pub mod tx_fctrl {
    /// Byte holding the low 8 bits of the frame length
    pub const LEN_BYTE: usize = 0;
    /// Byte holding the length extension and the bit rate
    pub const RATE_BYTE: usize = 1;
    /// Shift of the 2-bit bit rate field inside [`RATE_BYTE`]
    pub const RATE_SHIFT: u8 = 5;
    /// Mask of the length extension bits inside [`RATE_BYTE`]
    pub const LEN_EXT_MASK: u8 = 0x07;
    /// Byte holding the PRF and the preamble length
    pub const PREAMBLE_BYTE: usize = 2;
    /// Shift of the 4-bit preamble field inside [`PREAMBLE_BYTE`]
    pub const PREAMBLE_SHIFT: u8 = 2;
}
