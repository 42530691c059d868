//! High-level interface to the DW1000
//!
//! The entry point to this API is the [DW1000] struct. Please refer to the
//! documentation there for more details.
//!
//! This module implements a high-level interface to the DW1000. This is the
//! recommended way to access the DW1000 using this crate, unless you need the
//! greater flexibility provided by the [register-level interface].
//!
//! [register-level interface]: ../ll/index.html

use core::fmt;

#[cfg(feature = "defmt")]
use defmt::Format;

pub use awake::*;
pub use error::*;
pub use ready::*;
pub use status::*;

use crate::{bits::RegisterImage, ll, maybe_async_attr, spi_type, tuning::Calibration};

mod awake;
mod error;
mod ready;
mod receiving;
mod sending;
mod status;

/// What the driver has set the transceiver up for
///
/// Only changes through the session methods on [`DW1000`]. Note that the
/// driver returns to `Idle` as soon as a transmission has been started; use
/// [`DW1000::is_transmit_done`] to learn when the frame has actually left.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceMode {
    /// Transceiver off, configuration allowed
    #[default]
    Idle,
    /// A reception is being prepared or is running
    Receiving,
    /// A transmission is being prepared
    Transmitting,
}

/// Entry point to the DW1000 driver API
///
/// The driver owns the SPI device and keeps shadow copies of SYS_CFG,
/// SYS_CTRL and TX_FCTRL. Setters edit the shadows and write them out when
/// the hardware needs to see the change; a few transmit settings stay in the
/// shadow until [`DW1000::start_transmit`] commits them.
#[derive(Clone)]
pub struct DW1000<SPI> {
    ll: ll::DW1000<SPI>,
    calibration: Calibration,
    mode: DeviceMode,
    sys_cfg: RegisterImage<{ ll::SYS_CFG_LEN }>,
    sys_ctrl: RegisterImage<{ ll::SYS_CTRL_LEN }>,
    tx_fctrl: RegisterImage<{ ll::TX_FCTRL_LEN }>,
    frame_check_suppressed: bool,
    extended_frame_length: bool,
}

// Can't be derived without putting requirements on `SPI`.
impl<SPI> fmt::Debug for DW1000<SPI> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DW1000 {{ mode: {:?}, .. }}", self.mode)
    }
}

impl<SPI> DW1000<SPI> {
    /// Create a new instance of `DW1000`
    ///
    /// Requires the SPI device that is connected to the DW1000. All shadow
    /// registers start out zeroed and the driver starts in
    /// [`DeviceMode::Idle`]; nothing is sent to the chip yet.
    pub fn new(spi: SPI) -> Self {
        DW1000 {
            ll: ll::DW1000::new(spi),
            calibration: Calibration::DATASHEET,
            mode: DeviceMode::Idle,
            sys_cfg: RegisterImage::new(),
            sys_ctrl: RegisterImage::new(),
            tx_fctrl: RegisterImage::new(),
            frame_check_suppressed: false,
            extended_frame_length: false,
        }
    }

    /// Use another calibration profile for channel and receiver tuning
    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    /// The current device mode
    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    /// Provides direct access to the register-level API
    ///
    /// Be aware that by using the register-level API, you can invalidate
    /// various assumptions that the high-level API makes about the operation of
    /// the DW1000. Don't use the register-level and high-level APIs in tandem,
    /// unless you know what you're doing.
    pub fn ll(&mut self) -> &mut ll::DW1000<SPI> {
        &mut self.ll
    }

    /// The SYS_CTRL shadow
    ///
    /// Holds the control bits that will be written by the next flush, such as
    /// [`DW1000::start_transmit`].
    pub fn system_control(&self) -> &RegisterImage<{ ll::SYS_CTRL_LEN }> {
        &self.sys_ctrl
    }

    /// The TX_FCTRL shadow
    pub fn transmit_frame_control(&self) -> &RegisterImage<{ ll::TX_FCTRL_LEN }> {
        &self.tx_fctrl
    }

    /// Gives back the SPI device
    pub fn release(self) -> SPI {
        self.ll.release()
    }

    fn enter(&mut self, mode: DeviceMode) {
        #[cfg(feature = "defmt")]
        defmt::trace!("DW1000 mode {} -> {}", self.mode, mode);

        self.mode = mode;
    }
}

impl<SPI> DW1000<SPI>
where
    SPI: spi_type::spi::SpiDevice<u8>,
{
    fn require(&self, mode: DeviceMode) -> Result<(), Error<SPI>> {
        if self.mode != mode {
            return Err(Error::InvalidModeForOperation { mode: self.mode });
        }

        Ok(())
    }

    #[maybe_async_attr]
    async fn flush_sys_cfg(&mut self) -> Result<(), Error<SPI>> {
        self.ll.write(ll::SYS_CFG, self.sys_cfg.as_bytes()).await?;
        Ok(())
    }

    #[maybe_async_attr]
    async fn flush_sys_ctrl(&mut self) -> Result<(), Error<SPI>> {
        self.ll.write(ll::SYS_CTRL, self.sys_ctrl.as_bytes()).await?;
        Ok(())
    }

    #[maybe_async_attr]
    async fn flush_tx_fctrl(&mut self) -> Result<(), Error<SPI>> {
        self.ll.write(ll::TX_FCTRL, self.tx_fctrl.as_bytes()).await?;
        Ok(())
    }
}
