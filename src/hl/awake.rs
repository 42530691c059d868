use core::fmt;

#[cfg(feature = "defmt")]
use defmt::Format;

use super::{DeviceMode, Error, DW1000};
use crate::{
    ll,
    maybe_async_attr, spi_type,
    time::{Duration, Instant},
};

/// Decoded contents of the DEV_ID register
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceId {
    /// Register identification tag, `0xDECA` on genuine parts
    pub ridtag: u16,
    /// Model
    pub model: u8,
    /// Version
    pub version: u8,
    /// Revision
    pub revision: u8,
}

impl DeviceId {
    /// Decodes the 4 bytes of DEV_ID
    pub fn from_bytes(bytes: [u8; ll::DEV_ID_LEN]) -> Self {
        DeviceId {
            ridtag: u16::from_le_bytes([bytes[2], bytes[3]]),
            model: bytes[1],
            version: bytes[0] >> 4,
            revision: bytes[0] & 0x0f,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:04X} - model: {}, version: {}, revision: {}",
            self.ridtag, self.model, self.version, self.revision
        )
    }
}

impl<SPI> DW1000<SPI>
where
    SPI: spi_type::spi::SpiDevice<u8>,
{
    /// Reads and decodes the device identifier
    #[maybe_async_attr]
    pub async fn read_device_identifier(&mut self) -> Result<DeviceId, Error<SPI>> {
        let bytes = self.ll.read_array::<{ ll::DEV_ID_LEN }>(ll::DEV_ID).await?;

        Ok(DeviceId::from_bytes(bytes))
    }

    /// Returns the current system time
    #[maybe_async_attr]
    pub async fn sys_time(&mut self) -> Result<Instant, Error<SPI>> {
        let bytes = self.ll.read_array::<{ ll::SYS_TIME_LEN }>(ll::SYS_TIME).await?;

        Ok(Instant::from_le_bytes(bytes))
    }

    /// Force the DW1000 into idle mode
    ///
    /// Works from any mode. Any ongoing RX/TX operation is aborted and
    /// SYS_CTRL is left with only TRXOFF set.
    #[maybe_async_attr]
    pub async fn idle(&mut self) -> Result<(), Error<SPI>> {
        self.sys_ctrl.clear();
        self.sys_ctrl.set_bit(ll::sys_ctrl::TRXOFF, true)?;
        self.flush_sys_ctrl().await?;

        self.enter(DeviceMode::Idle);

        Ok(())
    }

    /// Don't let the DW1000 append a CRC to the next frame
    ///
    /// Allowed in any mode, but only has an effect on a transmission that
    /// hasn't been started yet. The setting is committed by
    /// [`DW1000::start_transmit`] and reset by [`DW1000::new_transmit`] and
    /// [`DW1000::new_receive`].
    pub fn suppress_frame_check(&mut self) -> Result<(), Error<SPI>> {
        self.sys_ctrl.set_bit(ll::sys_ctrl::SFCST, true)?;
        self.frame_check_suppressed = true;

        Ok(())
    }

    /// Schedule the pending transmission or reception `delay` from now
    ///
    /// Reads SYS_TIME, programs DX_TIME with the target time and sets TXDLYS
    /// or RXDLYE in the SYS_CTRL shadow, depending on the mode. The delay
    /// takes effect with the next [`DW1000::start_transmit`] or
    /// [`DW1000::start_receive`]. The DW1000 ignores the low 9 bits of
    /// DX_TIME, so the effective delay may be up to 8 ns shorter.
    ///
    /// Returns the instant the DW1000 will act at.
    #[maybe_async_attr]
    pub async fn delayed_transceive(&mut self, delay: Duration) -> Result<Instant, Error<SPI>> {
        let bit = match self.mode {
            DeviceMode::Transmitting => ll::sys_ctrl::TXDLYS,
            DeviceMode::Receiving => ll::sys_ctrl::RXDLYE,
            DeviceMode::Idle => {
                return Err(Error::InvalidModeForOperation { mode: self.mode });
            }
        };

        let now = self.sys_time().await?;
        let target = (now + delay).truncate_for_delay();

        self.ll.write(ll::DX_TIME, &target.to_le_bytes()).await?;
        self.sys_ctrl.set_bit(bit, true)?;

        Ok(target)
    }

    /// Same as [`DW1000::delayed_transceive`], with the delay in nanoseconds
    #[maybe_async_attr]
    pub async fn delayed_transceive_nanos(&mut self, nanos: u32) -> Result<Instant, Error<SPI>> {
        self.delayed_transceive(Duration::from_nanos(nanos)).await
    }
}
