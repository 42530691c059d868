#[cfg(feature = "defmt")]
use defmt::Format;

use super::{Error, DW1000};
use crate::{bits::RegisterImage, ll, maybe_async_attr, spi_type};

use crate::ll::sys_status::{LDEDONE, LDEERR, RXDFR, RXFCE, RXFCG, RXRFSL, TXFRS};

/// The receive event bits acknowledged by [`DW1000::clear_receive_status`]
const RECEIVE_EVENTS: [usize; 6] = [RXDFR, LDEDONE, LDEERR, RXFCE, RXFCG, RXRFSL];

/// How a reception ended, as far as SYS_STATUS can tell
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReceiveOutcome {
    /// A good frame arrived and its timestamp is ready
    Success,
    /// The frame was lost to an FCS, Reed Solomon or LDE error
    Failed,
    /// Neither of the above yet
    Undecided,
}

/// SYS_STATUS as read at one moment
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct StatusSnapshot(RegisterImage<{ ll::SYS_STATUS_LEN }>);

impl StatusSnapshot {
    /// Wraps raw SYS_STATUS bytes
    pub fn from_bytes(bytes: [u8; ll::SYS_STATUS_LEN]) -> Self {
        StatusSnapshot(RegisterImage::from_bytes(bytes))
    }

    /// The raw register image
    pub fn image(&self) -> &RegisterImage<{ ll::SYS_STATUS_LEN }> {
        &self.0
    }

    // All positions used here are below 40, so the lookup can't fail.
    fn bit(&self, bit: usize) -> bool {
        self.0.get_bit(bit).unwrap_or(false)
    }

    /// Transmit frame sent
    pub fn transmit_done(&self) -> bool {
        self.bit(TXFRS)
    }

    /// LDE processing done
    pub fn lde_done(&self) -> bool {
        self.bit(LDEDONE)
    }

    /// Receiver data frame ready
    pub fn receive_done(&self) -> bool {
        self.bit(RXDFR)
    }

    /// Receiver FCS good
    pub fn frame_check_good(&self) -> bool {
        self.bit(RXFCG)
    }

    /// Receiver FCS error
    pub fn frame_check_error(&self) -> bool {
        self.bit(RXFCE)
    }

    /// Receiver Reed Solomon frame sync loss
    pub fn reed_solomon_error(&self) -> bool {
        self.bit(RXRFSL)
    }

    /// Leading edge detection processing error
    pub fn lde_error(&self) -> bool {
        self.bit(LDEERR)
    }

    /// Decides how the current reception went
    ///
    /// Any error bit wins over the success bits.
    pub fn receive_outcome(&self) -> ReceiveOutcome {
        if self.lde_error() || self.frame_check_error() || self.reed_solomon_error() {
            ReceiveOutcome::Failed
        } else if self.frame_check_good() && self.lde_done() {
            ReceiveOutcome::Success
        } else {
            ReceiveOutcome::Undecided
        }
    }
}

impl<SPI> DW1000<SPI>
where
    SPI: spi_type::spi::SpiDevice<u8>,
{
    /// Reads SYS_STATUS
    #[maybe_async_attr]
    pub async fn status(&mut self) -> Result<StatusSnapshot, Error<SPI>> {
        let bytes = self
            .ll
            .read_array::<{ ll::SYS_STATUS_LEN }>(ll::SYS_STATUS)
            .await?;

        Ok(StatusSnapshot::from_bytes(bytes))
    }

    /// Whether the last frame has left the antenna
    #[maybe_async_attr]
    pub async fn is_transmit_done(&mut self) -> Result<bool, Error<SPI>> {
        Ok(self.status().await?.transmit_done())
    }

    /// Whether the receive timestamp is ready
    #[maybe_async_attr]
    pub async fn is_lde_done(&mut self) -> Result<bool, Error<SPI>> {
        Ok(self.status().await?.lde_done())
    }

    /// Whether a frame has been received, good or bad
    #[maybe_async_attr]
    pub async fn is_receive_done(&mut self) -> Result<bool, Error<SPI>> {
        Ok(self.status().await?.receive_done())
    }

    /// Reads SYS_STATUS once and decides how the current reception went
    #[maybe_async_attr]
    pub async fn receive_outcome(&mut self) -> Result<ReceiveOutcome, Error<SPI>> {
        Ok(self.status().await?.receive_outcome())
    }

    /// Whether a good frame is ready
    ///
    /// `false` covers both failed and undecided receptions; use
    /// [`DW1000::receive_outcome`] to tell them apart.
    #[maybe_async_attr]
    pub async fn is_receive_success(&mut self) -> Result<bool, Error<SPI>> {
        Ok(self.receive_outcome().await? == ReceiveOutcome::Success)
    }

    /// Acknowledges the receive events
    ///
    /// Writes back the current status with RXDFR, LDEDONE, LDEERR, RXFCE,
    /// RXFCG and RXRFSL set, which clears them.
    #[maybe_async_attr]
    pub async fn clear_receive_status(&mut self) -> Result<(), Error<SPI>> {
        let mut status = *self.status().await?.image();
        for bit in RECEIVE_EVENTS {
            status.set_bit(bit, true)?;
        }

        self.ll.write(ll::SYS_STATUS, status.as_bytes()).await?;

        Ok(())
    }

    /// Acknowledges the transmit done event
    #[maybe_async_attr]
    pub async fn clear_transmit_status(&mut self) -> Result<(), Error<SPI>> {
        let mut status = *self.status().await?.image();
        status.set_bit(TXFRS, true)?;

        self.ll.write(ll::SYS_STATUS, status.as_bytes()).await?;

        Ok(())
    }
}
