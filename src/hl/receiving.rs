use super::{DeviceMode, Error, ReceiveOutcome, DW1000};
use crate::{ll, maybe_async_attr, spi_type, time::Instant};

/// Bits of RX_FINFO holding the received frame length
const RXFLEN_MASK: u16 = 0x03ff;

/// Length of the CRC at the end of each received frame
const CRC_LEN: usize = 2;

impl<SPI> DW1000<SPI>
where
    SPI: spi_type::spi::SpiDevice<u8>,
{
    /// Prepare a new reception
    ///
    /// Allowed while idle, or while receiving to start over. Resets the
    /// SYS_CTRL shadow and the frame check suppression. Nothing is written
    /// to the chip until [`DW1000::start_receive`].
    pub fn new_receive(&mut self) -> Result<(), Error<SPI>> {
        if self.mode == DeviceMode::Transmitting {
            return Err(Error::InvalidModeForOperation { mode: self.mode });
        }

        self.sys_ctrl.clear();
        self.frame_check_suppressed = false;
        self.enter(DeviceMode::Receiving);

        Ok(())
    }

    /// Turn the receiver on
    ///
    /// The driver stays in [`DeviceMode::Receiving`]; poll
    /// [`DW1000::wait_receive`] or the status methods to find out when a
    /// frame has arrived.
    #[maybe_async_attr]
    pub async fn start_receive(&mut self) -> Result<(), Error<SPI>> {
        self.require(DeviceMode::Receiving)?;

        self.sys_ctrl.set_bit(ll::sys_ctrl::RXENAB, true)?;
        self.flush_sys_ctrl().await
    }

    /// Abandon the reception and turn the transceiver off
    #[maybe_async_attr]
    pub async fn cancel_receive(&mut self) -> Result<(), Error<SPI>> {
        self.require(DeviceMode::Receiving)?;

        self.new_receive()?;
        self.idle().await
    }

    /// Copy the received frame, without its CRC, into `buffer`
    ///
    /// Returns the number of bytes copied.
    #[maybe_async_attr]
    pub async fn get_data(&mut self, buffer: &mut [u8]) -> Result<usize, Error<SPI>> {
        let rx_finfo = self.ll.read_array::<{ ll::RX_FINFO_LEN }>(ll::RX_FINFO).await?;

        let frame_len = u16::from_le_bytes([rx_finfo[0], rx_finfo[1]]) & RXFLEN_MASK;
        let len = usize::from(frame_len).saturating_sub(CRC_LEN);

        if buffer.len() < len {
            return Err(Error::BufferTooSmall { required_len: len });
        }

        if len > 0 {
            self.ll.read(ll::RX_BUFFER, &mut buffer[..len]).await?;
        }

        Ok(len)
    }

    /// The time the last frame arrived, corrected by the antenna delay
    ///
    /// Only valid once LDE processing is done, see [`DW1000::is_lde_done`].
    #[maybe_async_attr]
    pub async fn rx_timestamp(&mut self) -> Result<Instant, Error<SPI>> {
        let bytes = self.ll.read_array::<{ ll::RX_STAMP_LEN }>(ll::RX_STAMP).await?;

        Ok(Instant::from_le_bytes(bytes))
    }

    /// Wait for receive operation to finish
    ///
    /// This method returns an `nb::Result` to indicate whether the reception
    /// has finished, or whether it is still ongoing. You can use this to busily
    /// wait for the reception to finish, for example using `nb`'s `block!`
    /// macro.
    ///
    /// On success the frame is copied into `buffer` and its length returned.
    /// Either way, once the reception is decided the receive events are
    /// acknowledged and the transceiver is turned off.
    #[maybe_async_attr]
    pub async fn wait_receive(&mut self, buffer: &mut [u8]) -> nb::Result<usize, Error<SPI>> {
        self.require(DeviceMode::Receiving)
            .map_err(nb::Error::Other)?;

        let status = self.status().await.map_err(nb::Error::Other)?;

        let result = match status.receive_outcome() {
            ReceiveOutcome::Undecided => return Err(nb::Error::WouldBlock),
            ReceiveOutcome::Failed if status.lde_error() => Err(Error::LeadingEdgeDetection),
            ReceiveOutcome::Failed if status.frame_check_error() => Err(Error::Fcs),
            ReceiveOutcome::Failed => Err(Error::ReedSolomon),
            ReceiveOutcome::Success => self.get_data(buffer).await,
        };

        #[cfg(feature = "defmt")]
        defmt::debug!("DW1000 reception finished: {}", status);

        self.clear_receive_status().await.map_err(nb::Error::Other)?;
        self.idle().await.map_err(nb::Error::Other)?;

        result.map_err(nb::Error::Other)
    }
}

#[cfg(all(test, not(feature = "async")))]
mod test {
    use super::*;

    use embedded_hal_mock::eh1::spi::Mock as SpiMock;

    use crate::hl::test_bus::{read, write};

    #[test]
    fn receive_session() {
        let expectations = [
            write(ll::SYS_CTRL, &[0x00, 0x01, 0x00, 0x00]),
            write(ll::SYS_CTRL, &[0x40, 0x00, 0x00, 0x00]),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.new_receive().unwrap();
        assert_eq!(dw1000.mode(), DeviceMode::Receiving);

        dw1000.start_receive().unwrap();
        assert_eq!(dw1000.mode(), DeviceMode::Receiving);

        dw1000.cancel_receive().unwrap();
        assert_eq!(dw1000.mode(), DeviceMode::Idle);

        spi.done();
    }

    #[test]
    fn receive_is_rejected_while_transmitting() {
        let mut spi = SpiMock::<u8>::new(&[]);

        let mut dw1000 = DW1000::new(spi.clone());
        assert!(matches!(
            dw1000.start_receive(),
            Err(Error::InvalidModeForOperation {
                mode: DeviceMode::Idle
            })
        ));

        dw1000.new_transmit();
        assert!(matches!(
            dw1000.new_receive(),
            Err(Error::InvalidModeForOperation {
                mode: DeviceMode::Transmitting
            })
        ));
        assert_eq!(dw1000.mode(), DeviceMode::Transmitting);

        spi.done();
    }

    #[test]
    fn get_data_strips_crc() {
        let expectations = [
            read(ll::RX_FINFO, &[0x05, 0xfc, 0x00, 0x00]),
            read(ll::RX_BUFFER, &[0x41, 0x88, 0x01]),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        let mut buffer = [0; 16];
        let len = dw1000.get_data(&mut buffer).unwrap();

        assert_eq!(&buffer[..len], &[0x41, 0x88, 0x01]);

        spi.done();
    }

    #[test]
    fn get_data_needs_room() {
        let expectations = read(ll::RX_FINFO, &[0x0c, 0x00, 0x00, 0x00]);
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        let mut buffer = [0; 4];
        assert!(matches!(
            dw1000.get_data(&mut buffer),
            Err(Error::BufferTooSmall { required_len: 10 })
        ));

        spi.done();
    }

    #[test]
    fn rx_timestamp() {
        let expectations = read(ll::RX_STAMP, &[0x01, 0x02, 0x03, 0x04, 0x05]);
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        assert_eq!(dw1000.rx_timestamp().unwrap().value(), 0x05_0403_0201);

        spi.done();
    }

    #[test]
    fn wait_receive_blocks_until_decided() {
        let good = [0x00, 0x64, 0x00, 0x00, 0x00];
        let expectations = [
            write(ll::SYS_CTRL, &[0x00, 0x01, 0x00, 0x00]),
            read(ll::SYS_STATUS, &[0x00, 0x00, 0x00, 0x00, 0x00]),
            read(ll::SYS_STATUS, &good),
            read(ll::RX_FINFO, &[0x04, 0x00, 0x00, 0x00]),
            read(ll::RX_BUFFER, &[0xab, 0xcd]),
            read(ll::SYS_STATUS, &good),
            write(ll::SYS_STATUS, &[0x00, 0xe4, 0x05, 0x00, 0x00]),
            write(ll::SYS_CTRL, &[0x40, 0x00, 0x00, 0x00]),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.new_receive().unwrap();
        dw1000.start_receive().unwrap();

        let mut buffer = [0; 8];
        assert!(matches!(
            dw1000.wait_receive(&mut buffer),
            Err(nb::Error::WouldBlock)
        ));
        assert_eq!(dw1000.wait_receive(&mut buffer).unwrap(), 2);
        assert_eq!(&buffer[..2], &[0xab, 0xcd]);
        assert_eq!(dw1000.mode(), DeviceMode::Idle);

        spi.done();
    }

    #[test]
    fn wait_receive_reports_fcs_error() {
        let bad = [0x00, 0xa0, 0x00, 0x00, 0x00];
        let expectations = [
            read(ll::SYS_STATUS, &bad),
            read(ll::SYS_STATUS, &bad),
            write(ll::SYS_STATUS, &[0x00, 0xe4, 0x05, 0x00, 0x00]),
            write(ll::SYS_CTRL, &[0x40, 0x00, 0x00, 0x00]),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.new_receive().unwrap();

        let mut buffer = [0; 8];
        assert!(matches!(
            dw1000.wait_receive(&mut buffer),
            Err(nb::Error::Other(Error::Fcs))
        ));
        assert_eq!(dw1000.mode(), DeviceMode::Idle);

        spi.done();
    }
}
