use super::{DeviceMode, Error, DW1000, EXTENDED_FRAME_MAX, STANDARD_FRAME_MAX};
use crate::{ll, maybe_async_attr, spi_type};

/// Length of the CRC the DW1000 appends to each frame
const CRC_LEN: usize = 2;

impl<SPI> DW1000<SPI>
where
    SPI: spi_type::spi::SpiDevice<u8>,
{
    /// Prepare a new transmission
    ///
    /// Allowed in any mode. Resets the SYS_CTRL and TX_FCTRL shadows and the
    /// frame check suppression, so rate, PRF and preamble have to be set
    /// again. Nothing is written to the chip until
    /// [`DW1000::start_transmit`].
    pub fn new_transmit(&mut self) {
        self.sys_ctrl.clear();
        self.tx_fctrl.clear();
        self.frame_check_suppressed = false;
        self.enter(DeviceMode::Transmitting);
    }

    /// Load the frame payload into the transmit buffer
    ///
    /// Unless [`DW1000::suppress_frame_check`] was called, the DW1000 appends
    /// a 2 byte CRC, which counts towards the frame length. Frames longer
    /// than 127 bytes need the extended PHY header, see
    /// [`DW1000::set_transmit_frame_length`]. Nothing is written if the frame
    /// doesn't fit.
    #[maybe_async_attr]
    pub async fn set_data(&mut self, payload: &[u8]) -> Result<(), Error<SPI>> {
        self.require(DeviceMode::Transmitting)?;

        let len = if self.frame_check_suppressed {
            payload.len()
        } else {
            payload.len() + CRC_LEN
        };

        let max = if self.extended_frame_length {
            EXTENDED_FRAME_MAX
        } else {
            STANDARD_FRAME_MAX
        };
        if len > ll::TX_BUFFER_LEN || len > max {
            return Err(Error::FrameTooLarge { len, max });
        }

        self.ll.write(ll::TX_BUFFER, payload).await?;

        self.tx_fctrl
            .set_byte(ll::tx_fctrl::LEN_BYTE, (len & 0xff) as u8)?;
        let rate_byte = self.tx_fctrl.byte(ll::tx_fctrl::RATE_BYTE)?;
        self.tx_fctrl.set_byte(
            ll::tx_fctrl::RATE_BYTE,
            (rate_byte & !ll::tx_fctrl::LEN_EXT_MASK)
                | ((len >> 8) as u8 & ll::tx_fctrl::LEN_EXT_MASK),
        )?;

        Ok(())
    }

    /// Send the frame
    ///
    /// Writes TX_FCTRL, then SYS_CTRL with TXSTRT set. The driver is idle
    /// again as soon as this returns; use [`DW1000::wait_transmit`] or
    /// [`DW1000::is_transmit_done`] to learn when the frame is out.
    #[maybe_async_attr]
    pub async fn start_transmit(&mut self) -> Result<(), Error<SPI>> {
        self.require(DeviceMode::Transmitting)?;

        self.sys_ctrl.set_bit(ll::sys_ctrl::TXSTRT, true)?;
        self.flush_tx_fctrl().await?;
        self.flush_sys_ctrl().await?;

        self.enter(DeviceMode::Idle);

        Ok(())
    }

    /// Abandon the transmission and turn the transceiver off
    #[maybe_async_attr]
    pub async fn cancel_transmit(&mut self) -> Result<(), Error<SPI>> {
        self.require(DeviceMode::Transmitting)?;

        self.new_transmit();
        self.idle().await
    }

    /// Wait for the transmission to finish
    ///
    /// This method returns an `nb::Result` to indicate whether the transmission
    /// has finished, or whether it is still ongoing. You can use this to busily
    /// wait for the transmission to finish, for example using `nb`'s `block!`
    /// macro. The transmit done event is acknowledged once it has been seen.
    #[maybe_async_attr]
    pub async fn wait_transmit(&mut self) -> nb::Result<(), Error<SPI>> {
        let status = self.status().await.map_err(nb::Error::Other)?;

        if !status.transmit_done() {
            return Err(nb::Error::WouldBlock);
        }

        self.clear_transmit_status().await.map_err(nb::Error::Other)?;

        Ok(())
    }
}

#[cfg(all(test, not(feature = "async")))]
mod test {
    use super::*;

    use embedded_hal_mock::eh1::spi::Mock as SpiMock;

    use crate::{
        block,
        configs::{BitRate, PreambleLength, PulseRepetitionFrequency},
        hl::test_bus::{read, write},
    };

    #[test]
    fn payload_plus_crc_must_fit_standard_frame() {
        let payload = [0x5a; 126];
        let expectations = write(ll::TX_BUFFER, &payload);
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.new_transmit();
        assert!(matches!(
            dw1000.set_data(&payload),
            Err(Error::FrameTooLarge { len: 128, max: 127 })
        ));

        dw1000.suppress_frame_check().unwrap();
        dw1000.set_data(&payload).unwrap();
        assert_eq!(dw1000.transmit_frame_control().byte(0), Ok(126));

        spi.done();
    }

    #[test]
    fn largest_standard_frame_fits() {
        let payload = [0x5a; 125];
        let expectations = write(ll::TX_BUFFER, &payload);
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.new_transmit();
        dw1000.set_data(&payload).unwrap();
        assert_eq!(dw1000.transmit_frame_control().byte(0), Ok(127));

        spi.done();
    }

    #[test]
    fn extended_frame_limit() {
        let largest = [0x33; 1021];
        let expectations = [
            write(ll::SYS_CFG, &[0x00, 0x00, 0x03, 0x00]),
            write(ll::TX_FCTRL, &[0xff, 0x03, 0x00, 0x00, 0x00]),
            write(ll::TX_BUFFER, &largest),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.new_transmit();
        dw1000.set_transmit_frame_length(1023).unwrap();

        dw1000.set_data(&largest).unwrap();
        assert_eq!(
            dw1000.transmit_frame_control().as_bytes(),
            &[0xff, 0x03, 0x00, 0x00, 0x00]
        );

        // Payload plus CRC is one byte too many
        assert!(matches!(
            dw1000.set_data(&[0x33; 1022]),
            Err(Error::FrameTooLarge {
                len: 1024,
                max: 1023
            })
        ));

        // Larger than the transmit buffer itself
        dw1000.suppress_frame_check().unwrap();
        assert!(matches!(
            dw1000.set_data(&[0x33; 1025]),
            Err(Error::FrameTooLarge {
                len: 1025,
                max: 1023
            })
        ));

        assert_eq!(
            dw1000.transmit_frame_control().as_bytes(),
            &[0xff, 0x03, 0x00, 0x00, 0x00]
        );

        spi.done();
    }

    #[test]
    fn extended_frames_carry_length_extension() {
        let payload = [0x11; 300];
        let expectations = [
            write(ll::SYS_CFG, &[0x00, 0x00, 0x03, 0x00]),
            write(ll::TX_FCTRL, &[0x2e, 0x01, 0x00, 0x00, 0x00]),
            write(ll::TX_BUFFER, &payload),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.new_transmit();
        dw1000.set_transmit_frame_length(302).unwrap();
        dw1000.set_bit_rate(BitRate::Kbps850).unwrap();
        dw1000.set_data(&payload).unwrap();

        assert_eq!(
            dw1000.transmit_frame_control().as_bytes(),
            &[0x2e, 0x21, 0x00, 0x00, 0x00]
        );

        spi.done();
    }

    #[test]
    fn set_data_requires_transmit_mode() {
        let mut spi = SpiMock::<u8>::new(&[]);

        let mut dw1000 = DW1000::new(spi.clone());
        assert!(matches!(
            dw1000.set_data(&[1, 2, 3]),
            Err(Error::InvalidModeForOperation {
                mode: DeviceMode::Idle
            })
        ));

        spi.done();
    }

    #[test]
    fn transmit_session_ends_idle() {
        let payload = [0x41, 0x88, 0x00];
        let expectations = [
            write(ll::TX_BUFFER, &payload),
            write(ll::TX_FCTRL, &[0x05, 0x40, 0x0a, 0x00, 0x00]),
            write(ll::SYS_CTRL, &[0x02, 0x00, 0x00, 0x00]),
            read(ll::SYS_STATUS, &[0x00, 0x00, 0x00, 0x00, 0x00]),
            read(ll::SYS_STATUS, &[0xf0, 0x00, 0x00, 0x00, 0x00]),
            read(ll::SYS_STATUS, &[0xf0, 0x00, 0x00, 0x00, 0x00]),
            write(ll::SYS_STATUS, &[0xf0, 0x00, 0x00, 0x00, 0x00]),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.new_transmit();
        dw1000.set_bit_rate(BitRate::Kbps6800).unwrap();
        dw1000.set_prf(PulseRepetitionFrequency::Mhz64).unwrap();
        dw1000.set_preamble(PreambleLength::Symbols1024).unwrap();
        dw1000.set_data(&payload).unwrap();
        dw1000.start_transmit().unwrap();

        assert_eq!(dw1000.mode(), DeviceMode::Idle);

        block!(dw1000.wait_transmit()).unwrap();

        spi.done();
    }

    #[test]
    fn cancel_transmit_resets_shadows() {
        let expectations = [
            write(ll::TX_BUFFER, &[0x01]),
            write(ll::SYS_CTRL, &[0x40, 0x00, 0x00, 0x00]),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.new_transmit();
        dw1000.set_transmit_rate(1).unwrap();
        dw1000.wait_for_response(true).unwrap();
        dw1000.set_data(&[0x01]).unwrap();
        dw1000.cancel_transmit().unwrap();

        assert_eq!(dw1000.mode(), DeviceMode::Idle);
        assert_eq!(dw1000.system_control().as_bytes(), &[0x40, 0x00, 0x00, 0x00]);
        assert_eq!(dw1000.transmit_frame_control().as_bytes(), &[0; 5]);

        assert!(matches!(
            dw1000.cancel_transmit(),
            Err(Error::InvalidModeForOperation {
                mode: DeviceMode::Idle
            })
        ));

        spi.done();
    }
}
