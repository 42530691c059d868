use super::{DeviceMode, Error, DW1000};
use crate::{
    bits::RegisterImage,
    configs::{
        BitRate, DefaultMode, PacSize, PreambleLength, PulseRepetitionFrequency, RxTuning,
        UwbChannel,
    },
    ll, maybe_async_attr, spi_type,
};

/// Longest frame in the standard PHY header mode
pub const STANDARD_FRAME_MAX: usize = 127;

/// Longest frame in the extended PHY header mode
pub const EXTENDED_FRAME_MAX: usize = 1023;

impl<SPI> DW1000<SPI>
where
    SPI: spi_type::spi::SpiDevice<u8>,
{
    /// Enable or disable frame filtering
    #[maybe_async_attr]
    pub async fn set_frame_filter(&mut self, enable: bool) -> Result<(), Error<SPI>> {
        self.sys_cfg.set_bit(ll::sys_cfg::FFEN, enable)?;
        self.flush_sys_cfg().await
    }

    /// Enable or disable the double receive buffer
    ///
    /// The hardware bit is "disable double buffer", so it holds the inverse.
    #[maybe_async_attr]
    pub async fn set_double_buffering(&mut self, enable: bool) -> Result<(), Error<SPI>> {
        self.sys_cfg.set_bit(ll::sys_cfg::DIS_DRXB, !enable)?;
        self.flush_sys_cfg().await
    }

    /// Let the receiver re-enable itself after a failed reception
    #[maybe_async_attr]
    pub async fn set_receiver_auto_reenable(&mut self, enable: bool) -> Result<(), Error<SPI>> {
        self.sys_cfg.set_bit(ll::sys_cfg::RXAUTR, enable)?;
        self.flush_sys_cfg().await
    }

    /// Turn the receiver on right after the next transmission
    ///
    /// Shadow only, committed by [`DW1000::start_transmit`].
    pub fn wait_for_response(&mut self, enable: bool) -> Result<(), Error<SPI>> {
        self.sys_ctrl.set_bit(ll::sys_ctrl::WAIT4RESP, enable)?;
        Ok(())
    }

    /// Set the transmit data rate from a raw TXBR value
    ///
    /// The value is merged into TX_FCTRL, so the field must be clear, as it
    /// is after [`DW1000::new_transmit`]. `3` and anything that doesn't fit
    /// into two bits select 6.8 Mbps. Shadow only, committed by
    /// [`DW1000::start_transmit`].
    pub fn set_transmit_rate(&mut self, rate: u8) -> Result<(), Error<SPI>> {
        self.set_bit_rate(BitRate::from_bits(rate))
    }

    /// Set the transmit data rate
    pub fn set_bit_rate(&mut self, bitrate: BitRate) -> Result<(), Error<SPI>> {
        self.tx_fctrl.merge_byte(
            ll::tx_fctrl::RATE_BYTE,
            (bitrate as u8) << ll::tx_fctrl::RATE_SHIFT,
        )?;
        Ok(())
    }

    /// Set the transmit PRF from a raw TXPRF value
    ///
    /// `0`, `3` and anything that doesn't fit into two bits select 64 MHz.
    /// Merged like [`DW1000::set_transmit_rate`].
    pub fn set_pulse_frequency(&mut self, frequency: u8) -> Result<(), Error<SPI>> {
        self.set_prf(PulseRepetitionFrequency::from_bits(frequency))
    }

    /// Set the transmit PRF
    pub fn set_prf(&mut self, prf: PulseRepetitionFrequency) -> Result<(), Error<SPI>> {
        self.tx_fctrl
            .merge_byte(ll::tx_fctrl::PREAMBLE_BYTE, prf as u8)?;
        Ok(())
    }

    /// Set the preamble length from a raw 4-bit TXPSR/PE code
    ///
    /// Only the low 4 bits of `code` are used. Merged like
    /// [`DW1000::set_transmit_rate`].
    pub fn set_preamble_length(&mut self, code: u8) -> Result<(), Error<SPI>> {
        self.tx_fctrl.merge_byte(
            ll::tx_fctrl::PREAMBLE_BYTE,
            (code & 0x0f) << ll::tx_fctrl::PREAMBLE_SHIFT,
        )?;
        Ok(())
    }

    /// Set the preamble length
    pub fn set_preamble(&mut self, preamble: PreambleLength) -> Result<(), Error<SPI>> {
        self.set_preamble_length(preamble as u8)
    }

    /// Select the PHY header mode and frame length for the next frames
    ///
    /// Lengths up to 127 bytes use the standard PHY header, longer ones the
    /// extended one. Writes SYS_CFG, then TX_FCTRL.
    #[maybe_async_attr]
    pub async fn set_transmit_frame_length(&mut self, len: u16) -> Result<(), Error<SPI>> {
        if usize::from(len) > EXTENDED_FRAME_MAX {
            return Err(Error::FrameTooLarge {
                len: usize::from(len),
                max: EXTENDED_FRAME_MAX,
            });
        }

        let extended = usize::from(len) > STANDARD_FRAME_MAX;
        self.sys_cfg.set_bit(ll::sys_cfg::PHR_MODE_LSB, extended)?;
        self.sys_cfg.set_bit(ll::sys_cfg::PHR_MODE_MSB, extended)?;
        self.extended_frame_length = extended;
        self.flush_sys_cfg().await?;

        self.tx_fctrl
            .set_byte(ll::tx_fctrl::LEN_BYTE, (len & 0xff) as u8)?;
        let rate_byte = self.tx_fctrl.byte(ll::tx_fctrl::RATE_BYTE)?;
        self.tx_fctrl.set_byte(
            ll::tx_fctrl::RATE_BYTE,
            (rate_byte & !ll::tx_fctrl::LEN_EXT_MASK)
                | ((len >> 8) as u8 & ll::tx_fctrl::LEN_EXT_MASK),
        )?;
        self.flush_tx_fctrl().await
    }

    /// Write the receiver tuning registers for the given settings
    ///
    /// Fails with [`Error::UnsupportedConfiguration`], without writing
    /// anything, if the calibration profile doesn't cover the combination.
    #[maybe_async_attr]
    pub async fn tune_receiver(
        &mut self,
        bitrate: BitRate,
        prf: PulseRepetitionFrequency,
        preamble_length: PreambleLength,
        pac_size: PacSize,
    ) -> Result<(), Error<SPI>> {
        self.tune_receiver_with(&RxTuning {
            bitrate,
            pulse_repetition_frequency: prf,
            preamble_length,
            pac_size,
        })
        .await
    }

    #[maybe_async_attr]
    async fn tune_receiver_with(&mut self, key: &RxTuning) -> Result<(), Error<SPI>> {
        let tuning = self
            .calibration
            .receiver(key)
            .ok_or(Error::UnsupportedConfiguration)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("DW1000 receiver tuning {}", tuning);

        self.ll
            .write(ll::DRX_TUNE0B, &tuning.drx_tune0b.to_le_bytes())
            .await?;
        self.ll
            .write(ll::DRX_TUNE1B, &tuning.drx_tune1b.to_le_bytes())
            .await?;
        self.ll
            .write(ll::DRX_TUNE1A, &tuning.drx_tune1a.to_le_bytes())
            .await?;
        self.ll
            .write(ll::DRX_TUNE2, &tuning.drx_tune2.to_le_bytes())
            .await?;
        self.ll
            .write(ll::LDE_CFG2, &tuning.lde_cfg2.to_le_bytes())
            .await?;
        self.ll
            .write(ll::DRX_TUNE4H, &tuning.drx_tune4h.to_le_bytes())
            .await?;

        Ok(())
    }

    /// Write the analog and PLL registers for `channel`
    #[maybe_async_attr]
    pub async fn set_rf_channel(&mut self, channel: UwbChannel) -> Result<(), Error<SPI>> {
        let tuning = self
            .calibration
            .channel(channel)
            .ok_or(Error::UnsupportedConfiguration)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("DW1000 channel {} tuning {}", channel, tuning);

        let rf_txctrl = tuning.rf_txctrl.to_le_bytes();

        self.ll.write(ll::RF_RXCTRLH, &[tuning.rf_rxctrlh]).await?;
        self.ll
            .write(ll::RF_TXCTRL, &rf_txctrl[..ll::RF_TXCTRL_LEN])
            .await?;
        self.ll.write(ll::TC_PGDELAY, &[tuning.tc_pgdelay]).await?;
        self.ll
            .write(ll::FS_PLLCFG, &tuning.fs_pllcfg.to_le_bytes())
            .await?;
        self.ll.write(ll::FS_PLLTUNE, &[tuning.fs_plltune]).await?;

        Ok(())
    }

    /// Same as [`DW1000::set_rf_channel`], by channel number
    ///
    /// Numbers other than 1, 2, 3, 4, 5 and 7 fail with
    /// [`Error::UnsupportedConfiguration`].
    #[maybe_async_attr]
    pub async fn set_rf_channel_number(&mut self, number: u8) -> Result<(), Error<SPI>> {
        let channel = UwbChannel::from_number(number).ok_or(Error::UnsupportedConfiguration)?;
        self.set_rf_channel(channel).await
    }

    /// The SYS_CFG shadow
    pub fn system_configuration(&self) -> &RegisterImage<{ ll::SYS_CFG_LEN }> {
        &self.sys_cfg
    }

    /// Replace the SYS_CFG shadow with what the chip currently holds
    #[maybe_async_attr]
    pub async fn load_system_configuration(&mut self) -> Result<(), Error<SPI>> {
        let bytes = self.ll.read_array::<{ ll::SYS_CFG_LEN }>(ll::SYS_CFG).await?;
        self.sys_cfg = RegisterImage::from_bytes(bytes);

        Ok(())
    }

    /// Read SYS_CFG from the chip, leaving the shadow alone
    #[maybe_async_attr]
    pub async fn read_system_configuration(
        &mut self,
    ) -> Result<RegisterImage<{ ll::SYS_CFG_LEN }>, Error<SPI>> {
        let bytes = self.ll.read_array::<{ ll::SYS_CFG_LEN }>(ll::SYS_CFG).await?;

        Ok(RegisterImage::from_bytes(bytes))
    }

    /// Apply the default transmit settings of the current session
    ///
    /// While transmitting this selects 6.8 Mbps, 64 MHz and a 1024 symbol
    /// preamble. A reception needs no defaults. Fails while idle.
    pub fn set_defaults(&mut self) -> Result<(), Error<SPI>> {
        match self.mode {
            DeviceMode::Transmitting => {
                self.set_bit_rate(BitRate::default())?;
                self.set_prf(PulseRepetitionFrequency::default())?;
                self.set_preamble(PreambleLength::default())?;
                Ok(())
            }
            DeviceMode::Receiving => Ok(()),
            DeviceMode::Idle => Err(Error::InvalidModeForOperation { mode: self.mode }),
        }
    }

    /// Configure one of the operating modes from the DW1000 datasheet
    ///
    /// Tunes the receiver, sets the frame length and puts rate, PRF and
    /// preamble into the TX_FCTRL shadow, so it is meant to be called right
    /// after [`DW1000::new_transmit`]. If the calibration profile can't tune
    /// the receiver for the mode nothing is changed.
    #[maybe_async_attr]
    pub async fn apply_default_mode(&mut self, mode: DefaultMode) -> Result<(), Error<SPI>> {
        let settings = mode.settings();

        if self.calibration.receiver(&settings.rx).is_none() {
            return Err(Error::UnsupportedConfiguration);
        }

        self.tune_receiver_with(&settings.rx).await?;
        self.set_transmit_frame_length(settings.frame_length).await?;
        self.set_bit_rate(settings.bitrate)?;
        self.set_prf(settings.pulse_repetition_frequency)?;
        self.set_preamble(settings.preamble_length)?;

        Ok(())
    }
}

#[cfg(all(test, not(feature = "async")))]
mod test {
    use super::*;

    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    use crate::hl::test_bus::{read, write};

    #[test]
    fn sys_cfg_flags_flush_immediately() {
        let expectations = [
            write(ll::SYS_CFG, &[0x01, 0x00, 0x00, 0x00]),
            write(ll::SYS_CFG, &[0x01, 0x10, 0x00, 0x00]),
            write(ll::SYS_CFG, &[0x01, 0x10, 0x00, 0x20]),
            write(ll::SYS_CFG, &[0x01, 0x00, 0x00, 0x20]),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.set_frame_filter(true).unwrap();
        dw1000.set_double_buffering(false).unwrap();
        dw1000.set_receiver_auto_reenable(true).unwrap();
        dw1000.set_double_buffering(true).unwrap();

        spi.done();
    }

    #[test]
    fn reserved_rate_equals_6m8() {
        let mut spi = SpiMock::<u8>::new(&[]);

        let mut raw = DW1000::new(spi.clone());
        raw.set_transmit_rate(3).unwrap();
        let mut typed = DW1000::new(spi.clone());
        typed.set_bit_rate(BitRate::Kbps6800).unwrap();

        assert_eq!(raw.transmit_frame_control(), typed.transmit_frame_control());
        assert_eq!(raw.transmit_frame_control().byte(1), Ok(0x40));

        spi.done();
    }

    #[test]
    fn prf_and_preamble_share_a_byte() {
        let mut spi = SpiMock::<u8>::new(&[]);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.set_pulse_frequency(0).unwrap();
        dw1000.set_preamble_length(0xf2).unwrap();

        // 64 MHz in bits 0-1, 1024 symbols (0b0010) in bits 2-5
        assert_eq!(dw1000.transmit_frame_control().byte(2), Ok(0x0a));

        spi.done();
    }

    #[test]
    fn long_frames_switch_to_extended_phy_header() {
        let expectations = [
            write(ll::SYS_CFG, &[0x00, 0x00, 0x03, 0x00]),
            write(ll::TX_FCTRL, &[0xf4, 0x01, 0x00, 0x00, 0x00]),
            write(ll::SYS_CFG, &[0x00, 0x00, 0x00, 0x00]),
            write(ll::TX_FCTRL, &[0x0c, 0x00, 0x00, 0x00, 0x00]),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.set_transmit_frame_length(500).unwrap();
        dw1000.set_transmit_frame_length(12).unwrap();

        spi.done();
    }

    #[test]
    fn frame_length_above_1023_is_rejected() {
        let mut spi = SpiMock::<u8>::new(&[]);

        let mut dw1000 = DW1000::new(spi.clone());
        let result = dw1000.set_transmit_frame_length(1024);

        assert!(matches!(
            result,
            Err(Error::FrameTooLarge {
                len: 1024,
                max: 1023
            })
        ));

        spi.done();
    }

    #[test]
    fn tune_receiver_writes_in_order() {
        let expectations = [
            write(ll::DRX_TUNE0B, &[0x0a, 0x00]),
            write(ll::DRX_TUNE1B, &[0x64, 0x00]),
            write(ll::DRX_TUNE1A, &[0x87, 0x00]),
            write(ll::DRX_TUNE2, &[0x9a, 0x00, 0x1a, 0x35]),
            write(ll::LDE_CFG2, &[0x07, 0x16]),
            write(ll::DRX_TUNE4H, &[0x28, 0x00]),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000
            .tune_receiver(
                BitRate::Kbps110,
                PulseRepetitionFrequency::Mhz16,
                PreambleLength::Symbols1024,
                PacSize::Symbols32,
            )
            .unwrap();

        spi.done();
    }

    #[test]
    fn unsupported_tuning_writes_nothing() {
        let mut spi = SpiMock::<u8>::new(&[]);

        let mut dw1000 = DW1000::new(spi.clone());
        let result = dw1000.tune_receiver(
            BitRate::Kbps6800,
            PulseRepetitionFrequency::Mhz64,
            PreambleLength::Symbols128,
            PacSize::Symbols8,
        );
        assert!(matches!(result, Err(Error::UnsupportedConfiguration)));

        dw1000.new_transmit();
        let result = dw1000.apply_default_mode(DefaultMode::Mode2);
        assert!(matches!(result, Err(Error::UnsupportedConfiguration)));
        assert_eq!(dw1000.transmit_frame_control().as_bytes(), &[0; 5]);

        spi.done();
    }

    #[test]
    fn channel_5() {
        let expectations = [
            write(ll::RF_RXCTRLH, &[0xd8]),
            write(ll::RF_TXCTRL, &[0xe0, 0x3f, 0x1e]),
            write(ll::TC_PGDELAY, &[0xc0]),
            write(ll::FS_PLLCFG, &[0x1d, 0x04, 0x00, 0x08]),
            write(ll::FS_PLLTUNE, &[0xa6]),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.set_rf_channel_number(5).unwrap();

        assert!(matches!(
            dw1000.set_rf_channel_number(6),
            Err(Error::UnsupportedConfiguration)
        ));

        spi.done();
    }

    #[test]
    fn load_and_read_system_configuration() {
        let expectations = [
            read(ll::SYS_CFG, &[0x00, 0x12, 0x00, 0x20]),
            read(ll::SYS_CFG, &[0x01, 0x00, 0x00, 0x00]),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.load_system_configuration().unwrap();
        let fresh = dw1000.read_system_configuration().unwrap();

        assert_eq!(dw1000.system_configuration().as_bytes(), &[0x00, 0x12, 0x00, 0x20]);
        assert_eq!(fresh.as_bytes(), &[0x01, 0x00, 0x00, 0x00]);

        spi.done();
    }

    #[test]
    fn defaults_depend_on_mode() {
        let mut spi = SpiMock::<u8>::new(&[]);

        let mut dw1000 = DW1000::new(spi.clone());
        assert!(matches!(
            dw1000.set_defaults(),
            Err(Error::InvalidModeForOperation {
                mode: DeviceMode::Idle
            })
        ));

        dw1000.new_transmit();
        dw1000.set_defaults().unwrap();
        assert_eq!(
            dw1000.transmit_frame_control().as_bytes(),
            &[0x00, 0x40, 0x0a, 0x00, 0x00]
        );

        spi.done();
    }

    #[test]
    fn default_mode_at_110k() {
        let expectations: Vec<SpiTransaction<u8>> = [
            write(ll::DRX_TUNE0B, &[0x0a, 0x00]),
            write(ll::DRX_TUNE1B, &[0x64, 0x00]),
            write(ll::DRX_TUNE1A, &[0x8d, 0x00]),
            write(ll::DRX_TUNE2, &[0x5e, 0x01, 0x3b, 0x35]),
            write(ll::LDE_CFG2, &[0x07, 0x06]),
            write(ll::DRX_TUNE4H, &[0x28, 0x00]),
            write(ll::SYS_CFG, &[0x00, 0x00, 0x00, 0x00]),
            write(ll::TX_FCTRL, &[0x0c, 0x00, 0x00, 0x00, 0x00]),
        ]
        .concat();
        let mut spi = SpiMock::new(&expectations);

        let mut dw1000 = DW1000::new(spi.clone());
        dw1000.new_transmit();
        dw1000.apply_default_mode(DefaultMode::Mode9).unwrap();

        assert_eq!(
            dw1000.transmit_frame_control().as_bytes(),
            &[0x0c, 0x00, 0x0a, 0x00, 0x00]
        );

        spi.done();
    }
}
