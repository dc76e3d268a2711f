// src/driver/async_driver.rs

//! Async driver, built on [`TfSerialAsync`] and `embedded-hal-async` delays.
//!
//! Same operations and the same error mapping as the blocking
//! [`TfMiniS`](crate::driver::TfMiniS). Bounded waits race each read
//! against the delay provider instead of polling.

use crate::common::{
    command::Command,
    config::{duration_to_us, ChecksumPolicy, Config},
    error::TfError,
    frame::{
        self, CommandFrame, HeaderKind, HeaderScanner, ScanState, StatusCodes,
        MAX_COMMAND_FRAME_LEN, MEASUREMENT_FRAME_LEN, RESET_STATUS, SAVE_STATUS,
    },
    hal_traits::TfSerialAsync,
    types::{Measurement, SoftwareVersion},
};
use embassy_futures::select::{select, Either};
use embedded_hal_async::delay::DelayNs;
use log::{debug, trace, warn};

#[derive(Debug)]
pub struct TfMiniSAsync<S, D>
where
    S: TfSerialAsync,
    D: DelayNs,
{
    serial: S,
    delay: D,
    config: Config,
}

impl<S, D> TfMiniSAsync<S, D>
where
    S: TfSerialAsync,
    D: DelayNs,
{
    pub fn new(serial: S, delay: D) -> Self {
        Self::with_config(serial, delay, Config::default())
    }

    pub fn with_config(serial: S, delay: D, config: Config) -> Self {
        TfMiniSAsync { serial, delay, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn release(self) -> (S, D) {
        (self.serial, self.delay)
    }

    // --- I/O ---

    async fn read_byte_within(&mut self, limit_us: Option<u32>) -> Result<u8, TfError<S::Error>> {
        let Some(limit_us) = limit_us else {
            return self.serial.read_byte().await.map_err(TfError::Io);
        };
        match select(self.serial.read_byte(), self.delay.delay_us(limit_us)).await {
            Either::First(result) => result.map_err(TfError::Io),
            Either::Second(()) => Err(TfError::Timeout),
        }
    }

    async fn send_command(&mut self, command: &Command) -> Result<CommandFrame, TfError<S::Error>> {
        let frame = command.encode()?;
        trace!("Sending {}", command);
        trace!("TX {:02X?}", frame.as_slice());
        self.serial.write_all(&frame).await.map_err(TfError::Io)?;
        self.serial.flush().await.map_err(TfError::Io)?;
        Ok(frame)
    }

    async fn synchronize(&mut self, kind: HeaderKind) -> Result<(), TfError<S::Error>> {
        let mut scanner = HeaderScanner::new(kind, self.config.header_budget);
        let limit_us = match kind {
            HeaderKind::Measurement => self.config.header_timeout_us(),
            HeaderKind::CommandResponse => self.config.byte_timeout_us(),
        };
        loop {
            match scanner.state() {
                ScanState::Synchronized => return Ok(()),
                ScanState::Exhausted => {
                    warn!("No {:?} header within {} bytes", scanner.kind(), scanner.consumed());
                    return Err(TfError::Timeout);
                }
                ScanState::Searching => {
                    let byte = self.read_byte_within(limit_us).await?;
                    scanner.feed(byte);
                }
            }
        }
    }

    async fn read_tail(&mut self, buf: &mut [u8]) -> Result<(), TfError<S::Error>> {
        let limit_us = self.config.byte_timeout_us();
        for slot in buf.iter_mut() {
            *slot = match self.read_byte_within(limit_us).await {
                Ok(byte) => byte,
                Err(TfError::Timeout) => {
                    warn!("Frame truncated");
                    return Err(TfError::MalformedFrame);
                }
                Err(e) => return Err(e),
            };
        }
        Ok(())
    }

    async fn read_raw_command_frame(&mut self, buf: &mut [u8]) -> Result<(), TfError<S::Error>> {
        if buf.len() < 2 {
            return Err(TfError::BufferOverflow { needed: 2, got: buf.len() });
        }
        self.synchronize(HeaderKind::CommandResponse).await?;
        buf[0] = frame::COMMAND_HEADER;
        self.read_tail(&mut buf[1..]).await?;
        trace!("RX {:02X?}", buf);
        Ok(())
    }

    async fn read_command_frame(&mut self, buf: &mut [u8]) -> Result<(), TfError<S::Error>> {
        self.read_raw_command_frame(buf).await?;
        frame::check_command_response(buf).map_err(|e| {
            warn!("Unable to verify checksum: {}", e);
            e
        })
    }

    // --- Public Async Methods ---

    pub async fn set_frame_rate(&mut self, hz: u16) -> Result<(), TfError<S::Error>> {
        let command = Command::FrameRate(hz);
        let sent = self.send_command(&command).await?;

        let mut buf = [0u8; MAX_COMMAND_FRAME_LEN];
        let response = command.response_slice(&mut buf)?;
        self.read_command_frame(response).await?;

        if *response != *sent.as_slice() {
            warn!("Frame rate echo mismatch: sent {:02X?}, got {:02X?}", sent.as_slice(), response);
            return Err(TfError::UnexpectedResponse);
        }
        debug!("Frame rate set to {} Hz", hz);
        Ok(())
    }

    pub async fn trigger_measurement(&mut self) -> Result<Measurement, TfError<S::Error>> {
        self.send_command(&Command::TriggerMeasurement).await?;
        self.get_measurement().await
    }

    pub async fn get_measurement(&mut self) -> Result<Measurement, TfError<S::Error>> {
        let mut frame = [0u8; MEASUREMENT_FRAME_LEN];
        self.synchronize(HeaderKind::Measurement).await?;
        frame[..2].copy_from_slice(HeaderKind::Measurement.header());
        self.read_tail(&mut frame[2..]).await?;
        trace!("RX {:02X?}", frame);

        if self.config.measurement_checksum == ChecksumPolicy::Verify {
            frame::verify_measurement_checksum(&frame).map_err(|e| {
                warn!("Measurement frame rejected: {}", e);
                e
            })?;
        }
        frame::decode_measurement_frame(&frame)
    }

    pub async fn get_software_version(&mut self) -> Result<SoftwareVersion, TfError<S::Error>> {
        let command = Command::SoftwareVersion;
        self.send_command(&command).await?;
        let mut buf = [0u8; MAX_COMMAND_FRAME_LEN];
        let response = command.response_slice(&mut buf)?;
        self.read_command_frame(response).await?;
        let version = frame::decode_software_version(response)?;
        debug!("Firmware version {}", version);
        Ok(version)
    }

    pub async fn system_reset(&mut self) -> Result<(), TfError<S::Error>> {
        let result = self.status_exchange(Command::SystemReset, &RESET_STATUS).await;
        self.delay.delay_us(duration_to_us(self.config.reset_settle)).await;
        result
    }

    pub async fn save_settings(&mut self) -> Result<(), TfError<S::Error>> {
        self.status_exchange(Command::SaveSettings, &SAVE_STATUS).await
    }

    async fn status_exchange(
        &mut self,
        command: Command,
        codes: &StatusCodes,
    ) -> Result<(), TfError<S::Error>> {
        self.send_command(&command).await?;
        let mut buf = [0u8; MAX_COMMAND_FRAME_LEN];
        let response = command.response_slice(&mut buf)?;
        self.read_raw_command_frame(response).await?;

        let status = frame::decode_status(response, codes);
        match &status {
            Ok(()) => debug!("{} succeeded", command),
            Err(TfError::DeviceRejected) => warn!("{} failed on the device", command),
            Err(e) => {
                warn!("{} returned an unrecognized response {:02X?}: {}", command, response, e)
            }
        }
        status
    }
}
