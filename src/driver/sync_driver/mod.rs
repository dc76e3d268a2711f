// src/driver/sync_driver/mod.rs

mod io_helpers;
mod transaction;

use crate::common::{
    command::Command,
    config::{duration_to_us, ChecksumPolicy, Config},
    error::TfError,
    frame::{self, StatusCodes, MAX_COMMAND_FRAME_LEN, RESET_STATUS, SAVE_STATUS},
    hal_traits::TfSerial,
    types::{Measurement, SoftwareVersion},
};
use embedded_hal::delay::DelayNs;
use log::{debug, warn};

/// Blocking driver for one TF-Mini S.
///
/// Owns (or mutably borrows, via `&mut S`) the serial port and a delay
/// provider. Every operation is a complete command/response exchange and
/// takes `&mut self`, so a second command can never start while a response
/// is still being read. Nothing but the configuration is kept between calls.
#[derive(Debug)]
pub struct TfMiniS<S, D>
where
    S: TfSerial,
    D: DelayNs,
{
    serial: S,
    delay: D,
    config: Config,
}

impl<S, D> TfMiniS<S, D>
where
    S: TfSerial,
    D: DelayNs,
{
    /// Binds the driver to a port already opened at the sensor's baud rate.
    pub fn new(serial: S, delay: D) -> Self {
        Self::with_config(serial, delay, Config::default())
    }

    pub fn with_config(serial: S, delay: D, config: Config) -> Self {
        TfMiniS { serial, delay, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Gives the port and delay provider back.
    pub fn release(self) -> (S, D) {
        (self.serial, self.delay)
    }

    // --- Public Blocking Methods ---

    /// Sets the automatic output rate. 0 Hz disables automatic output so
    /// readings only come from [`Self::trigger_measurement`].
    ///
    /// The sensor acknowledges by echoing the command; any difference is
    /// `TfError::UnexpectedResponse`.
    pub fn set_frame_rate(&mut self, hz: u16) -> Result<(), TfError<S::Error>> {
        let command = Command::FrameRate(hz);
        let sent = self.send_command(&command)?;

        let mut buf = [0u8; MAX_COMMAND_FRAME_LEN];
        let response = command.response_slice(&mut buf)?;
        self.read_command_frame(response)?;

        if *response != *sent.as_slice() {
            warn!("Frame rate echo mismatch: sent {:02X?}, got {:02X?}", sent.as_slice(), response);
            return Err(TfError::UnexpectedResponse);
        }
        debug!("Frame rate set to {} Hz", hz);
        Ok(())
    }

    /// Requests a single reading and waits for it.
    pub fn trigger_measurement(&mut self) -> Result<Measurement, TfError<S::Error>> {
        self.send_command(&Command::TriggerMeasurement)?;
        self.get_measurement()
    }

    /// Reads the next measurement frame from the stream.
    ///
    /// Leading bytes are skipped until `59 59` shows up. If the header
    /// budget runs out first the result is `TfError::Timeout`; no partial
    /// reading is ever returned.
    pub fn get_measurement(&mut self) -> Result<Measurement, TfError<S::Error>> {
        let frame = self.read_measurement_frame()?;
        if self.config.measurement_checksum == ChecksumPolicy::Verify {
            frame::verify_measurement_checksum(&frame).map_err(|e| {
                warn!("Measurement frame rejected: {}", e);
                e
            })?;
        }
        frame::decode_measurement_frame(&frame)
    }

    /// Queries the firmware version.
    pub fn get_software_version(&mut self) -> Result<SoftwareVersion, TfError<S::Error>> {
        let command = Command::SoftwareVersion;
        self.send_command(&command)?;
        let mut buf = [0u8; MAX_COMMAND_FRAME_LEN];
        let response = command.response_slice(&mut buf)?;
        self.read_command_frame(response)?;
        let version = frame::decode_software_version(response)?;
        debug!("Firmware version {}", version);
        Ok(version)
    }

    /// Reboots the sensor, then waits the configured settle time whether
    /// or not the exchange succeeded.
    pub fn system_reset(&mut self) -> Result<(), TfError<S::Error>> {
        let result = self.status_exchange(Command::SystemReset, &RESET_STATUS);
        self.delay.delay_us(duration_to_us(self.config.reset_settle));
        result
    }

    /// Persists the current settings to the sensor's flash.
    pub fn save_settings(&mut self) -> Result<(), TfError<S::Error>> {
        self.status_exchange(Command::SaveSettings, &SAVE_STATUS)
    }

    fn status_exchange(
        &mut self,
        command: Command,
        codes: &StatusCodes,
    ) -> Result<(), TfError<S::Error>> {
        self.send_command(&command)?;
        let mut buf = [0u8; MAX_COMMAND_FRAME_LEN];
        let response = command.response_slice(&mut buf)?;
        self.read_raw_command_frame(response)?;

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
