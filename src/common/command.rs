// src/common/command.rs

//! TF-Mini S command definitions.
//!
//! Every command is sent as `5A len code [payload] checksum`; see
//! [`crate::common::frame`] for the byte layout.

use arrayvec::ArrayVec;
use core::fmt::{self, Debug};

use super::{
    error::TfError,
    frame::{self, CommandFrame, MEASUREMENT_FRAME_LEN, STATUS_RESPONSE_LEN, VERSION_RESPONSE_LEN},
};

/// Command codes understood by the sensor.
pub mod code {
    pub const SOFTWARE_VERSION: u8 = 0x01;
    pub const SYSTEM_RESET: u8 = 0x02;
    pub const FRAME_RATE: u8 = 0x03;
    pub const TRIGGER_MEASUREMENT: u8 = 0x04;
    pub const SAVE_SETTINGS: u8 = 0x11;
}

/// Largest payload any [`Command`] carries.
pub const MAX_COMMAND_PAYLOAD: usize = 2;

/// What the sensor sends back after a command.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExpectedResponse {
    /// A command response of exactly this many bytes, header included.
    Command(usize),
    /// A regular 9-byte measurement frame.
    Measurement,
}

impl ExpectedResponse {
    pub const fn frame_len(&self) -> usize {
        match self {
            ExpectedResponse::Command(len) => *len,
            ExpectedResponse::Measurement => MEASUREMENT_FRAME_LEN,
        }
    }
}

/// A command the driver can issue.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Query firmware version (`5A 04 01 5F`).
    SoftwareVersion,
    /// Reboot the sensor (`5A 04 02 60`).
    SystemReset,
    /// Set the automatic output rate in Hz; 0 switches to trigger mode.
    FrameRate(u16),
    /// Request one measurement frame (`5A 04 04 62`).
    TriggerMeasurement,
    /// Persist the current settings (`5A 04 11 6F`).
    SaveSettings,
}

impl Command {
    pub const fn code(&self) -> u8 {
        match self {
            Command::SoftwareVersion => code::SOFTWARE_VERSION,
            Command::SystemReset => code::SYSTEM_RESET,
            Command::FrameRate(_) => code::FRAME_RATE,
            Command::TriggerMeasurement => code::TRIGGER_MEASUREMENT,
            Command::SaveSettings => code::SAVE_SETTINGS,
        }
    }

    /// Payload bytes, little-endian for multi-byte values.
    pub fn payload(&self) -> ArrayVec<u8, MAX_COMMAND_PAYLOAD> {
        let mut payload = ArrayVec::new();
        if let Command::FrameRate(hz) = self {
            payload.extend(hz.to_le_bytes());
        }
        payload
    }

    /// Full length of the encoded frame.
    pub fn frame_len(&self) -> usize {
        frame::COMMAND_OVERHEAD + self.payload().len()
    }

    /// The response shape the sensor answers this command with.
    pub fn expected_response(&self) -> ExpectedResponse {
        match self {
            Command::SoftwareVersion => ExpectedResponse::Command(VERSION_RESPONSE_LEN),
            Command::SystemReset | Command::SaveSettings => {
                ExpectedResponse::Command(STATUS_RESPONSE_LEN)
            }
            // The sensor echoes the command back as acknowledgement.
            Command::FrameRate(_) => ExpectedResponse::Command(self.frame_len()),
            Command::TriggerMeasurement => ExpectedResponse::Measurement,
        }
    }

    /// The leading part of `buf` that this command's response fills.
    ///
    /// Fails with `TfError::BufferOverflow` when `buf` is too short.
    pub fn response_slice<'a, E: Debug>(
        &self,
        buf: &'a mut [u8],
    ) -> Result<&'a mut [u8], TfError<E>> {
        let needed = self.expected_response().frame_len();
        let got = buf.len();
        buf.get_mut(..needed).ok_or(TfError::BufferOverflow { needed, got })
    }

    /// Encodes the command with its checksum.
    pub fn encode<E: Debug>(&self) -> Result<CommandFrame, TfError<E>> {
        frame::encode_command(self.code(), &self.payload())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SoftwareVersion => f.write_str("software version"),
            Command::SystemReset => f.write_str("system reset"),
            Command::FrameRate(hz) => write!(f, "frame rate {} Hz", hz),
            Command::TriggerMeasurement => f.write_str("trigger measurement"),
            Command::SaveSettings => f.write_str("save settings"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use heapless::String as HeaplessString;

    #[test]
    fn test_fixed_frames() {
        let encode = |command: Command| command.encode::<()>().unwrap();
        assert_eq!(encode(Command::SoftwareVersion).as_slice(), &[0x5A, 0x04, 0x01, 0x5F]);
        assert_eq!(encode(Command::SystemReset).as_slice(), &[0x5A, 0x04, 0x02, 0x60]);
        assert_eq!(encode(Command::TriggerMeasurement).as_slice(), &[0x5A, 0x04, 0x04, 0x62]);
        assert_eq!(encode(Command::SaveSettings).as_slice(), &[0x5A, 0x04, 0x11, 0x6F]);
    }

    #[test]
    fn test_frame_rate_payload_is_little_endian() {
        assert_eq!(
            Command::FrameRate(4).encode::<()>().unwrap().as_slice(),
            &[0x5A, 0x06, 0x03, 0x04, 0x00, 0x67]
        );
        assert_eq!(
            Command::FrameRate(1000).encode::<()>().unwrap().as_slice(),
            &[0x5A, 0x06, 0x03, 0xE8, 0x03, 0x4E]
        );
        assert_eq!(Command::FrameRate(0).payload().as_slice(), &[0x00, 0x00]);
    }

    #[test]
    fn test_expected_responses() {
        assert_eq!(Command::SoftwareVersion.expected_response(), ExpectedResponse::Command(7));
        assert_eq!(Command::SystemReset.expected_response(), ExpectedResponse::Command(5));
        assert_eq!(Command::SaveSettings.expected_response(), ExpectedResponse::Command(5));
        assert_eq!(Command::FrameRate(100).expected_response(), ExpectedResponse::Command(6));
        assert_eq!(Command::TriggerMeasurement.expected_response().frame_len(), 9);
    }

    #[test]
    fn test_response_slice_sized_by_command() {
        let mut buf = [0u8; frame::MAX_COMMAND_FRAME_LEN];
        assert_eq!(Command::SoftwareVersion.response_slice::<()>(&mut buf).unwrap().len(), 7);
        assert_eq!(Command::SaveSettings.response_slice::<()>(&mut buf).unwrap().len(), 5);
        assert_eq!(Command::FrameRate(10).response_slice::<()>(&mut buf).unwrap().len(), 6);

        let mut short = [0u8; 4];
        assert_eq!(
            Command::SystemReset.response_slice::<()>(&mut short),
            Err(TfError::BufferOverflow { needed: 5, got: 4 })
        );
    }

    #[test]
    fn test_display() {
        let mut output = HeaplessString::<32>::new();
        write!(output, "{}", Command::FrameRate(250)).unwrap();
        assert_eq!(output.as_str(), "frame rate 250 Hz");
    }
}
