// src/common/frame.rs

//! Wire format of the TF-Mini S UART protocol.
//!
//! Command frames (host to sensor) and command responses:
//! ```text
//! ┌──────┬─────┬──────┬─────────────┬──────────┐
//! │ 0x5A │ LEN │ CODE │ PAYLOAD     │ CHECKSUM │
//! └──────┴─────┴──────┴─────────────┴──────────┘
//! ```
//! `LEN` is the length of the whole frame and `CHECKSUM` the low byte of the
//! sum of every byte before it.
//!
//! Measurement frames (sensor to host), always 9 bytes:
//! ```text
//! ┌──────┬──────┬────────┬────────┬────────┬────────┬────────┬────────┬──────────┐
//! │ 0x59 │ 0x59 │ Dist_L │ Dist_H │ Str_L  │ Str_H  │ Temp_L │ Temp_H │ CHECKSUM │
//! └──────┴──────┴────────┴────────┴────────┴────────┴────────┴────────┴──────────┘
//! ```

use arrayvec::ArrayVec;
use core::fmt::Debug;

use super::{
    error::TfError,
    types::{Measurement, SoftwareVersion},
};

/// First byte of every command frame and command response.
pub const COMMAND_HEADER: u8 = 0x5A;

/// Each of the two leading bytes of a measurement frame.
pub const MEASUREMENT_HEADER: u8 = 0x59;

/// Measurement frame length, headers and checksum included.
pub const MEASUREMENT_FRAME_LEN: usize = 9;

/// Header, length, code and checksum.
pub const COMMAND_OVERHEAD: usize = 4;

/// Largest command frame this codec will build.
pub const MAX_COMMAND_FRAME_LEN: usize = 16;

/// Largest payload that fits in `MAX_COMMAND_FRAME_LEN`.
pub const MAX_PAYLOAD_LEN: usize = MAX_COMMAND_FRAME_LEN - COMMAND_OVERHEAD;

/// An encoded command frame.
pub type CommandFrame = ArrayVec<u8, MAX_COMMAND_FRAME_LEN>;

// --- Checksum ---

/// Low byte of the sum of `bytes`.
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

// --- Encoding ---

/// Builds `[0x5A][len][code][payload...][checksum]`.
///
/// # Returns
///
/// * `Ok(frame)` with the checksum appended.
/// * `Err(TfError::BufferOverflow)` if the payload is longer than `MAX_PAYLOAD_LEN`.
pub fn encode_command<E: Debug>(code: u8, payload: &[u8]) -> Result<CommandFrame, TfError<E>> {
    let frame_len = COMMAND_OVERHEAD + payload.len();
    if frame_len > MAX_COMMAND_FRAME_LEN {
        return Err(TfError::BufferOverflow { needed: frame_len, got: MAX_COMMAND_FRAME_LEN });
    }

    let mut frame = CommandFrame::new();
    frame.push(COMMAND_HEADER);
    frame.push(frame_len as u8);
    frame.push(code);
    frame
        .try_extend_from_slice(payload)
        .map_err(|_| TfError::BufferOverflow { needed: frame_len, got: MAX_COMMAND_FRAME_LEN })?;
    let sum = checksum(&frame);
    frame.push(sum);
    Ok(frame)
}

// --- Command response validation ---

/// Checks a command response against its trailing checksum.
///
/// The sum starts from the 0x5A header and covers every byte up to, but
/// not including, the last one. Frames shorter than two bytes or not
/// starting with the header never verify.
pub fn verify_command_response_checksum(frame: &[u8]) -> bool {
    check_command_response::<()>(frame).is_ok()
}

/// Typed variant of [`verify_command_response_checksum`].
pub fn check_command_response<E: Debug>(frame: &[u8]) -> Result<(), TfError<E>> {
    let (body, trailer) = split_checksum(frame)?;
    if body[0] != COMMAND_HEADER {
        return Err(TfError::MalformedFrame);
    }
    compare_checksum(body, trailer)
}

fn split_checksum<E: Debug>(frame: &[u8]) -> Result<(&[u8], u8), TfError<E>> {
    match frame.split_last() {
        Some((trailer, body)) if !body.is_empty() => Ok((body, *trailer)),
        _ => Err(TfError::MalformedFrame),
    }
}

fn compare_checksum<E: Debug>(body: &[u8], expected: u8) -> Result<(), TfError<E>> {
    let calculated = checksum(body);
    if calculated == expected {
        Ok(())
    } else {
        Err(TfError::ChecksumMismatch { expected, calculated })
    }
}

// --- Measurement frames ---

/// Decodes a 9-byte measurement frame. The checksum byte is not checked;
/// pair with [`verify_measurement_checksum`] for strict decoding.
pub fn decode_measurement_frame<E: Debug>(frame: &[u8]) -> Result<Measurement, TfError<E>> {
    if frame.len() != MEASUREMENT_FRAME_LEN
        || frame[0] != MEASUREMENT_HEADER
        || frame[1] != MEASUREMENT_HEADER
    {
        return Err(TfError::MalformedFrame);
    }

    let distance = u16::from_le_bytes([frame[2], frame[3]]);
    let strength = u16::from_le_bytes([frame[4], frame[5]]);
    let raw_temperature = u16::from_le_bytes([frame[6], frame[7]]);

    Ok(Measurement::from_raw(distance, strength, raw_temperature))
}

/// Checks byte 8 of a measurement frame against the sum of bytes 0..8.
pub fn verify_measurement_checksum<E: Debug>(frame: &[u8]) -> Result<(), TfError<E>> {
    if frame.len() != MEASUREMENT_FRAME_LEN {
        return Err(TfError::MalformedFrame);
    }
    let (body, trailer) = split_checksum(frame)?;
    compare_checksum(body, trailer)
}

// --- Typed command responses ---

/// Length of the version query response.
pub const VERSION_RESPONSE_LEN: usize = 7;

/// Length of the reset and save-settings responses.
pub const STATUS_RESPONSE_LEN: usize = 5;

/// Decodes `5A 07 01 patch minor major checksum`.
pub fn decode_software_version<E: Debug>(frame: &[u8]) -> Result<SoftwareVersion, TfError<E>> {
    if frame.len() != VERSION_RESPONSE_LEN {
        return Err(TfError::MalformedFrame);
    }
    check_command_response(frame)?;
    Ok(SoftwareVersion::new(frame[5], frame[4], frame[3]))
}

/// The two trailing bytes a status response carries for each outcome.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StatusCodes {
    pub success: [u8; 2],
    pub failure: [u8; 2],
}

/// System reset outcomes as documented for the sensor. The device has been
/// observed answering `00 61`, which matches neither pair.
pub const RESET_STATUS: StatusCodes = StatusCodes {
    success: [0x00, 0x60],
    failure: [0x01, 0x61],
};

/// Save-settings outcomes.
pub const SAVE_STATUS: StatusCodes = StatusCodes {
    success: [0x00, 0x70],
    failure: [0x01, 0x71],
};

/// Interprets `(frame[3], frame[4])` of a 5-byte status response.
///
/// The documented pairs are matched before the checksum is looked at, since
/// neither reset pair sums correctly. Unknown pairs report `ChecksumMismatch`
/// when the frame is corrupt and `UnexpectedResponse` when it is intact.
pub fn decode_status<E: Debug>(frame: &[u8], codes: &StatusCodes) -> Result<(), TfError<E>> {
    if frame.len() != STATUS_RESPONSE_LEN || frame[0] != COMMAND_HEADER {
        return Err(TfError::MalformedFrame);
    }

    let pair = [frame[3], frame[4]];
    if pair == codes.success {
        Ok(())
    } else if pair == codes.failure {
        Err(TfError::DeviceRejected)
    } else {
        check_command_response(frame)?;
        Err(TfError::UnexpectedResponse)
    }
}

// --- Header synchronization ---

/// Which header a [`HeaderScanner`] is looking for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeaderKind {
    /// Two consecutive 0x59 bytes.
    Measurement,
    /// A single 0x5A byte.
    CommandResponse,
}

impl HeaderKind {
    /// Header bytes that open a frame of this kind.
    pub const fn header(&self) -> &'static [u8] {
        match self {
            HeaderKind::Measurement => &[MEASUREMENT_HEADER, MEASUREMENT_HEADER],
            HeaderKind::CommandResponse => &[COMMAND_HEADER],
        }
    }
}

/// Result of feeding one byte to a [`HeaderScanner`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanState {
    /// Keep feeding bytes.
    Searching,
    /// The byte just fed completed the header.
    Synchronized,
    /// The byte budget ran out before a header was seen.
    Exhausted,
}

/// Locates a frame header in an undelimited byte stream.
///
/// Every byte that does not complete the header is charged against the
/// budget, including the first 0x59 of a measurement header. Once the budget
/// is spent the scanner stays `Exhausted`.
#[derive(Debug, Clone)]
pub struct HeaderScanner {
    kind: HeaderKind,
    budget: u8,
    consumed: u8,
    last_byte: Option<u8>,
    state: ScanState,
}

impl HeaderScanner {
    pub fn new(kind: HeaderKind, budget: u8) -> Self {
        HeaderScanner {
            kind,
            budget,
            consumed: 0,
            last_byte: None,
            state: if budget == 0 { ScanState::Exhausted } else { ScanState::Searching },
        }
    }

    pub fn kind(&self) -> HeaderKind {
        self.kind
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Bytes charged against the budget so far.
    pub fn consumed(&self) -> u8 {
        self.consumed
    }

    pub fn feed(&mut self, byte: u8) -> ScanState {
        if self.state != ScanState::Searching {
            return self.state;
        }

        let completes = match self.kind {
            HeaderKind::Measurement => {
                byte == MEASUREMENT_HEADER && self.last_byte == Some(MEASUREMENT_HEADER)
            }
            HeaderKind::CommandResponse => byte == COMMAND_HEADER,
        };

        if completes {
            self.state = ScanState::Synchronized;
        } else {
            self.last_byte = Some(byte);
            self.consumed += 1;
            if self.consumed >= self.budget {
                self.state = ScanState::Exhausted;
            }
        }
        self.state
    }
}
