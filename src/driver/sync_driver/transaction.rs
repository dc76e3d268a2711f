// src/driver/sync_driver/transaction.rs

use super::TfMiniS;
use crate::common::{
    command::Command,
    error::TfError,
    frame::{self, CommandFrame, HeaderKind, HeaderScanner, ScanState, MEASUREMENT_FRAME_LEN},
    hal_traits::TfSerial,
};
use embedded_hal::delay::DelayNs;
use log::{trace, warn};

impl<S, D> TfMiniS<S, D>
where
    S: TfSerial,
    D: DelayNs,
{
    /// Encodes and sends `command`, returning the bytes that went out.
    pub(super) fn send_command(
        &mut self,
        command: &Command,
    ) -> Result<CommandFrame, TfError<S::Error>> {
        let frame = command.encode()?;
        trace!("Sending {}", command);
        self.send_frame(&frame)?;
        Ok(frame)
    }

    /// Consumes bytes until a `kind` header has been read, or the header
    /// budget runs out (`TfError::Timeout`).
    ///
    /// Measurement headers are waited for under `header_timeout`, command
    /// responses under `byte_timeout`.
    pub(super) fn synchronize(&mut self, kind: HeaderKind) -> Result<(), TfError<S::Error>> {
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
                    let byte = self.read_byte_within(limit_us)?;
                    scanner.feed(byte);
                }
            }
        }
    }

    /// Fills `buf` after a header. Running out of time here means the frame
    /// was cut short, which is reported as `MalformedFrame`.
    fn read_tail(&mut self, buf: &mut [u8]) -> Result<(), TfError<S::Error>> {
        for slot in buf.iter_mut() {
            *slot = match self.read_byte_blocking() {
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

    /// Synchronizes on `59 59` and reads the remaining seven bytes.
    pub(super) fn read_measurement_frame(
        &mut self,
    ) -> Result<[u8; MEASUREMENT_FRAME_LEN], TfError<S::Error>> {
        let mut frame = [0u8; MEASUREMENT_FRAME_LEN];
        self.synchronize(HeaderKind::Measurement)?;
        frame[..2].copy_from_slice(HeaderKind::Measurement.header());
        self.read_tail(&mut frame[2..])?;
        trace!("RX {:02X?}", frame);
        Ok(frame)
    }

    /// Synchronizes on `5A` and fills the rest of `buf`, without judging the
    /// checksum. `buf.len()` is the response length the command implies.
    pub(super) fn read_raw_command_frame(
        &mut self,
        buf: &mut [u8],
    ) -> Result<(), TfError<S::Error>> {
        if buf.len() < 2 {
            return Err(TfError::BufferOverflow { needed: 2, got: buf.len() });
        }
        self.synchronize(HeaderKind::CommandResponse)?;
        buf[0] = frame::COMMAND_HEADER;
        self.read_tail(&mut buf[1..])?;
        trace!("RX {:02X?}", buf);
        Ok(())
    }

    /// [`Self::read_raw_command_frame`] followed by a checksum check.
    pub(super) fn read_command_frame(&mut self, buf: &mut [u8]) -> Result<(), TfError<S::Error>> {
        self.read_raw_command_frame(buf)?;
        frame::check_command_response(buf).map_err(|e| {
            warn!("Unable to verify checksum: {}", e);
            e
        })
    }
}
