// src/driver/sync_driver/io_helpers.rs

use super::TfMiniS;
use crate::common::{error::TfError, hal_traits::TfSerial};
use embedded_hal::delay::DelayNs;
use log::trace;
use nb::Result as NbResult;

// Implementation block for I/O related helpers
impl<S, D> TfMiniS<S, D>
where
    S: TfSerial,
    D: DelayNs,
{
    /// Executes a non-blocking I/O operation (`f`) repeatedly until it
    /// stops returning `WouldBlock`, sleeping one poll interval between tries.
    ///
    /// Gives up with `TfError::Timeout` once `limit_us` microseconds have
    /// been spent sleeping. Without a limit it waits indefinitely.
    pub(super) fn execute_blocking_io_with_timeout<FN, T>(
        &mut self,
        limit_us: Option<u32>,
        mut f: FN,
    ) -> Result<T, TfError<S::Error>>
    where
        FN: FnMut(&mut S) -> NbResult<T, S::Error>,
    {
        let step_us = self.config.poll_interval_us();
        let mut waited_us: u32 = 0;

        loop {
            match f(&mut self.serial) {
                Ok(result) => return Ok(result),
                Err(nb::Error::WouldBlock) => {
                    if let Some(limit) = limit_us {
                        if waited_us >= limit {
                            return Err(TfError::Timeout);
                        }
                    }
                    self.delay.delay_us(step_us);
                    waited_us = waited_us.saturating_add(step_us);
                }
                Err(nb::Error::Other(e)) => return Err(TfError::Io(e)),
            }
        }
    }

    /// Reads one byte within the per-byte timeout.
    pub(super) fn read_byte_blocking(&mut self) -> Result<u8, TfError<S::Error>> {
        self.read_byte_within(self.config.byte_timeout_us())
    }

    pub(super) fn read_byte_within(
        &mut self,
        limit_us: Option<u32>,
    ) -> Result<u8, TfError<S::Error>> {
        self.execute_blocking_io_with_timeout(limit_us, |serial| serial.read_byte())
    }

    /// Writes a complete frame and flushes it, so every response byte read
    /// afterwards belongs to this exchange.
    pub(super) fn send_frame(&mut self, frame: &[u8]) -> Result<(), TfError<S::Error>> {
        trace!("TX {:02X?}", frame);
        let limit_us = self.config.byte_timeout_us();
        for &byte in frame {
            self.execute_blocking_io_with_timeout(limit_us, |serial| serial.write_byte(byte))?;
        }
        self.execute_blocking_io_with_timeout(limit_us, |serial| serial.flush())
    }
}
