// src/driver/mock.rs

//! In-memory transport and delay used by the driver tests.

use crate::common::hal_traits::TfSerial;
use std::collections::VecDeque;
use std::vec::Vec;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MockCommError;

/// Scripted serial port.
///
/// Bytes staged with `stage_read_data` are handed out one at a time, then
/// reads report `WouldBlock`. With echo enabled every written byte is queued
/// for reading, optionally with one byte altered.
#[derive(Debug, Default)]
pub struct MockSerial {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    flushes: usize,
    echo: bool,
    corrupt_echo: Option<(usize, u8)>,
    write_busy: bool,
    fail_reads: bool,
    stalled_reads: usize,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// A port that answers every command by repeating it.
    pub fn echoing() -> Self {
        MockSerial { echo: true, ..Self::default() }
    }

    pub fn stage_read_data(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }

    /// XORs the echoed byte at `index` with `mask`.
    pub fn corrupt_echo_at(&mut self, index: usize, mask: u8) {
        self.corrupt_echo = Some((index, mask));
    }

    pub fn set_write_busy(&mut self, busy: bool) {
        self.write_busy = busy;
    }

    /// Makes the next `polls` reads report `WouldBlock` whatever is staged.
    pub fn stall_reads(&mut self, polls: usize) {
        self.stalled_reads = polls;
    }

    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Staged bytes not read yet.
    pub fn remaining(&self) -> usize {
        self.rx.len()
    }
}

impl TfSerial for MockSerial {
    type Error = MockCommError;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        if self.fail_reads {
            return Err(nb::Error::Other(MockCommError));
        }
        if self.stalled_reads > 0 {
            self.stalled_reads -= 1;
            return Err(nb::Error::WouldBlock);
        }
        self.rx.pop_front().ok_or(nb::Error::WouldBlock)
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        if self.write_busy {
            return Err(nb::Error::WouldBlock);
        }
        if self.echo {
            let index = self.tx.len();
            let echoed = match self.corrupt_echo {
                Some((at, mask)) if at == index => byte ^ mask,
                _ => byte,
            };
            self.rx.push_back(echoed);
        }
        self.tx.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}

/// Delay provider that only keeps count.
#[derive(Debug, Default)]
pub struct MockDelay {
    total_ns: u64,
}

impl MockDelay {
    pub fn total_us(&self) -> u64 {
        self.total_ns / 1_000
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.total_ns += u64::from(us) * 1_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}

#[cfg(feature = "async")]
pub use self::async_mock::MockSerialAsync;

#[cfg(feature = "async")]
mod async_mock {
    use super::{MockCommError, MockDelay};
    use crate::common::hal_traits::TfSerialAsync;
    use std::collections::VecDeque;
    use std::vec::Vec;

    /// Async counterpart of `MockSerial`. An empty queue never resolves, so
    /// reads only finish through the driver's timeout.
    #[derive(Debug, Default)]
    pub struct MockSerialAsync {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        echo: bool,
        stalled_reads: usize,
    }

    impl MockSerialAsync {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn echoing() -> Self {
            MockSerialAsync { echo: true, ..Self::default() }
        }

        pub fn stage_read_data(&mut self, data: &[u8]) {
            self.rx.extend(data.iter().copied());
        }

        /// Makes the next read yield `polls` times before producing a byte.
        pub fn stall_reads(&mut self, polls: usize) {
            self.stalled_reads = polls;
        }

        pub fn written(&self) -> &[u8] {
            &self.tx
        }
    }

    impl TfSerialAsync for MockSerialAsync {
        type Error = MockCommError;

        async fn read_byte(&mut self) -> Result<u8, Self::Error> {
            while self.stalled_reads > 0 {
                self.stalled_reads -= 1;
                embassy_futures::yield_now().await;
            }
            match self.rx.pop_front() {
                Some(byte) => Ok(byte),
                None => core::future::pending().await,
            }
        }

        async fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
            if self.echo {
                self.rx.extend(bytes.iter().copied());
            }
            self.tx.extend_from_slice(bytes);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl embedded_hal_async::delay::DelayNs for MockDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }

        async fn delay_us(&mut self, us: u32) {
            self.total_ns += u64::from(us) * 1_000;
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.total_ns += u64::from(ms) * 1_000_000;
        }
    }
}
