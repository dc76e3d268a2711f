// src/common/config.rs

use core::time::Duration;

use super::timing;

/// What to do with the trailing checksum byte of a 9-byte measurement frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChecksumPolicy {
    /// Accept the frame without looking at the checksum. This is how the
    /// sensor's reference driver behaves.
    #[default]
    Ignore,
    /// Reject frames whose checksum does not match.
    Verify,
}

/// Driver configuration.
///
/// `Config::default()` waits as long as it takes for a measurement frame to
/// start, and bounds every other wait. `Config::legacy()` reproduces the
/// reference driver, which blocks for as long as the transport stays silent.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Config {
    /// Bytes that may be skipped while searching for a frame header.
    pub header_budget: u8,
    /// Longest wait for one byte while searching for a measurement header.
    /// `None` waits forever.
    pub header_timeout: Option<Duration>,
    /// Longest wait for any other byte. `None` waits forever.
    pub byte_timeout: Option<Duration>,
    /// Measurement frame checksum handling.
    pub measurement_checksum: ChecksumPolicy,
    /// Wait after a system reset, whatever its outcome.
    pub reset_settle: Duration,
    /// Sleep between polls of an idle transport.
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            header_budget: timing::HEADER_SEARCH_BUDGET,
            header_timeout: None,
            byte_timeout: Some(timing::DEFAULT_BYTE_TIMEOUT),
            measurement_checksum: ChecksumPolicy::Ignore,
            reset_settle: timing::RESET_SETTLE_TIME,
            poll_interval: timing::POLL_INTERVAL,
        }
    }
}

impl Config {
    /// Unbounded byte waits, checksum ignored on measurement frames.
    pub fn legacy() -> Self {
        Config {
            byte_timeout: None,
            ..Config::default()
        }
    }

    /// Verifies measurement frame checksums on top of the defaults.
    pub fn strict() -> Self {
        Config {
            measurement_checksum: ChecksumPolicy::Verify,
            ..Config::default()
        }
    }

    pub fn with_header_budget(mut self, budget: u8) -> Self {
        self.header_budget = budget;
        self
    }

    pub fn with_header_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.header_timeout = timeout;
        self
    }

    pub fn with_byte_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.byte_timeout = timeout;
        self
    }

    pub fn with_measurement_checksum(mut self, policy: ChecksumPolicy) -> Self {
        self.measurement_checksum = policy;
        self
    }

    pub fn with_reset_settle(mut self, settle: Duration) -> Self {
        self.reset_settle = settle;
        self
    }

    /// A zero interval is clamped to 1 µs so timeouts still make progress.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_micros(1));
        self
    }

    /// Poll interval in whole microseconds, at least 1.
    pub(crate) fn poll_interval_us(&self) -> u32 {
        duration_to_us(self.poll_interval).max(1)
    }

    /// Measurement header timeout in whole microseconds.
    pub(crate) fn header_timeout_us(&self) -> Option<u32> {
        self.header_timeout.map(duration_to_us)
    }

    /// Per-byte timeout in whole microseconds.
    pub(crate) fn byte_timeout_us(&self) -> Option<u32> {
        self.byte_timeout.map(duration_to_us)
    }
}

/// Saturating conversion; anything past ~71 minutes is treated as that long.
pub(crate) fn duration_to_us(d: Duration) -> u32 {
    u32::try_from(d.as_micros()).unwrap_or(u32::MAX)
}
