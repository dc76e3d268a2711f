// src/common/timing.rs

use core::time::Duration;

// The TF-Mini S ships configured for 115200 baud, 8 data bits, no parity,
// 1 stop bit. Opening the port is the caller's job; the constants below
// are what the driver assumes when sizing its waits.

/// Factory default UART baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

// === Synchronization ===

/// Bytes that may be consumed while searching for a frame header before
/// the read is abandoned.
pub const HEADER_SEARCH_BUDGET: u8 = 30;

// === Polling ===

/// Sleep between two polls of a transport that reported `WouldBlock`.
/// A byte takes about 87 µs on the wire at the default baud rate.
pub const POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Default bound on how long a byte inside a frame, or of a command
/// response, may take to arrive (or be accepted for transmission).
/// Waiting for the next measurement frame is not bounded by default, since
/// the sensor may be set to any output rate down to 1 Hz or to trigger mode.
pub const DEFAULT_BYTE_TIMEOUT: Duration = Duration::from_millis(100);

// === Device ===

/// Time the device needs to reboot after a system reset command.
pub const RESET_SETTLE_TIME: Duration = Duration::from_millis(1000);
