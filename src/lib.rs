// src/lib.rs

//! Serial driver for the Benewake TF-Mini S time-of-flight distance sensor.
//!
//! [`common`] holds the frame codec and protocol types and does no I/O.
//! [`driver`] runs command/response exchanges over a [`TfSerial`] port.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod common;
pub mod driver;

// Re-export key types for convenience
pub use common::{
    ChecksumPolicy, Command, Config, Measurement, SoftwareVersion, TfError, TfSerial,
    DEFAULT_BAUD_RATE,
};
pub use driver::TfMiniS;

#[cfg(feature = "async")]
pub use common::TfSerialAsync;
#[cfg(feature = "async")]
pub use driver::TfMiniSAsync;
