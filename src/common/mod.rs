// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod command;
pub mod config;
pub mod error;
pub mod frame;
pub mod hal_traits;
pub mod timing;
pub mod types;

// --- Re-export key types/traits/functions for easier access ---

// From command.rs
pub use command::{Command, ExpectedResponse};

// From config.rs
pub use config::{ChecksumPolicy, Config};

// From error.rs
pub use error::TfError;

// From frame.rs
pub use frame::{
    check_command_response, checksum, decode_measurement_frame, decode_software_version,
    decode_status, encode_command, verify_command_response_checksum, verify_measurement_checksum,
    CommandFrame, HeaderKind, HeaderScanner, ScanState, StatusCodes,
};

// From hal_traits.rs
pub use hal_traits::TfSerial;

// From timing.rs
pub use timing::DEFAULT_BAUD_RATE;

// From types.rs
pub use types::{Measurement, SoftwareVersion};

// --- Feature-gated re-exports ---

#[cfg(feature = "async")]
pub use hal_traits::TfSerialAsync;

#[cfg(feature = "embedded-io")]
pub use hal_traits::IoSerial;
#[cfg(feature = "embedded-io-async")]
pub use hal_traits::IoSerialAsync;
