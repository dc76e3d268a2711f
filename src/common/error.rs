// src/common/error.rs

/// Errors reported by the TF-Mini S codec and driver.
///
/// Generic over the transport error `E`. Codec functions that never touch
/// the transport are generic over `E` as well, so their results flow into
/// driver results with a plain `?`. The default `E = ()` is used where no
/// transport is involved.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TfError<E = ()>
where
    E: core::fmt::Debug, // Needed for the Io variant's message
{
    /// Underlying I/O error from the transport.
    #[error("I/O error: {0:?}")]
    Io(E),

    /// No frame header was found within the search budget, or the
    /// transport produced no byte before the per-byte timeout.
    #[error("Timed out waiting for a frame header")]
    Timeout,

    /// Trailing checksum byte does not match the computed sum.
    #[error("Checksum mismatch: expected {expected:#04x}, calculated {calculated:#04x}")]
    ChecksumMismatch { expected: u8, calculated: u8 },

    /// Well-formed frame whose content is not what the command expects.
    #[error("Unexpected response received")]
    UnexpectedResponse,

    /// Too few bytes, wrong header, or a frame cut short by a timeout.
    #[error("Malformed or truncated frame")]
    MalformedFrame,

    /// The device answered with its explicit failure code.
    #[error("Device rejected the command")]
    DeviceRejected,

    /// Buffer provided was too small.
    #[error("Buffer overflow: needed {needed}, got {got}")]
    BufferOverflow { needed: usize, got: usize },
}
