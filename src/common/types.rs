// src/common/types.rs

use arrayvec::ArrayString;
use core::fmt;

// --- Measurement ---

/// One reading decoded from a 9-byte measurement frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Distance in centimetres.
    pub distance: u16,
    /// Signal amplitude, unitless.
    pub strength: u16,
    /// Chip temperature in degrees Celsius.
    pub temperature: i16,
}

impl Measurement {
    /// Builds a measurement from the raw temperature word sent by the sensor.
    ///
    /// The sensor reports temperature as `8 * (°C + 256)`. The conversion
    /// divides first and truncates, exactly as the vendor firmware examples do,
    /// so 2047 maps to -1 and 2048 to 0.
    pub fn from_raw(distance: u16, strength: u16, raw_temperature: u16) -> Self {
        Measurement {
            distance,
            strength,
            temperature: raw_temperature_to_celsius(raw_temperature),
        }
    }
}

/// `raw / 8 - 256` with truncating division. `raw / 8` never exceeds 8191,
/// so the result always fits an `i16`.
pub fn raw_temperature_to_celsius(raw: u16) -> i16 {
    (raw / 8) as i16 - 256
}

// --- Firmware version ---

/// Longest rendered version, "255.255.255".
pub const VERSION_STRING_CAPACITY: usize = 11;

/// Firmware version reported by the version query.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SoftwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl SoftwareVersion {
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        SoftwareVersion { major, minor, patch }
    }

    /// Renders `major.minor.patch` without allocating.
    pub fn to_array_string(&self) -> ArrayString<VERSION_STRING_CAPACITY> {
        let mut out = ArrayString::new();
        let written = fmt::write(&mut out, format_args!("{}", self));
        // Capacity covers three 3-digit fields and two dots.
        debug_assert!(written.is_ok());
        out
    }
}

impl fmt::Display for SoftwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
