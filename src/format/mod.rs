//! STS Format Module
//!
//! Versioned, fixed-width binary encoding of temperature readings.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (4 bytes)                                        │
//! │   Magic: "sts" (3) | Version: u8 (1)                    │
//! ├─────────────────────────────────────────────────────────┤
//! │ Records (fixed width, repeated until EOF)               │
//! │   v1: Timestamp: i64 BE (8) | Temperature: i8 (1)       │
//! │   v2: SensorId: i16 BE (2) | Timestamp: i64 BE (8)      │
//! │       | Temperature: i8 (1)                             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! There are no delimiters and no checksum: corruption is detected
//! structurally (magic check + payload length must be a whole number of
//! records).

mod codec;
mod reading;

pub use codec::{decode, encode, encode_as, encode_header, NameResolver};
pub use reading::{Reading, SENTINEL_SENSOR_ID};

// =============================================================================
// Shared Constants
// =============================================================================

/// Magic bytes identifying an STS log file
pub const MAGIC: &[u8; 3] = b"sts";

/// Header size: Magic (3) + Version (1) = 4 bytes
pub const HEADER_SIZE: usize = 4;

/// Lowest encodable temperature
pub const TEMPERATURE_MIN: i32 = -127;

/// Highest encodable temperature (stored as 0x80)
pub const TEMPERATURE_MAX: i32 = 128;

/// Format version written by this build
pub const CURRENT_VERSION: FormatVersion = FormatVersion::V2;

// =============================================================================
// Format Versions
// =============================================================================

/// Supported record layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum FormatVersion {
    /// Timestamp + temperature, no sensor identity
    V1 = 1,

    /// Sensor id + timestamp + temperature
    V2 = 2,
}

impl FormatVersion {
    /// Parse a version byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(FormatVersion::V1),
            2 => Some(FormatVersion::V2),
            _ => None,
        }
    }

    /// The version byte written to the header
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Width in bytes of one record of this version
    pub fn record_size(self) -> usize {
        match self {
            FormatVersion::V1 => 9,
            FormatVersion::V2 => 11,
        }
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.as_byte())
    }
}
