//! Record codec
//!
//! Encoding and decoding of headers and fixed-width reading records.
//! All multi-byte values are big-endian.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use bytes::{Buf, BufMut, BytesMut};

use super::{
    FormatVersion, Reading, CURRENT_VERSION, HEADER_SIZE, MAGIC, SENTINEL_SENSOR_ID,
    TEMPERATURE_MAX, TEMPERATURE_MIN,
};
use crate::error::{Result, StsError};

/// Resolves a sensor id to its display name while decoding
pub trait NameResolver {
    fn resolve(&self, sensor_id: i32) -> Option<String>;
}

impl<S: BuildHasher> NameResolver for HashMap<i32, String, S> {
    fn resolve(&self, sensor_id: i32) -> Option<String> {
        self.get(&sensor_id).cloned()
    }
}

impl NameResolver for BTreeMap<i32, String> {
    fn resolve(&self, sensor_id: i32) -> Option<String> {
        self.get(&sensor_id).cloned()
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode the file header for a format version
///
/// Format: magic (3) + version (1)
pub fn encode_header(version: FormatVersion) -> Vec<u8> {
    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.extend_from_slice(MAGIC);
    header.push(version.as_byte());
    header
}

/// Encode a reading as a record of the current format version
pub fn encode(reading: &Reading) -> Result<Vec<u8>> {
    encode_as(CURRENT_VERSION, reading)
}

/// Encode a reading as a record of an explicit format version
///
/// Fails with `Range` before producing any bytes if a field does not fit.
pub fn encode_as(version: FormatVersion, reading: &Reading) -> Result<Vec<u8>> {
    check_range(version, reading)?;

    let mut record = BytesMut::with_capacity(version.record_size());
    if version == FormatVersion::V2 {
        record.put_i16(reading.sensor_id() as i16);
    }
    record.put_i64(reading.timestamp());
    // 128 wraps to 0x80, which decode maps back to 128
    record.put_u8(reading.temperature() as u8);

    Ok(record.to_vec())
}

fn check_range(version: FormatVersion, reading: &Reading) -> Result<()> {
    let temperature = reading.temperature();
    if !(TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&temperature) {
        return Err(StsError::Range(format!(
            "temperature {} is not within [{},{}]",
            temperature, TEMPERATURE_MIN, TEMPERATURE_MAX
        )));
    }

    if reading.timestamp() < 0 {
        return Err(StsError::Range(format!(
            "timestamp {} can not be negative",
            reading.timestamp()
        )));
    }

    match version {
        FormatVersion::V1 if !reading.is_sentinel() => Err(StsError::Range(format!(
            "{} records can not carry sensor id {}",
            version,
            reading.sensor_id()
        ))),
        FormatVersion::V2 if i16::try_from(reading.sensor_id()).is_err() => {
            Err(StsError::Range(format!(
                "sensor id {} does not fit in 16 bits",
                reading.sensor_id()
            )))
        }
        _ => Ok(()),
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a complete log buffer (header + records)
///
/// Returns readings in buffer order. Sensor names are looked up through
/// `names`; unknown ids decode with an empty name.
pub fn decode<R: NameResolver + ?Sized>(names: &R, bytes: &[u8]) -> Result<Vec<Reading>> {
    if bytes.len() < HEADER_SIZE || &bytes[..MAGIC.len()] != MAGIC {
        return Err(StsError::Format(
            "payload does not start with the magic bytes".to_string(),
        ));
    }

    let version_byte = bytes[MAGIC.len()];
    let version = FormatVersion::from_byte(version_byte).ok_or_else(|| {
        StsError::Format(format!("unsupported format version: {}", version_byte))
    })?;

    let payload = &bytes[HEADER_SIZE..];
    let record_size = version.record_size();
    if payload.len() % record_size != 0 {
        return Err(StsError::Format(format!(
            "truncated record: {} payload bytes is not a multiple of {} ({})",
            payload.len(),
            record_size,
            version
        )));
    }

    let mut readings = Vec::with_capacity(payload.len() / record_size);
    for mut record in payload.chunks_exact(record_size) {
        let sensor_id = match version {
            FormatVersion::V1 => SENTINEL_SENSOR_ID,
            FormatVersion::V2 => record.get_i16() as i32,
        };
        let timestamp = record.get_i64();
        let temperature = decode_temperature(record.get_i8());

        if timestamp < 0 {
            return Err(StsError::Format(format!(
                "record {} has negative timestamp {}",
                readings.len(),
                timestamp
            )));
        }

        let name = if sensor_id == SENTINEL_SENSOR_ID {
            String::new()
        } else {
            names.resolve(sensor_id).unwrap_or_default()
        };
        readings.push(Reading::new(sensor_id, name, temperature, timestamp));
    }

    Ok(readings)
}

fn decode_temperature(raw: i8) -> i32 {
    if raw == i8::MIN {
        TEMPERATURE_MAX
    } else {
        raw as i32
    }
}
