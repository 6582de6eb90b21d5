//! Reading definition
//!
//! A single temperature sample with sensor identity and ingestion time.

use serde::{Deserialize, Serialize};

/// Sensor id used for readings that carry no sensor identity
pub const SENTINEL_SENSOR_ID: i32 = -1;

/// One sensor temperature sample
///
/// Immutable once constructed. Serializes to the dashboard JSON shape
/// `{"sensorId", "sensorName", "temperature", "timestamp"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    sensor_id: i32,
    sensor_name: String,
    temperature: i32,
    /// Unix millis
    timestamp: i64,
}

impl Reading {
    pub fn new(sensor_id: i32, sensor_name: impl Into<String>, temperature: i32, timestamp: i64) -> Self {
        let sensor_name = if sensor_id == SENTINEL_SENSOR_ID {
            String::new()
        } else {
            sensor_name.into()
        };

        Self {
            sensor_id,
            sensor_name,
            temperature,
            timestamp,
        }
    }

    /// A reading for the sentinel ("no sensor") sensor
    pub fn sentinel(temperature: i32, timestamp: i64) -> Self {
        Self::new(SENTINEL_SENSOR_ID, String::new(), temperature, timestamp)
    }

    pub fn sensor_id(&self) -> i32 {
        self.sensor_id
    }

    pub fn sensor_name(&self) -> &str {
        &self.sensor_name
    }

    pub fn temperature(&self) -> i32 {
        self.temperature
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_sentinel(&self) -> bool {
        self.sensor_id == SENTINEL_SENSOR_ID
    }
}
