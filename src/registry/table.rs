//! Sensor registry implementation
//!
//! BTreeMap-based id → name table with RwLock for concurrency.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use parking_lot::RwLock;

use super::naming::{parse_snapshot_file_name, SnapshotFileName};
use crate::error::Result;
use crate::format::{NameResolver, SENTINEL_SENSOR_ID};
use crate::oplog::OperationalLog;

/// Scan a snapshot directory for known sensors
///
/// Malformed id prefixes are logged and skipped. A missing directory yields
/// an empty mapping.
pub fn scan(snapshot_dir: &Path, log: &OperationalLog) -> Result<BTreeMap<i32, String>> {
    log.write("Reading sensor IDs from disk...");
    let mut sensors = BTreeMap::new();

    let entries = match fs::read_dir(snapshot_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log.write(format!(
                "Snapshot directory {} does not exist yet.",
                snapshot_dir.display()
            ));
            return Ok(sensors);
        }
        Err(e) => {
            log.warn(format!(
                "Error while listing snapshot directory {}: {}",
                snapshot_dir.display(),
                e
            ));
            return Err(e.into());
        }
    };

    for entry in entries {
        let entry = entry.and_then(|entry| {
            let is_file = entry.file_type()?.is_file();
            Ok((entry, is_file))
        });
        let entry = match entry {
            Ok((entry, true)) => entry,
            Ok((_, false)) => continue,
            Err(e) => {
                log.warn(format!(
                    "Error while reading snapshot directory {}: {}",
                    snapshot_dir.display(),
                    e
                ));
                return Err(e.into());
            }
        };

        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();

        match parse_snapshot_file_name(&file_name) {
            SnapshotFileName::Sentinel => {
                sensors.insert(SENTINEL_SENSOR_ID, String::new());
            }
            SnapshotFileName::Sensor { id, .. } if id == SENTINEL_SENSOR_ID => {
                sensors.insert(SENTINEL_SENSOR_ID, String::new());
            }
            SnapshotFileName::Sensor { id, name } => {
                sensors.insert(id, name);
            }
            SnapshotFileName::Malformed(reason) => {
                log.warn(format!("Failed to parse sensor ID from path: {}", reason));
            }
            SnapshotFileName::Unrelated => {}
        }
    }

    log.write(format!(
        "Successfully read {} sensor IDs from disk!",
        sensors.len()
    ));
    Ok(sensors)
}

/// In-memory sensorId → sensorName table
///
/// ## Concurrency:
/// - Many concurrent readers (name resolution during history decodes)
/// - Writers only on store of a new or renamed sensor
#[derive(Debug, Default)]
pub struct SensorRegistry {
    sensors: RwLock<BTreeMap<i32, String>>,
}

impl SensorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry populated by scanning a snapshot directory
    pub fn scan(snapshot_dir: &Path, log: &OperationalLog) -> Result<Self> {
        Ok(Self::from_map(scan(snapshot_dir, log)?))
    }

    pub fn from_map(sensors: BTreeMap<i32, String>) -> Self {
        Self {
            sensors: RwLock::new(sensors),
        }
    }

    /// Idempotent upsert
    ///
    /// Returns the previous name if the sensor was known under a different
    /// name.
    pub fn register(&self, sensor_id: i32, sensor_name: &str) -> Option<String> {
        let name = if sensor_id == SENTINEL_SENSOR_ID {
            ""
        } else {
            sensor_name
        };

        // Fast path: already registered with the same name
        if self.sensors.read().get(&sensor_id).map(String::as_str) == Some(name) {
            return None;
        }

        self.sensors
            .write()
            .insert(sensor_id, name.to_string())
            .filter(|previous| previous != name)
    }

    pub fn name(&self, sensor_id: i32) -> Option<String> {
        self.sensors.read().get(&sensor_id).cloned()
    }

    pub fn contains(&self, sensor_id: i32) -> bool {
        self.sensors.read().contains_key(&sensor_id)
    }

    /// Known sensor ids in ascending order
    pub fn ids(&self) -> Vec<i32> {
        self.sensors.read().keys().copied().collect()
    }

    /// Copy of the full mapping
    pub fn to_map(&self) -> BTreeMap<i32, String> {
        self.sensors.read().clone()
    }

    pub fn len(&self) -> usize {
        self.sensors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.read().is_empty()
    }
}

impl NameResolver for SensorRegistry {
    fn resolve(&self, sensor_id: i32) -> Option<String> {
        self.name(sensor_id)
    }
}
