//! Snapshot Store
//!
//! One small JSON file per sensor holding its latest reading. Files are
//! replaced atomically: written to a temporary sibling, synced, then renamed
//! over the previous snapshot.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::format::{Reading, SENTINEL_SENSOR_ID};
use crate::registry::snapshot_file_name;

/// On-disk snapshot body
///
/// `sensorId` and `sensorName` are omitted for the sentinel sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_name: Option<String>,

    pub temperature: i32,

    pub timestamp: i64,
}

impl SnapshotRecord {
    pub fn from_reading(reading: &Reading) -> Self {
        if reading.is_sentinel() {
            Self {
                sensor_id: None,
                sensor_name: None,
                temperature: reading.temperature(),
                timestamp: reading.timestamp(),
            }
        } else {
            Self {
                sensor_id: Some(reading.sensor_id()),
                sensor_name: Some(reading.sensor_name().to_string()),
                temperature: reading.temperature(),
                timestamp: reading.timestamp(),
            }
        }
    }

    /// Rebuild the reading for `sensor_id`
    ///
    /// The stored name wins over `fallback_name` (taken from the filename).
    pub fn into_reading(self, sensor_id: i32, fallback_name: &str) -> Reading {
        if sensor_id == SENTINEL_SENSOR_ID {
            return Reading::sentinel(self.temperature, self.timestamp);
        }
        let name = self
            .sensor_name
            .unwrap_or_else(|| fallback_name.to_string());
        Reading::new(sensor_id, name, self.temperature, self.timestamp)
    }
}

/// Reads and writes per-sensor snapshot files in one directory
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open (and create if needed) the snapshot directory
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Path of the snapshot file for a sensor
    pub fn path(&self, sensor_id: i32, sensor_name: &str) -> PathBuf {
        self.dir.join(snapshot_file_name(sensor_id, sensor_name))
    }

    /// Replace the snapshot for the reading's sensor
    pub fn write(&self, reading: &Reading) -> Result<PathBuf> {
        let path = self.path(reading.sensor_id(), reading.sensor_name());
        let tmp_path = path.with_extension("tmp");

        let body = serde_json::to_vec(&SnapshotRecord::from_reading(reading))?;

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&body)?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        Ok(path)
    }

    /// Load a sensor's snapshot
    ///
    /// Returns:
    /// - `Ok(Some(record))` => snapshot present and well-formed
    /// - `Ok(None)` => no snapshot file
    /// - `Err(Serialization)` => file present but not a valid snapshot
    pub fn load(&self, sensor_id: i32, sensor_name: &str) -> Result<Option<SnapshotRecord>> {
        let path = self.path(sensor_id, sensor_name);
        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_slice(&body)?))
    }

    /// Delete a sensor's snapshot. Returns false if there was none.
    pub fn remove(&self, sensor_id: i32, sensor_name: &str) -> Result<bool> {
        match fs::remove_file(self.path(sensor_id, sensor_name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
