//! Snapshot filename convention
//!
//! "7_kitchen_last_reading.json" ↔ (7, "kitchen")

use crate::format::SENTINEL_SENSOR_ID;

/// Suffix shared by every snapshot file
pub const SNAPSHOT_SUFFIX: &str = "last_reading.json";

/// Longest filename (in bytes) accepted by common filesystems
pub const MAX_FILE_NAME_LEN: usize = 255;

/// What a directory entry name means to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotFileName {
    /// Snapshot of the sentinel ("no sensor") sensor
    Sentinel,

    /// Snapshot of a named sensor
    Sensor { id: i32, name: String },

    /// Looks like a snapshot but the id prefix is not a number
    Malformed(String),

    /// Not a snapshot file at all
    Unrelated,
}

/// Filename of the snapshot for a sensor
pub fn snapshot_file_name(sensor_id: i32, sensor_name: &str) -> String {
    if sensor_id == SENTINEL_SENSOR_ID {
        SNAPSHOT_SUFFIX.to_string()
    } else {
        format!("{}_{}_{}", sensor_id, sensor_name, SNAPSHOT_SUFFIX)
    }
}

/// Classify a directory entry name
///
/// The prefix before the suffix is split at its first underscore only, so
/// "3_living_room_last_reading.json" is sensor 3 named "living_room".
/// A prefix without an underscore maps to the sentinel sensor.
pub fn parse_snapshot_file_name(file_name: &str) -> SnapshotFileName {
    let prefix = match file_name.strip_suffix(SNAPSHOT_SUFFIX) {
        Some(prefix) => prefix,
        None => return SnapshotFileName::Unrelated,
    };

    if prefix.is_empty() {
        return SnapshotFileName::Sentinel;
    }

    let prefix = match prefix.strip_suffix('_') {
        Some(prefix) => prefix,
        None => return SnapshotFileName::Unrelated,
    };

    match prefix.split_once('_') {
        None => SnapshotFileName::Sentinel,
        Some((id, name)) => match id.parse::<i32>() {
            Ok(id) => SnapshotFileName::Sensor {
                id,
                name: name.to_string(),
            },
            Err(e) => SnapshotFileName::Malformed(format!(
                "invalid sensor id '{}' in {}: {}",
                id, file_name, e
            )),
        },
    }
}
