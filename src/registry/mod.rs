//! Sensor Registry Module
//!
//! Tracks sensorId → sensorName.
//!
//! ## Responsibilities
//! - Discover known sensors from snapshot filenames at startup
//! - Upsert sensors as stores introduce them
//! - Resolve names while decoding durable logs
//!
//! ## Snapshot filename convention
//! ```text
//! last_reading.json                   sentinel sensor
//! {id}_{name}_last_reading.json       named sensor (name may contain '_')
//! ```

mod naming;
mod table;

pub use naming::{
    parse_snapshot_file_name, snapshot_file_name, SnapshotFileName, MAX_FILE_NAME_LEN,
    SNAPSHOT_SUFFIX,
};
pub use table::{scan, SensorRegistry};
