//! Storage Module
//!
//! The two on-disk representations behind the engine.
//!
//! ## Responsibilities
//! - Per-sensor snapshot files (latest reading, JSON, atomic overwrite)
//! - Append-only durable logs in the STS binary format
//! - Quarantine of durable logs that fail to decode
//!
//! Neither type locks on its own; the engine is the single writer.

mod log_file;
mod snapshot;

pub use log_file::{log_file_name, verify_log_file, DurableLog, LogFile, CORRUPT_DIR, LOG_FILE_SUFFIX};
pub use snapshot::{SnapshotRecord, SnapshotStore};
