//! Engine Module
//!
//! The storage engine: single source of truth for current and historical
//! readings.
//!
//! ## Responsibilities
//! - Discover sensors and load their snapshots on startup
//! - Validate, timestamp, and persist incoming readings
//! - Serve current values from memory and history from the durable logs
//! - Quarantine durable logs that fail to decode
//! - Notify listeners of every stored reading

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{Result, StsError};
use crate::format::{self, Reading, SENTINEL_SENSOR_ID};
use crate::listener::{ListenerId, ReadingListener};
use crate::oplog::OperationalLog;
use crate::registry::{snapshot_file_name, SensorRegistry, MAX_FILE_NAME_LEN};
use crate::storage::{DurableLog, LogFile, SnapshotStore};

/// Fields a client sends when reporting a temperature
///
/// JSON shape: `{"sensorName": "kitchen", "temperature": 23}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPayload {
    pub sensor_name: String,
    pub temperature: i32,
}

impl ReadingPayload {
    pub fn new(sensor_name: impl Into<String>, temperature: i32) -> Self {
        Self {
            sensor_name: sensor_name.into(),
            temperature,
        }
    }

    /// Parse an ingestion body; missing or mistyped fields are `Validation`
    pub fn from_json(payload: &serde_json::Value) -> Result<Self> {
        Self::deserialize(payload).map_err(|e| StsError::Validation(e.to_string()))
    }

    fn validate(&self, sensor_id: i32) -> Result<()> {
        validate_sensor_name(sensor_id, &self.sensor_name)
    }
}

/// A name must be usable inside a snapshot filename
fn validate_sensor_name(sensor_id: i32, sensor_name: &str) -> Result<()> {
    if sensor_id == SENTINEL_SENSOR_ID {
        return Ok(());
    }
    if sensor_name.is_empty() {
        return Err(StsError::Validation(format!(
            "sensor {} has an empty sensorName",
            sensor_id
        )));
    }
    if sensor_name.contains(['/', '\\', '\0']) {
        return Err(StsError::Validation(format!(
            "sensorName '{}' contains a path separator or NUL",
            sensor_name.escape_default()
        )));
    }
    let file_name_len = snapshot_file_name(sensor_id, sensor_name).len();
    if file_name_len > MAX_FILE_NAME_LEN {
        return Err(StsError::Validation(format!(
            "sensorName of sensor {} is too long ({} byte snapshot filename, max {})",
            sensor_id, file_name_len, MAX_FILE_NAME_LEN
        )));
    }
    Ok(())
}

/// The storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Stores**: Serialized by `write_lock`
///   - The whole sequence (snapshot overwrite, header-if-empty check,
///     record append) runs under one lock, so two appends never interleave
///   - Quarantine of a corrupt log also happens under `write_lock`
///
/// - **Reads**: Never take `write_lock` on the happy path
///   - `current()` reads the in-memory snapshot map (RwLock)
///   - `history()` opens its own file handles and decodes without locking
///
/// Listeners run after `write_lock` is released.
pub struct StorageEngine {
    /// Engine configuration
    config: Config,

    /// Operational log shared with the transport layer
    log: Arc<OperationalLog>,

    /// sensorId → sensorName
    registry: SensorRegistry,

    /// Per-sensor snapshot files
    snapshots: SnapshotStore,

    /// Append-only STS logs
    durable: DurableLog,

    /// Latest reading per sensor
    current: RwLock<HashMap<i32, Reading>>,

    /// Registered "reading stored" observers
    listeners: RwLock<Vec<(ListenerId, Arc<dyn ReadingListener>)>>,

    next_listener_id: AtomicU64,

    /// Total readings held by the durable logs
    stored_count: AtomicU64,

    /// Serializes stores and quarantines; guards the last issued timestamp
    write_lock: Mutex<i64>,
}

impl StorageEngine {
    /// Open the engine over the configured directories
    ///
    /// On startup:
    /// 1. Create the snapshot and long-term storage directories
    /// 2. Discover sensors from snapshot filenames
    /// 3. Load each sensor's snapshot (missing or malformed → no current value)
    /// 4. Count stored readings, quarantining logs that fail to decode
    pub fn open(config: Config, log: Arc<OperationalLog>) -> Result<Self> {
        if let Err(e) = config.validate() {
            log.warn(format!("Invalid configuration: {}", e));
            return Err(e);
        }

        // Step 1: Directories
        let snapshots = SnapshotStore::open(&config.app_dir).map_err(|e| {
            log.warn(format!(
                "Error while opening snapshot directory {}: {}",
                config.app_dir.display(),
                e
            ));
            e
        })?;
        let durable = DurableLog::open(&config.lts_dir).map_err(|e| {
            log.warn(format!(
                "Error while opening long-term storage directory {}: {}",
                config.lts_dir.display(),
                e
            ));
            e
        })?;

        // Step 2: Known sensors (scan logs its own failures)
        let registry = SensorRegistry::scan(&config.app_dir, &log)?;

        let engine = Self {
            config,
            log,
            registry,
            snapshots,
            durable,
            current: RwLock::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            stored_count: AtomicU64::new(0),
            write_lock: Mutex::new(0),
        };

        // Step 3: Snapshots
        for (sensor_id, sensor_name) in engine.registry.to_map() {
            if let Some(reading) = engine.load_snapshot(sensor_id, &sensor_name) {
                engine.current.write().insert(sensor_id, reading);
            }
        }

        // Step 4: Stored readings counter
        let mut total = 0u64;
        for file in engine.discover_log_files()? {
            total += engine.read_log_file(&file.path)?.len() as u64;
        }
        engine.stored_count.store(total, Ordering::SeqCst);
        *engine.write_lock.lock() = engine.latest_snapshot_timestamp();

        engine.log.write(format!(
            "Read {} currently stored readings from disk.",
            total
        ));

        Ok(engine)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Store a reading from a JSON ingestion body
    ///
    /// Fails with `Validation` for a missing or mistyped `sensorName` /
    /// `temperature`, `Range` for values the format can not hold, and `Io`
    /// if a file write fails. Validation and range failures persist nothing.
    pub fn store(&self, sensor_id: i32, payload: &serde_json::Value) -> Result<Reading> {
        let payload = ReadingPayload::from_json(payload).map_err(|e| {
            self.log
                .warn(format!("Rejected reading for sensor {}: {}", sensor_id, e));
            e
        })?;
        self.store_payload(sensor_id, payload)
    }

    /// Store an already parsed reading
    pub fn store_payload(&self, sensor_id: i32, payload: ReadingPayload) -> Result<Reading> {
        self.log.write("Storing received temperature...");

        if let Err(e) = payload.validate(sensor_id) {
            self.log
                .warn(format!("Rejected reading for sensor {}: {}", sensor_id, e));
            return Err(e);
        }

        let reading = {
            let mut last_timestamp = self.write_lock.lock();

            // Wall-clock ingestion time, never behind the previous store
            let timestamp = Utc::now().timestamp_millis().max(*last_timestamp);
            let reading = Reading::new(
                sensor_id,
                payload.sensor_name,
                payload.temperature,
                timestamp,
            );

            // Range-check before anything changes
            let record = format::encode(&reading).map_err(|e| {
                self.log
                    .warn(format!("Rejected reading for sensor {}: {}", sensor_id, e));
                e
            })?;

            // A failed snapshot write leaves memory, registry and disk as they were
            if let Err(e) = self.snapshots.write(&reading) {
                self.log.warn(format!(
                    "Failed to write snapshot for sensor {}: {}",
                    sensor_id, e
                ));
                return Err(e);
            }

            self.current.write().insert(sensor_id, reading.clone());
            *last_timestamp = timestamp;

            // The old-name snapshot goes only once the new one is on disk
            if let Some(previous) = self.registry.register(sensor_id, reading.sensor_name()) {
                self.drop_stale_snapshot(sensor_id, &previous);
            }

            match self.durable.append(&record) {
                Ok(true) => self.log.write(format!(
                    "Created durable log {}",
                    self.durable.current_path().display()
                )),
                Ok(false) => {}
                Err(e) => {
                    self.log.warn(format!(
                        "Failed to append reading for sensor {} to {}: {}",
                        sensor_id,
                        self.durable.current_path().display(),
                        e
                    ));
                    return Err(e);
                }
            }

            reading
        };

        self.notify_listeners(&reading);

        let total = self.stored_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.write(format!(
            "Successfully stored temperature data: {}",
            serde_json::to_string(&reading)?
        ));
        self.log.write(format!("Total stored readings: {}", total));

        Ok(reading)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Latest reading for a sensor (memory only)
    pub fn current(&self, sensor_id: i32) -> Option<Reading> {
        self.current.read().get(&sensor_id).cloned()
    }

    /// Every stored reading for a sensor, in insertion order
    ///
    /// Re-reads the durable logs on each call. A log that fails to decode is
    /// quarantined and contributes nothing.
    pub fn history(&self, sensor_id: i32) -> Result<Vec<Reading>> {
        let mut readings = Vec::new();
        for file in self.discover_log_files()? {
            readings.extend(
                self.read_log_file(&file.path)?
                    .into_iter()
                    .filter(|reading| reading.sensor_id() == sensor_id),
            );
        }
        Ok(readings)
    }

    /// Stored readings for a sensor with `from <= timestamp <= to`
    pub fn history_range(&self, sensor_id: i32, from: i64, to: i64) -> Result<Vec<Reading>> {
        let mut readings = self.history(sensor_id)?;
        readings.retain(|reading| (from..=to).contains(&reading.timestamp()));
        Ok(readings)
    }

    /// Known sensors, ordered by id
    pub fn sensors(&self) -> BTreeMap<i32, String> {
        self.registry.to_map()
    }

    /// Total readings in the durable logs
    pub fn stored_count(&self) -> u64 {
        self.stored_count.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Register a "reading stored" observer
    pub fn add_listener<L>(&self, listener: L) -> ListenerId
    where
        L: ReadingListener + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Unregister an observer. Returns false if the id was unknown.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn log(&self) -> &Arc<OperationalLog> {
        &self.log
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    /// Path of the durable log new readings are appended to
    pub fn current_log_path(&self) -> &Path {
        self.durable.current_path()
    }

    /// Snapshot file path for a sensor
    pub fn snapshot_path(&self, sensor_id: i32, sensor_name: &str) -> std::path::PathBuf {
        self.snapshots.path(sensor_id, sensor_name)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn load_snapshot(&self, sensor_id: i32, sensor_name: &str) -> Option<Reading> {
        self.log.write(format!(
            "Reading stored temperature for sensor with ID: {}",
            sensor_id
        ));

        match self.snapshots.load(sensor_id, sensor_name) {
            Ok(Some(record)) => {
                let mut reading = record.into_reading(sensor_id, sensor_name);
                if reading.sensor_name() != sensor_name {
                    reading = self.adopt_stored_name(reading, sensor_name);
                }
                self.registry.register(sensor_id, reading.sensor_name());
                self.log.write("Successfully read stored temperature!");
                Some(reading)
            }
            Ok(None) => {
                self.log.write("No stored temperature found.");
                None
            }
            Err(e) => {
                self.log.warn(format!(
                    "Error while reading stored temperature for sensor {}: {}",
                    sensor_id, e
                ));
                None
            }
        }
    }

    /// Move a snapshot whose body names the sensor differently from its
    /// filename, so exactly one file per sensor id remains
    ///
    /// Falls back to the filename's name if the stored one is unusable or
    /// the move fails.
    fn adopt_stored_name(&self, reading: Reading, file_name_name: &str) -> Reading {
        let sensor_id = reading.sensor_id();
        let fallback = Reading::new(
            sensor_id,
            file_name_name,
            reading.temperature(),
            reading.timestamp(),
        );

        if let Err(e) = validate_sensor_name(sensor_id, reading.sensor_name()) {
            self.log.warn(format!(
                "Ignoring stored name of sensor {}: {}",
                sensor_id, e
            ));
            return fallback;
        }

        match self.snapshots.write(&reading) {
            Ok(_) => {
                self.drop_stale_snapshot(sensor_id, file_name_name);
                reading
            }
            Err(e) => {
                self.log.warn(format!(
                    "Failed to move snapshot of sensor {} to name '{}': {}",
                    sensor_id,
                    reading.sensor_name(),
                    e
                ));
                fallback
            }
        }
    }

    /// Remove the snapshot written under a sensor's old name
    fn drop_stale_snapshot(&self, sensor_id: i32, previous_name: &str) {
        match self.snapshots.remove(sensor_id, previous_name) {
            Ok(true) => self.log.write(format!(
                "Sensor {} renamed from '{}'; removed its old snapshot.",
                sensor_id, previous_name
            )),
            Ok(false) => {}
            Err(e) => self.log.warn(format!(
                "Failed to remove old snapshot of sensor {} ('{}'): {}",
                sensor_id, previous_name, e
            )),
        }
    }

    fn latest_snapshot_timestamp(&self) -> i64 {
        self.current
            .read()
            .values()
            .map(Reading::timestamp)
            .max()
            .unwrap_or(0)
    }

    fn discover_log_files(&self) -> Result<Vec<LogFile>> {
        self.durable.discover().map_err(|e| {
            self.log.warn(format!(
                "Error while listing durable logs in {}: {}",
                self.durable.dir().display(),
                e
            ));
            e
        })
    }

    /// Decode one durable log, quarantining it on a format error
    ///
    /// The unlocked decode may observe a record that is still being
    /// appended, so a format error is confirmed under `write_lock` before
    /// the file is moved aside.
    fn read_log_file(&self, path: &Path) -> Result<Vec<Reading>> {
        self.log.write("Reading stored readings from disk...");

        match self.decode_log_file(path) {
            Err(StsError::Format(_)) => {}
            other => return self.finish_log_read(path, other),
        }

        let _guard = self.write_lock.lock();
        match self.decode_log_file(path) {
            Err(StsError::Format(reason)) => {
                self.log.warn(format!(
                    "Error while reading stored temperature readings from path: {}, reason: {}. Moving file to corrupt files.",
                    path.display(),
                    reason
                ));
                match self.durable.quarantine(path) {
                    Ok(target) => self.log.warn(format!(
                        "Quarantined {} as {}",
                        path.display(),
                        target.display()
                    )),
                    Err(e) => self.log.warn(format!(
                        "Error while moving file {}: {}",
                        path.display(),
                        e
                    )),
                }
                Ok(Vec::new())
            }
            other => self.finish_log_read(path, other),
        }
    }

    fn finish_log_read(&self, path: &Path, result: Result<Vec<Reading>>) -> Result<Vec<Reading>> {
        match result {
            Ok(readings) => {
                self.log.write(format!(
                    "Successfully decoded {} temperature reading(s) from {}",
                    readings.len(),
                    path.display()
                ));
                Ok(readings)
            }
            // Quarantined by a concurrent reader since discovery
            Err(StsError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => {
                self.log.warn(format!(
                    "Error while reading {}: {}",
                    path.display(),
                    e
                ));
                Err(e)
            }
        }
    }

    fn decode_log_file(&self, path: &Path) -> Result<Vec<Reading>> {
        let bytes = fs::read(path)?;
        format::decode(&self.registry, &bytes)
    }

    fn notify_listeners(&self, reading: &Reading) {
        let listeners: Vec<(ListenerId, Arc<dyn ReadingListener>)> = self
            .listeners
            .read()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        for (id, listener) in listeners {
            match panic::catch_unwind(AssertUnwindSafe(|| listener.on_reading_stored(reading))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => self
                    .log
                    .warn(format!("Listener {} failed: {}", id, e)),
                Err(_) => self.log.warn(format!("Listener {} panicked", id)),
            }
        }
    }
}
