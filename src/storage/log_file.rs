//! Durable Log
//!
//! Append-only STS log files in the long-term storage directory, and
//! quarantine of files that fail to decode.
//!
//! ## Layout
//! ```text
//! {lts_dir}/
//!   ├── 1_stored_readings.sts     (legacy v1, read-only)
//!   ├── 2_stored_readings.sts     (current version, appended to)
//!   └── corrupt/
//!       └── {unix_millis}_2_stored_readings.sts
//! ```

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::Result;
use crate::format::{self, FormatVersion, CURRENT_VERSION};

/// Suffix shared by every durable log file
pub const LOG_FILE_SUFFIX: &str = "stored_readings.sts";

/// Subdirectory receiving quarantined log files
pub const CORRUPT_DIR: &str = "corrupt";

/// A durable log file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,

    /// Version named by the filename prefix, if recognised
    pub version: Option<FormatVersion>,
}

/// Filename of the durable log for a format version
pub fn log_file_name(version: FormatVersion) -> String {
    format!("{}_{}", version.as_byte(), LOG_FILE_SUFFIX)
}

/// Decode a log file without touching it; returns its record count
pub fn verify_log_file(path: &Path) -> Result<usize> {
    let bytes = fs::read(path)?;
    let readings = format::decode(&BTreeMap::<i32, String>::new(), &bytes)?;
    Ok(readings.len())
}

/// Owner of the long-term storage directory
///
/// Not synchronized on its own: the engine serializes `append` and
/// `quarantine` under its write lock.
pub struct DurableLog {
    dir: PathBuf,
    current_path: PathBuf,
}

impl DurableLog {
    /// Open (and create if needed) the long-term storage directory
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            current_path: dir.join(log_file_name(CURRENT_VERSION)),
        })
    }

    /// Append one encoded record to the current-version log
    ///
    /// The header is written first if and only if the file is empty.
    /// Returns true if the header was written by this call.
    pub fn append(&self, record: &[u8]) -> Result<bool> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.current_path)?;

        let needs_header = file.metadata()?.len() == 0;

        // Header and record go out in one write
        let mut bytes = Vec::with_capacity(format::HEADER_SIZE + record.len());
        if needs_header {
            bytes.extend_from_slice(&format::encode_header(CURRENT_VERSION));
        }
        bytes.extend_from_slice(record);

        file.write_all(&bytes)?;
        file.sync_data()?;

        Ok(needs_header)
    }

    /// All log files in the directory, oldest format version first
    pub fn discover(&self) -> Result<Vec<LogFile>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if !file_name.ends_with(LOG_FILE_SUFFIX) {
                continue;
            }

            files.push(LogFile {
                path: entry.path(),
                version: Self::parse_version(&file_name),
            });
        }

        // Unrecognised prefixes sort after every known version
        files.sort_by_key(|f| {
            (
                f.version.map(FormatVersion::as_byte).unwrap_or(u8::MAX),
                f.path.clone(),
            )
        });

        Ok(files)
    }

    /// Move a log file into `corrupt/` under a time-stamped name
    ///
    /// The move is a rename, so readers holding an open handle are not
    /// disturbed. Returns the new path.
    pub fn quarantine(&self, path: &Path) -> Result<PathBuf> {
        let corrupt_dir = self.corrupt_dir();
        fs::create_dir_all(&corrupt_dir)?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| LOG_FILE_SUFFIX.to_string());

        let stamp = Utc::now().timestamp_millis();
        let mut target = corrupt_dir.join(format!("{}_{}", stamp, file_name));
        let mut attempt = 1;
        while target.exists() {
            target = corrupt_dir.join(format!("{}_{}_{}", stamp, attempt, file_name));
            attempt += 1;
        }

        fs::rename(path, &target)?;
        Ok(target)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the log that new records are appended to
    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    pub fn corrupt_dir(&self) -> PathBuf {
        self.dir.join(CORRUPT_DIR)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// "2_stored_readings.sts" → Some(V2)
    fn parse_version(file_name: &str) -> Option<FormatVersion> {
        let prefix = file_name.strip_suffix(LOG_FILE_SUFFIX)?.strip_suffix('_')?;
        FormatVersion::from_byte(prefix.parse().ok()?)
    }
}
