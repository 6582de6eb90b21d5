//! Tests for SensorRegistry
//!
//! These tests verify:
//! - The snapshot filename convention (both directions)
//! - Directory scans, including malformed and unrelated files
//! - Idempotent registration and rename detection

use std::fs;

use sts::registry::{
    parse_snapshot_file_name, scan, snapshot_file_name, SensorRegistry, SnapshotFileName,
};
use sts::{OperationalLog, SENTINEL_SENSOR_ID};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn touch(dir: &TempDir, name: &str) {
    fs::write(dir.path().join(name), b"{}").unwrap();
}

// =============================================================================
// Filename Convention Tests
// =============================================================================

#[test]
fn test_snapshot_file_name_for_sensor() {
    assert_eq!(snapshot_file_name(7, "kitchen"), "7_kitchen_last_reading.json");
}

#[test]
fn test_snapshot_file_name_for_sentinel() {
    assert_eq!(snapshot_file_name(SENTINEL_SENSOR_ID, ""), "last_reading.json");
}

#[test]
fn test_parse_sensor_file_name() {
    assert_eq!(
        parse_snapshot_file_name("7_kitchen_last_reading.json"),
        SnapshotFileName::Sensor {
            id: 7,
            name: "kitchen".to_string()
        }
    );
}

#[test]
fn test_parse_name_with_underscores() {
    assert_eq!(
        parse_snapshot_file_name("3_living_room_last_reading.json"),
        SnapshotFileName::Sensor {
            id: 3,
            name: "living_room".to_string()
        }
    );
}

#[test]
fn test_parse_sentinel_file_names() {
    assert_eq!(
        parse_snapshot_file_name("last_reading.json"),
        SnapshotFileName::Sentinel
    );
    // No two-part id/name prefix
    assert_eq!(
        parse_snapshot_file_name("garage_last_reading.json"),
        SnapshotFileName::Sentinel
    );
}

#[test]
fn test_parse_malformed_id() {
    assert!(matches!(
        parse_snapshot_file_name("x7_kitchen_last_reading.json"),
        SnapshotFileName::Malformed(_)
    ));
}

#[test]
fn test_parse_unrelated_files() {
    assert_eq!(
        parse_snapshot_file_name("notes.txt"),
        SnapshotFileName::Unrelated
    );
    assert_eq!(
        parse_snapshot_file_name("7_kitchen_last_reading.tmp"),
        SnapshotFileName::Unrelated
    );
    assert_eq!(
        parse_snapshot_file_name("7_kitchenlast_reading.json"),
        SnapshotFileName::Unrelated
    );
}

#[test]
fn test_file_name_roundtrip() {
    let name = snapshot_file_name(12, "back_yard");
    assert_eq!(
        parse_snapshot_file_name(&name),
        SnapshotFileName::Sensor {
            id: 12,
            name: "back_yard".to_string()
        }
    );
}

// =============================================================================
// Scan Tests
// =============================================================================

#[test]
fn test_scan_discovers_sensors() {
    let dir = TempDir::new().unwrap();
    touch(&dir, "7_kitchen_last_reading.json");
    touch(&dir, "2_cellar_last_reading.json");
    touch(&dir, "last_reading.json");
    touch(&dir, "readme.md");
    let log = OperationalLog::detached(100);

    let sensors = scan(dir.path(), &log).unwrap();

    assert_eq!(sensors.len(), 3);
    assert_eq!(sensors[&7], "kitchen");
    assert_eq!(sensors[&2], "cellar");
    assert_eq!(sensors[&SENTINEL_SENSOR_ID], "");
}

#[test]
fn test_scan_skips_malformed_prefix_with_warning() {
    let dir = TempDir::new().unwrap();
    touch(&dir, "abc_kitchen_last_reading.json");
    touch(&dir, "5_porch_last_reading.json");
    let log = OperationalLog::detached(100);

    let sensors = scan(dir.path(), &log).unwrap();

    assert_eq!(sensors.len(), 1);
    assert_eq!(sensors[&5], "porch");
    assert!(log
        .backlog()
        .iter()
        .any(|line| line.contains("Failed to parse sensor ID")));
}

#[test]
fn test_scan_ignores_directories() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("9_dir_last_reading.json")).unwrap();
    let log = OperationalLog::detached(100);

    let sensors = scan(dir.path(), &log).unwrap();

    assert!(sensors.is_empty());
}

#[test]
fn test_scan_missing_directory_is_empty() {
    let dir = TempDir::new().unwrap();
    let log = OperationalLog::detached(100);

    let sensors = scan(&dir.path().join("missing"), &log).unwrap();

    assert!(sensors.is_empty());
}

#[test]
fn test_scan_listing_failure_is_logged() {
    let dir = TempDir::new().unwrap();
    touch(&dir, "not_a_dir");
    let log = OperationalLog::detached(100);

    let result = scan(&dir.path().join("not_a_dir"), &log);

    assert!(result.is_err());
    assert!(log
        .backlog()
        .iter()
        .any(|line| line.contains("Error while listing snapshot directory")));
}

#[test]
fn test_registry_from_scan() {
    let dir = TempDir::new().unwrap();
    touch(&dir, "4_shed_last_reading.json");
    let log = OperationalLog::detached(100);

    let registry = SensorRegistry::scan(dir.path(), &log).unwrap();

    assert_eq!(registry.name(4), Some("shed".to_string()));
    assert_eq!(registry.ids(), vec![4]);
}

// =============================================================================
// Registration Tests
// =============================================================================

#[test]
fn test_register_is_idempotent() {
    let registry = SensorRegistry::new();

    assert_eq!(registry.register(7, "kitchen"), None);
    assert_eq!(registry.register(7, "kitchen"), None);

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.name(7), Some("kitchen".to_string()));
}

#[test]
fn test_register_reports_rename() {
    let registry = SensorRegistry::new();
    registry.register(7, "kitchen");

    let previous = registry.register(7, "pantry");

    assert_eq!(previous, Some("kitchen".to_string()));
    assert_eq!(registry.name(7), Some("pantry".to_string()));
}

#[test]
fn test_register_sentinel_has_empty_name() {
    let registry = SensorRegistry::new();

    registry.register(SENTINEL_SENSOR_ID, "ignored");

    assert_eq!(registry.name(SENTINEL_SENSOR_ID), Some(String::new()));
}

#[test]
fn test_registry_ids_are_ordered() {
    let registry = SensorRegistry::new();
    registry.register(9, "c");
    registry.register(1, "a");
    registry.register(4, "b");

    assert_eq!(registry.ids(), vec![1, 4, 9]);
    assert!(registry.contains(4));
    assert!(!registry.contains(5));
}
