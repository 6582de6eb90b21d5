//! Tests for the operational log
//!
//! These tests verify:
//! - Line formatting and bounded capacity
//! - Live broadcast to open sessions only
//! - Backlog replay exactly once per handle
//! - Reconciliation of inactive sessions (manual and threaded)
//! - Ordering under concurrent writers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use sts::oplog::{log_envelope, SubscriberId, LINE_TIME_FORMAT};
use sts::{LogSubscriber, OperationalLog, Reconciler, SessionSet};

// =============================================================================
// Test Subscriber
// =============================================================================

struct Recorder {
    id: SubscriberId,
    open: AtomicBool,
    lines: Mutex<Vec<String>>,
}

impl Recorder {
    fn new(id: SubscriberId) -> Arc<Self> {
        Arc::new(Self {
            id,
            open: AtomicBool::new(true),
            lines: Mutex::new(Vec::new()),
        })
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl LogSubscriber for Recorder {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

fn attach(sessions: &SessionSet, recorder: &Arc<Recorder>) {
    let handle: Arc<dyn LogSubscriber> = recorder.clone();
    sessions.insert(&handle);
}

// =============================================================================
// Formatting and Capacity Tests
// =============================================================================

#[test]
fn test_line_has_timestamp_prefix() {
    let log = OperationalLog::detached(10);

    log.write("hello");

    let line = &log.backlog()[0];
    let (stamp, message) = line.split_at(23);
    assert!(NaiveDateTime::parse_from_str(stamp, LINE_TIME_FORMAT).is_ok());
    assert_eq!(message, " hello");
}

#[test]
fn test_warn_lines_are_buffered() {
    let log = OperationalLog::detached(10);

    log.write("info");
    log.warn("careful");

    let backlog = log.backlog();
    assert_eq!(backlog.len(), 2);
    assert!(backlog[1].ends_with(" careful"));
}

#[test]
fn test_capacity_evicts_oldest() {
    let log = OperationalLog::detached(10_000);

    for i in 1..=10_001 {
        log.write(format!("line {}", i));
    }

    let backlog = log.backlog();
    assert_eq!(backlog.len(), 10_000);
    assert!(backlog[0].ends_with(" line 2"));
    assert!(backlog[9_999].ends_with(" line 10001"));
}

#[test]
fn test_zero_capacity_keeps_one_line() {
    let log = OperationalLog::detached(0);

    log.write("a");
    log.write("b");

    assert_eq!(log.capacity(), 1);
    assert_eq!(log.len(), 1);
    assert!(log.backlog()[0].ends_with(" b"));
}

// =============================================================================
// Broadcast Tests
// =============================================================================

#[test]
fn test_broadcast_reaches_open_sessions_only() {
    let sessions = Arc::new(SessionSet::new());
    let log = OperationalLog::new(100, Arc::clone(&sessions));

    let open = Recorder::new(1);
    let closed = Recorder::new(2);
    closed.close();
    let dropped = Recorder::new(3);
    attach(&sessions, &open);
    attach(&sessions, &closed);
    attach(&sessions, &dropped);
    drop(dropped);

    log.write("live");

    assert_eq!(open.lines().len(), 1);
    assert!(open.lines()[0].ends_with(" live"));
    assert!(closed.lines().is_empty());
}

#[test]
fn test_concurrent_writers_preserve_order() {
    let sessions = Arc::new(SessionSet::new());
    let log = Arc::new(OperationalLog::new(10_000, Arc::clone(&sessions)));
    let viewer = Recorder::new(1);
    attach(&sessions, &viewer);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for i in 0..100 {
                    log.write(format!("writer {} line {}", t, i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(viewer.lines().len(), 400);
    assert_eq!(viewer.lines(), log.backlog());
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_subscribe_replays_backlog_once() {
    let log = OperationalLog::detached(100);
    log.write("one");
    log.write("two");
    log.write("three");
    let viewer = Recorder::new(7);

    assert!(log.subscribe(viewer.as_ref()));
    assert_eq!(viewer.lines(), log.backlog());
    assert!(log.is_caught_up(7));

    assert!(!log.subscribe(viewer.as_ref()));
    assert_eq!(viewer.lines().len(), 3);
}

#[test]
fn test_subscribe_empty_backlog() {
    let log = OperationalLog::detached(100);
    let viewer = Recorder::new(1);

    assert!(log.subscribe(viewer.as_ref()));
    assert!(viewer.lines().is_empty());
}

#[test]
fn test_reconciled_handle_is_replayed_again() {
    let log = OperationalLog::detached(100);
    log.write("one");
    let viewer = Recorder::new(7);
    log.subscribe(viewer.as_ref());

    let removed = log.reconcile_with(|_| false);

    assert_eq!(removed, 1);
    assert!(!log.is_caught_up(7));
    assert!(log
        .backlog()
        .last()
        .unwrap()
        .ends_with("Removing 1 inactive sessions from the operational log."));

    // Second subscribe replays the whole (grown) backlog
    assert!(log.subscribe(viewer.as_ref()));
    assert_eq!(viewer.lines().len(), 1 + 2);
}

#[test]
fn test_reconcile_without_changes_is_silent() {
    let log = OperationalLog::detached(100);
    let viewer = Recorder::new(7);
    log.subscribe(viewer.as_ref());

    assert_eq!(log.reconcile_with(|_| true), 0);
    assert!(log.is_empty());
}

#[test]
fn test_reconcile_against_session_set() {
    let sessions = Arc::new(SessionSet::new());
    let log = OperationalLog::new(100, Arc::clone(&sessions));
    let stays = Recorder::new(1);
    let leaves = Recorder::new(2);
    let vanishes = Recorder::new(3);
    attach(&sessions, &stays);
    attach(&sessions, &leaves);
    attach(&sessions, &vanishes);
    log.subscribe(stays.as_ref());
    log.subscribe(leaves.as_ref());
    log.subscribe(vanishes.as_ref());

    leaves.close();
    drop(vanishes);
    let removed = log.reconcile();

    assert_eq!(removed, 2);
    assert!(log.is_caught_up(1));
    assert!(!log.is_caught_up(2));
    assert!(!log.is_caught_up(3));
    // Released handles are pruned from the set
    assert_eq!(sessions.len(), 2);
}

// =============================================================================
// Session Set Tests
// =============================================================================

#[test]
fn test_session_set_contains_and_remove() {
    let sessions = SessionSet::new();
    let viewer = Recorder::new(5);
    attach(&sessions, &viewer);

    assert!(sessions.contains(5));
    assert!(!sessions.contains(6));

    viewer.close();
    assert!(!sessions.contains(5));

    assert!(sessions.remove(5));
    assert!(!sessions.remove(5));
    assert!(sessions.is_empty());
}

#[test]
fn test_session_set_prune() {
    let sessions = SessionSet::new();
    let kept = Recorder::new(1);
    let released = Recorder::new(2);
    attach(&sessions, &kept);
    attach(&sessions, &released);
    drop(released);

    assert_eq!(sessions.live().len(), 1);
    assert_eq!(sessions.prune(), 1);
    assert_eq!(sessions.len(), 1);
}

#[test]
fn test_log_envelope() {
    let envelope = log_envelope("12-01-2024 10:00:00.000 said \"hi\"");

    let value: serde_json::Value = serde_json::from_str(&envelope).unwrap();
    assert_eq!(
        value,
        serde_json::json!({ "log": "12-01-2024 10:00:00.000 said \"hi\"" })
    );
}

// =============================================================================
// Reconciler Thread Tests
// =============================================================================

#[test]
fn test_reconciler_purges_departed_sessions() {
    let sessions = Arc::new(SessionSet::new());
    let log = Arc::new(OperationalLog::new(100, Arc::clone(&sessions)));
    let viewer = Recorder::new(9);
    attach(&sessions, &viewer);
    log.subscribe(viewer.as_ref());

    let handle = Reconciler::spawn(Arc::clone(&log), Duration::from_millis(10)).unwrap();
    assert!(handle.is_running());

    sessions.remove(9);

    let deadline = Instant::now() + Duration::from_secs(5);
    while log.is_caught_up(9) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }

    assert!(!log.is_caught_up(9));
    handle.shutdown();
}

#[test]
fn test_reconciler_stops_on_drop() {
    let log = Arc::new(OperationalLog::detached(100));

    let handle = Reconciler::spawn(Arc::clone(&log), Duration::from_secs(60)).unwrap();
    drop(handle);

    // The thread has been joined, so the log is only held here
    assert_eq!(Arc::strong_count(&log), 1);
}
