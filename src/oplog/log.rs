//! Operational log
//!
//! Bounded FIFO of formatted log lines with live fan-out and backlog replay.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;
use tracing::Level;

use super::session::{LogSubscriber, SessionSet, SubscriberId};
use crate::config::{Config, DEFAULT_LOG_CAPACITY};

/// Timestamp prefix of every line: `dd-MM-yyyy HH:mm:ss.SSS`
pub const LINE_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S%.3f";

/// Bounded, thread-safe operational log
///
/// ## Concurrency:
/// - `state`: one Mutex is the single serialization point for formatting,
///   broadcast, buffer append, and backlog replay. Every subscriber therefore
///   observes lines in the order they were buffered.
/// - `sessions`: transport-owned set, read under `state` (lock order is
///   always state → sessions).
pub struct OperationalLog {
    /// Max lines kept in the backlog
    capacity: usize,

    /// Connected dashboard sessions (weak handles)
    sessions: Arc<SessionSet>,

    state: Mutex<LogState>,
}

struct LogState {
    /// Backlog, oldest first
    lines: VecDeque<String>,

    /// Handles that already received the full backlog
    caught_up: HashSet<SubscriberId>,
}

impl OperationalLog {
    /// Create a log with the given capacity, broadcasting to `sessions`
    pub fn new(capacity: usize, sessions: Arc<SessionSet>) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            sessions,
            state: Mutex::new(LogState {
                lines: VecDeque::with_capacity(capacity.min(DEFAULT_LOG_CAPACITY)),
                caught_up: HashSet::new(),
            }),
        }
    }

    pub fn from_config(config: &Config, sessions: Arc<SessionSet>) -> Self {
        Self::new(config.log_capacity, sessions)
    }

    /// A log with no connected sessions (tools and tests)
    pub fn detached(capacity: usize) -> Self {
        Self::new(capacity, Arc::new(SessionSet::new()))
    }

    /// Record an informational line
    pub fn write(&self, message: impl AsRef<str>) {
        self.emit(Level::INFO, message.as_ref());
    }

    /// Record a warning line
    pub fn warn(&self, message: impl AsRef<str>) {
        self.emit(Level::WARN, message.as_ref());
    }

    fn emit(&self, level: Level, message: &str) {
        let mut state = self.state.lock();

        let line = format!("{} {}", Local::now().format(LINE_TIME_FORMAT), message);

        if level == Level::WARN {
            tracing::warn!(target: "sts::oplog", "{}", message);
        } else {
            tracing::info!(target: "sts::oplog", "{}", message);
        }

        for session in self.sessions.live() {
            session.send(&line);
        }

        state.lines.push_back(line);
        while state.lines.len() > self.capacity {
            state.lines.pop_front();
        }
    }

    /// Replay the backlog to a handle that has not received it yet
    ///
    /// Returns true if the backlog was replayed, false if the handle was
    /// already caught up.
    pub fn subscribe(&self, subscriber: &dyn LogSubscriber) -> bool {
        let mut state = self.state.lock();
        let id = subscriber.id();

        if state.caught_up.contains(&id) {
            return false;
        }

        for line in &state.lines {
            subscriber.send(line);
        }
        state.caught_up.insert(id);

        true
    }

    /// Forget caught-up markers for handles that are no longer live
    ///
    /// A handle forgotten here gets the backlog again on its next
    /// `subscribe`. Returns the number of markers removed.
    pub fn reconcile_with<F>(&self, is_live: F) -> usize
    where
        F: Fn(SubscriberId) -> bool,
    {
        let removed = {
            let mut state = self.state.lock();
            let before = state.caught_up.len();
            state.caught_up.retain(|id| is_live(*id));
            before - state.caught_up.len()
        };

        if removed > 0 {
            self.write(format!(
                "Removing {} inactive sessions from the operational log.",
                removed
            ));
        }

        removed
    }

    /// Reconcile against the attached session set
    pub fn reconcile(&self) -> usize {
        let sessions = Arc::clone(&self.sessions);
        let removed = self.reconcile_with(|id| sessions.contains(id));
        sessions.prune();
        removed
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Copy of the current backlog, oldest first
    pub fn backlog(&self) -> Vec<String> {
        self.state.lock().lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_caught_up(&self, id: SubscriberId) -> bool {
        self.state.lock().caught_up.contains(&id)
    }

    pub fn sessions(&self) -> &Arc<SessionSet> {
        &self.sessions
    }
}
