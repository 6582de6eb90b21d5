//! Dashboard sessions
//!
//! Subscriber handles are owned by the transport layer. The operational log
//! only ever sees them through `Weak` references held in a `SessionSet`.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

/// Stable identity of a subscriber handle
pub type SubscriberId = u64;

/// A connected dashboard viewer that receives operational log lines
pub trait LogSubscriber: Send + Sync {
    /// Identity used for "already caught up" bookkeeping
    fn id(&self) -> SubscriberId;

    /// Whether the underlying connection is still open
    fn is_open(&self) -> bool;

    /// Push one formatted line. Fire-and-forget: delivery failures are the
    /// transport's concern. Must not call back into the operational log.
    fn send(&self, line: &str);
}

/// Build the dashboard message carrying one operational log line
pub fn log_envelope(line: &str) -> String {
    serde_json::json!({ "log": line }).to_string()
}

/// The transport's set of connected sessions
///
/// Holds `Weak` handles only; dropping the last `Arc` on the transport side
/// is enough to make a session inactive.
#[derive(Default)]
pub struct SessionSet {
    sessions: RwLock<HashMap<SubscriberId, Weak<dyn LogSubscriber>>>,
}

impl SessionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session (on connect)
    pub fn insert(&self, session: &Arc<dyn LogSubscriber>) {
        self.sessions
            .write()
            .insert(session.id(), Arc::downgrade(session));
    }

    /// Remove a session (on close). Returns true if it was present.
    pub fn remove(&self, id: SubscriberId) -> bool {
        self.sessions.write().remove(&id).is_some()
    }

    /// Liveness predicate used by reconciliation
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.sessions
            .read()
            .get(&id)
            .and_then(Weak::upgrade)
            .map(|session| session.is_open())
            .unwrap_or(false)
    }

    /// All sessions that are still alive and open
    pub fn live(&self) -> Vec<Arc<dyn LogSubscriber>> {
        self.sessions
            .read()
            .values()
            .filter_map(Weak::upgrade)
            .filter(|session| session.is_open())
            .collect()
    }

    /// Drop entries whose handle has been released. Returns how many.
    pub fn prune(&self) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.strong_count() > 0);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
