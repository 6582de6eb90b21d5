//! Reading listeners
//!
//! Observers notified after every successful store (e.g. a WebSocket
//! broadcaster pushing live values to dashboards).

use crate::error::Result;
use crate::format::Reading;

/// Handle returned by `StorageEngine::add_listener`
pub type ListenerId = u64;

/// Receives "reading stored" events
///
/// Called synchronously on the storing thread. Errors and panics are
/// contained by the engine and logged; they never undo the store.
pub trait ReadingListener: Send + Sync {
    fn on_reading_stored(&self, reading: &Reading) -> Result<()>;
}

impl<F> ReadingListener for F
where
    F: Fn(&Reading) -> Result<()> + Send + Sync,
{
    fn on_reading_stored(&self, reading: &Reading) -> Result<()> {
        self(reading)
    }
}
