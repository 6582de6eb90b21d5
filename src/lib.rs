//! # STS
//!
//! Sensor temperature store:
//! - Versioned, fixed-width binary durable log of every reading
//! - Per-sensor JSON snapshots for O(1) current-value queries
//! - Quarantine of corrupt logs instead of deletion or repair
//! - Bounded operational log replayed to late-joining dashboards
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          Transport (HTTP ingestion / WebSocket dashboards)   │
//! │                      (not part of this crate)                │
//! └───────────────┬─────────────────────────────┬───────────────┘
//!                 │ store / current / history   │ write / subscribe
//! ┌───────────────▼──────────────┐      ┌───────▼───────────────┐
//! │        StorageEngine         │─────▶│    OperationalLog     │
//! │   (single writer, RwLock     │ logs │ (ring buffer, replay, │
//! │    snapshot map, listeners)  │      │  reconciler thread)   │
//! └───────┬───────────┬──────────┘      └───────────────────────┘
//!         │           │
//!         ▼           ▼
//!  ┌────────────┐ ┌────────────┐   ┌────────────────┐
//!  │ Snapshots  │ │ DurableLog │◀──│  format codec  │
//!  │  (JSON)    │ │  (.sts)    │   │  + registry    │
//!  └────────────┘ └────────────┘   └────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod format;
pub mod registry;
pub mod storage;
pub mod oplog;
pub mod listener;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StsError};
pub use config::Config;
pub use engine::{ReadingPayload, StorageEngine};
pub use format::{Reading, SENTINEL_SENSOR_ID};
pub use listener::{ListenerId, ReadingListener};
pub use oplog::{LogSubscriber, OperationalLog, Reconciler, SessionSet};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of STS
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
