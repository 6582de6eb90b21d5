//! Operational Log Module
//!
//! Human-readable diagnostics fanned out to dashboard viewers.
//!
//! ## Responsibilities
//! - Timestamp, emit (tracing) and buffer every line
//! - Push each line to all open sessions as it is written
//! - Replay the backlog once to each newly joined session
//! - Periodically forget sessions that disconnected, so a reconnecting
//!   handle is replayed the backlog again
//!
//! ## Data Structure Choice
//! A `VecDeque` ring behind one Mutex: bounded (oldest evicted first) and a
//! single append point, which gives every subscriber the same line order.

mod log;
mod reconciler;
mod session;

pub use log::{OperationalLog, LINE_TIME_FORMAT};
pub use reconciler::{Reconciler, ReconcilerHandle};
pub use session::{log_envelope, LogSubscriber, SessionSet, SubscriberId};
