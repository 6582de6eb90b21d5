//! Session reconciliation task
//!
//! The only background activity of the core: a thread that periodically
//! purges caught-up markers of sessions that went away.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Sender};

use super::OperationalLog;
use crate::error::Result;

/// Spawns the periodic reconciliation thread
pub struct Reconciler;

impl Reconciler {
    /// Start reconciling `log` against its session set every `interval`
    pub fn spawn(log: Arc<OperationalLog>, interval: Duration) -> Result<ReconcilerHandle> {
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
        let ticker = channel::tick(interval);

        log.write(format!(
            "Reconciling operational log sessions every {} ms.",
            interval.as_millis()
        ));

        let thread = std::thread::Builder::new()
            .name("sts-reconciler".to_string())
            .spawn(move || loop {
                channel::select! {
                    recv(ticker) -> _ => {
                        log.reconcile();
                    }
                    // Fires on an explicit signal or when the handle is dropped
                    recv(shutdown_rx) -> _ => break,
                }
            })?;

        Ok(ReconcilerHandle {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }
}

/// Owner of the reconciliation thread; stops it on `shutdown` or drop
pub struct ReconcilerHandle {
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// Stop the thread and wait for it to exit
    pub fn shutdown(mut self) {
        self.stop();
    }

    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .map(|thread| !thread.is_finished())
            .unwrap_or(false)
    }

    fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.try_send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("reconciler thread panicked");
            }
        }
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
