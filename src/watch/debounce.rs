// src/watch/debounce.rs

//! Debounce coordinator.
//!
//! Raw filesystem events call [`DebounceHandle::notify`], which drops a
//! marker into a single-slot channel (a full slot means the event is
//! coalesced). A dedicated settle task waits for the quiet period to pass
//! with no further markers, then emits exactly one settle trigger. Every
//! marker received while waiting restarts the quiet period, so a burst
//! yields one change-check timed from its *last* event.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Cheap, cloneable handle for signalling qualifying events.
#[derive(Debug, Clone)]
pub struct DebounceHandle {
    pending_tx: mpsc::Sender<()>,
}

impl DebounceHandle {
    /// Mark a change as pending. Never blocks.
    ///
    /// Returns `false` if a marker was already pending (coalesced) or the
    /// coordinator has stopped.
    pub fn notify(&self) -> bool {
        match self.pending_tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                trace!("debounce marker already pending; coalesced");
                false
            }
            Err(TrySendError::Closed(())) => false,
        }
    }
}

/// Owns the quiet-period wait. Run it with [`DebounceCoordinator::run`].
#[derive(Debug)]
pub struct DebounceCoordinator {
    delay: Duration,
    pending_rx: mpsc::Receiver<()>,
    settled_tx: mpsc::Sender<()>,
}

impl DebounceCoordinator {
    /// Create a coordinator, the handle used to notify it, and the stream of
    /// settle triggers it produces.
    pub fn new(delay: Duration) -> (Self, DebounceHandle, mpsc::Receiver<()>) {
        let (pending_tx, pending_rx) = mpsc::channel::<()>(1);
        let (settled_tx, settled_rx) = mpsc::channel::<()>(1);
        let coordinator = Self {
            delay,
            pending_rx,
            settled_tx,
        };
        (coordinator, DebounceHandle { pending_tx }, settled_rx)
    }

    /// Spawn the settle task on the current runtime.
    pub fn spawn(delay: Duration) -> (DebounceHandle, mpsc::Receiver<()>, JoinHandle<()>) {
        let (coordinator, handle, settled_rx) = Self::new(delay);
        let task = tokio::spawn(coordinator.run());
        (handle, settled_rx, task)
    }

    /// Settle loop. Ends when every [`DebounceHandle`] is dropped or the
    /// settle receiver is closed.
    pub async fn run(mut self) {
        while self.pending_rx.recv().await.is_some() {
            debug!(delay = ?self.delay, "change pending; waiting for quiet period");

            loop {
                tokio::select! {
                    marker = self.pending_rx.recv() => {
                        if marker.is_none() {
                            return;
                        }
                        trace!("new event during quiet period; restarting wait");
                    }
                    _ = tokio::time::sleep(self.delay) => break,
                }
            }

            match self.settled_tx.try_send(()) {
                Ok(()) => debug!("quiet period elapsed; change-check requested"),
                Err(TrySendError::Full(())) => {
                    debug!("change-check already queued; coalesced")
                }
                Err(TrySendError::Closed(())) => return,
            }
        }
        debug!("debounce coordinator finished");
    }
}
