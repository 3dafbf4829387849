// src/watch/notifier.rs

//! Filesystem notification source built on `notify`.
//!
//! The blocking `notify` callback forwards into two unbounded tokio
//! channels: one for events (flattened to one [`FsEvent`] per path) and one
//! for watcher errors. Tests build the same [`EventSource`] from plain
//! channels with [`EventSource::from_channels`].

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::info;

use crate::errors::Result;

/// Operation kind of a filesystem event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOp {
    Create,
    Write,
    Remove,
    Rename,
    Metadata,
    Other,
}

impl EventOp {
    /// Only writes and creates can carry new content.
    pub fn is_write_or_create(self) -> bool {
        matches!(self, EventOp::Write | EventOp::Create)
    }
}

impl From<&EventKind> for EventOp {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => EventOp::Create,
            EventKind::Modify(ModifyKind::Data(_)) => EventOp::Write,
            EventKind::Modify(ModifyKind::Metadata(_)) => EventOp::Metadata,
            // An editor renaming a temp file onto the target looks like a create.
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => EventOp::Create,
            EventKind::Modify(ModifyKind::Name(_)) => EventOp::Rename,
            EventKind::Modify(_) => EventOp::Write,
            EventKind::Remove(_) => EventOp::Remove,
            _ => EventOp::Other,
        }
    }
}

/// A single `{path, operation}` notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub op: EventOp,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, op: EventOp) -> Self {
        Self {
            path: path.into(),
            op,
        }
    }
}

/// Event and error streams for one watched directory.
///
/// Holds the underlying `notify` watcher (if any); dropping the source stops
/// watching.
pub struct EventSource {
    pub events: mpsc::UnboundedReceiver<FsEvent>,
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
    _watcher: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("native", &self._watcher.is_some())
            .finish_non_exhaustive()
    }
}

impl EventSource {
    /// Build a source from caller-owned channels (no OS watcher).
    pub fn from_channels(
        events: mpsc::UnboundedReceiver<FsEvent>,
        errors: mpsc::UnboundedReceiver<notify::Error>,
    ) -> Self {
        Self {
            events,
            errors,
            _watcher: None,
        }
    }
}

/// Start watching `dir` (non-recursively).
///
/// Fails if the OS watcher cannot be created or the directory cannot be
/// registered.
pub fn spawn_notifier(dir: &Path) -> Result<EventSource> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<FsEvent>();
    let (error_tx, error_rx) = mpsc::unbounded_channel::<notify::Error>();

    // Called synchronously on notify's thread.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let op = EventOp::from(&event.kind);
                for path in event.paths {
                    // Receiver gone means the watch loop stopped.
                    let _ = event_tx.send(FsEvent { path, op });
                }
            }
            Err(err) => {
                let _ = error_tx.send(err);
            }
        },
        Config::default(),
    )?;

    watcher.watch(dir, RecursiveMode::NonRecursive)?;

    info!("file watcher started on {:?}", dir);

    Ok(EventSource {
        events: event_rx,
        errors: error_rx,
        _watcher: Some(watcher),
    })
}
