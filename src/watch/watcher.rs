// src/watch/watcher.rs

//! The watch loop.
//!
//! [`Watcher`] owns all mutable watch state (digest map, execution slot via
//! its [`Executor`]) and multiplexes three inputs on a single task:
//! external cancellation, filesystem events for the target, and settle
//! triggers from the [`DebounceCoordinator`]. Executions run on their own
//! tasks and never block the loop.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::anyhow;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::rules::extension_of;
use crate::config::RunnerConfig;
use crate::errors::{GowError, Result};
use crate::exec::{Commander, ExecutionOutcome, Executor};
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::debounce::{DebounceCoordinator, DebounceHandle};
use crate::watch::hash::{compute_file_digest, Digest, HashState};
use crate::watch::notifier::{spawn_notifier, EventSource, FsEvent};
use crate::watch::path_utils::{clean, is_same_path};

/// The single file under supervision.
///
/// `path` is what the user typed and is what gets substituted into command
/// arguments; `absolute` is used to match filesystem events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    path: PathBuf,
    absolute: PathBuf,
}

impl WatchTarget {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let absolute = if path.is_absolute() {
            clean(&path)
        } else {
            clean(&std::env::current_dir()?.join(&path))
        };
        if absolute.file_name().is_none() {
            return Err(GowError::ConfigError(format!(
                "target {:?} does not name a file",
                path
            )));
        }
        Ok(Self { path, absolute })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// Directory that gets watched, so that atomic-save sequences
    /// (write temp, rename over target) are observable.
    pub fn parent_dir(&self) -> &Path {
        self.absolute.parent().unwrap_or_else(|| Path::new("/"))
    }
}

/// Lifecycle of the watch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Initializing,
    Watching,
    Stopping,
    Stopped,
}

/// Result of asking the executor to run the target.
#[derive(Debug)]
pub enum Dispatch {
    Started(JoinHandle<ExecutionOutcome>),
    /// No rule for the target's extension; nothing was run.
    NoRule { extension: String },
}

/// Result of one debounced change-check.
#[derive(Debug)]
pub enum ChangeCheck {
    /// Content differs from the last digest; a dispatch was attempted.
    Changed(Dispatch),
    Unchanged,
    /// The target could not be read; the cycle was skipped.
    Unreadable,
}

pub struct Watcher<C: Commander + ?Sized> {
    target: WatchTarget,
    config: RunnerConfig,
    delay: Duration,
    fs: Arc<dyn FileSystem>,
    hashes: Mutex<HashState>,
    executor: Executor<C>,
    state: Mutex<WatchState>,
}

impl<C: Commander + ?Sized> std::fmt::Debug for Watcher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("target", &self.target)
            .field("delay", &self.delay)
            .field("state", &self.state())
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl<C: Commander + ?Sized> Watcher<C> {
    pub fn new(
        commander: Arc<C>,
        config: RunnerConfig,
        target: WatchTarget,
        delay: Duration,
    ) -> Self {
        let executor = Executor::new(commander, config.default_timeout());
        Self {
            target,
            config,
            delay,
            fs: Arc::new(RealFileSystem),
            hashes: Mutex::new(HashState::new()),
            executor,
            state: Mutex::new(WatchState::Initializing),
        }
    }

    /// Read file contents through `fs` instead of the real filesystem.
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    pub fn state(&self) -> WatchState {
        *lock(&self.state)
    }

    /// Last recorded digest of the target.
    pub fn recorded_digest(&self) -> Option<Digest> {
        lock(&self.hashes).get(self.target.absolute()).cloned()
    }

    /// Watch the target's parent directory until `cancel` fires.
    ///
    /// Returns an error only if the OS watcher cannot be set up.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        self.set_state(WatchState::Initializing);
        let source = spawn_notifier(self.target.parent_dir())?;
        self.run_with_source(source, cancel).await
    }

    /// Run the loop over an already-established event source.
    pub async fn run_with_source(
        &self,
        mut source: EventSource,
        cancel: CancellationToken,
    ) -> Result<()> {
        self.set_state(WatchState::Initializing);
        self.seed_digest().await;

        let (debounce, mut settled_rx, debounce_task) = DebounceCoordinator::spawn(self.delay);

        // The first run always happens, whatever the digest history.
        let _initial = self.execute();

        self.set_state(WatchState::Watching);
        info!(file = %self.target.path().display(), "watching for changes");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("cancellation requested; stopping watch loop");
                    break;
                }
                event = source.events.recv() => match event {
                    Some(event) => self.handle_event(&event, &debounce),
                    None => {
                        info!("filesystem event stream closed; stopping watch loop");
                        break;
                    }
                },
                err = source.errors.recv() => match err {
                    Some(err) => {
                        eprintln!("[WARN] File watch error: {err}");
                        warn!(error = %err, "file watcher reported an error");
                    }
                    None => {
                        info!("file watcher error stream closed; stopping watch loop");
                        break;
                    }
                },
                Some(()) = settled_rx.recv() => {
                    let _ = self.check_for_changes().await;
                }
            }
        }

        self.set_state(WatchState::Stopping);
        // In-flight executions are left to their own contexts.
        debounce_task.abort();
        self.set_state(WatchState::Stopped);
        Ok(())
    }

    /// Forward write/create events for the target to the debouncer.
    fn handle_event(&self, event: &FsEvent, debounce: &DebounceHandle) {
        if !is_same_path(&event.path, self.target.absolute()) {
            trace!(path = ?event.path, "ignoring event for other file");
            return;
        }
        if event.op.is_write_or_create() {
            debug!(op = ?event.op, "change event for target");
            debounce.notify();
        } else {
            debug!(op = ?event.op, "ignoring non-write event for target");
        }
    }

    /// Re-hash the target and dispatch if the content really changed.
    pub async fn check_for_changes(&self) -> ChangeCheck {
        debug!(file = %self.target.path().display(), "checking target for changes");

        let digest = match self.current_digest().await {
            Ok(digest) => digest,
            Err(err) => {
                println!("[ERR ] Could not hash file: {err:#}");
                warn!(error = %err, "hashing target failed; skipping this cycle");
                return ChangeCheck::Unreadable;
            }
        };

        let changed = lock(&self.hashes).compare_and_swap(self.target.absolute(), digest);

        // Dispatch outside the lock.
        if changed {
            println!(
                "[DONE] File modified. Running {}...",
                self.target.path().display()
            );
            ChangeCheck::Changed(self.execute())
        } else {
            debug!("file saved but content unchanged; ignoring");
            ChangeCheck::Unchanged
        }
    }

    /// Look up the target's rule and hand it to the executor.
    pub fn execute(&self) -> Dispatch {
        match self.config.rules().find_for_path(self.target.path()) {
            Some(rule) => Dispatch::Started(self.executor.dispatch(rule, self.target.path())),
            None => {
                let extension = extension_of(self.target.path());
                println!("[WARN] No rule found for extension {extension}");
                warn!(extension = %extension, "no rule matches target extension");
                Dispatch::NoRule { extension }
            }
        }
    }

    async fn seed_digest(&self) {
        match self.current_digest().await {
            Ok(digest) => lock(&self.hashes).record(self.target.absolute(), digest),
            Err(err) => warn!(error = %err, "could not hash target at startup"),
        }
    }

    async fn current_digest(&self) -> anyhow::Result<Digest> {
        let fs = Arc::clone(&self.fs);
        let path = self.target.absolute().to_path_buf();
        tokio::task::spawn_blocking(move || compute_file_digest(fs.as_ref(), &path))
            .await
            .map_err(|e| anyhow!("hashing task failed: {e}"))?
    }

    fn set_state(&self, state: WatchState) {
        let mut current = lock(&self.state);
        if *current != state {
            trace!(from = ?*current, to = ?state, "watch state change");
            *current = state;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
