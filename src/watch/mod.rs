// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Hashing the target to tell real content changes from no-op saves.
//! - Debouncing bursts of filesystem events into one change-check.
//! - Wiring up the OS watcher (`notify`) on the target's directory.
//! - The watch loop that ties these to the executor.

pub mod debounce;
pub mod hash;
pub mod notifier;
pub mod path_utils;
pub mod watcher;

pub use debounce::{DebounceCoordinator, DebounceHandle};
pub use hash::{compute_file_digest, digest_bytes, Digest, HashState};
pub use notifier::{spawn_notifier, EventOp, EventSource, FsEvent};
pub use watcher::{ChangeCheck, Dispatch, WatchState, WatchTarget, Watcher};
