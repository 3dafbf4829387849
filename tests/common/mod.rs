#![allow(dead_code)]

pub use gow_test_utils::fake_commander::{FakeBehaviour, FakeCommander};
pub use gow_test_utils::{init_tracing, with_timeout};

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use gow::config::RunnerConfig;
use gow::watch::{EventOp, EventSource, FsEvent, WatchTarget, Watcher};

/// A watch loop running over hand-fed event channels and a fake runner.
pub struct Harness {
    pub dir: TempDir,
    pub target: PathBuf,
    pub commander: Arc<FakeCommander>,
    pub watcher: Arc<Watcher<FakeCommander>>,
    pub events: mpsc::UnboundedSender<FsEvent>,
    pub errors: mpsc::UnboundedSender<notify::Error>,
    pub cancel: CancellationToken,
    pub handle: JoinHandle<gow::errors::Result<()>>,
}

impl Harness {
    /// Create `file_name` with `content` in a temp dir and start watching it.
    pub fn start(
        file_name: &str,
        content: &str,
        config: RunnerConfig,
        delay: Duration,
        commander: Arc<FakeCommander>,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(file_name);
        std::fs::write(&target, content).unwrap();

        let watch_target = WatchTarget::new(&target).unwrap();
        let watcher = Arc::new(Watcher::new(
            Arc::clone(&commander),
            config,
            watch_target,
            delay,
        ));

        let (events, events_rx) = mpsc::unbounded_channel();
        let (errors, errors_rx) = mpsc::unbounded_channel();
        let source = EventSource::from_channels(events_rx, errors_rx);
        let cancel = CancellationToken::new();

        let handle = {
            let watcher = Arc::clone(&watcher);
            let cancel = cancel.clone();
            tokio::spawn(async move { watcher.run_with_source(source, cancel).await })
        };

        Self {
            dir,
            target,
            commander,
            watcher,
            events,
            errors,
            cancel,
            handle,
        }
    }

    pub fn write(&self, content: &str) {
        std::fs::write(&self.target, content).unwrap();
    }

    /// Feed an event for the target into the loop.
    pub fn event(&self, op: EventOp) {
        self.events
            .send(FsEvent::new(self.target.clone(), op))
            .unwrap();
    }

    /// Write new content and report it the way an editor save would.
    pub fn save(&self, content: &str) {
        self.write(content);
        self.event(EventOp::Write);
    }

    pub fn target_str(&self) -> String {
        self.target.to_string_lossy().into_owned()
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn stop(self) -> gow::errors::Result<()> {
        self.cancel.cancel();
        with_timeout(self.handle).await.unwrap()
    }
}

pub async fn settle(d: Duration) {
    tokio::time::sleep(d).await;
}

/// Formatted log output of one test, for asserting on warnings.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route this thread's tracing output here until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn count(&self, needle: &str) -> usize {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .matches(needle)
            .count()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
