use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use gow::exec::{Commander, ExecutionContext};

/// How the fake behaves once called.
#[derive(Debug, Clone)]
pub enum FakeBehaviour {
    /// Return `Ok(())` immediately.
    Succeed,
    /// Return an error with this message immediately.
    Fail(String),
    /// Run until the context ends (like a real process that gets killed).
    Hang,
    /// Never return, ignoring the context entirely.
    Unresponsive,
    /// Sleep for the duration (or until the context ends), then succeed.
    Sleep(Duration),
}

/// One recorded `run` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub command: String,
    pub args: Vec<String>,
    pub ctx: ExecutionContext,
}

/// A fake process runner that:
/// - records every call, including the context it was given
/// - behaves according to [`FakeBehaviour`]
#[derive(Debug)]
pub struct FakeCommander {
    calls: Mutex<Vec<RecordedCall>>,
    behaviour: Mutex<FakeBehaviour>,
}

impl FakeCommander {
    pub fn new(behaviour: FakeBehaviour) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            behaviour: Mutex::new(behaviour),
        })
    }

    pub fn succeeding() -> Arc<Self> {
        Self::new(FakeBehaviour::Succeed)
    }

    pub fn set_behaviour(&self, behaviour: FakeBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// Poll until at least `n` calls were recorded or `timeout` passes.
    pub async fn wait_for_calls(&self, n: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.call_count() >= n {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.call_count() >= n
    }
}

impl Commander for FakeCommander {
    fn run<'a>(
        &'a self,
        ctx: ExecutionContext,
        command: &'a str,
        args: &'a [String],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        self.calls.lock().unwrap().push(RecordedCall {
            command: command.to_string(),
            args: args.to_vec(),
            ctx: ctx.clone(),
        });
        let behaviour = self.behaviour.lock().unwrap().clone();

        Box::pin(async move {
            match behaviour {
                FakeBehaviour::Succeed => Ok(()),
                FakeBehaviour::Fail(msg) => Err(anyhow!(msg)),
                FakeBehaviour::Hang => {
                    let cause = ctx.done().await;
                    Err(anyhow!("process stopped: {cause}"))
                }
                FakeBehaviour::Unresponsive => std::future::pending().await,
                FakeBehaviour::Sleep(d) => {
                    tokio::select! {
                        _ = tokio::time::sleep(d) => Ok(()),
                        cause = ctx.done() => Err(anyhow!("process stopped: {cause}")),
                    }
                }
            }
        })
    }
}
