// src/exec/commander.rs

//! Process-runner abstraction.
//!
//! The executor talks to a [`Commander`] instead of spawning processes
//! itself, so tests can substitute a fake that records calls.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{anyhow, Context, Result};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::exec::context::ExecutionContext;

/// Runs one command to completion under an [`ExecutionContext`].
///
/// Implementations must stop promptly once the context ends.
pub trait Commander: Send + Sync + 'static {
    fn run<'a>(
        &'a self,
        ctx: ExecutionContext,
        command: &'a str,
        args: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Spawns real OS processes that inherit gow's stdin/stdout/stderr, so the
/// program's output shows up live in the terminal.
#[derive(Debug, Clone, Default)]
pub struct ProcessCommander;

impl ProcessCommander {
    pub fn new() -> Self {
        Self
    }
}

impl Commander for ProcessCommander {
    fn run<'a>(
        &'a self,
        ctx: ExecutionContext,
        command: &'a str,
        args: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(cause) = ctx.err() {
                return Err(anyhow!("'{command}' not started: {cause}"));
            }

            let mut child = Command::new(command)
                .args(args)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .kill_on_drop(true)
                .spawn()
                .with_context(|| format!("spawning '{command}'"))?;

            debug!(command, ?args, pid = child.id(), "process started");

            tokio::select! {
                status = child.wait() => {
                    let status = status
                        .with_context(|| format!("waiting for '{command}'"))?;
                    if status.success() {
                        Ok(())
                    } else {
                        Err(anyhow!("'{command}' exited with {status}"))
                    }
                }
                cause = ctx.done() => {
                    if let Err(e) = child.kill().await {
                        warn!(command, error = %e, "failed to kill process");
                    }
                    Err(anyhow!("'{command}' stopped: {cause}"))
                }
            }
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn successful_process_returns_ok() {
        let ctx = ExecutionContext::with_timeout(Duration::from_secs(5));
        ProcessCommander::new()
            .run(ctx, "sh", &args(&["-c", "exit 0"]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_error() {
        let ctx = ExecutionContext::with_timeout(Duration::from_secs(5));
        let err = ProcessCommander::new()
            .run(ctx, "sh", &args(&["-c", "exit 3"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let ctx = ExecutionContext::with_timeout(Duration::from_secs(5));
        let err = ProcessCommander::new()
            .run(ctx, "gow-definitely-not-a-real-binary", &[])
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("spawning"));
    }

    #[tokio::test]
    async fn ended_context_never_spawns() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("spawned");
        let ctx = ExecutionContext::with_timeout(Duration::from_secs(5));
        ctx.cancel();

        let script = format!("touch '{}'", marker.display());
        let err = ProcessCommander::new()
            .run(ctx, "sh", &args(&["-c", &script]))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("not started: context canceled"));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn deadline_kills_long_running_process() {
        let ctx = ExecutionContext::with_timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = ProcessCommander::new()
            .run(ctx.clone(), "sleep", &args(&["10"]))
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(err.to_string().contains("deadline exceeded"));
        assert_eq!(ctx.err(), Some(crate::exec::ContextError::DeadlineExceeded));
    }
}
