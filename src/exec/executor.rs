// src/exec/executor.rs

//! Serialized execution with cancellation of stale runs.
//!
//! At most one execution is live at any instant: [`Executor::dispatch`]
//! swaps the single [`ExecutionHandle`] slot, cancels the previous run's
//! context, and only then spawns the new run. The spawn happens outside the
//! slot's lock.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::anyhow;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{Rule, FILE_PLACEHOLDER};
use crate::exec::commander::Commander;
use crate::exec::context::{ContextError, ExecutionContext};

/// Terminal classification of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    /// The run's own timeout expired.
    TimedOut,
    /// Superseded by a newer dispatch. Expected, not an error.
    Cancelled,
    /// The runner returned cleanly, but only once the deadline had passed.
    /// Nothing is reported for it.
    FinishedLate,
    /// The runner reported an error (spawn failure, non-zero exit, ...).
    Failed(String),
}

/// The in-flight run: its id and the capability to cancel it.
#[derive(Debug)]
struct ExecutionHandle {
    run_id: u64,
    ctx: ExecutionContext,
}

pub struct Executor<C: Commander + ?Sized> {
    commander: Arc<C>,
    timeout: Duration,
    current: Arc<Mutex<Option<ExecutionHandle>>>,
    next_run_id: AtomicU64,
}

impl<C: Commander + ?Sized> std::fmt::Debug for Executor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("timeout", &self.timeout)
            .field("active_run", &self.active_run())
            .finish_non_exhaustive()
    }
}

impl<C: Commander + ?Sized> Executor<C> {
    pub fn new(commander: Arc<C>, timeout: Duration) -> Self {
        Self {
            commander,
            timeout,
            current: Arc::new(Mutex::new(None)),
            next_run_id: AtomicU64::new(1),
        }
    }

    /// Id of the run currently occupying the slot, if any.
    pub fn active_run(&self) -> Option<u64> {
        lock_slot(&self.current).as_ref().map(|h| h.run_id)
    }

    /// Start `rule` against `target` in the background.
    ///
    /// Any previous run is canceled before the new one is spawned. The
    /// returned handle resolves to the run's outcome; callers may drop it.
    pub fn dispatch(&self, rule: &Rule, target: &Path) -> JoinHandle<ExecutionOutcome> {
        let run_id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let ctx = ExecutionContext::with_timeout(self.timeout);

        {
            let mut slot = lock_slot(&self.current);
            let previous = slot.replace(ExecutionHandle {
                run_id,
                ctx: ctx.clone(),
            });
            if let Some(prev) = previous {
                debug!(run_id = prev.run_id, "cancelling previous execution");
                prev.ctx.cancel();
            }
        }

        let args = build_args(&rule.execution_args, target);
        let command = rule.execution_command.clone();
        let commander = Arc::clone(&self.commander);
        let slot = Arc::clone(&self.current);

        info!(
            run_id,
            rule = %rule.name,
            command = %command,
            ?args,
            timeout = ?self.timeout,
            "dispatching execution"
        );

        tokio::spawn(async move {
            // A newer dispatch may have landed before this task was first
            // polled; the runner must not start on an ended context.
            let result = match ctx.err() {
                Some(cause) => Err(anyhow!(cause)),
                None => tokio::select! {
                    biased;
                    cause = ctx.done() => Err(anyhow!(cause)),
                    res = commander.run(ctx.clone(), &command, &args) => res,
                },
            };
            let outcome = classify(result, ctx.err());

            {
                let mut slot = lock_slot(&slot);
                if slot.as_ref().is_some_and(|h| h.run_id == run_id) {
                    *slot = None;
                }
            }

            report_outcome(run_id, &outcome);
            outcome
        })
    }
}

/// Replace every argument equal to the placeholder with `target`.
pub fn build_args(template: &[String], target: &Path) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            if arg == FILE_PLACEHOLDER {
                target.to_string_lossy().into_owned()
            } else {
                arg.clone()
            }
        })
        .collect()
}

/// Map a runner result plus the context's end cause onto an outcome.
///
/// The context cause wins: a run that ended because its deadline passed is
/// a timeout even if the runner surfaced it as an ordinary error. A clean
/// return on an ended context is never reported as success.
pub fn classify(result: anyhow::Result<()>, ctx_err: Option<ContextError>) -> ExecutionOutcome {
    match (ctx_err, result) {
        (Some(ContextError::DeadlineExceeded), Ok(())) => ExecutionOutcome::FinishedLate,
        (Some(ContextError::DeadlineExceeded), Err(_)) => ExecutionOutcome::TimedOut,
        (Some(ContextError::Canceled), _) => ExecutionOutcome::Cancelled,
        (None, Ok(())) => ExecutionOutcome::Success,
        (None, Err(err)) => ExecutionOutcome::Failed(format!("{err:#}")),
    }
}

fn report_outcome(run_id: u64, outcome: &ExecutionOutcome) {
    match outcome {
        ExecutionOutcome::Success => {
            println!("[ OK ] Execution completed.");
            info!(run_id, "execution completed");
        }
        ExecutionOutcome::TimedOut => {
            println!("[ERR ] Timeout reached.");
            warn!(run_id, "execution timed out");
        }
        ExecutionOutcome::Cancelled => {
            debug!(run_id, "execution cancelled by a newer change");
        }
        ExecutionOutcome::FinishedLate => {
            debug!(run_id, "execution returned after its deadline");
        }
        ExecutionOutcome::Failed(msg) => {
            println!("[ERR ] Execution failed: {msg}");
            error!(run_id, error = %msg, "execution failed");
        }
    }
}

fn lock_slot(
    slot: &Mutex<Option<ExecutionHandle>>,
) -> MutexGuard<'_, Option<ExecutionHandle>> {
    // The slot is plain data; a panic elsewhere cannot leave it half-written.
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
