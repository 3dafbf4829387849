// src/exec/context.rs

//! Cancellation/deadline-bound execution context.
//!
//! Each dispatched run gets its own context. It ends either because a newer
//! run superseded it ([`ExecutionContext::cancel`]) or because its deadline
//! passed; whichever happens first is recorded as the cause.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why an execution context ended.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    token: CancellationToken,
    deadline: Instant,
    cause: Arc<OnceLock<ContextError>>,
}

impl ExecutionContext {
    /// New context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Instant::now() + timeout,
            cause: Arc::new(OnceLock::new()),
        }
    }

    /// Cancel the context. A no-op if it already ended.
    pub fn cancel(&self) {
        let _ = self.cause.set(ContextError::Canceled);
        self.token.cancel();
    }

    /// `None` while the context is live, otherwise the first cause.
    pub fn err(&self) -> Option<ContextError> {
        if let Some(cause) = self.cause.get() {
            return Some(*cause);
        }
        if Instant::now() >= self.deadline {
            let _ = self.cause.set(ContextError::DeadlineExceeded);
            return self.cause.get().copied();
        }
        None
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolves once the context is canceled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = tokio::time::sleep_until(self.deadline) => {
                let _ = self.cause.set(ContextError::DeadlineExceeded);
                // Wake every other waiter on this context.
                self.token.cancel();
            }
        }
        self.cause.get().copied().unwrap_or(ContextError::Canceled)
    }
}
