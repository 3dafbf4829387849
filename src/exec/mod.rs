// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`context`] is the cancellation/deadline context handed to each run.
//! - [`commander`] provides the `Commander` trait and the real
//!   `ProcessCommander`; tests replace it with a fake.
//! - [`executor`] owns the single in-flight run slot, dispatches runs and
//!   classifies their outcomes.

pub mod commander;
pub mod context;
pub mod executor;

pub use commander::{Commander, ProcessCommander};
pub use context::{ContextError, ExecutionContext};
pub use executor::{build_args, classify, ExecutionOutcome, Executor};
