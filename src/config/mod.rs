// src/config/mod.rs

//! Configuration model and loading for `gow`.
//!
//! - [`model`] holds the serde types and the validated [`RunnerConfig`].
//! - [`validate`] turns a [`RawRunnerConfig`] into a [`RunnerConfig`].
//! - [`rules`] is the ordered, first-match-wins [`RuleTable`].
//! - [`loader`] resolves, reads, creates and saves the config file.

pub mod loader;
pub mod model;
pub mod rules;
pub mod validate;

pub use loader::{
    load_and_validate, load_or_create, load_or_default, resolve_config_path, save_config,
    CONFIG_FILE_NAME,
};
pub use model::{RawRunnerConfig, Rule, RunnerConfig, DEFAULT_TIMEOUT_MS, FILE_PLACEHOLDER};
pub use rules::{parse_rule_spec, RuleTable};
