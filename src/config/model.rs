// src/config/model.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::rules::RuleTable;

/// Argument token replaced by the watched file's path at execution time.
pub const FILE_PLACEHOLDER: &str = "$FILE";

/// Timeout used when the config omits `default_timeout_ms` or sets it <= 0.
pub const DEFAULT_TIMEOUT_MS: i64 = 5000;

/// A single `[[rules]]` entry: how to run files with a given extension.
///
/// ```toml
/// [[rules]]
/// extension = ".go"
/// name = "Golang"
/// execution_command = "go"
/// execution_args = ["run", "$FILE"]
/// needs_build = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Extension including the leading dot, matched exactly.
    pub extension: String,

    /// Human readable language name.
    pub name: String,

    /// Program to launch.
    pub execution_command: String,

    /// Argument template; entries equal to [`FILE_PLACEHOLDER`] are replaced.
    #[serde(default)]
    pub execution_args: Vec<String>,

    /// Informational: the command compiles before running.
    #[serde(default)]
    pub needs_build: bool,
}

impl Rule {
    pub fn new(
        extension: impl Into<String>,
        name: impl Into<String>,
        command: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            extension: extension.into(),
            name: name.into(),
            execution_command: command.into(),
            execution_args: args.into_iter().map(Into::into).collect(),
            needs_build: false,
        }
    }

    pub fn with_needs_build(mut self, needs_build: bool) -> Self {
        self.needs_build = needs_build;
        self
    }
}

/// Config file as read from TOML, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRunnerConfig {
    /// Execution timeout in milliseconds; <= 0 means "use the default".
    #[serde(default)]
    pub default_timeout_ms: i64,

    /// Rules in priority order.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// Validated runner configuration.
///
/// Construct through `RunnerConfig::try_from(raw)` (see [`crate::config::validate`])
/// or [`RunnerConfig::builtin`].
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    default_timeout: Duration,
    rules: RuleTable,
}

impl RunnerConfig {
    pub(crate) fn new_unchecked(default_timeout: Duration, rules: Vec<Rule>) -> Self {
        Self {
            default_timeout,
            rules: RuleTable::new(rules),
        }
    }

    /// Defaults written to disk when no config file exists yet.
    pub fn builtin() -> Self {
        Self::new_unchecked(
            Duration::from_millis(DEFAULT_TIMEOUT_MS as u64),
            builtin_rules(),
        )
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Override the execution timeout for this session (e.g. `--timeout`).
    pub fn set_default_timeout(&mut self, timeout: Duration) {
        self.default_timeout = timeout;
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleTable {
        &mut self.rules
    }

    /// Serializable form, used when saving.
    pub fn to_raw(&self) -> RawRunnerConfig {
        RawRunnerConfig {
            default_timeout_ms: i64::try_from(self.default_timeout.as_millis())
                .unwrap_or(i64::MAX),
            rules: self.rules.iter().cloned().collect(),
        }
    }
}

fn builtin_rules() -> Vec<Rule> {
    vec![
        Rule::new(".go", "Golang", "go", ["run", FILE_PLACEHOLDER]),
        Rule::new(".js", "Node.js", "node", [FILE_PLACEHOLDER]),
        // The path arrives as `$1` so the placeholder stays a whole argument.
        Rule::new(
            ".rs",
            "Rust",
            "/bin/sh",
            [
                "-c",
                "rustc \"$1\" -o /tmp/gow_bin && /tmp/gow_bin",
                "gow",
                FILE_PLACEHOLDER,
            ],
        )
        .with_needs_build(true),
    ]
}
