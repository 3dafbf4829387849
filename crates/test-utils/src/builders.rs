#![allow(dead_code)]

use gow::config::{RawRunnerConfig, Rule, RunnerConfig};

/// Builder for `RunnerConfig` to simplify test setup.
pub struct RunnerConfigBuilder {
    config: RawRunnerConfig,
}

impl RunnerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawRunnerConfig::default(),
        }
    }

    pub fn timeout_ms(mut self, ms: i64) -> Self {
        self.config.default_timeout_ms = ms;
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.config.rules.push(rule);
        self
    }

    /// `.go -> go run $FILE`, as in the built-in defaults.
    pub fn with_go_rule(self) -> Self {
        self.with_rule(Rule::new(".go", "Golang", "go", ["run", "$FILE"]))
    }

    pub fn build(self) -> RunnerConfig {
        RunnerConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for RunnerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
