// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{RawRunnerConfig, RunnerConfig, DEFAULT_TIMEOUT_MS};
use crate::errors::{GowError, Result};

impl TryFrom<RawRunnerConfig> for RunnerConfig {
    type Error = GowError;

    fn try_from(raw: RawRunnerConfig) -> std::result::Result<Self, Self::Error> {
        validate_rules(&raw)?;
        let timeout_ms = if raw.default_timeout_ms <= 0 {
            DEFAULT_TIMEOUT_MS
        } else {
            raw.default_timeout_ms
        };
        Ok(RunnerConfig::new_unchecked(
            Duration::from_millis(timeout_ms as u64),
            raw.rules,
        ))
    }
}

fn validate_rules(cfg: &RawRunnerConfig) -> Result<()> {
    if cfg.rules.is_empty() {
        return Err(GowError::ConfigError(
            "config must contain at least one [[rules]] entry".to_string(),
        ));
    }

    for rule in cfg.rules.iter() {
        if !rule.extension.starts_with('.') {
            return Err(GowError::ConfigError(format!(
                "rule '{}' has extension '{}' which does not start with '.'",
                rule.name, rule.extension
            )));
        }
        if rule.execution_command.trim().is_empty() {
            return Err(GowError::ConfigError(format!(
                "rule '{}' ({}) has an empty execution_command",
                rule.name, rule.extension
            )));
        }
    }

    Ok(())
}
