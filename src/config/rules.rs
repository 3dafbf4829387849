// src/config/rules.rs

//! Ordered rule table mapping file extensions to execution rules.
//!
//! Lookup is a linear scan; when several rules share an extension the
//! first one in configured order wins.

use std::path::Path;

use crate::config::model::Rule;
use crate::errors::{GowError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule whose extension equals `extension` exactly (dot included).
    pub fn find(&self, extension: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.extension == extension)
    }

    /// Rule for `path`, based on its extension.
    pub fn find_for_path(&self, path: &Path) -> Option<&Rule> {
        self.find(&extension_of(path))
    }

    /// Replace the first rule with the same extension, or append.
    ///
    /// Returns `true` if an existing rule was replaced.
    pub fn upsert(&mut self, rule: Rule) -> bool {
        match self
            .rules
            .iter_mut()
            .find(|r| r.extension == rule.extension)
        {
            Some(existing) => {
                *existing = rule;
                true
            }
            None => {
                self.rules.push(rule);
                false
            }
        }
    }
}

/// Extension of `path` with its leading dot (`main.go` -> `.go`), or `""`.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Parse an `--add-rule` spec: `.ext;Name;Command;Arg1;Arg2...`.
pub fn parse_rule_spec(spec: &str) -> Result<Rule> {
    let parts: Vec<&str> = spec.split(';').collect();

    if parts.len() < 3 {
        return Err(GowError::InvalidRuleSpec(format!(
            "expected '.ext;Name;Command;Args...', got '{spec}'"
        )));
    }
    if !parts[0].starts_with('.') {
        return Err(GowError::InvalidRuleSpec(format!(
            "extension must start with '.', got '{}'",
            parts[0]
        )));
    }
    if parts[2].trim().is_empty() {
        return Err(GowError::InvalidRuleSpec(
            "command must not be empty".to_string(),
        ));
    }

    Ok(Rule::new(parts[0], parts[1], parts[2], parts[3..].iter().copied()))
}
