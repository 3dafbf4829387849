// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod watch;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{
    load_or_default, parse_rule_spec, resolve_config_path, save_config, RunnerConfig,
};
use crate::errors::{GowError, Result};
use crate::exec::ProcessCommander;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::{WatchTarget, Watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config resolution/loading (and `--add-rule`)
/// - CLI overrides (timeout, debounce delay)
/// - the watch loop with the real process runner
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let fs = RealFileSystem;
    let config_path = resolve_config_path(args.config.as_deref())?;
    let mut cfg = load_or_default(&fs, &config_path);

    if let Some(spec) = args.add_rule.as_deref() {
        return add_rule(&fs, &config_path, cfg, spec);
    }

    let Some(file) = args.file.clone() else {
        return Err(GowError::MissingTarget);
    };

    if let Some(secs) = args.timeout {
        cfg.set_default_timeout(Duration::from_secs(secs));
    }
    let delay = Duration::from_millis(args.delay);

    let target = WatchTarget::new(file)?;
    print_startup(&target, &cfg, delay);

    let watcher = Watcher::new(Arc::new(ProcessCommander::new()), cfg, target, delay);

    // Ctrl-C -> graceful shutdown.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            cancel.cancel();
        });
    }

    watcher.run(cancel).await
}

/// Parse `spec`, insert or replace the rule, and persist the config.
pub fn add_rule(
    fs: &dyn FileSystem,
    config_path: &Path,
    mut cfg: RunnerConfig,
    spec: &str,
) -> Result<()> {
    let rule = parse_rule_spec(spec)?;
    let (name, extension) = (rule.name.clone(), rule.extension.clone());
    let replaced = cfg.rules_mut().upsert(rule);

    save_config(fs, config_path, &cfg)?;

    println!(
        "[ OK ] Language {} ({}) {} in {}",
        name,
        extension,
        if replaced { "updated" } else { "added" },
        config_path.display()
    );
    info!(%extension, replaced, path = %config_path.display(), "rule saved");
    Ok(())
}

fn print_startup(target: &WatchTarget, cfg: &RunnerConfig, delay: Duration) {
    println!(
        "[INIT] gow started. Watching: {} (Timeout: {:?}, Delay: {:?}).",
        target.path().display(),
        cfg.default_timeout(),
        delay
    );

    match cfg.rules().find_for_path(target.path()) {
        Some(rule) => debug!(
            rule = %rule.name,
            command = %rule.execution_command,
            args = ?rule.execution_args,
            needs_build = rule.needs_build,
            "active rule"
        ),
        None => debug!("no rule for target extension"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::config::load_and_validate;

    #[test]
    fn add_rule_appends_and_saves() {
        let fs = MockFileSystem::new();
        let path = Path::new("/cfg/gow.toml");

        add_rule(&fs, path, RunnerConfig::builtin(), ".py;Python;python3;$FILE").unwrap();

        let saved = load_and_validate(&fs, path).unwrap();
        assert_eq!(saved.rules().len(), 4);
        assert_eq!(saved.rules().find(".py").unwrap().execution_args, vec!["$FILE"]);
    }

    #[test]
    fn add_rule_replaces_existing_extension() {
        let fs = MockFileSystem::new();
        let path = Path::new("/cfg/gow.toml");

        add_rule(&fs, path, RunnerConfig::builtin(), ".go;Go;go;build;$FILE").unwrap();

        let saved = load_and_validate(&fs, path).unwrap();
        assert_eq!(saved.rules().len(), 3);
        assert_eq!(
            saved.rules().find(".go").unwrap().execution_args,
            vec!["build", "$FILE"]
        );
    }

    #[test]
    fn bad_spec_writes_nothing() {
        let fs = MockFileSystem::new();
        let path = Path::new("/cfg/gow.toml");

        let err = add_rule(&fs, path, RunnerConfig::builtin(), "py;Python;python3").unwrap_err();
        assert!(matches!(err, GowError::InvalidRuleSpec(_)));
        assert!(!fs.exists(path));
    }
}
