// tests/config_files.rs

use std::error::Error;
use std::time::Duration;

use gow::config::{load_and_validate, load_or_create, load_or_default, RunnerConfig};
use gow::errors::GowError;
use gow::fs::RealFileSystem;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn missing_config_is_generated_on_disk() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("gow.toml");

    let cfg = load_or_create(&RealFileSystem, &path)?;

    assert!(path.exists(), "default config should be written");
    assert_eq!(cfg.default_timeout(), Duration::from_secs(5));
    assert!(!cfg.rules().is_empty());

    let text = std::fs::read_to_string(&path)?;
    assert!(text.contains("default_timeout_ms = 5000"));
    assert!(text.contains("extension = \".go\""));
    Ok(())
}

#[test]
fn add_rule_persists_to_disk() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("gow.toml");
    let cfg = load_or_create(&RealFileSystem, &path)?;

    gow::add_rule(&RealFileSystem, &path, cfg, ".py;Python;python3;-u;$FILE")?;

    let reloaded = load_and_validate(&RealFileSystem, &path)?;
    let rule = reloaded.rules().find(".py").expect("rule was saved");
    assert_eq!(rule.execution_command, "python3");
    assert_eq!(rule.execution_args, vec!["-u", "$FILE"]);
    Ok(())
}

#[test]
fn config_without_rules_is_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("gow.toml");
    std::fs::write(&path, "default_timeout_ms = 1000\n")?;

    match load_and_validate(&RealFileSystem, &path) {
        Err(GowError::ConfigError(msg)) => assert!(msg.contains("[[rules]]")),
        other => panic!("expected ConfigError, got {other:?}"),
    }

    // The lenient loader used at startup falls back instead.
    let cfg = load_or_default(&RealFileSystem, &path);
    assert_eq!(cfg.rules(), RunnerConfig::builtin().rules());
    Ok(())
}

#[test]
fn needs_build_round_trips() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("gow.toml");
    std::fs::write(
        &path,
        r#"
[[rules]]
extension = ".c"
name = "C"
execution_command = "/bin/sh"
execution_args = ["-c", "cc \"$1\" -o /tmp/a.out && /tmp/a.out", "gow", "$FILE"]
needs_build = true
"#,
    )?;

    let cfg = load_and_validate(&RealFileSystem, &path)?;
    let rule = cfg.rules().find(".c").unwrap();
    assert!(rule.needs_build);
    assert_eq!(rule.execution_args.len(), 4);
    Ok(())
}
