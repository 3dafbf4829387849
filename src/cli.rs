// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, ValueEnum};

/// Command-line arguments for `gow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gow",
    version,
    about = "Watch a single file and re-run it on every real content change.",
    long_about = None,
    after_help = "Example: gow -f exercise.go -t 10"
)]
pub struct CliArgs {
    /// File to watch and execute (e.g. main.go).
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Path to a custom config file.
    ///
    /// Default: `gow.toml` next to the `gow` executable.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Execution timeout in seconds; overrides `default_timeout_ms`.
    #[arg(short = 't', long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Debounce delay in milliseconds after a change is detected.
    #[arg(long, value_name = "MS", default_value_t = 100)]
    pub delay: u64,

    /// Verbose output (debug-level logs).
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `--verbose`, `GOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Add or replace a language rule: '.ext;Name;Command;Arg1;Arg2'.
    #[arg(short = 'a', long = "add-rule", value_name = "SPEC")]
    pub add_rule: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Usage text printed when no target file was given.
pub fn usage() -> String {
    CliArgs::command().render_help().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let args = CliArgs::try_parse_from(["gow", "-f", "main.go"]).unwrap();
        assert_eq!(args.file, Some(PathBuf::from("main.go")));
        assert_eq!(args.delay, 100);
        assert_eq!(args.timeout, None);
        assert!(!args.verbose);
        assert!(args.add_rule.is_none());
    }

    #[test]
    fn short_flags_are_accepted() {
        let args = CliArgs::try_parse_from([
            "gow", "-f", "a.js", "-c", "cfg.toml", "-t", "10", "--delay", "250", "-v",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("cfg.toml")));
        assert_eq!(args.timeout, Some(10));
        assert_eq!(args.delay, 250);
        assert!(args.verbose);
    }

    #[test]
    fn version_flag_is_reported_as_display_version() {
        let err = CliArgs::try_parse_from(["gow", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
