// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::model::{RawRunnerConfig, RunnerConfig};
use crate::errors::Result;
use crate::fs::FileSystem;

/// File name used when no `--config` path is given.
pub const CONFIG_FILE_NAME: &str = "gow.toml";

/// Resolve the config path: the explicit path if given, otherwise
/// `gow.toml` next to the running executable.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Read and deserialize the config file without semantic validation.
pub fn load_from_path(fs: &dyn FileSystem, path: &Path) -> Result<RawRunnerConfig> {
    let contents = fs.read_to_string(path)?;
    let config: RawRunnerConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Read, deserialize and validate the config file.
pub fn load_and_validate(fs: &dyn FileSystem, path: &Path) -> Result<RunnerConfig> {
    let raw = load_from_path(fs, path)?;
    RunnerConfig::try_from(raw)
}

/// Load the config, writing the built-in defaults first if the file is missing.
pub fn load_or_create(fs: &dyn FileSystem, path: &Path) -> Result<RunnerConfig> {
    if !fs.exists(path) {
        println!(
            "[INFO] Config not found. Creating default config at: {}",
            path.display()
        );
        let cfg = RunnerConfig::builtin();
        save_config(fs, path, &cfg)?;
        info!(path = %path.display(), "wrote default config");
        return Ok(cfg);
    }

    load_and_validate(fs, path)
}

/// Like [`load_or_create`], but never fails: an unreadable or invalid
/// config is reported and the built-in defaults are used instead.
pub fn load_or_default(fs: &dyn FileSystem, path: &Path) -> RunnerConfig {
    match load_or_create(fs, path) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("[WARN] Invalid config, using defaults: {err}");
            warn!(path = %path.display(), error = %err, "falling back to built-in config");
            RunnerConfig::builtin()
        }
    }
}

/// Serialize `cfg` as TOML and write it to `path`.
pub fn save_config(fs: &dyn FileSystem, path: &Path, cfg: &RunnerConfig) -> Result<()> {
    let text = toml::to_string_pretty(&cfg.to_raw())?;
    fs.write(path, text.as_bytes())?;
    Ok(())
}
