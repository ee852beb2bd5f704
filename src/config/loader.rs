// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation or path anchoring. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path, anchor relative paths at the file's
/// directory and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let mut raw = load_from_path(path)?;
    raw.anchor_paths(&config_root_dir(path));
    let config = ConfigFile::try_from(raw)?;
    Ok(config)
}

/// Build the effective configuration for a CLI invocation.
///
/// - Reads the config file named by `--config`, or `Respawn.toml` when it
///   exists in the working directory.
/// - Applies CLI overrides on top: `SCRIPT`, trailing args, `--interpreter`,
///   durations and `--no-autostart` replace file values; `--watch` and
///   `--ignore` extend the file lists.
/// - Values from the file are anchored at the file's directory, values from
///   the command line at the working directory.
pub fn load_for_cli(args: &CliArgs) -> Result<ConfigFile> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut raw = match &args.config {
        Some(path) => {
            let path = PathBuf::from(path);
            let mut raw = load_from_path(&path)?;
            raw.anchor_paths(&config_root_dir(&path));
            raw
        }
        None => {
            let default_path = default_config_path();
            if default_path.is_file() {
                let mut raw = load_from_path(&default_path)?;
                raw.anchor_paths(&cwd);
                raw
            } else {
                RawConfigFile::default()
            }
        }
    };

    let mut overrides = RawConfigFile::default();
    overrides.process.script = args.script.clone();
    overrides.watch.paths = args.watch.clone();
    overrides.watch.ignore = args.ignore.clone();
    overrides.anchor_paths(&cwd);

    if let Some(script) = overrides.process.script {
        raw.process.script = Some(script);
    }
    if !args.args.is_empty() {
        raw.process.args = args.args.clone();
    }
    if let Some(interpreter) = &args.interpreter {
        raw.process.interpreter = Some(interpreter.clone());
    }
    if args.no_autostart {
        raw.process.autostart = Some(false);
    }
    raw.watch.paths.extend(overrides.watch.paths);
    raw.watch.ignore.extend(overrides.watch.ignore);
    if let Some(d) = &args.restart_timeout {
        raw.timing.restart_timeout = Some(d.clone());
    }
    if let Some(d) = &args.watcher_delay {
        raw.timing.watcher_delay = Some(d.clone());
    }
    if let Some(d) = &args.debounce {
        raw.timing.debounce = Some(d.clone());
    }

    ConfigFile::try_from(raw)
}

/// Default config file looked up in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Respawn.toml")
}

/// Figure out the directory relative config entries are anchored at.
///
/// - If the config path has a non-empty parent (e.g. "configs/Respawn.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Respawn.toml" (parent = ""),
///   we fall back to the current working directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    let dir = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    // Absolute so that anchored globs don't depend on the cwd at resolve time.
    dir.canonicalize().unwrap_or(dir)
}
