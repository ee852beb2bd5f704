// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{
    ConfigFile, ProcessConfig, RawConfigFile, StdioConfig, Timing, WatchConfig,
};
use crate::errors::{RespawnError, Result};
use crate::watch::patterns::PatternSet;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RespawnError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let process = validate_process(&raw)?;
        let watch = validate_watch(&raw)?;
        let timing = validate_timing(&raw)?;
        Ok(ConfigFile::new_unchecked(process, watch, timing))
    }
}

fn validate_process(raw: &RawConfigFile) -> Result<ProcessConfig> {
    let section = &raw.process;

    let script = match section.script.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => PathBuf::from(s),
        _ => {
            return Err(RespawnError::ConfigError(
                "[process].script is required (or pass SCRIPT on the command line)".to_string(),
            ));
        }
    };

    if let Some(interpreter) = &section.interpreter {
        if interpreter.trim().is_empty() {
            return Err(RespawnError::ConfigError(
                "[process].interpreter must not be empty when set".to_string(),
            ));
        }
    }

    for key in section.env.keys() {
        if key.is_empty() || key.contains('=') {
            return Err(RespawnError::ConfigError(format!(
                "[process.env] has an invalid variable name {:?}",
                key
            )));
        }
    }

    Ok(ProcessConfig {
        script,
        interpreter: section.interpreter.clone(),
        args: section.args.clone(),
        autostart: section.autostart.unwrap_or(true),
        cwd: section.cwd.as_ref().map(PathBuf::from),
        stdio: StdioConfig {
            stdin: section.stdin,
            stdout: section.stdout,
            stderr: section.stderr,
        },
        env: section.env.clone(),
    })
}

fn validate_watch(raw: &RawConfigFile) -> Result<WatchConfig> {
    let check = |list: &[String], field: &str| -> Result<()> {
        if list.iter().any(|g| g.trim().is_empty()) {
            return Err(RespawnError::ConfigError(format!(
                "[watch].{} must not contain empty entries",
                field
            )));
        }
        Ok(())
    };
    check(&raw.watch.paths, "paths")?;
    check(&raw.watch.ignore, "ignore")?;

    // Surface broken globs at load time rather than on first spawn.
    PatternSet::compile(&raw.watch.paths, &raw.watch.ignore)?;

    Ok(WatchConfig {
        paths: raw.watch.paths.clone(),
        ignore: raw.watch.ignore.clone(),
    })
}

fn validate_timing(raw: &RawConfigFile) -> Result<Timing> {
    let defaults = Timing::default();
    let t = &raw.timing;
    Ok(Timing {
        restart_timeout: duration_field(&t.restart_timeout, "restart_timeout", defaults.restart_timeout)?,
        watcher_delay: duration_field(&t.watcher_delay, "watcher_delay", defaults.watcher_delay)?,
        debounce: duration_field(&t.debounce, "debounce", defaults.debounce)?,
        dedup_ttl: duration_field(&t.dedup_ttl, "dedup_ttl", defaults.dedup_ttl)?,
    })
}

fn duration_field(value: &Option<String>, name: &str, default: Duration) -> Result<Duration> {
    match value {
        None => Ok(default),
        Some(s) => parse_duration(s)
            .map_err(|e| RespawnError::ConfigError(format!("[timing].{}: {}", name, e))),
    }
}
