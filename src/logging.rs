// src/logging.rs

//! Diagnostics setup: `tracing` events rendered by `tracing-subscriber`.
//!
//! The filter is chosen in this order:
//! 1. `--log-level` on the command line, applied to every target;
//! 2. `RESPAWN_LOG`, parsed as an `EnvFilter` directive list
//!    (e.g. `debug` or `respawn::engine=trace,notify=warn`);
//! 3. `info`.
//!
//! Output goes to stderr with timestamps and targets. The supervised child
//! usually shares the terminal through inherited stdio, so its stdout is
//! never interleaved with supervisor lines.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "RESPAWN_LOG";

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV).ok().as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to install the log subscriber")
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(level.directive()));
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid {LOG_ENV} value {directives:?}")),
        None => Ok(EnvFilter::new("info")),
    }
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(filter: EnvFilter) -> String {
        filter.to_string().to_lowercase()
    }

    #[test]
    fn cli_level_beats_environment() {
        let filter = build_filter(Some(LogLevel::Trace), Some("warn")).unwrap();
        assert_eq!(render(filter), "trace");
    }

    #[test]
    fn environment_accepts_per_target_directives() {
        let filter = build_filter(None, Some("respawn::engine=debug,notify=warn")).unwrap();
        let rendered = render(filter);
        assert!(rendered.contains("respawn::engine=debug"));
        assert!(rendered.contains("notify=warn"));
    }

    #[test]
    fn blank_environment_falls_back_to_info() {
        assert_eq!(render(build_filter(None, Some("  ")).unwrap()), "info");
        assert_eq!(render(build_filter(None, None).unwrap()), "info");
    }

    #[test]
    fn garbage_environment_is_an_error() {
        assert!(build_filter(None, Some("respawn=loud")).is_err());
    }
}
