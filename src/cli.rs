// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `respawn`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "respawn",
    version,
    about = "Run a script, restart it when it crashes or when watched files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Script to supervise. Overrides `[process].script` from the config file.
    #[arg(value_name = "SCRIPT")]
    pub script: Option<String>,

    /// Arguments passed to the script (after `--`).
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,

    /// Path to a config file (TOML).
    ///
    /// If omitted, `Respawn.toml` in the current directory is used when it
    /// exists; otherwise everything comes from the flags below.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Program used to run the script, e.g. `node` or `python3`.
    #[arg(long, value_name = "PROGRAM")]
    pub interpreter: Option<String>,

    /// Glob of paths to watch. Repeatable; appended to the config file list.
    #[arg(short, long = "watch", value_name = "GLOB")]
    pub watch: Vec<String>,

    /// Glob of paths to ignore. Repeatable; appended to the config file list.
    #[arg(short, long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Cooldown after an unexpected exit, e.g. `3s`.
    #[arg(long, value_name = "DURATION")]
    pub restart_timeout: Option<String>,

    /// Delay between the first spawn and building the watch set, e.g. `1s`.
    #[arg(long, value_name = "DURATION")]
    pub watcher_delay: Option<String>,

    /// Quiet window before a file-triggered restart, e.g. `200ms`.
    #[arg(long, value_name = "DURATION")]
    pub debounce: Option<String>,

    /// Do not spawn the script until a start is requested.
    ///
    /// Send `SIGUSR1` to start, `SIGHUP` to restart and `SIGUSR2` to stop.
    #[arg(long)]
    pub no_autostart: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RESPAWN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate config, print the resolved watch set, but don't spawn anything.
    #[arg(long)]
    pub dry_run: bool,
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
