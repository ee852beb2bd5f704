// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::StdioMode;
use crate::watch::path_utils::anchor;

/// Cooldown after an unexpected exit before respawning.
pub const DEFAULT_RESTART_TIMEOUT: Duration = Duration::from_millis(3000);
/// Delay between the first confirmed spawn and building the watch set.
pub const DEFAULT_WATCHER_DELAY: Duration = Duration::from_millis(1000);
/// Quiet window between an accepted change and the restart it triggers.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);
/// Lifetime of a `(kind, path)` dedup key.
pub const DEFAULT_DEDUP_TTL: Duration = Duration::from_millis(200);

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [process]
/// script = "server.js"
/// interpreter = "node"
/// args = ["--port", "8080"]
///
/// [watch]
/// paths = ["src/**/*.js"]
/// ignore = ["src/vendor"]
///
/// [timing]
/// restart_timeout = "3s"
/// ```
///
/// All sections are optional here; [`ConfigFile::try_from`] enforces the
/// invariants (a script must be named, durations must parse, ...).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub process: ProcessSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub timing: TimingSection,
}

/// `[process]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProcessSection {
    /// Entry program. Required after merging CLI overrides.
    #[serde(default)]
    pub script: Option<String>,

    /// Optional program that runs the script (`argv = [interpreter, script, args..]`).
    #[serde(default)]
    pub interpreter: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Spawn immediately on construction. Defaults to `true`.
    #[serde(default)]
    pub autostart: Option<bool>,

    #[serde(default)]
    pub cwd: Option<String>,

    #[serde(default)]
    pub stdin: StdioMode,

    #[serde(default)]
    pub stdout: StdioMode,

    #[serde(default)]
    pub stderr: StdioMode,

    /// Extra environment variables for the child.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatchSection {
    /// Globs to watch. Empty disables file-triggered restarts.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Globs to ignore. Ignore always wins over watch.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// `[timing]` section. Values are duration strings like `"3s"` or `"200ms"`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TimingSection {
    #[serde(default)]
    pub restart_timeout: Option<String>,

    #[serde(default)]
    pub watcher_delay: Option<String>,

    #[serde(default)]
    pub debounce: Option<String>,

    #[serde(default)]
    pub dedup_ttl: Option<String>,
}

impl RawConfigFile {
    /// Rewrite relative `script`, `cwd` and glob entries so they are rooted at
    /// `base`.
    ///
    /// A relative script that does not exist under `base` is left untouched so
    /// it can still be looked up on `PATH`.
    pub fn anchor_paths(&mut self, base: &Path) {
        if let Some(script) = self.process.script.as_mut() {
            if Path::new(script.as_str()).is_relative() && base.join(script.as_str()).exists() {
                *script = anchor(base, script);
            }
        }
        if let Some(cwd) = self.process.cwd.as_mut() {
            *cwd = anchor(base, cwd);
        }
        for glob in self.watch.paths.iter_mut().chain(self.watch.ignore.iter_mut()) {
            *glob = anchor(base, glob);
        }
    }
}

/// Validated configuration. Immutable once built.
///
/// Build it via `ConfigFile::try_from(raw)` (see `config/validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub process: ProcessConfig,
    pub watch: WatchConfig,
    pub timing: Timing,
}

#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub script: PathBuf,
    pub interpreter: Option<String>,
    pub args: Vec<String>,
    pub autostart: bool,
    pub cwd: Option<PathBuf>,
    pub stdio: StdioConfig,
    pub env: BTreeMap<String, String>,
}

/// Explicit wiring of the child's standard streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StdioConfig {
    pub stdin: StdioMode,
    pub stdout: StdioMode,
    pub stderr: StdioMode,
}

#[derive(Debug, Clone, Default)]
pub struct WatchConfig {
    pub paths: Vec<String>,
    pub ignore: Vec<String>,
}

impl WatchConfig {
    /// File-triggered restarts are enabled only when something is watched.
    pub fn is_enabled(&self) -> bool {
        !self.paths.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub restart_timeout: Duration,
    pub watcher_delay: Duration,
    pub debounce: Duration,
    pub dedup_ttl: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            restart_timeout: DEFAULT_RESTART_TIMEOUT,
            watcher_delay: DEFAULT_WATCHER_DELAY,
            debounce: DEFAULT_DEBOUNCE,
            dedup_ttl: DEFAULT_DEDUP_TTL,
        }
    }
}

impl ConfigFile {
    pub(crate) fn new_unchecked(process: ProcessConfig, watch: WatchConfig, timing: Timing) -> Self {
        Self {
            process,
            watch,
            timing,
        }
    }
}
