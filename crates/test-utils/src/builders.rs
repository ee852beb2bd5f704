#![allow(dead_code)]

use respawn::config::{ConfigFile, RawConfigFile};
use respawn::types::StdioMode;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Globs and paths are taken as given (no anchoring), so tests should use
/// absolute paths.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new(script: &str) -> Self {
        let mut config = RawConfigFile::default();
        config.process.script = Some(script.to_string());
        Self { config }
    }

    pub fn interpreter(mut self, program: &str) -> Self {
        self.config.process.interpreter = Some(program.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.config.process.args.push(arg.to_string());
        self
    }

    pub fn autostart(mut self, val: bool) -> Self {
        self.config.process.autostart = Some(val);
        self
    }

    pub fn stdout(mut self, mode: StdioMode) -> Self {
        self.config.process.stdout = mode;
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.config
            .process
            .env
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn watch(mut self, glob: &str) -> Self {
        self.config.watch.paths.push(glob.to_string());
        self
    }

    pub fn ignore(mut self, glob: &str) -> Self {
        self.config.watch.ignore.push(glob.to_string());
        self
    }

    pub fn restart_timeout(mut self, d: &str) -> Self {
        self.config.timing.restart_timeout = Some(d.to_string());
        self
    }

    pub fn watcher_delay(mut self, d: &str) -> Self {
        self.config.timing.watcher_delay = Some(d.to_string());
        self
    }

    pub fn debounce(mut self, d: &str) -> Self {
        self.config.timing.debounce = Some(d.to_string());
        self
    }

    pub fn dedup_ttl(mut self, d: &str) -> Self {
        self.config.timing.dedup_ttl = Some(d.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}
