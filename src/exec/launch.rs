// src/exec/launch.rs

//! Turn the process section of the config into a `tokio::process::Command`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use tokio::process::Command;

use crate::config::model::{ProcessConfig, StdioConfig};

/// Everything needed to start one child. Built once, reused on every spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: BTreeMap<String, String>,
    stdio: StdioConfig,
}

impl LaunchSpec {
    /// `argv = [interpreter, script, args..]` with an interpreter,
    /// `[script, args..]` without.
    pub fn from_config(process: &ProcessConfig) -> Self {
        let script = process.script.to_string_lossy().into_owned();
        let (program, args) = match &process.interpreter {
            Some(interpreter) => {
                let mut args = Vec::with_capacity(process.args.len() + 1);
                args.push(script);
                args.extend(process.args.iter().cloned());
                (interpreter.clone(), args)
            }
            None => (script, process.args.clone()),
        };

        Self {
            program,
            args,
            cwd: process.cwd.clone(),
            env: process.env.clone(),
            stdio: process.stdio,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn stdio(&self) -> StdioConfig {
        self.stdio
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(&self.env)
            .stdin(self.stdio.stdin.to_stdio())
            .stdout(self.stdio.stdout.to_stdio())
            .stderr(self.stdio.stderr.to_stdio())
            .kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

impl fmt::Display for LaunchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
