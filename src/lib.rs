// src/lib.rs

pub mod cli;
pub mod config;
pub mod control;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_for_cli;
use crate::config::model::ConfigFile;
use crate::engine::Reloader;
use crate::exec::LaunchSpec;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::patterns::PatternSet;
use crate::watch::resolver::{TargetKind, resolve};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - the reloader with real process and watch backends
/// - Ctrl-C handling and unix control signals (see [`control`])
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_for_cli(&args)?;

    if args.dry_run {
        print_dry_run(&cfg, &RealFileSystem)?;
        return Ok(());
    }

    let reloader = Reloader::with_real_backends(&cfg)?;

    // Ctrl-C → graceful shutdown.
    {
        let handle = reloader.handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; shutting down");
            handle.shutdown();
        });
    }

    #[cfg(unix)]
    {
        control::listen(reloader.handle())?;
        if !cfg.process.autostart {
            info!(
                pid = std::process::id(),
                "autostart disabled; send SIGUSR1 to start"
            );
        }
    }
    #[cfg(not(unix))]
    {
        if !cfg.process.autostart {
            anyhow::bail!("--no-autostart needs unix control signals to start the process");
        }
    }

    reloader.run().await?;
    Ok(())
}

/// Dry-run output: print the effective settings and the watch set that would
/// be built right now.
fn print_dry_run(cfg: &ConfigFile, fs: &dyn FileSystem) -> Result<()> {
    let launch = LaunchSpec::from_config(&cfg.process);

    println!("respawn dry-run");
    println!("  command: {launch}");
    if let Some(cwd) = &cfg.process.cwd {
        println!("  cwd: {}", cwd.display());
    }
    for (key, value) in &cfg.process.env {
        println!("  env: {key}={value}");
    }
    println!("  autostart: {}", cfg.process.autostart);
    println!(
        "  stdio: stdin={:?} stdout={:?} stderr={:?}",
        cfg.process.stdio.stdin, cfg.process.stdio.stdout, cfg.process.stdio.stderr
    );
    println!("  restart_timeout: {:?}", cfg.timing.restart_timeout);
    println!("  watcher_delay: {:?}", cfg.timing.watcher_delay);
    println!("  debounce: {:?}", cfg.timing.debounce);
    println!("  dedup_ttl: {:?}", cfg.timing.dedup_ttl);
    println!();

    if !cfg.watch.is_enabled() {
        println!("watch: disabled (no watch globs)");
        return Ok(());
    }

    let patterns = PatternSet::compile(&cfg.watch.paths, &cfg.watch.ignore)?;
    println!("watch ({}):", patterns.watch_patterns().len());
    for p in patterns.watch_patterns() {
        println!("  - {} (root: {}, {:?})", p.source(), p.root(), p.anchor());
    }
    if !patterns.ignore_patterns().is_empty() {
        println!("ignore ({}):", patterns.ignore_patterns().len());
        for p in patterns.ignore_patterns() {
            println!("  - {}", p.source());
        }
    }

    let set = resolve(fs, &patterns)?;
    println!();
    println!("resolved watch set ({}):", set.len());
    for target in set.targets() {
        let tag = match target.kind {
            TargetKind::File => "file",
            TargetKind::Dir => "dir ",
        };
        println!("  {tag} {}", target.path.display());
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
