pub mod builders;
pub mod fake_process;
pub mod fake_watch;

use std::sync::{Arc, Once};

use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt};

use respawn::config::ConfigFile;
use respawn::engine::{Reloader, ReloaderHandle};
use respawn::fs::FileSystem;

pub use fake_process::{FakeProcessBackend, FakeProcessControl};
pub use fake_watch::{FakeWatchBackend, FakeWatchControl};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Control side of a reloader built by [`fake_reloader`].
#[derive(Debug, Clone)]
pub struct Fakes {
    pub handle: ReloaderHandle,
    pub process: FakeProcessControl,
    pub watch: FakeWatchControl,
}

/// Build a reloader wired to fake process and watch backends.
pub fn fake_reloader(
    config: &ConfigFile,
    fs: Arc<dyn FileSystem>,
) -> (Reloader<FakeProcessBackend, FakeWatchBackend>, Fakes) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (process, process_ctl) = FakeProcessBackend::new(events_tx.clone());
    let (watch, watch_ctl) = FakeWatchBackend::new(events_tx.clone());

    let reloader = Reloader::new(config, fs, process, watch, events_tx, events_rx)
        .expect("Failed to build reloader from config");
    let fakes = Fakes {
        handle: reloader.handle(),
        process: process_ctl,
        watch: watch_ctl,
    };
    (reloader, fakes)
}
