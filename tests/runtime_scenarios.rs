// tests/runtime_scenarios.rs

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::sleep;

use respawn::config::ConfigFile;
use respawn::errors::RespawnError;
use respawn::fs::mock::MockFileSystem;
use respawn::types::{ChangeKind, InstanceId, SupervisorState};
use respawn_test_utils::builders::ConfigBuilder;
use respawn_test_utils::{fake_reloader, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// Config from end-to-end scenario A, with default timings
/// (cooldown 3s, watcher delay 1s, debounce 200ms, dedup 200ms).
fn watched_config() -> ConfigFile {
    ConfigBuilder::new("/proj/server.js")
        .interpreter("node")
        .watch("/proj/src/**/*.js")
        .ignore("/proj/src/vendor")
        .build()
}

fn project_fs() -> Arc<MockFileSystem> {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/server.js");
    fs.add_file("/proj/src/index.js");
    fs.add_dir("/proj/src/vendor");
    Arc::new(fs)
}

async fn wait_for_state(
    rx: &mut tokio::sync::watch::Receiver<SupervisorState>,
    state: SupervisorState,
) {
    with_timeout(rx.wait_for(|s| *s == state))
        .await
        .expect("reloader dropped its state sender");
}

#[tokio::test(start_paused = true)]
async fn new_file_in_watched_tree_restarts_once_and_vendor_is_ignored() -> TestResult {
    init_tracing();

    let (reloader, fakes) = fake_reloader(&watched_config(), project_fs());
    let task = tokio::spawn(reloader.run());
    let mut states = fakes.handle.state_changes();

    wait_for_state(&mut states, SupervisorState::Started).await;
    assert_eq!(fakes.process.spawned(), vec![InstanceId(1)]);

    // Watch set is built after the watcher delay.
    sleep(Duration::from_millis(1100)).await;
    let open = fakes.watch.open_paths();
    assert!(open.contains(&"/proj/src".into()));
    assert!(open.contains(&"/proj/src/index.js".into()));
    assert!(!open.contains(&"/proj/src/vendor".into()));

    fakes.watch.emit(ChangeKind::Create, "/proj/src/vendor/x.js");
    sleep(Duration::from_millis(500)).await;
    assert_eq!(fakes.process.spawn_count(), 1);
    assert!(fakes.process.killed().is_empty());

    // An editor save: create, then change twice and a rename.
    fakes.watch.emit(ChangeKind::Create, "/proj/src/app.js");
    fakes.watch.emit(ChangeKind::Change, "/proj/src/app.js");
    fakes.watch.emit(ChangeKind::Change, "/proj/src/app.js");
    fakes.watch.emit(ChangeKind::Rename, "/proj/src/app.js");

    sleep(Duration::from_millis(100)).await;
    assert_eq!(fakes.handle.state(), SupervisorState::RestartDelay);
    assert_eq!(fakes.process.spawn_count(), 1);

    sleep(Duration::from_millis(200)).await;
    wait_for_state(&mut states, SupervisorState::Started).await;
    assert_eq!(fakes.process.killed(), vec![InstanceId(1)]);
    assert_eq!(fakes.process.spawned(), vec![InstanceId(1), InstanceId(2)]);

    // The watch set survives restarts.
    assert_eq!(fakes.watch.created_count(), 1);
    assert_eq!(fakes.watch.close_count(), 0);

    fakes.handle.shutdown();
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn crash_respawns_once_after_cooldown() -> TestResult {
    init_tracing();

    let (reloader, fakes) = fake_reloader(&watched_config(), project_fs());
    let task = tokio::spawn(reloader.run());
    let mut states = fakes.handle.state_changes();
    wait_for_state(&mut states, SupervisorState::Started).await;

    fakes.process.exit(InstanceId(1), Some(1));
    wait_for_state(&mut states, SupervisorState::Closed).await;

    sleep(Duration::from_millis(2900)).await;
    assert_eq!(fakes.process.spawn_count(), 1);
    assert_eq!(fakes.handle.state(), SupervisorState::Closed);

    sleep(Duration::from_millis(200)).await;
    wait_for_state(&mut states, SupervisorState::Started).await;
    assert_eq!(fakes.process.spawned(), vec![InstanceId(1), InstanceId(2)]);

    // Nothing else is pending.
    sleep(Duration::from_secs(10)).await;
    assert_eq!(fakes.process.spawn_count(), 2);

    fakes.handle.shutdown();
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_closes_watches_and_ignores_late_events() -> TestResult {
    init_tracing();

    let (reloader, fakes) = fake_reloader(&watched_config(), project_fs());
    let task = tokio::spawn(reloader.run());
    let mut states = fakes.handle.state_changes();
    wait_for_state(&mut states, SupervisorState::Started).await;
    sleep(Duration::from_millis(1100)).await;
    assert!(fakes.watch.open_count() > 0);

    fakes.handle.stop();
    wait_for_state(&mut states, SupervisorState::Stopped).await;
    assert_eq!(fakes.watch.open_count(), 0);
    assert_eq!(fakes.watch.close_count(), 1);
    assert_eq!(fakes.process.killed(), vec![InstanceId(1)]);

    fakes.watch.emit(ChangeKind::Change, "/proj/src/index.js");
    sleep(Duration::from_secs(5)).await;
    assert_eq!(fakes.handle.state(), SupervisorState::Stopped);
    assert_eq!(fakes.process.spawn_count(), 1);

    // A later start builds a fresh watch set after the delay.
    fakes.handle.start();
    wait_for_state(&mut states, SupervisorState::Started).await;
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(fakes.watch.created_count(), 2);

    fakes.handle.shutdown();
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn explicit_restart_after_exit_skips_cooldown() -> TestResult {
    init_tracing();

    let (reloader, fakes) = fake_reloader(&watched_config(), project_fs());
    let task = tokio::spawn(reloader.run());
    let mut states = fakes.handle.state_changes();
    wait_for_state(&mut states, SupervisorState::Started).await;

    fakes.process.exit(InstanceId(1), Some(7));
    wait_for_state(&mut states, SupervisorState::Closed).await;

    fakes.handle.restart();
    wait_for_state(&mut states, SupervisorState::Started).await;
    assert_eq!(fakes.process.spawn_count(), 2);
    assert!(fakes.process.killed().is_empty());

    // The cancelled cooldown must not spawn a third process.
    sleep(Duration::from_secs(5)).await;
    assert_eq!(fakes.process.spawn_count(), 2);

    fakes.handle.shutdown();
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_during_cooldown_never_respawns() -> TestResult {
    init_tracing();

    let (reloader, fakes) = fake_reloader(&watched_config(), project_fs());
    let task = tokio::spawn(reloader.run());
    let mut states = fakes.handle.state_changes();
    wait_for_state(&mut states, SupervisorState::Started).await;

    fakes.process.exit(InstanceId(1), Some(1));
    wait_for_state(&mut states, SupervisorState::Closed).await;
    fakes.handle.stop();
    wait_for_state(&mut states, SupervisorState::Stopped).await;

    sleep(Duration::from_secs(10)).await;
    assert_eq!(fakes.process.spawn_count(), 1);
    assert_eq!(fakes.handle.state(), SupervisorState::Stopped);

    fakes.handle.shutdown();
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn spawn_failure_goes_through_cooldown() -> TestResult {
    init_tracing();

    let cfg = ConfigBuilder::new("/proj/missing-binary")
        .restart_timeout("500ms")
        .build();
    let (reloader, fakes) = fake_reloader(&cfg, project_fs());
    fakes.process.fail_next_spawns(2);

    let task = tokio::spawn(reloader.run());
    let mut states = fakes.handle.state_changes();

    sleep(Duration::from_millis(100)).await;
    assert_eq!(fakes.process.attempts(), 1);
    assert_eq!(fakes.handle.state(), SupervisorState::Closed);

    sleep(Duration::from_millis(500)).await;
    assert_eq!(fakes.process.attempts(), 2);

    wait_for_state(&mut states, SupervisorState::Started).await;
    assert_eq!(fakes.process.attempts(), 3);
    assert_eq!(fakes.process.spawned(), vec![InstanceId(3)]);

    fakes.handle.shutdown();
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn spawn_listeners_see_every_instance() -> TestResult {
    init_tracing();

    let cfg = ConfigBuilder::new("/proj/server.js").build();
    let (mut reloader, fakes) = fake_reloader(&cfg, project_fs());

    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        reloader.on_spawn(move |process| {
            seen.lock().unwrap().push((process.instance(), process.pid()));
        });
    }

    let task = tokio::spawn(reloader.run());
    let mut states = fakes.handle.state_changes();
    wait_for_state(&mut states, SupervisorState::Started).await;

    fakes.handle.restart();
    sleep(Duration::from_millis(10)).await;
    wait_for_state(&mut states, SupervisorState::Started).await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (InstanceId(1), Some(1001)),
            (InstanceId(2), Some(1002)),
        ]
    );

    fakes.handle.shutdown();
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn no_autostart_waits_for_start() -> TestResult {
    init_tracing();

    let cfg = ConfigBuilder::new("/proj/server.js").autostart(false).build();
    let (reloader, fakes) = fake_reloader(&cfg, project_fs());
    let task = tokio::spawn(reloader.run());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(fakes.process.attempts(), 0);
    assert_eq!(fakes.handle.state(), SupervisorState::Stopped);

    fakes.handle.start();
    fakes.handle.start();
    let mut states = fakes.handle.state_changes();
    wait_for_state(&mut states, SupervisorState::Started).await;
    assert_eq!(fakes.process.spawn_count(), 1);

    fakes.handle.shutdown();
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unreadable_watch_root_is_fatal() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/index.js");
    fs.deny("/proj/src");

    let (reloader, fakes) = fake_reloader(&watched_config(), Arc::new(fs));
    let task = tokio::spawn(reloader.run());

    let result = with_timeout(task).await?;
    match result {
        Err(RespawnError::Resolve { path, .. }) => {
            assert_eq!(path, std::path::PathBuf::from("/proj/src"))
        }
        other => panic!("expected Resolve error, got {:?}", other),
    }
    // The child is torn down with the loop.
    assert_eq!(fakes.process.killed(), vec![InstanceId(1)]);
    Ok(())
}
