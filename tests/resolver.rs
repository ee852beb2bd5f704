use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use respawn::errors::RespawnError;
use respawn::fs::RealFileSystem;
use respawn::fs::mock::MockFileSystem;
use respawn::watch::path_utils::normalize_path;
use respawn::watch::{PatternSet, TargetKind, resolve};

type TestResult = Result<(), Box<dyn Error>>;

fn patterns(watch: &[&str], ignore: &[&str]) -> PatternSet {
    let w: Vec<String> = watch.iter().map(|s| s.to_string()).collect();
    let i: Vec<String> = ignore.iter().map(|s| s.to_string()).collect();
    PatternSet::compile(&w, &i).unwrap()
}

#[test]
fn missing_root_resolves_to_nothing() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/other.txt");

    let set = resolve(&fs, &patterns(&["/proj/src/**/*.js", "/proj/missing.js"], &[]))?;
    assert!(set.is_empty());
    Ok(())
}

#[test]
fn permission_denied_on_root_is_fatal() {
    let fs = MockFileSystem::new();
    fs.add_dir("/proj/src");
    fs.deny("/proj/src");

    match resolve(&fs, &patterns(&["/proj/src"], &[])) {
        Err(RespawnError::Resolve { path, source }) => {
            assert_eq!(path, PathBuf::from("/proj/src"));
            assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
        }
        other => panic!("expected Resolve error, got {:?}", other),
    }
}

#[test]
fn permission_denied_below_root_is_fatal() {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/app.js");
    fs.add_dir("/proj/src/private");
    fs.deny("/proj/src/private");

    let err = resolve(&fs, &patterns(&["/proj/src/**/*.js"], &[])).unwrap_err();
    assert!(matches!(err, RespawnError::Resolve { ref path, .. } if path == Path::new("/proj/src/private")));
}

#[test]
fn ignored_root_is_skipped_entirely() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/node_modules/dep/index.js");
    fs.deny("/proj/node_modules");

    let set = resolve(
        &fs,
        &patterns(&["/proj/node_modules"], &["/proj/node_modules"]),
    )?;
    assert!(set.is_empty());
    Ok(())
}

#[test]
fn literal_directory_watches_whole_subtree() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/config/app.toml");
    fs.add_file("/proj/config/env/dev.toml");

    let set = resolve(&fs, &patterns(&["/proj/config/"], &[]))?;
    let files: Vec<PathBuf> = set.files().map(Path::to_path_buf).collect();
    assert_eq!(
        files,
        vec![
            PathBuf::from("/proj/config/app.toml"),
            PathBuf::from("/proj/config/env/dev.toml"),
        ]
    );
    assert_eq!(set.dirs().count(), 2);
    Ok(())
}

#[test]
fn real_filesystem_walk_honours_ignore() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    let src = root.join("src");
    fs::create_dir_all(src.join("lib"))?;
    fs::create_dir_all(src.join("vendor"))?;
    fs::write(src.join("app.js"), "// app")?;
    fs::write(src.join("readme.md"), "# readme")?;
    fs::write(src.join("lib").join("util.js"), "// util")?;
    fs::write(src.join("vendor").join("x.js"), "// vendored")?;

    let base = normalize_path(&root);
    let watch = format!("{}/src/**/*.js", base);
    let ignore = format!("{}/src/vendor", base);
    let set = resolve(&RealFileSystem, &patterns(&[&watch], &[&ignore]))?;

    assert!(set.contains(&src.join("app.js")));
    assert!(set.contains(&src.join("lib").join("util.js")));
    assert!(set.contains(&src.join("lib")));
    assert!(!set.contains(&src.join("readme.md")));
    assert!(!set.contains(&src.join("vendor")));
    assert!(!set.contains(&src.join("vendor").join("x.js")));

    let first = &set.targets()[0];
    assert_eq!(first.path, src);
    assert_eq!(first.kind, TargetKind::Dir);
    Ok(())
}
