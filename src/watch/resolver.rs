// src/watch/resolver.rs

//! Path resolver: walk the pattern roots and collect what to watch.
//!
//! Ignore is checked before descending, so an ignored subtree is never
//! listed. Walked directories are kept as directory targets so files created
//! later show up through the (non-recursive) directory watch.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::errors::{RespawnError, Result};
use crate::fs::{EntryKind, FileSystem};
use crate::watch::path_utils::normalize_path;
use crate::watch::patterns::PatternSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    File,
    Dir,
}

/// One concrete path to open a native watch on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchTarget {
    pub path: PathBuf,
    pub kind: TargetKind,
}

/// De-duplicated, ordered result of one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct WatchSet {
    targets: Vec<WatchTarget>,
    seen: HashSet<PathBuf>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a target unless its path is already present.
    pub fn push(&mut self, path: PathBuf, kind: TargetKind) -> bool {
        if !self.seen.insert(path.clone()) {
            return false;
        }
        self.targets.push(WatchTarget { path, kind });
        true
    }

    pub fn targets(&self) -> &[WatchTarget] {
        &self.targets
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.targets
            .iter()
            .filter(|t| t.kind == TargetKind::File)
            .map(|t| t.path.as_path())
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Path> {
        self.targets
            .iter()
            .filter(|t| t.kind == TargetKind::Dir)
            .map(|t| t.path.as_path())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Resolve the roots of `patterns` into a [`WatchSet`].
///
/// - A root that does not exist contributes nothing.
/// - Any other I/O error is fatal and returned as [`RespawnError::Resolve`].
pub fn resolve(fs: &dyn FileSystem, patterns: &PatternSet) -> Result<WatchSet> {
    let mut set = WatchSet::new();

    for root in patterns.roots() {
        let key = normalize_path(root);
        if patterns.is_ignored(&key) {
            debug!(root = %root.display(), "watch root is ignored; skipping");
            continue;
        }

        let kind = match fs.stat(root) {
            Ok(kind) => kind,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(root = %root.display(), "watch root does not exist; skipping");
                continue;
            }
            Err(source) => {
                return Err(RespawnError::Resolve {
                    path: root.clone(),
                    source,
                });
            }
        };

        match kind {
            EntryKind::File => {
                if patterns.is_watched(&key) {
                    set.push(root.clone(), TargetKind::File);
                }
            }
            EntryKind::Dir => {
                set.push(root.clone(), TargetKind::Dir);
                walk(fs, patterns, root, &mut set)?;
            }
            EntryKind::Other => {
                trace!(root = %root.display(), "watch root is not a file or directory");
            }
        }
    }

    debug!(targets = set.len(), "resolved watch set");
    Ok(set)
}

fn walk(fs: &dyn FileSystem, patterns: &PatternSet, dir: &Path, set: &mut WatchSet) -> Result<()> {
    let entries = match fs.read_dir(dir) {
        Ok(entries) => entries,
        // Vanished between listing and descent.
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(RespawnError::Resolve {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    for (path, kind) in entries {
        let key = normalize_path(&path);
        if patterns.is_ignored(&key) {
            trace!(path = %key, "ignored");
            continue;
        }
        match kind {
            EntryKind::Dir => {
                set.push(path.clone(), TargetKind::Dir);
                walk(fs, patterns, &path, set)?;
            }
            EntryKind::File => {
                if patterns.is_watched(&key) {
                    set.push(path, TargetKind::File);
                }
            }
            EntryKind::Other => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn patterns(watch: &[&str], ignore: &[&str]) -> PatternSet {
        let w: Vec<String> = watch.iter().map(|s| s.to_string()).collect();
        let i: Vec<String> = ignore.iter().map(|s| s.to_string()).collect();
        PatternSet::compile(&w, &i).unwrap()
    }

    #[test]
    fn walks_depth_first_and_keeps_directories() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/src/app.js");
        fs.add_file("/proj/src/readme.md");
        fs.add_file("/proj/src/lib/util.js");

        let set = resolve(&fs, &patterns(&["/proj/src/**/*.js"], &[])).unwrap();
        let files: Vec<_> = set.files().map(|p| p.to_path_buf()).collect();
        let dirs: Vec<_> = set.dirs().map(|p| p.to_path_buf()).collect();
        assert_eq!(
            files,
            vec![
                PathBuf::from("/proj/src/app.js"),
                PathBuf::from("/proj/src/lib/util.js")
            ]
        );
        assert_eq!(
            dirs,
            vec![PathBuf::from("/proj/src"), PathBuf::from("/proj/src/lib")]
        );
    }

    #[test]
    fn ignored_subtree_is_never_listed() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/src/app.js");
        fs.add_file("/proj/src/vendor/x.js");
        // Listing it would fail; ignore must short-circuit first.
        fs.deny("/proj/src/vendor");

        let set = resolve(&fs, &patterns(&["/proj/src/**/*.js"], &["/proj/src/vendor"])).unwrap();
        assert!(set.contains(Path::new("/proj/src/app.js")));
        assert!(!set.contains(Path::new("/proj/src/vendor")));
        assert!(!set.contains(Path::new("/proj/src/vendor/x.js")));
    }

    #[test]
    fn file_root_and_overlapping_roots_are_deduplicated() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/app.js");
        let set = resolve(&fs, &patterns(&["/proj/app.js", "/proj/app.js/"], &[])).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.targets()[0].kind, TargetKind::File);
    }

    #[test]
    fn symlinks_in_listings_are_skipped() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/a.js");
        fs.add_other("/proj/link.js");
        let set = resolve(&fs, &patterns(&["/proj/*.js"], &[])).unwrap();
        assert!(set.contains(Path::new("/proj/a.js")));
        assert!(!set.contains(Path::new("/proj/link.js")));
    }
}
