// src/fs/mock.rs

use super::{EntryKind, FileSystem};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
enum MockEntry {
    File,
    Dir(Vec<String>), // List of child names, in insertion order
    Other,
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    denied: HashSet<PathBuf>,
}

/// In-memory file tree for resolver tests.
///
/// Parent directories are created implicitly. Paths marked with
/// [`MockFileSystem::deny`] fail every operation with `PermissionDenied`.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::File);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::Dir(Vec::new()));
    }

    /// Something that is neither a file nor a directory (e.g. a symlink).
    pub fn add_other(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::Other);
    }

    /// Make `stat`/`read_dir` on `path` fail with `PermissionDenied`.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.lock().denied.insert(path.as_ref().to_path_buf());
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned mock only happens after a panicking test; keep going.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert(&self, path: &Path, entry: MockEntry) {
        let mut state = self.lock();
        let is_dir = matches!(entry, MockEntry::Dir(_));
        match state.entries.get(path) {
            Some(MockEntry::Dir(_)) if is_dir => {}
            _ => {
                state.entries.insert(path.to_path_buf(), entry);
            }
        }
        Self::link_to_parent(&mut state, path);
    }

    fn link_to_parent(state: &mut MockState, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        if parent.as_os_str().is_empty() || parent == path {
            return;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return;
        };

        let created = !state.entries.contains_key(parent);
        if created {
            state
                .entries
                .insert(parent.to_path_buf(), MockEntry::Dir(Vec::new()));
        }
        if let Some(MockEntry::Dir(children)) = state.entries.get_mut(parent) {
            if !children.contains(&name) {
                children.push(name);
            }
        }
        if created {
            Self::link_to_parent(state, parent);
        }
    }

    fn check_denied(state: &MockState, path: &Path) -> io::Result<()> {
        if state.denied.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {:?}", path),
            ));
        }
        Ok(())
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("not found: {:?}", path))
}

impl FileSystem for MockFileSystem {
    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        let state = self.lock();
        Self::check_denied(&state, path)?;
        match state.entries.get(path) {
            Some(MockEntry::File) => Ok(EntryKind::File),
            Some(MockEntry::Dir(_)) => Ok(EntryKind::Dir),
            Some(MockEntry::Other) => Ok(EntryKind::Other),
            None => Err(not_found(path)),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<(PathBuf, EntryKind)>> {
        let state = self.lock();
        Self::check_denied(&state, path)?;
        match state.entries.get(path) {
            Some(MockEntry::Dir(children)) => Ok(children
                .iter()
                .map(|name| {
                    let child = path.join(name);
                    let kind = match state.entries.get(&child) {
                        Some(MockEntry::Dir(_)) => EntryKind::Dir,
                        Some(MockEntry::File) => EntryKind::File,
                        _ => EntryKind::Other,
                    };
                    (child, kind)
                })
                .collect()),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {:?}", path),
            )),
            None => Err(not_found(path)),
        }
    }
}
