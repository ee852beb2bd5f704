// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub mod mock;

/// What a path points at, as far as the resolver cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symbolic links (as listed), sockets, fifos, devices.
    Other,
}

/// Abstract filesystem interface used by the path resolver.
///
/// Errors are plain `io::Error`s so callers can tell "not found" apart from
/// everything else.
pub trait FileSystem: Send + Sync + Debug {
    /// Stat a path, following symbolic links.
    fn stat(&self, path: &Path) -> io::Result<EntryKind>;

    /// Return the entries of a directory in listing order, with full paths.
    ///
    /// Entry kinds are reported without following symbolic links.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<(PathBuf, EntryKind)>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        let meta = fs::metadata(path)?;
        Ok(kind_of(meta.file_type()))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<(PathBuf, EntryKind)>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let kind = kind_of(entry.file_type()?);
            entries.push((entry.path(), kind));
        }
        Ok(entries)
    }
}

fn kind_of(file_type: fs::FileType) -> EntryKind {
    if file_type.is_dir() {
        EntryKind::Dir
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}
