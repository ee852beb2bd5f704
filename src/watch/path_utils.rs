// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.
//!
//! Globs and candidate paths are compared as strings with forward slashes,
//! whatever the platform separator is.

use std::path::Path;

/// Convert a path into the string form used for pattern matching.
///
/// Backslashes become forward slashes and any leading `./` is dropped, so
/// entries listed under the root `.` match relative globs like `src/*.js`.
pub fn normalize_path(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    let mut rest = s.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.to_string()
}

/// Root a (possibly relative) path or glob at `base`.
///
/// Absolute inputs are returned normalized but otherwise unchanged.
pub fn anchor(base: &Path, raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('/') || Path::new(trimmed).is_absolute() {
        return trimmed.replace('\\', "/");
    }

    let mut rel = trimmed;
    while let Some(stripped) = rel.strip_prefix("./") {
        rel = stripped;
    }

    let base = normalize_path(base);
    if rel.is_empty() || rel == "." {
        return base;
    }
    if base.is_empty() || base == "." {
        return rel.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), rel)
}
