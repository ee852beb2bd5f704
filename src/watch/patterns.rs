// src/watch/patterns.rs

//! Glob → anchored regex compiler.
//!
//! Supported wildcards:
//! - `*` matches any run of characters inside one path segment.
//! - `?` matches exactly one character inside one path segment.
//! - `**` as a whole segment matches zero or more nested segments; embedded
//!   in a longer segment (`**.txt`) it matches anything, separators included.
//!
//! A glob without any wildcard names a concrete path and is compiled in
//! [`AnchorMode::Subtree`]: it matches the path itself and everything below
//! it. Every other glob is compiled in [`AnchorMode::Exact`].

use std::fmt;
use std::path::PathBuf;

use regex::Regex;

use crate::errors::{RespawnError, Result};

/// How a compiled pattern is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorMode {
    /// Full-string match of the expanded glob only.
    Exact,
    /// The literal path, or anything below it.
    Subtree,
}

/// A glob compiled into a matcher plus the wildcard-free root that bounds the
/// file-system walk.
#[derive(Clone)]
pub struct CompiledPattern {
    source: String,
    anchor: AnchorMode,
    matcher: Regex,
    root: String,
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("source", &self.source)
            .field("anchor", &self.anchor)
            .field("root", &self.root)
            .field("regex", &self.matcher.as_str())
            .finish()
    }
}

impl CompiledPattern {
    /// The glob as written in the config.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn anchor(&self) -> AnchorMode {
        self.anchor
    }

    /// Longest wildcard-free leading run of segments.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Whether `path` (forward-slash form) matches this pattern.
    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }
}

/// Compile a single glob.
pub fn compile(glob: &str) -> Result<CompiledPattern> {
    let trimmed = trim_trailing_separators(glob);
    if trimmed.is_empty() {
        return Err(RespawnError::ConfigError(format!(
            "empty glob pattern {:?}",
            glob
        )));
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    let wildcard_at = segments.iter().position(|s| has_wildcard(s));

    let (anchor, expr, root) = match wildcard_at {
        None => {
            let expr = if trimmed == "/" {
                "^/.*$".to_string()
            } else {
                format!("^{}(?:/.*)?$", regex::escape(&trimmed))
            };
            (AnchorMode::Subtree, expr, trimmed.clone())
        }
        Some(idx) => {
            let expr = format!("^{}$", translate(&segments));
            (AnchorMode::Exact, expr, root_of(&segments[..idx], &trimmed))
        }
    };

    let matcher = Regex::new(&expr).map_err(|source| RespawnError::Pattern {
        pattern: glob.to_string(),
        source,
    })?;

    Ok(CompiledPattern {
        source: glob.to_string(),
        anchor,
        matcher,
        root,
    })
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains('*') || segment.contains('?')
}

fn trim_trailing_separators(glob: &str) -> String {
    let normalized = glob.trim().replace('\\', "/");
    let trimmed = normalized.trim_end_matches('/');
    if trimmed.is_empty() && normalized.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn root_of(prefix: &[&str], glob: &str) -> String {
    let joined = prefix.join("/");
    if !joined.is_empty() {
        joined
    } else if glob.starts_with('/') {
        "/".to_string()
    } else {
        ".".to_string()
    }
}

fn translate(segments: &[&str]) -> String {
    let mut out = String::new();
    let last = segments.len() - 1;

    for (i, segment) in segments.iter().enumerate() {
        if *segment == "**" {
            // The separator after a `**` segment is part of the optional group.
            if i == last {
                out.push_str(".*");
            } else {
                out.push_str("(?:.*/)?");
            }
            continue;
        }

        out.push_str(&translate_segment(segment));
        if i != last {
            out.push('/');
        }
    }

    out
}

fn translate_segment(segment: &str) -> String {
    let mut out = String::new();
    let mut literal = String::new();
    let mut chars = segment.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                if chars.peek() == Some(&'*') {
                    while chars.peek() == Some(&'*') {
                        chars.next();
                    }
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str("[^/]");
            }
            other => literal.push(other),
        }
    }
    out.push_str(&regex::escape(&literal));

    out
}

/// The compiled watch and ignore lists of one configuration.
///
/// Watch and ignore entries go through the same compiler; they only differ
/// in which list they land in. Roots come from the watch list only.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    watch: Vec<CompiledPattern>,
    ignore: Vec<CompiledPattern>,
    roots: Vec<PathBuf>,
}

impl PatternSet {
    pub fn compile(watch: &[String], ignore: &[String]) -> Result<Self> {
        let watch = watch
            .iter()
            .map(|g| compile(g))
            .collect::<Result<Vec<_>>>()?;
        let ignore = ignore
            .iter()
            .map(|g| compile(g))
            .collect::<Result<Vec<_>>>()?;

        let mut roots: Vec<PathBuf> = Vec::new();
        for pattern in &watch {
            let root = PathBuf::from(pattern.root());
            if !roots.contains(&root) {
                roots.push(root);
            }
        }

        Ok(Self {
            watch,
            ignore,
            roots,
        })
    }

    /// De-duplicated walk roots, in the order the watch globs were given.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn watch_patterns(&self) -> &[CompiledPattern] {
        &self.watch
    }

    pub fn ignore_patterns(&self) -> &[CompiledPattern] {
        &self.ignore
    }

    /// No watch globs: file-triggered restarts are disabled.
    pub fn is_empty(&self) -> bool {
        self.watch.is_empty()
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore.iter().any(|p| p.is_match(path))
    }

    pub fn is_watched(&self, path: &str) -> bool {
        self.watch.iter().any(|p| p.is_match(path))
    }

    /// Watched by at least one pattern and ignored by none.
    pub fn accepts(&self, path: &str) -> bool {
        !self.is_ignored(path) && self.is_watched(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concrete_path_compiles_to_subtree() {
        let p = compile("/proj/src/").unwrap();
        assert_eq!(p.anchor(), AnchorMode::Subtree);
        assert_eq!(p.root(), "/proj/src");
        assert!(p.is_match("/proj/src"));
        assert!(p.is_match("/proj/src/a/b.js"));
        assert!(!p.is_match("/proj/srcx"));
        assert!(!p.is_match("/proj"));
    }

    #[test]
    fn dots_are_literal() {
        let p = compile("/proj/app.js").unwrap();
        assert!(p.is_match("/proj/app.js"));
        assert!(!p.is_match("/proj/appxjs"));
    }

    #[test]
    fn star_stays_inside_one_segment() {
        let p = compile("/proj/*.js").unwrap();
        assert_eq!(p.anchor(), AnchorMode::Exact);
        assert_eq!(p.root(), "/proj");
        assert!(p.is_match("/proj/app.js"));
        assert!(!p.is_match("/proj/lib/app.js"));
        assert!(!p.is_match("/proj/app.jsx"));
    }

    #[test]
    fn double_star_segment_matches_zero_or_more_levels() {
        let p = compile("/proj/src/**/*.js").unwrap();
        assert_eq!(p.root(), "/proj/src");
        assert!(p.is_match("/proj/src/app.js"));
        assert!(p.is_match("/proj/src/a/app.js"));
        assert!(p.is_match("/proj/src/a/b/c/app.js"));
        assert!(!p.is_match("/proj/srcapp.js"));
        assert!(!p.is_match("/proj/src/app.ts"));
    }

    #[test]
    fn trailing_double_star_matches_everything_below() {
        let p = compile("/proj/dir/**").unwrap();
        assert!(p.is_match("/proj/dir/x"));
        assert!(p.is_match("/proj/dir/x/y.txt"));
        assert!(!p.is_match("/proj/other/x"));
    }

    #[test]
    fn embedded_double_star_crosses_separators() {
        let p = compile("texts/**.txt").unwrap();
        assert_eq!(p.root(), "texts");
        assert!(p.is_match("texts/a.txt"));
        assert!(p.is_match("texts/a/b.txt"));
    }

    #[test]
    fn question_mark_is_one_character() {
        let p = compile("/proj/dir/*-?.mjs").unwrap();
        assert!(p.is_match("/proj/dir/file-1.mjs"));
        assert!(!p.is_match("/proj/dir/file-12.mjs"));
        assert!(!p.is_match("/proj/dir/file-/.mjs"));
    }

    #[test]
    fn root_falls_back_for_leading_wildcards() {
        assert_eq!(compile("/*.log").unwrap().root(), "/");
        assert_eq!(compile("*.log").unwrap().root(), ".");
        assert_eq!(compile("**/*.rs").unwrap().root(), ".");
    }

    #[test]
    fn regex_metacharacters_are_escaped() {
        let p = compile("/proj/(a)+[b]/*.js").unwrap();
        assert!(p.is_match("/proj/(a)+[b]/x.js"));
        assert!(!p.is_match("/proj/aa/x.js"));
    }

    #[test]
    fn empty_glob_is_rejected() {
        assert!(compile("   ").is_err());
    }

    #[test]
    fn pattern_set_ignore_wins_and_roots_dedupe() {
        let set = PatternSet::compile(
            &[
                "/proj/src/**/*.js".to_string(),
                "/proj/src/*.json".to_string(),
            ],
            &["/proj/src/vendor".to_string()],
        )
        .unwrap();
        assert_eq!(set.roots(), &[PathBuf::from("/proj/src")]);
        assert!(set.accepts("/proj/src/app.js"));
        assert!(set.is_watched("/proj/src/vendor/x.js"));
        assert!(!set.accepts("/proj/src/vendor/x.js"));
        assert!(!set.accepts("/proj/src/readme.md"));
    }
}
