use std::path::{Path, PathBuf};

use regex::RegexSet;
use tracing::debug;

/// Patterns a path must never match: parent traversal and system roots.
const BANNED_PATTERNS: &[&str] = &[r"\.\.", "/etc/", "/root", "/var/", "/usr/"];

/// Deny-list check for filesystem paths requested by the LLM.
///
/// A path is rejected when either its literal form or its absolute form
/// (resolved against the base directory, without touching the filesystem)
/// matches one of the banned patterns.
pub struct PathGuard {
    banned: RegexSet,
    base: PathBuf,
}

impl PathGuard {
    /// Guard resolving relative paths against the current working directory.
    pub fn new() -> Self {
        Self::with_base(std::env::current_dir().unwrap_or_default())
    }

    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            banned: RegexSet::new(BANNED_PATTERNS).expect("banned path patterns are valid"),
            base: base.into(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Returns true if the path may be used.
    pub fn validate(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }

        if self.banned.is_match(path) {
            debug!("Path rejected by deny-list (literal form)");
            return false;
        }

        let absolute = resolve(path, &self.base);
        if self.banned.is_match(&absolute.to_string_lossy()) {
            debug!("Path rejected by deny-list (absolute form)");
            return false;
        }

        true
    }
}

impl Default for PathGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Lexical absolute form of `path` taken relative to `base`. An absolute
/// `path` ignores `base`.
pub fn resolve(path: impl AsRef<Path>, base: &Path) -> PathBuf {
    absolute_path(&base.join(path))
}

/// Lexical absolute form of `path`. Symlinks are not resolved and the
/// target does not need to exist.
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
