//! `read_file` / `write_file` backed by [`PathGuard`].
//!
//! Reads are limited by size, writes by an allow-list of root directories.
//! There is no locking: two writers on the same path race and the last
//! write wins.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::guard::path::resolve;
use crate::guard::PathGuard;

use super::ToolError;

/// Default read limit: 1 MiB
pub const DEFAULT_MAX_READ_SIZE: u64 = 1024 * 1024;

pub struct FileAccessor {
    guard: PathGuard,
    /// Absolute allow-listed roots for writes.
    allowed_roots: Vec<PathBuf>,
    max_read_size: u64,
}

impl FileAccessor {
    /// Relative roots and paths are resolved against the current working
    /// directory.
    pub fn new(allowed_roots: &[PathBuf], max_read_size: u64) -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::with_base(&cwd, allowed_roots, max_read_size)
    }

    /// Same as [`new`](Self::new) with relative roots and paths resolved
    /// against `base`.
    pub fn with_base(base: &Path, allowed_roots: &[PathBuf], max_read_size: u64) -> Self {
        Self {
            allowed_roots: allowed_roots.iter().map(|root| resolve(root, base)).collect(),
            guard: PathGuard::with_base(base),
            max_read_size,
        }
    }

    pub fn max_read_size(&self) -> u64 {
        self.max_read_size
    }

    /// Reads a whole file as UTF-8 text.
    ///
    /// The reported size is checked before anything is loaded, then the read
    /// itself stops after `max_size + 1` bytes, so FIFOs and `/proc` or
    /// `/dev` files that report a size of zero are bounded too.
    pub fn read(&self, path: &str, max_size: u64) -> Result<String, ToolError> {
        if !self.guard.validate(path) {
            warn!("read_file: path rejected");
            return Err(ToolError::InvalidPath);
        }

        let target = resolve(path, self.guard.base());
        let size = fs::metadata(&target)?.len();
        if size > max_size {
            return Err(ToolError::TooLarge {
                size,
                max: max_size,
            });
        }

        let mut bytes = Vec::new();
        File::open(&target)?
            .take(max_size.saturating_add(1))
            .read_to_end(&mut bytes)?;
        if bytes.len() as u64 > max_size {
            warn!("read_file: {} grew past the read limit", target.display());
            return Err(ToolError::TooLarge {
                size: bytes.len() as u64,
                max: max_size,
            });
        }

        let content =
            String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        debug!("read_file: {} bytes from {}", content.len(), target.display());
        Ok(content)
    }

    /// Writes `content` to `path`, replacing any existing file.
    pub fn write(&self, path: &str, content: &str, create_dirs: bool) -> Result<String, ToolError> {
        if !self.guard.validate(path) {
            warn!("write_file: path rejected");
            return Err(ToolError::InvalidPath);
        }

        let target = resolve(path, self.guard.base());
        if !self.is_allowed(&target) {
            warn!("write_file: {} is outside the allowed directories", target.display());
            return Err(ToolError::Forbidden);
        }

        if create_dirs {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&target, content)?;
        info!("write_file: {} bytes to {}", content.len(), target.display());
        Ok(format!("File {path} written successfully"))
    }

    /// Component-wise containment, so `/tmpfoo` is not under `/tmp`.
    fn is_allowed(&self, target: &Path) -> bool {
        self.allowed_roots.iter().any(|root| target.starts_with(root))
    }
}
