//! Filesystem collaborators injected into the resolver and locator.
//!
//! Existence probes and document reads are the only I/O the core performs.
//! Both go through these traits so callers can substitute an editor's open
//! buffers or an in-memory tree.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Answers "is there a file at this path?".
pub trait FileOracle {
    /// Whether a regular file exists at `path`. Probe failures report `false`.
    fn exists(&self, path: &Path) -> bool;
}

/// Supplies the raw text of a document.
pub trait DocumentSource {
    /// Read the full text of `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ResourceNotFound` if the document is absent,
    /// or `Error::Io` for other read failures.
    fn read_text(&self, path: &Path) -> Result<String, Error>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disk;

impl FileOracle for Disk {
    fn exists(&self, path: &Path) -> bool {
        // Permission errors and the like count as absent.
        return std::fs::metadata(path).is_ok_and(|meta| return meta.is_file());
    }
}

impl DocumentSource for Disk {
    fn read_text(&self, path: &Path) -> Result<String, Error> {
        return match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::ResourceNotFound { path: path.to_path_buf() })
            },
            Err(e) => Err(Error::Io(e)),
            Ok(text) => Ok(text),
        };
    }
}

/// An in-memory file tree. Paths are compared after separator normalization,
/// so `a\b.php` and `a/b.php` are the same file.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: HashMap<PathBuf, String>,
    unreadable: HashSet<PathBuf>,
}

impl MemoryFs {
    /// An empty tree.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Add (or replace) a file with the given text.
    pub fn insert(&mut self, path: impl AsRef<Path>, text: &str) -> &mut Self {
        self.files.insert(normalize_key(path.as_ref()), text.to_string());
        return self;
    }

    /// Mark a path as failing every probe, as a permission error would.
    pub fn deny(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.unreadable.insert(normalize_key(path.as_ref()));
        return self;
    }
}

impl FileOracle for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        let key = normalize_key(path);
        return !self.unreadable.contains(&key) && self.files.contains_key(&key);
    }
}

impl DocumentSource for MemoryFs {
    fn read_text(&self, path: &Path) -> Result<String, Error> {
        let key = normalize_key(path);
        if self.unreadable.contains(&key) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            )));
        }
        return self
            .files
            .get(&key)
            .cloned()
            .ok_or_else(|| return Error::ResourceNotFound { path: path.to_path_buf() });
    }
}

/// Lookup key with forward slashes only.
fn normalize_key(path: &Path) -> PathBuf {
    return PathBuf::from(path.to_string_lossy().replace('\\', "/"));
}
