//! Per-file mutual exclusion for fix operations
//!
//! The registry hands out one lock per resolved absolute path. Two workers that
//! end up fixing the same file on disk share the same lock, so their fixer
//! invocations never interleave, while unrelated files never contend.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Lock guarding a single file's mutation
pub type FileLock = Arc<Mutex<()>>;

/// Registry of lazily created per-path locks
///
/// Entries are never removed during a run; the map is bounded by the number of
/// distinct files touched. The registry-wide mutex is held only for the
/// lookup-or-insert, never for the caller's critical section.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<PathBuf, FileLock>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for `path`, creating it on first use
    ///
    /// Different spellings of the same file (relative, `..` segments, symlinks)
    /// resolve to the same key and therefore the same lock instance.
    pub fn acquire(&self, path: &Path) -> FileLock {
        let key = resolve_key(path);
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Number of distinct paths that have been locked so far
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Canonical form of a path used as the registry key
///
/// Falls back to a lexical absolute path when the file cannot be canonicalized
/// (for example when it was removed between discovery and fixing).
fn resolve_key(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
