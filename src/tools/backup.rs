//! Backup and rollback around fixer invocations
//!
//! Before a fixer touches a file its bytes are copied to a sibling
//! `<name><BACKUP_SUFFIX>` file. A successful fixer discards the copy, a failed one
//! moves it back over the original. A crashed run can leave orphans behind;
//! [`cleanup_backups`] sweeps them.

use ignore::WalkBuilder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Marker appended to the original file name
pub const BACKUP_SUFFIX: &str = ".codex.bak";

/// Sibling copy of a file taken right before a fixer runs
///
/// Scoped to a single fixer invocation and never shared between workers.
#[derive(Debug)]
#[must_use = "a backup must be restored or discarded"]
pub struct BackupHandle {
    original: PathBuf,
    backup: PathBuf,
}

impl BackupHandle {
    /// Copy `file` to its backup path
    pub fn create(file: &Path) -> io::Result<Self> {
        let backup = backup_path(file);
        fs::copy(file, &backup)?;
        Ok(Self {
            original: file.to_path_buf(),
            backup,
        })
    }

    pub fn path(&self) -> &Path {
        &self.backup
    }

    /// Move the backup over the original, consuming the handle
    ///
    /// Returns `false` when the backup had already disappeared.
    pub fn restore(self) -> io::Result<bool> {
        if !self.backup.exists() {
            return Ok(false);
        }
        fs::rename(&self.backup, &self.original).or_else(|_| {
            // rename can fail across filesystems or on locked targets
            fs::copy(&self.backup, &self.original)?;
            fs::remove_file(&self.backup)
        })?;
        Ok(true)
    }

    /// Delete the backup after a successful fix
    pub fn discard(self) -> io::Result<()> {
        match fs::remove_file(&self.backup) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Backup location for `file`: the suffix appended to the full file name
pub fn backup_path(file: &Path) -> PathBuf {
    let mut name = file
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(BACKUP_SUFFIX);
    file.with_file_name(name)
}

pub fn is_backup_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(BACKUP_SUFFIX))
}

/// Delete every orphaned backup under `root`
///
/// Walks the whole tree, skip-set included. Files that cannot be removed are
/// logged and left in place. Returns the number of backups deleted.
pub fn cleanup_backups(root: &Path) -> usize {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .build();

    let mut removed = 0;
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry during cleanup: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) || !is_backup_file(entry.path()) {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::debug!("Removed orphaned backup {}", entry.path().display());
                removed += 1;
            }
            Err(e) => tracing::warn!("Could not remove {}: {}", entry.path().display(), e),
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/src/app.py")),
            PathBuf::from("/src/app.py.codex.bak")
        );
        assert_eq!(
            backup_path(Path::new("Makefile")),
            PathBuf::from("Makefile.codex.bak")
        );
        assert!(is_backup_file(Path::new("x/app.py.codex.bak")));
        assert!(!is_backup_file(Path::new("x/app.py")));
    }

    #[test]
    fn test_restore_brings_back_original_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("app.py");
        fs::write(&file, b"original\n").unwrap();

        let handle = BackupHandle::create(&file).unwrap();
        let backup = handle.path().to_path_buf();
        assert!(backup.exists());

        fs::write(&file, b"mangled by fixer\n").unwrap();
        assert!(handle.restore().unwrap());

        assert_eq!(fs::read(&file).unwrap(), b"original\n");
        assert!(!backup.exists());
    }

    #[test]
    fn test_discard_removes_backup_and_keeps_changes() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("app.py");
        fs::write(&file, b"before").unwrap();

        let handle = BackupHandle::create(&file).unwrap();
        let backup = handle.path().to_path_buf();
        fs::write(&file, b"after").unwrap();
        handle.discard().unwrap();

        assert!(!backup.exists());
        assert_eq!(fs::read(&file).unwrap(), b"after");
    }

    #[test]
    fn test_restore_without_backup_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("app.py");
        fs::write(&file, b"before").unwrap();

        let handle = BackupHandle::create(&file).unwrap();
        fs::remove_file(handle.path()).unwrap();
        fs::write(&file, b"after").unwrap();

        assert!(!handle.restore().unwrap());
        assert_eq!(fs::read(&file).unwrap(), b"after");
    }

    #[test]
    fn test_create_fails_for_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(BackupHandle::create(&temp_dir.path().join("missing.py")).is_err());
    }

    #[test]
    fn test_cleanup_removes_orphans_everywhere() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("node_modules/deep")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("a.py.codex.bak"), "x").unwrap();
        fs::write(root.join("node_modules/deep/b.js.codex.bak"), "x").unwrap();
        fs::write(root.join(".hidden/c.rs.codex.bak"), "x").unwrap();
        fs::write(root.join("keep.py"), "x").unwrap();

        assert_eq!(cleanup_backups(root), 3);
        assert!(root.join("keep.py").exists());
        assert!(!root.join("a.py.codex.bak").exists());

        // Idempotent
        assert_eq!(cleanup_backups(root), 0);
    }
}
