//! Backup-then-write for files touched by a refactoring.
//!
//! Every write goes through [`guarded_write`]: the destination must be writable,
//! its current bytes are copied to a timestamped sibling, and only then is the
//! new content written. The returned [`Backup`] stays on disk unless it is
//! explicitly [`discard`](Backup::discard)ed after the whole change succeeded.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::Local;
use tracing::{debug, warn};

/// Extension appended to every backup file.
pub const BACKUP_EXTENSION: &str = "bak";

/// Why a guarded write did not happen.
#[derive(Debug)]
pub enum GuardedWriteError {
    ReadOnly,
    Backup(io::Error),
    Write(io::Error),
}

/// A retained copy of a file's content from before a write.
#[derive(Debug)]
#[must_use = "a backup should be restored on failure or discarded/kept on success"]
pub struct Backup {
    original: PathBuf,
    copy: PathBuf,
}

impl Backup {
    /// Copy `path` to a fresh `<name>.<timestamp>.bak` sibling.
    pub fn create(path: &Path) -> io::Result<Self> {
        let copy = unique_backup_path(path);
        fs::copy(path, &copy)?;
        debug!(original = %path.display(), backup = %copy.display(), "backup created");
        Ok(Self {
            original: path.to_path_buf(),
            copy,
        })
    }

    pub fn original(&self) -> &Path {
        &self.original
    }

    pub fn path(&self) -> &Path {
        &self.copy
    }

    /// Put the backed-up content back in place. The backup itself is kept.
    pub fn restore(&self) -> io::Result<()> {
        fs::copy(&self.copy, &self.original)?;
        debug!(original = %self.original.display(), "restored from backup");
        Ok(())
    }

    /// Keep the backup on disk and return its path.
    pub fn keep(self) -> PathBuf {
        self.copy
    }

    /// Remove the backup. Only called once the change it guards is verified.
    pub fn discard(self) {
        if let Err(err) = fs::remove_file(&self.copy) {
            warn!(backup = %self.copy.display(), error = %err, "failed to remove backup");
        }
    }

    /// Keep or discard according to the retention setting.
    pub fn finish(self, keep: bool) -> Option<PathBuf> {
        if keep {
            Some(self.keep())
        } else {
            self.discard();
            None
        }
    }
}

/// `dir/en.json` → `dir/en.json.20261016T093012345.bak`, with a numeric
/// suffix when that name is already taken.
pub fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!("{}.{}.{}", file_name, stamp, BACKUP_EXTENSION))
}

fn unique_backup_path(path: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%dT%H%M%S%3f").to_string();
    let candidate = backup_path(path, &stamp);
    if !candidate.exists() {
        return candidate;
    }
    (1..)
        .map(|n| backup_path(path, &format!("{}-{}", stamp, n)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(candidate)
}

/// True when the file's permissions forbid writing.
pub fn is_read_only(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.permissions().readonly())
        .unwrap_or(false)
}

/// Write `content` to `path` after backing it up.
///
/// If the write itself fails the backup is restored before returning, so the
/// file is left as it was.
pub fn guarded_write(path: &Path, content: &str) -> Result<Backup, GuardedWriteError> {
    if is_read_only(path) {
        return Err(GuardedWriteError::ReadOnly);
    }
    let backup = Backup::create(path).map_err(GuardedWriteError::Backup)?;

    if let Err(err) = fs::write(path, content) {
        if let Err(restore_err) = backup.restore() {
            warn!(
                path = %path.display(),
                error = %restore_err,
                "failed to restore after write error"
            );
        }
        return Err(GuardedWriteError::Write(err));
    }
    Ok(backup)
}
