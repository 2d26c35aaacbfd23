use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{
    error::CatalogError,
    key_path::{
        CatalogMap, FlatMessages, KeyLocation, flatten, insert_path, map_from_json,
        map_from_json_strict, remove_path, resolve,
    },
    refactor::backup::{Backup, GuardedWriteError, guarded_write},
};

/// An editor that moves messages between key paths in one catalog file.
///
/// Output is pretty-printed with 2-space indentation, keys sorted, and a
/// trailing newline.
#[derive(Debug)]
pub struct CatalogEditor {
    file_path: PathBuf,
    tree: CatalogMap,
}

/// Result of moving one key in one catalog.
#[derive(Debug)]
pub enum CatalogUpdate {
    /// The catalog does not contain the key; nothing was written.
    Absent,
    /// The catalog was rewritten; the backup holds the previous content.
    Moved(Backup),
}

impl CatalogEditor {
    /// Open a catalog file for editing.
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if !value.is_object() {
            return Err(CatalogError::NotAMap {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            file_path: path.to_path_buf(),
            tree: map_from_json_strict(&value)?,
        })
    }

    pub fn tree(&self) -> &CatalogMap {
        &self.tree
    }

    /// Message stored under `key`, either as a literal top-level key or as a
    /// nested path.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        resolve(&self.tree, key).map(|(value, _)| value)
    }

    /// Move the message at `from` to the nested path `to`.
    ///
    /// Returns `Ok(None)` when `from` is absent. On error the editor is left
    /// unchanged.
    pub fn move_key(&mut self, from: &str, to: &str) -> Result<Option<String>, CatalogError> {
        let Some((value, location)) = resolve(&self.tree, from) else {
            return Ok(None);
        };
        let value = value.to_string();

        if let Some(existing) = self.lookup(to)
            && existing != value
        {
            return Err(CatalogError::Verification {
                from: from.to_string(),
                to: to.to_string(),
                detail: format!("'{}' already holds a different message", to),
            });
        }

        let mut next = self.tree.clone();
        match location {
            KeyLocation::Flat => {
                next.remove(from);
            }
            KeyLocation::Nested => {
                remove_path(&mut next, from);
            }
        }
        insert_path(&mut next, to, value.clone())?;
        verify_move(&next, from, to, &value)?;

        self.tree = next;
        Ok(Some(value))
    }

    /// Serialized catalog content.
    pub fn render(&self) -> Result<String, CatalogError> {
        let mut content =
            serde_json::to_string_pretty(&self.tree).map_err(|source| CatalogError::Serialize {
                path: self.file_path.clone(),
                source,
            })?;
        content.push('\n');
        Ok(content)
    }

    /// Write the catalog back through a backup, then re-read the file to make
    /// sure the bytes on disk are the ones rendered.
    pub fn save(&self) -> Result<Backup, CatalogError> {
        let content = self.render()?;
        let path = &self.file_path;

        let backup = guarded_write(path, &content).map_err(|err| match err {
            GuardedWriteError::ReadOnly => CatalogError::ReadOnly { path: path.clone() },
            GuardedWriteError::Backup(source) => CatalogError::Backup {
                path: path.clone(),
                source,
            },
            GuardedWriteError::Write(source) => CatalogError::Write {
                path: path.clone(),
                source,
            },
        })?;

        let written = fs::read_to_string(path).unwrap_or_default();
        if written != content {
            warn!(path = %path.display(), "catalog content differs after write, restoring");
            if let Err(err) = backup.restore() {
                warn!(path = %path.display(), error = %err, "failed to restore catalog");
            }
            return Err(CatalogError::WriteMismatch { path: path.clone() });
        }
        Ok(backup)
    }
}

/// Check that `to` now holds `value` and `from` no longer resolves.
pub fn verify_move(
    tree: &CatalogMap,
    from: &str,
    to: &str,
    value: &str,
) -> Result<(), CatalogError> {
    let fail = |detail: String| CatalogError::Verification {
        from: from.to_string(),
        to: to.to_string(),
        detail,
    };
    match resolve(tree, to) {
        Some((found, _)) if found == value => {}
        Some((found, _)) => {
            return Err(fail(format!("'{}' resolves to '{}'", to, found)));
        }
        None => return Err(fail(format!("'{}' does not resolve", to))),
    }
    if resolve(tree, from).is_some() {
        return Err(fail(format!("'{}' still resolves", from)));
    }
    Ok(())
}

/// Move `from` to `to` in the catalog at `path`, writing only when the key was
/// present and the move verified.
pub fn move_in_catalog(path: &Path, from: &str, to: &str) -> Result<CatalogUpdate, CatalogError> {
    let mut editor = CatalogEditor::open(path)?;
    if editor.move_key(from, to)?.is_none() {
        debug!(catalog = %path.display(), key = from, "key not in catalog");
        return Ok(CatalogUpdate::Absent);
    }
    let backup = editor.save()?;
    debug!(catalog = %path.display(), from, to, "catalog updated");
    Ok(CatalogUpdate::Moved(backup))
}

/// Read a catalog's messages as flat dotted keys. Values that are neither
/// strings nor objects are skipped.
pub fn read_messages(path: &Path) -> Result<FlatMessages, CatalogError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let tree = map_from_json(&value).ok_or_else(|| CatalogError::NotAMap {
        path: path.to_path_buf(),
    })?;
    Ok(flatten(&tree))
}
