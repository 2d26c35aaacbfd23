//! Key → usage-site index over a set of source files.
//!
//! The index is a derived cache: it is rebuilt from scanned text and never
//! written back anywhere. Sites for one key are kept sorted by
//! `(file, line, column)` so the result does not depend on scan order, which
//! makes an incrementally updated index compare equal to a fresh rebuild.
//!
//! [`SharedIndex`] publishes immutable snapshots for concurrent readers.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use rayon::prelude::*;
use tracing::debug;

use crate::core::{
    scanner::PatternScanner,
    usage::{SourceFile, UsageSite},
};

/// Cooperative cancellation for long scans, checked once per file.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageIndex {
    by_key: BTreeMap<String, Vec<UsageSite>>,
    by_file: BTreeMap<String, BTreeSet<String>>,
}

impl UsageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every file and build a fresh index.
    pub fn rebuild(scanner: &PatternScanner, files: &[SourceFile]) -> Self {
        let mut index = Self::new();
        for (path, sites) in scan_all(scanner, files) {
            index.insert_file(&path, sites);
        }
        index
    }

    /// Like [`rebuild`](Self::rebuild), but stops between files once `cancel`
    /// is set. Returns `None` when cancelled.
    pub fn rebuild_cancellable(
        scanner: &PatternScanner,
        files: &[SourceFile],
        cancel: &CancelFlag,
    ) -> Option<Self> {
        let scanned: Vec<Option<(String, Vec<UsageSite>)>> = files
            .par_iter()
            .map(|file| {
                if cancel.is_cancelled() {
                    None
                } else {
                    Some((file.path.clone(), scan_file(scanner, file)))
                }
            })
            .collect();

        if cancel.is_cancelled() {
            debug!(files = files.len(), "index rebuild cancelled");
            return None;
        }

        let mut index = Self::new();
        for (path, sites) in scanned.into_iter().flatten() {
            index.insert_file(&path, sites);
        }
        Some(index)
    }

    /// Replace the sites of each changed file with a fresh scan of its text.
    ///
    /// A path listed more than once is scanned once, using its last entry.
    pub fn update(&mut self, scanner: &PatternScanner, changed: &[SourceFile]) {
        let latest: BTreeMap<&str, &SourceFile> = changed
            .iter()
            .map(|file| (file.path.as_str(), file))
            .collect();
        let files: Vec<SourceFile> = latest.into_values().cloned().collect();

        for file in &files {
            self.remove(&file.path);
        }
        for (path, sites) in scan_all(scanner, &files) {
            self.insert_file(&path, sites);
        }
    }

    /// Drop every site recorded for `file`.
    pub fn remove(&mut self, file: &str) {
        let Some(keys) = self.by_file.remove(file) else {
            return;
        };
        for key in keys {
            if let Some(sites) = self.by_key.get_mut(&key) {
                sites.retain(|site| site.file_path != file);
                if sites.is_empty() {
                    self.by_key.remove(&key);
                }
            }
        }
    }

    fn insert_file(&mut self, path: &str, sites: Vec<UsageSite>) {
        if sites.is_empty() {
            return;
        }
        let keys = self.by_file.entry(path.to_string()).or_default();
        for site in sites {
            keys.insert(site.key.clone());
            let entry = self.by_key.entry(site.key.clone()).or_default();
            let at = entry.partition_point(|existing| existing.position() <= site.position());
            entry.insert(at, site);
        }
    }

    pub fn usages_for(&self, key: &str) -> &[UsageSite] {
        self.by_key.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn keys_in(&self, file: &str) -> Vec<&str> {
        self.by_file
            .get(file)
            .map(|keys| keys.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn all_keys(&self) -> Vec<&str> {
        self.by_key.keys().map(String::as_str).collect()
    }

    /// Distinct files referencing `key`, sorted.
    pub fn files_for(&self, key: &str) -> Vec<&str> {
        let files: BTreeSet<&str> = self
            .usages_for(key)
            .iter()
            .map(|site| site.file_path.as_str())
            .collect();
        files.into_iter().collect()
    }

    /// Iterate `(key, sites)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[UsageSite])> {
        self.by_key
            .iter()
            .map(|(key, sites)| (key.as_str(), sites.as_slice()))
    }

    pub fn file_count(&self) -> usize {
        self.by_file.len()
    }

    pub fn site_count(&self) -> usize {
        self.by_key.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

fn scan_file(scanner: &PatternScanner, file: &SourceFile) -> Vec<UsageSite> {
    let mut sites = scanner.scan(&file.text);
    for site in &mut sites {
        site.file_path = file.path.clone();
    }
    sites
}

fn scan_all(scanner: &PatternScanner, files: &[SourceFile]) -> Vec<(String, Vec<UsageSite>)> {
    files
        .par_iter()
        .map(|file| (file.path.clone(), scan_file(scanner, file)))
        .collect()
}

/// Holder of the current index snapshot.
///
/// Readers call [`snapshot`](Self::snapshot) and keep the returned `Arc` for as
/// long as they need a consistent view. Writers build a new index off to the
/// side and swap it in; they are serialized so no update is lost.
#[derive(Debug, Default)]
pub struct SharedIndex {
    current: RwLock<Arc<UsageIndex>>,
}

impl SharedIndex {
    pub fn new(index: UsageIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    pub fn snapshot(&self) -> Arc<UsageIndex> {
        Arc::clone(&self.current.read())
    }

    pub fn publish(&self, index: UsageIndex) {
        *self.current.write() = Arc::new(index);
    }

    /// Apply an incremental update and publish the result.
    pub fn apply_changes(
        &self,
        scanner: &PatternScanner,
        changed: &[SourceFile],
        removed: &[String],
    ) -> Arc<UsageIndex> {
        // Readers still get the old snapshot until the upgrade
        let current = self.current.upgradable_read();
        let mut next = UsageIndex::clone(&current);
        for path in removed {
            next.remove(path);
        }
        next.update(scanner, changed);
        let next = Arc::new(next);
        *RwLockUpgradableReadGuard::upgrade(current) = Arc::clone(&next);
        next
    }
}
