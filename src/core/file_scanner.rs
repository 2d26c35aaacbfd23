use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use glob::{Pattern, glob};
use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::{error::ScanError, index::CancelFlag, usage::SourceFile};

/// Test and story files skipped when `ignore_test_files` is set.
pub const TEST_FILE_PATTERNS: &[&str] = &[
    "**/*.test.ts",
    "**/*.test.js",
    "**/*.spec.ts",
    "**/*.spec.js",
    "**/*.test.tsx",
    "**/*.spec.tsx",
    "**/*.test.jsx",
    "**/*.spec.jsx",
    "**/*.stories.svelte",
    "**/__tests__/**",
];

/// Which files under a source root are eligible for scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub includes: Vec<String>,
    pub ignores: Vec<String>,
    /// Extensions without the leading dot.
    pub extensions: Vec<String>,
    pub ignore_test_files: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            includes: Vec::new(),
            ignores: Vec::new(),
            extensions: ["svelte", "ts", "js", "tsx", "jsx"].map(String::from).to_vec(),
            ignore_test_files: true,
        }
    }
}

/// Patterns without `*` or `?` are literal paths, so `[lang]` folders need no
/// escaping.
pub fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Files found by [`collect_files`].
#[derive(Debug, Default)]
pub struct CollectedFiles {
    /// Paths relative to the base directory, `/`-separated and sorted.
    pub files: BTreeSet<String>,
    pub skipped_count: usize,
}

/// Walk the included directories of `base_dir` and return eligible files.
pub fn collect_files(base_dir: &Path, options: &ScanOptions) -> CollectedFiles {
    let mut collected = CollectedFiles::default();

    let mut literal_ignores: Vec<PathBuf> = Vec::new();
    let mut glob_ignores: Vec<Pattern> = Vec::new();
    for p in &options.ignores {
        if is_glob_pattern(p) {
            match Pattern::new(p) {
                Ok(pattern) => glob_ignores.push(pattern),
                Err(e) => warn!(pattern = %p, error = %e, "invalid ignore pattern"),
            }
        } else {
            literal_ignores.push(base_dir.join(p));
        }
    }
    if options.ignore_test_files {
        glob_ignores.extend(TEST_FILE_PATTERNS.iter().filter_map(|p| Pattern::new(p).ok()));
    }

    for dir in include_dirs(base_dir, &options.includes) {
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    collected.skipped_count += 1;
                    warn!(error = %e, "cannot access path");
                    continue;
                }
            };
            let path = entry.path();
            if literal_ignores.iter().any(|ignore| path.starts_with(ignore)) {
                continue;
            }
            let Some(relative) = relative_path(base_dir, path) else {
                continue;
            };
            if glob_ignores.iter().any(|p| p.matches(&relative)) {
                continue;
            }
            if entry.file_type().is_file() && has_extension(path, &options.extensions) {
                collected.files.insert(relative);
            }
        }
    }

    debug!(
        files = collected.files.len(),
        skipped = collected.skipped_count,
        "collected source files"
    );
    collected
}

fn include_dirs(base_dir: &Path, includes: &[String]) -> Vec<PathBuf> {
    if includes.is_empty() {
        return vec![base_dir.to_path_buf()];
    }
    let mut dirs = Vec::new();
    for inc in includes {
        let full = base_dir.join(inc);
        if is_glob_pattern(inc) {
            match glob(&full.to_string_lossy()) {
                Ok(entries) => dirs.extend(entries.flatten().filter(|entry| entry.is_dir())),
                Err(e) => warn!(pattern = %inc, error = %e, "invalid include pattern"),
            }
        } else if full.exists() {
            dirs.push(full);
        } else {
            warn!(path = %full.display(), "include path does not exist");
        }
    }
    dirs
}

fn relative_path(base_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base_dir).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    Some(parts.join("/"))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed == ext))
}

/// Contents of the files handed to [`read_sources`].
#[derive(Debug, Default)]
pub struct SourceRead {
    pub files: Vec<SourceFile>,
    pub errors: Vec<ScanError>,
    pub cancelled: bool,
}

/// Read `paths` (relative to `base_dir`) in parallel. Unreadable files become
/// errors and the rest are still read. The cancel flag is checked per file.
pub fn read_sources(base_dir: &Path, paths: &[String], cancel: &CancelFlag) -> SourceRead {
    let results: Vec<Option<Result<SourceFile, ScanError>>> = paths
        .par_iter()
        .map(|path| {
            if cancel.is_cancelled() {
                return None;
            }
            Some(read_source(base_dir, path))
        })
        .collect();

    let mut read = SourceRead {
        cancelled: cancel.is_cancelled(),
        ..SourceRead::default()
    };
    for result in results.into_iter().flatten() {
        match result {
            Ok(file) => read.files.push(file),
            Err(err) => {
                warn!(path = err.path(), error = %err, "skipping unreadable file");
                read.errors.push(err);
            }
        }
    }
    read
}

fn read_source(base_dir: &Path, path: &str) -> Result<SourceFile, ScanError> {
    let bytes = fs::read(base_dir.join(path)).map_err(|source| ScanError::Read {
        path: path.to_string(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| ScanError::Decode {
        path: path.to_string(),
    })?;
    Ok(SourceFile::new(path, text))
}
