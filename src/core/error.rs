//! Error types for the indexing and refactoring engine.
//!
//! Every error here is scoped to a single file or a single suggestion.
//! Batch operations collect them into their results instead of returning early.

use std::path::PathBuf;

use thiserror::Error;

/// A source file that could not be scanned. The file contributes zero sites.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8")]
    Decode { path: String },
}

impl ScanError {
    pub fn path(&self) -> &str {
        match self {
            ScanError::Read { path, .. } | ScanError::Decode { path } => path,
        }
    }
}

/// A reference pattern definition that does not compile.
///
/// Raised while building a [`PatternScanner`](crate::core::PatternScanner),
/// never while scanning.
#[derive(Debug, Error)]
pub enum PatternCompileError {
    #[error("invalid pattern '{name}': {source}")]
    Regex {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern '{name}' has no '{group}' capture group")]
    MissingGroup { name: String, group: &'static str },

    #[error("message accessor '{0}' is not an identifier")]
    InvalidAccessor(String),
}

/// Failure to read, transform or write one catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog {path} root is not an object")]
    NotAMap { path: PathBuf },

    #[error("catalog value at '{key}' is neither a string nor an object")]
    UnsupportedValue { key: String },

    #[error("cannot place '{key}': '{blocking}' is already a message")]
    PathConflict { key: String, blocking: String },

    #[error("verification failed for '{from}' -> '{to}': {detail}")]
    Verification {
        from: String,
        to: String,
        detail: String,
    },

    #[error("failed to serialize catalog {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} is read-only")]
    ReadOnly { path: PathBuf },

    #[error("failed to back up {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} does not hold the written content")]
    WriteMismatch { path: PathBuf },
}

/// Failure of the external key store collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("key '{0}' is not in the store")]
    UnknownKey(String),

    #[error("key '{0}' already exists in the store")]
    KeyExists(String),
}

/// Failure to rewrite one source file.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is read-only")]
    ReadOnly { path: PathBuf },

    #[error("failed to back up {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
