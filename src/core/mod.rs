//! Indexing and refactoring engine.
//!
//! ```text
//! source files ──▶ PatternScanner ──▶ UsageIndex ──▶ SuggestionEngine ──▶ suggestions
//!                                                                              │
//!                catalogs + sources ◀── RefactoringExecutor ◀── accepted ◀─────┘
//! ```
//!
//! - `key_path`: flat ⇄ nested catalog conversion and path edits
//! - `scanner`: per-line regex recognition of key references
//! - `index`: key → usage sites, with incremental update and snapshots
//! - `file_scanner`: source discovery and parallel reads
//! - `classify`: file location → namespace candidate
//! - `suggest`: namespace suggestions for flat keys
//! - `refactor`: applying suggestions with backups

pub mod classify;
pub mod error;
pub mod file_scanner;
pub mod index;
pub mod key_path;
pub mod refactor;
pub mod scanner;
pub mod suggest;
pub mod usage;

pub use classify::{Classifier, RouteClassifier};
pub use error::{CatalogError, PatternCompileError, RewriteError, ScanError, StoreError};
pub use file_scanner::{CollectedFiles, ScanOptions, SourceRead, collect_files, read_sources};
pub use index::{CancelFlag, SharedIndex, UsageIndex};
pub use key_path::{
    CatalogMap, CatalogTree, FlatMessages, KEY_SEPARATOR, flatten, is_namespaced, namespace_of,
    unflatten,
};
pub use refactor::{
    KeyStore, MemoryKeyStore, RefactoringExecutor, RefactoringOutcome, RescanRequest, RescanSink,
};
pub use scanner::{PatternDef, PatternScanner};
pub use suggest::{DEFAULT_CONFIDENCE_THRESHOLD, Suggestion, SuggestionEngine};
pub use usage::{ReferenceForm, SourceFile, UsageSite};
