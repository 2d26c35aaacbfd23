//! Applying accepted suggestions to the key store, source files and catalogs.
//!
//! Each suggestion moves through `Pending → InProgress → Completed | Failed`.
//! Writes always go through a timestamped backup, and a failed suggestion
//! restores every file it already wrote.

pub mod backup;
pub mod catalog;
pub mod executor;
pub mod source_rewrite;
pub mod store;

pub use backup::Backup;
pub use catalog::{CatalogEditor, CatalogUpdate};
pub use executor::{
    FailedSuggestion, FileIssue, RefactorError, RefactoringExecutor, RefactoringOutcome,
    RescanRequest, RescanSink, SuggestionState,
};
pub use source_rewrite::ReferenceRewriter;
pub use store::{KeyRecord, KeyStore, MemoryKeyStore};
