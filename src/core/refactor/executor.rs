use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::{
    error::{CatalogError, PatternCompileError, RewriteError, StoreError},
    index::UsageIndex,
    refactor::{
        backup::Backup,
        catalog::{CatalogUpdate, move_in_catalog},
        source_rewrite::{ReferenceRewriter, rewrite_source_file},
        store::{KeyRecord, KeyStore},
    },
    suggest::Suggestion,
};

/// Lifecycle of one suggestion inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionState {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl SuggestionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SuggestionState::Completed | SuggestionState::Failed)
    }
}

/// Why a suggestion ended `Failed`.
#[derive(Debug, Error)]
pub enum RefactorError {
    #[error("'{0}' is already the target key")]
    SameKey(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pattern(#[from] PatternCompileError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("'{0}' is not in any catalog")]
    KeyNotInCatalogs(String),

    #[error("no catalog could be updated for '{0}'")]
    NoCatalogUpdated(String),
}

/// A per-file problem attached to a suggestion.
#[derive(Debug)]
pub struct FileIssue {
    pub path: PathBuf,
    pub error: CatalogError,
}

#[derive(Debug)]
pub struct FailedSuggestion {
    pub suggestion: Suggestion,
    pub reason: RefactorError,
    /// Catalog files that failed while processing this suggestion.
    pub issues: Vec<FileIssue>,
}

/// Result of one [`RefactoringExecutor::execute`] call.
#[derive(Debug, Default)]
pub struct RefactoringOutcome {
    pub applied: Vec<Suggestion>,
    pub failed: Vec<FailedSuggestion>,
    /// Files written by applied suggestions.
    pub files_modified: BTreeSet<PathBuf>,
    pub keys_updated: usize,
    /// Catalog files skipped by suggestions that still completed.
    pub warnings: Vec<FileIssue>,
    /// Backups left on disk, including those of failed suggestions.
    pub backups: Vec<PathBuf>,
}

impl RefactoringOutcome {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Sent after a batch that changed at least one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescanRequest {
    pub paths: BTreeSet<PathBuf>,
}

/// Receiver of rescan requests.
pub trait RescanSink {
    fn request_rescan(&self, request: RescanRequest);
}

impl<F> RescanSink for F
where
    F: Fn(RescanRequest),
{
    fn request_rescan(&self, request: RescanRequest) {
        self(request)
    }
}

/// Applies accepted suggestions one at a time.
pub struct RefactoringExecutor<'a, S: KeyStore> {
    store: &'a mut S,
    catalogs: Vec<PathBuf>,
    accessor: String,
    keep_backups: bool,
    source_root: Option<PathBuf>,
    index: Option<Arc<UsageIndex>>,
    rescan: Option<Box<dyn RescanSink + 'a>>,
}

/// Files written so far for one suggestion.
#[derive(Default)]
struct Progress {
    record: Option<KeyRecord>,
    sources: Vec<Backup>,
    catalogs: Vec<Backup>,
    issues: Vec<FileIssue>,
}

impl<'a, S: KeyStore> RefactoringExecutor<'a, S> {
    pub fn new(store: &'a mut S, catalogs: Vec<PathBuf>) -> Self {
        Self {
            store,
            catalogs,
            accessor: "m".to_string(),
            keep_backups: true,
            source_root: None,
            index: None,
            rescan: None,
        }
    }

    pub fn accessor(mut self, accessor: impl Into<String>) -> Self {
        self.accessor = accessor.into();
        self
    }

    pub fn keep_backups(mut self, keep: bool) -> Self {
        self.keep_backups = keep;
        self
    }

    /// Directory relative source paths are resolved against.
    pub fn source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    /// Rewrite every file the index knows to reference a key, not only the
    /// suggestion's affected files.
    pub fn with_index(mut self, index: Arc<UsageIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn on_rescan(mut self, sink: impl RescanSink + 'a) -> Self {
        self.rescan = Some(Box::new(sink));
        self
    }

    /// Apply `suggestions` in order. A failed suggestion never undoes an
    /// earlier completed one.
    pub fn execute(&mut self, suggestions: &[Suggestion]) -> RefactoringOutcome {
        let mut outcome = RefactoringOutcome::default();

        for suggestion in suggestions {
            let mut state = SuggestionState::Pending;
            debug!(key = %suggestion.original_key, ?state, "queued");
            state = SuggestionState::InProgress;
            debug!(key = %suggestion.original_key, ?state, "applying");

            let mut progress = Progress::default();
            match self.apply(suggestion, &mut progress) {
                Ok(()) => {
                    state = SuggestionState::Completed;
                    info!(
                        from = %suggestion.original_key,
                        to = %suggestion.suggested_key,
                        ?state,
                        "suggestion applied"
                    );
                    for backup in progress.sources.into_iter().chain(progress.catalogs) {
                        outcome.files_modified.insert(backup.original().to_path_buf());
                        if let Some(kept) = backup.finish(self.keep_backups) {
                            outcome.backups.push(kept);
                        }
                    }
                    outcome.warnings.extend(progress.issues);
                    outcome.keys_updated += 1;
                    outcome.applied.push(suggestion.clone());
                }
                Err(reason) => {
                    state = SuggestionState::Failed;
                    warn!(
                        from = %suggestion.original_key,
                        to = %suggestion.suggested_key,
                        ?state,
                        error = %reason,
                        "suggestion failed"
                    );
                    self.roll_back(suggestion, &progress);
                    outcome.backups.extend(
                        progress
                            .sources
                            .into_iter()
                            .chain(progress.catalogs)
                            .map(Backup::keep),
                    );
                    outcome.failed.push(FailedSuggestion {
                        suggestion: suggestion.clone(),
                        reason,
                        issues: progress.issues,
                    });
                }
            }
            debug_assert!(state.is_terminal());
        }

        if !outcome.files_modified.is_empty()
            && let Some(sink) = &self.rescan
        {
            debug!(files = outcome.files_modified.len(), "requesting rescan");
            sink.request_rescan(RescanRequest {
                paths: outcome.files_modified.clone(),
            });
        }
        outcome
    }

    fn apply(
        &mut self,
        suggestion: &Suggestion,
        progress: &mut Progress,
    ) -> Result<(), RefactorError> {
        let from = suggestion.original_key.as_str();
        let to = suggestion.suggested_key.as_str();
        if from == to {
            return Err(RefactorError::SameKey(from.to_string()));
        }
        let rewriter = ReferenceRewriter::new(&self.accessor, from, to)?;

        let record = self.store.rename(from, to)?;
        debug!(
            key = %record.key,
            namespace = ?record.namespace,
            nested = record.nested,
            "store renamed"
        );
        progress.record = Some(record);

        for path in self.source_files(suggestion) {
            if let Some(backup) = rewrite_source_file(&path, &rewriter)? {
                debug!(path = %path.display(), "source rewritten");
                progress.sources.push(backup);
            }
        }

        let mut present = 0;
        for catalog in &self.catalogs {
            match move_in_catalog(catalog, from, to) {
                Ok(CatalogUpdate::Moved(backup)) => {
                    present += 1;
                    progress.catalogs.push(backup);
                }
                Ok(CatalogUpdate::Absent) => {}
                Err(error) => {
                    present += 1;
                    warn!(catalog = %catalog.display(), error = %error, "catalog skipped");
                    progress.issues.push(FileIssue {
                        path: catalog.clone(),
                        error,
                    });
                }
            }
        }

        if progress.catalogs.is_empty() {
            return Err(if present == 0 {
                RefactorError::KeyNotInCatalogs(from.to_string())
            } else {
                RefactorError::NoCatalogUpdated(from.to_string())
            });
        }
        Ok(())
    }

    /// Affected files plus, with an index, every file referencing the key.
    fn source_files(&self, suggestion: &Suggestion) -> Vec<PathBuf> {
        let mut files: BTreeSet<&str> = suggestion
            .affected_files
            .iter()
            .map(String::as_str)
            .collect();
        if let Some(index) = &self.index {
            files.extend(index.files_for(&suggestion.original_key));
        }
        files.into_iter().map(|file| self.resolve(file)).collect()
    }

    fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        match &self.source_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Undo what a failed suggestion already changed. Backups stay on disk.
    fn roll_back(&mut self, suggestion: &Suggestion, progress: &Progress) {
        for backup in progress.sources.iter().chain(&progress.catalogs) {
            if let Err(err) = backup.restore() {
                warn!(path = %backup.original().display(), error = %err, "failed to restore");
            }
        }
        if progress.record.is_some()
            && let Err(err) = self
                .store
                .rename(&suggestion.suggested_key, &suggestion.original_key)
        {
            warn!(key = %suggestion.suggested_key, error = %err, "failed to revert store rename");
        }
    }
}
