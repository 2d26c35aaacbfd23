use std::{path::PathBuf, sync::Arc};

use crate::{
    cli::exit_status::ExitStatus,
    core::{RefactoringOutcome, ScanError, Suggestion, UsageIndex},
};

#[derive(Debug)]
pub enum CommandSummary {
    Scan(ScanSummary),
    Suggest(SuggestSummary),
    Apply(ApplySummary),
    Init(InitSummary),
}

#[derive(Debug)]
pub struct ScanSummary {
    pub index: Arc<UsageIndex>,
}

#[derive(Debug)]
pub struct SuggestSummary {
    pub suggestions: Vec<Suggestion>,
    pub threshold: f64,
}

#[derive(Debug)]
pub struct ApplySummary {
    pub is_apply: bool,
    /// Suggestions selected for migration.
    pub suggestions: Vec<Suggestion>,
    /// `--key` values that had no suggestion.
    pub unmatched_keys: Vec<String>,
    /// Source files that reference the selected keys.
    pub source_files: Vec<String>,
    pub catalog_count: usize,
    /// Present only when files were written.
    pub outcome: Option<RefactoringOutcome>,
    /// Key count of the index after the post-migration rescan.
    pub indexed_keys_after: Option<usize>,
}

#[derive(Debug)]
pub struct InitSummary {
    pub created: bool,
}

/// Result of running a nestkey command
#[derive(Debug)]
pub struct CommandResult {
    pub summary: CommandSummary,
    /// Source files that could not be read.
    pub scan_errors: Vec<ScanError>,
    pub source_files_checked: usize,
    pub locale_files_checked: usize,
    /// Paths in reports are shown relative to this directory.
    pub project_root: PathBuf,
}

impl CommandResult {
    pub fn exit_status(&self) -> ExitStatus {
        match &self.summary {
            CommandSummary::Apply(ApplySummary {
                outcome: Some(outcome),
                ..
            }) if outcome.has_failures() => ExitStatus::Failure,
            CommandSummary::Init(InitSummary { created: false }) => ExitStatus::Failure,
            _ => ExitStatus::Success,
        }
    }
}
