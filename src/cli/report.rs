//! Report formatting and printing for CLI commands.
//!
//! Separate from the engine so nestkey can be used as a library. Every printer
//! has a `_to` variant taking a writer, which is what the tests exercise.

use std::{
    io::{self, Write},
    path::Path,
};

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use super::commands::{
    ApplySummary, CommandResult, CommandSummary, InitSummary, ScanSummary, SuggestSummary,
};
use crate::config::CONFIG_FILE_NAME;
use crate::core::{RefactoringOutcome, ScanError, Suggestion, UsageIndex};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Maximum number of files listed under one suggestion.
const MAX_FILES_DISPLAY: usize = 3;

pub fn print(result: &CommandResult, verbose: bool) {
    report_to(result, verbose, &mut io::stdout().lock());
    print_scan_warnings_to(&result.scan_errors, verbose, &mut io::stderr().lock());
}

/// Print a command result to a custom writer.
pub fn report_to<W: Write>(result: &CommandResult, verbose: bool, writer: &mut W) {
    let root = result.project_root.as_path();
    match &result.summary {
        CommandSummary::Scan(summary) => {
            print_scan(summary, result.source_files_checked, verbose, writer)
        }
        CommandSummary::Suggest(summary) => print_suggest(summary, writer),
        CommandSummary::Apply(summary) => print_apply(summary, root, writer),
        CommandSummary::Init(summary) => print_init(summary, writer),
    }
}

/// Print a warning about source files that could not be read.
pub fn print_scan_warnings_to<W: Write>(errors: &[ScanError], verbose: bool, writer: &mut W) {
    if errors.is_empty() {
        return;
    }
    if verbose {
        for error in errors {
            let _ = writeln!(writer, "{} {}", "warning:".bold().yellow(), error);
        }
    } else {
        let _ = writeln!(
            writer,
            "{} {} file(s) could not be read (use {} for details)",
            "warning:".bold().yellow(),
            errors.len(),
            "-v".cyan()
        );
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

fn pad(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{}{}", text, " ".repeat(width.saturating_sub(used)))
}

fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

// ============================================================
// scan
// ============================================================

fn print_scan<W: Write>(summary: &ScanSummary, source_files: usize, verbose: bool, writer: &mut W) {
    let index: &UsageIndex = &summary.index;
    let width = index
        .all_keys()
        .iter()
        .map(|key| UnicodeWidthStr::width(*key))
        .max()
        .unwrap_or(0);

    for (key, sites) in index.iter() {
        let files = index.files_for(key).len();
        let _ = writeln!(
            writer,
            "{}  {} in {}",
            pad(key, width).bold(),
            plural(sites.len(), "usage"),
            plural(files, "file")
        );
        if verbose {
            for site in sites {
                let _ = writeln!(
                    writer,
                    "  {} {}:{}:{} {}",
                    "-->".blue(),
                    site.file_path,
                    site.line,
                    site.column,
                    site.context.dimmed()
                );
            }
        }
    }

    let _ = writeln!(
        writer,
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Indexed {}, {} in {}",
            plural(index.all_keys().len(), "key"),
            plural(index.site_count(), "usage"),
            plural(source_files, "source file")
        )
        .green()
    );
}

// ============================================================
// suggest
// ============================================================

fn print_suggest<W: Write>(summary: &SuggestSummary, writer: &mut W) {
    let threshold = summary.threshold * 100.0;
    if summary.suggestions.is_empty() {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!("No flat keys to namespace (threshold {:.0}%)", threshold).green()
        );
        return;
    }

    for suggestion in &summary.suggestions {
        print_suggestion(suggestion, writer);
    }
    let _ = writeln!(
        writer,
        "{} at confidence >= {:.0}%. Run {} to migrate them.",
        plural(summary.suggestions.len(), "suggestion"),
        threshold,
        "nestkey apply".cyan()
    );
}

fn print_suggestion<W: Write>(suggestion: &Suggestion, writer: &mut W) {
    let _ = writeln!(
        writer,
        "{} {} {}  {}",
        suggestion.original_key.bold(),
        "->".blue(),
        suggestion.suggested_key.bold().green(),
        format!("{:.0}%", suggestion.confidence * 100.0).cyan()
    );
    let _ = writeln!(
        writer,
        "  {} {} {}",
        "=".blue(),
        "note:".bold(),
        suggestion.reason
    );
    for file in suggestion.affected_files.iter().take(MAX_FILES_DISPLAY) {
        let _ = writeln!(writer, "  {} {}", "-->".blue(), file);
    }
    let hidden = suggestion
        .affected_files
        .len()
        .saturating_sub(MAX_FILES_DISPLAY);
    if hidden > 0 {
        let _ = writeln!(writer, "  {}", format!("... and {} more", hidden).dimmed());
    }
    let _ = writeln!(writer);
}

// ============================================================
// apply
// ============================================================

fn print_apply<W: Write>(summary: &ApplySummary, root: &Path, writer: &mut W) {
    for key in &summary.unmatched_keys {
        let _ = writeln!(
            writer,
            "{} no suggestion for key \"{}\"",
            "warning:".bold().yellow(),
            key
        );
    }

    if summary.suggestions.is_empty() {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            "Nothing to migrate".green()
        );
        return;
    }

    match &summary.outcome {
        Some(outcome) => print_outcome(outcome, summary.indexed_keys_after, root, writer),
        None => {
            for suggestion in &summary.suggestions {
                print_suggestion(suggestion, writer);
            }
            let _ = writeln!(
                writer,
                "{} {} in {} and up to {}.",
                "Would migrate".yellow().bold(),
                plural(summary.suggestions.len(), "key"),
                plural(summary.source_files.len(), "source file"),
                plural(summary.catalog_count, "catalog file")
            );
            let _ = writeln!(writer, "Run with {} to rewrite these files.", "--apply".cyan());
        }
    }
}

fn print_outcome<W: Write>(
    outcome: &RefactoringOutcome,
    indexed_keys_after: Option<usize>,
    root: &Path,
    writer: &mut W,
) {
    for suggestion in &outcome.applied {
        let _ = writeln!(
            writer,
            "{} {} {} {}",
            SUCCESS_MARK.green(),
            suggestion.original_key,
            "->".blue(),
            suggestion.suggested_key.green()
        );
    }

    for failed in &outcome.failed {
        let _ = writeln!(
            writer,
            "{} {} {} {}: {}",
            FAILURE_MARK.red(),
            failed.suggestion.original_key,
            "->".blue(),
            failed.suggestion.suggested_key,
            failed.reason
        );
        for issue in &failed.issues {
            let _ = writeln!(
                writer,
                "  {} {}: {}",
                "=".blue(),
                display_path(root, &issue.path),
                issue.error
            );
        }
    }

    for warning in &outcome.warnings {
        let _ = writeln!(
            writer,
            "{} skipped {}: {}",
            "warning:".bold().yellow(),
            display_path(root, &warning.path),
            warning.error
        );
    }

    if !outcome.applied.is_empty() {
        let _ = writeln!(
            writer,
            "{} {}, modified {}.",
            "Migrated".green().bold(),
            plural(outcome.keys_updated, "key"),
            plural(outcome.files_modified.len(), "file")
        );
    }
    if outcome.has_failures() {
        let _ = writeln!(
            writer,
            "{} {} failed; affected files were restored.",
            "Failed".red().bold(),
            plural(outcome.failed.len(), "migration")
        );
    }
    if !outcome.backups.is_empty() {
        let _ = writeln!(
            writer,
            "Backups kept for {}.",
            plural(outcome.backups.len(), "file")
        );
    }
    if let Some(keys) = indexed_keys_after {
        let _ = writeln!(writer, "Rescanned sources: {} indexed.", plural(keys, "key"));
    }
}

// ============================================================
// init
// ============================================================

fn print_init<W: Write>(summary: &InitSummary, writer: &mut W) {
    if summary.created {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!("Created {}", CONFIG_FILE_NAME).green()
        );
    } else {
        let _ = writeln!(
            writer,
            "{} {} already exists",
            FAILURE_MARK.red(),
            CONFIG_FILE_NAME
        );
    }
}

// ============================================================
// Tests
// ============================================================
