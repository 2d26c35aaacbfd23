use std::{cell::RefCell, collections::BTreeSet};

use anyhow::Result;
use tracing::{debug, warn};

use super::context::ProjectContext;
use super::suggest::{compute, engine_for};
use super::{ApplySummary, CommandResult, CommandSummary};
use crate::{
    cli::args::ApplyCommand,
    core::{
        MemoryKeyStore, RefactoringExecutor, RescanRequest, Suggestion,
        refactor::catalog::read_messages,
    },
};

pub fn apply(cmd: ApplyCommand) -> Result<CommandResult> {
    let ctx = ProjectContext::load(&cmd.common)?;
    let engine = engine_for(&ctx, &cmd.suggest)?;
    let (suggestions, unmatched_keys) = select(compute(&ctx, &engine), &cmd.keys);

    let index = ctx.snapshot();
    let source_files: Vec<String> = suggestions
        .iter()
        .flat_map(|s| {
            s.affected_files
                .iter()
                .map(String::as_str)
                .chain(index.files_for(&s.original_key))
        })
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let catalog_count = ctx.catalogs.len();

    let (outcome, indexed_keys_after) = if cmd.apply && !suggestions.is_empty() {
        let mut store = load_store(&ctx);
        let requests: RefCell<Vec<RescanRequest>> = RefCell::new(Vec::new());
        let outcome = RefactoringExecutor::new(&mut store, ctx.catalog_paths())
            .accessor(ctx.config.message_accessor.clone())
            .keep_backups(ctx.config.keep_backups)
            .source_root(&ctx.source_dir)
            .with_index(index.clone())
            .on_rescan(|request: RescanRequest| requests.borrow_mut().push(request))
            .execute(&suggestions);

        let mut indexed_keys_after = None;
        for request in requests.into_inner() {
            let refreshed = ctx.refresh(request.paths);
            indexed_keys_after = Some(refreshed.all_keys().len());
        }
        (Some(outcome), indexed_keys_after)
    } else {
        (None, None)
    };

    Ok(CommandResult {
        summary: CommandSummary::Apply(ApplySummary {
            is_apply: cmd.apply,
            suggestions,
            unmatched_keys,
            source_files,
            catalog_count,
            outcome,
            indexed_keys_after,
        }),
        source_files_checked: ctx.source_files,
        locale_files_checked: ctx.catalogs.len(),
        scan_errors: ctx.scan_errors,
        project_root: ctx.project_root,
    })
}

/// Keep suggestions whose key was requested. No requested keys keeps all.
fn select(suggestions: Vec<Suggestion>, keys: &[String]) -> (Vec<Suggestion>, Vec<String>) {
    if keys.is_empty() {
        return (suggestions, Vec::new());
    }
    let unmatched = keys
        .iter()
        .filter(|key| !suggestions.iter().any(|s| &s.original_key == *key))
        .cloned()
        .collect();
    let selected = suggestions
        .into_iter()
        .filter(|s| keys.contains(&s.original_key))
        .collect();
    (selected, unmatched)
}

/// Key store seeded from the primary locale, then from the other catalogs for
/// keys the primary locale lacks.
fn load_store(ctx: &ProjectContext) -> MemoryKeyStore {
    let primary = ctx.primary_catalog();
    if primary.is_none() {
        warn!(locale = %ctx.config.primary_locale, "primary locale catalog not found");
    }
    let ordered = primary
        .into_iter()
        .chain(ctx.catalogs.iter().filter(|c| Some(*c) != primary));

    let mut store = MemoryKeyStore::new();
    for catalog in ordered {
        match read_messages(&catalog.path) {
            Ok(messages) => {
                for (key, value) in messages {
                    if store.get(&key).is_none() {
                        store.insert(&key, Some(value));
                    }
                }
            }
            Err(err) => {
                warn!(catalog = %catalog.path.display(), error = %err, "catalog not loaded")
            }
        }
    }
    debug!(keys = store.len(), "key store loaded");
    store
}
