use anyhow::{Result, bail};
use tracing::debug;

use super::context::ProjectContext;
use super::{CommandResult, CommandSummary, SuggestSummary};
use crate::{
    cli::args::{SuggestArgs, SuggestCommand},
    core::{DEFAULT_CONFIDENCE_THRESHOLD, Suggestion, SuggestionEngine},
};

pub fn suggest(cmd: SuggestCommand) -> Result<CommandResult> {
    let ctx = ProjectContext::load(&cmd.common)?;
    let engine = engine_for(&ctx, &cmd.suggest)?;
    let suggestions = compute(&ctx, &engine);

    Ok(CommandResult {
        summary: CommandSummary::Suggest(SuggestSummary {
            suggestions,
            threshold: engine.threshold(),
        }),
        source_files_checked: ctx.source_files,
        locale_files_checked: ctx.catalogs.len(),
        scan_errors: ctx.scan_errors,
        project_root: ctx.project_root,
    })
}

/// Suggestion engine using the `--threshold` override or the configured value.
pub fn engine_for(ctx: &ProjectContext, args: &SuggestArgs) -> Result<SuggestionEngine> {
    let threshold = args.threshold.unwrap_or(ctx.config.confidence_threshold);
    if !(DEFAULT_CONFIDENCE_THRESHOLD..=1.0).contains(&threshold) {
        bail!(
            "--threshold must be between {} and 1, got {}",
            DEFAULT_CONFIDENCE_THRESHOLD,
            threshold
        );
    }
    Ok(SuggestionEngine::new(threshold))
}

pub fn compute(ctx: &ProjectContext, engine: &SuggestionEngine) -> Vec<Suggestion> {
    let index = ctx.snapshot();
    let suggestions = engine.suggest(&index, &ctx.classifier());
    debug!(count = suggestions.len(), threshold = engine.threshold(), "suggestions computed");
    suggestions
}
