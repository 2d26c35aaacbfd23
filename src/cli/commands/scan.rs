use anyhow::Result;

use super::context::ProjectContext;
use super::{CommandResult, CommandSummary, ScanSummary};
use crate::cli::args::ScanCommand;

pub fn scan(cmd: ScanCommand) -> Result<CommandResult> {
    let ctx = ProjectContext::load(&cmd.common)?;

    Ok(CommandResult {
        summary: CommandSummary::Scan(ScanSummary {
            index: ctx.snapshot(),
        }),
        source_files_checked: ctx.source_files,
        locale_files_checked: ctx.catalogs.len(),
        scan_errors: ctx.scan_errors,
        project_root: ctx.project_root,
    })
}
