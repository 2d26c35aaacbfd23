use std::{env, fs};

use anyhow::{Context, Result};

use super::{CommandResult, CommandSummary, InitSummary};
use crate::config::{CONFIG_FILE_NAME, default_config_json};

/// Write the default config into the current directory unless one exists.
pub fn init() -> Result<CommandResult> {
    let project_root = env::current_dir().context("Failed to read current directory")?;
    let config_path = project_root.join(CONFIG_FILE_NAME);

    let created = if config_path.exists() {
        false
    } else {
        fs::write(&config_path, default_config_json()?)
            .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;
        true
    };

    Ok(CommandResult {
        summary: CommandSummary::Init(InitSummary { created }),
        scan_errors: Vec::new(),
        source_files_checked: 0,
        locale_files_checked: 0,
        project_root,
    })
}
