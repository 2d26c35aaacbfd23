use anyhow::{Result, bail};

use super::{
    args::{Arguments, Command},
    commands::{CommandResult, apply::apply, init::init, scan::scan, suggest::suggest},
};

/// Dispatch to the handler of the parsed command.
///
/// # Returns
/// - `Ok(CommandResult)` describing what the command found or changed
/// - `Err` if the command could not run (config errors, unreadable project)
pub fn run(Arguments { command }: Arguments) -> Result<CommandResult> {
    match command {
        Some(Command::Scan(cmd)) => scan(cmd),
        Some(Command::Suggest(cmd)) => suggest(cmd),
        Some(Command::Apply(cmd)) => apply(cmd),
        Some(Command::Init) => init(),
        None => bail!("No command provided. Use --help to see available commands."),
    }
}
