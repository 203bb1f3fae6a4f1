mod delete;
mod set;
mod status;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::TokenCommands;
use crate::context::AppContext;

/// Handle `git-keys token`.
pub fn handle(action: &TokenCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        TokenCommands::Set(args) => set::run(args, ctx, flags),
        TokenCommands::Delete(args) => delete::run(args, ctx, flags),
        TokenCommands::Status(args) => status::run(args, ctx, flags),
    }
}
