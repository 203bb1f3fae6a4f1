use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Init(args) => commands::init::handle(&args, ctx, flags),
        Commands::Scan(args) => commands::scan::handle(&args, ctx, flags).await,
        Commands::Recommend => commands::recommend::handle(ctx, flags).await,
        Commands::Import(args) => commands::import::handle(&args, ctx, flags).await,
        Commands::Plan => commands::plan::handle(ctx, flags),
        Commands::Apply => commands::apply::handle(ctx, flags).await,
        Commands::Rotate(args) => commands::rotate::handle(&args, ctx, flags).await,
        Commands::Revoke(args) => commands::revoke::handle(&args, ctx, flags).await,
        Commands::Status => commands::status::handle(ctx, flags),
        Commands::Validate(args) => commands::validate::handle(&args, ctx, flags).await,
        Commands::SetupGit => commands::setup_git::handle(ctx, flags),
        Commands::Rebuild(args) => commands::rebuild::handle(&args, ctx, flags).await,
        Commands::Restore(args) => commands::restore::handle(&args, ctx, flags),
        Commands::Token { action } => commands::token::handle(&action, ctx, flags),
        Commands::Agent { action } => commands::agent::handle(&action, ctx, flags).await,
    }
}
