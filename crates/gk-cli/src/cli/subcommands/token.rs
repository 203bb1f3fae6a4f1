use clap::{Args, Subcommand};
use gk_core::PlatformKind;

/// Platform token commands.
#[derive(Clone, Debug, Subcommand)]
pub enum TokenCommands {
    /// Store a token (prompted for when --token is omitted).
    Set(TokenSetArgs),
    /// Remove a stored token.
    Delete(TokenDeleteArgs),
    /// Show which accounts have a token.
    Status(TokenStatusArgs),
}

#[derive(Clone, Debug, Args)]
pub struct TokenSetArgs {
    pub platform: PlatformKind,
    /// Account the token belongs to; `default` serves every account.
    #[arg(long, default_value = gk_auth::DEFAULT_ACCOUNT)]
    pub account: String,
    /// Token value. Prefer the prompt to keep it out of shell history.
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct TokenDeleteArgs {
    pub platform: PlatformKind,
    #[arg(long, default_value = gk_auth::DEFAULT_ACCOUNT)]
    pub account: String,
}

#[derive(Clone, Debug, Args)]
pub struct TokenStatusArgs {
    /// Only this platform.
    pub platform: Option<PlatformKind>,
}
