use clap::{Args, Subcommand};
use gk_core::PlatformKind;
use gk_lifecycle::Selection;

use crate::cli::subcommands::{AgentCommands, TokenCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create the declared config for this machine.
    Init(InitArgs),
    /// Scan keys, routing, agent, and git identities.
    Scan(ScanArgs),
    /// Suggest personas and platforms from a scan.
    Recommend,
    /// Adopt an existing setup through the wizard.
    Import(WizardArgs),
    /// Show what `apply` would do.
    Plan,
    /// Generate missing keys, write routing, upload keys.
    Apply,
    /// Rotate active keys.
    Rotate(RotateArgs),
    /// Revoke keys remotely and mark them revoked.
    Revoke(RevokeArgs),
    /// Per-key status and expiry.
    Status,
    /// Check the declared config against the key directory.
    Validate(ValidateArgs),
    /// Write directory-scoped git identities.
    SetupGit,
    /// Back up, tear down, and re-create everything.
    Rebuild(RebuildArgs),
    /// List backups, show one, or restore its declared config.
    Restore(RestoreArgs),
    /// Platform token storage.
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },
    /// Load or unload managed keys in the SSH agent.
    Agent {
        #[command(subcommand)]
        action: AgentCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct InitArgs {
    /// First persona name.
    #[arg(long, default_value = "personal")]
    pub persona: String,
    /// Email of the first persona.
    #[arg(long)]
    pub email: String,
    /// Platform of the first persona.
    #[arg(long)]
    pub platform: PlatformKind,
    /// Account on that platform.
    #[arg(long)]
    pub account: String,
    /// Self-hosted base URL.
    #[arg(long)]
    pub base_url: Option<String>,
    /// Directory pattern whose repositories use this identity.
    #[arg(long)]
    pub git_dir: Option<String>,
    /// Replace an existing declared config.
    #[arg(long)]
    pub force: bool,
}

#[derive(Clone, Debug, Args)]
pub struct ScanArgs {
    /// Also query platform APIs for registered keys.
    #[arg(long)]
    pub check_remote: bool,
}

#[derive(Clone, Debug, Args)]
pub struct WizardArgs {
    /// Accept every suggestion without prompting.
    #[arg(short, long)]
    pub yes: bool,
    /// Query platform APIs while scanning.
    #[arg(long)]
    pub check_remote: bool,
}

/// Which (persona, platform) pairs a command acts on.
#[derive(Clone, Debug, Default, Args)]
pub struct SelectionArgs {
    /// Only this persona.
    #[arg(long)]
    pub persona: Option<String>,
    /// Only this platform.
    #[arg(long)]
    pub platform: Option<PlatformKind>,
    /// Every pair.
    #[arg(long, conflicts_with_all = ["persona", "platform"])]
    pub all: bool,
}

impl SelectionArgs {
    #[must_use]
    pub fn to_selection(&self) -> Selection {
        Selection {
            persona: self.persona.clone(),
            platform: self.platform,
            all: self.all,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct RotateArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
    /// List the keys that would rotate.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Clone, Debug, Args)]
#[command(group(
    clap::ArgGroup::new("target")
        .required(true)
        .args(["persona", "platform", "all", "fingerprint"])
))]
pub struct RevokeArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
    /// The key with this fingerprint.
    #[arg(long, conflicts_with_all = ["persona", "platform", "all"])]
    pub fingerprint: Option<String>,
    /// Also delete the key files.
    #[arg(long)]
    pub delete_local: bool,
}

#[derive(Clone, Debug, Args)]
pub struct ValidateArgs {
    /// Narrow loose private key permissions to 0600.
    #[arg(long)]
    pub fix: bool,
}

#[derive(Clone, Debug, Args)]
pub struct RebuildArgs {
    /// Do not write a backup snapshot first.
    #[arg(long)]
    pub skip_backup: bool,
    /// Leave keys registered on the platforms.
    #[arg(long)]
    pub keep_remote: bool,
    /// Show what would be torn down.
    #[arg(long)]
    pub dry_run: bool,
    /// Accept every suggestion without prompting.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Clone, Debug, Args)]
pub struct RestoreArgs {
    /// Backup file name; lists backups when omitted.
    pub name: Option<String>,
    /// Write the snapshot's declared config back.
    #[arg(long, requires = "name")]
    pub apply: bool,
}
