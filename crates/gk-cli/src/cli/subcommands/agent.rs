use clap::{ArgGroup, Args, Subcommand};

/// SSH agent commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AgentCommands {
    /// Load managed keys into the agent.
    Add(AgentArgs),
    /// Unload managed keys from the agent.
    Remove(AgentArgs),
}

#[derive(Clone, Debug, Args)]
#[command(group(ArgGroup::new("scope").required(true).args(["persona", "all"])))]
pub struct AgentArgs {
    /// Only this persona's keys.
    #[arg(long, conflicts_with = "all")]
    pub persona: Option<String>,
    /// Every active key.
    #[arg(long)]
    pub all: bool,
}
