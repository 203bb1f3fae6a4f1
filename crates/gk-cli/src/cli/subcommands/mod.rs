mod agent;
mod token;

pub use agent::{AgentArgs, AgentCommands};
pub use token::{TokenCommands, TokenDeleteArgs, TokenSetArgs, TokenStatusArgs};
