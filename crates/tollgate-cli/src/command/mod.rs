//! Subcommands.

mod inspect;
mod issue;
mod serve;

use clap::Subcommand;
pub use issue::IssueCommand;
use tollgate_core::TokenIssuer;

use crate::config::ServerConfig;

/// What the binary does after loading its configuration.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Serve the token routes over HTTP.
    Serve(ServerConfig),

    /// Issue tokens and print them as JSON.
    Issue {
        #[command(subcommand)]
        command: IssueCommand,
    },

    /// Verify a token and print its claims and remaining lifetime.
    Inspect {
        /// The token, with or without the `Bearer ` prefix.
        token: String,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    /// Runs the command against a fully configured issuer.
    pub async fn run(self, issuer: TokenIssuer) -> anyhow::Result<()> {
        match self {
            Self::Serve(config) => serve::run(config, issuer).await,
            Self::Issue { command } => command.run(&issuer),
            Self::Inspect { token, json } => inspect::run(&issuer, &token, json),
        }
    }
}
