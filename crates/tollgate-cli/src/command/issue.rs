//! `tollgate issue`.

use anyhow::Context;
use clap::Subcommand;
use serde::Serialize;
use tollgate_core::issuer::{ServiceTokensResponse, UserTokensResponse};
use tollgate_core::{TokenIssuer, TokenType};

/// Token kinds that can be issued from the command line.
#[derive(Debug, Clone, Subcommand)]
pub enum IssueCommand {
    /// An access and refresh token pair for a user.
    User {
        subject: String,
    },

    /// A `TX_USERS` transaction token for a user.
    Tx {
        subject: String,
    },

    /// Tokens for a calling service.
    Service {
        service_id: String,
        service_name: String,
        owner: String,
        audience: String,

        /// Issue internal service tokens (`TX_SERVICE` plus `TX_USERS`)
        /// instead of a single `TX_EXTERNAL` token.
        #[arg(long)]
        internal: bool,
    },

    /// A short-lived admin token.
    Admin {
        subject: String,

        /// Issuer written into the token.
        issuer: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionTokenOutput {
    tx_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdminTokenOutput {
    auth_token: String,
}

impl IssueCommand {
    pub fn run(self, issuer: &TokenIssuer) -> anyhow::Result<()> {
        let output = match self {
            Self::User { subject } => {
                let tokens = issuer.issue_user_tokens(&subject)?;
                serde_json::to_value(UserTokensResponse::from(&tokens))
            }
            Self::Tx { subject } => {
                let token = issuer.issue_transaction_token(&subject, TokenType::TxUsers)?;
                serde_json::to_value(TransactionTokenOutput {
                    tx_token: token.bearer(),
                })
            }
            Self::Service {
                service_id,
                service_name,
                owner,
                audience,
                internal,
            } => {
                let tokens = issuer.issue_service_tokens(
                    &service_id,
                    &service_name,
                    &owner,
                    &audience,
                    internal,
                )?;
                serde_json::to_value(ServiceTokensResponse::from(&tokens))
            }
            Self::Admin { subject, issuer: on_behalf_of } => {
                let token = issuer.issue_admin_token(&subject, &on_behalf_of)?;
                serde_json::to_value(AdminTokenOutput {
                    auth_token: token.bearer(),
                })
            }
        }
        .context("failed to serialize issued tokens")?;

        let output = serde_json::to_string_pretty(&output).context("failed to format issued tokens")?;
        println!("{output}");
        Ok(())
    }
}
