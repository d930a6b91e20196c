//! CLI configuration.
//!
//! ```text
//! Cli
//! ├── environment: Environment       # development, staging, production
//! ├── settings: TokenSettings        # issuer, expiries, test tokens
//! ├── signing_key: SigningKeyConfig  # algorithm, secret, PEM files
//! └── command: Command               # serve, issue, inspect
//! ```
//!
//! Every option can be provided as a flag or as an environment variable.

mod server;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use strum::{Display, EnumString};
use tollgate_core::{SigningKeyConfig, TokenSettings};

use crate::TRACING_TARGET_CONFIG;
use crate::command::Command;

/// Deployment environment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(ValueEnum, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Returns `true` for the development environment.
    #[inline]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "tollgate")]
#[command(about = "JWT issuance and request authorization")]
#[command(version)]
pub struct Cli {
    /// Deployment environment.
    #[arg(long, env = "TOLLGATE_ENV", value_enum, default_value_t = Environment::Development, global = true)]
    pub environment: Environment,

    /// Emit logs as JSON lines.
    #[arg(long, env = "LOG_JSON", global = true)]
    pub log_json: bool,

    /// Token issuance settings.
    #[clap(flatten)]
    pub settings: TokenSettings,

    /// Signing key configuration.
    #[clap(flatten)]
    pub signing_key: SigningKeyConfig,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads the `.env` file (if enabled) and parses the arguments.
    ///
    /// The `.env` file is loaded first so that clap picks its values up as
    /// environment fallbacks.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Returns `true` if developer test tokens should be minted at startup.
    pub fn mints_test_tokens(&self) -> bool {
        self.settings.test_tokens && self.environment.is_development()
    }

    /// Logs the configuration (no secrets).
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            environment = %self.environment,
            issuer = %self.settings.issuer,
            service_name = %self.settings.service_name,
            access_expiry_ms = self.settings.access_expiry_ms,
            refresh_expiry_ms = self.settings.refresh_expiry_ms,
            test_tokens = self.settings.test_tokens,
            algorithm = %self.signing_key.algorithm,
            "token configuration"
        );

        if self.settings.test_tokens && !self.environment.is_development() {
            tracing::warn!(
                target: TRACING_TARGET_CONFIG,
                environment = %self.environment,
                "test tokens are only minted in development, ignoring"
            );
        }
    }
}
