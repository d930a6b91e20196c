#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;
mod server;
mod test_tokens;

use std::process;

use anyhow::Context;
use tollgate_core::{SigningKey, TokenCodec, TokenIssuer};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "tollgate_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "tollgate_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "tollgate_cli::config";
pub const TRACING_TARGET_TEST_TOKENS: &str = "tollgate_cli::test_tokens";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::debug!(
            target: TRACING_TARGET_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = format!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    init_tracing(cli.log_json);
    log_startup_info();
    cli.log();

    let signing_key = SigningKey::from_config(&cli.signing_key)
        .await
        .context("failed to load signing key")?;
    signing_key
        .validate_keys()
        .context("signing key failed validation")?;

    let codec = TokenCodec::new(signing_key);
    let issuer = TokenIssuer::new(codec, cli.settings.normalize());

    if cli.mints_test_tokens() {
        test_tokens::mint(&issuer).context("failed to mint test tokens")?;
    }

    cli.command.run(issuer).await
}

/// Initializes tracing with environment-based filtering.
///
/// Logs go to stderr so that command output on stdout stays machine readable.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

/// Logs startup information.
fn log_startup_info() {
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting tollgate"
    );

    tracing::debug!(
        target: TRACING_TARGET_STARTUP,
        pid = process::id(),
        arch = std::env::consts::ARCH,
        os = std::env::consts::OS,
        features = ?enabled_features(),
        "build information"
    );
}

/// Returns a list of enabled compile-time features.
fn enabled_features() -> Vec<&'static str> {
    [cfg!(feature = "dotenv").then_some("dotenv")]
        .into_iter()
        .flatten()
        .collect()
}
