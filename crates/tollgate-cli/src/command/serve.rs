//! `tollgate serve`.

use anyhow::Context;
use axum::Router;
use tollgate_core::{StaticIdentityResolver, TokenIssuer};
use tollgate_server::handler::routes;
use tollgate_server::service::ServiceState;

use crate::config::ServerConfig;
use crate::server;

pub async fn run(config: ServerConfig, issuer: TokenIssuer) -> anyhow::Result<()> {
    config.log();
    config.validate().context("invalid server configuration")?;

    let router = create_router(&config, issuer);
    server::serve_http(router, config).await
}

/// Creates the router with the configured identities behind the guard.
fn create_router(config: &ServerConfig, issuer: TokenIssuer) -> Router {
    let identities: StaticIdentityResolver = config.identities.iter().cloned().collect();
    let state = ServiceState::from_issuer(issuer, identities);

    routes(state.clone()).with_state(state)
}
