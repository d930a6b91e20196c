//! HTTP server startup and graceful shutdown.

mod shutdown;

use std::future::{Future, IntoFuture};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SHUTDOWN, TRACING_TARGET_STARTUP};
use shutdown::shutdown_signal;

/// Binds the configured address and serves `app` until a shutdown signal.
///
/// Open connections get the configured shutdown timeout to finish after the
/// signal; whatever is still running then is dropped.
pub async fn serve_http(app: Router, config: ServerConfig) -> anyhow::Result<()> {
    let server_addr = config.server_addr();
    let listener = TcpListener::bind(server_addr)
        .await
        .inspect_err(|err| {
            tracing::error!(
                target: TRACING_TARGET_STARTUP,
                addr = %server_addr,
                error = %err,
                "failed to bind to address"
            );
        })
        .with_context(|| format!("failed to bind to {server_addr}"))?;

    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        addr = %server_addr,
        "server is ready and listening for connections"
    );

    if config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_STARTUP,
            "server is bound to all interfaces, ensure firewall rules are properly configured"
        );
    }

    let shutdown_timeout = config.shutdown_timeout();
    let (signalled_tx, signalled_rx) = oneshot::channel();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal(shutdown_timeout).await;
        let _ = signalled_tx.send(());
    })
    .into_future();

    let drained = drain_within(server, signalled_rx, shutdown_timeout)
        .await
        .context("server encountered an error")?;

    if drained {
        tracing::info!(target: TRACING_TARGET_SHUTDOWN, "server shut down gracefully");
    } else {
        tracing::warn!(
            target: TRACING_TARGET_SHUTDOWN,
            timeout_secs = shutdown_timeout.as_secs(),
            "shutdown timeout elapsed, dropping open connections"
        );
    }

    Ok(())
}

/// Runs `server` to completion, or until `timeout` after `signalled` fires.
///
/// Returns `false` when the timeout cut the drain short.
async fn drain_within<F>(
    server: F,
    signalled: oneshot::Receiver<()>,
    timeout: Duration,
) -> io::Result<bool>
where
    F: Future<Output = io::Result<()>>,
{
    let deadline = async {
        match signalled.await {
            Ok(()) => tokio::time::sleep(timeout).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = server => result.map(|()| true),
        () = deadline => Ok(false),
    }
}
