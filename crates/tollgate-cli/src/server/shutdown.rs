//! Graceful shutdown signal handling.

use std::time::Duration;

use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;

use crate::TRACING_TARGET_SHUTDOWN as TRACING_TARGET;

/// Waits for SIGTERM or Ctrl+C.
pub async fn shutdown_signal(shutdown_timeout: Duration) {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => tracing::info!(
                target: TRACING_TARGET,
                "received ctrl+c signal, initiating graceful shutdown"
            ),
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "failed to install ctrl+c handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::info!(
                    target: TRACING_TARGET,
                    "received sigterm signal, initiating graceful shutdown"
                );
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "failed to install sigterm handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!(
        target: TRACING_TARGET,
        timeout_secs = shutdown_timeout.as_secs(),
        "graceful shutdown initiated"
    );
}
