//! HTTP server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Args;
use tollgate_core::Identity;

use crate::TRACING_TARGET_CONFIG;

/// HTTP server configuration for `tollgate serve`.
///
/// # Environment Variables
///
/// - `HOST` - Server host address (default: 127.0.0.1)
/// - `PORT` - Server port (default: 3000)
/// - `SHUTDOWN_TIMEOUT` - Graceful shutdown timeout in seconds (default: 30)
/// - `IDENTITIES` - `;` separated identities, each `username=AUTHORITY,AUTHORITY`
#[derive(Debug, Clone, Args)]
#[must_use = "config does nothing unless you use it"]
pub struct ServerConfig {
    /// Host address to bind the server to.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// TCP port number for the server to listen on.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Maximum time in seconds to wait for graceful shutdown.
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 30)]
    pub shutdown_timeout: u64,

    /// Known identities, e.g. `jane.doe=USER` or `root=USER,ADMIN`.
    #[arg(
        long = "identity",
        env = "IDENTITIES",
        value_delimiter = ';',
        value_parser = parse_identity
    )]
    pub identities: Vec<Identity>,
}

impl ServerConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.port < 1024 {
            bail!(
                "port {} is below 1024, use ports 1024-65535 to avoid requiring root privileges",
                self.port
            );
        }

        if self.shutdown_timeout == 0 || self.shutdown_timeout > 300 {
            bail!(
                "shutdown timeout {} seconds is invalid, must be between 1 and 300 seconds",
                self.shutdown_timeout
            );
        }

        Ok(())
    }

    /// Returns the socket address to bind.
    #[inline]
    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the graceful shutdown timeout.
    #[inline]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// Returns `true` if the server binds to all interfaces.
    #[inline]
    pub fn binds_to_all_interfaces(&self) -> bool {
        self.host.is_unspecified()
    }

    /// Logs the server configuration.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            addr = %self.server_addr(),
            shutdown_timeout_secs = self.shutdown_timeout,
            identities = self.identities.len(),
            "server configuration"
        );

        if self.identities.is_empty() {
            tracing::warn!(
                target: TRACING_TARGET_CONFIG,
                "no identities configured, every request will be rejected"
            );
        }
    }
}

/// Parses `username=AUTHORITY,AUTHORITY`.
fn parse_identity(value: &str) -> Result<Identity, String> {
    let (username, authorities) = value.split_once('=').unwrap_or((value, ""));
    let username = username.trim();
    if username.is_empty() {
        return Err(format!("identity '{value}' has no username"));
    }

    let authorities = authorities
        .split(',')
        .map(str::trim)
        .filter(|authority| !authority.is_empty());
    Ok(Identity::new(username, authorities))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identity() {
        let identity = parse_identity("root = USER, ADMIN").unwrap();
        assert_eq!(identity.username, "root");
        assert_eq!(identity.authorities, ["USER", "ADMIN"]);

        let identity = parse_identity("jane.doe").unwrap();
        assert_eq!(identity.username, "jane.doe");
        assert!(identity.authorities.is_empty());
    }

    #[test]
    fn rejects_identity_without_username() {
        assert!(parse_identity("=USER").is_err());
        assert!(parse_identity("").is_err());
    }
}
