//! Token issuance settings.
//!
//! [`TokenSettings`] is what operators configure. It is normalized once at
//! load time into an immutable [`IssuerSettings`], which is the only form the
//! issuer reads.

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_ISSUER as TRACING_TARGET;

/// Configured expiries below this value are treated as unset.
pub const MIN_EXPIRY_MS: i64 = 10;
/// Configured refresh expiries below this value are not used for transaction tokens.
pub const MIN_TRANSACTION_EXPIRY_MS: i64 = 50;

/// Access token expiry used when the configured value is implausibly small.
pub const ACCESS_EXPIRY_FLOOR_MS: i64 = 5 * 60 * 1000;
/// Refresh token expiry used when the configured value is implausibly small.
pub const REFRESH_EXPIRY_FLOOR_MS: i64 = 30 * 60 * 1000;
/// Transaction and admin token expiry used when the configured refresh expiry is too small.
pub const TRANSACTION_EXPIRY_FLOOR_MS: i64 = 60 * 60 * 1000;
/// Expiry of service tokens.
pub const SERVICE_EXPIRY_MS: i64 = 24 * 60 * 60 * 1000;

/// Token issuance configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[builder(
    name = "TokenSettingsBuilder",
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate_settings")
)]
#[serde(default)]
pub struct TokenSettings {
    /// Issuer (`iss`) written into user tokens.
    #[cfg_attr(
        feature = "config",
        arg(long = "token-issuer", env = "TOKEN_ISSUER", default_value = "tollgate")
    )]
    #[builder(default = "TokenSettings::default_name()")]
    pub issuer: String,

    /// Name of this service, used as the audience of admin tokens.
    #[cfg_attr(
        feature = "config",
        arg(long = "service-name", env = "SERVICE_NAME", default_value = "tollgate")
    )]
    #[builder(default = "TokenSettings::default_name()")]
    pub service_name: String,

    /// Access token expiry in milliseconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "token-auth-expiry", env = "TOKEN_AUTH_EXPIRY", default_value_t = 300_000)
    )]
    #[builder(default = "300_000")]
    pub access_expiry_ms: i64,

    /// Refresh token expiry in milliseconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "token-refresh-expiry", env = "TOKEN_REFRESH_EXPIRY", default_value_t = 1_800_000)
    )]
    #[builder(default = "1_800_000")]
    pub refresh_expiry_ms: i64,

    /// Mint developer test tokens at startup (development only).
    #[cfg_attr(feature = "config", arg(long = "token-test", env = "TOKEN_TEST"))]
    #[builder(default = "false")]
    pub test_tokens: bool,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            issuer: Self::default_name(),
            service_name: Self::default_name(),
            access_expiry_ms: 300_000,
            refresh_expiry_ms: 1_800_000,
            test_tokens: false,
        }
    }
}

impl TokenSettings {
    /// Creates a new settings builder.
    pub fn builder() -> TokenSettingsBuilder {
        TokenSettingsBuilder::default()
    }

    fn default_name() -> String {
        "tollgate".to_owned()
    }

    /// Applies expiry floors and freezes the result.
    pub fn normalize(&self) -> IssuerSettings {
        let access_expiry_ms = floor(self.access_expiry_ms, MIN_EXPIRY_MS, ACCESS_EXPIRY_FLOOR_MS);
        let refresh_expiry_ms = floor(self.refresh_expiry_ms, MIN_EXPIRY_MS, REFRESH_EXPIRY_FLOOR_MS);
        let transaction_expiry_ms = floor(
            self.refresh_expiry_ms,
            MIN_TRANSACTION_EXPIRY_MS,
            TRANSACTION_EXPIRY_FLOOR_MS,
        );

        if access_expiry_ms != self.access_expiry_ms || refresh_expiry_ms != self.refresh_expiry_ms {
            tracing::warn!(
                target: TRACING_TARGET,
                configured_access_ms = self.access_expiry_ms,
                configured_refresh_ms = self.refresh_expiry_ms,
                access_expiry_ms,
                refresh_expiry_ms,
                "configured token expiry too small, using defaults",
            );
        }

        IssuerSettings {
            issuer: self.issuer.clone(),
            service_name: self.service_name.clone(),
            access_expiry_ms,
            refresh_expiry_ms,
            transaction_expiry_ms,
        }
    }
}

impl TokenSettingsBuilder {
    fn validate_settings(&self) -> Result<(), String> {
        if let Some(issuer) = &self.issuer
            && issuer.trim().is_empty()
        {
            return Err("Issuer cannot be empty".to_string());
        }

        if let Some(service_name) = &self.service_name
            && service_name.trim().is_empty()
        {
            return Err("Service name cannot be empty".to_string());
        }

        Ok(())
    }
}

fn floor(configured: i64, minimum: i64, fallback: i64) -> i64 {
    if configured < minimum { fallback } else { configured }
}

/// Normalized, immutable issuance settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerSettings {
    issuer: String,
    service_name: String,
    access_expiry_ms: i64,
    refresh_expiry_ms: i64,
    transaction_expiry_ms: i64,
}

impl IssuerSettings {
    #[inline]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[inline]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    #[inline]
    pub fn access_expiry_ms(&self) -> i64 {
        self.access_expiry_ms
    }

    #[inline]
    pub fn refresh_expiry_ms(&self) -> i64 {
        self.refresh_expiry_ms
    }

    /// Expiry of transaction tokens.
    #[inline]
    pub fn transaction_expiry_ms(&self) -> i64 {
        self.transaction_expiry_ms
    }

    /// Expiry of admin tokens; same as transaction tokens.
    #[inline]
    pub fn admin_expiry_ms(&self) -> i64 {
        self.transaction_expiry_ms
    }

    /// Expiry of service tokens.
    #[inline]
    pub fn service_expiry_ms(&self) -> i64 {
        SERVICE_EXPIRY_MS
    }
}

impl Default for IssuerSettings {
    fn default() -> Self {
        TokenSettings::default().normalize()
    }
}
