//! Credential header names.

use axum::http::HeaderName;

/// Primary credential header.
pub const AUTHORIZATION: HeaderName = axum::http::header::AUTHORIZATION;

/// Refresh token response header.
pub const REFRESH_TOKEN: HeaderName = HeaderName::from_static("refresh-token");

/// Transaction token request and response header.
pub const TX_TOKEN: HeaderName = HeaderName::from_static("tx-token");
