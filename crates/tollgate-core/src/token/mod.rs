//! Token primitives: the compact token string, its claims and the type vocabularies.

mod claims;
mod kind;

use derive_more::{AsRef, Display, Into};
use serde::{Deserialize, Serialize};

pub use self::claims::{Claims, keys};
pub use self::kind::{TokenCategory, TokenMode, TokenType};
use crate::{Error, Result};

/// Prefix that introduces a bearer credential in a header value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// An issued compact token (`header.payload.signature`).
///
/// Tokens are immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, AsRef, Into, Serialize, Deserialize)]
#[as_ref(str)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wraps an already encoded token string.
    #[inline]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the compact token string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the token formatted as a `Bearer <token>` header value.
    #[inline]
    pub fn bearer(&self) -> String {
        format!("{BEARER_PREFIX}{}", self.0)
    }
}

/// Extracts the token from a `Bearer <token>` header value.
///
/// The prefix is matched literally and the remainder must be non-empty.
///
/// # Errors
///
/// Returns [`ErrorKind::TokenExtraction`](crate::ErrorKind::TokenExtraction) if the value is
/// absent, lacks the prefix or carries no token.
pub fn extract_bearer(header: Option<&str>) -> Result<&str> {
    let Some(value) = header else {
        return Err(Error::token_extraction("missing authorization header"));
    };

    match value.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() => Ok(token),
        Some(_) => Err(Error::token_extraction("empty bearer token")),
        None => Err(Error::token_extraction("missing bearer prefix")),
    }
}
