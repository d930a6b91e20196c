//! Ordered claim sets carried in token payloads.

use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::token::TokenType;

/// Reserved claim names.
pub mod keys {
    /// Audience.
    pub const AUDIENCE: &str = "aud";
    /// Subject (identity the token was issued to).
    pub const SUBJECT: &str = "sub";
    /// Issuer.
    pub const ISSUER: &str = "iss";
    /// Token purpose.
    pub const TYPE: &str = "type";
    /// Role string.
    pub const ROLE: &str = "rol";
    /// Unique token id.
    pub const TOKEN_ID: &str = "jti";
    /// Issued at, seconds since the epoch.
    pub const ISSUED_AT: &str = "iat";
    /// Expiry, seconds since the epoch.
    pub const EXPIRES_AT: &str = "exp";
    /// Service id (service tokens only).
    pub const SERVICE_ID: &str = "serviceId";
    /// Service name (service tokens only).
    pub const SERVICE: &str = "service";
    /// Owning team (service tokens only).
    pub const OWNER: &str = "owner";
}

/// Ordered mapping of claim names to JSON values.
///
/// Insertion order is preserved on the wire. Accessors for reserved claims
/// return `None` when the claim is absent or not of the expected JSON type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Creates an empty claim set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a claim, replacing any previous value under the same name.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the raw value of a claim.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a claim as a string slice.
    #[inline]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns `true` if the claim is present.
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of claims.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no claims.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates claims in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns `true` if every claim of `other` is present here with an equal value.
    pub fn contains_all(&self, other: &Claims) -> bool {
        other.iter().all(|(key, value)| self.get(key) == Some(value))
    }

    pub fn subject(&self) -> Option<&str> {
        self.get_str(keys::SUBJECT)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get_str(keys::ISSUER)
    }

    pub fn audience(&self) -> Option<&str> {
        self.get_str(keys::AUDIENCE)
    }

    pub fn role(&self) -> Option<&str> {
        self.get_str(keys::ROLE)
    }

    pub fn token_id(&self) -> Option<&str> {
        self.get_str(keys::TOKEN_ID)
    }

    /// Returns the raw `type` claim.
    pub fn raw_token_type(&self) -> Option<&str> {
        self.get_str(keys::TYPE)
    }

    /// Returns the `type` claim parsed into a [`TokenType`].
    ///
    /// `None` covers both an absent claim and an unrecognized value.
    pub fn token_type(&self) -> Option<TokenType> {
        self.raw_token_type()
            .and_then(|raw| TokenType::from_str(raw).ok())
    }

    /// Returns the issued-at time.
    pub fn issued_at(&self) -> Option<Timestamp> {
        self.timestamp(keys::ISSUED_AT)
    }

    /// Returns the expiry time.
    pub fn expires_at(&self) -> Option<Timestamp> {
        self.timestamp(keys::EXPIRES_AT)
    }

    fn timestamp(&self, key: &str) -> Option<Timestamp> {
        self.get(key)
            .and_then(Value::as_i64)
            .and_then(|seconds| Timestamp::from_second(seconds).ok())
    }
}

impl From<Map<String, Value>> for Claims {
    #[inline]
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Claims> for Map<String, Value> {
    #[inline]
    fn from(claims: Claims) -> Self {
        claims.0
    }
}
