//! Closed vocabularies describing what a token is for and what an endpoint accepts.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Purpose of a token, carried in its `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumString, AsRefStr, IntoStaticStr, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    /// Short-lived consumer access token.
    Auth,
    /// Long-lived consumer refresh token.
    AuthRefresh,
    /// Transaction token presented alongside a primary token.
    TxUsers,
    /// Internal service authentication token.
    TxService,
    /// External service authentication token.
    TxExternal,
}

/// Caller class a protected endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumString, AsRefStr, IntoStaticStr, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenCategory {
    /// End users of the platform.
    Consumers,
    /// Services inside the fleet.
    InternalServices,
    /// Third-party services.
    ExternalServices,
}

/// Validation regime a protected endpoint declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumString, AsRefStr, IntoStaticStr, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenMode {
    /// Only the primary token is presented; its claims are stored for the handler.
    SingleToken,
    /// A primary token plus a `TX_USERS` transaction token.
    MultiToken,
    /// The primary token must be a refresh token.
    RefreshToken,
    /// Service-to-service secure package.
    SecurePkg,
}

impl TokenMode {
    /// Returns `true` when the endpoint expects a secondary transaction token.
    #[inline]
    #[must_use]
    pub const fn requires_transaction_token(self) -> bool {
        !matches!(self, Self::SingleToken)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn wire_names() {
        assert_eq!(TokenType::Auth.as_ref(), "AUTH");
        assert_eq!(TokenType::AuthRefresh.as_ref(), "AUTH_REFRESH");
        assert_eq!(TokenType::TxUsers.to_string(), "TX_USERS");
        assert_eq!(TokenCategory::InternalServices.as_ref(), "INTERNAL_SERVICES");
        assert_eq!(TokenMode::SecurePkg.as_ref(), "SECURE_PKG");
    }

    #[test]
    fn parse_from_wire() {
        assert_eq!(TokenType::from_str("TX_EXTERNAL").ok(), Some(TokenType::TxExternal));
        assert!(TokenType::from_str("tx_external").is_err());
        assert!(TokenType::from_str("BOGUS").is_err());
        assert_eq!(
            TokenMode::from_str("REFRESH_TOKEN").ok(),
            Some(TokenMode::RefreshToken)
        );
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&TokenType::TxService).unwrap();
        assert_eq!(json, "\"TX_SERVICE\"");
        let parsed: TokenCategory = serde_json::from_str("\"EXTERNAL_SERVICES\"").unwrap();
        assert_eq!(parsed, TokenCategory::ExternalServices);
    }

    #[test]
    fn only_single_token_skips_transaction_token() {
        assert!(!TokenMode::SingleToken.requires_transaction_token());
        assert!(TokenMode::MultiToken.requires_transaction_token());
        assert!(TokenMode::RefreshToken.requires_transaction_token());
        assert!(TokenMode::SecurePkg.requires_transaction_token());
    }
}
