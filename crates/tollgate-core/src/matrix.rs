//! Required token type per endpoint category and mode.

use crate::token::{Claims, TokenCategory, TokenMode, TokenType};
use crate::{Error, Result};

/// Maps an endpoint's declared category and mode to the token type it accepts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenTypeMatrix;

impl TokenTypeMatrix {
    /// Returns the primary token type required for the category and mode.
    ///
    /// Combinations without a dedicated row accept [`TokenType::Auth`].
    #[must_use]
    pub const fn required_type(category: TokenCategory, mode: TokenMode) -> TokenType {
        match (category, mode) {
            (TokenCategory::Consumers, TokenMode::RefreshToken) => TokenType::AuthRefresh,
            (TokenCategory::InternalServices, TokenMode::SecurePkg) => TokenType::TxService,
            (TokenCategory::ExternalServices, TokenMode::SecurePkg) => TokenType::TxExternal,
            _ => TokenType::Auth,
        }
    }

    /// Returns the type a secondary transaction token must carry.
    #[inline]
    #[must_use]
    pub const fn transaction_type() -> TokenType {
        TokenType::TxUsers
    }

    /// Checks the `type` claim of a primary token against the endpoint policy.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ClaimsMissing`](crate::ErrorKind::ClaimsMissing) if the claim is
    /// absent or not a string, and
    /// [`ErrorKind::TokenTypeMismatch`](crate::ErrorKind::TokenTypeMismatch) otherwise.
    pub fn check(category: TokenCategory, mode: TokenMode, claims: &Claims) -> Result<TokenType> {
        Self::expect(Self::required_type(category, mode), claims)
    }

    /// Checks that a secondary token is a transaction token.
    pub fn check_transaction(claims: &Claims) -> Result<TokenType> {
        Self::expect(Self::transaction_type(), claims)
    }

    fn expect(required: TokenType, claims: &Claims) -> Result<TokenType> {
        let raw = claims
            .raw_token_type()
            .ok_or_else(|| Error::claims_missing("token carries no readable type claim"))?;

        match claims.token_type() {
            Some(actual) if actual == required => Ok(actual),
            _ => Err(Error::token_type_mismatch(format!(
                "expected {required} token, got '{raw}'"
            ))),
        }
    }
}
