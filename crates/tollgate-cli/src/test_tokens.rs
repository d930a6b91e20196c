//! Developer test tokens minted at startup.

use tollgate_core::stats::{TokenStats, format_expiry};
use tollgate_core::{Result, Token, TokenIssuer, TokenType};

use crate::TRACING_TARGET_TEST_TOKENS as TRACING_TARGET;

/// Subject of the developer test tokens.
pub const TEST_SUBJECT: &str = "jane.doe";

/// A full set of tokens for [`TEST_SUBJECT`].
#[derive(Debug, Clone)]
pub struct TestTokens {
    pub access: Token,
    pub refresh: Token,
    pub transaction: Token,
    pub admin: Token,
}

/// Mints and logs the developer test tokens.
pub fn mint(issuer: &TokenIssuer) -> Result<TestTokens> {
    let user = issuer.issue_user_tokens(TEST_SUBJECT)?;
    let tokens = TestTokens {
        access: user.access,
        refresh: user.refresh,
        transaction: issuer.issue_transaction_token(TEST_SUBJECT, TokenType::TxUsers)?,
        admin: issuer.issue_admin_token(TEST_SUBJECT, issuer.settings().issuer())?,
    };

    for (name, token) in [
        ("access", &tokens.access),
        ("refresh", &tokens.refresh),
        ("transaction", &tokens.transaction),
        ("admin", &tokens.admin),
    ] {
        let stats = TokenStats::inspect(issuer.codec(), token.as_str())?;
        tracing::info!(
            target: TRACING_TARGET,
            kind = name,
            subject = TEST_SUBJECT,
            token_type = stats.token_type.as_deref().unwrap_or_default(),
            expires_in = %format_expiry(stats.remaining_ms),
            token = %token.bearer(),
            "test token"
        );
    }

    Ok(tokens)
}
