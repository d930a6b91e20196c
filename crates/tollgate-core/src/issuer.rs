//! Token issuance flows.

use serde::{Deserialize, Serialize};

use crate::codec::TokenCodec;
use crate::config::IssuerSettings;
use crate::role::{ROLE_ADMIN_TOKEN, ROLE_SERVICE, ROLE_TRANSACTION, ROLE_USER};
use crate::token::{Claims, Token, TokenType, keys};
use crate::{Result, TRACING_TARGET_ISSUER as TRACING_TARGET};

/// Audience of consumer access and refresh tokens.
pub const AUDIENCE_GENERIC: &str = "generic";
/// Audience of transaction tokens.
pub const AUDIENCE_TX_SERVICES: &str = "tx-services";

/// A consumer access and refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTokens {
    pub access: Token,
    pub refresh: Token,
}

/// Wire form of [`UserTokens`], each token as a `Bearer` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTokensResponse {
    pub auth_token: String,
    pub refresh_token: String,
}

impl From<&UserTokens> for UserTokensResponse {
    fn from(tokens: &UserTokens) -> Self {
        Self {
            auth_token: tokens.access.bearer(),
            refresh_token: tokens.refresh.bearer(),
        }
    }
}

/// Tokens issued to a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTokens {
    /// `TX_SERVICE` for internal services, `TX_EXTERNAL` for external ones.
    pub auth: Token,
    /// `TX_USERS` transaction token, internal services only.
    pub transaction: Option<Token>,
    /// Lifetime of the tokens in milliseconds.
    pub expiry_ms: i64,
}

/// Wire form of [`ServiceTokens`], each token as a `Bearer` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTokensResponse {
    pub auth_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_token: Option<String>,
    pub expiry_time: i64,
}

impl From<&ServiceTokens> for ServiceTokensResponse {
    fn from(tokens: &ServiceTokens) -> Self {
        Self {
            auth_token: tokens.auth.bearer(),
            tx_token: tokens.transaction.as_ref().map(Token::bearer),
            expiry_time: tokens.expiry_ms,
        }
    }
}

/// Mints the token sets for user, transaction, service and admin flows.
///
/// Holds no mutable state and can be shared freely.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    codec: TokenCodec,
    settings: IssuerSettings,
}

impl TokenIssuer {
    /// Creates an issuer with normalized settings.
    pub fn new(codec: TokenCodec, settings: IssuerSettings) -> Self {
        Self { codec, settings }
    }

    #[inline]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    #[inline]
    pub fn settings(&self) -> &IssuerSettings {
        &self.settings
    }

    /// Issues a consumer access and refresh token pair.
    pub fn issue_user_tokens(&self, subject: &str) -> Result<UserTokens> {
        let claims = Claims::new()
            .with(keys::AUDIENCE, AUDIENCE_GENERIC)
            .with(keys::ROLE, ROLE_USER);

        let tokens = self.user_pair(subject, claims)?;
        tracing::info!(target: TRACING_TARGET, subject, "user tokens issued");
        Ok(tokens)
    }

    /// Issues a new pair from the claims of a presented token.
    ///
    /// Every claim of `existing` is carried into both new tokens; only `type`
    /// and the computed fields are replaced.
    pub fn refresh_user_tokens(&self, subject: &str, existing: &Claims) -> Result<UserTokens> {
        let tokens = self.user_pair(subject, existing.clone())?;
        tracing::info!(target: TRACING_TARGET, subject, "user tokens refreshed");
        Ok(tokens)
    }

    /// Issues a transaction token of the given type.
    pub fn issue_transaction_token(&self, subject: &str, token_type: TokenType) -> Result<Token> {
        let claims = Claims::new()
            .with(keys::AUDIENCE, AUDIENCE_TX_SERVICES)
            .with(keys::TYPE, token_type.to_string())
            .with(keys::ROLE, ROLE_TRANSACTION);

        let token = self.codec.encode(
            subject,
            self.settings.issuer(),
            self.settings.transaction_expiry_ms(),
            &claims,
        )?;

        tracing::info!(
            target: TRACING_TARGET,
            subject,
            token_type = %token_type,
            "transaction token issued",
        );
        Ok(token)
    }

    /// Issues the tokens for a service.
    ///
    /// Internal services get a `TX_SERVICE` token plus a `TX_USERS` transaction
    /// token; external services get a single `TX_EXTERNAL` token.
    pub fn issue_service_tokens(
        &self,
        service_id: &str,
        service_name: &str,
        owner: &str,
        audience: &str,
        internal: bool,
    ) -> Result<ServiceTokens> {
        let claims = Claims::new()
            .with(keys::AUDIENCE, audience)
            .with(keys::ROLE, ROLE_SERVICE)
            .with(keys::SERVICE_ID, service_id)
            .with(keys::SERVICE, service_name)
            .with(keys::OWNER, owner);

        let expiry_ms = self.settings.service_expiry_ms();
        let encode = |token_type: TokenType| {
            let claims = claims.clone().with(keys::TYPE, token_type.to_string());
            self.codec.encode(service_name, self.settings.issuer(), expiry_ms, &claims)
        };

        let tokens = if internal {
            ServiceTokens {
                auth: encode(TokenType::TxService)?,
                transaction: Some(encode(TokenType::TxUsers)?),
                expiry_ms,
            }
        } else {
            ServiceTokens {
                auth: encode(TokenType::TxExternal)?,
                transaction: None,
                expiry_ms,
            }
        };

        tracing::info!(
            target: TRACING_TARGET,
            service_id,
            service = service_name,
            owner,
            audience,
            internal,
            "service tokens issued",
        );
        Ok(tokens)
    }

    /// Issues an admin token on behalf of `issuer`.
    pub fn issue_admin_token(&self, subject: &str, issuer: &str) -> Result<Token> {
        let claims = Claims::new()
            .with(keys::AUDIENCE, self.settings.service_name())
            .with(keys::ROLE, ROLE_ADMIN_TOKEN)
            .with(keys::TYPE, TokenType::TxUsers.to_string());

        let token = self
            .codec
            .encode(subject, issuer, self.settings.admin_expiry_ms(), &claims)?;

        tracing::info!(target: TRACING_TARGET, subject, issuer, "admin token issued");
        Ok(token)
    }

    fn user_pair(&self, subject: &str, claims: Claims) -> Result<UserTokens> {
        let issuer = self.settings.issuer();

        let access_claims = claims.clone().with(keys::TYPE, TokenType::Auth.to_string());
        let access = self
            .codec
            .encode(subject, issuer, self.settings.access_expiry_ms(), &access_claims)?;

        let refresh_claims = claims.with(keys::TYPE, TokenType::AuthRefresh.to_string());
        let refresh = self
            .codec
            .encode(subject, issuer, self.settings.refresh_expiry_ms(), &refresh_claims)?;

        Ok(UserTokens { access, refresh })
    }
}
