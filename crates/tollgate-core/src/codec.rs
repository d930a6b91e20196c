//! Compact token encoding and verification.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Header, Validation, decode, encode};
use uuid::Uuid;

use crate::keys::SigningKey;
use crate::token::{Claims, Token, keys};
use crate::{Error, ErrorKind, Result, TRACING_TARGET_CODEC as TRACING_TARGET};

/// Signs claim sets into compact tokens and verifies them back.
///
/// Holds no mutable state; clones share the signing key.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    key: SigningKey,
    validation: Validation,
}

impl TokenCodec {
    /// Creates a codec for the given signing key.
    pub fn new(key: SigningKey) -> Self {
        let mut validation = Validation::new(key.algorithm().as_jwt());
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&[keys::EXPIRES_AT]);

        Self { key, validation }
    }

    /// Returns the signing key.
    #[inline]
    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    /// Encodes `claims` merged with `sub`, `iss`, a fresh `jti` and the
    /// issued-at and expiry times into a signed token.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::TokenEncoding`] for a non-positive expiry or a signing failure.
    pub fn encode(&self, subject: &str, issuer: &str, expiry_ms: i64, claims: &Claims) -> Result<Token> {
        self.encode_at(subject, issuer, expiry_ms, claims, Timestamp::now())
    }

    pub(crate) fn encode_at(
        &self,
        subject: &str,
        issuer: &str,
        expiry_ms: i64,
        claims: &Claims,
        now: Timestamp,
    ) -> Result<Token> {
        if expiry_ms <= 0 {
            return Err(Error::token_encoding(format!(
                "expiry must be a positive number of milliseconds, got {expiry_ms}"
            )));
        }

        let expires_at = now
            .checked_add(SignedDuration::from_millis(expiry_ms))
            .map_err(|e| Error::token_encoding("expiry is out of range").with_source(e))?;

        let mut payload = claims.clone();
        payload
            .insert(keys::SUBJECT, subject)
            .insert(keys::ISSUER, issuer)
            .insert(keys::TOKEN_ID, Uuid::new_v4().to_string())
            .insert(keys::ISSUED_AT, now.as_second())
            .insert(keys::EXPIRES_AT, expires_at.as_second());

        let header = Header::new(self.key.algorithm().as_jwt());
        let token = encode(&header, &payload, self.key.encoding_key()).map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                subject = %subject,
                error = %e,
                "failed to sign token",
            );
            Error::token_encoding("failed to sign token").with_source(e)
        })?;

        tracing::debug!(
            target: TRACING_TARGET,
            subject = %subject,
            token_type = payload.raw_token_type().unwrap_or_default(),
            expiry_ms,
            "token encoded",
        );

        Ok(Token::new(token))
    }

    /// Decodes and verifies a compact token.
    ///
    /// The signature is verified before expiry, so a tampered token is reported
    /// as such even when it has also expired.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::TokenMalformed`], [`ErrorKind::TokenSignatureInvalid`] or
    /// [`ErrorKind::TokenExpired`].
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, self.key.decoding_key(), &self.validation)
            .map_err(|e| Self::map_decode_error(token, e))?;

        Ok(data.claims)
    }

    fn map_decode_error(token: &str, error: jsonwebtoken::errors::Error) -> Error {
        let kind = match error.kind() {
            JwtErrorKind::ExpiredSignature => ErrorKind::TokenExpired,
            JwtErrorKind::InvalidSignature => ErrorKind::TokenSignatureInvalid,
            JwtErrorKind::Base64(_) if Self::is_well_formed_unsigned(token) => {
                ErrorKind::TokenSignatureInvalid
            }
            JwtErrorKind::InvalidToken
            | JwtErrorKind::Base64(_)
            | JwtErrorKind::Json(_)
            | JwtErrorKind::Utf8(_)
            | JwtErrorKind::MissingRequiredClaim(_)
            | JwtErrorKind::InvalidAlgorithm
            | JwtErrorKind::ImmatureSignature => ErrorKind::TokenMalformed,
            _ => ErrorKind::Configuration,
        };

        tracing::debug!(
            target: TRACING_TARGET,
            kind = kind.as_str(),
            error = %error,
            "token rejected",
        );

        Error::new(kind).with_source(error)
    }

    /// Returns `true` if the header and payload segments decode to JSON objects.
    ///
    /// A base64 failure on such a token can only come from the signature segment.
    fn is_well_formed_unsigned(token: &str) -> bool {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(_), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return false;
        };

        [header, payload].into_iter().all(|segment| {
            URL_SAFE_NO_PAD
                .decode(segment)
                .ok()
                .and_then(|bytes| serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(&bytes).ok())
                .is_some()
        })
    }
}
