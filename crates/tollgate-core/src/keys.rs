//! Signing key management for token encoding and verification.
//!
//! The key is process-wide, immutable configuration: it is loaded once at
//! startup and then shared read-only by every codec clone.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use jiff::Timestamp;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result, TRACING_TARGET_KEYS as TRACING_TARGET};

/// Signature algorithms accepted for token signing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumString)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[cfg_attr(feature = "config", value(rename_all = "UPPER"))]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum SigningAlgorithm {
    Hs256,
    Hs384,
    #[default]
    Hs512,
    EdDsa,
    Rs256,
    Rs384,
    Rs512,
    Es256,
    Es384,
}

impl SigningAlgorithm {
    /// Returns the matching `jsonwebtoken` algorithm.
    #[must_use]
    pub const fn as_jwt(self) -> Algorithm {
        match self {
            Self::Hs256 => Algorithm::HS256,
            Self::Hs384 => Algorithm::HS384,
            Self::Hs512 => Algorithm::HS512,
            Self::EdDsa => Algorithm::EdDSA,
            Self::Rs256 => Algorithm::RS256,
            Self::Rs384 => Algorithm::RS384,
            Self::Rs512 => Algorithm::RS512,
            Self::Es256 => Algorithm::ES256,
            Self::Es384 => Algorithm::ES384,
        }
    }

    /// Returns `true` for shared-secret (HMAC) algorithms.
    #[must_use]
    pub const fn is_symmetric(self) -> bool {
        matches!(self, Self::Hs256 | Self::Hs384 | Self::Hs512)
    }
}

/// Signing key configuration.
///
/// HMAC algorithms read `secret`; asymmetric algorithms read the two PEM files.
#[derive(Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct SigningKeyConfig {
    /// Signature algorithm.
    #[cfg_attr(
        feature = "config",
        arg(long = "jwt-algorithm", env = "JWT_ALGORITHM", value_enum, default_value = "HS512")
    )]
    #[serde(default)]
    pub algorithm: SigningAlgorithm,

    /// Shared secret for HMAC algorithms.
    #[cfg_attr(feature = "config", arg(long = "jwt-secret", env = "JWT_SECRET"))]
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,

    /// File path to the PEM encoded private (signing) key.
    #[cfg_attr(
        feature = "config",
        arg(long = "jwt-private-key", env = "JWT_PRIVATE_PEM_FILEPATH")
    )]
    #[serde(default)]
    pub private_key: Option<PathBuf>,

    /// File path to the PEM encoded public (verification) key.
    #[cfg_attr(
        feature = "config",
        arg(long = "jwt-public-key", env = "JWT_PUBLIC_PEM_FILEPATH")
    )]
    #[serde(default)]
    pub public_key: Option<PathBuf>,
}

/// Key material used to sign and verify tokens.
///
/// Cloning is cheap; all clones share the same keys.
#[derive(Clone)]
pub struct SigningKey {
    inner: Arc<SigningKeyInner>,
}

struct SigningKeyInner {
    algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SigningKey {
    /// Creates an HMAC signing key from a shared secret.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the algorithm is not HMAC or the secret is empty.
    pub fn from_secret(algorithm: SigningAlgorithm, secret: &[u8]) -> Result<Self> {
        if !algorithm.is_symmetric() {
            return Err(Error::config(format!(
                "{algorithm} is not a shared-secret algorithm"
            )));
        }

        if secret.is_empty() {
            return Err(Error::config("signing secret cannot be empty"));
        }

        Ok(Self::from_parts(
            algorithm,
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
        ))
    }

    /// Creates an asymmetric signing key from PEM encoded key material.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the PEM data does not parse for the algorithm.
    pub fn from_pem(algorithm: SigningAlgorithm, private_pem: &[u8], public_pem: &[u8]) -> Result<Self> {
        let parsed = match algorithm {
            SigningAlgorithm::EdDsa => EncodingKey::from_ed_pem(private_pem)
                .and_then(|e| DecodingKey::from_ed_pem(public_pem).map(|d| (e, d))),
            SigningAlgorithm::Rs256 | SigningAlgorithm::Rs384 | SigningAlgorithm::Rs512 => {
                EncodingKey::from_rsa_pem(private_pem)
                    .and_then(|e| DecodingKey::from_rsa_pem(public_pem).map(|d| (e, d)))
            }
            SigningAlgorithm::Es256 | SigningAlgorithm::Es384 => EncodingKey::from_ec_pem(private_pem)
                .and_then(|e| DecodingKey::from_ec_pem(public_pem).map(|d| (e, d))),
            _ => {
                return Err(Error::config(format!(
                    "{algorithm} does not use PEM key material"
                )));
            }
        };

        let (encoding_key, decoding_key) = parsed.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                algorithm = %algorithm,
                error = %e,
                "failed to parse PEM key material",
            );
            Error::config("invalid PEM key material").with_source(e)
        })?;

        Ok(Self::from_parts(algorithm, encoding_key, decoding_key))
    }

    /// Loads the signing key described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for missing or unreadable key material.
    pub async fn from_config(config: &SigningKeyConfig) -> Result<Self> {
        tracing::debug!(
            target: TRACING_TARGET,
            algorithm = %config.algorithm,
            "loading signing key",
        );

        let key = if config.algorithm.is_symmetric() {
            let secret = config
                .secret
                .as_deref()
                .ok_or_else(|| Error::config("signing secret is required for HMAC algorithms"))?;
            Self::from_secret(config.algorithm, secret.as_bytes())?
        } else {
            let (Some(private_key), Some(public_key)) = (&config.private_key, &config.public_key)
            else {
                return Err(Error::config(
                    "private and public key paths are required for asymmetric algorithms",
                ));
            };

            let private_pem = Self::read_pem(private_key).await?;
            let public_pem = Self::read_pem(public_key).await?;
            Self::from_pem(config.algorithm, &private_pem, &public_pem)?
        };

        tracing::info!(
            target: TRACING_TARGET,
            algorithm = %config.algorithm,
            "signing key loaded",
        );

        Ok(key)
    }

    /// Returns the configured algorithm.
    #[inline]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.inner.algorithm
    }

    /// Returns the key used to sign tokens.
    #[inline]
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.inner.encoding_key
    }

    /// Returns the key used to verify tokens.
    #[inline]
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.inner.decoding_key
    }

    /// Validates that the keys are functional by signing and verifying a probe token.
    pub fn validate_keys(&self) -> Result<()> {
        #[derive(Debug, Clone, Serialize, Deserialize)]
        struct ProbeClaims {
            sub: String,
            exp: i64,
        }

        let claims = ProbeClaims {
            sub: "probe".to_owned(),
            exp: Timestamp::now().as_second() + 300,
        };

        let header = Header::new(self.algorithm().as_jwt());
        let token = encode(&header, &claims, self.encoding_key()).map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                error = %e,
                "key validation failed during encoding",
            );
            Error::config("key validation encoding failed").with_source(e)
        })?;

        let validation = Validation::new(self.algorithm().as_jwt());
        decode::<ProbeClaims>(&token, self.decoding_key(), &validation).map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                error = %e,
                "key validation failed during decoding",
            );
            Error::config("key validation decoding failed").with_source(e)
        })?;

        tracing::debug!(target: TRACING_TARGET, "key validation successful");
        Ok(())
    }

    fn from_parts(
        algorithm: SigningAlgorithm,
        encoding_key: EncodingKey,
        decoding_key: DecodingKey,
    ) -> Self {
        let inner = Arc::new(SigningKeyInner {
            algorithm,
            encoding_key,
            decoding_key,
        });
        Self { inner }
    }

    async fn read_pem(path: &Path) -> Result<Vec<u8>> {
        if !path.is_file() {
            return Err(Error::config(format!(
                "key path '{}' is not a file",
                path.display()
            )));
        }

        tokio::fs::read(path).await.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                path = %path.display(),
                error = %e,
                "failed to read key file",
            );
            Error::config("failed to read key file").with_source(e)
        })
    }
}

impl fmt::Debug for SigningKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyConfig")
            .field("algorithm", &self.algorithm)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("private_key", &self.private_key)
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.inner.algorithm)
            .finish_non_exhaustive()
    }
}
