//! Authorization error types and utilities.
//!
//! Every failure the engine can produce is classified by an [`ErrorKind`]. The
//! kind is what the transport layer maps to a response; the message and source
//! are for logs only and are never meant to reach a client.

use std::borrow::Cow;
use std::error::Error as StdError;

use strum::{AsRefStr, IntoStaticStr};

use crate::authorizer::AuthorizationStep;

/// Type alias for boxed errors that are Send + Sync.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type alias for authorization and issuance operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while validating or issuing tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The header is missing or does not carry a `Bearer ` credential.
    TokenExtraction,
    /// The token is not a structurally valid compact JWT.
    TokenMalformed,
    /// The token signature does not verify against the signing key.
    TokenSignatureInvalid,
    /// The token expiry lies in the past.
    TokenExpired,
    /// The token carries no usable `sub` claim.
    SubjectExtraction,
    /// The token subject does not match the resolved or primary subject.
    SubjectMismatch,
    /// The identity resolver does not know the subject.
    UnknownIdentity,
    /// The token type is not the one the endpoint requires.
    TokenTypeMismatch,
    /// A claim required for a policy decision is absent or unreadable.
    ClaimsMissing,
    /// The token role is not allowed to call the endpoint.
    RoleAuthorization,
    /// Unclassified failure during validation.
    AuthorizationFailed,
    /// Claims were written twice into the same request context.
    ClaimsAlreadySet,
    /// Claims were read before the request context was populated.
    ClaimsNotInitialized,
    /// A token could not be signed or serialized.
    TokenEncoding,
    /// Key material or settings are invalid.
    Configuration,
}

impl ErrorKind {
    /// Returns the error kind as a string for categorization.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Returns `true` for kinds that deny a request because of its credentials.
    ///
    /// The remaining kinds are faults of the host or its configuration.
    #[must_use]
    pub const fn is_denial(self) -> bool {
        matches!(
            self,
            Self::TokenExtraction
                | Self::TokenMalformed
                | Self::TokenSignatureInvalid
                | Self::TokenExpired
                | Self::SubjectExtraction
                | Self::SubjectMismatch
                | Self::UnknownIdentity
                | Self::TokenTypeMismatch
                | Self::ClaimsMissing
                | Self::RoleAuthorization
                | Self::AuthorizationFailed
        )
    }
}

/// Authorization error with structured information.
#[derive(Debug, thiserror::Error)]
#[error("{}{}", .kind.as_str(), .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    kind: ErrorKind,
    message: Option<Cow<'static, str>>,
    step: Option<AuthorizationStep>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            step: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    #[inline]
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches a source error to this error.
    #[inline]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Records the authorization step at which this error was raised.
    #[inline]
    pub fn with_step(mut self, step: AuthorizationStep) -> Self {
        self.step = Some(step);
        self
    }

    /// Returns the error kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the authorization step that failed, if raised by the authorizer.
    #[inline]
    #[must_use]
    pub const fn step(&self) -> Option<AuthorizationStep> {
        self.step
    }

    /// Creates a new token extraction error.
    pub fn token_extraction(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::TokenExtraction).with_message(message)
    }

    /// Creates a new subject extraction error.
    pub fn subject_extraction(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::SubjectExtraction).with_message(message)
    }

    /// Creates a new subject mismatch error.
    pub fn subject_mismatch(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::SubjectMismatch).with_message(message)
    }

    /// Creates a new unknown identity error.
    pub fn unknown_identity(subject: &str) -> Self {
        Self::new(ErrorKind::UnknownIdentity).with_message(format!("unknown subject '{subject}'"))
    }

    /// Creates a new token type mismatch error.
    pub fn token_type_mismatch(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::TokenTypeMismatch).with_message(message)
    }

    /// Creates a new missing claims error.
    pub fn claims_missing(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::ClaimsMissing).with_message(message)
    }

    /// Creates a new role authorization error.
    pub fn role_authorization(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::RoleAuthorization).with_message(message)
    }

    /// Creates a new generic authorization failure.
    pub fn authorization_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::AuthorizationFailed).with_message(message)
    }

    /// Creates a new token encoding error.
    pub fn token_encoding(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::TokenEncoding).with_message(message)
    }

    /// Creates a new configuration error.
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Configuration).with_message(message)
    }
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_creation() {
        let error = Error::config("missing signing secret");
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert_eq!(error.message(), Some("missing signing secret"));
        assert_eq!(error.step(), None);
    }

    #[test]
    fn error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::config("cannot read key file").with_source(source);

        assert!(StdError::source(&error).is_some());
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn error_display_includes_kind_and_message() {
        let error = Error::role_authorization("USER role cannot call ADMIN endpoint");
        let display = error.to_string();
        assert!(display.starts_with("role_authorization"));
        assert!(display.contains("ADMIN endpoint"));

        let bare = Error::new(ErrorKind::TokenExpired);
        assert_eq!(bare.to_string(), "token_expired");
    }

    #[test]
    fn error_kind_as_str() {
        assert_eq!(ErrorKind::TokenExtraction.as_str(), "token_extraction");
        assert_eq!(ErrorKind::TokenSignatureInvalid.as_str(), "token_signature_invalid");
        assert_eq!(ErrorKind::ClaimsAlreadySet.as_str(), "claims_already_set");
    }

    #[test]
    fn denial_classification() {
        assert!(ErrorKind::TokenExpired.is_denial());
        assert!(ErrorKind::RoleAuthorization.is_denial());
        assert!(!ErrorKind::ClaimsAlreadySet.is_denial());
        assert!(!ErrorKind::Configuration.is_denial());
    }
}
