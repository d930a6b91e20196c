//! Request authorization.
//!
//! [`Authorizer::authorize`] runs the validation steps for one inbound request
//! in a fixed order and stops at the first failure. Nothing a later step would
//! do (such as writing the [`ClaimsContext`]) happens after an earlier step
//! failed.
//!
//! | Step | Check | Failure |
//! |---|---|---|
//! | 1 | `Bearer ` credential in the primary header | `TokenExtraction` |
//! | 2 | signature, structure and expiry | `TokenMalformed`, `TokenSignatureInvalid`, `TokenExpired` |
//! | 3 | `sub` claim present | `SubjectExtraction` |
//! | 4 | subject resolves to an identity with the same username | `UnknownIdentity`, `SubjectMismatch` |
//! | 5 | `type` claim matches the endpoint category and mode | `ClaimsMissing`, `TokenTypeMismatch` |
//! | 6 | single-token mode only: claims stored in the context | `ClaimsAlreadySet` |
//! | 7 | `rol` claim satisfies the endpoint role | `ClaimsMissing`, `RoleAuthorization` |
//! | 8 | other modes: transaction token for the same subject, type `TX_USERS`, stored in the context | as steps 1 to 3, `SubjectMismatch`, `TokenTypeMismatch` |

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use strum::{AsRefStr, Display, IntoStaticStr};

use crate::codec::TokenCodec;
use crate::context::ClaimsContext;
use crate::identity::{Identity, IdentityResolver};
use crate::matrix::TokenTypeMatrix;
use crate::policy::EndpointPolicy;
use crate::role::RoleAuthorizer;
use crate::token::{Claims, TokenMode, extract_bearer};
use crate::{Error, ErrorKind, Result, TRACING_TARGET_AUTHORIZER as TRACING_TARGET};

/// Steps of a request authorization, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AuthorizationStep {
    ExtractPrimaryToken,
    DecodeToken,
    ExtractSubject,
    ResolveIdentity,
    ValidateTokenType,
    StoreClaims,
    ValidateRole,
    ValidateSecondaryToken,
    Authorized,
}

/// Raw credential header values of one request.
#[derive(Debug, Clone, Copy, Default)]
pub struct Credentials<'a> {
    /// Value of the primary authorization header.
    pub authorization: Option<&'a str>,
    /// Value of the transaction token header.
    pub transaction: Option<&'a str>,
}

impl<'a> Credentials<'a> {
    /// Credentials with only a primary header.
    pub fn primary(authorization: &'a str) -> Self {
        Self {
            authorization: Some(authorization),
            transaction: None,
        }
    }

    /// Adds a transaction header.
    #[must_use]
    pub fn with_transaction(mut self, transaction: &'a str) -> Self {
        self.transaction = Some(transaction);
        self
    }
}

/// Outcome of a successful authorization.
#[derive(Debug, Clone)]
pub struct Authorized {
    /// Subject of the primary token.
    pub subject: String,
    /// Identity the subject resolved to.
    pub identity: Identity,
    /// Claims of the primary token.
    pub claims: Claims,
    /// Claims of the transaction token, when the endpoint requires one.
    pub transaction_claims: Option<Claims>,
}

/// Validates inbound credentials against an endpoint policy.
///
/// Cheap to clone and safe to share across concurrent requests; the only
/// per-request state is the [`ClaimsContext`] passed to each call.
#[derive(Clone)]
pub struct Authorizer {
    codec: TokenCodec,
    identities: Arc<dyn IdentityResolver>,
}

impl Authorizer {
    /// Creates an authorizer.
    pub fn new(codec: TokenCodec, identities: impl IdentityResolver + 'static) -> Self {
        Self::from_shared(codec, Arc::new(identities))
    }

    /// Creates an authorizer from an already shared resolver.
    pub fn from_shared(codec: TokenCodec, identities: Arc<dyn IdentityResolver>) -> Self {
        Self { codec, identities }
    }

    /// Returns the codec used to decode credentials.
    #[inline]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authorizes one request to `endpoint`.
    ///
    /// The returned error carries the [`AuthorizationStep`] that failed. Failures
    /// that are neither credential denials nor context misuse are reported as
    /// [`ErrorKind::AuthorizationFailed`].
    pub fn authorize(
        &self,
        endpoint: &str,
        credentials: &Credentials<'_>,
        policy: &EndpointPolicy,
        context: &ClaimsContext,
    ) -> Result<Authorized> {
        let started = Instant::now();
        let span = tracing::info_span!(
            target: TRACING_TARGET,
            "authorize",
            endpoint,
            category = %policy.category,
            mode = %policy.mode,
            subject = tracing::field::Empty,
        );
        let _entered = span.enter();

        let result = self.run(&span, credentials, policy, context);
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(authorized) => tracing::info!(
                target: TRACING_TARGET,
                endpoint,
                subject = %authorized.subject,
                step = %AuthorizationStep::Authorized,
                elapsed_ms,
                "request authorized",
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET,
                endpoint,
                step = error.step().map(<&'static str>::from).unwrap_or_default(),
                kind = error.kind().as_str(),
                elapsed_ms,
                error = %error,
                "request denied",
            ),
        }

        result
    }

    fn run(
        &self,
        span: &tracing::Span,
        credentials: &Credentials<'_>,
        policy: &EndpointPolicy,
        context: &ClaimsContext,
    ) -> Result<Authorized> {
        use AuthorizationStep as Step;

        let token = extract_bearer(credentials.authorization)
            .map_err(|e| classify(e, Step::ExtractPrimaryToken))?;

        let claims = self
            .codec
            .decode(token)
            .map_err(|e| classify(e, Step::DecodeToken))?;

        let subject = claims
            .subject()
            .map(str::to_owned)
            .ok_or_else(|| classify(Error::subject_extraction("token has no subject"), Step::ExtractSubject))?;
        span.record("subject", subject.as_str());

        let identity = self
            .resolve_identity(&subject)
            .map_err(|e| classify(e, Step::ResolveIdentity))?;

        TokenTypeMatrix::check(policy.category, policy.mode, &claims)
            .map_err(|e| classify(e, Step::ValidateTokenType))?;

        if policy.mode == TokenMode::SingleToken {
            context
                .set(claims.clone())
                .map_err(|e| classify(e, Step::StoreClaims))?;
        }

        RoleAuthorizer::authorize(claims.role(), policy.required_role())
            .map_err(|e| classify(e, Step::ValidateRole))?;

        let transaction_claims = if policy.mode.requires_transaction_token() {
            let claims = self
                .validate_transaction(&subject, credentials.transaction, context)
                .map_err(|e| classify(e, Step::ValidateSecondaryToken))?;
            Some(claims)
        } else {
            None
        };

        Ok(Authorized {
            subject,
            identity,
            claims,
            transaction_claims,
        })
    }

    fn resolve_identity(&self, subject: &str) -> Result<Identity> {
        let identity = self.identities.resolve(subject)?;
        if identity.username != subject {
            return Err(Error::subject_mismatch(format!(
                "subject '{subject}' resolved to identity '{}'",
                identity.username
            )));
        }
        Ok(identity)
    }

    fn validate_transaction(
        &self,
        subject: &str,
        header: Option<&str>,
        context: &ClaimsContext,
    ) -> Result<Claims> {
        let token = extract_bearer(header)?;
        let claims = self.codec.decode(token)?;

        let transaction_subject = claims
            .subject()
            .ok_or_else(|| Error::subject_extraction("transaction token has no subject"))?;
        if transaction_subject != subject {
            return Err(Error::subject_mismatch(format!(
                "transaction token issued to '{transaction_subject}', expected '{subject}'"
            )));
        }

        TokenTypeMatrix::check_transaction(&claims)?;
        context.set(claims.clone())?;
        Ok(claims)
    }
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

/// Tags an error with its step and wraps unclassified failures.
fn classify(error: Error, step: AuthorizationStep) -> Error {
    let error = match error.kind() {
        kind if kind.is_denial() => error,
        ErrorKind::ClaimsAlreadySet | ErrorKind::ClaimsNotInitialized => error,
        _ => Error::authorization_failed(format!("unexpected failure during {step}")).with_source(error),
    };
    error.with_step(step)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use jiff::{SignedDuration, Timestamp};

    use super::*;
    use crate::identity::StaticIdentityResolver;
    use crate::keys::{SigningAlgorithm, SigningKey};
    use crate::role::{ROLE_ADMIN, ROLE_SERVICE, ROLE_USER};
    use crate::token::{TokenCategory, TokenType, keys};

    const SUBJECT: &str = "jane.doe";

    fn codec() -> TokenCodec {
        TokenCodec::new(SigningKey::from_secret(SigningAlgorithm::Hs512, b"authorizer-secret").unwrap())
    }

    fn resolver() -> StaticIdentityResolver {
        StaticIdentityResolver::new()
            .with_identity(Identity::new(SUBJECT, [ROLE_USER]))
            .with_identity(Identity::new("john.roe", [ROLE_USER]))
            .with_identity(Identity::new("billing", [ROLE_SERVICE]))
    }

    fn authorizer() -> Authorizer {
        Authorizer::new(codec(), resolver())
    }

    fn mint(subject: &str, token_type: TokenType, role: &str) -> String {
        let claims = Claims::new()
            .with(keys::TYPE, token_type.to_string())
            .with(keys::ROLE, role);
        codec().encode(subject, "org-x", 60_000, &claims).unwrap().bearer()
    }

    fn consumer_single(role: &'static str) -> EndpointPolicy {
        EndpointPolicy::single_token(TokenCategory::Consumers, role)
    }

    fn consumer_multi() -> EndpointPolicy {
        EndpointPolicy::multi_token(TokenCategory::Consumers, ROLE_USER)
    }

    fn denied(result: Result<Authorized>) -> (ErrorKind, AuthorizationStep) {
        let err = result.unwrap_err();
        (err.kind(), err.step().unwrap())
    }

    #[test]
    fn single_token_stores_primary_claims() {
        let header = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        let context = ClaimsContext::new();

        let authorized = authorizer()
            .authorize("/profile", &Credentials::primary(&header), &consumer_single(ROLE_USER), &context)
            .unwrap();

        assert_eq!(authorized.subject, SUBJECT);
        assert_eq!(authorized.identity.username, SUBJECT);
        assert!(authorized.transaction_claims.is_none());
        assert_eq!(context.claims().unwrap(), &authorized.claims);
    }

    #[test]
    fn missing_or_malformed_primary_header() {
        for header in [None, Some("Token abc"), Some("Bearer ")] {
            let context = ClaimsContext::new();
            let credentials = Credentials {
                authorization: header,
                transaction: None,
            };
            let result = authorizer().authorize("/profile", &credentials, &consumer_single(ROLE_USER), &context);
            assert_eq!(denied(result), (ErrorKind::TokenExtraction, AuthorizationStep::ExtractPrimaryToken));
            assert!(!context.is_initialized());
        }
    }

    #[test]
    fn expired_primary_token() {
        let claims = Claims::new().with(keys::TYPE, "AUTH").with(keys::ROLE, ROLE_USER);
        let issued = Timestamp::now() - SignedDuration::from_secs(600);
        let token = codec().encode_at(SUBJECT, "org-x", 1_000, &claims, issued).unwrap();

        let result = authorizer().authorize(
            "/profile",
            &Credentials::primary(&token.bearer()),
            &consumer_single(ROLE_USER),
            &ClaimsContext::new(),
        );
        assert_eq!(denied(result), (ErrorKind::TokenExpired, AuthorizationStep::DecodeToken));
    }

    #[test]
    fn token_without_subject() {
        let claims = Claims::new()
            .with(keys::TYPE, "AUTH")
            .with(keys::ROLE, ROLE_USER)
            .with(keys::EXPIRES_AT, Timestamp::now().as_second() + 60);
        let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS512);
        let token = jsonwebtoken::encode(&header, &claims, codec().signing_key().encoding_key()).unwrap();

        let result = authorizer().authorize(
            "/profile",
            &Credentials::primary(&format!("Bearer {token}")),
            &consumer_single(ROLE_USER),
            &ClaimsContext::new(),
        );
        assert_eq!(denied(result), (ErrorKind::SubjectExtraction, AuthorizationStep::ExtractSubject));
    }

    #[test]
    fn unknown_subject() {
        let header = mint("mallory", TokenType::Auth, ROLE_USER);
        let result = authorizer().authorize(
            "/profile",
            &Credentials::primary(&header),
            &consumer_single(ROLE_USER),
            &ClaimsContext::new(),
        );
        assert_eq!(denied(result), (ErrorKind::UnknownIdentity, AuthorizationStep::ResolveIdentity));
    }

    #[test]
    fn resolved_username_must_match_subject() {
        struct Aliasing;
        impl IdentityResolver for Aliasing {
            fn resolve(&self, _subject: &str) -> Result<Identity> {
                Ok(Identity::new("someone.else", [ROLE_USER]))
            }
        }

        let header = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        let result = Authorizer::new(codec(), Aliasing).authorize(
            "/profile",
            &Credentials::primary(&header),
            &consumer_single(ROLE_USER),
            &ClaimsContext::new(),
        );
        assert_eq!(denied(result), (ErrorKind::SubjectMismatch, AuthorizationStep::ResolveIdentity));
    }

    #[test]
    fn resolver_faults_are_wrapped() {
        struct Broken;
        impl IdentityResolver for Broken {
            fn resolve(&self, _subject: &str) -> Result<Identity> {
                Err(Error::config("directory unavailable"))
            }
        }

        let header = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        let result = Authorizer::new(codec(), Broken).authorize(
            "/profile",
            &Credentials::primary(&header),
            &consumer_single(ROLE_USER),
            &ClaimsContext::new(),
        );
        assert_eq!(denied(result), (ErrorKind::AuthorizationFailed, AuthorizationStep::ResolveIdentity));
    }

    #[test]
    fn type_check_precedes_role_check() {
        let header = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        let context = ClaimsContext::new();
        let policy = EndpointPolicy::secure_pkg(TokenCategory::InternalServices);

        let result = authorizer().authorize("/internal", &Credentials::primary(&header), &policy, &context);
        assert_eq!(denied(result), (ErrorKind::TokenTypeMismatch, AuthorizationStep::ValidateTokenType));
        assert!(!context.is_initialized());

        // A USER refresh token on an ADMIN endpoint fails on type before role.
        let admin_policy = EndpointPolicy::single_token(TokenCategory::Consumers, ROLE_ADMIN);
        let refresh_header = mint(SUBJECT, TokenType::AuthRefresh, ROLE_USER);
        let result = authorizer().authorize(
            "/admin",
            &Credentials::primary(&refresh_header),
            &admin_policy,
            &ClaimsContext::new(),
        );
        assert_eq!(denied(result), (ErrorKind::TokenTypeMismatch, AuthorizationStep::ValidateTokenType));
    }

    #[test]
    fn user_role_rejected_on_admin_endpoint() {
        let header = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        let result = authorizer().authorize(
            "/admin",
            &Credentials::primary(&header),
            &consumer_single(ROLE_ADMIN),
            &ClaimsContext::new(),
        );
        assert_eq!(denied(result), (ErrorKind::RoleAuthorization, AuthorizationStep::ValidateRole));
    }

    #[test]
    fn admin_role_accepted_on_admin_endpoint() {
        let header = mint(SUBJECT, TokenType::Auth, ROLE_ADMIN);
        let result = authorizer().authorize(
            "/admin",
            &Credentials::primary(&header),
            &consumer_single(ROLE_ADMIN),
            &ClaimsContext::new(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn missing_role_claim() {
        let claims = Claims::new().with(keys::TYPE, "AUTH");
        let token = codec().encode(SUBJECT, "org-x", 60_000, &claims).unwrap();
        let result = authorizer().authorize(
            "/profile",
            &Credentials::primary(&token.bearer()),
            &consumer_single(ROLE_USER),
            &ClaimsContext::new(),
        );
        assert_eq!(denied(result), (ErrorKind::ClaimsMissing, AuthorizationStep::ValidateRole));
    }

    #[test]
    fn reused_context_fails_loudly() {
        let header = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        let context = ClaimsContext::new();
        let authorizer = authorizer();
        let credentials = Credentials::primary(&header);

        authorizer
            .authorize("/profile", &credentials, &consumer_single(ROLE_USER), &context)
            .unwrap();
        let result = authorizer.authorize("/profile", &credentials, &consumer_single(ROLE_USER), &context);
        assert_eq!(denied(result), (ErrorKind::ClaimsAlreadySet, AuthorizationStep::StoreClaims));
    }

    #[test]
    fn multi_token_stores_transaction_claims() {
        let primary = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        let transaction = mint(SUBJECT, TokenType::TxUsers, ROLE_USER);
        let context = ClaimsContext::new();

        let authorized = authorizer()
            .authorize(
                "/orders",
                &Credentials::primary(&primary).with_transaction(&transaction),
                &consumer_multi(),
                &context,
            )
            .unwrap();

        let stored = context.claims().unwrap();
        assert_eq!(stored.token_type(), Some(TokenType::TxUsers));
        assert_eq!(authorized.transaction_claims.as_ref(), Some(stored));
        assert_eq!(authorized.claims.token_type(), Some(TokenType::Auth));
    }

    #[test]
    fn multi_token_without_transaction_header() {
        let primary = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        for transaction in [None, Some("not-bearer")] {
            let context = ClaimsContext::new();
            let credentials = Credentials {
                authorization: Some(&primary),
                transaction,
            };
            let result = authorizer().authorize("/orders", &credentials, &consumer_multi(), &context);
            assert_eq!(
                denied(result),
                (ErrorKind::TokenExtraction, AuthorizationStep::ValidateSecondaryToken)
            );
            assert!(!context.is_initialized());
        }
    }

    #[test]
    fn transaction_token_for_another_subject() {
        let primary = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        let transaction = mint("john.roe", TokenType::TxUsers, ROLE_USER);

        let result = authorizer().authorize(
            "/orders",
            &Credentials::primary(&primary).with_transaction(&transaction),
            &consumer_multi(),
            &ClaimsContext::new(),
        );
        assert_eq!(
            denied(result),
            (ErrorKind::SubjectMismatch, AuthorizationStep::ValidateSecondaryToken)
        );
    }

    #[test]
    fn transaction_token_of_wrong_type() {
        let primary = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        let context = ClaimsContext::new();

        let result = authorizer().authorize(
            "/orders",
            &Credentials::primary(&primary).with_transaction(&primary),
            &consumer_multi(),
            &context,
        );
        assert_eq!(
            denied(result),
            (ErrorKind::TokenTypeMismatch, AuthorizationStep::ValidateSecondaryToken)
        );
        assert!(!context.is_initialized());
    }

    #[test]
    fn expired_transaction_token() {
        let primary = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        let claims = Claims::new()
            .with(keys::TYPE, TokenType::TxUsers.to_string())
            .with(keys::ROLE, ROLE_USER);
        let issued = Timestamp::now() - SignedDuration::from_secs(600);
        let transaction = codec()
            .encode_at(SUBJECT, "org-x", 1_000, &claims, issued)
            .unwrap()
            .bearer();
        let context = ClaimsContext::new();

        let result = authorizer().authorize(
            "/orders",
            &Credentials::primary(&primary).with_transaction(&transaction),
            &consumer_multi(),
            &context,
        );
        assert_eq!(
            denied(result),
            (ErrorKind::TokenExpired, AuthorizationStep::ValidateSecondaryToken)
        );
        assert!(!context.is_initialized());
    }

    #[test]
    fn transaction_token_signed_with_other_key() {
        let primary = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        let other = TokenCodec::new(SigningKey::from_secret(SigningAlgorithm::Hs512, b"other-secret").unwrap());
        let claims = Claims::new()
            .with(keys::TYPE, TokenType::TxUsers.to_string())
            .with(keys::ROLE, ROLE_USER);
        let transaction = other.encode(SUBJECT, "org-x", 60_000, &claims).unwrap().bearer();
        let context = ClaimsContext::new();

        let result = authorizer().authorize(
            "/orders",
            &Credentials::primary(&primary).with_transaction(&transaction),
            &consumer_multi(),
            &context,
        );
        assert_eq!(
            denied(result),
            (ErrorKind::TokenSignatureInvalid, AuthorizationStep::ValidateSecondaryToken)
        );
        assert!(!context.is_initialized());
    }

    #[test]
    fn malformed_transaction_token() {
        let primary = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        let context = ClaimsContext::new();

        let result = authorizer().authorize(
            "/orders",
            &Credentials::primary(&primary).with_transaction("Bearer not-a-token"),
            &consumer_multi(),
            &context,
        );
        assert_eq!(
            denied(result),
            (ErrorKind::TokenMalformed, AuthorizationStep::ValidateSecondaryToken)
        );
        assert!(!context.is_initialized());
    }

    #[test]
    fn refresh_mode_requires_refresh_token() {
        let refresh = mint(SUBJECT, TokenType::AuthRefresh, ROLE_USER);
        let transaction = mint(SUBJECT, TokenType::TxUsers, ROLE_USER);
        let policy = EndpointPolicy::refresh(TokenCategory::Consumers);

        let authorized = authorizer()
            .authorize(
                "/auth/refresh",
                &Credentials::primary(&refresh).with_transaction(&transaction),
                &policy,
                &ClaimsContext::new(),
            )
            .unwrap();
        assert_eq!(authorized.claims.token_type(), Some(TokenType::AuthRefresh));
    }

    #[test]
    fn secure_package_for_internal_service() {
        let primary = mint("billing", TokenType::TxService, ROLE_SERVICE);
        let transaction = mint("billing", TokenType::TxUsers, ROLE_SERVICE);
        let policy = EndpointPolicy::secure_pkg(TokenCategory::InternalServices);

        let authorized = authorizer()
            .authorize(
                "/internal/ledger",
                &Credentials::primary(&primary).with_transaction(&transaction),
                &policy,
                &ClaimsContext::new(),
            )
            .unwrap();
        assert_eq!(authorized.subject, "billing");
    }

    #[test]
    fn identity_lookup_runs_once_per_request() {
        struct Counting(AtomicUsize);
        impl IdentityResolver for Counting {
            fn resolve(&self, subject: &str) -> Result<Identity> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(Identity::new(subject, [ROLE_USER]))
            }
        }

        let resolver = Arc::new(Counting(AtomicUsize::new(0)));
        let authorizer = Authorizer::from_shared(codec(), resolver.clone());
        let primary = mint(SUBJECT, TokenType::Auth, ROLE_USER);
        let transaction = mint(SUBJECT, TokenType::TxUsers, ROLE_USER);

        authorizer
            .authorize(
                "/orders",
                &Credentials::primary(&primary).with_transaction(&transaction),
                &consumer_multi(),
                &ClaimsContext::new(),
            )
            .unwrap();
        assert_eq!(resolver.0.load(Ordering::SeqCst), 1);
    }
}
