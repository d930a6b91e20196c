use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;
use tollgate_core::{Authorizer, ClaimsContext, Credentials, EndpointPolicy};

use crate::TRACING_TARGET_GUARD;
use crate::handler::Result;
use crate::header::{AUTHORIZATION, TX_TOKEN};

/// State of a guard: the shared authorizer plus the endpoint's policy.
#[derive(Debug, Clone)]
pub struct PolicyGuard {
    authorizer: Authorizer,
    policy: Arc<EndpointPolicy>,
}

impl PolicyGuard {
    /// Creates a guard for one endpoint policy.
    pub fn new(authorizer: Authorizer, policy: EndpointPolicy) -> Self {
        Self {
            authorizer,
            policy: Arc::new(policy),
        }
    }

    #[inline]
    pub fn policy(&self) -> &EndpointPolicy {
        &self.policy
    }
}

/// Authorizes the request against the guard's policy.
///
/// A fresh [`ClaimsContext`] is created for every request. On success the
/// context and the [`Authorized`](tollgate_core::Authorized) outcome are
/// inserted into the request extensions for the handler.
pub async fn require_policy(
    State(guard): State<PolicyGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let context = ClaimsContext::new();
    let endpoint = request.uri().path().to_owned();

    let headers = request.headers();
    let credentials = Credentials {
        authorization: header_str(headers, &AUTHORIZATION),
        transaction: header_str(headers, &TX_TOKEN),
    };

    let authorized = guard
        .authorizer
        .authorize(&endpoint, &credentials, &guard.policy, &context)
        .inspect_err(|error| {
            tracing::debug!(
                target: TRACING_TARGET_GUARD,
                endpoint = %endpoint,
                kind = error.kind().as_str(),
                "rejecting request",
            );
        })?;

    request.extensions_mut().insert(context);
    request.extensions_mut().insert(authorized);
    Ok(next.run(request).await)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Extension trait for `axum::`[`Router`] for layering the authorization guard.
pub trait RouterGuardExt<S> {
    /// Protects every route of the router with `policy`.
    ///
    /// The guard runs as a route layer, so unmatched paths are not authorized.
    fn with_policy(self, authorizer: Authorizer, policy: EndpointPolicy) -> Self;
}

impl<S> RouterGuardExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_policy(self, authorizer: Authorizer, policy: EndpointPolicy) -> Self {
        let guard = PolicyGuard::new(authorizer, policy);
        self.route_layer(from_fn_with_state(guard, require_policy))
    }
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use axum::http::{HeaderValue, StatusCode};
    use axum::routing::get;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use tollgate_core::role::{ROLE_ADMIN, ROLE_USER};
    use tollgate_core::token::keys;
    use tollgate_core::{
        Claims, Identity, SigningAlgorithm, SigningKey, StaticIdentityResolver, TokenCategory,
        TokenCodec,
    };

    use super::*;
    use crate::extract::{AuthIdentity, RequestClaims};

    const SUBJECT: &str = "jane.doe";

    fn codec() -> TokenCodec {
        TokenCodec::new(SigningKey::from_secret(SigningAlgorithm::Hs256, b"guard-secret").unwrap())
    }

    fn authorizer() -> Authorizer {
        let identities = StaticIdentityResolver::new().with_identity(Identity::new(SUBJECT, [ROLE_USER]));
        Authorizer::new(codec(), identities)
    }

    fn bearer(token_type: &str, role: &str) -> HeaderValue {
        let claims = Claims::new().with(keys::TYPE, token_type).with(keys::ROLE, role);
        let token = codec().encode(SUBJECT, "org-x", 60_000, &claims).unwrap();
        HeaderValue::from_str(&token.bearer()).unwrap()
    }

    async fn whoami(AuthIdentity(authorized): AuthIdentity, RequestClaims(claims): RequestClaims) -> Json<Value> {
        Json(json!({
            "subject": authorized.subject,
            "type": claims.raw_token_type(),
        }))
    }

    fn server(policy: EndpointPolicy) -> anyhow::Result<TestServer> {
        let router = Router::new()
            .route("/whoami", get(whoami))
            .with_policy(authorizer(), policy);
        Ok(TestServer::new(router)?)
    }

    #[tokio::test]
    async fn single_token_request_is_authorized() -> anyhow::Result<()> {
        let server = server(EndpointPolicy::single_token(TokenCategory::Consumers, ROLE_USER))?;

        let response = server
            .get("/whoami")
            .add_header(AUTHORIZATION, bearer("AUTH", ROLE_USER))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["subject"], SUBJECT);
        assert_eq!(body["type"], "AUTH");
        Ok(())
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() -> anyhow::Result<()> {
        let server = server(EndpointPolicy::single_token(TokenCategory::Consumers, ROLE_USER))?;

        let response = server.get("/whoami").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["name"], "missing_auth_token");
        Ok(())
    }

    #[tokio::test]
    async fn garbage_token_is_malformed() -> anyhow::Result<()> {
        let server = server(EndpointPolicy::single_token(TokenCategory::Consumers, ROLE_USER))?;

        let response = server
            .get("/whoami")
            .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer not-a-token"))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["name"], "malformed_auth_token");
        Ok(())
    }

    #[tokio::test]
    async fn user_on_admin_endpoint_is_forbidden() -> anyhow::Result<()> {
        let server = server(EndpointPolicy::single_token(TokenCategory::Consumers, ROLE_ADMIN))?;

        let response = server
            .get("/whoami")
            .add_header(AUTHORIZATION, bearer("AUTH", ROLE_USER))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["name"], "forbidden");
        Ok(())
    }

    #[tokio::test]
    async fn wrong_token_type_is_unauthorized() -> anyhow::Result<()> {
        let server = server(EndpointPolicy::secure_pkg(TokenCategory::InternalServices))?;

        let response = server
            .get("/whoami")
            .add_header(AUTHORIZATION, bearer("AUTH", ROLE_USER))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["name"], "unauthorized");
        Ok(())
    }

    #[tokio::test]
    async fn multi_token_requires_transaction_header() -> anyhow::Result<()> {
        let server = server(EndpointPolicy::multi_token(TokenCategory::Consumers, ROLE_USER))?;

        let response = server
            .get("/whoami")
            .add_header(AUTHORIZATION, bearer("AUTH", ROLE_USER))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["name"], "missing_auth_token");

        let response = server
            .get("/whoami")
            .add_header(AUTHORIZATION, bearer("AUTH", ROLE_USER))
            .add_header(TX_TOKEN, bearer("TX_USERS", ROLE_USER))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["type"], "TX_USERS");
        Ok(())
    }

    #[tokio::test]
    async fn error_body_hides_internal_detail() -> anyhow::Result<()> {
        let server = server(EndpointPolicy::single_token(TokenCategory::Consumers, ROLE_ADMIN))?;

        let response = server
            .get("/whoami")
            .add_header(AUTHORIZATION, bearer("AUTH", ROLE_USER))
            .await;
        let text = response.text();
        assert!(!text.contains(SUBJECT));
        assert!(!text.contains("role_authorization"));
        Ok(())
    }
}
