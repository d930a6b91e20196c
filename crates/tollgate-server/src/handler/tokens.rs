//! Token refresh and transaction token handlers.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tollgate_core::issuer::UserTokensResponse;
use tollgate_core::role::ROLE_USER;
use tollgate_core::{EndpointPolicy, TokenCategory, TokenIssuer, TokenType};

use crate::TRACING_TARGET_HANDLER;
use crate::extract::AuthIdentity;
use crate::handler::Result;
use crate::handler::response::{TransactionTokenBody, TransactionTokenHeader, UserTokenHeaders};
use crate::middleware::RouterGuardExt;
use crate::service::ServiceState;

/// Issues a new token pair from the presented refresh token.
#[tracing::instrument(skip_all, fields(subject = %auth.0.subject))]
async fn refresh(
    State(issuer): State<TokenIssuer>,
    auth: AuthIdentity,
) -> Result<(UserTokenHeaders, Json<UserTokensResponse>)> {
    let AuthIdentity(authorized) = auth;
    tracing::debug!(target: TRACING_TARGET_HANDLER, "refreshing user tokens");

    let tokens = issuer.refresh_user_tokens(&authorized.subject, &authorized.claims)?;
    let body = UserTokensResponse::from(&tokens);
    Ok((UserTokenHeaders(tokens), Json(body)))
}

/// Issues a transaction token for the caller.
#[tracing::instrument(skip_all, fields(subject = %auth.0.subject))]
async fn transaction_token(
    State(issuer): State<TokenIssuer>,
    auth: AuthIdentity,
) -> Result<(TransactionTokenHeader, Json<TransactionTokenBody>)> {
    let AuthIdentity(authorized) = auth;
    tracing::debug!(target: TRACING_TARGET_HANDLER, "issuing transaction token");

    let token = issuer.issue_transaction_token(&authorized.subject, TokenType::TxUsers)?;
    let body = TransactionTokenBody::from(&token);
    Ok((TransactionTokenHeader(token), Json(body)))
}

/// Returns a [`Router`] with the token routes, each behind its own policy.
pub fn routes(state: ServiceState) -> Router<ServiceState> {
    let refresh_router = Router::new()
        .route("/auth/refresh", post(refresh))
        .with_policy(
            state.authorizer.clone(),
            EndpointPolicy::refresh(TokenCategory::Consumers),
        );

    let transaction_router = Router::new()
        .route("/auth/tx-token", post(transaction_token))
        .with_policy(
            state.authorizer,
            EndpointPolicy::single_token(TokenCategory::Consumers, ROLE_USER),
        );

    Router::new().merge(refresh_router).merge(transaction_router)
}
