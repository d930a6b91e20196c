//! Extractors for the outcome of the authorization guard.
//!
//! Both extractors require the route to be protected with
//! [`RouterGuardExt::with_policy`](crate::middleware::RouterGuardExt::with_policy);
//! on an unguarded route they fail with an internal server error.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tollgate_core::{Authorized, Claims, ClaimsContext};

use crate::handler::{Error, ErrorKind};

/// The authorized caller: subject, identity and primary token claims.
#[derive(Debug, Clone)]
pub struct AuthIdentity(pub Authorized);

impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Authorized>()
            .cloned()
            .map(Self)
            .ok_or_else(|| ErrorKind::InternalServerError.with_context("route is not guarded"))
    }
}

/// The claims stored in the request's [`ClaimsContext`].
///
/// For single-token endpoints these are the primary token's claims; for every
/// other mode they are the transaction token's claims.
#[derive(Debug, Clone)]
pub struct RequestClaims(pub Claims);

impl<S> FromRequestParts<S> for RequestClaims
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<ClaimsContext>()
            .ok_or_else(|| ErrorKind::InternalServerError.with_context("route is not guarded"))?;

        let claims = context.claims()?.clone();
        Ok(Self(claims))
    }
}
