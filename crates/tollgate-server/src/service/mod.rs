//! Application state and dependency injection.

use tollgate_core::{Authorizer, IdentityResolver, IssuerSettings, SigningKey, TokenCodec, TokenIssuer};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    pub authorizer: Authorizer,
    pub issuer: TokenIssuer,
}

impl ServiceState {
    /// Creates the state from a loaded signing key.
    pub fn new(
        signing_key: SigningKey,
        settings: IssuerSettings,
        identities: impl IdentityResolver + 'static,
    ) -> Self {
        let issuer = TokenIssuer::new(TokenCodec::new(signing_key), settings);
        Self::from_issuer(issuer, identities)
    }

    /// Creates the state around an existing issuer; the authorizer verifies
    /// with the issuer's codec.
    pub fn from_issuer(issuer: TokenIssuer, identities: impl IdentityResolver + 'static) -> Self {
        Self {
            authorizer: Authorizer::new(issuer.codec().clone(), identities),
            issuer,
        }
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(authorizer: Authorizer);
impl_di!(issuer: TokenIssuer);
