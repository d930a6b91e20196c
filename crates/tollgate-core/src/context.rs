//! Request-scoped claims holder.

use std::sync::{Arc, OnceLock};

use crate::token::Claims;
use crate::{Error, ErrorKind, Result, TRACING_TARGET_AUTHORIZER as TRACING_TARGET};

/// Claims extracted while validating one request.
///
/// Create a fresh context for every request; clones share the same slot so the
/// handler sees what the authorizer stored. The slot may be written once.
#[derive(Debug, Clone, Default)]
pub struct ClaimsContext {
    inner: Arc<OnceLock<Claims>>,
}

impl ClaimsContext {
    /// Creates an empty context.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the claims.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ClaimsAlreadySet`] if claims were already stored.
    pub fn set(&self, claims: Claims) -> Result<()> {
        self.inner.set(claims).map_err(|_| {
            tracing::error!(
                target: TRACING_TARGET,
                "claims context written twice within one request",
            );
            Error::new(ErrorKind::ClaimsAlreadySet)
                .with_message("claims may only be stored once per request")
        })
    }

    /// Returns the stored claims.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ClaimsNotInitialized`] before the first [`set`](Self::set).
    pub fn claims(&self) -> Result<&Claims> {
        self.inner.get().ok_or_else(|| {
            Error::new(ErrorKind::ClaimsNotInitialized)
                .with_message("claims were read before being stored")
        })
    }

    /// Returns `true` once claims have been stored.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.inner.get().is_some()
    }
}
