//! Identity lookup by token subject.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A resolved caller: username plus granted authorities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    #[serde(default)]
    pub authorities: Vec<String>,
}

impl Identity {
    /// Creates an identity.
    pub fn new(username: impl Into<String>, authorities: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            username: username.into(),
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }
}

/// Resolves a token subject into an [`Identity`].
///
/// Implementations are shared across concurrent requests.
pub trait IdentityResolver: Send + Sync {
    /// Looks up the subject.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownIdentity`](crate::ErrorKind::UnknownIdentity) for an unknown
    /// subject. Other errors are treated as unclassified authorization failures.
    fn resolve(&self, subject: &str) -> Result<Identity>;
}

/// In-memory resolver backed by a fixed set of identities.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    identities: HashMap<String, Identity>,
}

impl StaticIdentityResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an identity keyed by its username.
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identities.insert(identity.username.clone(), identity);
        self
    }
}

impl FromIterator<Identity> for StaticIdentityResolver {
    fn from_iter<I: IntoIterator<Item = Identity>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with_identity)
    }
}

impl IdentityResolver for StaticIdentityResolver {
    fn resolve(&self, subject: &str) -> Result<Identity> {
        self.identities
            .get(subject)
            .cloned()
            .ok_or_else(|| Error::unknown_identity(subject))
    }
}
