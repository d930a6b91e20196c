//! Per-endpoint authorization policy records.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::role::ROLE_USER;
use crate::token::{TokenCategory, TokenMode};

/// What a protected endpoint accepts: caller category, validation mode and role.
///
/// Policies are declared once when routes are registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPolicy {
    pub category: TokenCategory,
    pub mode: TokenMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<Cow<'static, str>>,
}

impl EndpointPolicy {
    /// Single-token endpoint requiring `role`.
    pub fn single_token(category: TokenCategory, role: impl Into<Cow<'static, str>>) -> Self {
        Self {
            category,
            mode: TokenMode::SingleToken,
            role: Some(role.into()),
        }
    }

    /// Multi-token endpoint requiring `role`.
    pub fn multi_token(category: TokenCategory, role: impl Into<Cow<'static, str>>) -> Self {
        Self {
            category,
            mode: TokenMode::MultiToken,
            role: Some(role.into()),
        }
    }

    /// Refresh endpoint.
    pub fn refresh(category: TokenCategory) -> Self {
        Self {
            category,
            mode: TokenMode::RefreshToken,
            role: None,
        }
    }

    /// Secure-package endpoint.
    pub fn secure_pkg(category: TokenCategory) -> Self {
        Self {
            category,
            mode: TokenMode::SecurePkg,
            role: None,
        }
    }

    /// Returns the role a token must satisfy.
    ///
    /// Single- and multi-token endpoints use their declared role; the other
    /// modes fall back to `USER`.
    pub fn required_role(&self) -> &str {
        match (self.mode, self.role.as_deref()) {
            (TokenMode::SingleToken | TokenMode::MultiToken, Some(role)) => role,
            _ => ROLE_USER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::ROLE_ADMIN;

    #[test]
    fn declared_role_for_single_and_multi() {
        let policy = EndpointPolicy::single_token(TokenCategory::Consumers, ROLE_ADMIN);
        assert_eq!(policy.required_role(), "ADMIN");
        assert_eq!(policy.mode, TokenMode::SingleToken);

        let policy = EndpointPolicy::multi_token(TokenCategory::Consumers, ROLE_ADMIN);
        assert_eq!(policy.required_role(), "ADMIN");
    }

    #[test]
    fn other_modes_default_to_user() {
        assert_eq!(EndpointPolicy::refresh(TokenCategory::Consumers).required_role(), "USER");
        assert_eq!(
            EndpointPolicy::secure_pkg(TokenCategory::InternalServices).required_role(),
            "USER"
        );
    }

    #[test]
    fn deserialize_from_config() {
        let policy: EndpointPolicy = serde_json::from_str(
            r#"{"category":"CONSUMERS","mode":"MULTI_TOKEN","role":"ADMIN"}"#,
        )
        .unwrap();
        assert_eq!(policy, EndpointPolicy::multi_token(TokenCategory::Consumers, ROLE_ADMIN));
    }
}
