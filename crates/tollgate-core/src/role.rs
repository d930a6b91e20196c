//! Role check against an endpoint's required role.

use crate::{Error, Result};

/// Baseline consumer role.
pub const ROLE_USER: &str = "USER";
/// Administrative role.
pub const ROLE_ADMIN: &str = "ADMIN";
/// Role carried by service tokens.
pub const ROLE_SERVICE: &str = "Service";
/// Role carried by admin tokens.
pub const ROLE_ADMIN_TOKEN: &str = "Admin";
/// Role carried by consumer transaction tokens.
pub const ROLE_TRANSACTION: &str = "User";

/// Compares a token role with the role an endpoint requires.
///
/// Only a `USER` token presented to an `ADMIN` endpoint is rejected. Every other
/// combination, including unknown roles, is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAuthorizer;

impl RoleAuthorizer {
    /// Checks `token_role` against `required_role`.
    ///
    /// The token role is compared case-insensitively after trimming; the
    /// required role must be exactly `ADMIN` to trigger a rejection.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ClaimsMissing`](crate::ErrorKind::ClaimsMissing) when the token has
    /// no role and [`ErrorKind::RoleAuthorization`](crate::ErrorKind::RoleAuthorization) on
    /// rejection.
    pub fn authorize(token_role: Option<&str>, required_role: &str) -> Result<()> {
        let role = token_role.ok_or_else(|| Error::claims_missing("token carries no role claim"))?;

        if role.trim().eq_ignore_ascii_case(ROLE_USER) && required_role == ROLE_ADMIN {
            return Err(Error::role_authorization(format!(
                "role '{role}' cannot access an endpoint requiring '{required_role}'"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn user_is_rejected_from_admin_endpoints() {
        let err = RoleAuthorizer::authorize(Some("USER"), ROLE_ADMIN).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoleAuthorization);

        let err = RoleAuthorizer::authorize(Some(" user "), ROLE_ADMIN).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoleAuthorization);
    }

    #[test]
    fn admin_is_accepted_everywhere() {
        assert!(RoleAuthorizer::authorize(Some("ADMIN"), ROLE_ADMIN).is_ok());
        assert!(RoleAuthorizer::authorize(Some("ADMIN"), ROLE_USER).is_ok());
    }

    #[test]
    fn user_is_accepted_on_user_endpoints() {
        assert!(RoleAuthorizer::authorize(Some("USER"), ROLE_USER).is_ok());
    }

    #[test]
    fn other_roles_are_unchecked() {
        assert!(RoleAuthorizer::authorize(Some(ROLE_SERVICE), ROLE_ADMIN).is_ok());
        assert!(RoleAuthorizer::authorize(Some(ROLE_ADMIN_TOKEN), ROLE_ADMIN).is_ok());
        assert!(RoleAuthorizer::authorize(Some("USER"), "admin").is_ok());
    }

    #[test]
    fn missing_role_is_claims_missing() {
        let err = RoleAuthorizer::authorize(None, ROLE_USER).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClaimsMissing);
    }
}
