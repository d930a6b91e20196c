#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for token encoding and decoding.
pub const TRACING_TARGET_CODEC: &str = "tollgate_core::codec";

/// Tracing target for request authorization.
pub const TRACING_TARGET_AUTHORIZER: &str = "tollgate_core::authorizer";

/// Tracing target for token issuance.
pub const TRACING_TARGET_ISSUER: &str = "tollgate_core::issuer";

/// Tracing target for signing key loading.
pub const TRACING_TARGET_KEYS: &str = "tollgate_core::keys";

mod error;

pub mod authorizer;
pub mod codec;
pub mod config;
pub mod context;
pub mod identity;
pub mod issuer;
pub mod keys;
pub mod matrix;
pub mod policy;
pub mod role;
pub mod stats;
pub mod token;

pub use crate::authorizer::{AuthorizationStep, Authorized, Authorizer, Credentials};
pub use crate::codec::TokenCodec;
pub use crate::config::{IssuerSettings, TokenSettings};
pub use crate::context::ClaimsContext;
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::identity::{Identity, IdentityResolver, StaticIdentityResolver};
pub use crate::issuer::{ServiceTokens, TokenIssuer, UserTokens};
pub use crate::keys::{SigningAlgorithm, SigningKey, SigningKeyConfig};
pub use crate::matrix::TokenTypeMatrix;
pub use crate::policy::EndpointPolicy;
pub use crate::role::RoleAuthorizer;
pub use crate::token::{Claims, Token, TokenCategory, TokenMode, TokenType};
