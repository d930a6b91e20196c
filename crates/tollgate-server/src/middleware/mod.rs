//! Middleware for `axum::Router` and HTTP request processing.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use axum::Router;
//! use axum::routing::get;
//! use tollgate_core::{EndpointPolicy, TokenCategory};
//! use tollgate_server::middleware::RouterGuardExt;
//!
//! let app: Router = Router::new()
//!     .route("/orders", get(list_orders))
//!     .with_policy(authorizer, EndpointPolicy::multi_token(TokenCategory::Consumers, "USER"));
//! ```

mod guard;

pub use guard::{PolicyGuard, RouterGuardExt, require_policy};
