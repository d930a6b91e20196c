#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for the authorization guard.
pub const TRACING_TARGET_GUARD: &str = "tollgate_server::middleware::guard";

/// Tracing target for token handlers.
pub const TRACING_TARGET_HANDLER: &str = "tollgate_server::handler";

pub mod extract;
pub mod handler;
pub mod header;
pub mod middleware;
pub mod service;
