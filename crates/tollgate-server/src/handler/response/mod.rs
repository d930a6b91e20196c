//! Response types for HTTP handlers.

mod errors;
mod tokens;

pub use errors::*;
pub use tokens::*;
