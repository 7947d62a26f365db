//! Authentication module

mod middleware;
mod token;

pub use middleware::{admin_auth_middleware, optional_admin_middleware};
pub use token::{SessionTokens, TokenSigner};
