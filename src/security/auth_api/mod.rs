//! Role model, caller identity and request authentication.

pub mod config;
pub mod error;
pub mod middleware;
pub mod tests;
pub mod types;

pub use config::AuthConfig;
pub use error::AuthError;
pub use middleware::{auth_middleware, require_admin, require_any_role, require_role};
pub use types::{AuthenticatedUser, Role};
