pub mod audit;
pub mod auth_api;
pub mod cors;
pub mod jwt;
pub mod password;
pub mod validation;

pub use audit::{ActivityAction, ActivityLogger};
pub use auth_api::{AuthConfig, AuthError, AuthenticatedUser, Role};
pub use jwt::JwtManager;
pub use password::PasswordHasher;
