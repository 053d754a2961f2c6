use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use crate::core::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Instructor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Instructor => "INSTRUCTOR",
            Self::Admin => "ADMIN",
        }
    }

    /// Name stored in the `roles` table.
    pub fn stored_name(&self) -> &'static str {
        match self {
            Self::Student => "ROLE_STUDENT",
            Self::Instructor => "ROLE_INSTRUCTOR",
            Self::Admin => "ROLE_ADMIN",
        }
    }

    /// Accepts `student`, `STUDENT` and `ROLE_STUDENT` alike.
    pub fn parse(input: &str) -> Option<Self> {
        let upper = input.trim().to_uppercase();
        let bare = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        Self::ALL.into_iter().find(|role| role.as_str() == bare)
    }

    /// First requested name wins; an empty request means STUDENT.
    pub fn from_requested(names: &[String]) -> Result<Self, ApiError> {
        match names.first() {
            None => Ok(Self::default()),
            Some(name) => name.parse(),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ApiError::bad_request(format!("Unknown role: {s}")))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller identity derived from a validated access token. Inserted into the
/// request extensions by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub token_id: String,
    pub expires_at: i64,
}

impl AuthenticatedUser {
    pub fn new(user_id: i64, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
            token_id: String::new(),
            expires_at: 0,
        }
    }

    pub fn with_token(mut self, token_id: impl Into<String>, expires_at: i64) -> Self {
        self.token_id = token_id.into();
        self.expires_at = expires_at;
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Self-service or administrator access to a user record.
    pub fn can_manage_user(&self, user_id: i64) -> bool {
        self.is_admin() || self.user_id == user_id
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}
