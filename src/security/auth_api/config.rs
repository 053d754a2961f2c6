use axum::http::Method;

use crate::security::jwt::extract_bearer_token;

/// Which paths skip token validation.
///
/// Patterns are matched segment by segment; a `:param` segment matches any
/// numeric id.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub bearer_prefix: String,
    pub allow_anonymous_paths: Vec<String>,
    pub public_read_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bearer_prefix: "Bearer ".to_string(),
            allow_anonymous_paths: vec![
                "/api/health".to_string(),
                "/api/auth/login".to_string(),
                "/api/auth/register".to_string(),
                "/api/auth/refresh".to_string(),
            ],
            public_read_paths: vec!["/api/courses".to_string(), "/api/courses/:id".to_string()],
        }
    }
}

impl AuthConfig {
    /// Token from an `Authorization` header carrying [`Self::bearer_prefix`].
    pub fn bearer_token<'a>(&self, auth_header: &'a str) -> Option<&'a str> {
        extract_bearer_token(auth_header, &self.bearer_prefix)
    }

    pub fn is_anonymous_allowed(&self, path: &str) -> bool {
        self.allow_anonymous_paths
            .iter()
            .any(|pattern| path_matches(pattern, path))
    }

    /// Read-only catalogue endpoints are open to GET and HEAD only.
    pub fn is_public_read(&self, method: &Method, path: &str) -> bool {
        (method == Method::GET || method == Method::HEAD)
            && self
                .public_read_paths
                .iter()
                .any(|pattern| path_matches(pattern, path))
    }

    pub fn requires_auth(&self, method: &Method, path: &str) -> bool {
        !(self.is_anonymous_allowed(path) || self.is_public_read(method, path))
    }
}

fn path_matches(pattern: &str, path: &str) -> bool {
    let path = path.trim_end_matches('/');
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) if p.starts_with(':') => {
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return false;
                }
            }
            (Some(p), Some(s)) if p == s => {}
            _ => return false,
        }
    }
}
