use regex::Regex;
use std::sync::LazyLock;

use crate::core::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Blank(String),
    Size { field: String, min: usize, max: usize },
    InvalidEmail(String),
    Range { field: String, min: String, max: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank(field) => write!(f, "{field}: must not be blank"),
            Self::Size { field, min, max } => {
                write!(f, "{field}: size must be between {min} and {max}")
            }
            Self::InvalidEmail(field) => write!(f, "{field}: must be a well-formed email address"),
            Self::Range { field, min, max } => {
                write!(f, "{field}: must be between {min} and {max}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("Invalid email regex")
});

pub fn validate_not_blank(value: &str, field_name: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Blank(field_name.to_string()))
    } else {
        Ok(())
    }
}

/// Length is counted in characters, not bytes.
pub fn validate_length(
    value: &str,
    field_name: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::Size {
            field: field_name.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

pub fn validate_email(email: &str, field_name: &str) -> Result<(), ValidationError> {
    if email.len() > 254 || !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(field_name.to_string()));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display>(
    value: &T,
    field_name: &str,
    min: &T,
    max: &T,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::Range {
            field: field_name.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}

/// Collects every failing check so a request reports all of its problems at
/// once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, result: Result<(), ValidationError>) -> Self {
        if let Err(e) = result {
            self.errors.push(e);
        }
        self
    }

    pub fn not_blank(self, value: &str, field_name: &str) -> Self {
        self.push(validate_not_blank(value, field_name))
    }

    pub fn length(self, value: &str, field_name: &str, min: usize, max: usize) -> Self {
        self.push(validate_length(value, field_name, min, max))
    }

    pub fn email(self, value: &str, field_name: &str) -> Self {
        self.push(validate_email(value, field_name))
    }

    pub fn range<T: PartialOrd + std::fmt::Display>(
        self,
        value: &T,
        field_name: &str,
        min: &T,
        max: &T,
    ) -> Self {
        self.push(validate_range(value, field_name, min, max))
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn validate(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.messages()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("alice", "username").is_ok());
        assert_eq!(
            validate_not_blank("   ", "username").unwrap_err().to_string(),
            "username: must not be blank"
        );
    }

    #[test]
    fn test_length_counts_chars() {
        assert!(validate_length("abc", "username", 3, 100).is_ok());
        assert!(validate_length("ab", "username", 3, 100).is_err());
        assert!(validate_length("ééé", "username", 3, 3).is_ok());
        assert_eq!(
            validate_length("ab", "username", 3, 100).unwrap_err().to_string(),
            "username: size must be between 3 and 100"
        );
    }

    #[test]
    fn test_email() {
        assert!(validate_email("user@example.com", "email").is_ok());
        assert!(validate_email("user.name+tag@sub.example.org", "email").is_ok());
        assert!(validate_email("invalid", "email").is_err());
        assert!(validate_email("@example.com", "email").is_err());
    }

    #[test]
    fn test_range() {
        assert!(validate_range(&50, "progress", &0, &100).is_ok());
        assert!(validate_range(&101, "progress", &0, &100).is_err());
        assert!(validate_range(&-1, "progress", &0, &100).is_err());
    }

    #[test]
    fn test_validator_collects_all_errors() {
        let err = Validator::new()
            .length("ab", "username", 3, 100)
            .email("nope", "email")
            .length("123", "password", 6, 100)
            .validate()
            .unwrap_err();

        match err {
            ApiError::Validation(details) => {
                assert_eq!(details.len(), 3);
                assert_eq!(details[1], "email: must be a well-formed email address");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validator_passes() {
        let result = Validator::new()
            .not_blank("Jane Doe", "fullName")
            .email("jane@example.com", "email")
            .validate();
        assert!(result.is_ok());
    }
}
