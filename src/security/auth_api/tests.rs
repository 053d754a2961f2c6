#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_role_parse_normalises_input() {
        assert_eq!(Role::parse("student"), Some(Role::Student));
        assert_eq!(Role::parse("STUDENT"), Some(Role::Student));
        assert_eq!(Role::parse("ROLE_STUDENT"), Some(Role::Student));
        assert_eq!(Role::parse(" role_instructor "), Some(Role::Instructor));
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_role_names() {
        assert_eq!(Role::Student.stored_name(), "ROLE_STUDENT");
        assert_eq!(Role::Instructor.as_str(), "INSTRUCTOR");
        assert_eq!(Role::Admin.to_string(), "ADMIN");
        assert_eq!(Role::default(), Role::Student);
    }

    #[test]
    fn test_role_from_requested() {
        assert_eq!(Role::from_requested(&[]).expect("default"), Role::Student);
        assert_eq!(
            Role::from_requested(&["instructor".to_string(), "admin".to_string()])
                .expect("first wins"),
            Role::Instructor
        );

        let err = Role::from_requested(&["wizard".to_string()]).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_authenticated_user_access() {
        let admin = AuthenticatedUser::new(1, "admin", Role::Admin);
        let student = AuthenticatedUser::new(2, "student", Role::Student);

        assert!(admin.is_admin());
        assert!(admin.can_manage_user(2));
        assert!(student.can_manage_user(2));
        assert!(!student.can_manage_user(1));
        assert!(student.has_any_role(&[Role::Student, Role::Instructor]));
        assert!(!student.has_any_role(&[Role::Instructor, Role::Admin]));
    }

    #[test]
    fn test_require_role_helpers() {
        let instructor = AuthenticatedUser::new(3, "teach", Role::Instructor);

        assert!(require_role(&instructor, Role::Instructor).is_ok());
        assert_eq!(
            require_role(&instructor, Role::Student).unwrap_err(),
            AuthError::InsufficientPermissions
        );
        assert!(require_any_role(&instructor, &[Role::Instructor, Role::Admin]).is_ok());
        assert!(require_admin(&instructor).is_err());
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(AuthError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InsufficientPermissions.status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_auth_error_renders_uniform_body() {
        let response = AuthError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response
            .extensions()
            .get::<crate::core::error::ErrorBody>()
            .expect("error body");
        assert_eq!(body.error, "Unauthorized");
        assert_eq!(body.message, "Invalid authentication token");
    }
}
