use axum::{
    routing::{get, put},
    Router,
};

use crate::core::shared::state::AppState;

use super::users;

pub fn configure() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(users::list_users))
        .route("/api/users/me", get(users::get_current_user))
        .route("/api/users/role/:role", get(users::list_users_by_role))
        .route(
            "/api/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/users/:id/roles", put(users::set_roles))
}
