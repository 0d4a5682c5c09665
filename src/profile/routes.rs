//! Profile management routes

use axum::{
    routing::{delete, get, put},
    Router,
};

use super::handlers;

/// Creates and returns the user profile router
///
/// # Routes
/// - `GET /api/user/profile` - Fetch the caller's profile
/// - `PUT /api/user/profile` - Update profile fields and picture (multipart)
/// - `PUT /api/user/change-password` - Rotate the password
/// - `DELETE /api/user/account` - Soft or permanent account deletion
pub fn user_routes() -> Router {
    Router::new()
        .route(
            "/api/user/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/api/user/change-password", put(handlers::change_password))
        .route("/api/user/account", delete(handlers::delete_account))
}
