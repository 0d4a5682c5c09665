//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/auth/register` - Email registration with OTP verification
/// - `POST /api/auth/verify-otp` - Confirm the emailed OTP
/// - `POST /api/auth/resend-otp` - Send a fresh OTP
/// - `POST /api/auth/login` - Email/password login
/// - `POST /api/auth/forgot-password` - Send a password-reset OTP
/// - `POST /api/auth/reset-password` - Replace the password
/// - `POST /api/auth/google` - Google sign-in
/// - `POST /api/auth/apple` - Apple sign-in
/// - `GET /api/auth/verify-token` - Bearer-token check
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/verify-otp", post(handlers::verify_otp))
        .route("/api/auth/resend-otp", post(handlers::resend_otp))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/forgot-password", post(handlers::forgot_password))
        .route("/api/auth/reset-password", post(handlers::reset_password))
        .route("/api/auth/google", post(handlers::google_auth))
        .route("/api/auth/apple", post(handlers::apple_auth))
        .route("/api/auth/verify-token", get(handlers::verify_token))
}
