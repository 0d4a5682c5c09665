//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Email registration with OTP verification
//! - Google and Apple sign-in
//! - JWT token generation and validation
//! - AuthedUser extractor for protected routes

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod password;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use extractors::AuthedUser;
pub use models::User;
pub use routes::auth_routes;
