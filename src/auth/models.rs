//! Authentication data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::common::helpers::serialize_id_list;

/// JWT claims structure
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Login provider stored on the user row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AuthProvider {
    Google,
    Apple,
    Email,
    Mobile,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Google => "google",
            AuthProvider::Apple => "apple",
            AuthProvider::Email => "email",
            AuthProvider::Mobile => "mobile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
    Manager,
}

/// User database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub fullname: Option<String>,
    pub profile_image: Option<String>,
    pub provider: AuthProvider,
    pub provider_id: Option<String>,
    pub role: UserRole,
    pub otp: Option<i64>,
    pub otp_expires_at: Option<String>,
    pub is_verified: bool,
    pub is_deleted: bool,
    pub date_of_birth: Option<String>,
    pub favorite_card_ids: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Credential state keyed by provider. The row stores every field flat;
/// this view groups what actually belongs together for each login kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderState {
    Email {
        otp: Option<i64>,
        otp_expires_at: Option<String>,
        verified: bool,
    },
    Google,
    Apple { subject_id: Option<String> },
    Mobile,
}

impl User {
    pub fn provider_state(&self) -> ProviderState {
        match self.provider {
            AuthProvider::Email => ProviderState::Email {
                otp: self.otp,
                otp_expires_at: self.otp_expires_at.clone(),
                verified: self.is_verified,
            },
            AuthProvider::Google => ProviderState::Google,
            AuthProvider::Apple => ProviderState::Apple {
                subject_id: self.provider_id.clone(),
            },
            AuthProvider::Mobile => ProviderState::Mobile,
        }
    }

    /// Whether the stored OTP has lapsed at `now`.
    /// A row with no expiry set is not treated as expired; the OTP match
    /// itself then rejects the attempt.
    pub fn otp_is_expired(&self, now: DateTime<Utc>) -> bool {
        match &self.otp_expires_at {
            None => false,
            Some(raw) => match DateTime::parse_from_rfc3339(raw) {
                Ok(expires_at) => expires_at.with_timezone(&Utc) < now,
                Err(_) => true,
            },
        }
    }

    /// Parsed favorite catalog ids (stored as a JSON array in TEXT)
    pub fn favorite_ids(&self) -> Vec<String> {
        self.favorite_card_ids
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}

/// User payload returned to clients (no password hash, no OTP state)
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: Option<String>,
    pub fullname: Option<String>,
    pub profile_image: Option<String>,
    pub provider: AuthProvider,
    pub role: UserRole,
    pub is_verified: bool,
    pub date_of_birth: Option<String>,
    #[serde(serialize_with = "serialize_id_list")]
    pub favorite_card_ids: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            fullname: user.fullname,
            profile_image: user.profile_image,
            provider: user.provider,
            role: user.role,
            is_verified: user.is_verified,
            date_of_birth: user.date_of_birth,
            favorite_card_ids: user.favorite_card_ids,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// ---- Request payloads ----

#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: i64,
}

#[derive(Deserialize, Debug)]
pub struct ResendOtpRequest {
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    pub email: String,
    pub fullname: String,
    pub profile_image: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct AppleLoginRequest {
    pub token: String,
}
