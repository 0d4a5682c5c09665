//! Authentication handlers

use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::Rng;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::extractors::AuthedUser;
use super::models::{
    AppleLoginRequest, AuthProvider, Claims, ForgotPasswordRequest, GoogleLoginRequest,
    LoginRequest, RegisterRequest, ResendOtpRequest, ResetPasswordRequest, User, UserResponse,
    VerifyOtpRequest,
};
use super::password::{hash_password, verify_password};
use crate::collections::services::ensure_default_collection;
use crate::common::{generate_user_id, safe_email_log, ApiError, AppState, Validator};
use crate::services::email::{
    generate_password_reset_otp_email, generate_verification_otp_email, OtpEmailData,
};

const OTP_TTL_MINUTES: i64 = 10;

/// POST /api/auth/register
/// Registers a new email/password user and sends a verification OTP
///
/// # Request Body
/// ```json
/// {
///   "fullname": "Ash Ketchum",
///   "email": "ash@example.com",
///   "password": "secret123"
/// }
/// ```
pub async fn register(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let state = state_lock.read().await.clone();

    let validation = payload.validate(&payload);
    if !validation.is_valid() {
        return Err(validation.into());
    }

    let existing = fetch_user_by_email(&state.db, &payload.email).await?;

    let otp = generate_otp();
    let otp_expires_at = (Utc::now() + Duration::minutes(OTP_TTL_MINUTES)).to_rfc3339();

    // The OTP email goes out before the duplicate check; an already-verified
    // address still receives a code it can never use.
    send_otp_email(
        &state,
        &payload.email,
        Some(payload.fullname.clone()),
        otp,
        OtpEmailKind::Verification,
    )
    .await?;

    match existing {
        Some(user) if user.is_verified => {
            warn!(
                email = %safe_email_log(&payload.email),
                "Registration rejected: email already in use"
            );
            return Err(ApiError::BadRequest("Email ID already in use".to_string()));
        }
        Some(user) => {
            let now = Utc::now().to_rfc3339();
            sqlx::query(
                "UPDATE users SET otp = ?, otp_expires_at = ?, updated_at = ? WHERE id = ?",
            )
            .bind(otp)
            .bind(&otp_expires_at)
            .bind(&now)
            .bind(&user.id)
            .execute(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

            info!(
                user_id = %user.id,
                email = %safe_email_log(&payload.email),
                "Refreshed OTP for unverified registration"
            );
        }
        None => {
            let id = generate_user_id();
            let password_hash = hash_password(&payload.password)?;

            sqlx::query(
                "INSERT INTO users (id, email, password_hash, fullname, provider, otp, otp_expires_at, is_verified) VALUES (?, ?, ?, ?, ?, ?, ?, 0)",
            )
            .bind(&id)
            .bind(&payload.email)
            .bind(&password_hash)
            .bind(&payload.fullname)
            .bind(AuthProvider::Email.as_str())
            .bind(otp)
            .bind(&otp_expires_at)
            .execute(&state.db)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    email = %safe_email_log(&payload.email),
                    "Database error inserting new user during registration"
                );
                ApiError::DatabaseError(e)
            })?;

            ensure_default_collection(&state.db, &id).await?;

            info!(
                user_id = %id,
                email = %safe_email_log(&payload.email),
                "New user registered, awaiting OTP verification"
            );
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Registration complete! Check your email for the verification OTP"
        })),
    ))
}

/// POST /api/auth/verify-otp
/// Confirms the emailed OTP, marks the user verified and signs them in
pub async fn verify_otp(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = fetch_user_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid email or user does not exist".to_string()))?;

    // Expiry is checked before the code itself
    if user.otp_is_expired(Utc::now()) {
        warn!(user_id = %user.id, "OTP verification failed: code expired");
        return Err(ApiError::BadRequest("OTP has expired".to_string()));
    }

    if user.otp != Some(payload.otp) {
        warn!(user_id = %user.id, "OTP verification failed: code mismatch");
        return Err(ApiError::BadRequest("Invalid OTP".to_string()));
    }

    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "UPDATE users SET is_verified = 1, otp = NULL, otp_expires_at = NULL, updated_at = ? WHERE id = ?",
    )
    .bind(&now)
    .bind(&user.id)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let token = issue_token(&state.jwt_secret, &user.id)?;
    let user = fetch_user_by_id(&state.db, &user.id).await?;

    info!(user_id = %user.id, "Email verified via OTP");

    Ok(Json(serde_json::json!({
        "message": "OTP verified successfully!",
        "token": token,
        "user": UserResponse::from(user),
    })))
}

/// POST /api/auth/resend-otp
/// Stores a fresh OTP for the user and emails it again
pub async fn resend_otp(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<ResendOtpRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = fetch_user_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("User does not exist".to_string()))?;

    let otp = generate_otp();
    let otp_expires_at = (Utc::now() + Duration::minutes(OTP_TTL_MINUTES)).to_rfc3339();
    let now = Utc::now().to_rfc3339();

    sqlx::query("UPDATE users SET otp = ?, otp_expires_at = ?, updated_at = ? WHERE id = ?")
        .bind(otp)
        .bind(&otp_expires_at)
        .bind(&now)
        .bind(&user.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    send_otp_email(
        &state,
        &payload.email,
        user.fullname.clone(),
        otp,
        OtpEmailKind::Verification,
    )
    .await?;

    info!(user_id = %user.id, "OTP resent");

    Ok(Json(serde_json::json!({
        "message": "OTP has been resent successfully!"
    })))
}

/// POST /api/auth/login
/// Email/password login for verified users
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = fetch_user_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid email or user does not exist".to_string()))?;

    if !user.is_verified {
        return Err(ApiError::BadRequest(
            "Please first verify OTP or create your account".to_string(),
        ));
    }

    // Social accounts carry no password hash and fail this gate
    let password_ok = user
        .password_hash
        .as_deref()
        .map(|hash| verify_password(&payload.password, hash))
        .unwrap_or(false);

    if !password_ok {
        warn!(user_id = %user.id, "Login rejected: password mismatch");
        return Err(ApiError::Unauthorized("Invalid password".to_string()));
    }

    let token = issue_token(&state.jwt_secret, &user.id)?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&payload.email),
        "Login successful"
    );

    Ok(Json(serde_json::json!({
        "message": "Login successful",
        "token": token,
        "user": UserResponse::from(user),
    })))
}

/// POST /api/auth/forgot-password
/// Emails a password-reset OTP and stores it on the user
pub async fn forgot_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = fetch_user_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("User not found".to_string()))?;

    let otp = generate_otp();
    let otp_expires_at = (Utc::now() + Duration::minutes(OTP_TTL_MINUTES)).to_rfc3339();

    send_otp_email(
        &state,
        &payload.email,
        user.fullname.clone(),
        otp,
        OtpEmailKind::PasswordReset,
    )
    .await?;

    let now = Utc::now().to_rfc3339();
    sqlx::query("UPDATE users SET otp = ?, otp_expires_at = ?, updated_at = ? WHERE id = ?")
        .bind(otp)
        .bind(&otp_expires_at)
        .bind(&now)
        .bind(&user.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(user_id = %user.id, "Password reset OTP issued");

    Ok(Json(serde_json::json!({
        "message": "OTP sent successfully!"
    })))
}

/// POST /api/auth/reset-password
/// Replaces the password for the account with the given email.
/// The OTP is not re-checked here; the flow trusts the forgot-password step.
pub async fn reset_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = payload.validate(&payload);
    if !validation.is_valid() {
        return Err(validation.into());
    }

    let user = fetch_user_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("User not found".to_string()))?;

    let password_hash = hash_password(&payload.new_password)?;
    let now = Utc::now().to_rfc3339();

    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(&now)
        .bind(&user.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(user_id = %user.id, "Password reset");

    Ok(Json(serde_json::json!({
        "message": "Password reset successfully!"
    })))
}

/// POST /api/auth/google
/// Signs a user in with a Google account profile, creating the account on
/// first login
///
/// # Request Body
/// ```json
/// {
///   "email": "ash@example.com",
///   "fullname": "Ash Ketchum",
///   "profileImage": "https://lh3.googleusercontent.com/..."
/// }
/// ```
///
/// # Response
/// ```json
/// {
///   "message": "Google login successfully",
///   "token": "<jwt token>",
///   "user": { ... }
/// }
/// ```
pub async fn google_auth(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<GoogleLoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    info!("🔐 Received Google auth request");
    let state = state_lock.read().await.clone();

    let user = social_login(
        &state,
        AuthProvider::Google,
        &payload.email,
        Some(payload.fullname.clone()),
        Some(payload.profile_image.clone()),
        None,
    )
    .await?;

    let token = issue_token(&state.jwt_secret, &user.id)?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&payload.email),
        provider = "google",
        "User authentication successful via Google login"
    );

    Ok(Json(serde_json::json!({
        "message": "Google login successfully",
        "token": token,
        "user": UserResponse::from(user),
    })))
}

/// POST /api/auth/apple
/// Signs a user in with an Apple identity token. The token is verified
/// against Apple's published signing keys before any account is touched.
pub async fn apple_auth(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<AppleLoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    info!("🔐 Received Apple auth request");
    let state = state_lock.read().await.clone();

    let identity = match state
        .apple_service
        .verify_identity_token(&payload.token)
        .await
    {
        Ok(identity) => identity,
        Err(e) => {
            warn!(error = %e, "Apple identity token rejected");
            return Err(ApiError::Unauthorized("Invalid authentication".to_string()));
        }
    };

    let email = match identity.email {
        Some(email) => email,
        None => {
            warn!(subject = %identity.sub, "Apple identity token carries no email address");
            return Err(ApiError::Unauthorized("Invalid authentication".to_string()));
        }
    };

    let user = social_login(
        &state,
        AuthProvider::Apple,
        &email,
        None,
        None,
        Some(identity.sub),
    )
    .await?;

    let token = issue_token(&state.jwt_secret, &user.id)?;

    info!(
        user_id = %user.id,
        provider = "apple",
        "User authentication successful via Apple login"
    );

    Ok(Json(serde_json::json!({
        "message": "Apple login successful",
        "token": token,
        "user": UserResponse::from(user),
    })))
}

/// GET /api/auth/verify-token
/// Confirms the bearer token is valid; the extractor does the actual work
pub async fn verify_token(_authed: AuthedUser) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(serde_json::json!({
        "message": "Token is verify successfully."
    })))
}

// ---- Helper Functions ----

enum OtpEmailKind {
    Verification,
    PasswordReset,
}

fn generate_otp() -> i64 {
    rand::thread_rng().gen_range(100_000..=999_999)
}

/// Issue an HS256 JWT carrying the user id, valid for 24 hours
pub fn issue_token(jwt_secret: &str, user_id: &str) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        error!(
            error = %e,
            user_id = %user_id,
            "JWT encoding error during authentication"
        );
        ApiError::InternalServer("jwt error".to_string())
    })
}

async fn fetch_user_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ? AND is_deleted = 0")
        .bind(email)
        .fetch_optional(db)
        .await
        .map_err(ApiError::DatabaseError)
}

async fn fetch_user_by_id(db: &SqlitePool, id: &str) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(ApiError::DatabaseError)
}

async fn send_otp_email(
    state: &AppState,
    email: &str,
    fullname: Option<String>,
    otp: i64,
    kind: OtpEmailKind,
) -> Result<(), ApiError> {
    let data = OtpEmailData { fullname, otp };
    let (subject, body) = match kind {
        OtpEmailKind::Verification => (
            "Verify your email",
            generate_verification_otp_email(&data),
        ),
        OtpEmailKind::PasswordReset => (
            "Reset your password",
            generate_password_reset_otp_email(&data),
        ),
    };

    state
        .aws_service
        .send_email(vec![email.to_string()], subject, &body)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                email = %safe_email_log(email),
                "Failed to send OTP email"
            );
            ApiError::InternalServer("Failed to send OTP email".to_string())
        })
}

/// Find-or-create flow shared by the Google and Apple endpoints.
///
/// `profile_image` is tri-state: `Some(value)` replaces the stored image
/// with `value` (possibly clearing it), `None` leaves it untouched.
async fn social_login(
    state: &AppState,
    provider: AuthProvider,
    email: &str,
    fullname: Option<String>,
    profile_image: Option<Option<String>>,
    provider_id: Option<String>,
) -> Result<User, ApiError> {
    let existing = fetch_user_by_email(&state.db, email).await?;

    match existing {
        None => {
            let id = generate_user_id();
            let initial_image = profile_image.clone().flatten();

            info!(
                user_id = %id,
                email = %safe_email_log(email),
                provider = provider.as_str(),
                "Creating new user account via social login"
            );

            sqlx::query(
                "INSERT INTO users (id, email, fullname, profile_image, provider, provider_id, is_verified) VALUES (?, ?, ?, ?, ?, ?, 1)",
            )
            .bind(&id)
            .bind(email)
            .bind(fullname.as_deref())
            .bind(initial_image.as_deref())
            .bind(provider.as_str())
            .bind(provider_id.as_deref())
            .execute(&state.db)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    email = %safe_email_log(email),
                    provider = provider.as_str(),
                    "Database error inserting new user during social login"
                );
                ApiError::DatabaseError(e)
            })?;

            ensure_default_collection(&state.db, &id).await?;

            fetch_user_by_id(&state.db, &id).await
        }
        Some(user) if user.provider != provider => {
            warn!(
                user_id = %user.id,
                existing_provider = user.provider.as_str(),
                attempted_provider = provider.as_str(),
                "Social login rejected: email belongs to another provider"
            );
            Err(ApiError::BadRequest("Email ID already in use".to_string()))
        }
        Some(user) => {
            // Repeat login clears any leftover email-flow credentials
            let stored_image = match &profile_image {
                Some(new_image) => new_image.as_deref(),
                None => user.profile_image.as_deref(),
            };
            let now = Utc::now().to_rfc3339();

            sqlx::query(
                "UPDATE users SET profile_image = ?, provider_id = ?, password_hash = NULL, otp = NULL, otp_expires_at = NULL, is_verified = 1, updated_at = ? WHERE id = ?",
            )
            .bind(stored_image)
            .bind(provider_id.as_deref())
            .bind(&now)
            .bind(&user.id)
            .execute(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

            fetch_user_by_id(&state.db, &user.id).await
        }
    }
}
