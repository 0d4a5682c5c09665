//! Profile management handlers

use axum::extract::{Extension, Json, Multipart};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::{ChangePasswordRequest, DeleteAccountRequest, ProfileUpdate};
use super::services::ProfileService;
use super::validators::validate_fullname;
use crate::auth::models::UserResponse;
use crate::auth::AuthedUser;
use crate::common::{generate_raw_id, ApiError, AppState, Validator};

/// GET /api/user/profile
pub async fn get_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = ProfileService::new(state.db.clone());

    let user = service.fetch_profile(&authed.id).await?;

    Ok(Json(json!({
        "message": "User profile fetched successfully.",
        "data": UserResponse::from(user),
    })))
}

/// PUT /api/user/profile
/// Multipart update of fullname, dateOfBirth and the profile picture.
/// Sent text fields overwrite even when empty; a new picture replaces the
/// old one, which is deleted from storage first when it is ours.
pub async fn update_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = ProfileService::new(state.db.clone());

    let user = service.fetch_profile(&authed.id).await?;

    let mut fullname: Option<String> = None;
    let mut date_of_birth: Option<String> = None;
    let mut image_data: Option<Vec<u8>> = None;

    // Parse multipart form data
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "profileImage" => {
                image_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            ApiError::BadRequest(format!("Failed to read profileImage: {}", e))
                        })?
                        .to_vec(),
                );
            }
            "fullname" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read fullname: {}", e))
                })?;
                fullname = Some(value);
            }
            "dateOfBirth" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read dateOfBirth: {}", e))
                })?;
                date_of_birth = Some(value);
            }
            _ => {}
        }
    }

    if let Some(name) = fullname.as_deref() {
        validate_fullname(name).map_err(ApiError::ValidationError)?;
    }

    let profile_image = match image_data {
        Some(data) => Some(replace_profile_picture(&state, &authed.id, &user.profile_image, data).await?),
        None => None,
    };

    let updated = service
        .apply_update(
            &authed.id,
            ProfileUpdate {
                fullname,
                date_of_birth,
                profile_image,
            },
        )
        .await?;

    Ok(Json(json!({
        "message": "User profile updated successfully.",
        "data": UserResponse::from(updated),
    })))
}

/// PUT /api/user/change-password
pub async fn change_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = payload.validate(&payload);
    if !validation.is_valid() {
        return Err(validation.into());
    }

    let service = ProfileService::new(state.db.clone());
    service
        .change_password(&authed.id, &payload.old_password, &payload.new_password)
        .await?;

    Ok(Json(json!({
        "message": "Password changed successfully"
    })))
}

/// DELETE /api/user/account
/// Soft delete by default; `isPermanentlyDelete` drops the row for good
pub async fn delete_account(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<DeleteAccountRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = ProfileService::new(state.db.clone());

    service
        .delete_account(&authed.id, payload.is_permanently_delete)
        .await?;

    Ok(Json(json!({
        "message": "Account deleted successfully"
    })))
}

// ---- Helper Functions ----

/// Deletes the previous picture when it lives in our bucket, then uploads
/// the new one. Foreign URLs (social-login avatars) are left alone.
async fn replace_profile_picture(
    state: &AppState,
    user_id: &str,
    current_url: &Option<String>,
    data: Vec<u8>,
) -> Result<String, ApiError> {
    if !is_valid_image_type(&data) {
        return Err(ApiError::BadRequest("Invalid image type".to_string()));
    }

    if let Some(old_key) = current_url
        .as_deref()
        .and_then(|url| state.aws_service.key_from_url(url))
    {
        if let Err(e) = state.aws_service.delete_file(&old_key).await {
            warn!(error = %e, key = %old_key, "Failed to delete previous profile picture");
        }
    }

    let infer = infer::Infer::new();
    let (extension, mime_type) = infer
        .get(&data)
        .map(|info| (info.extension(), info.mime_type()))
        .unwrap_or(("bin", "application/octet-stream"));

    let key = format!(
        "profile-pictures/profile_{}_{}.{}",
        user_id,
        generate_raw_id(8),
        extension
    );

    match state.aws_service.upload_file(data, &key, mime_type).await {
        Ok(url) => {
            info!(user_id = %user_id, key = %key, "Profile picture uploaded");
            Ok(url)
        }
        Err(e) => {
            error!(error = %e, key = %key, "Failed to upload profile picture");
            Err(ApiError::InternalServer(
                "Failed to update user profile.".to_string(),
            ))
        }
    }
}

fn is_valid_image_type(data: &[u8]) -> bool {
    let infer = infer::Infer::new();
    if let Some(info) = infer.get(data) {
        matches!(
            info.mime_type(),
            "image/png" | "image/jpeg" | "image/gif" | "image/webp"
        )
    } else {
        false
    }
}
