//! Collection handlers

use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{CreateCollectionRequest, RenameCollectionRequest};
use super::services::CollectionsService;
use super::validators::validate_collection_name;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};

/// GET /api/collections
/// Lists the caller's collections, oldest first, with live item counts
pub async fn get_collections(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = CollectionsService::new(state.db.clone());

    let collections = service.list_with_counts(&authed.id).await?;

    Ok(Json(serde_json::json!({
        "message": "Collections fetched successfully",
        "data": collections,
    })))
}

/// POST /api/collections
/// Creates a new collection for the caller
pub async fn create_collection(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<CreateCollectionRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let state = state_lock.read().await.clone();

    let name = payload.name.as_deref().unwrap_or("");
    validate_collection_name(name).map_err(ApiError::BadRequest)?;

    let service = CollectionsService::new(state.db.clone());
    let collection = service.create(&authed.id, name).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Collection created successfully",
            "data": collection,
        })),
    ))
}

/// PUT /api/collections/:id
/// Renames a non-default collection; cached names on card membership
/// entries are rewritten to match
pub async fn rename_collection(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
    Json(payload): Json<RenameCollectionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = CollectionsService::new(state.db.clone());

    let collection = service.rename(&authed.id, &id, &payload.name).await?;

    Ok(Json(serde_json::json!({
        "message": "Collection renamed successfully",
        "data": collection,
    })))
}

/// DELETE /api/collections/:id
/// Deletes a non-default collection and unlinks it from the caller's cards
pub async fn delete_collection(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = CollectionsService::new(state.db.clone());

    service.delete(&authed.id, &id).await?;

    Ok(Json(serde_json::json!({
        "message": "Collection deleted successfully"
    })))
}
