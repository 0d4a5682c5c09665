//! Price checker proxy handlers

use axum::extract::{Extension, Json, Path, Query};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::error;

use super::models::{SearchQuery, ToggleFavoriteRequest};
use super::services::FavoritesService;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};

/// GET /api/price-checker/search?q=
pub async fn search_cards(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _authed: AuthedUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let q = match query.q.as_deref().filter(|q| !q.is_empty()) {
        Some(q) => q,
        None => return Err(ApiError::BadRequest("Query is required".to_string())),
    };

    let products = state.price_service.search_products(q).await.map_err(|e| {
        error!(error = %e, query = %q, "Price-checker search failed");
        ApiError::InternalServer("Failed to fetch cards".to_string())
    })?;

    Ok(Json(json!({
        "message": "Cards fetched successfully!",
        "data": products,
    })))
}

/// GET /api/price-checker/products/:id
pub async fn card_detail(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let detail = state.price_service.product_detail(&id).await.map_err(|e| {
        error!(error = %e, product_id = %id, "Price-checker detail lookup failed");
        ApiError::InternalServer("Failed to fetch card detail".to_string())
    })?;

    Ok(Json(json!({
        "message": "Card detail fetched successfully!",
        "data": detail,
    })))
}

/// POST /api/price-checker/toggle-favorite
pub async fn toggle_favorite(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<ToggleFavoriteRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let card_id = match payload.card_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => return Err(ApiError::BadRequest("cardId is required".to_string())),
    };

    let service = FavoritesService::new(state.db.clone());
    let now_favorite = service.toggle(&authed.id, card_id).await?;

    let message = if now_favorite {
        "Card added to favorites"
    } else {
        "Card removed from favorites"
    };

    Ok(Json(json!({ "message": message })))
}

/// GET /api/price-checker/favorites
/// Looks up every stored id against the catalog concurrently and marks
/// each payload as a favorite
pub async fn favorite_cards(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let ids = authed.user.favorite_ids();

    let results = futures::future::join_all(
        ids.iter().map(|id| state.price_service.product_detail(id)),
    )
    .await;

    let mut cards = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(mut detail) => {
                if let Some(obj) = detail.as_object_mut() {
                    obj.insert("isFavorite".to_string(), serde_json::Value::Bool(true));
                }
                cards.push(detail);
            }
            Err(e) => {
                error!(error = %e, user_id = %authed.id, "Failed to fetch favorite card detail");
                return Err(ApiError::InternalServer(
                    "Failed to fetch card detail".to_string(),
                ));
            }
        }
    }

    Ok(Json(json!({
        "message": "Favorite cards fetched fetched successfully!",
        "data": cards,
    })))
}
