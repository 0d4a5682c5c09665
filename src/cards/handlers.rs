//! Card record handlers

use axum::extract::{Extension, Json, Multipart, Path, Query};
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::membership::StoreCollectionEntry;
use super::models::{
    AddToCollectionRequest, CardDetect, CardDetectResponse, CardPage, ListCardsQuery,
    RemoveFromCollectionRequest,
};
use super::services::{CardUpdate, CardsService, NewCardRecord};
use crate::auth::AuthedUser;
use crate::common::{generate_raw_id, ApiError, AppState};

/// POST /api/cards
/// Stores a scanned card record. Each image side takes either an uploaded
/// file or a URL, never both; the back side is validated only after the
/// front file has already been uploaded.
pub async fn create_card(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let state = state_lock.read().await.clone();

    let form = read_card_form(&mut multipart).await?;

    let has_front_url = form
        .front_image_url
        .as_deref()
        .map(|s| !s.is_empty())
        .unwrap_or(false);
    let has_back_url = form
        .back_image_url
        .as_deref()
        .map(|s| !s.is_empty())
        .unwrap_or(false);

    if form.front_image_file.is_some() && has_front_url {
        return Err(ApiError::BadRequest(
            "Send either frontImageFile or frontImageUrl, not both".to_string(),
        ));
    }
    let front_image_url = match form.front_image_file {
        Some(data) => Some(upload_card_image(&state, &authed.id, data).await?),
        None => form.front_image_url.filter(|s| !s.is_empty()),
    };

    if form.back_image_file.is_some() && has_back_url {
        return Err(ApiError::BadRequest(
            "Send either backImageFile or backImageUrl, not both".to_string(),
        ));
    }
    let back_image_url = match form.back_image_file {
        Some(data) => Some(upload_card_image(&state, &authed.id, data).await?),
        None => form.back_image_url.filter(|s| !s.is_empty()),
    };

    // Detail blobs are parsed after the uploads, so a malformed blob can
    // leave an already-stored image behind
    let front_details = match form.front_details.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => parse_details_field(raw)?,
        None => "{}".to_string(),
    };
    let back_details = match form.back_details.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => parse_details_field(raw)?,
        None => "{}".to_string(),
    };
    let price_checker_details = match form
        .price_checker_details
        .as_deref()
        .filter(|s| !s.is_empty())
    {
        Some(raw) => parse_details_field(raw)?,
        None => "{}".to_string(),
    };
    let store_collection = match form.store_collection.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => parse_membership_field(raw)?,
        None => Vec::new(),
    };
    let is_favorite = form
        .is_favorite
        .as_deref()
        .map(|value| value == "true" || value == "1")
        .unwrap_or(false);

    let service = CardsService::new(state.db.clone());
    let card = service
        .create(
            &authed.id,
            NewCardRecord {
                card_name: form.card_name,
                front_image_url,
                back_image_url,
                front_details,
                back_details,
                price_checker_details,
                is_favorite,
                store_collection,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Card detected and stored successfully",
            "data": CardDetectResponse::from(card),
        })),
    ))
}

/// GET /api/cards
/// Pages through the caller's cards, newest first. `search` matches the
/// price-checker name case-insensitively.
pub async fn get_cards(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(query): Query<ListCardsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = CardsService::new(state.db.clone());

    let cards = service.list(&authed.id).await?;
    let page = page_cards(
        cards,
        query.search.as_deref(),
        query.page.unwrap_or(1),
        query.limit.unwrap_or(10),
    );

    Ok(Json(json!({
        "message": "Cards fetched successfully",
        "data": page,
    })))
}

/// GET /api/cards/:id
pub async fn get_card_by_id(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = CardsService::new(state.db.clone());

    let card = service.get_by_id(&authed.id, &id).await?;

    Ok(Json(json!({
        "message": "Card fetched successfully",
        "data": CardDetectResponse::from(card),
    })))
}

/// PUT /api/cards/:id
/// Partial update. A file always wins its image side and a URL applies
/// only when no file came in; superseded images stay in storage.
pub async fn update_card(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = CardsService::new(state.db.clone());

    // Ownership check comes before any upload
    service.get_by_id(&authed.id, &id).await?;

    let form = read_card_form(&mut multipart).await?;

    let mut update = CardUpdate::default();

    update.front_image_url = match form.front_image_file {
        Some(data) => Some(upload_card_image(&state, &authed.id, data).await?),
        None => form.front_image_url.filter(|s| !s.is_empty()),
    };
    update.back_image_url = match form.back_image_file {
        Some(data) => Some(upload_card_image(&state, &authed.id, data).await?),
        None => form.back_image_url.filter(|s| !s.is_empty()),
    };

    update.card_name = form.card_name.filter(|s| !s.is_empty());
    update.front_details = form
        .front_details
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_details_field)
        .transpose()?;
    update.back_details = form
        .back_details
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_details_field)
        .transpose()?;
    update.price_checker_details = form
        .price_checker_details
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_details_field)
        .transpose()?;
    update.is_favorite = form
        .is_favorite
        .as_deref()
        .map(|value| value == "true" || value == "1");
    update.store_collection = form
        .store_collection
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_membership_field)
        .transpose()?;

    let card = service.update(&authed.id, &id, update).await?;

    Ok(Json(json!({
        "message": "Card updated successfully",
        "data": CardDetectResponse::from(card),
    })))
}

/// DELETE /api/cards/:id
pub async fn delete_card(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = CardsService::new(state.db.clone());

    service.delete(&authed.id, &id).await?;

    Ok(Json(json!({
        "message": "Card deleted successfully"
    })))
}

/// PATCH /api/cards/:id/toggle-favorite
pub async fn toggle_favorite_status(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = CardsService::new(state.db.clone());

    let card = service.toggle_favorite(&authed.id, &id).await?;

    let message = if card.is_favorite {
        "Card marked as favorite"
    } else {
        "Card marked as not favorite"
    };

    Ok(Json(json!({
        "message": message,
        "data": { "id": card.id, "isFavorite": card.is_favorite },
    })))
}

/// GET /api/cards/favorites
pub async fn get_favorite_cards(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = CardsService::new(state.db.clone());

    let cards = service.favorites(&authed.id).await?;
    let data: Vec<CardDetectResponse> = cards.into_iter().map(CardDetectResponse::from).collect();

    Ok(Json(json!({
        "message": "Favorite cards fetched successfully",
        "data": data,
    })))
}

/// POST /api/cards/add-to-collection
pub async fn add_card_to_collection(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<AddToCollectionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = CardsService::new(state.db.clone());

    let card = service
        .add_to_collection(&authed.id, &payload.card_id, &payload.collection_id)
        .await?;

    Ok(Json(json!({
        "message": "Card added to collection successfully",
        "data": CardDetectResponse::from(card),
    })))
}

/// POST /api/cards/remove-from-collection
pub async fn remove_card_from_collection(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<RemoveFromCollectionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = CardsService::new(state.db.clone());

    let card = service
        .remove_from_collection(&authed.id, &payload.card_id, &payload.collection_id)
        .await?;

    Ok(Json(json!({
        "message": "Card removed from collection successfully",
        "data": CardDetectResponse::from(card),
    })))
}

/// GET /api/cards/by-collection/:collection_id
pub async fn get_cards_by_collection(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(collection_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = CardsService::new(state.db.clone());

    let cards = service.by_collection(&authed.id, &collection_id).await?;
    let data: Vec<CardDetectResponse> = cards.into_iter().map(CardDetectResponse::from).collect();

    Ok(Json(json!({
        "message": "Cards fetched for collection",
        "data": data,
    })))
}

// ---- Helper Functions ----

/// Applies the search filter, slices the requested page and then drops
/// records without a usable price-checker name. The total counts every
/// match before the visibility rule, so a page can come back short.
pub(crate) fn page_cards(
    cards: Vec<CardDetect>,
    search: Option<&str>,
    page: i64,
    limit: i64,
) -> CardPage {
    let needle = search.filter(|s| !s.is_empty()).map(str::to_lowercase);
    let matching: Vec<_> = match &needle {
        Some(needle) => cards
            .into_iter()
            .filter(|card| {
                card.price_checker_name()
                    .map(|name| name.to_lowercase().contains(needle))
                    .unwrap_or(false)
            })
            .collect(),
        None => cards,
    };

    let page = page.max(1);
    let limit = limit.max(1);
    let total_items = matching.len() as i64;
    let total_pages = (total_items + limit - 1) / limit;
    let skip = ((page - 1) * limit) as usize;

    let data: Vec<CardDetectResponse> = matching
        .into_iter()
        .skip(skip)
        .take(limit as usize)
        .filter(|card| {
            card.price_checker_name()
                .map(|name| !name.trim().is_empty())
                .unwrap_or(false)
        })
        .map(CardDetectResponse::from)
        .collect();

    CardPage {
        page,
        total_pages,
        total_items,
        limit,
        data,
    }
}

/// Form fields shared by the create and update endpoints
#[derive(Default)]
struct CardForm {
    card_name: Option<String>,
    front_image_url: Option<String>,
    back_image_url: Option<String>,
    front_details: Option<String>,
    back_details: Option<String>,
    price_checker_details: Option<String>,
    is_favorite: Option<String>,
    store_collection: Option<String>,
    front_image_file: Option<Vec<u8>>,
    back_image_file: Option<Vec<u8>>,
}

async fn read_card_form(multipart: &mut Multipart) -> Result<CardForm, ApiError> {
    let mut form = CardForm::default();

    // Parse multipart form data
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "frontImageFile" => {
                form.front_image_file = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            ApiError::BadRequest(format!("Failed to read frontImageFile: {}", e))
                        })?
                        .to_vec(),
                );
            }
            "backImageFile" => {
                form.back_image_file = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            ApiError::BadRequest(format!("Failed to read backImageFile: {}", e))
                        })?
                        .to_vec(),
                );
            }
            "cardName" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read cardName: {}", e))
                })?;
                form.card_name = Some(value);
            }
            "frontImageUrl" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read frontImageUrl: {}", e))
                })?;
                form.front_image_url = Some(value);
            }
            "backImageUrl" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read backImageUrl: {}", e))
                })?;
                form.back_image_url = Some(value);
            }
            "frontDetails" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read frontDetails: {}", e))
                })?;
                form.front_details = Some(value);
            }
            "backDetails" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read backDetails: {}", e))
                })?;
                form.back_details = Some(value);
            }
            "priceCheckerDetails" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read priceCheckerDetails: {}", e))
                })?;
                form.price_checker_details = Some(value);
            }
            "isFavorite" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read isFavorite: {}", e))
                })?;
                form.is_favorite = Some(value);
            }
            "storeCollection" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read storeCollection: {}", e))
                })?;
                form.store_collection = Some(value);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Re-serializes a detail blob to canonical JSON text
fn parse_details_field(raw: &str) -> Result<String, ApiError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|_| ApiError::BadRequest("Error parsing JSON data".to_string()))?;
    serde_json::to_string(&value)
        .map_err(|_| ApiError::BadRequest("Error parsing JSON data".to_string()))
}

fn parse_membership_field(raw: &str) -> Result<Vec<StoreCollectionEntry>, ApiError> {
    serde_json::from_str(raw)
        .map_err(|_| ApiError::BadRequest("Error parsing JSON data".to_string()))
}

/// Sniffs the uploaded bytes, rejects non-image content and stores the
/// file under the cards prefix. Returns the public URL.
async fn upload_card_image(
    state: &AppState,
    user_id: &str,
    data: Vec<u8>,
) -> Result<String, ApiError> {
    if !is_valid_image_type(&data) {
        return Err(ApiError::BadRequest("Invalid image type".to_string()));
    }

    let infer = infer::Infer::new();
    let (extension, mime_type) = infer
        .get(&data)
        .map(|info| (info.extension(), info.mime_type()))
        .unwrap_or(("bin", "application/octet-stream"));

    let key = format!("cards/card_{}_{}.{}", user_id, generate_raw_id(8), extension);

    match state.aws_service.upload_file(data, &key, mime_type).await {
        Ok(url) => {
            info!(key = %key, "Card image uploaded");
            Ok(url)
        }
        Err(e) => {
            error!(error = %e, key = %key, "Failed to upload card image");
            Err(ApiError::InternalServer("Failed to upload image".to_string()))
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
