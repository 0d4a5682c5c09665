//! Card record routes

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers;

/// Creates and returns the card router
///
/// # Routes
/// - `GET /api/cards` - Paged listing with price-checker name search
/// - `POST /api/cards` - Store a scanned card (multipart)
/// - `GET /api/cards/favorites` - Favorited cards
/// - `POST /api/cards/add-to-collection` - Link a card to a collection
/// - `POST /api/cards/remove-from-collection` - Unlink a card from a collection
/// - `GET /api/cards/by-collection/:collection_id` - Cards in a collection
/// - `GET /api/cards/:id` - Fetch one card
/// - `PUT /api/cards/:id` - Partial update (multipart)
/// - `DELETE /api/cards/:id` - Delete a card
/// - `PATCH /api/cards/:id/toggle-favorite` - Flip the favorite flag
pub fn cards_routes() -> Router {
    Router::new()
        .route(
            "/api/cards",
            get(handlers::get_cards).post(handlers::create_card),
        )
        .route("/api/cards/favorites", get(handlers::get_favorite_cards))
        .route(
            "/api/cards/add-to-collection",
            post(handlers::add_card_to_collection),
        )
        .route(
            "/api/cards/remove-from-collection",
            post(handlers::remove_card_from_collection),
        )
        .route(
            "/api/cards/by-collection/:collection_id",
            get(handlers::get_cards_by_collection),
        )
        .route(
            "/api/cards/:id",
            get(handlers::get_card_by_id)
                .put(handlers::update_card)
                .delete(handlers::delete_card),
        )
        .route(
            "/api/cards/:id/toggle-favorite",
            patch(handlers::toggle_favorite_status),
        )
}
