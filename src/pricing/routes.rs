use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Price checker routes:
/// - GET  /api/price-checker/search?q=      - Search the catalog
/// - GET  /api/price-checker/products/:id   - Fetch one product's detail
/// - POST /api/price-checker/toggle-favorite - Toggle a favorite card id
/// - GET  /api/price-checker/favorites      - List favorite cards with detail
pub fn price_checker_routes() -> Router {
    Router::new()
        .route("/api/price-checker/search", get(handlers::search_cards))
        .route("/api/price-checker/products/:id", get(handlers::card_detail))
        .route(
            "/api/price-checker/toggle-favorite",
            post(handlers::toggle_favorite),
        )
        .route("/api/price-checker/favorites", get(handlers::favorite_cards))
}
