use super::handlers;
use axum::{
    routing::{get, put},
    Router,
};

/// Creates the collections router
pub fn collections_routes() -> Router {
    Router::new()
        .route(
            "/api/collections",
            get(handlers::get_collections).post(handlers::create_collection),
        )
        .route(
            "/api/collections/:id",
            put(handlers::rename_collection).delete(handlers::delete_collection),
        )
}
