// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::{AWSService, AppleService, PriceChartingService};

/// Application state containing database pool, services, and configuration.
/// Outbound HTTP clients live inside the services that use them.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: String,
    pub aws_service: Arc<AWSService>,
    pub apple_service: Arc<AppleService>,
    pub price_service: Arc<PriceChartingService>,
}
