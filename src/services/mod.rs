// src/services/mod.rs
//
// Shared services module containing business logic services
// that can be used across different domain modules

pub mod apple;
pub mod aws;
pub mod email;
pub mod price_charting;

// Re-export commonly used types for convenience
pub use apple::AppleService;
pub use aws::AWSService;
pub use price_charting::PriceChartingService;
