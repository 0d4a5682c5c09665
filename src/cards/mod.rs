//! Card records: scanned card storage, favorites and collection membership

pub mod handlers;
pub mod membership;
pub mod models;
pub mod routes;
pub mod services;


pub use models::CardDetect;
pub use routes::cards_routes;
