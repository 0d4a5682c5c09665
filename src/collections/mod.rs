//! # Collections Module
//!
//! User-defined collections grouping card records. Every user owns one
//! default "All" collection that cannot be renamed or deleted; item counts
//! are tallied from the cards' membership lists on every listing.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;

#[cfg(test)]
mod tests;

pub use models::Collection;
pub use routes::collections_routes;
