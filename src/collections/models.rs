//! Collection data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Collection database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub is_default: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Collection payload for the listing endpoint, including the item count
/// computed from the membership lists at read time
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResponse {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub is_default: bool,
    pub item_count: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl CollectionResponse {
    pub fn new(collection: Collection, item_count: i64) -> Self {
        Self {
            id: collection.id,
            user_id: collection.user_id,
            name: collection.name,
            is_default: collection.is_default,
            item_count,
            created_at: collection.created_at,
            updated_at: collection.updated_at,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CreateCollectionRequest {
    pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct RenameCollectionRequest {
    pub name: String,
}
