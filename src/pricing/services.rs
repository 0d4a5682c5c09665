use crate::common::ApiError;
use sqlx::SqlitePool;
use tracing::info;

/// Favorite external catalog ids, stored as a JSON array on the user row
pub struct FavoritesService {
    db: SqlitePool,
}

impl FavoritesService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Toggle the id in the stored list. Returns true when the id is now
    /// favorited.
    pub async fn toggle(&self, user_id: &str, card_id: &str) -> Result<bool, ApiError> {
        let mut favorites = self.list_ids(user_id).await?;

        let already_favorite = favorites.iter().any(|id| id == card_id);
        if already_favorite {
            favorites.retain(|id| id != card_id);
        } else {
            favorites.push(card_id.to_string());
        }

        let serialized = serde_json::to_string(&favorites).unwrap_or_else(|_| "[]".to_string());
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("UPDATE users SET favorite_card_ids = ?, updated_at = ? WHERE id = ?")
            .bind(&serialized)
            .bind(&now)
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        info!(
            user_id = %user_id,
            card_id = %card_id,
            now_favorite = !already_favorite,
            "Price-checker favorite toggled"
        );

        Ok(!already_favorite)
    }

    /// The stored id list; an absent or unreadable value reads as empty
    pub async fn list_ids(&self, user_id: &str) -> Result<Vec<String>, ApiError> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT favorite_card_ids FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_one(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;

        Ok(stored
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default())
    }
}
