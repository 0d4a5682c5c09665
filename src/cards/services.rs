use super::membership::{self, StoreCollectionEntry};
use super::models::CardDetect;
use crate::collections::models::Collection;
use crate::collections::services::ensure_default_collection;
use crate::common::{generate_card_detect_id, ApiError};
use sqlx::SqlitePool;
use tracing::info;

/// Field values for a new card record, resolved by the handler. Detail
/// blobs arrive already re-serialized to canonical JSON text.
pub struct NewCardRecord {
    pub card_name: Option<String>,
    pub front_image_url: Option<String>,
    pub back_image_url: Option<String>,
    pub front_details: String,
    pub back_details: String,
    pub price_checker_details: String,
    pub is_favorite: bool,
    pub store_collection: Vec<StoreCollectionEntry>,
}

/// Partial update for an existing card. `None` fields keep their stored
/// value; `store_collection` replaces the whole membership list.
#[derive(Default)]
pub struct CardUpdate {
    pub card_name: Option<String>,
    pub front_image_url: Option<String>,
    pub back_image_url: Option<String>,
    pub front_details: Option<String>,
    pub back_details: Option<String>,
    pub price_checker_details: Option<String>,
    pub is_favorite: Option<bool>,
    pub store_collection: Option<Vec<StoreCollectionEntry>>,
}

pub struct CardsService {
    db: SqlitePool,
}

impl CardsService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    // ============================================================================
    // Card CRUD Operations
    // ============================================================================

    /// Insert a new card record. The user's default collection is appended
    /// to the membership list, skipping it if the caller already sent it.
    pub async fn create(
        &self,
        user_id: &str,
        record: NewCardRecord,
    ) -> Result<CardDetect, ApiError> {
        let default_collection = ensure_default_collection(&self.db, user_id).await?;

        let mut entries = record.store_collection;
        membership::add_entry(&mut entries, &default_collection.id, &default_collection.name);
        let serialized = membership::serialize_membership(&entries);

        let id = generate_card_detect_id();
        sqlx::query(
            r#"
            INSERT INTO card_detects (
                id, user_id, card_name, front_image_url, back_image_url,
                front_details, back_details, price_checker_details,
                is_favorite, store_collection
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&record.card_name)
        .bind(&record.front_image_url)
        .bind(&record.back_image_url)
        .bind(&record.front_details)
        .bind(&record.back_details)
        .bind(&record.price_checker_details)
        .bind(record.is_favorite)
        .bind(&serialized)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(user_id = %user_id, card_id = %id, "Card record created");

        self.get_by_id(user_id, &id).await
    }

    /// All of the user's cards, newest first
    pub async fn list(&self, user_id: &str) -> Result<Vec<CardDetect>, ApiError> {
        sqlx::query_as::<_, CardDetect>(
            r#"
            SELECT id, user_id, card_name, front_image_url, back_image_url,
                   front_details, back_details, price_checker_details,
                   is_favorite, store_collection, created_at, updated_at
            FROM card_detects
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)
    }

    /// The user's favorited cards, newest first
    pub async fn favorites(&self, user_id: &str) -> Result<Vec<CardDetect>, ApiError> {
        sqlx::query_as::<_, CardDetect>(
            r#"
            SELECT id, user_id, card_name, front_image_url, back_image_url,
                   front_details, back_details, price_checker_details,
                   is_favorite, store_collection, created_at, updated_at
            FROM card_detects
            WHERE user_id = ? AND is_favorite = 1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)
    }

    /// Cards whose membership list references the given collection
    pub async fn by_collection(
        &self,
        user_id: &str,
        collection_id: &str,
    ) -> Result<Vec<CardDetect>, ApiError> {
        let cards = self.list(user_id).await?;
        Ok(cards
            .into_iter()
            .filter(|card| membership::contains_collection(&card.membership(), collection_id))
            .collect())
    }

    pub async fn get_by_id(&self, user_id: &str, card_id: &str) -> Result<CardDetect, ApiError> {
        self.fetch_owned(user_id, card_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Card not found".to_string()))
    }

    /// Apply a partial update and return the stored record
    pub async fn update(
        &self,
        user_id: &str,
        card_id: &str,
        update: CardUpdate,
    ) -> Result<CardDetect, ApiError> {
        let card = self.get_by_id(user_id, card_id).await?;

        let card_name = update.card_name.or(card.card_name);
        let front_image_url = update.front_image_url.or(card.front_image_url);
        let back_image_url = update.back_image_url.or(card.back_image_url);
        let front_details = update.front_details.or(card.front_details);
        let back_details = update.back_details.or(card.back_details);
        let price_checker_details = update.price_checker_details.or(card.price_checker_details);
        let is_favorite = update.is_favorite.unwrap_or(card.is_favorite);
        let store_collection = match update.store_collection {
            Some(entries) => membership::serialize_membership(&entries),
            None => card.store_collection,
        };

        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE card_detects
            SET card_name = ?, front_image_url = ?, back_image_url = ?,
                front_details = ?, back_details = ?, price_checker_details = ?,
                is_favorite = ?, store_collection = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&card_name)
        .bind(&front_image_url)
        .bind(&back_image_url)
        .bind(&front_details)
        .bind(&back_details)
        .bind(&price_checker_details)
        .bind(is_favorite)
        .bind(&store_collection)
        .bind(&now)
        .bind(card_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(user_id = %user_id, card_id = %card_id, "Card record updated");

        self.get_by_id(user_id, card_id).await
    }

    pub async fn delete(&self, user_id: &str, card_id: &str) -> Result<(), ApiError> {
        self.get_by_id(user_id, card_id).await?;

        sqlx::query("DELETE FROM card_detects WHERE id = ? AND user_id = ?")
            .bind(card_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        info!(user_id = %user_id, card_id = %card_id, "Card record deleted");

        Ok(())
    }

    /// Flip the favorite flag and return the stored record
    pub async fn toggle_favorite(
        &self,
        user_id: &str,
        card_id: &str,
    ) -> Result<CardDetect, ApiError> {
        let card = self.get_by_id(user_id, card_id).await?;
        let new_state = !card.is_favorite;

        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("UPDATE card_detects SET is_favorite = ?, updated_at = ? WHERE id = ?")
            .bind(new_state)
            .bind(&now)
            .bind(card_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        self.get_by_id(user_id, card_id).await
    }

    // ============================================================================
    // Collection Membership
    // ============================================================================

    /// Append a collection to the card's membership list. Both the card
    /// and the collection must belong to the user. Re-adding an existing
    /// entry is a no-op success.
    pub async fn add_to_collection(
        &self,
        user_id: &str,
        card_id: &str,
        collection_id: &str,
    ) -> Result<CardDetect, ApiError> {
        let card = self.fetch_owned(user_id, card_id).await?;
        let collection = sqlx::query_as::<_, Collection>(
            r#"
            SELECT id, user_id, name, is_default, created_at, updated_at
            FROM collections
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(collection_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        let (card, collection) = match (card, collection) {
            (Some(card), Some(collection)) => (card, collection),
            _ => {
                return Err(ApiError::BadRequest(
                    "Invalid card or collection".to_string(),
                ))
            }
        };

        let mut entries = card.membership();
        if membership::add_entry(&mut entries, &collection.id, &collection.name) {
            self.save_membership(&card.id, &entries).await?;
            info!(
                user_id = %user_id,
                card_id = %card_id,
                collection_id = %collection_id,
                "Card added to collection"
            );
        }

        self.get_by_id(user_id, card_id).await
    }

    /// Drop a collection from the card's membership list
    pub async fn remove_from_collection(
        &self,
        user_id: &str,
        card_id: &str,
        collection_id: &str,
    ) -> Result<CardDetect, ApiError> {
        let card = self.get_by_id(user_id, card_id).await?;

        let mut entries = card.membership();
        if !membership::remove_entry(&mut entries, collection_id) {
            return Err(ApiError::BadRequest(
                "Collection not found in card".to_string(),
            ));
        }

        self.save_membership(&card.id, &entries).await?;
        info!(
            user_id = %user_id,
            card_id = %card_id,
            collection_id = %collection_id,
            "Card removed from collection"
        );

        self.get_by_id(user_id, card_id).await
    }

    async fn save_membership(
        &self,
        card_id: &str,
        entries: &[StoreCollectionEntry],
    ) -> Result<(), ApiError> {
        let serialized = membership::serialize_membership(entries);
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("UPDATE card_detects SET store_collection = ?, updated_at = ? WHERE id = ?")
            .bind(&serialized)
            .bind(&now)
            .bind(card_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    async fn fetch_owned(
        &self,
        user_id: &str,
        card_id: &str,
    ) -> Result<Option<CardDetect>, ApiError> {
        sqlx::query_as::<_, CardDetect>(
            r#"
            SELECT id, user_id, card_name, front_image_url, back_image_url,
                   front_details, back_details, price_checker_details,
                   is_favorite, store_collection, created_at, updated_at
            FROM card_detects
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(card_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)
    }
}
