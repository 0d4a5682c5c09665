use super::models::{Collection, CollectionResponse};
use crate::cards::membership;
use crate::common::{generate_collection_id, ApiError};
use sqlx::SqlitePool;
use tracing::info;

/// Name of the default collection every user owns
pub const DEFAULT_COLLECTION_NAME: &str = "All";

/// Returns the user's default collection, creating it when missing.
/// Account creation and collection listing are not transactional, so the
/// default is recreated on read rather than assumed to exist.
pub async fn ensure_default_collection(
    db: &SqlitePool,
    user_id: &str,
) -> Result<Collection, ApiError> {
    let existing = sqlx::query_as::<_, Collection>(
        r#"
        SELECT id, user_id, name, is_default, created_at, updated_at
        FROM collections
        WHERE user_id = ? AND is_default = 1 AND name = ?
        "#,
    )
    .bind(user_id)
    .bind(DEFAULT_COLLECTION_NAME)
    .fetch_optional(db)
    .await
    .map_err(ApiError::DatabaseError)?;

    if let Some(collection) = existing {
        return Ok(collection);
    }

    let id = generate_collection_id();
    sqlx::query("INSERT INTO collections (id, user_id, name, is_default) VALUES (?, ?, ?, 1)")
        .bind(&id)
        .bind(user_id)
        .bind(DEFAULT_COLLECTION_NAME)
        .execute(db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(user_id = %user_id, collection_id = %id, "Created default collection");

    fetch_collection(db, &id).await
}

async fn fetch_collection(db: &SqlitePool, collection_id: &str) -> Result<Collection, ApiError> {
    sqlx::query_as::<_, Collection>(
        r#"
        SELECT id, user_id, name, is_default, created_at, updated_at
        FROM collections
        WHERE id = ?
        "#,
    )
    .bind(collection_id)
    .fetch_one(db)
    .await
    .map_err(ApiError::DatabaseError)
}

pub struct CollectionsService {
    db: SqlitePool,
}

impl CollectionsService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    // ============================================================================
    // Collection CRUD Operations
    // ============================================================================

    /// All of the user's collections, oldest first, each with an item count
    /// tallied from the cards' membership lists on this call
    pub async fn list_with_counts(
        &self,
        user_id: &str,
    ) -> Result<Vec<CollectionResponse>, ApiError> {
        ensure_default_collection(&self.db, user_id).await?;

        let collections = sqlx::query_as::<_, Collection>(
            r#"
            SELECT id, user_id, name, is_default, created_at, updated_at
            FROM collections
            WHERE user_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        let membership_lists: Vec<String> =
            sqlx::query_scalar("SELECT store_collection FROM card_detects WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;

        let counts = membership::membership_counts(&membership_lists);

        Ok(collections
            .into_iter()
            .map(|collection| {
                let item_count = counts.get(&collection.id).copied().unwrap_or(0);
                CollectionResponse::new(collection, item_count)
            })
            .collect())
    }

    /// Create a non-default collection
    pub async fn create(&self, user_id: &str, name: &str) -> Result<Collection, ApiError> {
        let id = generate_collection_id();

        sqlx::query("INSERT INTO collections (id, user_id, name, is_default) VALUES (?, ?, ?, 0)")
            .bind(&id)
            .bind(user_id)
            .bind(name)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        info!(
            user_id = %user_id,
            collection_id = %id,
            name = %name,
            "Collection created"
        );

        fetch_collection(&self.db, &id).await
    }

    /// Rename a non-default collection and rewrite the cached name on
    /// every membership entry referencing it
    pub async fn rename(
        &self,
        user_id: &str,
        collection_id: &str,
        new_name: &str,
    ) -> Result<Collection, ApiError> {
        match self.fetch_owned(user_id, collection_id).await? {
            Some(Collection {
                is_default: false, ..
            }) => {}
            _ => {
                return Err(ApiError::BadRequest(
                    "Cannot rename default or non-existent collection".to_string(),
                ))
            }
        }

        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("UPDATE collections SET name = ?, updated_at = ? WHERE id = ?")
            .bind(new_name)
            .bind(&now)
            .bind(collection_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        self.rewrite_membership_names(user_id, collection_id, new_name)
            .await?;

        info!(
            user_id = %user_id,
            collection_id = %collection_id,
            new_name = %new_name,
            "Collection renamed"
        );

        fetch_collection(&self.db, collection_id).await
    }

    /// Delete a non-default collection and drop its membership entries
    /// from the user's cards
    pub async fn delete(&self, user_id: &str, collection_id: &str) -> Result<(), ApiError> {
        match self.fetch_owned(user_id, collection_id).await? {
            Some(Collection {
                is_default: false, ..
            }) => {}
            _ => {
                return Err(ApiError::BadRequest(
                    "Cannot delete default or non-existent collection".to_string(),
                ))
            }
        }

        sqlx::query("DELETE FROM collections WHERE id = ?")
            .bind(collection_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        self.remove_membership_entries(user_id, collection_id)
            .await?;

        info!(
            user_id = %user_id,
            collection_id = %collection_id,
            "Collection deleted"
        );

        Ok(())
    }

    // ============================================================================
    // Membership Maintenance
    // ============================================================================

    async fn fetch_owned(
        &self,
        user_id: &str,
        collection_id: &str,
    ) -> Result<Option<Collection>, ApiError> {
        sqlx::query_as::<_, Collection>(
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
        .map_err(ApiError::DatabaseError)
    }

    async fn rewrite_membership_names(
        &self,
        user_id: &str,
        collection_id: &str,
        new_name: &str,
    ) -> Result<(), ApiError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, store_collection FROM card_detects WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;

        let now = chrono::Utc::now().to_rfc3339();
        for (card_id, raw) in rows {
            let mut entries = membership::parse_membership(&raw);
            if !membership::rename_entries(&mut entries, collection_id, new_name) {
                continue;
            }

            let serialized = membership::serialize_membership(&entries);
            sqlx::query("UPDATE card_detects SET store_collection = ?, updated_at = ? WHERE id = ?")
                .bind(&serialized)
                .bind(&now)
                .bind(&card_id)
                .execute(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;
        }

        Ok(())
    }

    async fn remove_membership_entries(
        &self,
        user_id: &str,
        collection_id: &str,
    ) -> Result<(), ApiError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, store_collection FROM card_detects WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;

        let now = chrono::Utc::now().to_rfc3339();
        for (card_id, raw) in rows {
            let mut entries = membership::parse_membership(&raw);
            if !membership::remove_entry(&mut entries, collection_id) {
                continue;
            }

            let serialized = membership::serialize_membership(&entries);
            sqlx::query("UPDATE card_detects SET store_collection = ?, updated_at = ? WHERE id = ?")
                .bind(&serialized)
                .bind(&now)
                .bind(&card_id)
                .execute(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;
        }

        Ok(())
    }
}
