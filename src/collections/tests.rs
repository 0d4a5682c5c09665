//! Tests for collections module
//!
//! Covers the default-collection invariant, the live item counts and the
//! membership rewrite on rename/delete.

#[cfg(test)]
mod tests {
    use super::super::services::{
        ensure_default_collection, CollectionsService, DEFAULT_COLLECTION_NAME,
    };
    use crate::cards::membership::{parse_membership, serialize_membership, StoreCollectionEntry};
    use crate::common::migrations::run_migrations;
    use crate::common::ApiError;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();

        pool
    }

    async fn insert_user(pool: &SqlitePool, id: &str) {
        sqlx::query("INSERT INTO users (id, email) VALUES (?, ?)")
            .bind(id)
            .bind(format!("{}@example.com", id))
            .execute(pool)
            .await
            .unwrap();
    }

    async fn insert_card(pool: &SqlitePool, id: &str, user_id: &str, membership_raw: &str) {
        sqlx::query("INSERT INTO card_detects (id, user_id, store_collection) VALUES (?, ?, ?)")
            .bind(id)
            .bind(user_id)
            .bind(membership_raw)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_ensure_default_collection_creates_once() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_TEST01").await;

        let first = ensure_default_collection(&pool, "U_TEST01").await.unwrap();
        assert_eq!(first.name, DEFAULT_COLLECTION_NAME);
        assert!(first.is_default);

        // Second call returns the same collection instead of a duplicate
        let second = ensure_default_collection(&pool, "U_TEST01").await.unwrap();
        assert_eq!(second.id, first.id);

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM collections WHERE user_id = 'U_TEST01'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_list_self_heals_default_collection() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_TEST01").await;

        let service = CollectionsService::new(pool.clone());
        let collections = service.list_with_counts("U_TEST01").await.unwrap();

        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].name, DEFAULT_COLLECTION_NAME);
        assert!(collections[0].is_default);
        assert_eq!(collections[0].item_count, 0);
    }

    #[tokio::test]
    async fn test_item_counts_follow_membership_lists() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_TEST01").await;

        let default = ensure_default_collection(&pool, "U_TEST01").await.unwrap();
        let service = CollectionsService::new(pool.clone());
        let binder = service.create("U_TEST01", "Binder").await.unwrap();

        let both = serialize_membership(&[
            StoreCollectionEntry {
                id: default.id.clone(),
                name: default.name.clone(),
            },
            StoreCollectionEntry {
                id: binder.id.clone(),
                name: binder.name.clone(),
            },
        ]);
        let default_only = serialize_membership(&[StoreCollectionEntry {
            id: default.id.clone(),
            name: default.name.clone(),
        }]);

        insert_card(&pool, "D_CARD01", "U_TEST01", &both).await;
        insert_card(&pool, "D_CARD02", "U_TEST01", &default_only).await;

        let collections = service.list_with_counts("U_TEST01").await.unwrap();
        assert_eq!(collections.len(), 2);

        let default_row = collections.iter().find(|c| c.id == default.id).unwrap();
        let binder_row = collections.iter().find(|c| c.id == binder.id).unwrap();
        assert_eq!(default_row.item_count, 2);
        assert_eq!(binder_row.item_count, 1);
    }

    #[tokio::test]
    async fn test_counts_ignore_other_users_cards() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_OWNER").await;
        insert_user(&pool, "U_OTHER").await;

        let default = ensure_default_collection(&pool, "U_OWNER").await.unwrap();
        let raw = serialize_membership(&[StoreCollectionEntry {
            id: default.id.clone(),
            name: default.name.clone(),
        }]);

        // A card on another account referencing the same id must not count
        insert_card(&pool, "D_FOREIGN", "U_OTHER", &raw).await;

        let service = CollectionsService::new(pool.clone());
        let collections = service.list_with_counts("U_OWNER").await.unwrap();
        assert_eq!(collections[0].item_count, 0);
    }

    #[tokio::test]
    async fn test_rename_rewrites_cached_membership_names() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_TEST01").await;

        let service = CollectionsService::new(pool.clone());
        let binder = service.create("U_TEST01", "Binder").await.unwrap();

        let raw = serialize_membership(&[StoreCollectionEntry {
            id: binder.id.clone(),
            name: binder.name.clone(),
        }]);
        insert_card(&pool, "D_CARD01", "U_TEST01", &raw).await;

        let renamed = service
            .rename("U_TEST01", &binder.id, "Trade Stack")
            .await
            .unwrap();
        assert_eq!(renamed.name, "Trade Stack");

        let stored: String =
            sqlx::query_scalar("SELECT store_collection FROM card_detects WHERE id = 'D_CARD01'")
                .fetch_one(&pool)
                .await
                .unwrap();
        let entries = parse_membership(&stored);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Trade Stack");
    }

    #[tokio::test]
    async fn test_rename_rejects_default_and_missing() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_TEST01").await;

        let default = ensure_default_collection(&pool, "U_TEST01").await.unwrap();
        let service = CollectionsService::new(pool.clone());

        let err = service
            .rename("U_TEST01", &default.id, "Renamed")
            .await
            .unwrap_err();
        match err {
            ApiError::BadRequest(msg) => {
                assert_eq!(msg, "Cannot rename default or non-existent collection")
            }
            other => panic!("unexpected error: {}", other),
        }

        let err = service
            .rename("U_TEST01", "C_MISSING", "Renamed")
            .await
            .unwrap_err();
        match err {
            ApiError::BadRequest(msg) => {
                assert_eq!(msg, "Cannot rename default or non-existent collection")
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_rename_scoped_to_owner() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_OWNER").await;
        insert_user(&pool, "U_OTHER").await;

        let service = CollectionsService::new(pool.clone());
        let binder = service.create("U_OWNER", "Binder").await.unwrap();

        // Another user renaming by id sees it as non-existent
        let err = service
            .rename("U_OTHER", &binder.id, "Stolen")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_membership_entries() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_TEST01").await;

        let default = ensure_default_collection(&pool, "U_TEST01").await.unwrap();
        let service = CollectionsService::new(pool.clone());
        let binder = service.create("U_TEST01", "Binder").await.unwrap();

        let raw = serialize_membership(&[
            StoreCollectionEntry {
                id: default.id.clone(),
                name: default.name.clone(),
            },
            StoreCollectionEntry {
                id: binder.id.clone(),
                name: binder.name.clone(),
            },
        ]);
        insert_card(&pool, "D_CARD01", "U_TEST01", &raw).await;

        service.delete("U_TEST01", &binder.id).await.unwrap();

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM collections WHERE user_id = 'U_TEST01'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(remaining, 1);

        let stored: String =
            sqlx::query_scalar("SELECT store_collection FROM card_detects WHERE id = 'D_CARD01'")
                .fetch_one(&pool)
                .await
                .unwrap();
        let entries = parse_membership(&stored);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, default.id);
    }

    #[tokio::test]
    async fn test_delete_rejects_default() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_TEST01").await;

        let default = ensure_default_collection(&pool, "U_TEST01").await.unwrap();
        let service = CollectionsService::new(pool.clone());

        let err = service.delete("U_TEST01", &default.id).await.unwrap_err();
        match err {
            ApiError::BadRequest(msg) => {
                assert_eq!(msg, "Cannot delete default or non-existent collection")
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
