//! Tests for profile module
//!
//! Covers profile fetch/update merging, the password-change gate and the
//! soft versus permanent account deletion paths.

#[cfg(test)]
mod tests {
    use super::super::models::{ChangePasswordRequest, ProfileUpdate};
    use super::super::services::ProfileService;
    use crate::auth::password::{hash_password, verify_password};
    use crate::common::migrations::run_migrations;
    use crate::common::{ApiError, Validator};
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

    async fn insert_user(pool: &SqlitePool, id: &str, password_hash: Option<&str>) {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, fullname, date_of_birth, is_verified)
             VALUES (?, ?, ?, 'Test Player', '1990-01-01', 1)",
        )
        .bind(id)
        .bind(format!("{}@example.com", id))
        .bind(password_hash)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_fetch_profile_excludes_deleted() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_TEST01", None).await;

        let service = ProfileService::new(pool.clone());
        let user = service.fetch_profile("U_TEST01").await.unwrap();
        assert_eq!(user.fullname.as_deref(), Some("Test Player"));

        sqlx::query("UPDATE users SET is_deleted = 1 WHERE id = 'U_TEST01'")
            .execute(&pool)
            .await
            .unwrap();

        let err = service.fetch_profile("U_TEST01").await.unwrap_err();
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "User not found."),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_apply_update_merges_only_sent_fields() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_TEST01", None).await;

        let service = ProfileService::new(pool.clone());

        let updated = service
            .apply_update(
                "U_TEST01",
                ProfileUpdate {
                    fullname: Some("New Name".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.fullname.as_deref(), Some("New Name"));
        assert_eq!(updated.date_of_birth.as_deref(), Some("1990-01-01"));

        // A sent empty string overwrites, unlike an absent field
        let updated = service
            .apply_update(
                "U_TEST01",
                ProfileUpdate {
                    fullname: Some("".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.fullname.as_deref(), Some(""));
        assert_eq!(updated.date_of_birth.as_deref(), Some("1990-01-01"));
    }

    #[tokio::test]
    async fn test_change_password_requires_matching_old() {
        let pool = setup_test_db().await;
        let hash = hash_password("oldpass123").unwrap();
        insert_user(&pool, "U_TEST01", Some(&hash)).await;

        let service = ProfileService::new(pool.clone());

        let err = service
            .change_password("U_TEST01", "wrongpass", "newpass123")
            .await
            .unwrap_err();
        match err {
            ApiError::Unauthorized(msg) => assert_eq!(msg, "Old password is incorrect"),
            other => panic!("unexpected error: {}", other),
        }

        service
            .change_password("U_TEST01", "oldpass123", "newpass123")
            .await
            .unwrap();

        let stored: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE id = 'U_TEST01'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(verify_password("newpass123", &stored.unwrap()));
    }

    #[tokio::test]
    async fn test_change_password_rejects_social_account() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_TEST01", None).await;

        let service = ProfileService::new(pool.clone());

        // No stored hash means the old-password gate can never pass
        let err = service
            .change_password("U_TEST01", "anything", "newpass123")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_delete_account_soft_and_permanent() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_SOFT", None).await;
        insert_user(&pool, "U_HARD", None).await;

        let service = ProfileService::new(pool.clone());

        service.delete_account("U_SOFT", false).await.unwrap();
        let is_deleted: bool =
            sqlx::query_scalar("SELECT is_deleted FROM users WHERE id = 'U_SOFT'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(is_deleted);
        assert!(matches!(
            service.fetch_profile("U_SOFT").await.unwrap_err(),
            ApiError::NotFound(_)
        ));

        service.delete_account("U_HARD", true).await.unwrap();
        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = 'U_HARD'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(remaining, 0);

        let err = service.delete_account("U_HARD", true).await.unwrap_err();
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "User not found"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_change_password_validation_rules() {
        let valid = ChangePasswordRequest {
            old_password: "oldpass123".to_string(),
            new_password: "newpass123".to_string(),
            confirm_new_password: "newpass123".to_string(),
        };
        assert!(valid.validate(&valid).is_valid());

        let mismatched = ChangePasswordRequest {
            old_password: "oldpass123".to_string(),
            new_password: "newpass123".to_string(),
            confirm_new_password: "different".to_string(),
        };
        let result = mismatched.validate(&mismatched);
        assert!(!result.is_valid());
        assert_eq!(result.errors[0].message, "Passwords do not match");

        let short = ChangePasswordRequest {
            old_password: "oldpass123".to_string(),
            new_password: "abc".to_string(),
            confirm_new_password: "abc".to_string(),
        };
        let result = short.validate(&short);
        assert!(!result.is_valid());
        assert_eq!(result.errors[0].field, "newPassword");
    }
}
