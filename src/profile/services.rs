use super::models::ProfileUpdate;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::User;
use crate::common::ApiError;
use sqlx::SqlitePool;
use tracing::info;

pub struct ProfileService {
    db: SqlitePool,
}

impl ProfileService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    // ============================================================================
    // Profile
    // ============================================================================

    /// The caller's live user row
    pub async fn fetch_profile(&self, user_id: &str) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ? AND is_deleted = 0")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?
            .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))
    }

    /// Merge sent fields into the row. A NULL bind keeps the stored value,
    /// so an explicitly sent empty string still overwrites.
    pub async fn apply_update(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<User, ApiError> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE users
            SET fullname = COALESCE(?, fullname),
                date_of_birth = COALESCE(?, date_of_birth),
                profile_image = COALESCE(?, profile_image),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.fullname.as_deref())
        .bind(update.date_of_birth.as_deref())
        .bind(update.profile_image.as_deref())
        .bind(&now)
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(user_id = %user_id, "User profile updated");

        self.fetch_profile(user_id).await
    }

    // ============================================================================
    // Account Credentials
    // ============================================================================

    /// Verify the old password and store a hash of the new one. Accounts
    /// without a stored hash (social logins) fail the old-password gate.
    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ? AND is_deleted = 0")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let old_matches = user
            .password_hash
            .as_deref()
            .map(|hash| verify_password(old_password, hash))
            .unwrap_or(false);
        if !old_matches {
            return Err(ApiError::Unauthorized(
                "Old password is incorrect".to_string(),
            ));
        }

        let new_hash = hash_password(new_password)?;
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(&new_hash)
            .bind(&now)
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        info!(user_id = %user_id, "Password changed");

        Ok(())
    }

    /// Soft delete marks the row and keeps the data; permanent delete
    /// drops the user row itself. Card and collection rows stay behind
    /// either way.
    pub async fn delete_account(&self, user_id: &str, permanently: bool) -> Result<(), ApiError> {
        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;
        if existing.is_none() {
            return Err(ApiError::NotFound("User not found".to_string()));
        }

        if permanently {
            sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(user_id)
                .execute(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;

            info!(user_id = %user_id, "Account permanently deleted");
        } else {
            let now = chrono::Utc::now().to_rfc3339();
            sqlx::query("UPDATE users SET is_deleted = 1, updated_at = ? WHERE id = ?")
                .bind(&now)
                .bind(user_id)
                .execute(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;

            info!(user_id = %user_id, "Account soft deleted");
        }

        Ok(())
    }
}
