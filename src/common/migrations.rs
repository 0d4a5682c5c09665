// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Run all database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Only drop tables if RESET_DB environment variable is set to "true"
    // This prevents data loss on server restarts
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("⚠️  RESET_DB=true - Dropping all tables and recreating schema...");
        drop_all_tables(pool).await?;
        info!("✅ Dropped old tables");
    } else {
        info!("ℹ️  Skipping table drop (RESET_DB not set). Tables will be created if they don't exist.");
    }

    create_user_tables(pool).await?;
    create_collection_tables(pool).await?;
    create_card_tables(pool).await?;
    create_indexes(pool).await?;

    info!("✅ Database migration completed successfully!");

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Drop tables in reverse dependency order
    let tables = vec!["card_detects", "collections", "users"];

    for table in tables {
        let _ = sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await;
    }

    Ok(())
}

async fn create_user_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Users table
    // Soft-deleted rows keep their email; the partial unique index below only
    // guards the live ones, so a deleted account frees its address.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT,
            password_hash TEXT,
            fullname TEXT,
            profile_image TEXT,
            provider TEXT NOT NULL DEFAULT 'email',
            provider_id TEXT,
            role TEXT NOT NULL DEFAULT 'user',
            otp INTEGER,
            otp_expires_at TEXT,
            is_verified INTEGER NOT NULL DEFAULT 0,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            date_of_birth TEXT,
            favorite_card_ids TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_collection_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Collections table (one default "All" per user)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_card_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Card detect records. The three detail columns and store_collection hold
    // JSON as TEXT; store_collection is an array of {id, name} memberships.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS card_detects (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            card_name TEXT,
            front_image_url TEXT,
            back_image_url TEXT,
            front_details TEXT,
            back_details TEXT,
            price_checker_details TEXT,
            is_favorite INTEGER NOT NULL DEFAULT 0,
            store_collection TEXT NOT NULL DEFAULT '[]',
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = vec![
        // User indexes
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email_active ON users(email) WHERE email IS NOT NULL AND is_deleted = 0",
        // Collection indexes
        "CREATE INDEX IF NOT EXISTS idx_collections_user_id ON collections(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_collections_user_default ON collections(user_id, is_default)",
        // Card indexes
        "CREATE INDEX IF NOT EXISTS idx_card_detects_user_id ON card_detects(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_card_detects_user_created ON card_detects(user_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_card_detects_user_favorite ON card_detects(user_id, is_favorite)",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    Ok(())
}
