/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration,
 * focusing on the chat database connection.
 *
 * # Configuration Sources
 *
 * Configuration is loaded from environment variables, with sensible
 * defaults for local development.
 *
 * # Error Handling
 *
 * Configuration errors are logged but do not prevent server startup.
 * Services that fail to initialize are set to `None` and the server
 * continues without them.
 */

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::backend::chat::db::run_migrations;

/// Default SQLite database when `DATABASE_URL` is not set
const DEFAULT_DATABASE_URL: &str = "sqlite://annosync.db?mode=rwc";

/// Database configuration result
///
/// Contains the connection pool if successfully configured, or `None` if
/// the database is not available.
pub type DatabaseConfig = Option<SqlitePool>;

/// Load and initialize the chat database connection pool
///
/// This function:
/// 1. Reads `DATABASE_URL` from environment (SQLite file fallback)
/// 2. Creates a connection pool
/// 3. Runs database migrations
///
/// # Returns
///
/// - `Some(SqlitePool)` if the database is successfully configured
/// - `None` if connection or migration fails; the server runs without chat
pub async fn load_database() -> DatabaseConfig {
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        tracing::info!("DATABASE_URL not set, using {}", DEFAULT_DATABASE_URL);
        DEFAULT_DATABASE_URL.to_string()
    });

    tracing::info!("Connecting to database...");
    let pool = match SqlitePoolOptions::new().connect(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Chat features will be disabled.");
            return None;
        }
    };

    tracing::info!("Running database migrations...");
    if let Err(e) = run_migrations(&pool).await {
        tracing::error!("Failed to run database migrations: {:?}", e);
        tracing::warn!("Chat features will be disabled.");
        return None;
    }

    tracing::info!("Database ready");
    Some(pool)
}
