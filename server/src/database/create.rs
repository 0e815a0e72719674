use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use shared::types::server_config::DatabaseConfig;

/// Current schema version.  Bump this whenever the schema changes and add a
/// corresponding migration arm in `run_migrations`.
const SCHEMA_VERSION: i64 = 1;

/// Open the pool described by `config` and make sure the schema is current.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // An in-memory database dies with its last connection, so keep exactly
    // one and never recycle it.
    let in_memory = config.url.contains(":memory:");
    let mut pool_options = SqlitePoolOptions::new().max_connections(if in_memory {
        1
    } else {
        config.max_connections
    });
    if in_memory {
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    let pool = pool_options.connect_with(options).await?;
    create_tables(&pool).await?;

    info!("Database ready at {}", config.url);
    Ok(pool)
}

/// Initialize the database schema and run any pending migrations.
pub async fn create_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    create_schema(pool).await?;
    run_migrations(pool).await?;
    Ok(())
}

/// Create all tables for a brand-new database.
async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            user_id  INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT    NOT NULL UNIQUE,
            email    TEXT    NOT NULL UNIQUE,
            password TEXT    NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Items are owned by exactly one user for their whole life.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS items (
            item_id     INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL,
            title       TEXT    NOT NULL,
            description TEXT    NOT NULL DEFAULT '',
            status      INTEGER NOT NULL,
            created_at  TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(user_id)
        )",
    )
    .execute(pool)
    .await?;

    // Token and user id are nullable: logout clears them before the row goes.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS sessions (
            session_id TEXT    PRIMARY KEY,
            token      TEXT,
            user_id    INTEGER,
            expires_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // --- Indexes --------------------------------------------------------
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_items_owner_order ON items(user_id, status, item_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Apply any schema migrations required to reach `SCHEMA_VERSION`.
///
/// Uses `PRAGMA user_version` as the migration counter.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let current_version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    info!(
        "Database schema at version {}; target version {}. Running migrations…",
        current_version, SCHEMA_VERSION
    );

    // v0 → v1 is the initial schema created above; nothing to rewrite.

    // Add future migration arms here:
    // if current_version < 2 { ... }

    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(pool)
        .await?;

    info!("Schema version set to {}.", SCHEMA_VERSION);
    Ok(())
}

/// Fresh in-memory database with the schema applied.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    connect(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    })
    .await
    .expect("in-memory database")
}
