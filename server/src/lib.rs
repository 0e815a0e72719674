pub mod auth;
pub mod database;
pub mod error;
pub mod handlers;
pub mod server;
pub mod tower_middle;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use sqlx::SqlitePool;
use tracing::info;

use shared::types::server_config::{AppConfig, SessionBackend};

use auth::{
    AuthGate, CredentialHasher, MemorySessionStore, SessionStore, SqliteSessionStore, TokenIssuer,
};

/// Everything a request handler needs, built once at startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: SqlitePool,
    pub sessions: Arc<dyn SessionStore>,
    pub tokens: TokenIssuer,
    pub hasher: CredentialHasher,
}

impl AppState {
    /// Open the database and wire up the auth components from `config`.
    pub async fn build(config: AppConfig) -> Result<Self> {
        let db = database::connect(&config.database)
            .await
            .with_context(|| format!("Failed to open database {}", config.database.url))?;
        Self::with_pool(config, db)
    }

    /// Same as [`build`](Self::build) over an already-open pool.
    pub fn with_pool(config: AppConfig, db: SqlitePool) -> Result<Self> {
        let secret = config
            .auth
            .secret()
            .ok_or_else(|| anyhow!("No JWT secret configured"))?;
        let tokens = TokenIssuer::new(secret.as_bytes(), config.auth.token_expiry_secs());
        let hasher =
            CredentialHasher::from_config(&config.auth).context("Invalid password hash settings")?;

        let sessions: Arc<dyn SessionStore> = match config.session.backend {
            SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
            SessionBackend::Sqlite => Arc::new(SqliteSessionStore::new(db.clone())),
        };
        info!("Session backend: {:?}", config.session.backend);

        Ok(Self {
            config: Arc::new(config),
            db,
            sessions,
            tokens,
            hasher,
        })
    }

    pub fn gate(&self) -> AuthGate<'_> {
        AuthGate::new(self.sessions.as_ref(), &self.tokens)
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.auth.cookie_name
    }
}
