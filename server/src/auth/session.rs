//! Server-side sessions keyed by an opaque cookie id.
//!
//! A session holds exactly two things: the token issued at login and the
//! numeric user id resolved at the same time. Both are typed; there is no
//! string-keyed bag of values.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::database::utils::{generate_uuid_token, get_timestamp};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// What a session remembers between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub token: Option<String>,
    pub user_id: Option<i64>,
}

impl SessionData {
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user_id.is_none()
    }
}

/// Pluggable backing store. Implementations must give read-your-writes
/// within one session id.
#[async_trait]
pub trait SessionStore: Send + Sync + fmt::Debug {
    /// Unexpired data for `id`, if any.
    async fn load(&self, id: &str) -> Result<Option<SessionData>, SessionError>;

    async fn store(&self, id: &str, data: &SessionData, expires_at: i64)
    -> Result<(), SessionError>;

    async fn remove(&self, id: &str) -> Result<(), SessionError>;

    /// Drop every expired record; returns how many went.
    async fn purge_expired(&self) -> Result<u64, SessionError>;
}

// ---------------------------------------------------------------------------
// Session handle
// ---------------------------------------------------------------------------

/// A loaded (or freshly minted) session. Mutations stay local until
/// [`save`](Session::save).
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    data: SessionData,
}

impl Session {
    /// A new, empty session with a random id.
    pub fn create() -> Self {
        Self {
            id: generate_uuid_token(),
            data: SessionData::default(),
        }
    }

    pub async fn load(store: &dyn SessionStore, id: &str) -> Result<Option<Self>, SessionError> {
        Ok(store.load(id).await?.map(|data| Self {
            id: id.to_string(),
            data,
        }))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn token(&self) -> Option<&str> {
        self.data.token.as_deref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.data.user_id
    }

    pub fn set_token(&mut self, token: String) {
        self.data.token = Some(token);
    }

    pub fn set_user_id(&mut self, user_id: i64) {
        self.data.user_id = Some(user_id);
    }

    pub fn delete_token(&mut self) {
        self.data.token = None;
    }

    pub fn delete_user_id(&mut self) {
        self.data.user_id = None;
    }

    /// Persist the current data for `ttl_secs`. An emptied session is
    /// removed from the store instead.
    pub async fn save(&self, store: &dyn SessionStore, ttl_secs: u64) -> Result<(), SessionError> {
        if self.data.is_empty() {
            debug!("Removing emptied session");
            return store.remove(&self.id).await;
        }
        let expires_at = get_timestamp() + ttl_secs as i64;
        store.store(&self.id, &self.data, expires_at).await
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, (SessionData, i64)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionData>, SessionError> {
        let now = get_timestamp();
        Ok(self
            .entries
            .read()
            .await
            .get(id)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(data, _)| data.clone()))
    }

    async fn store(
        &self,
        id: &str,
        data: &SessionData,
        expires_at: i64,
    ) -> Result<(), SessionError> {
        self.entries
            .write()
            .await
            .insert(id.to_string(), (data.clone(), expires_at));
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), SessionError> {
        self.entries.write().await.remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        let now = get_timestamp();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - entries.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// SQLite backend (the `sessions` table)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionData>, SessionError> {
        let row = sqlx::query(
            "SELECT token, user_id FROM sessions WHERE session_id = ?1 AND expires_at > ?2",
        )
        .bind(id)
        .bind(get_timestamp())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| SessionData {
            token: row.get("token"),
            user_id: row.get("user_id"),
        }))
    }

    async fn store(
        &self,
        id: &str,
        data: &SessionData,
        expires_at: i64,
    ) -> Result<(), SessionError> {
        sqlx::query(
            "INSERT INTO sessions (session_id, token, user_id, expires_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(session_id) DO UPDATE SET
                token      = excluded.token,
                user_id    = excluded.user_id,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at",
        )
        .bind(id)
        .bind(data.token.as_deref())
        .bind(data.user_id)
        .bind(expires_at)
        .bind(get_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE session_id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(get_timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
