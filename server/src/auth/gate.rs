//! Per-request admission check.
//!
//! `Unauthenticated → TokenPresent → TokenValid → Authorized`, with a
//! rejection possible at every step. The gate only reads the session.

use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::session::{Session, SessionError, SessionStore};
use crate::auth::token::{TokenError, TokenIssuer};

/// Request-scoped identity handed to protected handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Owner id used to scope every item query.
    pub user_id: i64,
    /// Token subject, for display only.
    pub username: String,
}

#[derive(Debug, Error)]
pub enum AuthRejection {
    #[error("no session")]
    NoSession,

    #[error("no token in session")]
    NoToken,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("no user id in session")]
    NoUserId,

    #[error(transparent)]
    Store(#[from] SessionError),
}

pub struct AuthGate<'a> {
    sessions: &'a dyn SessionStore,
    tokens: &'a TokenIssuer,
}

impl<'a> AuthGate<'a> {
    pub fn new(sessions: &'a dyn SessionStore, tokens: &'a TokenIssuer) -> Self {
        Self { sessions, tokens }
    }

    /// Admit or reject a request presenting `session_id` (the cookie value).
    pub async fn authorize(&self, session_id: Option<&str>) -> Result<AuthContext, AuthRejection> {
        let session_id = session_id
            .filter(|id| !id.is_empty())
            .ok_or(AuthRejection::NoSession)?;

        let session = Session::load(self.sessions, session_id)
            .await?
            .ok_or(AuthRejection::NoSession)?;

        let token = session.token().ok_or(AuthRejection::NoToken)?;

        let claims = self.tokens.verify(token).map_err(|e| {
            warn!("Session token rejected: {}", e);
            AuthRejection::InvalidToken(e)
        })?;

        // The id cached at login is authoritative; the token only proves
        // the session is still within its lifetime.
        let user_id = session.user_id().ok_or(AuthRejection::NoUserId)?;

        debug!("Session admitted: user_id={}", user_id);

        Ok(AuthContext {
            user_id,
            username: claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::{MemorySessionStore, SessionData};

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    async fn store_with(id: &str, data: SessionData) -> MemorySessionStore {
        let store = MemorySessionStore::new();
        store
            .store(id, &data, crate::database::utils::get_timestamp() + 60)
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn missing_cookie_is_rejected() {
        let store = MemorySessionStore::new();
        let tokens = TokenIssuer::new(SECRET, 3600);
        let gate = AuthGate::new(&store, &tokens);
        assert!(matches!(
            gate.authorize(None).await,
            Err(AuthRejection::NoSession)
        ));
        assert!(matches!(
            gate.authorize(Some("")).await,
            Err(AuthRejection::NoSession)
        ));
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let store = MemorySessionStore::new();
        let tokens = TokenIssuer::new(SECRET, 3600);
        let gate = AuthGate::new(&store, &tokens);
        assert!(matches!(
            gate.authorize(Some("ghost")).await,
            Err(AuthRejection::NoSession)
        ));
    }

    #[tokio::test]
    async fn session_without_token_is_rejected() {
        let store = store_with(
            "s1",
            SessionData {
                token: None,
                user_id: Some(1),
            },
        )
        .await;
        let tokens = TokenIssuer::new(SECRET, 3600);
        let gate = AuthGate::new(&store, &tokens);
        assert!(matches!(
            gate.authorize(Some("s1")).await,
            Err(AuthRejection::NoToken)
        ));
    }

    #[tokio::test]
    async fn forged_token_is_rejected() {
        let forger = TokenIssuer::new(b"not-the-server-secret-not-the-se", 3600);
        let store = store_with(
            "s1",
            SessionData {
                token: Some(forger.issue("alice").unwrap()),
                user_id: Some(1),
            },
        )
        .await;
        let tokens = TokenIssuer::new(SECRET, 3600);
        let gate = AuthGate::new(&store, &tokens);
        assert!(matches!(
            gate.authorize(Some("s1")).await,
            Err(AuthRejection::InvalidToken(TokenError::InvalidSignature))
        ));
    }

    #[tokio::test]
    async fn valid_session_yields_cached_user_id() {
        let tokens = TokenIssuer::new(SECRET, 3600);
        let store = store_with(
            "s1",
            SessionData {
                token: Some(tokens.issue("alice").unwrap()),
                user_id: Some(42),
            },
        )
        .await;
        let gate = AuthGate::new(&store, &tokens);
        let ctx = gate.authorize(Some("s1")).await.unwrap();
        assert_eq!(
            ctx,
            AuthContext {
                user_id: 42,
                username: "alice".into()
            }
        );
    }

    #[tokio::test]
    async fn valid_token_without_user_id_is_rejected() {
        let tokens = TokenIssuer::new(SECRET, 3600);
        let store = store_with(
            "s1",
            SessionData {
                token: Some(tokens.issue("alice").unwrap()),
                user_id: None,
            },
        )
        .await;
        let gate = AuthGate::new(&store, &tokens);
        assert!(matches!(
            gate.authorize(Some("s1")).await,
            Err(AuthRejection::NoUserId)
        ));
    }
}
