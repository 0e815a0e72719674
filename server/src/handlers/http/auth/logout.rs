use anyhow::Context;
use bytes::Bytes;
use hyper::Request;
use tracing::{info, warn};

use crate::AppState;
use crate::auth::Session;
use crate::handlers::http::reply::Reply;
use crate::handlers::http::routes::HandlerResult;
use crate::handlers::http::utils::{delete_cookie, get_cookie};

/// GET /logout
///
/// Clears the session and always lands on the login page, so calling it
/// twice (or with no session at all) is fine.
pub async fn handle_logout(req: Request<Bytes>, state: AppState) -> HandlerResult {
    if let Some(id) = get_cookie(req.headers(), state.cookie_name()) {
        match Session::load(state.sessions.as_ref(), &id).await {
            Ok(Some(mut session)) => {
                session.delete_token();
                session.delete_user_id();
                if let Err(e) = session
                    .save(state.sessions.as_ref(), state.tokens.ttl_secs())
                    .await
                {
                    warn!("Failed to clear session on logout: {}", e);
                }
                info!("User logged out");
            }
            Ok(None) => {}
            Err(e) => warn!("Session lookup failed on logout: {}", e),
        }
    }

    let cookie = delete_cookie(state.cookie_name(), state.config.auth.cookie_secure)
        .context("Failed to create logout cookie")?;
    Ok(Reply::redirect_with_cookie("/login", cookie))
}
