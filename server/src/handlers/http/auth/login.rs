use anyhow::Context;
use bytes::Bytes;
use hyper::Request;
use tracing::{error, info, warn};

use shared::types::login::{AuthErrorCode, LoginData};

use crate::AppState;
use crate::auth::Session;
use crate::database::login::get_user_auth;
use crate::handlers::http::reply::Reply;
use crate::handlers::http::routes::HandlerResult;
use crate::handlers::http::utils::{create_session_cookie, get_cookie};

/// Where a failed login sends the browser.
pub fn login_error(code: AuthErrorCode) -> Reply {
    Reply::redirect(format!("/login?error={}", code.code()))
}

/// POST /login (form: username, password)
///
/// On success a brand-new session carries the token and the user id, and
/// its id replaces whatever cookie the browser had.
pub async fn handle_login(req: Request<Bytes>, state: AppState) -> HandlerResult {
    let data = LoginData::from_pairs(form_urlencoded::parse(req.body()).into_owned());
    if data.has_missing_field() {
        warn!("Login rejected: missing input");
        return Ok(login_error(AuthErrorCode::MissingInput));
    }

    let user = match get_user_auth(&state.db, &data.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            state.hasher.verify_absent_async(data.password).await;
            warn!("Login failed: unknown user");
            return Ok(login_error(AuthErrorCode::BadCredentials));
        }
        Err(e) => {
            error!("User lookup failed: {}", e);
            return Ok(login_error(AuthErrorCode::Generic));
        }
    };

    if !state
        .hasher
        .verify_async(user.password_hash.clone(), data.password)
        .await
    {
        warn!("Login failed: wrong password for user {}", user.user_id);
        return Ok(login_error(AuthErrorCode::BadCredentials));
    }

    let token = match state.tokens.issue(&user.username) {
        Ok(token) => token,
        Err(e) => {
            error!("Token issue failed: {}", e);
            return Ok(login_error(AuthErrorCode::Generic));
        }
    };

    // Drop the previous session, if any, before handing out a new id.
    if let Some(old_id) = get_cookie(req.headers(), state.cookie_name()) {
        if let Err(e) = state.sessions.remove(&old_id).await {
            warn!("Could not drop previous session: {}", e);
        }
    }

    let mut session = Session::create();
    session.set_token(token);
    session.set_user_id(user.user_id);
    if let Err(e) = session
        .save(state.sessions.as_ref(), state.tokens.ttl_secs())
        .await
    {
        error!("Session save failed: {}", e);
        return Ok(login_error(AuthErrorCode::Generic));
    }

    let cookie = create_session_cookie(
        state.cookie_name(),
        session.id(),
        state.config.auth.cookie_secure,
    )
    .context("Failed to create session cookie")?;

    info!("User logged in: {} (ID: {})", user.username, user.user_id);
    Ok(Reply::redirect_with_cookie("/", cookie))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_redirect_carries_code() {
        match login_error(AuthErrorCode::BadCredentials) {
            Reply::Redirect { location, cookie } => {
                assert_eq!(location, "/login?error=4");
                assert!(cookie.is_none());
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }
}
