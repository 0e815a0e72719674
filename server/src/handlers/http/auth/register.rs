use std::sync::LazyLock;

use bytes::Bytes;
use hyper::Request;
use regex::Regex;
use tracing::{error, info, warn};

use shared::types::login::AuthErrorCode;
use shared::types::register::RegistrationData;

use crate::AppState;
use crate::database::register::{CreateOutcome, NewUser, register_user, user_exists};
use crate::handlers::http::reply::Reply;
use crate::handlers::http::routes::HandlerResult;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Shape checks that need no database.
pub fn validate_registration(data: &RegistrationData) -> Result<(), AuthErrorCode> {
    if data.has_missing_field() {
        return Err(AuthErrorCode::MissingInput);
    }
    if data.password.chars().count() < MIN_PASSWORD_LEN || !is_valid_email(&data.email) {
        return Err(AuthErrorCode::InvalidInput);
    }
    Ok(())
}

fn register_error(code: AuthErrorCode) -> Reply {
    Reply::redirect(format!("/register?error={}", code.code()))
}

/// POST /register (form: username, email, password)
pub async fn handle_register(req: Request<Bytes>, state: AppState) -> HandlerResult {
    let data = RegistrationData::from_pairs(form_urlencoded::parse(req.body()).into_owned());

    if let Err(code) = validate_registration(&data) {
        warn!("Registration rejected: {:?}", code);
        return Ok(register_error(code));
    }

    match user_exists(&state.db, &data.username, &data.email).await {
        Ok(false) => {}
        Ok(true) => {
            warn!("Registration rejected: user exists");
            return Ok(register_error(AuthErrorCode::UserExists));
        }
        Err(e) => {
            error!("User existence check failed: {}", e);
            return Ok(register_error(AuthErrorCode::Generic));
        }
    }

    let password_hash = match state.hasher.hash_async(data.password).await {
        Ok(hash) => hash,
        Err(e) => {
            error!("Registration hash failed: {}", e);
            return Ok(register_error(AuthErrorCode::Generic));
        }
    };

    let new_user = NewUser {
        username: data.username,
        email: data.email,
        password_hash,
    };

    match register_user(&state.db, new_user).await {
        Ok(CreateOutcome::Created(user_id)) => {
            info!("Registered user {}", user_id);
            Ok(Reply::redirect("/login"))
        }
        // Lost a race with a concurrent registration.
        Ok(CreateOutcome::Conflict) => Ok(register_error(AuthErrorCode::UserExists)),
        Err(e) => {
            error!("User insert failed: {}", e);
            Ok(register_error(AuthErrorCode::CreateFailed))
        }
    }
}
