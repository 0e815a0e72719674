use hyper::StatusCode;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::{AuthRejection, HashError, SessionError};
use crate::database::items::StoreError;

pub const BIND_INPUT_ERROR: &str = "can not bind the input params";
pub const MISSING_INPUT_ID: &str = "please enter ID";
pub const SESSION_ERROR: &str = "you need to login first";
pub const ITEM_NOT_FOUND: &str = "can not find the item";
pub const INTERNAL_ERROR: &str = "something went wrong, please try again";

/// Everything a JSON handler can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(&'static str),

    #[error("authentication failed: {0}")]
    Auth(AuthRejection),

    /// Missing and not-owned are the same thing to the caller.
    #[error("not found")]
    NotFound,

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("session store failure: {0}")]
    Session(#[from] SessionError),

    #[error(transparent)]
    Hashing(#[from] HashError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Session(_) | Self::Hashing(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text for the `{message}` body. Server-side causes stay in the log.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Validation(message) => *message,
            Self::Auth(_) => SESSION_ERROR,
            Self::NotFound => ITEM_NOT_FOUND,
            Self::Storage(_) | Self::Session(_) | Self::Hashing(_) | Self::Internal(_) => {
                INTERNAL_ERROR
            }
        }
    }

    /// Log at a level matching who is at fault.
    pub fn log(&self) {
        if self.status().is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
    }
}

impl From<AuthRejection> for AppError {
    /// A broken session store is a server fault, not a missing login.
    fn from(rejection: AuthRejection) -> Self {
        match rejection {
            AuthRejection::Store(e) => Self::Session(e),
            other => Self::Auth(other),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Validation(_) => Self::Validation(BIND_INPUT_ERROR),
            StoreError::Storage(e) => Self::Storage(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            AppError::Validation(BIND_INPUT_ERROR).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Auth(AuthRejection::NoSession).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Hashing(HashError::HashingFailed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Storage(sqlx::Error::PoolClosed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_map_onto_app_errors() {
        assert!(matches!(
            AppError::from(StoreError::NotFound),
            AppError::NotFound
        ));
        assert_eq!(
            AppError::from(StoreError::Validation("title is required")).message(),
            BIND_INPUT_ERROR
        );
    }

    #[test]
    fn session_store_failure_is_a_server_error() {
        let err = AppError::from(AuthRejection::Store(SessionError::Storage(
            sqlx::Error::PoolClosed,
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), INTERNAL_ERROR);

        let err = AppError::from(AuthRejection::NoToken);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn internal_causes_are_not_exposed() {
        let err = AppError::Internal(anyhow::anyhow!("disk on fire at /var/db"));
        assert_eq!(err.message(), INTERNAL_ERROR);
    }
}
