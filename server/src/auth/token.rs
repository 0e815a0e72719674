//! Signed, time-limited identity tokens (HS256).
//!
//! Verification is stateless: signature + unexpired `exp` + `authorized`
//! is all that is checked. There is no revocation list, so a token stays
//! usable for the rest of its lifetime after logout; logout only removes
//! it from the session.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use shared::types::jwt::TokenClaims;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    Invalid,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token is not authorized")]
    NotAuthorized,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a token for `username`, valid for the configured lifetime.
    pub fn issue(&self, username: &str) -> Result<String, TokenError> {
        self.issue_at(username, unix_now())
    }

    /// Issue a token as if it had been minted at `issued_at`.
    pub(crate) fn issue_at(&self, username: &str, issued_at: u64) -> Result<String, TokenError> {
        let claims = TokenClaims {
            sub: username.to_string(),
            authorized: true,
            exp: issued_at + self.ttl_secs,
            iat: issued_at,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Encoding)
    }

    /// Verify signature, algorithm, structure and expiry.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<TokenClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Invalid,
            }
        })?;

        if !data.claims.authorized {
            return Err(TokenError::NotAuthorized);
        }

        Ok(data.claims)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
