use serde::{Deserialize, Serialize};

/// Claims embedded in every token issued at login.
///
/// The token is stateless: a valid signature plus an unexpired `exp` is
/// enough to trust these fields. The numeric user id is deliberately NOT a
/// claim; it is stored next to the token in the session at login time and
/// read from there on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Standard JWT subject, the username.
    pub sub: String,

    /// Always `true` for tokens minted by the login flow.
    pub authorized: bool,

    /// Standard JWT expiry (Unix timestamp, seconds).
    pub exp: u64,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: u64,
}
