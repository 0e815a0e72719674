pub mod gate;
pub mod password;
pub mod session;
pub mod token;

pub use gate::{AuthContext, AuthGate, AuthRejection};
pub use password::{CredentialHasher, HashError};
pub use session::{
    MemorySessionStore, Session, SessionData, SessionError, SessionStore, SqliteSessionStore,
};
pub use token::{TokenError, TokenIssuer};
