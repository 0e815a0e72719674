use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// How long in-flight connections may drain after a shutdown signal.
    pub shutdown_grace_secs: u64,
    pub request_timeout_secs: u64,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection string, e.g. `sqlite://todo.db`.
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub web_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub token_expiry_minutes: u64,
    /// HMAC key used to sign and verify tokens.
    ///
    /// Prefer the `JWT_SECRET` environment variable; this field is the
    /// fallback. Minimum length: 32 bytes.
    pub jwt_secret: Option<String>,
    pub cookie_name: String,
    pub cookie_secure: bool,
    /// Argon2 memory cost in KiB.
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub paths: PathsConfig,
    pub auth: AuthConfig,
    pub session: SessionConfig,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            shutdown_grace_secs: 10,
            request_timeout_secs: 30,
            allowed_origins: vec![
                "http://127.0.0.1:8080".to_string(),
                "http://localhost:8080".to_string(),
            ],
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://todo.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            web_dir: PathBuf::from("./web"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_expiry_minutes: 60,
            jwt_secret: None,
            cookie_name: "todo_session".to_string(),
            cookie_secure: false,
            hash_memory_kib: 19_456,
            hash_iterations: 2,
            hash_parallelism: 1,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Sqlite,
            cleanup_interval_secs: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ServerConfig {
    /// Full bind address, e.g. `"127.0.0.1:8080"`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl AuthConfig {
    /// Token expiry converted to seconds; also used as the session lifetime.
    pub fn token_expiry_secs(&self) -> u64 {
        self.token_expiry_minutes * 60
    }

    /// The signing secret. `load_config` folds `JWT_SECRET` into
    /// `jwt_secret`, so after loading this is the only source.
    pub fn secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_give_one_hour_tokens() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.auth.token_expiry_secs(), 3600);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [session]
            backend = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert_eq!(cfg.session.backend, SessionBackend::Memory);
        assert_eq!(cfg.auth.cookie_name, "todo_session");
    }

    #[test]
    fn empty_secret_is_treated_as_unset() {
        let auth = AuthConfig {
            jwt_secret: Some(String::new()),
            ..Default::default()
        };
        assert!(auth.secret().is_none());
    }
}
