use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::types::server_config::{AppConfig, ConfigError};

pub const ENV_PORT: &str = "APPLICATION_PORT";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";

const MIN_SECRET_LEN: usize = 32;

/// Load `.env` from the working directory if one exists.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    }
}

/// Build the application config: file (optional) → environment → validation.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());

            let contents = fs::read_to_string(path)?;
            if contents.trim().is_empty() {
                error!("Configuration file is empty");
                return Err(ConfigError::InvalidConfig("empty file".into()));
            }

            toml::from_str::<AppConfig>(&contents)?
        }
        None => {
            info!("No configuration file given, using defaults");
            AppConfig::default()
        }
    };

    apply_env_overrides(&mut config)?;
    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

/// Fold the environment variables the deployment injects into `config`.
pub fn apply_env_overrides(config: &mut AppConfig) -> Result<(), ConfigError> {
    if let Some(port) = non_empty_env(ENV_PORT) {
        config.server.port = port.parse().map_err(|_| {
            ConfigError::InvalidConfig(format!("{} is not a valid port: {}", ENV_PORT, port))
        })?;
        debug!("Port overridden from environment");
    }

    if let Some(url) = non_empty_env(ENV_DATABASE_URL) {
        config.database.url = url;
        debug!("Database URL overridden from environment");
    }

    if let Some(secret) = non_empty_env(ENV_JWT_SECRET) {
        config.auth.jwt_secret = Some(secret);
        debug!("Signing secret taken from environment");
    }

    Ok(())
}

pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.paths.web_dir.as_os_str().is_empty() {
        return Err(ConfigError::InvalidConfig("web_dir cannot be empty".into()));
    }

    if config.auth.token_expiry_minutes == 0 {
        return Err(ConfigError::InvalidConfig(
            "token_expiry_minutes must be greater than 0".into(),
        ));
    }

    if config.database.max_connections == 0 {
        return Err(ConfigError::InvalidConfig(
            "database.max_connections must be greater than 0".into(),
        ));
    }

    if config.server.shutdown_grace_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "shutdown_grace_secs must be greater than 0".into(),
        ));
    }

    if config.server.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "request_timeout_secs must be greater than 0".into(),
        ));
    }

    if config.session.cleanup_interval_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "session.cleanup_interval_secs must be greater than 0".into(),
        ));
    }

    if config.auth.cookie_name.is_empty() {
        return Err(ConfigError::InvalidConfig("cookie_name cannot be empty".into()));
    }

    match config.auth.secret() {
        None => {
            return Err(ConfigError::InvalidConfig(
                "jwt_secret must be set via the JWT_SECRET env var or auth.jwt_secret config field"
                    .into(),
            ));
        }
        Some(secret) if secret.len() < MIN_SECRET_LEN => {
            return Err(ConfigError::InvalidConfig(format!(
                "jwt_secret must be at least {} characters long",
                MIN_SECRET_LEN
            )));
        }
        _ => {}
    }

    Ok(())
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
