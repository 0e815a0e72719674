pub mod config;

pub use self::config::{apply_env_overrides, load_config, load_dotenv, validate_config};
