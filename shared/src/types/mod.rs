pub mod item;
pub mod json_error;
pub mod jwt;
pub mod login;
pub mod register;
pub mod server_config;

pub use self::item::{Item, ItemInput, STATUS_COMPLETED, STATUS_PROCESSING};
pub use self::json_error::MessageResponse;
pub use self::jwt::TokenClaims;
pub use self::login::{AuthErrorCode, LoginData};
pub use self::register::RegistrationData;
