pub mod create;
pub mod items;
pub mod login;
pub mod register;
pub mod utils;

pub use create::{connect, create_tables};
