pub mod auth;
pub mod items;
pub mod pages;
pub mod reply;
pub mod routes;
pub mod utils;

pub use reply::{HttpResponse, Reply};
pub use routes::{Router, build_router};
