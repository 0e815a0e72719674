pub mod http;

pub use http::{Router, build_router};
