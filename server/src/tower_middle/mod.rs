/// Tower middleware module
///
/// Layers wrapped around the router for every connection:
/// - request timeout (408)
/// - CORS for the configured origins
pub mod tower_cors;
pub mod tower_timeout_handler;

pub use tower_cors::{CorsLayer, CorsService};
pub use tower_timeout_handler::{TimeoutLayer, TimeoutService};
