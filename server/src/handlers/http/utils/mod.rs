pub mod deliver_page;
pub mod headers;
pub mod json_response;

pub use deliver_page::*;
pub use headers::*;
pub use json_response::*;
