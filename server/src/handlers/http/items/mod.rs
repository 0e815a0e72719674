pub mod read;
pub mod write;

use bytes::Bytes;
use hyper::Request;

use crate::error::{AppError, BIND_INPUT_ERROR, MISSING_INPUT_ID};
use crate::handlers::http::routes::path_param;
use shared::types::item::ItemInput;

pub use read::{get, list};
pub use write::{create, delete, update};

/// The `:id` segment as a positive item id.
pub(crate) fn item_id(req: &Request<Bytes>) -> Result<i64, AppError> {
    path_param(req, "id")
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or(AppError::Validation(MISSING_INPUT_ID))
}

/// JSON body as item input. Unparseable, empty title and unset status all
/// read as the same bind error.
pub(crate) fn item_input(req: &Request<Bytes>) -> Result<ItemInput, AppError> {
    serde_json::from_slice::<ItemInput>(req.body())
        .ok()
        .filter(ItemInput::is_valid)
        .ok_or(AppError::Validation(BIND_INPUT_ERROR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::http::routes::PathParams;

    fn request(body: &'static str) -> Request<Bytes> {
        Request::new(Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn missing_id_param_is_rejected() {
        let req = request("");
        assert!(matches!(
            item_id(&req),
            Err(AppError::Validation(MISSING_INPUT_ID))
        ));
    }

    #[test]
    fn body_with_smuggled_owner_still_parses() {
        let req = request(r#"{"title":"buy milk","status":1,"user_id":999}"#);
        let input = item_input(&req).unwrap();
        assert_eq!(input.title, "buy milk");
        assert_eq!(input.status, 1);
    }

    #[test]
    fn bad_bodies_are_bind_errors() {
        for body in ["not json", r#"{"title":"","status":1}"#, r#"{"title":"x"}"#] {
            assert!(matches!(
                item_input(&request(body)),
                Err(AppError::Validation(BIND_INPUT_ERROR))
            ));
        }
    }

    #[test]
    fn path_params_struct_is_default_empty() {
        assert_eq!(PathParams::default().get("id"), None);
    }
}
