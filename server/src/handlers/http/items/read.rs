use bytes::Bytes;
use hyper::Request;
use tracing::info;

use crate::AppState;
use crate::auth::AuthContext;
use crate::database::items::{self as store, Pagination};
use crate::handlers::http::items::item_id;
use crate::handlers::http::reply::Reply;
use crate::handlers::http::routes::HandlerResult;

// Auth is performed by the router before these handlers are called. The
// owner id always comes from `ctx`, never from the request.

/// GET /items/?size=&p=: one page of the caller's items.
pub async fn list(req: Request<Bytes>, state: AppState, ctx: AuthContext) -> HandlerResult {
    let page = page_from_query(req.uri().query());
    info!(
        "Listing items for user {} (limit {}, offset {})",
        ctx.user_id, page.limit, page.offset
    );

    let items = store::find_all(&state.db, page, ctx.user_id).await?;
    Reply::json(&items)
}

/// GET /items/:id
pub async fn get(req: Request<Bytes>, state: AppState, ctx: AuthContext) -> HandlerResult {
    let id = item_id(&req)?;
    let item = store::find(&state.db, id, ctx.user_id).await?;
    Reply::json(&item)
}

/// `size` and `p` from the query string; anything unusable is left to the
/// pagination defaults.
pub fn page_from_query(query: Option<&str>) -> Pagination {
    let mut size = None;
    let mut page = None;
    for (key, value) in form_urlencoded::parse(query.unwrap_or("").as_bytes()) {
        match key.as_ref() {
            "size" => size = value.trim().parse::<i64>().ok(),
            "p" => page = value.trim().parse::<i64>().ok(),
            _ => {}
        }
    }
    Pagination::from_page(page, size)
}
