use bytes::Bytes;
use hyper::Request;

use crate::AppState;
use crate::auth::AuthContext;
use crate::database::items as store;
use crate::handlers::http::items::{item_id, item_input};
use crate::handlers::http::reply::Reply;
use crate::handlers::http::routes::HandlerResult;

/// POST /items/: create an item owned by the caller.
pub async fn create(req: Request<Bytes>, state: AppState, ctx: AuthContext) -> HandlerResult {
    let input = item_input(&req)?;
    let item = store::insert(&state.db, &input, ctx.user_id).await?;
    Reply::json(&item)
}

/// PUT /items/:id
pub async fn update(req: Request<Bytes>, state: AppState, ctx: AuthContext) -> HandlerResult {
    let id = item_id(&req)?;
    let input = item_input(&req)?;
    store::update(&state.db, id, &input, ctx.user_id).await?;
    Ok(Reply::message("Updated"))
}

/// DELETE /items/:id
pub async fn delete(req: Request<Bytes>, state: AppState, ctx: AuthContext) -> HandlerResult {
    let id = item_id(&req)?;
    store::delete(&state.db, id, ctx.user_id).await?;
    Ok(Reply::message("Deleted record"))
}
