//! Route definitions for webhook capture and retrieval.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::hook;
use crate::state::AppState;

/// Hook routes mounted at `/hook`.
///
/// ```text
/// GET    /all/{room_id}                -> list_captures_page
/// DELETE /delete/{room_id}             -> clear_captures
/// GET    /{room_id}                    -> list_captures
/// *      /{room_id}                    -> ingest (every other method, HEAD included)
/// GET    /{room_id}/{receipt_id}       -> get_capture
/// DELETE /{room_id}/{receipt_id}       -> delete_capture
/// ```
///
/// Static segments take priority over `{room_id}`, which is why `all` and
/// `delete` are reserved room ids.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/all/{room_id}", get(hook::list_captures_page))
        .route("/delete/{room_id}", delete(hook::clear_captures))
        .route(
            "/{room_id}",
            get(hook::list_captures)
                .head(hook::ingest)
                .fallback(hook::ingest),
        )
        .route(
            "/{room_id}/{receipt_id}",
            get(hook::get_capture).delete(hook::delete_capture),
        )
}
