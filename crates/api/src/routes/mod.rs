pub mod health;
pub mod hook;
pub mod room;

use axum::Router;

use crate::state::AppState;

/// Build the public route tree.
///
/// ```text
/// /room/my-rooms                        own rooms (auth)
/// /room/all                             every room (admin)
/// /room/{room_id}                       create/refresh, details, close (auth)
/// /room/{room_id}/fake-error            set, read fault state (auth)
///
/// /hook/{room_id}                       GET list, anything else captures
/// /hook/all/{room_id}                   paginated list
/// /hook/delete/{room_id}                clear all captures
/// /hook/{room_id}/{receipt_id}          get, delete one capture
/// ```
///
/// `/hook` is unauthenticated: capture URLs are handed to third parties.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/room", room::router())
        .nest("/hook", hook::router())
}
