//! Route definitions for room management.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::room;
use crate::state::AppState;

/// Room routes mounted at `/room`.
///
/// ```text
/// GET    /my-rooms                  -> list_my_rooms
/// GET    /all                       -> list_all_rooms (admin only)
/// POST   /{room_id}                 -> create_room
/// GET    /{room_id}                 -> get_room
/// DELETE /{room_id}                 -> close_room
/// POST   /{room_id}/fake-error      -> set_fault
/// GET    /{room_id}/fake-error      -> get_fault
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/my-rooms", get(room::list_my_rooms))
        .route("/all", get(room::list_all_rooms))
        .route(
            "/{room_id}",
            post(room::create_room)
                .get(room::get_room)
                .delete(room::close_room),
        )
        .route(
            "/{room_id}/fake-error",
            post(room::set_fault).get(room::get_fault),
        )
}
