//! Handlers for room management and fault configuration.
//!
//! All endpoints require authentication via [`AuthUser`]. Rooms can only be
//! inspected, closed or faulted by their owner or an admin.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hookroom_core::error::CoreError;
use hookroom_core::registry::OpenedRoom;
use hookroom_core::room::clamp_ttl;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Returned when a room is created or refreshed.
#[derive(Debug, Serialize)]
pub struct RoomCreated {
    pub room_id: String,
    pub webhook_url: String,
    pub webhook_ttl: i64,
}

/// Body of `POST /room/{room_id}/fake-error`.
#[derive(Debug, Deserialize)]
pub struct SetFaultRequest {
    pub enabled: bool,
    pub status_code: Option<u16>,
    pub force: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RoomClosed {
    pub status: &'static str,
    pub room_id: String,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// POST /room/{room_id}
///
/// Create the room or refresh an existing one. The TTL is the caller's
/// `webhook_ttl` preference, else the server default. Refreshing a room keeps
/// its owner, and only the owner or an admin may refresh it.
pub async fn create_room(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let ttl = auth
        .webhook_ttl
        .map(clamp_ttl)
        .unwrap_or(state.config.default_webhook_ttl_secs);

    let OpenedRoom { room, created } = state.registry.open(&room_id, auth.caller(), ttl).await?;

    tracing::info!(room_id = %room.room_id, user_id = %auth.user_id, created, "Room opened");

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(DataResponse {
            data: RoomCreated {
                webhook_url: state.config.webhook_url(&room.room_id),
                webhook_ttl: room.ttl_seconds,
                room_id: room.room_id,
            },
        }),
    ))
}

/// GET /room/my-rooms
///
/// Rooms owned by the caller, newest first, with live capture counts.
pub async fn list_my_rooms(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .registry
        .list_for_owner(&auth.user_id, false, params.page, params.limit)
        .await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /room/all
///
/// Every room. Admin only.
pub async fn list_all_rooms(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .registry
        .list_for_owner(&admin.user_id, true, params.page, params.limit)
        .await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /room/{room_id}
pub async fn get_room(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let details = state.registry.details(&room_id).await?;
    auth.ensure_can_manage(&details.room.owner_id)?;
    Ok(Json(DataResponse { data: details }))
}

/// DELETE /room/{room_id}
///
/// Close the room and drop its captures. Closing an unknown room succeeds.
pub async fn close_room(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.registry.close_as(&room_id, auth.caller()).await?;

    Ok(Json(DataResponse {
        data: RoomClosed {
            status: "closed",
            room_id,
        },
    }))
}

// ---------------------------------------------------------------------------
// Fault injection
// ---------------------------------------------------------------------------

/// POST /room/{room_id}/fake-error
///
/// Replace the room's fault state. Disabling clears status and `force`.
pub async fn set_fault(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(input): Json<SetFaultRequest>,
) -> AppResult<impl IntoResponse> {
    // HTTP servers cannot send an informational status as a final response.
    if input.enabled && input.status_code.is_some_and(|code| code < 200) {
        return Err(AppError::Core(CoreError::Validation(
            "status_code must be between 200 and 599 for a simulated HTTP failure".into(),
        )));
    }

    let fault = state
        .registry
        .set_fault_as(
            &room_id,
            auth.caller(),
            input.enabled,
            input.status_code,
            input.force,
        )
        .await?;

    Ok(Json(DataResponse { data: fault }))
}

/// GET /room/{room_id}/fake-error
///
/// Current fault state; disabled for rooms that do not exist.
pub async fn get_fault(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let fault = state.registry.get_fault(&room_id).await?;
    Ok(Json(DataResponse { data: fault }))
}
