//! Room and fault-state rows.

use hookroom_core::fault::FaultState;
use hookroom_core::room::Room;
use hookroom_core::types::Timestamp;
use sqlx::FromRow;

/// A row from the `rooms` table.
#[derive(Debug, Clone, FromRow)]
pub struct RoomRow {
    pub room_id: String,
    pub owner_id: String,
    pub ttl_seconds: i64,
    pub created_at: Timestamp,
    pub last_activity_at: Timestamp,
}

impl From<RoomRow> for Room {
    fn from(row: RoomRow) -> Self {
        Room {
            room_id: row.room_id,
            owner_id: row.owner_id,
            ttl_seconds: row.ttl_seconds,
            created_at: row.created_at,
            last_activity_at: row.last_activity_at,
        }
    }
}

/// A row returned by [`RoomRepo::upsert`](crate::repositories::RoomRepo::upsert).
#[derive(Debug, Clone, FromRow)]
pub struct UpsertedRoomRow {
    #[sqlx(flatten)]
    pub room: RoomRow,
    /// `true` when the statement inserted rather than updated.
    pub created: bool,
}

/// Fault columns of a room. All `NULL` when the room has no `fault_states` row.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct FaultRow {
    pub enabled: Option<bool>,
    pub status_code: Option<i32>,
    pub is_forced: Option<bool>,
}

impl From<FaultRow> for FaultState {
    fn from(row: FaultRow) -> Self {
        if !row.enabled.unwrap_or(false) {
            return FaultState::disabled();
        }
        FaultState {
            enabled: true,
            status_code: row.status_code.and_then(|c| u16::try_from(c).ok()),
            force: row.is_forced.unwrap_or(false),
        }
    }
}
