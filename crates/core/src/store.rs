//! Storage capabilities behind the room registry and the gateways.
//!
//! Two interchangeable implementations exist: [`MemoryStore`](crate::memory::MemoryStore)
//! in this crate and `PgStore` in `hookroom_db`. The backend is chosen once at startup and
//! handed to [`RoomRegistry`](crate::registry::RoomRegistry) as trait objects.
//!
//! All time-dependent methods take `now` explicitly so expiry is decided by
//! the caller's [`Clock`](crate::clock::Clock), not by the backend.

use async_trait::async_trait;

use crate::capture::{Capture, SortOrder};
use crate::error::CoreError;
use crate::fault::FaultState;
use crate::room::{Caller, Room};
use crate::types::{ReceiptId, Timestamp};

/// Live capture statistics for one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureStats {
    pub count: i64,
    pub last_capture_at: Option<Timestamp>,
}

/// Result of [`RoomStore::upsert_room`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomUpsert {
    Created(Room),
    Refreshed(Room),
    /// The room exists and belongs to someone the caller may not act for.
    Denied,
}

/// Result of a room mutation that may be restricted to the room's managers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    Done(T),
    Missing,
    Denied,
}

/// Persistence of rooms and their fault state.
///
/// Each mutation must be atomic per room: a concurrent reader never observes
/// half of a [`FaultState`] write, and ownership checks happen in the same
/// atomic step as the write they guard.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Insert the room owned by `caller`, or refresh TTL and activity of an
    /// existing room `caller` may manage. The owner never changes. A new room
    /// starts with a disabled fault state.
    async fn upsert_room(
        &self,
        room_id: &str,
        caller: Caller<'_>,
        ttl_seconds: i64,
        now: Timestamp,
    ) -> Result<RoomUpsert, CoreError>;

    async fn find_room(&self, room_id: &str) -> Result<Option<Room>, CoreError>;

    /// Rooms ordered by `created_at` (newest first), optionally filtered by
    /// owner, plus the total matching the filter.
    async fn list_rooms(
        &self,
        owner_id: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Room>, i64), CoreError>;

    /// Remove the room and its fault state. With a `caller`, only if they may
    /// manage the room.
    async fn delete_room(
        &self,
        room_id: &str,
        caller: Option<Caller<'_>>,
    ) -> Result<Guarded<()>, CoreError>;

    /// Advance `last_activity_at` to `now` unless it is already later.
    async fn touch_room(&self, room_id: &str, now: Timestamp) -> Result<(), CoreError>;

    /// Replace the fault state. With a `caller`, only if they may manage the
    /// room.
    async fn set_fault(
        &self,
        room_id: &str,
        state: FaultState,
        caller: Option<Caller<'_>>,
    ) -> Result<Guarded<FaultState>, CoreError>;

    /// Returns `None` if the room does not exist.
    async fn get_fault(&self, room_id: &str) -> Result<Option<FaultState>, CoreError>;

    /// Cheap reachability check for health reporting.
    async fn ping(&self) -> Result<(), CoreError>;
}

/// Append-only per-room capture log with TTL expiry.
///
/// Expired captures (`now >= expires_at`) are never returned, counted or
/// deleted, even before [`purge_expired`](CaptureStore::purge_expired)
/// physically removes them.
#[async_trait]
pub trait CaptureStore: Send + Sync {
    /// Store a capture built by [`Capture::new`]. All-or-nothing.
    async fn append(&self, capture: Capture) -> Result<ReceiptId, CoreError>;

    async fn list(
        &self,
        room_id: &str,
        order: SortOrder,
        now: Timestamp,
    ) -> Result<Vec<Capture>, CoreError>;

    async fn get(
        &self,
        room_id: &str,
        receipt_id: ReceiptId,
        now: Timestamp,
    ) -> Result<Option<Capture>, CoreError>;

    /// Returns `false` if nothing live matched.
    async fn delete(
        &self,
        room_id: &str,
        receipt_id: ReceiptId,
        now: Timestamp,
    ) -> Result<bool, CoreError>;

    /// Remove every capture of the room. Idempotent.
    async fn clear(&self, room_id: &str) -> Result<(), CoreError>;

    async fn stats(&self, room_id: &str, now: Timestamp) -> Result<CaptureStats, CoreError>;

    /// Physically remove every expired capture. Returns the number removed.
    async fn purge_expired(&self, now: Timestamp) -> Result<u64, CoreError>;
}
