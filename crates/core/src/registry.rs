//! Room registry: the only component that creates, refreshes or closes rooms
//! and mutates their fault state.

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::CoreError;
use crate::fault::FaultState;
use crate::pagination::{clamp_limit, clamp_page, page_offset, Page, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::room::{validate_room_id, validate_ttl, Caller, Room, RoomDetails, RoomSummary};
use crate::store::{CaptureStore, Guarded, RoomStore, RoomUpsert};
use crate::types::Timestamp;

/// A room returned by [`RoomRegistry::open`].
#[derive(Debug, Clone)]
pub struct OpenedRoom {
    pub room: Room,
    /// `false` when an existing room was refreshed.
    pub created: bool,
}

/// Owns room records and fault state on top of the configured stores.
///
/// Closing a room cascades: its captures are cleared along with the room and
/// its fault state.
pub struct RoomRegistry {
    rooms: Arc<dyn RoomStore>,
    captures: Arc<dyn CaptureStore>,
    clock: Arc<dyn Clock>,
}

impl RoomRegistry {
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        captures: Arc<dyn CaptureStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms,
            captures,
            clock,
        }
    }

    /// Current time according to the registry's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Create the room for `owner_id`, or refresh TTL and activity of a room
    /// they already own. A room owned by someone else is
    /// [`CoreError::Forbidden`].
    pub async fn create_or_refresh(
        &self,
        room_id: &str,
        owner_id: &str,
        ttl_seconds: i64,
    ) -> Result<Room, CoreError> {
        self.open(room_id, Caller::user(owner_id), ttl_seconds)
            .await
            .map(|opened| opened.room)
    }

    /// Create the room owned by `caller`, or refresh it if `caller` may
    /// manage it. The check and the write are one store operation.
    pub async fn open(
        &self,
        room_id: &str,
        caller: Caller<'_>,
        ttl_seconds: i64,
    ) -> Result<OpenedRoom, CoreError> {
        validate_room_id(room_id)?;
        validate_ttl(ttl_seconds)?;

        let (room, created) = match self
            .rooms
            .upsert_room(room_id, caller, ttl_seconds, self.now())
            .await?
        {
            RoomUpsert::Created(room) => (room, true),
            RoomUpsert::Refreshed(room) => (room, false),
            RoomUpsert::Denied => return Err(not_yours(room_id)),
        };

        tracing::info!(room_id = %room.room_id, owner_id = %room.owner_id, ttl_seconds, created, "Room opened");
        Ok(OpenedRoom { room, created })
    }

    pub async fn get(&self, room_id: &str) -> Result<Room, CoreError> {
        self.rooms
            .find_room(room_id)
            .await?
            .ok_or_else(|| CoreError::room_not_found(room_id))
    }

    /// Room plus fault state and live capture count.
    pub async fn details(&self, room_id: &str) -> Result<RoomDetails, CoreError> {
        let room = self.get(room_id).await?;
        let fault = self.get_fault(room_id).await?;
        let stats = self.captures.stats(room_id, self.now()).await?;
        Ok(RoomDetails {
            room,
            fault,
            capture_count: stats.count,
        })
    }

    /// List rooms of `owner_id`, or every room when `include_all` is set.
    ///
    /// Pages are 1-indexed; `page_size` is clamped to `1..=500`.
    pub async fn list_for_owner(
        &self,
        owner_id: &str,
        include_all: bool,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Page<RoomSummary>, CoreError> {
        let page = clamp_page(page);
        let limit = clamp_limit(page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let filter = if include_all { None } else { Some(owner_id) };

        let (rooms, total) = self
            .rooms
            .list_rooms(filter, page_offset(page, limit), limit)
            .await?;

        let now = self.now();
        let mut items = Vec::with_capacity(rooms.len());
        for room in rooms {
            let stats = self.captures.stats(&room.room_id, now).await?;
            items.push(RoomSummary {
                room,
                capture_count: stats.count,
                last_capture_at: stats.last_capture_at,
            });
        }

        Ok(Page {
            items,
            total,
            page,
            limit,
        })
    }

    /// Close a room and delete its captures. Closing an unknown room is a no-op.
    pub async fn close(&self, room_id: &str) -> Result<(), CoreError> {
        self.close_guarded(room_id, None).await
    }

    /// [`close`](Self::close), restricted to the room's owner or an admin.
    pub async fn close_as(&self, room_id: &str, caller: Caller<'_>) -> Result<(), CoreError> {
        self.close_guarded(room_id, Some(caller)).await
    }

    async fn close_guarded(&self, room_id: &str, caller: Option<Caller<'_>>) -> Result<(), CoreError> {
        match self.rooms.delete_room(room_id, caller).await? {
            Guarded::Done(()) => tracing::info!(room_id = %room_id, "Room closed"),
            Guarded::Missing => {
                tracing::debug!(room_id = %room_id, "Close requested for unknown room")
            }
            Guarded::Denied => return Err(not_yours(room_id)),
        }
        self.captures.clear(room_id).await
    }

    /// Replace the room's fault state. See [`FaultState::configure`].
    pub async fn set_fault(
        &self,
        room_id: &str,
        enabled: bool,
        status_code: Option<u16>,
        force: Option<bool>,
    ) -> Result<FaultState, CoreError> {
        self.set_fault_guarded(room_id, None, enabled, status_code, force)
            .await
    }

    /// [`set_fault`](Self::set_fault), restricted to the room's owner or an
    /// admin.
    pub async fn set_fault_as(
        &self,
        room_id: &str,
        caller: Caller<'_>,
        enabled: bool,
        status_code: Option<u16>,
        force: Option<bool>,
    ) -> Result<FaultState, CoreError> {
        self.set_fault_guarded(room_id, Some(caller), enabled, status_code, force)
            .await
    }

    async fn set_fault_guarded(
        &self,
        room_id: &str,
        caller: Option<Caller<'_>>,
        enabled: bool,
        status_code: Option<u16>,
        force: Option<bool>,
    ) -> Result<FaultState, CoreError> {
        let state = FaultState::configure(enabled, status_code, force)?;
        let stored = match self.rooms.set_fault(room_id, state, caller).await? {
            Guarded::Done(stored) => stored,
            Guarded::Missing => return Err(CoreError::room_not_found(room_id)),
            Guarded::Denied => return Err(not_yours(room_id)),
        };

        tracing::info!(
            room_id = %room_id,
            enabled = stored.enabled,
            status_code = ?stored.status_code,
            force = stored.force,
            "Fault state updated"
        );
        Ok(stored)
    }

    /// Fault state of the room; disabled for unknown rooms.
    pub async fn get_fault(&self, room_id: &str) -> Result<FaultState, CoreError> {
        Ok(self
            .rooms
            .get_fault(room_id)
            .await?
            .unwrap_or_else(FaultState::disabled))
    }

    /// Best-effort activity bump. Failures are logged, never returned.
    pub async fn update_activity(&self, room_id: &str) {
        if let Err(e) = self.rooms.touch_room(room_id, self.now()).await {
            tracing::warn!(room_id = %room_id, error = %e, "Failed to update room activity");
        }
    }

    /// Reachability of the room store.
    pub async fn ping(&self) -> Result<(), CoreError> {
        self.rooms.ping().await
    }
}

fn not_yours(room_id: &str) -> CoreError {
    CoreError::Forbidden(format!(
        "Room {room_id} belongs to another user; only its owner or an admin may change it"
    ))
}
