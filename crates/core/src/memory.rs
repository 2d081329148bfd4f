//! Process-local implementation of [`RoomStore`] and [`CaptureStore`].
//!
//! Rooms and capture logs sit behind separate `tokio::sync::RwLock`s. Every
//! mutation happens inside a single write-lock section with no `.await`
//! between reading and writing, so fault updates are never observed half
//! applied and concurrent appends never lose entries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::capture::{sort_captures, Capture, SortOrder};
use crate::error::CoreError;
use crate::fault::FaultState;
use crate::room::{Caller, Room};
use crate::store::{CaptureStats, CaptureStore, Guarded, RoomStore, RoomUpsert};
use crate::types::{ReceiptId, Timestamp};

#[derive(Debug, Clone)]
struct RoomEntry {
    room: Room,
    fault: FaultState,
}

/// In-memory store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: RwLock<HashMap<String, RoomEntry>>,
    captures: RwLock<HashMap<String, Vec<Capture>>>,
    sequence: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn upsert_room(
        &self,
        room_id: &str,
        caller: Caller<'_>,
        ttl_seconds: i64,
        now: Timestamp,
    ) -> Result<RoomUpsert, CoreError> {
        let mut rooms = self.rooms.write().await;
        if let Some(entry) = rooms.get_mut(room_id) {
            if !caller.can_manage(&entry.room.owner_id) {
                return Ok(RoomUpsert::Denied);
            }
            entry.room.ttl_seconds = ttl_seconds;
            entry.room.last_activity_at = entry.room.last_activity_at.max(now);
            return Ok(RoomUpsert::Refreshed(entry.room.clone()));
        }

        let room = Room {
            room_id: room_id.to_string(),
            owner_id: caller.user_id.to_string(),
            ttl_seconds,
            created_at: now,
            last_activity_at: now,
        };
        rooms.insert(
            room_id.to_string(),
            RoomEntry {
                room: room.clone(),
                fault: FaultState::disabled(),
            },
        );
        Ok(RoomUpsert::Created(room))
    }

    async fn find_room(&self, room_id: &str) -> Result<Option<Room>, CoreError> {
        Ok(self.rooms.read().await.get(room_id).map(|e| e.room.clone()))
    }

    async fn list_rooms(
        &self,
        owner_id: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Room>, i64), CoreError> {
        let rooms = self.rooms.read().await;
        let mut matching: Vec<Room> = rooms
            .values()
            .filter(|e| owner_id.is_none_or(|owner| e.room.owner_id == owner))
            .map(|e| e.room.clone())
            .collect();
        drop(rooms);

        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.room_id.cmp(&b.room_id))
        });

        let total = matching.len() as i64;
        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit.max(0)).unwrap_or(0);
        let page = matching.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn delete_room(
        &self,
        room_id: &str,
        caller: Option<Caller<'_>>,
    ) -> Result<Guarded<()>, CoreError> {
        let mut rooms = self.rooms.write().await;
        let Some(entry) = rooms.get(room_id) else {
            return Ok(Guarded::Missing);
        };
        if caller.is_some_and(|c| !c.can_manage(&entry.room.owner_id)) {
            return Ok(Guarded::Denied);
        }
        rooms.remove(room_id);
        Ok(Guarded::Done(()))
    }

    async fn touch_room(&self, room_id: &str, now: Timestamp) -> Result<(), CoreError> {
        if let Some(entry) = self.rooms.write().await.get_mut(room_id) {
            entry.room.last_activity_at = entry.room.last_activity_at.max(now);
        }
        Ok(())
    }

    async fn set_fault(
        &self,
        room_id: &str,
        state: FaultState,
        caller: Option<Caller<'_>>,
    ) -> Result<Guarded<FaultState>, CoreError> {
        let mut rooms = self.rooms.write().await;
        let Some(entry) = rooms.get_mut(room_id) else {
            return Ok(Guarded::Missing);
        };
        if caller.is_some_and(|c| !c.can_manage(&entry.room.owner_id)) {
            return Ok(Guarded::Denied);
        }
        entry.fault = state;
        Ok(Guarded::Done(entry.fault))
    }

    async fn get_fault(&self, room_id: &str) -> Result<Option<FaultState>, CoreError> {
        Ok(self.rooms.read().await.get(room_id).map(|e| e.fault))
    }

    async fn ping(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

#[async_trait]
impl CaptureStore for MemoryStore {
    /// Rejects captures for rooms that no longer exist. The rooms read lock is
    /// held until the capture is in its log, so a concurrent close either
    /// happens first or clears the new entry.
    async fn append(&self, mut capture: Capture) -> Result<ReceiptId, CoreError> {
        let receipt_id = capture.receipt_id;
        let rooms = self.rooms.read().await;
        if !rooms.contains_key(&capture.room_id) {
            return Err(CoreError::room_not_found(&capture.room_id));
        }
        let mut logs = self.captures.write().await;
        capture.sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        logs.entry(capture.room_id.clone()).or_default().push(capture);
        drop(rooms);
        Ok(receipt_id)
    }

    async fn list(
        &self,
        room_id: &str,
        order: SortOrder,
        now: Timestamp,
    ) -> Result<Vec<Capture>, CoreError> {
        let mut live: Vec<Capture> = self
            .captures
            .read()
            .await
            .get(room_id)
            .map(|log| log.iter().filter(|c| c.is_live_at(now)).cloned().collect())
            .unwrap_or_default();
        sort_captures(&mut live, order);
        Ok(live)
    }

    async fn get(
        &self,
        room_id: &str,
        receipt_id: ReceiptId,
        now: Timestamp,
    ) -> Result<Option<Capture>, CoreError> {
        Ok(self.captures.read().await.get(room_id).and_then(|log| {
            log.iter()
                .find(|c| c.receipt_id == receipt_id && c.is_live_at(now))
                .cloned()
        }))
    }

    async fn delete(
        &self,
        room_id: &str,
        receipt_id: ReceiptId,
        now: Timestamp,
    ) -> Result<bool, CoreError> {
        let mut logs = self.captures.write().await;
        let Some(log) = logs.get_mut(room_id) else {
            return Ok(false);
        };
        match log
            .iter()
            .position(|c| c.receipt_id == receipt_id && c.is_live_at(now))
        {
            Some(idx) => {
                log.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear(&self, room_id: &str) -> Result<(), CoreError> {
        self.captures.write().await.remove(room_id);
        Ok(())
    }

    async fn stats(&self, room_id: &str, now: Timestamp) -> Result<CaptureStats, CoreError> {
        let logs = self.captures.read().await;
        let Some(log) = logs.get(room_id) else {
            return Ok(CaptureStats::default());
        };
        let mut stats = CaptureStats::default();
        for c in log.iter().filter(|c| c.is_live_at(now)) {
            stats.count += 1;
            stats.last_capture_at = stats.last_capture_at.max(Some(c.timestamp));
        }
        Ok(stats)
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<u64, CoreError> {
        let mut logs = self.captures.write().await;
        let mut removed = 0u64;
        for log in logs.values_mut() {
            let before = log.len();
            log.retain(|c| c.is_live_at(now));
            removed += (before - log.len()) as u64;
        }
        logs.retain(|_, log| !log.is_empty());
        Ok(removed)
    }
}
