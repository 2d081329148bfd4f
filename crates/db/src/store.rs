//! [`RoomStore`] and [`CaptureStore`] on top of PostgreSQL.

use async_trait::async_trait;
use hookroom_core::capture::{Capture, SortOrder};
use hookroom_core::error::CoreError;
use hookroom_core::fault::FaultState;
use hookroom_core::room::{Caller, Room};
use hookroom_core::store::{CaptureStats, CaptureStore, Guarded, RoomStore, RoomUpsert};
use hookroom_core::types::{ReceiptId, Timestamp};

use crate::repositories::{CaptureRepo, RoomRepo};
use crate::DbPool;

/// PostgreSQL error code for a foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Durable store backed by a connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Why an owner-restricted statement touched no row.
    async fn missing_or_denied<T>(&self, room_id: &str) -> Result<Guarded<T>, CoreError> {
        let exists = RoomRepo::find_by_id(&self.pool, room_id)
            .await
            .map_err(storage_error)?
            .is_some();
        Ok(if exists { Guarded::Denied } else { Guarded::Missing })
    }
}

/// Any database failure surfaces as [`CoreError::StorageUnavailable`]; the
/// HTTP layer sanitizes the message.
fn storage_error(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Database error");
    CoreError::StorageUnavailable(err.to_string())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION))
}

#[async_trait]
impl RoomStore for PgStore {
    async fn upsert_room(
        &self,
        room_id: &str,
        caller: Caller<'_>,
        ttl_seconds: i64,
        now: Timestamp,
    ) -> Result<RoomUpsert, CoreError> {
        let row = RoomRepo::upsert(
            &self.pool,
            room_id,
            caller.user_id,
            caller.owner_filter(),
            ttl_seconds,
            now,
        )
        .await
        .map_err(storage_error)?;

        Ok(match row {
            Some(row) if row.created => RoomUpsert::Created(row.room.into()),
            Some(row) => RoomUpsert::Refreshed(row.room.into()),
            None => RoomUpsert::Denied,
        })
    }

    async fn find_room(&self, room_id: &str) -> Result<Option<Room>, CoreError> {
        RoomRepo::find_by_id(&self.pool, room_id)
            .await
            .map(|row| row.map(Room::from))
            .map_err(storage_error)
    }

    async fn list_rooms(
        &self,
        owner_id: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Room>, i64), CoreError> {
        let rows = RoomRepo::list(&self.pool, owner_id, offset, limit)
            .await
            .map_err(storage_error)?;
        let total = RoomRepo::count(&self.pool, owner_id)
            .await
            .map_err(storage_error)?;
        Ok((rows.into_iter().map(Room::from).collect(), total))
    }

    async fn delete_room(
        &self,
        room_id: &str,
        caller: Option<Caller<'_>>,
    ) -> Result<Guarded<()>, CoreError> {
        let only_owner = caller.and_then(|c| c.owner_filter());
        let deleted = RoomRepo::delete(&self.pool, room_id, only_owner)
            .await
            .map_err(storage_error)?;
        if deleted {
            return Ok(Guarded::Done(()));
        }
        self.missing_or_denied(room_id).await
    }

    async fn touch_room(&self, room_id: &str, now: Timestamp) -> Result<(), CoreError> {
        RoomRepo::touch(&self.pool, room_id, now)
            .await
            .map_err(storage_error)
    }

    async fn set_fault(
        &self,
        room_id: &str,
        state: FaultState,
        caller: Option<Caller<'_>>,
    ) -> Result<Guarded<FaultState>, CoreError> {
        let only_owner = caller.and_then(|c| c.owner_filter());
        match RoomRepo::upsert_fault(&self.pool, room_id, &state, only_owner).await {
            Ok(Some(row)) => Ok(Guarded::Done(row.into())),
            Ok(None) => self.missing_or_denied(room_id).await,
            // Room deleted between the SELECT and the insert.
            Err(e) if is_foreign_key_violation(&e) => Ok(Guarded::Missing),
            Err(e) => Err(storage_error(e)),
        }
    }

    async fn get_fault(&self, room_id: &str) -> Result<Option<FaultState>, CoreError> {
        RoomRepo::find_fault(&self.pool, room_id)
            .await
            .map(|row| row.map(FaultState::from))
            .map_err(storage_error)
    }

    async fn ping(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool)
            .await
            .map_err(storage_error)
    }
}

#[async_trait]
impl CaptureStore for PgStore {
    async fn append(&self, capture: Capture) -> Result<ReceiptId, CoreError> {
        match CaptureRepo::insert(&self.pool, &capture).await {
            Ok(row) => Ok(row.receipt_id),
            Err(e) if is_foreign_key_violation(&e) => {
                Err(CoreError::room_not_found(&capture.room_id))
            }
            Err(e) => Err(storage_error(e)),
        }
    }

    async fn list(
        &self,
        room_id: &str,
        order: SortOrder,
        now: Timestamp,
    ) -> Result<Vec<Capture>, CoreError> {
        let rows = CaptureRepo::list_live(&self.pool, room_id, order, now)
            .await
            .map_err(storage_error)?;
        Ok(rows.into_iter().map(Capture::from).collect())
    }

    async fn get(
        &self,
        room_id: &str,
        receipt_id: ReceiptId,
        now: Timestamp,
    ) -> Result<Option<Capture>, CoreError> {
        CaptureRepo::find_live(&self.pool, room_id, receipt_id, now)
            .await
            .map(|row| row.map(Capture::from))
            .map_err(storage_error)
    }

    async fn delete(
        &self,
        room_id: &str,
        receipt_id: ReceiptId,
        now: Timestamp,
    ) -> Result<bool, CoreError> {
        CaptureRepo::delete_live(&self.pool, room_id, receipt_id, now)
            .await
            .map_err(storage_error)
    }

    async fn clear(&self, room_id: &str) -> Result<(), CoreError> {
        CaptureRepo::delete_for_room(&self.pool, room_id)
            .await
            .map(|_| ())
            .map_err(storage_error)
    }

    async fn stats(&self, room_id: &str, now: Timestamp) -> Result<CaptureStats, CoreError> {
        let row = CaptureRepo::stats(&self.pool, room_id, now)
            .await
            .map_err(storage_error)?;
        Ok(CaptureStats {
            count: row.count,
            last_capture_at: row.last_capture_at,
        })
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<u64, CoreError> {
        CaptureRepo::delete_expired(&self.pool, now)
            .await
            .map_err(storage_error)
    }
}
