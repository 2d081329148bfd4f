//! Repository for the `rooms` and `fault_states` tables.

use hookroom_core::fault::FaultState;
use hookroom_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::room::{FaultRow, RoomRow, UpsertedRoomRow};

/// Column list for `rooms` SELECT queries.
const COLUMNS: &str = "room_id, owner_id, ttl_seconds, created_at, last_activity_at";

/// Provides CRUD operations for rooms and their fault state.
pub struct RoomRepo;

impl RoomRepo {
    /// Insert a room owned by `owner_id`, or refresh TTL and activity of an
    /// existing one.
    ///
    /// With `only_owner` set, an existing room is refreshed only when it
    /// belongs to that user; otherwise nothing is written and `None` is
    /// returned. The owner and `created_at` are kept on conflict and
    /// `last_activity_at` only moves forward.
    pub async fn upsert(
        pool: &PgPool,
        room_id: &str,
        owner_id: &str,
        only_owner: Option<&str>,
        ttl_seconds: i64,
        now: Timestamp,
    ) -> Result<Option<UpsertedRoomRow>, sqlx::Error> {
        let query = format!(
            "INSERT INTO rooms ({COLUMNS}) VALUES ($1, $2, $3, $4, $4) \
             ON CONFLICT (room_id) DO UPDATE SET \
                ttl_seconds = EXCLUDED.ttl_seconds, \
                last_activity_at = GREATEST(rooms.last_activity_at, EXCLUDED.last_activity_at) \
             WHERE $5::TEXT IS NULL OR rooms.owner_id = $5 \
             RETURNING {COLUMNS}, (xmax = 0) AS created"
        );
        sqlx::query_as::<_, UpsertedRoomRow>(&query)
            .bind(room_id)
            .bind(owner_id)
            .bind(ttl_seconds)
            .bind(now)
            .bind(only_owner)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, room_id: &str) -> Result<Option<RoomRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE room_id = $1");
        sqlx::query_as::<_, RoomRow>(&query)
            .bind(room_id)
            .fetch_optional(pool)
            .await
    }

    /// List rooms newest first, optionally restricted to one owner.
    pub async fn list(
        pool: &PgPool,
        owner_id: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<RoomRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM rooms \
             WHERE ($1::TEXT IS NULL OR owner_id = $1) \
             ORDER BY created_at DESC, room_id ASC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, RoomRow>(&query)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count rooms matching the same filter as [`RoomRepo::list`].
    pub async fn count(pool: &PgPool, owner_id: Option<&str>) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM rooms WHERE ($1::TEXT IS NULL OR owner_id = $1)")
                .bind(owner_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Delete a room, restricted to rooms of `only_owner` when set. Fault
    /// state and captures go with it via `ON DELETE CASCADE`.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(
        pool: &PgPool,
        room_id: &str,
        only_owner: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM rooms WHERE room_id = $1 AND ($2::TEXT IS NULL OR owner_id = $2)",
        )
        .bind(room_id)
        .bind(only_owner)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Advance `last_activity_at`, never backwards.
    pub async fn touch(pool: &PgPool, room_id: &str, now: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE rooms SET last_activity_at = GREATEST(last_activity_at, $2) \
             WHERE room_id = $1",
        )
        .bind(room_id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Fault state
    // -----------------------------------------------------------------------

    /// Replace the fault state of an existing room in a single statement,
    /// restricted to rooms of `only_owner` when set.
    ///
    /// Returns `None` when no matching room exists.
    pub async fn upsert_fault(
        pool: &PgPool,
        room_id: &str,
        state: &FaultState,
        only_owner: Option<&str>,
    ) -> Result<Option<FaultRow>, sqlx::Error> {
        sqlx::query_as::<_, FaultRow>(
            "INSERT INTO fault_states (room_id, enabled, status_code, is_forced, updated_at) \
             SELECT room_id, $2, $3, $4, NOW() FROM rooms \
             WHERE room_id = $1 AND ($5::TEXT IS NULL OR owner_id = $5) \
             ON CONFLICT (room_id) DO UPDATE SET \
                enabled = EXCLUDED.enabled, \
                status_code = EXCLUDED.status_code, \
                is_forced = EXCLUDED.is_forced, \
                updated_at = EXCLUDED.updated_at \
             RETURNING enabled, status_code, is_forced",
        )
        .bind(room_id)
        .bind(state.enabled)
        .bind(state.status_code.map(i32::from))
        .bind(state.force)
        .bind(only_owner)
        .fetch_optional(pool)
        .await
    }

    /// Fault columns of a room. `None` when the room does not exist; all
    /// columns `NULL` when it exists but was never configured.
    pub async fn find_fault(pool: &PgPool, room_id: &str) -> Result<Option<FaultRow>, sqlx::Error> {
        sqlx::query_as::<_, FaultRow>(
            "SELECT f.enabled, f.status_code, f.is_forced \
             FROM rooms r LEFT JOIN fault_states f ON f.room_id = r.room_id \
             WHERE r.room_id = $1",
        )
        .bind(room_id)
        .fetch_optional(pool)
        .await
    }
}
