//! Repository for the `captures` table (append-only, TTL-bounded).

use hookroom_core::capture::{Capture, SortOrder};
use hookroom_core::types::{ReceiptId, Timestamp};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::capture::{CaptureRow, CaptureStatsRow};

/// Column list for `captures` SELECT queries (includes `id`).
const COLUMNS: &str = "id, receipt_id, room_id, body, metadata, captured_at, expires_at";

/// Column list for `captures` INSERT statements (excludes auto-generated `id`).
const INSERT_COLUMNS: &str = "receipt_id, room_id, body, metadata, captured_at, expires_at";

/// Provides query operations for captures.
pub struct CaptureRepo;

impl CaptureRepo {
    /// Insert one capture. The BIGSERIAL `id` becomes its tie-break sequence.
    pub async fn insert(pool: &PgPool, capture: &Capture) -> Result<CaptureRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO captures ({INSERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CaptureRow>(&query)
            .bind(capture.receipt_id)
            .bind(&capture.room_id)
            .bind(Json(&capture.body))
            .bind(Json(&capture.metadata))
            .bind(capture.timestamp)
            .bind(capture.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Live captures of a room ordered by `(captured_at, id)`.
    pub async fn list_live(
        pool: &PgPool,
        room_id: &str,
        order: SortOrder,
        now: Timestamp,
    ) -> Result<Vec<CaptureRow>, sqlx::Error> {
        let dir = order.as_sql();
        let query = format!(
            "SELECT {COLUMNS} FROM captures \
             WHERE room_id = $1 AND expires_at > $2 \
             ORDER BY captured_at {dir}, id {dir}"
        );
        sqlx::query_as::<_, CaptureRow>(&query)
            .bind(room_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    pub async fn find_live(
        pool: &PgPool,
        room_id: &str,
        receipt_id: ReceiptId,
        now: Timestamp,
    ) -> Result<Option<CaptureRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM captures \
             WHERE room_id = $1 AND receipt_id = $2 AND expires_at > $3"
        );
        sqlx::query_as::<_, CaptureRow>(&query)
            .bind(room_id)
            .bind(receipt_id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Delete one live capture. Returns `true` if a row was removed.
    pub async fn delete_live(
        pool: &PgPool,
        room_id: &str,
        receipt_id: ReceiptId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM captures \
             WHERE room_id = $1 AND receipt_id = $2 AND expires_at > $3",
        )
        .bind(room_id)
        .bind(receipt_id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every capture of a room, expired or not.
    pub async fn delete_for_room(pool: &PgPool, room_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM captures WHERE room_id = $1")
            .bind(room_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn stats(
        pool: &PgPool,
        room_id: &str,
        now: Timestamp,
    ) -> Result<CaptureStatsRow, sqlx::Error> {
        sqlx::query_as::<_, CaptureStatsRow>(
            "SELECT COUNT(*) AS count, MAX(captured_at) AS last_capture_at \
             FROM captures WHERE room_id = $1 AND expires_at > $2",
        )
        .bind(room_id)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    /// Delete captures whose expiry is at or before `now`.
    ///
    /// Returns the number of rows deleted.
    pub async fn delete_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM captures WHERE expires_at <= $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
