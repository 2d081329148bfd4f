//! Capture rows.

use hookroom_core::capture::{Capture, CaptureMetadata};
use hookroom_core::types::{ReceiptId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `captures` table.
#[derive(Debug, Clone, FromRow)]
pub struct CaptureRow {
    pub id: i64,
    pub receipt_id: ReceiptId,
    pub room_id: String,
    pub body: Json<serde_json::Value>,
    pub metadata: Json<CaptureMetadata>,
    pub captured_at: Timestamp,
    pub expires_at: Timestamp,
}

impl From<CaptureRow> for Capture {
    fn from(row: CaptureRow) -> Self {
        Capture {
            receipt_id: row.receipt_id,
            room_id: row.room_id,
            body: row.body.0,
            metadata: row.metadata.0,
            timestamp: row.captured_at,
            expires_at: row.expires_at,
            sequence: row.id,
        }
    }
}

/// Live capture count and newest capture time of one room.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct CaptureStatsRow {
    pub count: i64,
    pub last_capture_at: Option<Timestamp>,
}
