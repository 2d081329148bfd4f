//! Captured inbound requests and their ordering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ReceiptId, Timestamp};

/// Header or query multimap. Keys keep every value in arrival order.
pub type Multimap = BTreeMap<String, Vec<String>>;

/// Request details recorded alongside the body. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaptureMetadata {
    pub method: String,
    /// Reconstructed from scheme, host, path and query string.
    pub url: String,
    pub headers: Multimap,
    pub query: Multimap,
    pub host: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// One recorded inbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    pub receipt_id: ReceiptId,
    pub room_id: String,
    pub body: serde_json::Value,
    pub metadata: CaptureMetadata,
    pub timestamp: Timestamp,
    pub expires_at: Timestamp,
    /// Store-assigned insertion order, used to break timestamp ties.
    #[serde(skip)]
    pub sequence: i64,
}

impl Capture {
    /// Build a fresh capture stamped at `now` that expires `ttl_seconds` later.
    ///
    /// The receipt id is a UUIDv7; the store assigns `sequence` on insert.
    pub fn new(
        room_id: &str,
        body: serde_json::Value,
        metadata: CaptureMetadata,
        ttl_seconds: i64,
        now: Timestamp,
    ) -> Self {
        Self {
            receipt_id: uuid::Uuid::now_v7(),
            room_id: room_id.to_string(),
            body,
            metadata,
            timestamp: now,
            expires_at: now + chrono::Duration::seconds(ttl_seconds),
            sequence: 0,
        }
    }

    /// A capture is visible strictly before its expiry instant.
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }
}

/// Listing order for captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    /// SQL direction keyword for this order.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Newest => "DESC",
            Self::Oldest => "ASC",
        }
    }
}

/// Sort by `(timestamp, sequence)`, fully reversed for [`SortOrder::Newest`].
pub fn sort_captures(captures: &mut [Capture], order: SortOrder) {
    captures.sort_by(|a, b| {
        let ord = a
            .timestamp
            .cmp(&b.timestamp)
            .then(a.sequence.cmp(&b.sequence));
        match order {
            SortOrder::Oldest => ord,
            SortOrder::Newest => ord.reverse(),
        }
    });
}
