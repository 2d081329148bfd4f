/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Stable identifier of a single capture. Assigned at capture time, never reused.
pub type ReceiptId = uuid::Uuid;
