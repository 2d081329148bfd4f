#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Room not found: {room_id}")]
    RoomNotFound { room_id: String },

    #[error("Capture not found: {receipt_id} in room {room_id}")]
    CaptureNotFound { room_id: String, receipt_id: String },

    /// A deliberate, room-configured failure returned to the inbound caller.
    /// Not a defect.
    #[error("Simulated failure with status {status_code}")]
    SimulatedFailure { status_code: u16 },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn room_not_found(room_id: &str) -> Self {
        Self::RoomNotFound {
            room_id: room_id.to_string(),
        }
    }

    pub fn capture_not_found(room_id: &str, receipt_id: impl ToString) -> Self {
        Self::CaptureNotFound {
            room_id: room_id.to_string(),
            receipt_id: receipt_id.to_string(),
        }
    }
}
