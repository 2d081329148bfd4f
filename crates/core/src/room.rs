//! Room records, TTL bounds and room id validation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::fault::FaultState;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Retention applied when the room owner has no TTL preference (12 hours).
pub const DEFAULT_WEBHOOK_TTL_SECS: i64 = 43_200;

/// Shortest accepted capture retention (1 minute).
pub const MIN_WEBHOOK_TTL_SECS: i64 = 60;

/// Longest accepted capture retention (1 day).
pub const MAX_WEBHOOK_TTL_SECS: i64 = 86_400;

/// Maximum length of a caller-chosen room id.
pub const MAX_ROOM_ID_LEN: usize = 128;

/// Path segments that collide with static routes and cannot be room ids.
const RESERVED_ROOM_IDS: &[&str] = &["all", "delete", "my-rooms"];

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An isolated inbound capture namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,
    /// The user who created the room. A refresh never changes it.
    pub owner_id: String,
    /// Retention stamped onto each capture at capture time.
    pub ttl_seconds: i64,
    pub created_at: Timestamp,
    /// Never moves backwards.
    pub last_activity_at: Timestamp,
}

/// A room as shown in listings, with live capture statistics.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    #[serde(flatten)]
    pub room: Room,
    pub capture_count: i64,
    pub last_capture_at: Option<Timestamp>,
}

/// A room together with its current fault configuration.
#[derive(Debug, Clone, Serialize)]
pub struct RoomDetails {
    #[serde(flatten)]
    pub room: Room,
    pub fault: FaultState,
    pub capture_count: i64,
}

/// The authenticated user on whose behalf a room is opened, closed or faulted.
///
/// Stores check [`Caller::can_manage`] inside the same write that mutates the
/// room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller<'a> {
    pub user_id: &'a str,
    pub is_admin: bool,
}

impl<'a> Caller<'a> {
    /// A regular (non-admin) user.
    pub fn user(user_id: &'a str) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn can_manage(&self, owner_id: &str) -> bool {
        self.is_admin || self.user_id == owner_id
    }

    /// Owner restriction for SQL filters: `None` for admins.
    pub fn owner_filter(&self) -> Option<&'a str> {
        (!self.is_admin).then_some(self.user_id)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a caller-chosen room id.
///
/// Accepts 1..=128 characters from `[A-Za-z0-9._-]`, excluding the reserved
/// route segments.
pub fn validate_room_id(room_id: &str) -> Result<(), CoreError> {
    if room_id.is_empty() {
        return Err(CoreError::Validation("room_id must not be empty".into()));
    }
    if room_id.len() > MAX_ROOM_ID_LEN {
        return Err(CoreError::Validation(format!(
            "room_id must be at most {MAX_ROOM_ID_LEN} characters"
        )));
    }
    if let Some(bad) = room_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(CoreError::Validation(format!(
            "room_id contains invalid character '{bad}'"
        )));
    }
    if RESERVED_ROOM_IDS.contains(&room_id) {
        return Err(CoreError::Validation(format!(
            "room_id '{room_id}' is reserved"
        )));
    }
    Ok(())
}

/// Validate a retention window in seconds.
pub fn validate_ttl(ttl_seconds: i64) -> Result<(), CoreError> {
    if (MIN_WEBHOOK_TTL_SECS..=MAX_WEBHOOK_TTL_SECS).contains(&ttl_seconds) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "TTL must be between {MIN_WEBHOOK_TTL_SECS}s and {MAX_WEBHOOK_TTL_SECS}s, got {ttl_seconds}s"
        )))
    }
}

/// Clamp an untrusted retention preference into the accepted range.
pub fn clamp_ttl(ttl_seconds: i64) -> i64 {
    ttl_seconds.clamp(MIN_WEBHOOK_TTL_SECS, MAX_WEBHOOK_TTL_SECS)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
