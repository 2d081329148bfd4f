//! Inbound capture path: room lookup, fault decision, metadata, append.

use std::sync::Arc;

use serde::Serialize;

use crate::capture::Capture;
use crate::error::CoreError;
use crate::fault::{decide_outcome, FaultOutcome, FaultPolicy};
use crate::metadata::{build_metadata, decode_body, RequestMeta};
use crate::registry::RoomRegistry;
use crate::room::Room;
use crate::store::CaptureStore;
use crate::types::ReceiptId;

/// Acknowledgement returned to the sender of an accepted capture.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    pub status: &'static str,
    pub receipt_id: ReceiptId,
    pub method: String,
}

pub struct IngestGateway {
    registry: Arc<RoomRegistry>,
    captures: Arc<dyn CaptureStore>,
    policy: FaultPolicy,
}

impl IngestGateway {
    pub fn new(
        registry: Arc<RoomRegistry>,
        captures: Arc<dyn CaptureStore>,
        policy: FaultPolicy,
    ) -> Self {
        Self {
            registry,
            captures,
            policy,
        }
    }

    /// Resolve the room and apply its fault state to `method`.
    ///
    /// Also used for `GET` on the ingest path, which is retrieval: an
    /// unforced fault lets it through, a forced one does not.
    pub async fn admit(&self, room_id: &str, method: &str) -> Result<Room, CoreError> {
        let room = self.registry.get(room_id).await?;
        let fault = self.registry.get_fault(room_id).await?;

        match decide_outcome(method, &fault, &self.policy) {
            FaultOutcome::Accept => Ok(room),
            FaultOutcome::Reject { status_code } => {
                tracing::info!(room_id = %room_id, method, status_code, "Simulated failure returned");
                Err(CoreError::SimulatedFailure { status_code })
            }
        }
    }

    /// Capture one inbound request against `room_id`.
    ///
    /// `GET` is never captured; the HTTP layer routes it to retrieval.
    pub async fn ingest(
        &self,
        room_id: &str,
        request: &RequestMeta,
        raw_body: &[u8],
    ) -> Result<IngestReceipt, CoreError> {
        if request.method.eq_ignore_ascii_case("GET") {
            return Err(CoreError::Validation(
                "GET on the ingest path is retrieval, not capture".into(),
            ));
        }

        let room = self.admit(room_id, &request.method).await?;

        let metadata = build_metadata(request, raw_body.len());
        let body = decode_body(metadata.content_type.as_deref(), raw_body);
        let method = metadata.method.clone();

        let capture = Capture::new(
            &room.room_id,
            body,
            metadata,
            room.ttl_seconds,
            self.registry.now(),
        );
        let receipt_id = self.captures.append(capture).await?;

        // The sender's acknowledgement never waits on the activity bump.
        let registry = Arc::clone(&self.registry);
        let touched = room.room_id.clone();
        tokio::spawn(async move { registry.update_activity(&touched).await });

        tracing::info!(room_id = %room.room_id, receipt_id = %receipt_id, method = %method, "Webhook captured");

        Ok(IngestReceipt {
            status: "ok",
            receipt_id,
            method,
        })
    }
}
