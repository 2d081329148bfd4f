//! Viewer-facing retrieval and deletion of captures.
//!
//! Unlike the raw [`CaptureStore`], every operation here first checks that
//! the room exists and reports missing captures as errors.

use std::sync::Arc;

use crate::capture::{Capture, SortOrder};
use crate::error::CoreError;
use crate::pagination::{clamp_limit, clamp_page, paginate, Page, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::registry::RoomRegistry;
use crate::store::CaptureStore;
use crate::types::ReceiptId;

pub struct QueryGateway {
    registry: Arc<RoomRegistry>,
    captures: Arc<dyn CaptureStore>,
}

impl QueryGateway {
    pub fn new(registry: Arc<RoomRegistry>, captures: Arc<dyn CaptureStore>) -> Self {
        Self { registry, captures }
    }

    /// Every live capture of the room in the requested order.
    pub async fn list_all(&self, room_id: &str, order: SortOrder) -> Result<Vec<Capture>, CoreError> {
        self.registry.get(room_id).await?;
        self.captures.list(room_id, order, self.registry.now()).await
    }

    /// One page of live captures.
    pub async fn list_page(
        &self,
        room_id: &str,
        order: SortOrder,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Page<Capture>, CoreError> {
        let page = clamp_page(page);
        let limit = clamp_limit(limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let captures = self.list_all(room_id, order).await?;
        Ok(paginate(captures, page, limit))
    }

    pub async fn get_one(&self, room_id: &str, receipt_id: ReceiptId) -> Result<Capture, CoreError> {
        self.registry.get(room_id).await?;
        self.captures
            .get(room_id, receipt_id, self.registry.now())
            .await?
            .ok_or_else(|| CoreError::capture_not_found(room_id, receipt_id))
    }

    /// Delete one capture. A second delete of the same receipt is
    /// [`CoreError::CaptureNotFound`].
    pub async fn delete_one(&self, room_id: &str, receipt_id: ReceiptId) -> Result<(), CoreError> {
        self.registry.get(room_id).await?;
        let deleted = self
            .captures
            .delete(room_id, receipt_id, self.registry.now())
            .await?;
        if !deleted {
            return Err(CoreError::capture_not_found(room_id, receipt_id));
        }

        tracing::info!(room_id = %room_id, receipt_id = %receipt_id, "Webhook deleted");
        Ok(())
    }

    /// Remove every capture of the room. Clearing an empty room succeeds.
    pub async fn clear_all(&self, room_id: &str) -> Result<(), CoreError> {
        self.registry.get(room_id).await?;
        self.captures.clear(room_id).await?;

        tracing::info!(room_id = %room_id, "All webhooks cleared");
        Ok(())
    }
}
