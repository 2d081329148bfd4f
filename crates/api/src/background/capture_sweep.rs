//! Periodic removal of expired captures.
//!
//! Readers already hide expired captures; this job reclaims their storage.
//! Runs on a fixed interval using `tokio::time::interval` until cancelled.

use std::sync::Arc;
use std::time::Duration;

use hookroom_core::error::CoreError;
use hookroom_core::registry::RoomRegistry;
use hookroom_core::store::CaptureStore;
use tokio_util::sync::CancellationToken;

/// Delete every capture that has expired by the registry's clock.
///
/// Returns the number of captures removed.
pub async fn sweep_once(
    registry: &RoomRegistry,
    captures: &dyn CaptureStore,
) -> Result<u64, CoreError> {
    captures.purge_expired(registry.now()).await
}

/// Run the capture sweep loop until `cancel` is triggered.
pub async fn run(
    registry: Arc<RoomRegistry>,
    captures: Arc<dyn CaptureStore>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Capture sweep job started"
    );

    let mut interval = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Capture sweep job stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep_once(&registry, captures.as_ref()).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Capture sweep: purged expired captures");
                        } else {
                            tracing::debug!("Capture sweep: nothing expired");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Capture sweep: cleanup failed");
                    }
                }
            }
        }
    }
}
