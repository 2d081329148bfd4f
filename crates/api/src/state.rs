use std::sync::Arc;

use hookroom_core::clock::Clock;
use hookroom_core::ingest::IngestGateway;
use hookroom_core::query::QueryGateway;
use hookroom_core::registry::RoomRegistry;
use hookroom_core::store::{CaptureStore, RoomStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (JWT secret, public URL, default TTL).
    pub config: Arc<ServerConfig>,
    /// Room lifecycle and fault state.
    pub registry: Arc<RoomRegistry>,
    /// Inbound capture path.
    pub ingest: Arc<IngestGateway>,
    /// Viewer-facing capture retrieval.
    pub query: Arc<QueryGateway>,
    /// Raw capture store, used by the expiry sweep.
    pub captures: Arc<dyn CaptureStore>,
}

impl AppState {
    /// Wire the registry and both gateways onto the selected stores.
    pub fn new(
        config: ServerConfig,
        rooms: Arc<dyn RoomStore>,
        captures: Arc<dyn CaptureStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let registry = Arc::new(RoomRegistry::new(rooms, Arc::clone(&captures), clock));
        let ingest = Arc::new(IngestGateway::new(
            Arc::clone(&registry),
            Arc::clone(&captures),
            config.fault_policy,
        ));
        let query = Arc::new(QueryGateway::new(
            Arc::clone(&registry),
            Arc::clone(&captures),
        ));

        Self {
            config: Arc::new(config),
            registry,
            ingest,
            query,
            captures,
        }
    }
}
