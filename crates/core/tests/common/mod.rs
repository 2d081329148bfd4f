use std::sync::Arc;

use hookroom_core::clock::ManualClock;
use hookroom_core::fault::FaultPolicy;
use hookroom_core::ingest::IngestGateway;
use hookroom_core::memory::MemoryStore;
use hookroom_core::metadata::RequestMeta;
use hookroom_core::query::QueryGateway;
use hookroom_core::registry::RoomRegistry;

/// Registry and gateways wired to one in-memory store and a manual clock.
pub struct Harness {
    pub clock: ManualClock,
    pub registry: Arc<RoomRegistry>,
    pub ingest: IngestGateway,
    pub query: QueryGateway,
}

pub fn harness() -> Harness {
    harness_with_policy(FaultPolicy::default())
}

pub fn harness_with_policy(policy: FaultPolicy) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::starting_now();
    let registry = Arc::new(RoomRegistry::new(
        store.clone(),
        store.clone(),
        Arc::new(clock.clone()),
    ));
    let ingest = IngestGateway::new(Arc::clone(&registry), store.clone(), policy);
    let query = QueryGateway::new(Arc::clone(&registry), store);

    Harness {
        clock,
        registry,
        ingest,
        query,
    }
}

/// A JSON request as a webhook sender would issue it.
pub fn json_request(method: &str, room_id: &str) -> RequestMeta {
    RequestMeta {
        method: method.to_string(),
        scheme: "http".to_string(),
        host: Some("localhost:3000".to_string()),
        path: format!("/hook/{room_id}"),
        raw_query: None,
        headers: vec![
            ("host".to_string(), "localhost:3000".to_string()),
            ("content-type".to_string(), "application/json".to_string()),
        ],
        peer_ip: Some("127.0.0.1".parse().unwrap()),
    }
}
