//! Room and webhook lifecycle engine.
//!
//! Pure domain logic for the capture service: rooms with per-room retention
//! and fault injection, the capture log, and the ingest and query gateways
//! built on top of them. Storage is reached only through the traits in
//! [`store`]; the HTTP layer lives in `hookroom_api`.

pub mod capture;
pub mod clock;
pub mod error;
pub mod fault;
pub mod ingest;
pub mod memory;
pub mod metadata;
pub mod pagination;
pub mod query;
pub mod registry;
pub mod room;
pub mod store;
pub mod types;
