//! Handlers for webhook capture and retrieval.
//!
//! These endpoints are unauthenticated: anyone who knows the room id can send
//! to it and read from it. Any method other than `GET` on `/hook/{room_id}`
//! is captured.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::body::Bytes;
use axum::extract::{ConnectInfo, FromRequestParts, OriginalUri, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method};
use axum::response::IntoResponse;
use axum::Json;
use hookroom_core::error::CoreError;
use hookroom_core::metadata::RequestMeta;
use hookroom_core::types::ReceiptId;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::query::{CaptureListParams, SortParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Peer address of the TCP connection, when the server was started with
/// connect info. Absent in `oneshot` tests.
pub struct PeerAddr(pub Option<IpAddr>);

impl<S: Send + Sync> FromRequestParts<S> for PeerAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(PeerAddr(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip()),
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct CaptureDeleted {
    pub status: &'static str,
    pub receipt_id: ReceiptId,
    pub room_id: String,
}

#[derive(Debug, Serialize)]
pub struct CapturesCleared {
    pub status: &'static str,
    pub room_id: String,
}

/// A receipt id that does not parse cannot exist.
fn parse_receipt_id(room_id: &str, raw: &str) -> Result<ReceiptId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Core(CoreError::capture_not_found(room_id, raw)))
}

fn request_meta(
    method: &Method,
    uri: &axum::http::Uri,
    headers: &HeaderMap,
    peer_ip: Option<IpAddr>,
) -> RequestMeta {
    RequestMeta {
        method: method.as_str().to_string(),
        scheme: uri.scheme_str().unwrap_or("http").to_string(),
        host: uri.authority().map(|a| a.to_string()),
        path: uri.path().to_string(),
        raw_query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        peer_ip,
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// ANY (except GET) /hook/{room_id}
///
/// Capture the request. Subject to the room's fault state.
pub async fn ingest(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    PeerAddr(peer_ip): PeerAddr,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let request = request_meta(&method, &uri, &headers, peer_ip);
    let receipt = state.ingest.ingest(&room_id, &request, &body).await?;
    Ok(Json(DataResponse { data: receipt }))
}

// ---------------------------------------------------------------------------
// Retrieval
// ---------------------------------------------------------------------------

/// GET /hook/{room_id}
///
/// Every live capture of the room. A forced fault applies here too.
pub async fn list_captures(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(params): Query<SortParams>,
) -> AppResult<impl IntoResponse> {
    state.ingest.admit(&room_id, Method::GET.as_str()).await?;
    let captures = state.query.list_all(&room_id, params.sort).await?;
    Ok(Json(DataResponse { data: captures }))
}

/// GET /hook/all/{room_id}
///
/// One page of live captures, `{items, total, page, limit}`.
pub async fn list_captures_page(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(params): Query<CaptureListParams>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .query
        .list_page(&room_id, params.sort, params.page, params.limit)
        .await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /hook/{room_id}/{receipt_id}
pub async fn get_capture(
    State(state): State<AppState>,
    Path((room_id, receipt_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let receipt_id = parse_receipt_id(&room_id, &receipt_id)?;
    let capture = state.query.get_one(&room_id, receipt_id).await?;
    Ok(Json(DataResponse { data: capture }))
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// DELETE /hook/{room_id}/{receipt_id}
pub async fn delete_capture(
    State(state): State<AppState>,
    Path((room_id, receipt_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let receipt_id = parse_receipt_id(&room_id, &receipt_id)?;
    state.query.delete_one(&room_id, receipt_id).await?;
    Ok(Json(DataResponse {
        data: CaptureDeleted {
            status: "deleted",
            receipt_id,
            room_id,
        },
    }))
}

/// DELETE /hook/delete/{room_id}
pub async fn clear_captures(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.query.clear_all(&room_id).await?;
    Ok(Json(DataResponse {
        data: CapturesCleared {
            status: "cleared",
            room_id,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_meta_keeps_repeated_headers_and_query() {
        let mut headers = HeaderMap::new();
        headers.append("x-tag", "a".parse().unwrap());
        headers.append("x-tag", "b".parse().unwrap());
        let uri: axum::http::Uri = "/hook/demo?x=1".parse().unwrap();

        let meta = request_meta(&Method::PUT, &uri, &headers, None);
        assert_eq!(meta.method, "PUT");
        assert_eq!(meta.path, "/hook/demo");
        assert_eq!(meta.raw_query.as_deref(), Some("x=1"));
        assert_eq!(meta.headers.iter().filter(|(k, _)| k == "x-tag").count(), 2);
    }

    #[test]
    fn unparseable_receipt_id_is_capture_not_found() {
        assert!(matches!(
            parse_receipt_id("demo", "not-a-uuid"),
            Err(AppError::Core(CoreError::CaptureNotFound { .. }))
        ));
    }
}
