//! Extraction of capture metadata and body from a raw inbound request.
//!
//! The HTTP layer flattens the request into a [`RequestMeta`]; everything
//! recorded about the request is derived here so it stays independent of the
//! web framework.

use std::net::IpAddr;

use base64::Engine as _;
use serde_json::Value;

use crate::capture::{CaptureMetadata, Multimap};

/// Transport-level view of an inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub method: String,
    /// Scheme the listener saw (`http` unless terminated elsewhere).
    pub scheme: String,
    pub host: Option<String>,
    pub path: String,
    /// Undecoded query string without the leading `?`.
    pub raw_query: Option<String>,
    /// Header pairs in arrival order. Names are compared case-insensitively.
    pub headers: Vec<(String, String)>,
    /// Address of the TCP peer, if known.
    pub peer_ip: Option<IpAddr>,
}

impl RequestMeta {
    /// First value of header `name`, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Build the immutable metadata record for a capture.
///
/// `body_len` is used for `content_length` when the request carried no
/// `content-length` header (chunked uploads).
pub fn build_metadata(req: &RequestMeta, body_len: usize) -> CaptureMetadata {
    let scheme = req
        .header("x-forwarded-proto")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(if req.scheme.is_empty() {
            "http"
        } else {
            req.scheme.as_str()
        })
        .to_ascii_lowercase();

    let host = req
        .header("host")
        .map(scrub_nul)
        .or_else(|| req.host.as_deref().map(scrub_nul));

    let content_length = req
        .header("content-length")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .or(Some(body_len as u64));

    CaptureMetadata {
        method: scrub_nul(&req.method.to_ascii_uppercase()),
        url: scrub_nul(&reconstruct_url(
            &scheme,
            host.as_deref(),
            &req.path,
            req.raw_query.as_deref(),
        )),
        headers: header_multimap(&req.headers),
        query: query_multimap(req.raw_query.as_deref()),
        host,
        ip: client_ip(req).map(|ip| scrub_nul(&ip)),
        user_agent: req.header("user-agent").map(scrub_nul),
        content_type: req.header("content-type").map(scrub_nul),
        content_length,
    }
}

/// Source IP of the original caller.
///
/// Precedence: first hop of `x-forwarded-for`, then `x-real-ip`, then the
/// transport peer address.
pub fn client_ip(req: &RequestMeta) -> Option<String> {
    let forwarded = req
        .header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }

    let real_ip = req
        .header("x-real-ip")
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return Some(ip.to_string());
    }

    req.peer_ip.map(|ip| ip.to_string())
}

/// Rebuild the full URL the caller used.
pub fn reconstruct_url(scheme: &str, host: Option<&str>, path: &str, raw_query: Option<&str>) -> String {
    let mut url = format!("{scheme}://{}{path}", host.unwrap_or("localhost"));
    if let Some(q) = raw_query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(q);
    }
    url
}

/// Replace NUL characters, which JSONB cannot hold, with U+FFFD.
fn scrub_nul(value: &str) -> String {
    value.replace('\0', "\u{FFFD}")
}

/// Group header pairs by lowercased name.
pub fn header_multimap(headers: &[(String, String)]) -> Multimap {
    let mut map = Multimap::new();
    for (name, value) in headers {
        map.entry(scrub_nul(&name.to_ascii_lowercase()))
            .or_default()
            .push(scrub_nul(value));
    }
    map
}

/// Decode a query string into a multimap. Malformed strings yield an empty map.
pub fn query_multimap(raw_query: Option<&str>) -> Multimap {
    let mut map = Multimap::new();
    let Some(raw) = raw_query else {
        return map;
    };
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).unwrap_or_default();
    for (k, v) in pairs {
        map.entry(scrub_nul(&k)).or_default().push(scrub_nul(&v));
    }
    map
}

/// Turn a raw request body into the stored JSON value.
///
/// - empty body: `null`
/// - body that parses as JSON: that value, verbatim
/// - `application/x-www-form-urlencoded`: object of field to value (repeated
///   fields become arrays)
/// - any other valid UTF-8 body: the body as a string
///
/// Bodies that are not valid UTF-8, or whose decoded form contains a NUL
/// character, are stored losslessly as `{"encoding": "base64", "data": ...}`.
pub fn decode_body(content_type: Option<&str>, raw: &[u8]) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }

    match decode_text_body(content_type, raw) {
        Some(value) if !contains_nul(&value) => value,
        _ => serde_json::json!({
            "encoding": "base64",
            "data": base64::engine::general_purpose::STANDARD.encode(raw),
        }),
    }
}

fn decode_text_body(content_type: Option<&str>, raw: &[u8]) -> Option<Value> {
    if let Ok(json) = serde_json::from_slice::<Value>(raw) {
        return Some(json);
    }

    let is_form = content_type
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
        .unwrap_or(false);

    if is_form {
        if let Ok(pairs) = serde_urlencoded::from_bytes::<Vec<(String, String)>>(raw) {
            return Some(form_object(pairs));
        }
    }

    std::str::from_utf8(raw)
        .ok()
        .map(|text| Value::String(text.to_string()))
}

fn contains_nul(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains('\0'),
        Value::Array(items) => items.iter().any(contains_nul),
        Value::Object(map) => map.iter().any(|(k, v)| k.contains('\0') || contains_nul(v)),
        _ => false,
    }
}

fn form_object(pairs: Vec<(String, String)>) -> Value {
    let mut obj = serde_json::Map::new();
    for (k, v) in pairs {
        match obj.get_mut(&k) {
            None => {
                obj.insert(k, Value::String(v));
            }
            Some(Value::Array(items)) => items.push(Value::String(v)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(v)]);
            }
        }
    }
    Value::Object(obj)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(headers: &[(&str, &str)]) -> RequestMeta {
        RequestMeta {
            method: "post".into(),
            scheme: "http".into(),
            host: Some("fallback.local".into()),
            path: "/hook/demo".into(),
            raw_query: Some("a=1&a=2&b=x%20y".into()),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            peer_ip: Some("10.0.0.9".parse().unwrap()),
        }
    }

    // -- client_ip -----------------------------------------------------------

    #[test]
    fn forwarded_for_wins() {
        let req = request(&[
            ("X-Forwarded-For", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(client_ip(&req).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn real_ip_beats_peer() {
        let req = request(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(client_ip(&req).as_deref(), Some("198.51.100.2"));
    }

    #[test]
    fn peer_ip_is_the_fallback() {
        let req = request(&[]);
        assert_eq!(client_ip(&req).as_deref(), Some("10.0.0.9"));
    }

    // -- build_metadata ------------------------------------------------------

    #[test]
    fn metadata_reconstructs_url_and_multimaps() {
        let req = request(&[
            ("host", "hooks.example.com"),
            ("x-forwarded-proto", "https"),
            ("user-agent", "curl/8.0"),
            ("content-type", "application/json"),
            ("x-dup", "1"),
            ("X-Dup", "2"),
        ]);
        let meta = build_metadata(&req, 7);

        assert_eq!(meta.method, "POST");
        assert_eq!(meta.url, "https://hooks.example.com/hook/demo?a=1&a=2&b=x%20y");
        assert_eq!(meta.host.as_deref(), Some("hooks.example.com"));
        assert_eq!(meta.headers["x-dup"], vec!["1", "2"]);
        assert_eq!(meta.query["a"], vec!["1", "2"]);
        assert_eq!(meta.query["b"], vec!["x y"]);
        assert_eq!(meta.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(meta.content_type.as_deref(), Some("application/json"));
        assert_eq!(meta.content_length, Some(7));
    }

    #[test]
    fn content_length_header_is_preferred() {
        let req = request(&[("content-length", "42")]);
        assert_eq!(build_metadata(&req, 3).content_length, Some(42));
    }

    #[test]
    fn url_without_query() {
        assert_eq!(
            reconstruct_url("http", Some("h"), "/hook/x", None),
            "http://h/hook/x"
        );
        assert_eq!(
            reconstruct_url("http", Some("h"), "/hook/x", Some("")),
            "http://h/hook/x"
        );
    }

    // -- decode_body ---------------------------------------------------------

    #[test]
    fn empty_body_is_null() {
        assert_eq!(decode_body(Some("application/json"), b""), Value::Null);
    }

    #[test]
    fn json_body_is_kept_verbatim() {
        assert_eq!(
            decode_body(Some("application/json"), br#"{"x":1,"y":[true]}"#),
            json!({"x": 1, "y": [true]})
        );
    }

    #[test]
    fn json_is_detected_without_content_type() {
        assert_eq!(decode_body(None, b"[1,2]"), json!([1, 2]));
    }

    #[test]
    fn form_body_becomes_object() {
        let body = decode_body(
            Some("application/x-www-form-urlencoded; charset=utf-8"),
            b"name=a+b&tag=1&tag=2",
        );
        assert_eq!(body, json!({"name": "a b", "tag": ["1", "2"]}));
    }

    #[test]
    fn other_bodies_are_text() {
        assert_eq!(
            decode_body(Some("text/plain"), b"hello there"),
            json!("hello there")
        );
    }

    #[test]
    fn binary_body_is_base64() {
        assert_eq!(
            decode_body(Some("application/octet-stream"), b"a\x00b"),
            json!({"encoding": "base64", "data": "YQBi"})
        );
        assert_eq!(
            decode_body(None, &[0xff, 0xfe]),
            json!({"encoding": "base64", "data": "//4="})
        );
    }

    #[test]
    fn escaped_nul_in_json_or_form_is_base64() {
        let raw = br#"{"s":"a\u0000b"}"#;
        assert_eq!(decode_body(Some("application/json"), raw)["encoding"], "base64");

        let form = decode_body(Some("application/x-www-form-urlencoded"), b"a=%00");
        assert_eq!(form, json!({"encoding": "base64", "data": "YT0lMDA="}));
    }

    // -- NUL scrubbing -------------------------------------------------------

    #[test]
    fn nul_is_scrubbed_from_query_and_headers() {
        let mut req = request(&[("user-agent", "bad\0agent")]);
        req.raw_query = Some("x=%00&k%00=v".into());
        let meta = build_metadata(&req, 0);

        assert_eq!(meta.query["x"], vec!["\u{FFFD}"]);
        assert_eq!(meta.query["k\u{FFFD}"], vec!["v"]);
        assert_eq!(meta.user_agent.as_deref(), Some("bad\u{FFFD}agent"));
        assert_eq!(meta.headers["user-agent"], vec!["bad\u{FFFD}agent"]);
    }
}
