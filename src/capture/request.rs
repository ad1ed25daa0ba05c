//! Request normalization.
//!
//! # Responsibilities
//! - Read the full request body exactly once
//! - Turn method, path, query, headers and body into a `CapturedRequest`
//! - Keep every captured field safe to write to a text or JSON log
//!
//! # Design Decisions
//! - Normalization never fails: body read errors keep whatever was read
//! - Textual content types are stored verbatim, everything else as base64
//! - Empty optional fields are omitted from serialized output

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::{header, request::Parts, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde::Serialize;

use crate::http::headers::{canonical_header_name, HeaderValues};

/// Content types whose bodies are recorded as text rather than base64.
const TEXTUAL_CONTENT_TYPES: &[&str] = &["application/json", "application/x-www-form-urlencoded"];

/// Ordered query parameters, each with all of its values.
pub type QueryValues = BTreeMap<String, Vec<String>>;

/// Immutable record of one inbound HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub query: QueryValues,
    pub proto: String,
    pub host: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: HeaderValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub at: DateTime<Utc>,
}

/// Build a `CapturedRequest` from request parts and its body.
///
/// The body is consumed completely. When `max_body_bytes` is set, only that
/// many bytes are kept in the record; the rest is still drained.
pub async fn normalize(parts: &Parts, body: Body, max_body_bytes: Option<usize>) -> CapturedRequest {
    let at = Utc::now();
    let raw_body = read_body(body, max_body_bytes).await;

    CapturedRequest {
        method: parts.method.to_string(),
        path: decode_path(parts.uri.path()),
        query: parse_query(parts.uri.query()),
        proto: format!("{:?}", parts.version),
        host: request_host(parts),
        headers: capture_headers(&parts.headers),
        body: encode_body(media_type(&parts.headers).as_deref(), &raw_body),
        at,
    }
}

async fn read_body(mut body: Body, limit: Option<usize>) -> Bytes {
    let mut buf = BytesMut::new();
    let mut dropped = 0usize;

    while let Some(frame) = body.frame().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(error) => {
                tracing::debug!(
                    error = %error,
                    bytes_read = buf.len(),
                    "Request body read interrupted, keeping partial capture"
                );
                break;
            }
        };
        let Ok(data) = frame.into_data() else {
            continue;
        };

        let room = limit.map_or(data.len(), |limit| limit.saturating_sub(buf.len()));
        let keep = room.min(data.len());
        buf.extend_from_slice(&data[..keep]);
        dropped += data.len() - keep;
    }

    if dropped > 0 {
        tracing::warn!(
            captured_bytes = buf.len(),
            dropped_bytes = dropped,
            "Request body exceeded capture limit, record is truncated"
        );
    }

    buf.freeze()
}

/// Media type of the request with parameters stripped, lower-cased.
fn media_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let media_type = value.split(';').next().unwrap_or_default().trim();
    (!media_type.is_empty()).then(|| media_type.to_ascii_lowercase())
}

fn encode_body(media_type: Option<&str>, raw: &[u8]) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    let textual = media_type.is_some_and(|media_type| TEXTUAL_CONTENT_TYPES.contains(&media_type));
    if textual {
        Some(String::from_utf8_lossy(raw).into_owned())
    } else {
        Some(STANDARD.encode(raw))
    }
}

fn decode_path(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|path| path.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn parse_query(query: Option<&str>) -> QueryValues {
    let mut values = QueryValues::new();
    let Some(query) = query else {
        return values;
    };

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        values.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    values
}

fn request_host(parts: &Parts) -> String {
    if let Some(authority) = parts.uri.authority() {
        return authority.as_str().to_string();
    }
    parts
        .headers
        .get(header::HOST)
        .map(|host| String::from_utf8_lossy(host.as_bytes()).into_owned())
        .unwrap_or_default()
}

/// Collect headers by canonical name. `Host` is reported separately.
fn capture_headers(headers: &HeaderMap) -> HeaderValues {
    let mut captured = HeaderValues::new();

    for (name, value) in headers {
        if name == header::HOST {
            continue;
        }
        let value = match value.to_str() {
            Ok(value) => value.to_string(),
            Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
        };
        captured
            .entry(canonical_header_name(name.as_str()))
            .or_default()
            .push(value);
    }

    captured
}
