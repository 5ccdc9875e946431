//! Read-once body capture.
//!
//! A body stream can only be consumed once. [`snapshot`] drains it, keeps
//! the bytes, and hands back a fresh [`Body`] over the same bytes so the
//! wrapped handler reads exactly what the client sent.

use axum::{
    body::Body,
    extract::{OriginalUri, Request},
    http::{HeaderMap, Method, Uri},
};
use bytes::{Bytes, BytesMut};
use http_body_util::BodyExt;
use std::borrow::Cow;

use crate::error::CaptureError;

/// Text logged for a body that could not be read.
pub const NULL_BODY: &str = "null";

/// Result of capturing a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySnapshot {
    Captured(Bytes),
    /// The stream failed part way; nothing reliable can be logged.
    Unreadable,
}

impl BodySnapshot {
    /// Body as log text. Invalid UTF-8 is replaced lossily.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            BodySnapshot::Captured(bytes) => String::from_utf8_lossy(bytes),
            BodySnapshot::Unreadable => Cow::Borrowed(NULL_BODY),
        }
    }
}

/// Request data captured before the wrapped handler runs.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    /// Path and query as received, before any router nesting strips a prefix.
    pub url: String,
    pub headers: HeaderMap,
    pub body: BodySnapshot,
}

impl CapturedRequest {
    /// Snapshots `request` and returns it with its body restored.
    pub async fn capture(request: Request) -> (Self, Request) {
        let (parts, body) = request.into_parts();

        let url = parts
            .extensions
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| request_target(uri))
            .unwrap_or_else(|| request_target(&parts.uri));

        let (body_snapshot, body) = snapshot(body).await;

        let captured = Self {
            method: parts.method.clone(),
            url,
            headers: parts.headers.clone(),
            body: body_snapshot,
        };

        (captured, Request::from_parts(parts, body))
    }
}

/// Origin-form target of `uri`: path plus query, never scheme or authority.
///
/// HTTP/2 requests carry `:scheme` and `:authority`, so their URI is in
/// absolute form.
fn request_target(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Drains `body` into memory, feeding every data frame to `on_data` in order.
///
/// Non-data frames (trailers) are skipped.
pub async fn drain(mut body: Body, mut on_data: impl FnMut(Bytes)) -> Result<(), CaptureError> {
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| CaptureError::Stream(e.to_string()))?;
        if let Ok(data) = frame.into_data() {
            on_data(data);
        }
    }
    Ok(())
}

/// Reads `body` to completion and returns its snapshot together with a
/// replacement body carrying the same bytes.
///
/// Never fails: on a read error the snapshot is [`BodySnapshot::Unreadable`]
/// and the replacement body holds the bytes received before the error.
pub async fn snapshot(body: Body) -> (BodySnapshot, Body) {
    let mut buf = BytesMut::new();

    match drain(body, |chunk| buf.extend_from_slice(&chunk)).await {
        Ok(()) => {
            let bytes = buf.freeze();
            (BodySnapshot::Captured(bytes.clone()), Body::from(bytes))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to capture body, logging placeholder");
            (BodySnapshot::Unreadable, Body::from(buf.freeze()))
        }
    }
}
