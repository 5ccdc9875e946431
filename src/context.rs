//! Per-request context carrying the correlation identifier.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, StatusCode, request::Parts},
};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Header carrying the correlation identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Context attached to every request passing through the ingress middleware.
///
/// Stored in request extensions. When an upstream middleware already
/// attached one, it is kept as is.
///
/// Extract in handlers: `async fn handler(ctx: RequestContext)`
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub context_id: String,
    /// Extra fields a custom logger may attach to its own events.
    pub fields: Option<Map<String, Value>>,
}

impl RequestContext {
    pub fn new(context_id: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
            fields: None,
        }
    }

    /// Resolves the context from `x-request-id`, minting a UUID v4 when the
    /// header is missing, empty, or not valid text. A present value is used
    /// exactly as sent.
    ///
    /// Returns the context and whether the identifier was freshly minted.
    pub fn from_headers(headers: &HeaderMap) -> (Self, bool) {
        let inbound = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty());

        match inbound {
            Some(id) => (Self::new(id), false),
            None => (Self::new(Uuid::new_v4().to_string()), true),
        }
    }

    /// Header value form of the identifier, if it is valid as one.
    pub fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.context_id).ok()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "request context missing: is the ingress log middleware installed?",
            ))
    }
}
