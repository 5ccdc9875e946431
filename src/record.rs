//! Assembly of the ingress log record.
//!
//! [`LogRecord::build`] turns the captured request, the recorded response and
//! the exclusion policy into the fields of one structured event. It knows
//! nothing about tower or the wire; everything it needs is passed in.

use axum::http::{HeaderMap, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::capture::CapturedRequest;
use crate::config::IngressConfig;
use crate::recorder::ResponseRecorder;

/// Value of the `type` field for ingress records.
pub const LOG_TYPE_INGRESS: &str = "ingress_http";

/// Logged in place of a masked success response body.
pub const WIPED_MESSAGE: &str = "-";

/// Header name to all of its values, names in canonical `X-Country` form.
pub type HeaderFields = BTreeMap<String, Vec<String>>;

/// One ingress event. Field names are the stable keys of the emitted log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "type")]
    pub log_type: String,
    pub url_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub req_header: Option<HeaderFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub req_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsp_header: Option<HeaderFields>,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsp_body: Option<String>,
    pub duration_ms: u64,
    /// Unix seconds at which the wrapped handler was invoked.
    pub req_timestamp: i64,
}

impl LogRecord {
    pub fn build(
        config: &IngressConfig,
        request: &CapturedRequest,
        response: &ResponseRecorder,
        duration_ms: u64,
        req_timestamp: i64,
    ) -> Self {
        let status = response.status();

        let req_header = config.log_request_header().then(|| {
            header_fields(&request.headers, config.excluded_request_header_keys())
        });

        let req_body = config
            .log_request_body()
            .then(|| request.body.as_text().into_owned());

        let rsp_header = config
            .log_response_header()
            .then(|| header_fields(response.headers(), &[]));

        let rsp_body = config.log_response_body().then(|| {
            if config.log_success_response_body() || status != StatusCode::OK {
                response.body_text()
            } else {
                WIPED_MESSAGE.to_string()
            }
        });

        Self {
            log_type: LOG_TYPE_INGRESS.to_string(),
            url_path: format!("{} {}", request.method, request.url),
            req_header,
            req_body,
            rsp_header,
            status: status.as_u16(),
            rsp_body,
            duration_ms,
            req_timestamp,
        }
    }

    /// The record as a field-name to value mapping.
    pub fn to_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Copies `headers` for logging, always without `Authorization` and without
/// any name in `excluded` (compared case-insensitively).
fn header_fields(headers: &HeaderMap, excluded: &[String]) -> HeaderFields {
    let mut fields = HeaderFields::new();

    for (name, value) in headers {
        if *name == header::AUTHORIZATION
            || excluded
                .iter()
                .any(|key| key.eq_ignore_ascii_case(name.as_str()))
        {
            continue;
        }

        fields
            .entry(canonical_header_key(name.as_str()))
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    fields
}

/// `x-request-id` -> `X-Request-Id`
fn canonical_header_key(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}
