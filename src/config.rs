//! Ingress log configuration and the exclusion policy derived from it.
//!
//! An [`IngressConfig`] is built once per middleware instance and shared
//! read-only by every request it handles. Exclusion is opt-in: anything not
//! explicitly excluded is logged.
//!
//! ## Environment Variables
//!
//! [`IngressConfig::from_env`] reads the following (all optional):
//!
//! - `INGRESS_LOG_EXCLUDE_REQUEST_HEADER` - Drop `req_header` from records
//! - `INGRESS_LOG_EXCLUDE_REQUEST_BODY` - Drop `req_body` from records
//! - `INGRESS_LOG_EXCLUDE_RESPONSE_HEADER` - Drop `rsp_header` from records
//! - `INGRESS_LOG_EXCLUDE_RESPONSE_BODY` - Drop `rsp_body` from records
//! - `INGRESS_LOG_EXCLUDE_SUCCESS_RESPONSE_BODY` - Replace 200 response bodies with `-`
//! - `INGRESS_LOG_EXCLUDE_SUCCESS_REQUEST` - Only log requests that did not return 200
//! - `INGRESS_LOG_EXCLUDE_HEADER_KEYS` - Comma-separated request header names to strip
//! - `INGRESS_LOG_DISABLE` - Disable the automatic ingress record entirely
//! - `INGRESS_LOG_EVENT_PREFIX` - Event name prefix (default: `events`)
//!
//! Boolean variables accept `true` (any case) or `1`.

use axum::http::StatusCode;
use serde::Deserialize;
use std::env;

/// Event prefix used when none is configured.
pub const DEFAULT_EVENT_PREFIX: &str = "events";

/// Separator appended to the event prefix.
pub const URL_SEPARATOR: &str = "/";

/// Which parts of a request/response are left out of the ingress record.
///
/// Every flag means "exclude"; the default value excludes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExcludeOptions {
    pub request_header: bool,
    pub request_body: bool,
    pub response_header: bool,
    pub response_body: bool,
    /// Replace the body of 200 responses with `-` instead of logging it.
    pub success_response_body: bool,
    /// Skip the record entirely for 200 responses.
    pub success_request: bool,
    /// Extra request header names stripped from `req_header` (case-insensitive).
    pub request_header_keys: Vec<String>,
}

/// Naming options for emitted events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FieldOptions {
    pub event_prefix: String,
}

/// Per-middleware configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IngressConfig {
    pub exclude: Option<ExcludeOptions>,
    /// When true the middleware still attaches the request context but emits
    /// no record, leaving logging to a custom logger downstream.
    pub disable_ingress_log: bool,
    pub fields: Option<FieldOptions>,
}

impl IngressConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exclude(mut self, exclude: ExcludeOptions) -> Self {
        self.exclude = Some(exclude);
        self
    }

    pub fn with_event_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.fields = Some(FieldOptions {
            event_prefix: prefix.into(),
        });
        self
    }

    pub fn disable_ingress_log(mut self, disabled: bool) -> Self {
        self.disable_ingress_log = disabled;
        self
    }

    fn excluded(&self, pick: impl Fn(&ExcludeOptions) -> bool) -> bool {
        self.exclude.as_ref().is_some_and(pick)
    }

    pub fn log_request_header(&self) -> bool {
        !self.excluded(|e| e.request_header)
    }

    pub fn log_request_body(&self) -> bool {
        !self.excluded(|e| e.request_body)
    }

    pub fn log_response_header(&self) -> bool {
        !self.excluded(|e| e.response_header)
    }

    pub fn log_response_body(&self) -> bool {
        !self.excluded(|e| e.response_body)
    }

    /// Whether 200 response bodies are logged verbatim rather than masked.
    pub fn log_success_response_body(&self) -> bool {
        !self.excluded(|e| e.success_response_body)
    }

    /// Whether records for 200 responses are skipped.
    pub fn log_failed_request_only(&self) -> bool {
        self.excluded(|e| e.success_request)
    }

    /// Whether a request that ended with `status` gets an ingress record.
    pub fn should_log(&self, status: StatusCode) -> bool {
        !self.disable_ingress_log && !(self.log_failed_request_only() && status == StatusCode::OK)
    }

    /// Request header names configured for removal, in addition to `Authorization`.
    pub fn excluded_request_header_keys(&self) -> &[String] {
        self.exclude
            .as_ref()
            .map(|e| e.request_header_keys.as_slice())
            .unwrap_or_default()
    }

    /// Returns the event prefix including the trailing separator, e.g. `events/`.
    pub fn event_prefix(&self) -> String {
        let prefix = self
            .fields
            .as_ref()
            .map(|f| f.event_prefix.as_str())
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_EVENT_PREFIX);

        format!("{prefix}{URL_SEPARATOR}")
    }

    /// Loads configuration from `INGRESS_LOG_*` environment variables.
    ///
    /// Unset variables keep their defaults. Unparseable booleans are treated
    /// as `false` with a warning, so a bad value never disables logging
    /// of the whole service.
    pub fn from_env() -> Self {
        let exclude = ExcludeOptions {
            request_header: env_flag("INGRESS_LOG_EXCLUDE_REQUEST_HEADER"),
            request_body: env_flag("INGRESS_LOG_EXCLUDE_REQUEST_BODY"),
            response_header: env_flag("INGRESS_LOG_EXCLUDE_RESPONSE_HEADER"),
            response_body: env_flag("INGRESS_LOG_EXCLUDE_RESPONSE_BODY"),
            success_response_body: env_flag("INGRESS_LOG_EXCLUDE_SUCCESS_RESPONSE_BODY"),
            success_request: env_flag("INGRESS_LOG_EXCLUDE_SUCCESS_REQUEST"),
            request_header_keys: env::var("INGRESS_LOG_EXCLUDE_HEADER_KEYS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        };

        let mut config = Self::new()
            .with_exclude(exclude)
            .disable_ingress_log(env_flag("INGRESS_LOG_DISABLE"));

        if let Ok(prefix) = env::var("INGRESS_LOG_EVENT_PREFIX") {
            config = config.with_event_prefix(prefix);
        }

        config
    }

    /// Prints a configuration summary.
    pub fn print_summary(&self) {
        tracing::info!("Ingress log configuration:");
        tracing::info!("  Enabled: {}", !self.disable_ingress_log);
        tracing::info!("  Event prefix: {}", self.event_prefix());
        tracing::info!(
            "  Request header/body: {}/{}",
            self.log_request_header(),
            self.log_request_body()
        );
        tracing::info!(
            "  Response header/body: {}/{}",
            self.log_response_header(),
            self.log_response_body()
        );
        tracing::info!("  Failed requests only: {}", self.log_failed_request_only());
    }
}

fn env_flag(name: &str) -> bool {
    match env::var(name) {
        Ok(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
        Ok(v) if v.is_empty() || v.eq_ignore_ascii_case("false") || v == "0" => false,
        Ok(v) => {
            tracing::warn!("{name} has unrecognized value '{v}', treating as false");
            false
        }
        Err(_) => false,
    }
}
